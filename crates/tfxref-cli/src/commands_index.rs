//! `tfxref index`: load a module tree, index it and stream facts.

use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tfxref_core::{Diagnostic, Diagnostics, Severity, TfxrefConfig};
use tfxref_index::{Indexer, JsonLinesSink, ModuleLoader, ProviderSchemaRegistry};

pub(crate) struct IndexArgs {
    pub root: PathBuf,
    pub schemas: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub workers: Option<usize>,
    pub config: Option<PathBuf>,
}

/// Returns `false` when the run should exit with a failure status.
pub(crate) fn cmd_index(args: &IndexArgs) -> anyhow::Result<bool> {
    run_index(args, &mut std::io::stderr())
}

/// Diagnostics and the summary go to `log`; facts go to the output.
fn run_index(args: &IndexArgs, log: &mut dyn Write) -> anyhow::Result<bool> {
    let config = resolve_config(args)?;

    let loaded = ModuleLoader::new(config.loader.clone()).load(&args.root)?;
    // Shown before indexing so a fatal run still reports them.
    print_diagnostics(log, &loaded.diagnostics)?;
    let registry = load_registry(args.schemas.as_deref(), config.output.schemas_path.as_deref())?;

    let writer: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };
    let sink = JsonLinesSink::new(writer);
    let report = Indexer::new(&sink, &registry)
        .with_config(config.index.clone())
        .run(&loaded.tree)?;

    print_diagnostics(log, &report.diagnostics)?;
    writeln!(
        log,
        "{} {} modules, {} definitions, {} references ({} resources skipped)",
        "Indexed".green().bold(),
        report.stats.modules,
        report.stats.definitions,
        report.stats.references,
        report.stats.resources_skipped
    )?;
    if let Some(path) = &args.output {
        writeln!(log, "Facts written to {}", path.display())?;
    }

    let failed = loaded.diagnostics.has_errors() || report.diagnostics.has_errors();
    Ok(!(failed && config.output.fail_on_error))
}

/// Config file (explicit or default) with command-line overrides applied.
fn resolve_config(args: &IndexArgs) -> anyhow::Result<TfxrefConfig> {
    let mut config = match &args.config {
        Some(path) => TfxrefConfig::load(path)?,
        None => TfxrefConfig::load_or_default(),
    };
    if let Some(workers) = args.workers {
        config.index.workers = workers;
    }
    Ok(config)
}

/// Schemas from the flag, else from the config, else none at all.
fn load_registry(
    flag: Option<&Path>,
    configured: Option<&str>,
) -> anyhow::Result<ProviderSchemaRegistry> {
    let path = match (flag, configured) {
        (Some(p), _) => p.to_path_buf(),
        (None, Some(p)) => PathBuf::from(p),
        (None, None) => {
            tracing::warn!("No provider schemas given; resource bodies will not be indexed");
            return Ok(ProviderSchemaRegistry::new());
        }
    };
    let registry = ProviderSchemaRegistry::load(&path)?;
    tracing::info!("Loaded {} resource schemas from {}", registry.len(), path.display());
    Ok(registry)
}

fn print_diagnostics(log: &mut dyn Write, diagnostics: &Diagnostics) -> std::io::Result<()> {
    for diagnostic in diagnostics.iter() {
        writeln!(log, "{}", format_diagnostic(diagnostic))?;
    }
    Ok(())
}

fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
    };
    let mut line = format!("{label}[{}]: {}", diagnostic.kind, diagnostic.summary);
    if let Some(range) = &diagnostic.subject {
        line.push_str(&format!("\n  --> {range}"));
    }
    if !diagnostic.detail.is_empty() {
        line.push_str(&format!("\n  {}", diagnostic.detail.dimmed()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tfxref_core::{DiagnosticKind, SourceRange};

    fn fixture(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("child")).unwrap();
        fs::write(
            dir.join("main.tf"),
            "locals {\n  x = module.child.z\n}\n\nmodule \"child\" {\n  source = \"./child\"\n  y = 1\n}\n",
        )
        .unwrap();
        fs::write(
            dir.join("child/main.tf"),
            "variable \"y\" {}\n\noutput \"z\" {\n  value = var.y\n}\n",
        )
        .unwrap();
        dir
    }

    fn args(root: &Path) -> IndexArgs {
        IndexArgs {
            root: root.to_path_buf(),
            schemas: None,
            output: None,
            workers: None,
            config: None,
        }
    }

    #[test]
    fn workers_flag_overrides_config_file() {
        let dir = std::env::temp_dir().join("tfxref_cli_resolve_config");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("config.toml");
        let mut config = TfxrefConfig::default();
        config.index.workers = 2;
        config.output.fail_on_error = false;
        config.save(&path).unwrap();

        let mut a = args(&dir);
        a.config = Some(path.clone());
        let resolved = resolve_config(&a).unwrap();
        assert_eq!(resolved.index.workers, 2);
        assert!(!resolved.output.fail_on_error);

        a.workers = Some(6);
        assert_eq!(resolve_config(&a).unwrap().index.workers, 6);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_schemas_give_empty_registry() {
        let registry = load_registry(None, None).unwrap();
        assert!(registry.is_empty());
        assert!(load_registry(Some(Path::new("/nonexistent/schemas.json")), None).is_err());
    }

    #[test]
    fn index_writes_json_lines_to_output_file() {
        let dir = fixture("tfxref_cli_index_output");
        let out = std::env::temp_dir().join("tfxref_cli_index_output.jsonl");
        let config_path = dir.join("tfxref.toml");
        TfxrefConfig::default().save(&config_path).unwrap();

        let mut a = args(&dir);
        a.output = Some(out.clone());
        a.config = Some(config_path);
        assert!(cmd_index(&a).unwrap(), "clean tree should succeed");

        let text = fs::read_to_string(&out).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["fact"], "module_identity");
        assert_eq!(lines[0]["identity"], "<root>");
        assert!(lines
            .iter()
            .any(|l| l["subject"] == "module.child.output.z" && l["module"] == "<root>"));

        let _ = fs::remove_dir_all(&dir);
        let _ = fs::remove_file(&out);
    }

    #[test]
    fn errors_fail_the_run_unless_disabled() {
        let dir = fixture("tfxref_cli_index_errors");
        // Unsupported argument on the call
        fs::write(
            dir.join("extra.tf"),
            "module \"other\" {\n  source = \"./child\"\n  y = 1\n  bogus = 2\n}\n",
        )
        .unwrap();
        let out = std::env::temp_dir().join("tfxref_cli_index_errors.jsonl");
        let config_path = dir.join("tfxref.toml");
        TfxrefConfig::default().save(&config_path).unwrap();

        let mut a = args(&dir);
        a.output = Some(out.clone());
        a.config = Some(config_path.clone());
        assert!(!cmd_index(&a).unwrap());

        let mut lenient = TfxrefConfig::default();
        lenient.output.fail_on_error = false;
        lenient.save(&config_path).unwrap();
        assert!(cmd_index(&a).unwrap());

        let _ = fs::remove_dir_all(&dir);
        let _ = fs::remove_file(&out);
    }

    #[test]
    fn loader_diagnostics_are_shown_when_the_run_fails() {
        colored::control::set_override(false);
        let dir = fixture("tfxref_cli_index_loader_diags");
        fs::write(
            dir.join("remote.tf"),
            "module \"remote\" {\n  source = \"hashicorp/consul/aws\"\n}\n",
        )
        .unwrap();
        let config_path = dir.join("tfxref.toml");
        TfxrefConfig::default().save(&config_path).unwrap();

        let mut a = args(&dir);
        a.config = Some(config_path);
        // A directory cannot be opened as the output file.
        a.output = Some(dir.clone());
        let mut log = Vec::new();
        assert!(run_index(&a, &mut log).is_err());

        let text = String::from_utf8(log).unwrap();
        assert!(
            text.contains("warning[structural]: Module not installed"),
            "loader diagnostics missing from: {text}"
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn format_diagnostic_includes_location_and_detail() {
        colored::control::set_override(false);
        let diagnostic = Diagnostic::error(
            DiagnosticKind::SchemaNotFound,
            "Resource schema not found",
            "aws_instance.web has no schema",
        )
        .with_subject(SourceRange::single_line("main.tf", 3, 1, 12));
        let text = format_diagnostic(&diagnostic);
        assert!(text.starts_with("error[schema_not_found]: Resource schema not found"));
        assert!(text.contains("--> main.tf:3,1-13"));
        assert!(text.contains("aws_instance.web has no schema"));
    }
}
