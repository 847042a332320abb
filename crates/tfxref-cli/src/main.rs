//! tfxref-cli: CLI entry point for the tfxref Terraform cross-reference indexer.

mod commands_config;
mod commands_index;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tfxref",
    about = "Cross-reference indexer for Terraform module trees"
)]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a root module and stream facts as JSON lines
    Index {
        /// Root module directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Provider schemas from `terraform providers schema -json`
        #[arg(short, long)]
        schemas: Option<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads; 0 walks the tree on one thread
        #[arg(short, long)]
        workers: Option<usize>,

        /// Config file (defaults to ~/.tfxref/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Read or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the value at a dotted key, e.g. `index.workers`
    Get { key: String },
    /// Set the value at a dotted key and save
    Set { key: String, value: String },
}

fn main() -> anyhow::Result<()> {
    // stdout carries the fact stream; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tfxref=info".parse().expect("valid tracing directive")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            path,
            schemas,
            output,
            workers,
            config,
        } => {
            let root = match path {
                Some(p) => p,
                None => std::env::current_dir()?,
            };
            let args = commands_index::IndexArgs {
                root,
                schemas,
                output,
                workers,
                config,
            };
            if !commands_index::cmd_index(&args)? {
                std::process::exit(1);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Get { key } => commands_config::cmd_config_get(&key)?,
            ConfigAction::Set { key, value } => commands_config::cmd_config_set(&key, &value)?,
        },
    }

    Ok(())
}
