//! Tree-sitter parsing coordinator.
//!
//! Parses configuration files with the HCL grammar and converts the result
//! into the owned [`Body`] model. Syntax errors never abort a file: the
//! recovered tree is converted and the first error is reported as a
//! diagnostic.

use crate::hcl::Converter;
use std::path::Path;
use tfxref_core::{Body, Diagnostic, DiagnosticKind, Diagnostics, TfxrefError};
use tree_sitter::{Node, Parser};

/// Result of parsing a single file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path to the parsed file, as used in source ranges.
    pub path: String,
    /// Top-level attributes and blocks.
    pub body: Body,
    /// Syntax problems found while parsing.
    pub diagnostics: Diagnostics,
}

/// Parses HCL configuration files.
pub struct HclParser {
    extensions: Vec<String>,
}

impl HclParser {
    /// Create a parser for `.tf` files.
    pub fn new() -> Self {
        Self::with_extensions(vec!["tf".to_string()])
    }

    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Check if a given file extension is supported.
    pub fn supports_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }

    /// Whether the file at `path` should be read by this parser.
    pub fn supports_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.supports_extension(ext))
    }

    /// Parse a single file into a body.
    pub fn parse_file(&self, path: &str, content: &[u8]) -> Result<ParsedFile, TfxrefError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_hcl::LANGUAGE.into())
            .map_err(|e| TfxrefError::Parse(format!("failed to load HCL grammar: {e}")))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| TfxrefError::Parse(format!("parser produced no tree for {path}")))?;

        let converter = Converter::new(content, path);
        let root = tree.root_node();
        let mut diagnostics = Diagnostics::new();
        if root.has_error() {
            if let Some(bad) = first_error(root) {
                let what = if bad.is_missing() {
                    format!("missing {}", bad.kind())
                } else {
                    "unexpected input".to_string()
                };
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Syntax,
                        "Invalid configuration syntax",
                        format!("{what} in {path}"),
                    )
                    .with_subject(converter.range(bad)),
                );
            }
        }

        Ok(ParsedFile {
            path: path.to_string(),
            body: converter.config_file(root),
            diagnostics,
        })
    }
}

impl Default for HclParser {
    fn default() -> Self {
        Self::new()
    }
}

/// First error or missing node in document order.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error);
    found
}
