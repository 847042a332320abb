//! Reference extraction from expressions and schema-guided bodies.
//!
//! Two entry points: [`references_in_expr`] for constructs bound to a single
//! expression (locals, outputs), and [`references_in_body`] for argument
//! blocks read through a [`BlockSchema`] (module calls, resources). A body
//! that does not match its schema still yields every reference found in the
//! parts that did match, alongside `SchemaMismatch` diagnostics.

use crate::reference::{parse_reference, traversals_excluding};
use tfxref_core::{
    Block, BlockSchema, Body, Diagnostic, DiagnosticKind, Diagnostics, Expr, Reference,
};

/// References found by one extraction, plus the problems met on the way.
#[derive(Debug, Clone, Default)]
pub struct ExtractOutcome {
    pub references: Vec<Reference>,
    pub diagnostics: Diagnostics,
}

impl ExtractOutcome {
    /// Append another outcome, keeping order.
    pub fn merge(&mut self, other: ExtractOutcome) {
        self.references.extend(other.references);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// All references in a single expression, in source order.
pub fn references_in_expr(expr: &Expr) -> ExtractOutcome {
    let mut extraction = Extraction::default();
    extraction.expr(expr);
    extraction.finish()
}

/// References in the attributes of `body` that `schema` declares, in schema order.
pub fn references_in_body(body: &Body, schema: &BlockSchema) -> ExtractOutcome {
    let mut extraction = Extraction::default();
    extraction.body(body, schema);
    extraction.finish()
}

/// References in every attribute and nested block, for bodies with no schema.
pub fn references_in_all_attributes(body: &Body) -> ExtractOutcome {
    let mut extraction = Extraction::default();
    extraction.untyped_body(body);
    extraction.finish()
}

#[derive(Default)]
struct Extraction {
    references: Vec<Reference>,
    diagnostics: Diagnostics,
    /// Iterator symbols of enclosing `dynamic` blocks.
    shadowed: Vec<String>,
}

impl Extraction {
    fn finish(self) -> ExtractOutcome {
        ExtractOutcome {
            references: self.references,
            diagnostics: self.diagnostics,
        }
    }

    fn expr(&mut self, expr: &Expr) {
        for traversal in traversals_excluding(expr, &self.shadowed) {
            match parse_reference(traversal) {
                Ok(reference) => self.references.push(reference),
                Err(diag) => self.diagnostics.push(diag),
            }
        }
    }

    fn mismatch(&mut self, summary: &str, detail: String, subject: &tfxref_core::SourceRange) {
        self.diagnostics.push(
            Diagnostic::error(DiagnosticKind::SchemaMismatch, summary, detail)
                .with_subject(subject.clone()),
        );
    }

    fn body(&mut self, body: &Body, schema: &BlockSchema) {
        for attr_schema in &schema.attributes {
            match body.attribute(&attr_schema.name) {
                Some(attr) => self.expr(&attr.expr),
                None if attr_schema.required => self.mismatch(
                    "Missing required argument",
                    format!("The argument {:?} is required, but no definition was found.", attr_schema.name),
                    &body.range,
                ),
                None => {}
            }
        }

        for attr in &body.attributes {
            if schema.attribute(&attr.name).is_some() {
                continue;
            }
            if schema.block_type(&attr.name).is_some() {
                // Block type written in attribute syntax (`ingress = [...]`).
                self.expr(&attr.expr);
                continue;
            }
            self.mismatch(
                "Unsupported argument",
                format!("An argument named {:?} is not expected here.", attr.name),
                &attr.name_range,
            );
        }

        for block_schema in &schema.block_types {
            for block in &body.blocks {
                if block.type_name == block_schema.type_name {
                    self.body(&block.body, &block_schema.block);
                } else if is_dynamic_for(block, &block_schema.type_name) {
                    self.dynamic(block, &block_schema.block);
                }
            }
        }

        for block in &body.blocks {
            let type_name = if block.type_name == "dynamic" {
                match block.labels.first() {
                    Some(label) => label.as_str(),
                    None => {
                        self.mismatch(
                            "Missing dynamic block type",
                            "A dynamic block needs one label naming the block type to generate."
                                .to_string(),
                            &block.type_range,
                        );
                        continue;
                    }
                }
            } else {
                block.type_name.as_str()
            };
            if schema.block_type(type_name).is_none() {
                self.mismatch(
                    "Unsupported block type",
                    format!("Blocks of type {type_name:?} are not expected here."),
                    &block.type_range,
                );
            }
        }
    }

    /// `dynamic "<type>" { for_each = ..., iterator = it, content { ... } }`
    fn dynamic(&mut self, block: &Block, schema: &BlockSchema) {
        let label = block.labels.first().cloned().unwrap_or_default();
        let iterator = block
            .body
            .attribute("iterator")
            .and_then(|a| a.expr.as_keyword())
            .map(str::to_string)
            .unwrap_or(label);

        match block.body.attribute("for_each") {
            Some(for_each) => self.expr(&for_each.expr),
            None => self.mismatch(
                "Missing required argument",
                "The argument \"for_each\" is required, but no definition was found.".to_string(),
                &block.body.range,
            ),
        }

        self.shadowed.push(iterator);
        if let Some(labels) = block.body.attribute("labels") {
            self.expr(&labels.expr);
        }
        let mut contents = block.body.blocks.iter().filter(|b| b.type_name == "content");
        match contents.next() {
            Some(content) => self.body(&content.body, schema),
            None => self.mismatch(
                "Missing content block",
                "A dynamic block must have a nested block of type \"content\".".to_string(),
                &block.body.range,
            ),
        }
        self.shadowed.pop();
    }

    fn untyped_body(&mut self, body: &Body) {
        for attr in &body.attributes {
            self.expr(&attr.expr);
        }
        for block in &body.blocks {
            if block.type_name != "dynamic" {
                self.untyped_body(&block.body);
                continue;
            }
            let iterator = block
                .body
                .attribute("iterator")
                .and_then(|a| a.expr.as_keyword())
                .map(str::to_string)
                .or_else(|| block.labels.first().cloned())
                .unwrap_or_default();
            if let Some(for_each) = block.body.attribute("for_each") {
                self.expr(&for_each.expr);
            }
            self.shadowed.push(iterator);
            for attr in &block.body.attributes {
                if !matches!(attr.name.as_str(), "for_each" | "iterator") {
                    self.expr(&attr.expr);
                }
            }
            for nested in &block.body.blocks {
                self.untyped_body(&nested.body);
            }
            self.shadowed.pop();
        }
    }
}

fn is_dynamic_for(block: &Block, type_name: &str) -> bool {
    block.type_name == "dynamic" && block.labels.first().is_some_and(|l| l == type_name)
}
