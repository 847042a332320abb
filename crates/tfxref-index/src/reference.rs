//! Expression reference primitive.
//!
//! Collects the root-scoped traversals in an expression and interprets them
//! as references using Terraform's addressing rules. Nothing is evaluated and
//! nothing is resolved against a symbol table: `var.nope` is a perfectly good
//! reference even when no such variable exists.

use tfxref_core::{
    Diagnostic, DiagnosticKind, Expr, Reference, ResourceMode, Subject, TemplatePart, Traversal,
    TraverseStep,
};

/// Every root-scoped traversal in `expr`, in source order.
pub fn traversals_in(expr: &Expr) -> Vec<&Traversal> {
    traversals_excluding(expr, &[])
}

/// Like [`traversals_in`], with `shadowed` names treated as local iterator
/// symbols rather than references.
pub fn traversals_excluding<'e>(expr: &'e Expr, shadowed: &[String]) -> Vec<&'e Traversal> {
    let mut walker = Walker {
        shadowed: shadowed.to_vec(),
        found: Vec::new(),
    };
    walker.expr(expr);
    walker.found
}

struct Walker<'e> {
    shadowed: Vec<String>,
    found: Vec<&'e Traversal>,
}

impl<'e> Walker<'e> {
    fn expr(&mut self, expr: &'e Expr) {
        match expr {
            Expr::Literal { .. } => {}
            Expr::ScopeTraversal(t) => {
                if !self.shadowed.iter().any(|s| *s == t.root) {
                    self.found.push(t);
                }
            }
            Expr::Template { parts, .. } => self.template(parts),
            Expr::RelativeTraversal { source, .. } => self.expr(source),
            Expr::Index {
                collection, key, ..
            } => {
                self.expr(collection);
                self.expr(key);
            }
            // The per-element steps apply to anonymous elements, not to a symbol.
            Expr::Splat { source, .. } => self.expr(source),
            Expr::FunctionCall { args, .. } => args.iter().for_each(|a| self.expr(a)),
            Expr::Tuple { items, .. } => items.iter().for_each(|i| self.expr(i)),
            Expr::Object { items, .. } => {
                for item in items {
                    self.expr(&item.key);
                    self.expr(&item.value);
                }
            }
            Expr::Unary { operand, .. } => self.expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
                ..
            } => {
                self.expr(condition);
                self.expr(then);
                self.expr(otherwise);
            }
            Expr::For(f) => {
                // The collection is evaluated in the enclosing scope.
                self.expr(&f.collection);
                let pushed = self.push_names(f.iterator_names());
                if let Some(key) = &f.key {
                    self.expr(key);
                }
                self.expr(&f.value);
                if let Some(cond) = &f.condition {
                    self.expr(cond);
                }
                self.pop_names(pushed);
            }
            Expr::Parens { inner, .. } => self.expr(inner),
            Expr::Opaque { parts, .. } => parts.iter().for_each(|p| self.expr(p)),
        }
    }

    fn template(&mut self, parts: &'e [TemplatePart]) {
        for part in parts {
            match part {
                TemplatePart::Literal(_) => {}
                TemplatePart::Interpolation(e) => self.expr(e),
                TemplatePart::If {
                    condition,
                    then,
                    otherwise,
                } => {
                    self.expr(condition);
                    self.template(then);
                    self.template(otherwise);
                }
                TemplatePart::For {
                    key_var,
                    value_var,
                    collection,
                    body,
                } => {
                    self.expr(collection);
                    let names = key_var
                        .as_deref()
                        .into_iter()
                        .chain(std::iter::once(value_var.as_str()));
                    let pushed = self.push_names(names);
                    self.template(body);
                    self.pop_names(pushed);
                }
            }
        }
    }

    fn push_names<'n>(&mut self, names: impl Iterator<Item = &'n str>) -> usize {
        let before = self.shadowed.len();
        self.shadowed.extend(names.map(str::to_string));
        self.shadowed.len() - before
    }

    fn pop_names(&mut self, count: usize) {
        let keep = self.shadowed.len() - count;
        self.shadowed.truncate(keep);
    }
}

// ── Reference Parsing ───────────────────────────────────────────────────────

/// Roots that Terraform reserves and rejects in references.
const RESERVED_ROOTS: &[&str] = &["template", "lazy", "arg"];

/// Interpret a traversal as a reference.
///
/// Malformed traversals, like a bare `var` or `data.aws_ami` without a name,
/// yield an `InvalidReference` diagnostic instead.
pub fn parse_reference(traversal: &Traversal) -> Result<Reference, Diagnostic> {
    let steps = &traversal.steps;
    let root = traversal.root.as_str();

    let (subject, consumed) = match root {
        "var" => (
            Subject::InputVariable {
                name: attr_at(traversal, 0, "variable name")?,
            },
            1,
        ),
        "local" => (
            Subject::LocalValue {
                name: attr_at(traversal, 0, "local value name")?,
            },
            1,
        ),
        "count" => (
            Subject::CountAttr {
                name: attr_at(traversal, 0, "count attribute")?,
            },
            1,
        ),
        "each" => (
            Subject::ForEachAttr {
                name: attr_at(traversal, 0, "each attribute")?,
            },
            1,
        ),
        "path" => (
            Subject::PathAttr {
                name: attr_at(traversal, 0, "path attribute")?,
            },
            1,
        ),
        "terraform" => (
            Subject::TerraformAttr {
                name: attr_at(traversal, 0, "terraform attribute")?,
            },
            1,
        ),
        "self" => (Subject::SelfRef, 0),
        "module" => {
            let call = attr_at(traversal, 0, "module call name")?;
            // `module.c.out` and the instance form `module.c[0].out`.
            let output_at = match steps.get(1) {
                Some(TraverseStep::Index { .. }) => 2,
                _ => 1,
            };
            match steps.get(output_at).and_then(TraverseStep::attr_name) {
                Some(name) => (
                    Subject::ModuleCallOutput {
                        call,
                        name: name.to_string(),
                    },
                    output_at + 1,
                ),
                None => (Subject::ModuleCall { call }, 1),
            }
        }
        "data" => {
            let type_name = attr_at(traversal, 0, "data source type")?;
            let name = attr_at(traversal, 1, "data resource name")?;
            (
                Subject::Resource {
                    mode: ResourceMode::Data,
                    type_name,
                    name,
                },
                2,
            )
        }
        "resource" => {
            let type_name = attr_at(traversal, 0, "resource type")?;
            let name = attr_at(traversal, 1, "resource name")?;
            (
                Subject::Resource {
                    mode: ResourceMode::Managed,
                    type_name,
                    name,
                },
                2,
            )
        }
        reserved if RESERVED_ROOTS.contains(&reserved) => {
            return Err(invalid(
                traversal,
                format!("the symbol name {reserved:?} is reserved"),
            ));
        }
        type_name => (
            Subject::Resource {
                mode: ResourceMode::Managed,
                type_name: type_name.to_string(),
                name: attr_at(traversal, 0, "resource name")?,
            },
            1,
        ),
    };

    Ok(Reference {
        subject,
        range: traversal.range(),
        remaining: steps.iter().skip(consumed).cloned().collect(),
    })
}

/// Name of the attribute step at `index`, or an error naming what was expected.
fn attr_at(traversal: &Traversal, index: usize, what: &str) -> Result<String, Diagnostic> {
    match traversal.steps.get(index) {
        Some(TraverseStep::Attr { name, .. }) => Ok(name.clone()),
        Some(TraverseStep::Index { .. }) => Err(invalid(
            traversal,
            format!("a {what} must be given with attribute syntax"),
        )),
        None => Err(invalid(
            traversal,
            format!("a reference starting with {:?} must be followed by a {what}", traversal.root),
        )),
    }
}

fn invalid(traversal: &Traversal, detail: String) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::InvalidReference,
        format!("Invalid reference {traversal}"),
        detail,
    )
    .with_subject(traversal.range())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfxref_core::{ForExpr, IndexKey, SourceRange};

    fn r(col: usize, len: usize) -> SourceRange {
        SourceRange::single_line("main.tf", 1, col, len)
    }

    /// Build a traversal from a dotted path; `[n]` segments become index steps.
    fn trav(path: &str) -> Traversal {
        let mut parts = path.split('.');
        let root = parts.next().unwrap();
        let mut t = Traversal::new(root, r(1, root.len()));
        let mut col = root.len() + 1;
        for part in parts {
            let step = match part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
                Some(i) => TraverseStep::Index {
                    key: IndexKey::Int(i.parse().unwrap()),
                    range: r(col, part.len()),
                },
                None => TraverseStep::Attr {
                    name: part.to_string(),
                    range: r(col, part.len() + 1),
                },
            };
            col += part.len() + 1;
            t.steps.push(step);
        }
        t
    }

    fn expr(path: &str) -> Expr {
        Expr::ScopeTraversal(trav(path))
    }

    #[test]
    fn variable_and_local_references() {
        let reference = parse_reference(&trav("var.region")).unwrap();
        assert_eq!(reference.subject.to_string(), "var.region");
        assert!(reference.remaining.is_empty());

        let reference = parse_reference(&trav("local.tags.Name")).unwrap();
        assert_eq!(reference.subject.to_string(), "local.tags");
        assert_eq!(reference.remaining.len(), 1);
        assert_eq!(reference.remaining[0].attr_name(), Some("Name"));
    }

    #[test]
    fn module_output_and_call_references() {
        let reference = parse_reference(&trav("module.child.z")).unwrap();
        assert_eq!(reference.subject.to_string(), "module.child.output.z");

        let reference = parse_reference(&trav("module.child.[0].z.id")).unwrap();
        assert_eq!(reference.subject.to_string(), "module.child.output.z");
        assert_eq!(reference.remaining.len(), 1);

        let reference = parse_reference(&trav("module.child")).unwrap();
        assert_eq!(reference.subject.to_string(), "module.child");
    }

    #[test]
    fn resource_references_by_mode() {
        let managed = parse_reference(&trav("aws_instance.web.[0].id")).unwrap();
        assert_eq!(managed.subject.to_string(), "aws_instance.web");
        assert_eq!(managed.remaining.len(), 2);

        let explicit = parse_reference(&trav("resource.aws_instance.web")).unwrap();
        assert_eq!(explicit.subject, managed.subject);

        let data = parse_reference(&trav("data.aws_ami.ubuntu.id")).unwrap();
        assert_eq!(data.subject.to_string(), "data.aws_ami.ubuntu");
        assert_eq!(data.remaining.len(), 1);
    }

    #[test]
    fn meta_symbols_and_self() {
        assert_eq!(
            parse_reference(&trav("count.index")).unwrap().subject.to_string(),
            "count.index"
        );
        assert_eq!(
            parse_reference(&trav("each.value.name")).unwrap().subject.to_string(),
            "each.value"
        );
        let this = parse_reference(&trav("self.private_ip")).unwrap();
        assert_eq!(this.subject, Subject::SelfRef);
        assert_eq!(this.remaining.len(), 1);
    }

    #[test]
    fn malformed_references_become_diagnostics() {
        for bad in ["var", "data.aws_ami", "aws_instance", "template.x", "local.[0]"] {
            let diag = parse_reference(&trav(bad)).unwrap_err();
            assert_eq!(diag.kind, DiagnosticKind::InvalidReference, "for {bad}");
            assert!(diag.subject.is_some());
        }
    }

    #[test]
    fn reference_range_spans_whole_traversal() {
        let reference = parse_reference(&trav("var.region")).unwrap();
        assert_eq!(reference.range.start.column, 1);
        assert_eq!(reference.range.end.column, 11);
    }

    #[test]
    fn binary_operands_in_source_order() {
        let e = Expr::Binary {
            op: tfxref_core::BinaryOp::Add,
            lhs: Box::new(expr("var.y")),
            rhs: Box::new(expr("module.child.z")),
            range: r(1, 20),
        };
        let found: Vec<String> = traversals_in(&e).iter().map(|t| t.to_string()).collect();
        assert_eq!(found, vec!["var.y", "module.child.z"]);
    }

    #[test]
    fn for_iterators_are_not_references() {
        // [for s in var.subnets : s.id if local.enabled]
        let e = Expr::For(Box::new(ForExpr {
            key_var: None,
            value_var: "s".to_string(),
            collection: expr("var.subnets"),
            key: None,
            value: expr("s.id"),
            condition: Some(expr("local.enabled")),
            grouped: false,
            range: r(1, 40),
        }));
        let found: Vec<String> = traversals_in(&e).iter().map(|t| t.to_string()).collect();
        assert_eq!(found, vec!["var.subnets", "local.enabled"]);
    }

    #[test]
    fn template_for_directive_shadows_iterator() {
        let e = Expr::Template {
            parts: vec![TemplatePart::For {
                key_var: None,
                value_var: "name".to_string(),
                collection: expr("var.names"),
                body: vec![
                    TemplatePart::Interpolation(expr("name")),
                    TemplatePart::Interpolation(expr("local.suffix")),
                ],
            }],
            range: r(1, 40),
        };
        let found: Vec<String> = traversals_in(&e).iter().map(|t| t.to_string()).collect();
        assert_eq!(found, vec!["var.names", "local.suffix"]);
    }

    #[test]
    fn shadowing_ends_with_the_for_expression() {
        let inner = Expr::For(Box::new(ForExpr {
            key_var: Some("k".to_string()),
            value_var: "v".to_string(),
            collection: expr("var.m"),
            key: Some(expr("k")),
            value: expr("v"),
            condition: None,
            grouped: false,
            range: r(1, 20),
        }));
        let e = Expr::Tuple {
            items: vec![inner, expr("v.outside")],
            range: r(1, 30),
        };
        let found: Vec<String> = traversals_in(&e).iter().map(|t| t.to_string()).collect();
        assert_eq!(found, vec!["var.m", "v.outside"]);
    }

    #[test]
    fn splat_keeps_source_traversal_only() {
        let e = Expr::Splat {
            source: Box::new(expr("aws_instance.web")),
            each: vec![TraverseStep::Attr {
                name: "id".to_string(),
                range: r(20, 3),
            }],
            range: r(1, 23),
        };
        let found: Vec<String> = traversals_in(&e).iter().map(|t| t.to_string()).collect();
        assert_eq!(found, vec!["aws_instance.web"]);
    }

    #[test]
    fn explicit_shadow_list_is_honoured() {
        let e = expr("setting.value");
        assert!(traversals_excluding(&e, &["setting".to_string()]).is_empty());
        assert_eq!(traversals_in(&e).len(), 1);
    }
}
