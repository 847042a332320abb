//! HCL (HashiCorp Configuration Language) syntax conversion using tree-sitter-hcl.
//!
//! Converts the concrete syntax tree into the owned [`Body`] / [`Expr`] model
//! from `tfxref-core`. The grammar hides its `_expr_term` rule, so postfix
//! steps (`get_attr`, `index`, `splat`) show up as siblings of the term they
//! apply to, and binary operands appear flattened inside `binary_operation`.
//! Conversion therefore works on child sequences rather than single nodes.

use tfxref_core::{
    Attribute, BinaryOp, Block, Body, Expr, ForExpr, IndexKey, LiteralValue, ObjectItem,
    SourcePos, SourceRange, TemplatePart, Traversal, TraverseStep, UnaryOp,
};
use tree_sitter::Node;

/// Converts nodes of one parsed file.
pub(crate) struct Converter<'a> {
    source: &'a [u8],
    filename: &'a str,
}

impl<'a> Converter<'a> {
    pub(crate) fn new(source: &'a [u8], filename: &'a str) -> Self {
        Self { source, filename }
    }

    pub(crate) fn range(&self, node: Node) -> SourceRange {
        let start = node.start_position();
        let end = node.end_position();
        SourceRange::new(
            self.filename,
            SourcePos {
                line: start.row + 1,
                column: start.column + 1,
                byte: node.start_byte(),
            },
            SourcePos {
                line: end.row + 1,
                column: end.column + 1,
                byte: node.end_byte(),
            },
        )
    }

    fn text(&self, node: Node) -> String {
        node_text(node, self.source)
    }

    // ── Structure ───────────────────────────────────────────────────────

    /// Convert the `config_file` root. Files holding a bare object (JSON-ish
    /// syntax) yield an empty body.
    pub(crate) fn config_file(&self, root: Node) -> Body {
        match children(root).into_iter().find(|c| c.kind() == "body") {
            Some(body) => self.body(body),
            None => Body::empty(self.range(root)),
        }
    }

    pub(crate) fn body(&self, node: Node) -> Body {
        let mut body = Body::empty(self.range(node));
        for child in named_children(node) {
            match child.kind() {
                "attribute" => {
                    if let Some(attr) = self.attribute(child) {
                        body.attributes.push(attr);
                    }
                }
                "block" => {
                    if let Some(block) = self.block(child) {
                        body.blocks.push(block);
                    }
                }
                other => tracing::trace!("Skipping {} node in body", other),
            }
        }
        body
    }

    fn attribute(&self, node: Node) -> Option<Attribute> {
        let kids = children(node);
        let name = kids.iter().find(|c| c.kind() == "identifier")?;
        let expr = kids.iter().find(|c| c.kind() == "expression")?;
        Some(Attribute {
            name: self.text(*name),
            expr: self.expression(*expr),
            range: self.range(node),
            name_range: self.range(*name),
        })
    }

    /// HCL blocks have this structure: `identifier (string_lit | identifier)* block_start body? block_end`
    /// For example: `resource "aws_s3_bucket" "my_bucket" { ... }`
    fn block(&self, node: Node) -> Option<Block> {
        let (type_node, labels) = extract_block_type_and_labels(node, self.source);
        let type_node = type_node?;
        let body = match find_body(node) {
            Some(b) => self.body(b),
            None => Body::empty(self.range(node)),
        };
        Some(Block {
            type_name: self.text(type_node),
            labels,
            body,
            range: self.range(node),
            type_range: self.range(type_node),
        })
    }

    // ── Expressions ─────────────────────────────────────────────────────

    pub(crate) fn expression(&self, node: Node) -> Expr {
        if node.kind() == "expression" {
            self.sequence(&children(node), self.range(node))
        } else {
            self.primary(node)
        }
    }

    /// A term followed by any number of postfix steps, optionally parenthesized.
    fn sequence(&self, nodes: &[Node], range: SourceRange) -> Expr {
        let Some(first) = nodes.first() else {
            return Expr::Opaque {
                parts: Vec::new(),
                range,
            };
        };

        let (mut current, rest) = if first.kind() == "(" {
            let close = nodes
                .iter()
                .position(|n| n.kind() == ")")
                .unwrap_or(nodes.len() - 1);
            let inner = nodes[..close]
                .iter()
                .find(|n| n.is_named())
                .map(|n| self.expression(*n))
                .unwrap_or_else(|| Expr::Opaque {
                    parts: Vec::new(),
                    range: range.clone(),
                });
            let parens = Expr::Parens {
                inner: Box::new(inner),
                range: self.range(*first).to(&self.range(nodes[close])),
            };
            (parens, close + 1)
        } else {
            (self.primary(*first), 1)
        };

        let operation = first.kind() == "operation";
        for node in nodes.iter().skip(rest) {
            current = if operation {
                self.postfix_operand(current, *node)
            } else {
                self.postfix(current, *node)
            };
        }
        current
    }

    /// Postfix steps that follow an operation in the syntax tree belong to
    /// its rightmost operand: `a + b.c` is `a + (b.c)`.
    fn postfix_operand(&self, current: Expr, node: Node) -> Expr {
        match current {
            Expr::Binary { op, lhs, rhs, range } => {
                let rhs = self.postfix_operand(*rhs, node);
                let range = range.to(&rhs.range());
                Expr::Binary {
                    op,
                    lhs,
                    rhs: Box::new(rhs),
                    range,
                }
            }
            Expr::Unary { op, operand, range } => {
                let operand = self.postfix_operand(*operand, node);
                let range = range.to(&operand.range());
                Expr::Unary {
                    op,
                    operand: Box::new(operand),
                    range,
                }
            }
            other => self.postfix(other, node),
        }
    }

    fn postfix(&self, current: Expr, node: Node) -> Expr {
        match node.kind() {
            "get_attr" => match self.get_attr(node) {
                Some(step) => apply_step(current, step),
                None => current,
            },
            "index" => {
                let Some(inner) = named_children(node).into_iter().next() else {
                    return current;
                };
                let range = self.range(node);
                match inner.kind() {
                    "legacy_index" => {
                        let digits = self.text(inner);
                        match digits.trim_start_matches('.').parse::<i64>() {
                            Ok(i) => apply_step(
                                current,
                                TraverseStep::Index {
                                    key: IndexKey::Int(i),
                                    range,
                                },
                            ),
                            Err(_) => current,
                        }
                    }
                    _ => {
                        let Some(key_node) = named_children(inner)
                            .into_iter()
                            .find(|c| c.kind() == "expression")
                        else {
                            return current;
                        };
                        let key = self.expression(key_node);
                        match static_index_key(&key) {
                            Some(k) => apply_step(current, TraverseStep::Index { key: k, range }),
                            None => {
                                let full = current.range().to(&range);
                                Expr::Index {
                                    collection: Box::new(current),
                                    key: Box::new(key),
                                    range: full,
                                }
                            }
                        }
                    }
                }
            }
            "splat" => {
                let mut each = Vec::new();
                if let Some(inner) = named_children(node).into_iter().next() {
                    for step in named_children(inner) {
                        match step.kind() {
                            "get_attr" => each.extend(self.get_attr(step)),
                            "index" => each.extend(self.static_index(step)),
                            _ => {}
                        }
                    }
                }
                let range = current.range().to(&self.range(node));
                Expr::Splat {
                    source: Box::new(current),
                    each,
                    range,
                }
            }
            other => {
                tracing::trace!("Ignoring {} after expression term", other);
                current
            }
        }
    }

    fn get_attr(&self, node: Node) -> Option<TraverseStep> {
        let ident = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "identifier")?;
        Some(TraverseStep::Attr {
            name: self.text(ident),
            range: self.range(node),
        })
    }

    fn static_index(&self, node: Node) -> Option<TraverseStep> {
        match self.postfix(
            Expr::Opaque {
                parts: Vec::new(),
                range: self.range(node),
            },
            node,
        ) {
            Expr::RelativeTraversal { mut steps, .. } => steps.pop(),
            _ => None,
        }
    }

    fn primary(&self, node: Node) -> Expr {
        let range = self.range(node);
        match node.kind() {
            "expression" => self.expression(node),
            "literal_value" => match named_children(node).into_iter().next() {
                Some(lit) => self.literal(lit),
                None => Expr::Opaque {
                    parts: Vec::new(),
                    range,
                },
            },
            "numeric_lit" | "bool_lit" | "null_lit" | "string_lit" => self.literal(node),
            "template_expr" => match named_children(node).into_iter().next() {
                Some(inner) => Expr::Template {
                    parts: self.template_parts(&named_children(inner)),
                    range,
                },
                None => Expr::Template {
                    parts: Vec::new(),
                    range,
                },
            },
            "quoted_template" | "heredoc_template" => Expr::Template {
                parts: self.template_parts(&named_children(node)),
                range,
            },
            "collection_value" | "for_expr" | "operation" => {
                match named_children(node).into_iter().next() {
                    Some(inner) => self.primary(inner),
                    None => Expr::Opaque {
                        parts: Vec::new(),
                        range,
                    },
                }
            }
            "tuple" => Expr::Tuple {
                items: self.expressions_in(node),
                range,
            },
            "object" => Expr::Object {
                items: named_children(node)
                    .into_iter()
                    .filter(|c| c.kind() == "object_elem")
                    .filter_map(|elem| self.object_elem(elem))
                    .collect(),
                range,
            },
            "variable_expr" => {
                let name = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() == "identifier")
                    .map(|c| self.text(c))
                    .unwrap_or_else(|| self.text(node));
                Expr::ScopeTraversal(Traversal::new(name, range))
            }
            "function_call" => self.function_call(node),
            "for_tuple_expr" | "for_object_expr" => self.for_expr(node),
            "unary_operation" => {
                let kids = children(node);
                let op = match kids.first().map(|k| k.kind()) {
                    Some("!") => UnaryOp::Not,
                    _ => UnaryOp::Negate,
                };
                let operand = self.sequence(kids.get(1..).unwrap_or(&[]), range.clone());
                Expr::Unary {
                    op,
                    operand: Box::new(operand),
                    range,
                }
            }
            "binary_operation" => {
                let kids = children(node);
                let split = kids.iter().enumerate().skip(1).find_map(|(i, k)| {
                    if k.is_named() {
                        None
                    } else {
                        BinaryOp::from_token(k.kind()).map(|op| (i, op))
                    }
                });
                match split {
                    Some((i, op)) => Expr::Binary {
                        op,
                        lhs: Box::new(self.sequence(&kids[..i], range.clone())),
                        rhs: Box::new(self.sequence(&kids[i + 1..], range.clone())),
                        range,
                    },
                    None => self.opaque(node),
                }
            }
            "conditional" => {
                let mut exprs = self.expressions_in(node).into_iter();
                match (exprs.next(), exprs.next(), exprs.next()) {
                    (Some(condition), Some(then), Some(otherwise)) => Expr::Conditional {
                        condition: Box::new(condition),
                        then: Box::new(then),
                        otherwise: Box::new(otherwise),
                        range,
                    },
                    _ => self.opaque(node),
                }
            }
            _ => self.opaque(node),
        }
    }

    fn opaque(&self, node: Node) -> Expr {
        Expr::Opaque {
            parts: named_children(node)
                .into_iter()
                .map(|c| self.primary(c))
                .collect(),
            range: self.range(node),
        }
    }

    fn expressions_in(&self, node: Node) -> Vec<Expr> {
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "expression")
            .map(|c| self.expression(c))
            .collect()
    }

    fn literal(&self, node: Node) -> Expr {
        let range = self.range(node);
        let value = match node.kind() {
            "numeric_lit" => match self.text(node).parse::<f64>() {
                Ok(n) => LiteralValue::Number(n),
                Err(_) => return Expr::Opaque { parts: Vec::new(), range },
            },
            "bool_lit" => LiteralValue::Bool(self.text(node) == "true"),
            "null_lit" => LiteralValue::Null,
            "string_lit" => {
                let raw: String = named_children(node)
                    .into_iter()
                    .filter(|c| c.kind() == "template_literal")
                    .map(|c| self.text(c))
                    .collect();
                LiteralValue::String(unescape(&raw))
            }
            _ => return Expr::Opaque { parts: Vec::new(), range },
        };
        Expr::Literal { value, range }
    }

    fn object_elem(&self, node: Node) -> Option<ObjectItem> {
        let exprs: Vec<Node> = named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "expression")
            .collect();
        let key_node = node.child_by_field_name("key").or(exprs.first().copied())?;
        let val_node = node.child_by_field_name("val").or(exprs.last().copied())?;
        let key = match self.expression(key_node) {
            // A bare name is a literal key, not a variable read.
            Expr::ScopeTraversal(t) if t.steps.is_empty() => Expr::string(t.root, t.root_range),
            other => other,
        };
        Some(ObjectItem {
            key,
            value: self.expression(val_node),
        })
    }

    fn function_call(&self, node: Node) -> Expr {
        let kids = children(node);
        let open = kids.iter().find(|c| c.kind() == "(");
        let name = match open {
            Some(open) => String::from_utf8_lossy(&self.source[node.start_byte()..open.start_byte()])
                .trim()
                .to_string(),
            None => kids
                .iter()
                .find(|c| c.kind() == "identifier")
                .map(|c| self.text(*c))
                .unwrap_or_default(),
        };
        let (args, expand_final) = match kids.iter().find(|c| c.kind() == "function_arguments") {
            Some(arguments) => (
                self.expressions_in(*arguments),
                children(*arguments).iter().any(|c| c.kind() == "ellipsis"),
            ),
            None => (Vec::new(), false),
        };
        Expr::FunctionCall {
            name,
            args,
            expand_final,
            range: self.range(node),
        }
    }

    fn for_expr(&self, node: Node) -> Expr {
        let kids = named_children(node);
        let Some(intro) = kids.iter().find(|c| c.kind() == "for_intro") else {
            return self.opaque(node);
        };
        let names: Vec<String> = named_children(*intro)
            .into_iter()
            .filter(|c| c.kind() == "identifier")
            .map(|c| self.text(c))
            .collect();
        let Some(collection) = self.expressions_in(*intro).into_iter().next() else {
            return self.opaque(node);
        };
        let (key_var, value_var) = match names.as_slice() {
            [value] => (None, value.clone()),
            [key, value] => (Some(key.clone()), value.clone()),
            _ => return self.opaque(node),
        };

        let mut body = self.expressions_in(node).into_iter();
        let (key, value) = if node.kind() == "for_object_expr" {
            match (body.next(), body.next()) {
                (Some(k), Some(v)) => (Some(k), v),
                _ => return self.opaque(node),
            }
        } else {
            match body.next() {
                Some(v) => (None, v),
                None => return self.opaque(node),
            }
        };
        let condition = kids
            .iter()
            .find(|c| c.kind() == "for_cond")
            .and_then(|c| self.expressions_in(*c).into_iter().next());
        let grouped = children(node).iter().any(|c| c.kind() == "ellipsis");

        Expr::For(Box::new(ForExpr {
            key_var,
            value_var,
            collection,
            key,
            value,
            condition,
            grouped,
            range: self.range(node),
        }))
    }

    // ── Templates ───────────────────────────────────────────────────────

    fn template_parts(&self, nodes: &[Node]) -> Vec<TemplatePart> {
        let mut parts = Vec::new();
        for node in nodes {
            match node.kind() {
                "template_literal" => {
                    parts.push(TemplatePart::Literal(unescape(&self.text(*node))))
                }
                "template_interpolation" => {
                    if let Some(expr) = self.expressions_in(*node).into_iter().next() {
                        parts.push(TemplatePart::Interpolation(expr));
                    }
                }
                "template_directive" => {
                    if let Some(inner) = named_children(*node).into_iter().next() {
                        parts.extend(self.template_directive(inner));
                    }
                }
                "template_for" | "template_if" => parts.extend(self.template_directive(*node)),
                _ => {}
            }
        }
        parts
    }

    fn template_directive(&self, node: Node) -> Option<TemplatePart> {
        let kids = named_children(node);
        match node.kind() {
            "template_for" => {
                let start = kids.iter().find(|c| c.kind() == "template_for_start")?;
                let names: Vec<String> = named_children(*start)
                    .into_iter()
                    .filter(|c| c.kind() == "identifier")
                    .map(|c| self.text(c))
                    .collect();
                let collection = self.expressions_in(*start).into_iter().next()?;
                let (key_var, value_var) = match names.as_slice() {
                    [value] => (None, value.clone()),
                    [key, value] => (Some(key.clone()), value.clone()),
                    _ => return None,
                };
                let body: Vec<Node> = kids
                    .iter()
                    .copied()
                    .filter(|c| !matches!(c.kind(), "template_for_start" | "template_for_end"))
                    .collect();
                Some(TemplatePart::For {
                    key_var,
                    value_var,
                    collection,
                    body: self.template_parts(&body),
                })
            }
            "template_if" => {
                let intro = kids.iter().find(|c| c.kind() == "template_if_intro")?;
                let condition = self.expressions_in(*intro).into_iter().next()?;
                let mut then = Vec::new();
                let mut otherwise = Vec::new();
                let mut in_else = false;
                for kid in &kids {
                    match kid.kind() {
                        "template_if_intro" | "template_if_end" => {}
                        "template_else_intro" => in_else = true,
                        _ if in_else => otherwise.push(*kid),
                        _ => then.push(*kid),
                    }
                }
                Some(TemplatePart::If {
                    condition,
                    then: self.template_parts(&then),
                    otherwise: self.template_parts(&otherwise),
                })
            }
            _ => None,
        }
    }
}

// ── Helper Functions ──────────────────────────────────────────────────────

fn apply_step(current: Expr, step: TraverseStep) -> Expr {
    match current {
        Expr::ScopeTraversal(mut t) => {
            t.steps.push(step);
            Expr::ScopeTraversal(t)
        }
        Expr::RelativeTraversal {
            source,
            mut steps,
            range,
        } => {
            let range = range.to(step.range());
            steps.push(step);
            Expr::RelativeTraversal {
                source,
                steps,
                range,
            }
        }
        other => {
            let range = other.range().to(step.range());
            Expr::RelativeTraversal {
                source: Box::new(other),
                steps: vec![step],
                range,
            }
        }
    }
}

/// Index keys that can stay part of a static traversal.
fn static_index_key(key: &Expr) -> Option<IndexKey> {
    match key {
        Expr::Literal {
            value: LiteralValue::Number(n),
            ..
        } if n.fract() == 0.0 => Some(IndexKey::Int(*n as i64)),
        Expr::Literal {
            value: LiteralValue::String(s),
            ..
        } => Some(IndexKey::Str(s.clone())),
        Expr::Template { .. } => key.as_static_string().map(IndexKey::Str),
        _ => None,
    }
}

/// All children except comments.
fn children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let kids = node.children(&mut cursor).filter(|c| !c.is_extra()).collect();
    kids
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let kids = node
        .named_children(&mut cursor)
        .filter(|c| !c.is_extra())
        .collect();
    kids
}

pub(crate) fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

/// Extract the block type node (first identifier) and labels (subsequent
/// string_lit/identifier children before the block_start) from a block node.
fn extract_block_type_and_labels<'t>(node: Node<'t>, source: &[u8]) -> (Option<Node<'t>>, Vec<String>) {
    let mut block_type = None;
    let mut labels = Vec::new();

    for child in children(node) {
        match child.kind() {
            "identifier" if block_type.is_none() => block_type = Some(child),
            "identifier" => labels.push(node_text(child, source)),
            "string_lit" => {
                // String labels are quoted; strip the quotes
                let raw = node_text(child, source);
                let unquoted = raw.trim_start_matches('"').trim_end_matches('"');
                labels.push(unescape(unquoted));
            }
            "block_start" => break, // Stop at opening brace
            _ => {}
        }
    }

    (block_type, labels)
}

/// Find the `body` child node inside a block.
fn find_body(node: Node) -> Option<Node> {
    children(node).into_iter().find(|c| c.kind() == "body")
}

/// Resolve HCL string escapes and the `$${` / `%%{` template escapes.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '$' | '%' if chars.peek() == Some(&c) => {
                chars.next();
                if chars.peek() == Some(&'{') {
                    out.push(c);
                } else {
                    out.push(c);
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::{Parser, Tree};

    fn parse_hcl(source: &str) -> Tree {
        let mut parser = Parser::new();
        let lang = tree_sitter_hcl::LANGUAGE;
        parser
            .set_language(&lang.into())
            .expect("failed to set HCL language");
        parser
            .parse(source.as_bytes(), None)
            .expect("failed to parse")
    }

    fn convert(source: &str) -> Body {
        let tree = parse_hcl(source);
        Converter::new(source.as_bytes(), "main.tf").config_file(tree.root_node())
    }

    fn attr_expr(body: &Body, name: &str) -> Expr {
        body.attribute(name)
            .unwrap_or_else(|| panic!("missing attribute {name}: {body:#?}"))
            .expr
            .clone()
    }

    #[test]
    fn converts_block_type_labels_and_body() {
        let body = convert(
            r#"
resource "aws_s3_bucket" "my_bucket" {
  bucket = "my-unique-bucket"
}
"#,
        );
        assert_eq!(body.blocks.len(), 1);
        let block = &body.blocks[0];
        assert_eq!(block.type_name, "resource");
        assert_eq!(block.labels, vec!["aws_s3_bucket", "my_bucket"]);
        assert_eq!(block.range.start.line, 2);
        let bucket = attr_expr(&block.body, "bucket");
        assert_eq!(bucket.as_static_string().as_deref(), Some("my-unique-bucket"));
    }

    #[test]
    fn converts_scope_traversal_with_steps() {
        let body = convert("a = var.region\nb = module.vpc.subnets[0]\n");
        let a = attr_expr(&body, "a");
        let t = a.as_traversal().expect("traversal");
        assert_eq!(t.to_string(), "var.region");
        assert_eq!(t.root_range.start.line, 1);
        assert_eq!(t.root_range.start.column, 5);

        let b = attr_expr(&body, "b");
        let t = b.as_traversal().expect("traversal");
        assert_eq!(t.to_string(), "module.vpc.subnets[0]");
    }

    #[test]
    fn steps_after_an_operator_bind_to_the_right_operand() {
        let body = convert("x = var.y + module.child.z\ny = !var.f.g\n");
        match attr_expr(&body, "x") {
            Expr::Binary { lhs, rhs, range, .. } => {
                assert_eq!(lhs.as_traversal().expect("lhs").to_string(), "var.y");
                assert_eq!(rhs.as_traversal().expect("rhs").to_string(), "module.child.z");
                assert_eq!(range.end.column, 27);
            }
            other => panic!("expected binary operation, got {other:?}"),
        }
        match attr_expr(&body, "y") {
            Expr::Unary { operand, .. } => {
                assert_eq!(operand.as_traversal().expect("operand").to_string(), "var.f.g");
            }
            other => panic!("expected unary operation, got {other:?}"),
        }
    }

    #[test]
    fn converts_unlabeled_nested_blocks() {
        let body = convert(
            r#"
locals {
  environment = "production"
  project     = "tfxref"
}
"#,
        );
        let locals = &body.blocks[0];
        assert_eq!(locals.type_name, "locals");
        assert!(locals.labels.is_empty());
        assert_eq!(locals.body.attributes.len(), 2);
        assert_eq!(locals.body.attributes[1].name, "project");
    }

    #[test]
    fn literal_values_keep_their_types() {
        let body = convert("n = 42\nb = true\nz = null\n");
        assert!(matches!(
            attr_expr(&body, "n"),
            Expr::Literal { value: LiteralValue::Number(n), .. } if n == 42.0
        ));
        assert!(matches!(
            attr_expr(&body, "b"),
            Expr::Literal { value: LiteralValue::Bool(true), .. }
        ));
        assert!(matches!(
            attr_expr(&body, "z"),
            Expr::Literal { value: LiteralValue::Null, .. }
        ));
    }

    #[test]
    fn function_call_arguments_are_converted() {
        let body = convert("x = max(var.a, local.b)\n");
        match attr_expr(&body, "x") {
            Expr::FunctionCall { name, args, .. } => {
                assert_eq!(name, "max");
                assert_eq!(args.len(), 2);
                assert_eq!(args[0].as_traversal().unwrap().to_string(), "var.a");
            }
            other => panic!("expected function call, got {other:#?}"),
        }
    }

    #[test]
    fn unescape_handles_quotes_and_template_escapes() {
        assert_eq!(unescape(r#"a\"b"#), "a\"b");
        assert_eq!(unescape(r"line\nnext"), "line\nnext");
        assert_eq!(unescape("$${literal}"), "${literal}");
        assert_eq!(unescape("100%%"), "100%%");
    }

    #[test]
    fn object_bare_keys_become_literals() {
        let body = convert("tags = { Name = var.name }\n");
        match attr_expr(&body, "tags") {
            Expr::Object { items, .. } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].key.as_static_string().as_deref(), Some("Name"));
                assert_eq!(
                    items[0].value.as_traversal().unwrap().to_string(),
                    "var.name"
                );
            }
            other => panic!("expected object, got {other:#?}"),
        }
    }
}
