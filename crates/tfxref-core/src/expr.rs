//! Owned expression and body syntax for configuration files.
//!
//! The HCL front end converts its concrete syntax tree into these types so the
//! indexer can walk expressions without holding on to parser buffers. Nothing
//! here evaluates anything: the tree only records shape and source ranges.

use crate::types::SourceRange;
use serde::Serialize;

// ── Traversals ──────────────────────────────────────────────────────────────

/// Key of a static index step (`foo[0]`, `foo["a"]`, legacy `foo.0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum IndexKey {
    Int(i64),
    Str(String),
}

impl std::fmt::Display for IndexKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "[{i}]"),
            Self::Str(s) => write!(f, "[{s:?}]"),
        }
    }
}

/// One step past the root of a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum TraverseStep {
    Attr { name: String, range: SourceRange },
    Index { key: IndexKey, range: SourceRange },
}

impl TraverseStep {
    pub fn range(&self) -> &SourceRange {
        match self {
            Self::Attr { range, .. } | Self::Index { range, .. } => range,
        }
    }

    /// The attribute name, if this is an attribute step.
    pub fn attr_name(&self) -> Option<&str> {
        match self {
            Self::Attr { name, .. } => Some(name),
            Self::Index { .. } => None,
        }
    }
}

impl std::fmt::Display for TraverseStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attr { name, .. } => write!(f, ".{name}"),
            Self::Index { key, .. } => write!(f, "{key}"),
        }
    }
}

/// A root-scoped traversal such as `var.region` or `aws_instance.web[0].id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    pub root: String,
    pub root_range: SourceRange,
    pub steps: Vec<TraverseStep>,
}

impl Traversal {
    pub fn new(root: impl Into<String>, root_range: SourceRange) -> Self {
        Self {
            root: root.into(),
            root_range,
            steps: Vec::new(),
        }
    }

    /// Range from the root name to the end of the last step.
    pub fn range(&self) -> SourceRange {
        match self.steps.last() {
            Some(step) => self.root_range.to(step.range()),
            None => self.root_range.clone(),
        }
    }
}

impl std::fmt::Display for Traversal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root)?;
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

// ── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => Self::Add,
            "-" => Self::Subtract,
            "*" => Self::Multiply,
            "/" => Self::Divide,
            "%" => Self::Modulo,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::Less,
            "<=" => Self::LessOrEqual,
            ">" => Self::Greater,
            ">=" => Self::GreaterOrEqual,
            "&&" => Self::And,
            "||" => Self::Or,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectItem {
    pub key: Expr,
    pub value: Expr,
}

/// `[for k, v in coll : value if cond]` and `{for k, v in coll : key => value...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForExpr {
    pub key_var: Option<String>,
    pub value_var: String,
    pub collection: Expr,
    /// Present for object-producing `for` expressions.
    pub key: Option<Expr>,
    pub value: Expr,
    pub condition: Option<Expr>,
    pub grouped: bool,
    pub range: SourceRange,
}

impl ForExpr {
    /// Names introduced by the `for` clause, visible in key/value/condition.
    pub fn iterator_names(&self) -> impl Iterator<Item = &str> {
        self.key_var
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.value_var.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Interpolation(Expr),
    If {
        condition: Expr,
        then: Vec<TemplatePart>,
        otherwise: Vec<TemplatePart>,
    },
    For {
        key_var: Option<String>,
        value_var: String,
        collection: Expr,
        body: Vec<TemplatePart>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: LiteralValue,
        range: SourceRange,
    },
    Template {
        parts: Vec<TemplatePart>,
        range: SourceRange,
    },
    ScopeTraversal(Traversal),
    /// Static steps applied to a non-variable source, e.g. `f(x).id`.
    RelativeTraversal {
        source: Box<Expr>,
        steps: Vec<TraverseStep>,
        range: SourceRange,
    },
    /// Index with a computed key, e.g. `var.list[local.i]`.
    Index {
        collection: Box<Expr>,
        key: Box<Expr>,
        range: SourceRange,
    },
    Splat {
        source: Box<Expr>,
        each: Vec<TraverseStep>,
        range: SourceRange,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
        expand_final: bool,
        range: SourceRange,
    },
    Tuple {
        items: Vec<Expr>,
        range: SourceRange,
    },
    Object {
        items: Vec<ObjectItem>,
        range: SourceRange,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        range: SourceRange,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        range: SourceRange,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
        range: SourceRange,
    },
    For(Box<ForExpr>),
    Parens {
        inner: Box<Expr>,
        range: SourceRange,
    },
    /// Syntax the front end does not model. Nested expressions stay reachable.
    Opaque {
        parts: Vec<Expr>,
        range: SourceRange,
    },
}

impl Expr {
    pub fn range(&self) -> SourceRange {
        match self {
            Self::ScopeTraversal(t) => t.range(),
            Self::For(f) => f.range.clone(),
            Self::Literal { range, .. }
            | Self::Template { range, .. }
            | Self::RelativeTraversal { range, .. }
            | Self::Index { range, .. }
            | Self::Splat { range, .. }
            | Self::FunctionCall { range, .. }
            | Self::Tuple { range, .. }
            | Self::Object { range, .. }
            | Self::Unary { range, .. }
            | Self::Binary { range, .. }
            | Self::Conditional { range, .. }
            | Self::Parens { range, .. }
            | Self::Opaque { range, .. } => range.clone(),
        }
    }

    pub fn string(value: impl Into<String>, range: SourceRange) -> Self {
        Self::Literal {
            value: LiteralValue::String(value.into()),
            range,
        }
    }

    pub fn as_traversal(&self) -> Option<&Traversal> {
        match self {
            Self::ScopeTraversal(t) => Some(t),
            Self::Parens { inner, .. } => inner.as_traversal(),
            _ => None,
        }
    }

    /// A bare identifier such as `string` or `count`, without any steps.
    pub fn as_keyword(&self) -> Option<&str> {
        self.as_traversal()
            .filter(|t| t.steps.is_empty())
            .map(|t| t.root.as_str())
    }

    /// The value of a string literal, or of a template made only of literal text.
    pub fn as_static_string(&self) -> Option<String> {
        match self {
            Self::Literal {
                value: LiteralValue::String(s),
                ..
            } => Some(s.clone()),
            Self::Template { parts, .. } => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(s) => out.push_str(s),
                        _ => return None,
                    }
                }
                Some(out)
            }
            Self::Parens { inner, .. } => inner.as_static_string(),
            _ => None,
        }
    }
}

// ── Bodies ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub expr: Expr,
    pub range: SourceRange,
    pub name_range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub type_name: String,
    pub labels: Vec<String>,
    pub body: Body,
    pub range: SourceRange,
    pub type_range: SourceRange,
}

/// Attributes and nested blocks of a block (or a whole file), in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
    pub range: SourceRange,
}

impl Body {
    pub fn empty(range: SourceRange) -> Self {
        Self {
            attributes: Vec::new(),
            blocks: Vec::new(),
            range,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Remove and return the named attribute.
    pub fn take_attribute(&mut self, name: &str) -> Option<Attribute> {
        let pos = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(pos))
    }

    /// Remove and return every nested block of the given type.
    pub fn take_blocks(&mut self, type_name: &str) -> Vec<Block> {
        let (taken, kept) = std::mem::take(&mut self.blocks)
            .into_iter()
            .partition(|b| b.type_name == type_name);
        self.blocks = kept;
        taken
    }
}
