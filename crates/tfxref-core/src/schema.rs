//! Attribute schemas used to read configuration bodies.
//!
//! A [`BlockSchema`] lists the attributes and nested block types a body may
//! contain. Schemas come from two places: provider schema registries for
//! resources, and synthesized on the fly from a module's variables for
//! module-call argument blocks.

use crate::TfxrefError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Type of an attribute value, in Terraform's type-constraint vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValueType {
    String,
    Number,
    Bool,
    /// Unknown or unconstrained (`any`).
    Dynamic,
    List(Box<ValueType>),
    Set(Box<ValueType>),
    Map(Box<ValueType>),
    Object(BTreeMap<String, ValueType>),
    Tuple(Vec<ValueType>),
}

impl ValueType {
    /// Decode a cty JSON type, as found in `terraform providers schema -json`.
    ///
    /// Primitive types are strings (`"string"`); collection and structural
    /// types are two-element arrays (`["list", "string"]`,
    /// `["object", {"a": "number"}]`).
    pub fn from_json(value: &serde_json::Value) -> Result<Self, TfxrefError> {
        use serde_json::Value;
        match value {
            Value::String(s) => match s.as_str() {
                "string" => Ok(Self::String),
                "number" => Ok(Self::Number),
                "bool" => Ok(Self::Bool),
                "dynamic" => Ok(Self::Dynamic),
                other => Err(TfxrefError::Schema(format!("unknown primitive type {other:?}"))),
            },
            Value::Array(items) if items.len() == 2 => {
                let kind = items[0]
                    .as_str()
                    .ok_or_else(|| TfxrefError::Schema(format!("invalid type {value}")))?;
                match kind {
                    "list" => Ok(Self::List(Box::new(Self::from_json(&items[1])?))),
                    "set" => Ok(Self::Set(Box::new(Self::from_json(&items[1])?))),
                    "map" => Ok(Self::Map(Box::new(Self::from_json(&items[1])?))),
                    "object" => {
                        let fields = items[1].as_object().ok_or_else(|| {
                            TfxrefError::Schema(format!("object type needs fields: {value}"))
                        })?;
                        let mut out = BTreeMap::new();
                        for (name, ty) in fields {
                            out.insert(name.clone(), Self::from_json(ty)?);
                        }
                        Ok(Self::Object(out))
                    }
                    "tuple" => {
                        let elems = items[1].as_array().ok_or_else(|| {
                            TfxrefError::Schema(format!("tuple type needs elements: {value}"))
                        })?;
                        Ok(Self::Tuple(
                            elems.iter().map(Self::from_json).collect::<Result<_, _>>()?,
                        ))
                    }
                    other => Err(TfxrefError::Schema(format!("unknown type kind {other:?}"))),
                }
            }
            _ => Err(TfxrefError::Schema(format!("invalid type {value}"))),
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Bool => write!(f, "bool"),
            Self::Dynamic => write!(f, "any"),
            Self::List(t) => write!(f, "list({t})"),
            Self::Set(t) => write!(f, "set({t})"),
            Self::Map(t) => write!(f, "map({t})"),
            Self::Object(fields) => {
                write!(f, "object({{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}={ty}")?;
                }
                write!(f, "}})")
            }
            Self::Tuple(elems) => {
                write!(f, "tuple([")?;
                for (i, ty) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, "])")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSchema {
    pub name: String,
    pub value_type: ValueType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
}

impl AttributeSchema {
    pub fn required(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: true,
            optional: false,
            computed: false,
        }
    }

    pub fn optional(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: false,
            optional: true,
            computed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    Single,
    Group,
    List,
    Set,
    Map,
}

impl std::str::FromStr for NestingMode {
    type Err = TfxrefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "group" => Ok(Self::Group),
            "list" => Ok(Self::List),
            "set" => Ok(Self::Set),
            "map" => Ok(Self::Map),
            _ => Err(TfxrefError::Schema(format!("unknown nesting mode {s:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedBlockSchema {
    pub type_name: String,
    pub nesting: NestingMode,
    pub block: BlockSchema,
}

/// Expected content of a block body. Attribute and block-type order is the
/// order entries were added, which is the order references are reported in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockSchema {
    pub attributes: Vec<AttributeSchema>,
    pub block_types: Vec<NestedBlockSchema>,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute. Names must be unique across attributes and block types.
    pub fn push_attribute(&mut self, attribute: AttributeSchema) -> Result<(), TfxrefError> {
        if self.contains(&attribute.name) {
            return Err(TfxrefError::DuplicateAttribute(attribute.name));
        }
        self.attributes.push(attribute);
        Ok(())
    }

    /// Add a nested block type. Names must be unique across attributes and block types.
    pub fn push_block_type(&mut self, block: NestedBlockSchema) -> Result<(), TfxrefError> {
        if self.contains(&block.type_name) {
            return Err(TfxrefError::DuplicateAttribute(block.type_name));
        }
        self.block_types.push(block);
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn block_type(&self, type_name: &str) -> Option<&NestedBlockSchema> {
        self.block_types.iter().find(|b| b.type_name == type_name)
    }

    fn contains(&self, name: &str) -> bool {
        self.attribute(name).is_some() || self.block_type(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cty_json_primitives_and_collections() {
        assert_eq!(ValueType::from_json(&json!("string")).unwrap(), ValueType::String);
        assert_eq!(
            ValueType::from_json(&json!(["list", "number"])).unwrap(),
            ValueType::List(Box::new(ValueType::Number))
        );
        assert_eq!(
            ValueType::from_json(&json!(["map", ["set", "bool"]])).unwrap(),
            ValueType::Map(Box::new(ValueType::Set(Box::new(ValueType::Bool))))
        );
    }

    #[test]
    fn cty_json_object_and_tuple() {
        let ty = ValueType::from_json(&json!(["object", {"name": "string", "size": "number"}]))
            .unwrap();
        assert_eq!(ty.to_string(), "object({name=string, size=number})");

        let tuple = ValueType::from_json(&json!(["tuple", ["string", "dynamic"]])).unwrap();
        assert_eq!(tuple.to_string(), "tuple([string, any])");
    }

    #[test]
    fn cty_json_rejects_garbage() {
        assert!(ValueType::from_json(&json!("float")).is_err());
        assert!(ValueType::from_json(&json!(["list"])).is_err());
        assert!(ValueType::from_json(&json!(42)).is_err());
    }

    #[test]
    fn push_attribute_rejects_duplicates() {
        let mut schema = BlockSchema::new();
        schema
            .push_attribute(AttributeSchema::required("name", ValueType::String))
            .unwrap();
        let err = schema
            .push_attribute(AttributeSchema::optional("name", ValueType::Dynamic))
            .unwrap_err();
        assert!(matches!(err, TfxrefError::DuplicateAttribute(n) if n == "name"));
        assert_eq!(schema.attributes.len(), 1);
    }

    #[test]
    fn block_type_names_share_namespace_with_attributes() {
        let mut schema = BlockSchema::new();
        schema
            .push_attribute(AttributeSchema::optional("tags", ValueType::Dynamic))
            .unwrap();
        let nested = NestedBlockSchema {
            type_name: "tags".to_string(),
            nesting: NestingMode::List,
            block: BlockSchema::new(),
        };
        assert!(schema.push_block_type(nested).is_err());
    }

    #[test]
    fn nesting_mode_parses_known_names() {
        assert_eq!("set".parse::<NestingMode>().unwrap(), NestingMode::Set);
        assert!("tree".parse::<NestingMode>().is_err());
    }
}
