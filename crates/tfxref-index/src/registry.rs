//! In-memory provider schema registry.
//!
//! Populated programmatically or from the JSON document printed by
//! `terraform providers schema -json`.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tfxref_core::{
    AttributeSchema, BlockSchema, NestedBlockSchema, ProviderAddr, ResourceMode, SchemaRegistry,
    TfxrefError, ValueType,
};

type SchemaKey = (ProviderAddr, ResourceMode, String);

/// Resource and data source schemas keyed by provider, mode and type.
#[derive(Debug, Default, Clone)]
pub struct ProviderSchemaRegistry {
    schemas: HashMap<SchemaKey, Arc<BlockSchema>>,
}

impl ProviderSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the schema for one resource type.
    pub fn insert(
        &mut self,
        provider: ProviderAddr,
        mode: ResourceMode,
        resource_type: impl Into<String>,
        schema: BlockSchema,
    ) {
        self.schemas
            .insert((provider, mode, resource_type.into()), Arc::new(schema));
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Load a `terraform providers schema -json` document from disk.
    pub fn load(path: &Path) -> Result<Self, TfxrefError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse a `terraform providers schema -json` document.
    pub fn from_json_str(json: &str) -> Result<Self, TfxrefError> {
        let doc: SchemasDoc = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (addr, provider) in doc.provider_schemas {
            let addr: ProviderAddr = addr.parse()?;
            for (type_name, resource) in provider.resource_schemas {
                let block = convert_block(&resource.block)
                    .map_err(|e| TfxrefError::Schema(format!("{addr} {type_name}: {e}")))?;
                registry.insert(addr.clone(), ResourceMode::Managed, type_name, block);
            }
            for (type_name, resource) in provider.data_source_schemas {
                let block = convert_block(&resource.block)
                    .map_err(|e| TfxrefError::Schema(format!("{addr} data {type_name}: {e}")))?;
                registry.insert(addr.clone(), ResourceMode::Data, type_name, block);
            }
        }
        tracing::debug!("Loaded {} resource schemas", registry.len());
        Ok(registry)
    }
}

impl SchemaRegistry for ProviderSchemaRegistry {
    fn schema_for(
        &self,
        provider: &ProviderAddr,
        mode: ResourceMode,
        resource_type: &str,
    ) -> Option<Arc<BlockSchema>> {
        self.schemas
            .get(&(provider.clone(), mode, resource_type.to_string()))
            .cloned()
    }
}

// ── JSON Document ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SchemasDoc {
    #[serde(default)]
    provider_schemas: BTreeMap<String, ProviderSchemaDoc>,
}

#[derive(Deserialize)]
struct ProviderSchemaDoc {
    #[serde(default)]
    resource_schemas: BTreeMap<String, ResourceSchemaDoc>,
    #[serde(default)]
    data_source_schemas: BTreeMap<String, ResourceSchemaDoc>,
}

#[derive(Deserialize)]
struct ResourceSchemaDoc {
    block: BlockDoc,
}

#[derive(Deserialize, Default)]
struct BlockDoc {
    #[serde(default)]
    attributes: BTreeMap<String, AttributeDoc>,
    #[serde(default)]
    block_types: BTreeMap<String, BlockTypeDoc>,
}

#[derive(Deserialize)]
struct AttributeDoc {
    #[serde(rename = "type")]
    value_type: Option<serde_json::Value>,
    /// Protocol 6 nested attributes; only the shape of the value matters here.
    nested_type: Option<serde_json::Value>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    computed: bool,
}

#[derive(Deserialize)]
struct BlockTypeDoc {
    nesting_mode: String,
    #[serde(default)]
    block: BlockDoc,
}

fn convert_block(doc: &BlockDoc) -> Result<BlockSchema, TfxrefError> {
    let mut block = BlockSchema::new();
    for (name, attr) in &doc.attributes {
        let value_type = match (&attr.value_type, &attr.nested_type) {
            (Some(ty), _) => ValueType::from_json(ty)?,
            (None, Some(_)) => ValueType::Dynamic,
            (None, None) => {
                return Err(TfxrefError::Schema(format!(
                    "attribute {name:?} has neither type nor nested_type"
                )))
            }
        };
        block.push_attribute(AttributeSchema {
            name: name.clone(),
            value_type,
            required: attr.required,
            optional: attr.optional,
            computed: attr.computed,
        })?;
    }
    for (type_name, nested) in &doc.block_types {
        block.push_block_type(NestedBlockSchema {
            type_name: type_name.clone(),
            nesting: nested.nesting_mode.parse()?,
            block: convert_block(&nested.block)?,
        })?;
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA_JSON: &str = r#"{
  "format_version": "1.0",
  "provider_schemas": {
    "registry.terraform.io/hashicorp/aws": {
      "provider": { "version": 0, "block": {} },
      "resource_schemas": {
        "aws_instance": {
          "version": 1,
          "block": {
            "attributes": {
              "ami": { "type": "string", "required": true },
              "id": { "type": "string", "computed": true, "optional": true },
              "tags": { "type": ["map", "string"], "optional": true }
            },
            "block_types": {
              "ebs_block_device": {
                "nesting_mode": "set",
                "block": {
                  "attributes": {
                    "volume_size": { "type": "number", "optional": true }
                  }
                }
              }
            }
          }
        }
      },
      "data_source_schemas": {
        "aws_ami": {
          "version": 0,
          "block": {
            "attributes": {
              "owners": { "type": ["list", "string"], "optional": true },
              "filter_spec": { "nested_type": { "nesting_mode": "single" }, "optional": true }
            }
          }
        }
      }
    }
  }
}"#;

    #[test]
    fn loads_resource_and_data_schemas() {
        let registry = ProviderSchemaRegistry::from_json_str(SCHEMA_JSON).unwrap();
        assert_eq!(registry.len(), 2);

        let aws = ProviderAddr::implied("aws");
        let instance = registry
            .schema_for(&aws, ResourceMode::Managed, "aws_instance")
            .unwrap();
        assert!(instance.attribute("ami").unwrap().required);
        assert_eq!(
            instance.attribute("tags").unwrap().value_type,
            ValueType::Map(Box::new(ValueType::String))
        );
        let ebs = instance.block_type("ebs_block_device").unwrap();
        assert_eq!(ebs.nesting, tfxref_core::NestingMode::Set);
        assert!(ebs.block.attribute("volume_size").is_some());

        let ami = registry.schema_for(&aws, ResourceMode::Data, "aws_ami").unwrap();
        assert_eq!(
            ami.attribute("filter_spec").unwrap().value_type,
            ValueType::Dynamic
        );
    }

    #[test]
    fn lookup_distinguishes_mode_and_provider() {
        let registry = ProviderSchemaRegistry::from_json_str(SCHEMA_JSON).unwrap();
        let aws = ProviderAddr::implied("aws");
        assert!(registry
            .schema_for(&aws, ResourceMode::Data, "aws_instance")
            .is_none());
        let fork: ProviderAddr = "acme/aws".parse().unwrap();
        assert!(registry
            .schema_for(&fork, ResourceMode::Managed, "aws_instance")
            .is_none());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = ProviderSchemaRegistry::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, TfxrefError::Json(_)));
    }

    #[test]
    fn unknown_nesting_mode_is_a_schema_error() {
        let json = r#"{"provider_schemas": {"hashicorp/x": {"resource_schemas": {
            "x_thing": {"block": {"block_types": {"b": {"nesting_mode": "weird"}}}}}}}}"#;
        let err = ProviderSchemaRegistry::from_json_str(json).unwrap_err();
        assert!(matches!(err, TfxrefError::Schema(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("tfxref_registry_load_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("schemas.json");
        std::fs::write(&path, SCHEMA_JSON).unwrap();

        let registry = ProviderSchemaRegistry::load(&path).unwrap();
        assert!(!registry.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
