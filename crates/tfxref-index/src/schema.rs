//! Synthetic schemas for module-call argument blocks.

use tfxref_core::{AttributeSchema, BlockSchema, TfxrefError, ValueType, Variable};

/// Build the argument schema of a module from its variable declarations.
///
/// A variable without a default is required; one without a type constraint
/// accepts any value. Duplicate names mean the loader handed over a broken
/// module, so they are an error rather than silently collapsed.
pub fn synthetic_schema(variables: &[Variable]) -> Result<BlockSchema, TfxrefError> {
    let mut schema = BlockSchema::new();
    for variable in variables {
        let value_type = variable.value_type.clone().unwrap_or(ValueType::Dynamic);
        let attribute = if variable.is_required() {
            AttributeSchema::required(&variable.name, value_type)
        } else {
            AttributeSchema::optional(&variable.name, value_type)
        };
        schema.push_attribute(attribute)?;
    }
    Ok(schema)
}
