use crate::error::{PathDbError, Result};
use super::types::Schema;
use std::path::Path;

/// Parse a schema YAML file (`uniqueFields` / `nonUniqueFields`) into a Schema
pub fn parse_schema(path: &Path) -> Result<Schema> {
    let content = std::fs::read_to_string(path)?;
    parse_schema_str(&content)
}

/// Parse a schema YAML string into a Schema
pub fn parse_schema_str(content: &str) -> Result<Schema> {
    let raw: Schema =
        serde_yaml::from_str(content).map_err(|e| PathDbError::Schema(e.to_string()))?;
    Ok(Schema::new(raw.unique_fields, raw.non_unique_fields))
}
