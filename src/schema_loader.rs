//! JSON Schema loader for the manifest contract.
//!
//! Schemas carry a top-level `schema_version` alongside the JSON Schema
//! keywords. The loader checks that version against the caller's allowed set
//! and compiles a validator from the payload.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Result of loading and compiling a JSON Schema.
pub(crate) struct SchemaLoadResult {
    pub schema_version: String,
    pub compiled: JSONSchema,
}

/// Controls how schemas are checked before compilation.
pub(crate) struct SchemaLoadOptions<'a> {
    /// Where to find the schema_version inside the schema payload.
    pub schema_version_pointer: &'a str,
    /// Allowed schema_version values; enforced when present.
    pub allowed_versions: Option<&'a BTreeSet<String>>,
}

impl<'a> Default for SchemaLoadOptions<'a> {
    fn default() -> Self {
        Self {
            schema_version_pointer: "/schema_version",
            allowed_versions: None,
        }
    }
}

pub(crate) fn load_json_schema(
    path: &Path,
    options: SchemaLoadOptions<'_>,
) -> Result<SchemaLoadResult> {
    let file = File::open(path).with_context(|| format!("opening schema {}", path.display()))?;
    let schema_value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing schema {}", path.display()))?;

    let schema_version = extract_schema_version(&schema_value, options.schema_version_pointer)
        .ok_or_else(|| {
            anyhow!(
                "schema {} missing schema_version at {}",
                path.display(),
                options.schema_version_pointer
            )
        })?;

    if let Some(allowed) = options.allowed_versions {
        if !allowed.contains(&schema_version) {
            bail!(
                "schema_version '{}' not in allowed set {:?}",
                schema_version,
                allowed
            );
        }
    }

    // Compile errors borrow the schema value, so flatten them to text here.
    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|err| anyhow!("compiling schema {}: {err}", path.display()))?;

    Ok(SchemaLoadResult {
        schema_version,
        compiled,
    })
}

fn extract_schema_version(schema: &Value, pointer: &str) -> Option<String> {
    let version = schema.pointer(pointer).and_then(Value::as_str)?;
    if !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn schema_file(value: Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{value}").unwrap();
        file
    }

    #[test]
    fn loads_and_compiles_versioned_schema() {
        let file = schema_file(json!({
            "schema_version": "fixture_v1",
            "type": "object",
            "required": ["name"]
        }));
        let loaded = load_json_schema(file.path(), SchemaLoadOptions::default()).unwrap();
        assert_eq!(loaded.schema_version, "fixture_v1");
        assert!(loaded.compiled.is_valid(&json!({"name": "x"})));
        assert!(!loaded.compiled.is_valid(&json!({})));
    }

    #[test]
    fn rejects_versions_outside_allowed_set() {
        let file = schema_file(json!({"schema_version": "fixture_v2", "type": "object"}));
        let allowed = BTreeSet::from(["fixture_v1".to_string()]);
        let err = load_json_schema(
            file.path(),
            SchemaLoadOptions {
                allowed_versions: Some(&allowed),
                ..Default::default()
            },
        )
        .err()
        .expect("version should be rejected");
        assert!(err.to_string().contains("fixture_v2"));
    }

    #[test]
    fn rejects_schema_without_version() {
        let file = schema_file(json!({"type": "object"}));
        assert!(load_json_schema(file.path(), SchemaLoadOptions::default()).is_err());
    }
}
