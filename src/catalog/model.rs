//! Deserializable representation of a component manifest.
//!
//! The manifest is the discovery snapshot the graph is built from: the
//! standard components, the always-on must-use tier, and any extra registries
//! that contribute dependency metadata. Header fields keep their declared
//! comma-delimited form; tokenizing happens in `parse_field`.

use crate::catalog::identity::ComponentKey;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Declared metadata for one component, in header form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHeaders {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Provides", default)]
    pub provides: String,
    #[serde(rename = "Depends", default)]
    pub depends: String,
}

impl ComponentHeaders {
    pub fn new(name: &str, provides: &str, depends: &str) -> Self {
        Self {
            name: name.to_string(),
            provides: provides.to_string(),
            depends: depends.to_string(),
        }
    }
}

/// Component key → declared headers.
pub type ComponentMap = BTreeMap<ComponentKey, ComponentHeaders>;

#[derive(Clone, Debug, Deserialize)]
/// Full manifest as stored on disk.
pub struct ComponentManifest {
    pub schema_version: String,
    #[serde(default)]
    pub components: ComponentMap,
    #[serde(default)]
    pub must_use: ComponentMap,
    #[serde(default)]
    pub sources: Vec<ComponentMap>,
}

impl ComponentManifest {
    /// Standard and must-use components in one map.
    ///
    /// A must-use entry replaces a standard entry with the same key.
    pub fn discovered(&self) -> ComponentMap {
        let mut all = self.components.clone();
        all.extend(
            self.must_use
                .iter()
                .map(|(key, headers)| (key.clone(), headers.clone())),
        );
        all
    }
}

/// Split a comma-delimited header value into trimmed, non-empty tokens.
///
/// Order and duplicates are preserved; callers decide whether they need a set.
pub fn parse_field(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse a component manifest from disk without schema validation.
pub fn load_manifest_from_path(path: &Path) -> Result<ComponentManifest> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let manifest: ComponentManifest = serde_json::from_str(&data)
        .with_context(|| format!("parsing manifest {}", path.display()))?;
    Ok(manifest)
}

/// Read a bare component map (`{key: {Name, Provides, Depends}}`) from disk.
pub fn load_component_map_from_path(path: &Path) -> Result<ComponentMap> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing component map {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_field_trims_and_drops_empty_tokens() {
        assert_eq!(parse_field("a, b,,  c ,"), vec!["a", "b", "c"]);
        assert_eq!(parse_field("x,x"), vec!["x", "x"]);
        assert!(parse_field("").is_empty());
        assert!(parse_field(" , ,").is_empty());
    }

    #[test]
    fn headers_default_missing_fields_and_ignore_extras() {
        let headers: ComponentHeaders = serde_json::from_value(json!({
            "Name": "Cache Layer",
            "Version": "1.2",
        }))
        .unwrap();
        assert_eq!(headers, ComponentHeaders::new("Cache Layer", "", ""));
    }

    #[test]
    fn must_use_entries_replace_standard_ones() {
        let manifest: ComponentManifest = serde_json::from_value(json!({
            "schema_version": "component_manifest_v1",
            "components": {
                "a.php": {"Name": "A"},
                "b.php": {"Name": "B"}
            },
            "must_use": {
                "b.php": {"Name": "B (mu)"}
            }
        }))
        .unwrap();
        let all = manifest.discovered();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&ComponentKey::from("b.php")].name, "B (mu)");
    }
}
