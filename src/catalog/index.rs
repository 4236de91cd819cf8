//! Provides/depends indexes derived from discovered component headers.
//!
//! `DependencyGraph` is built once from the merged component map and never
//! mutated afterwards, so it can be shared by reference across resolver
//! queries. Header parsing is forgiving: empty or malformed lists become empty
//! collections rather than errors.

use crate::catalog::identity::{CapabilityName, ComponentKey, ComponentTier};
use crate::catalog::model::{ComponentMap, load_manifest_from_path, parse_field};
use crate::catalog::repository::SourceRepository;
use crate::schema_loader::{SchemaLoadOptions, load_json_schema};
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MANIFEST_SCHEMA_VERSION: &str = "component_manifest_v1";
const MANIFEST_SCHEMA_FILE: &str = "schema/component_manifest.schema.json";

#[derive(Clone, Debug)]
struct ComponentNode {
    name: String,
    tier: ComponentTier,
    provides: BTreeSet<CapabilityName>,
    depends: Vec<CapabilityName>,
}

#[derive(Clone, Debug, Default)]
/// Immutable provides/depends indexes keyed by component.
pub struct DependencyGraph {
    nodes: BTreeMap<ComponentKey, ComponentNode>,
}

impl DependencyGraph {
    /// Build the indexes from a merged component map.
    ///
    /// Every component provides its own key. Dependency tokens equal to some
    /// component's display name are rewritten to that component's key.
    pub fn build(components: &ComponentMap) -> Self {
        Self::build_with_tiers(components, |_| ComponentTier::Standard)
    }

    /// Build from a source repository, keeping the tier of each component.
    pub fn from_repository(repo: &SourceRepository) -> Self {
        Self::build_with_tiers(&repo.all_components(), |key| repo.tier(key))
    }

    /// Validate a manifest file against its schema and build the graph from it.
    pub fn load(path: &Path) -> Result<Self> {
        validate_against_schema(path)?;
        let manifest =
            load_manifest_from_path(path).with_context(|| format!("loading {}", path.display()))?;
        validate_schema_version(&manifest.schema_version)?;
        Ok(Self::from_repository(&SourceRepository::from_manifest(
            &manifest,
        )))
    }

    fn build_with_tiers<F>(components: &ComponentMap, tier_of: F) -> Self
    where
        F: Fn(&ComponentKey) -> ComponentTier,
    {
        let name_to_key: BTreeMap<&str, &ComponentKey> = components
            .iter()
            .filter(|(_, headers)| !headers.name.is_empty())
            .map(|(key, headers)| (headers.name.as_str(), key))
            .collect();

        let nodes: BTreeMap<ComponentKey, ComponentNode> = components
            .iter()
            .map(|(key, headers)| {
                let mut provides: BTreeSet<CapabilityName> = parse_field(&headers.provides)
                    .into_iter()
                    .map(CapabilityName)
                    .collect();
                provides.insert(key.as_capability());

                let depends = parse_field(&headers.depends)
                    .into_iter()
                    .map(|token| match name_to_key.get(token.as_str()) {
                        Some(resolved) => resolved.as_capability(),
                        None => CapabilityName(token),
                    })
                    .collect();

                let node = ComponentNode {
                    name: headers.name.clone(),
                    tier: tier_of(key),
                    provides,
                    depends,
                };
                (key.clone(), node)
            })
            .collect();

        debug!(components = nodes.len(), "built dependency graph");
        Self { nodes }
    }

    /// Whether `key` names a known component.
    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// Component keys in stable order.
    pub fn keys(&self) -> impl Iterator<Item = &ComponentKey> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Declared display name; `None` for unknown keys.
    pub fn name(&self, key: &ComponentKey) -> Option<&str> {
        self.nodes.get(key).map(|node| node.name.as_str())
    }

    /// Discovery tier; unknown keys are reported as standard.
    pub fn tier(&self, key: &ComponentKey) -> ComponentTier {
        self.nodes
            .get(key)
            .map(|node| node.tier)
            .unwrap_or_default()
    }

    /// Normalized dependency list of a component (empty when unknown).
    pub fn dependencies(&self, key: &ComponentKey) -> &[CapabilityName] {
        self.nodes
            .get(key)
            .map(|node| node.depends.as_slice())
            .unwrap_or(&[])
    }

    /// Capabilities provided by a component, its own key included.
    ///
    /// Unknown keys provide nothing.
    pub fn provided(&self, key: &ComponentKey) -> Option<&BTreeSet<CapabilityName>> {
        self.nodes.get(key).map(|node| &node.provides)
    }

    /// Components that provide `capability`.
    ///
    /// A real dependency (a known component key) resolves to that component
    /// alone, even when other components declare a virtual capability with the
    /// same name. An empty result means the dependency cannot be satisfied.
    pub fn providers(&self, capability: &CapabilityName) -> Vec<ComponentKey> {
        if let Some((key, _)) = self.nodes.get_key_value(capability.as_str()) {
            return vec![key.clone()];
        }
        self.nodes
            .iter()
            .filter(|(_, node)| node.provides.contains(capability))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Union of the capabilities provided by every key in `keys`.
    pub fn provided_by_all<'a, I>(&self, keys: I) -> BTreeSet<CapabilityName>
    where
        I: IntoIterator<Item = &'a ComponentKey>,
    {
        keys.into_iter()
            .filter_map(|key| self.provided(key))
            .flat_map(|provides| provides.iter().cloned())
            .collect()
    }
}

fn validate_schema_version(schema_version: &str) -> Result<()> {
    if schema_version.is_empty() {
        bail!("schema_version must not be empty");
    }
    let allowed = allowed_schema_versions();
    if !allowed.contains(schema_version) {
        bail!(
            "schema_version '{}' not in allowed set {:?}",
            schema_version,
            allowed
        );
    }
    Ok(())
}

fn allowed_schema_versions() -> BTreeSet<String> {
    BTreeSet::from_iter([MANIFEST_SCHEMA_VERSION.to_string()])
}

/// Schema bundled with the crate.
pub fn canonical_manifest_schema_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(MANIFEST_SCHEMA_FILE)
}

fn validate_against_schema(manifest_path: &Path) -> Result<()> {
    let manifest_file = File::open(manifest_path)
        .with_context(|| format!("opening manifest {}", manifest_path.display()))?;
    let manifest_value: Value = serde_json::from_reader(BufReader::new(manifest_file))
        .with_context(|| format!("parsing manifest {}", manifest_path.display()))?;

    let schema_path = canonical_manifest_schema_path();
    let allowed = allowed_schema_versions();
    let schema = load_json_schema(
        &schema_path,
        SchemaLoadOptions {
            allowed_versions: Some(&allowed),
            ..Default::default()
        },
    )
    .with_context(|| format!("loading manifest schema {}", schema_path.display()))?;
    debug!(schema_version = %schema.schema_version, manifest = %manifest_path.display(), "validating manifest");

    if let Err(errors) = schema.compiled.validate(&manifest_value) {
        let details = errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        bail!(
            "component manifest {} failed schema validation:\n{}",
            manifest_path.display(),
            details
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ComponentHeaders;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn graph(entries: &[(&str, &str, &str, &str)]) -> DependencyGraph {
        let map: ComponentMap = entries
            .iter()
            .map(|(key, name, provides, depends)| {
                (
                    ComponentKey::from(*key),
                    ComponentHeaders::new(name, provides, depends),
                )
            })
            .collect();
        DependencyGraph::build(&map)
    }

    #[test]
    fn every_component_provides_itself() {
        let g = graph(&[("a", "A", "", ""), ("b", "B", "cache, queue", "")]);
        for key in g.keys() {
            assert!(g.provided(key).unwrap().contains(&key.as_capability()));
        }
        let b = g.provided(&ComponentKey::from("b")).unwrap();
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn dependency_names_are_rewritten_to_keys() {
        let g = graph(&[
            ("core/core.php", "Core Toolkit", "", ""),
            ("addon/addon.php", "Addon", "", "Core Toolkit, cache, Core Toolkit"),
        ]);
        let deps = g.dependencies(&ComponentKey::from("addon/addon.php"));
        assert_eq!(
            deps,
            &[
                CapabilityName::from("core/core.php"),
                CapabilityName::from("cache"),
                CapabilityName::from("core/core.php"),
            ]
        );
        assert_eq!(
            g.providers(&deps[0]),
            vec![ComponentKey::from("core/core.php")]
        );
    }

    #[test]
    fn real_dependency_wins_over_virtual_provides() {
        let g = graph(&[
            ("cache", "Cache", "", ""),
            ("redis", "Redis", "cache", ""),
            ("memcached", "Memcached", "cache", ""),
        ]);
        assert_eq!(
            g.providers(&CapabilityName::from("cache")),
            vec![ComponentKey::from("cache")]
        );
    }

    #[test]
    fn virtual_dependency_collects_every_provider() {
        let g = graph(&[
            ("redis", "Redis", "object-cache", ""),
            ("memcached", "Memcached", "object-cache", ""),
            ("seo", "SEO", "", ""),
        ]);
        assert_eq!(
            g.providers(&CapabilityName::from("object-cache")),
            vec![ComponentKey::from("memcached"), ComponentKey::from("redis")]
        );
        assert!(g.providers(&CapabilityName::from("nothing")).is_empty());
    }

    #[test]
    fn unknown_keys_have_empty_indexes() {
        let g = graph(&[("a", "A", "", "")]);
        let missing = ComponentKey::from("missing");
        assert!(g.dependencies(&missing).is_empty());
        assert!(g.provided(&missing).is_none());
        assert_eq!(g.tier(&missing), ComponentTier::Standard);
    }

    #[test]
    fn build_is_deterministic() {
        let entries = [("a", "A", "x, y", "B"), ("b", "B", "", "x")];
        let first = graph(&entries);
        let second = graph(&entries);
        for key in first.keys() {
            assert_eq!(first.provided(key), second.provided(key));
            assert_eq!(first.dependencies(key), second.dependencies(key));
        }
    }

    #[test]
    fn load_rejects_unknown_schema_version() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({"schema_version": "component_manifest_v0", "components": {}})
        )
        .unwrap();
        let err = DependencyGraph::load(file.path()).expect_err("bad version should fail");
        assert!(format!("{err:#}").contains("component_manifest_v0"));
    }

    #[test]
    fn load_marks_must_use_tier() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({
                "schema_version": MANIFEST_SCHEMA_VERSION,
                "components": {"a.php": {"Name": "A", "Depends": "Loader"}},
                "must_use": {"loader.php": {"Name": "Loader"}}
            })
        )
        .unwrap();
        let g = DependencyGraph::load(file.path()).expect("manifest loads");
        assert_eq!(
            g.tier(&ComponentKey::from("loader.php")),
            ComponentTier::MustUse
        );
        assert_eq!(
            g.dependencies(&ComponentKey::from("a.php")),
            &[CapabilityName::from("loader.php")]
        );
    }
}
