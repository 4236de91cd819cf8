//! Collects component sources before the graph is built.
//!
//! The primary discovery snapshot always comes first; registered sources are
//! folded over it with `merge_components` in registration order so extra
//! registries can add synthetic components or extend existing ones.

use crate::catalog::identity::{ComponentKey, ComponentTier};
use crate::catalog::merge::merge_components;
use crate::catalog::model::{ComponentManifest, ComponentMap};
use std::collections::BTreeSet;

#[derive(Debug, Default)]
/// Discovery snapshot plus any registered extra sources.
pub struct SourceRepository {
    primary: ComponentMap,
    must_use: BTreeSet<ComponentKey>,
    extra: Vec<ComponentMap>,
}

impl SourceRepository {
    pub fn new(primary: ComponentMap) -> Self {
        Self {
            primary,
            ..Default::default()
        }
    }

    /// Seed the repository from a manifest, registering its `sources` too.
    pub fn from_manifest(manifest: &ComponentManifest) -> Self {
        let mut repo = Self::new(manifest.discovered());
        repo.must_use = manifest.must_use.keys().cloned().collect();
        for source in &manifest.sources {
            repo.register(source.clone());
        }
        repo
    }

    /// Register an extra source to be merged after the primary snapshot.
    pub fn register(&mut self, source: ComponentMap) {
        self.extra.push(source);
    }

    /// Every component after merging, ready for `DependencyGraph::build`.
    pub fn all_components(&self) -> ComponentMap {
        merge_components(self.primary.clone(), self.extra.iter().cloned())
    }

    /// Tier a key was discovered in; registered sources count as standard.
    pub fn tier(&self, key: &ComponentKey) -> ComponentTier {
        if self.must_use.contains(key) {
            ComponentTier::MustUse
        } else {
            ComponentTier::Standard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ComponentHeaders;

    #[test]
    fn registered_sources_merge_in_order() {
        let mut repo = SourceRepository::new(ComponentMap::from([(
            ComponentKey::from("seo.php"),
            ComponentHeaders::new("SEO", "", "cache"),
        )]));
        repo.register(ComponentMap::from([(
            ComponentKey::from("seo.php"),
            ComponentHeaders::new("SEO", "sitemap", "cache, http"),
        )]));
        repo.register(ComponentMap::from([(
            ComponentKey::from("virtual-http"),
            ComponentHeaders::new("HTTP shim", "http", ""),
        )]));

        let all = repo.all_components();
        assert_eq!(all.len(), 2);
        let seo = &all[&ComponentKey::from("seo.php")];
        assert_eq!(seo.depends, "cache,http");
        assert_eq!(seo.provides, "sitemap");
        assert_eq!(repo.tier(&ComponentKey::from("virtual-http")), ComponentTier::Standard);
    }
}
