//! Provider lookup, conflict detection, and cascading deactivation.
//!
//! Planning is pure: `plan_cascade` and `find_conflicting` take the active set
//! as an argument and return what would have to go. The `deactivate_*` entry
//! points capture one snapshot from an `ActivationStore`, plan against it, and
//! then send the deactivation instructions back to the store.

use crate::catalog::{CapabilityName, ComponentKey, DependencyGraph};
use crate::store::{ActivationStore, ActiveSnapshot};
use std::collections::BTreeSet;
use tracing::debug;

/// Components removed by a cascade, grouped by the level that found them.
///
/// Level 0 holds components that depended on the initially removed set, level
/// 1 those that depended on level 0, and so on. No key appears twice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CascadePlan {
    pub levels: Vec<Vec<ComponentKey>>,
}

impl CascadePlan {
    /// Every cascaded key in discovery order.
    pub fn keys(&self) -> Vec<ComponentKey> {
        self.levels.iter().flatten().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Queries against one immutable dependency graph.
#[derive(Clone, Copy, Debug)]
pub struct Resolver<'g> {
    graph: &'g DependencyGraph,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g DependencyGraph {
        self.graph
    }

    /// Components able to satisfy `capability`; empty when unsatisfiable.
    pub fn providers(&self, capability: &CapabilityName) -> Vec<ComponentKey> {
        self.graph.providers(capability)
    }

    /// Active components that would cascade out if `to_deactivate` went away.
    ///
    /// Each round frees the capabilities of the current frontier and collects
    /// active components depending on any of them. Keys already collected are
    /// skipped, so cyclic declarations terminate after at most `active.len()`
    /// rounds.
    pub fn plan_cascade(
        &self,
        to_deactivate: &[ComponentKey],
        active: &[ComponentKey],
    ) -> CascadePlan {
        let mut plan = CascadePlan::default();
        let mut recorded: BTreeSet<ComponentKey> = BTreeSet::new();
        let mut frontier: Vec<ComponentKey> = to_deactivate.to_vec();

        while !frontier.is_empty() {
            let freed = self.graph.provided_by_all(&frontier);
            let found: BTreeSet<ComponentKey> = active
                .iter()
                .filter(|candidate| !recorded.contains(*candidate))
                .filter(|candidate| {
                    self.graph
                        .dependencies(candidate)
                        .iter()
                        .any(|dep| freed.contains(dep))
                })
                .cloned()
                .collect();

            if found.is_empty() {
                break;
            }
            let level: Vec<ComponentKey> = found.into_iter().collect();
            debug!(level = plan.levels.len(), found = ?level, "cascade level");
            recorded.extend(level.iter().cloned());
            plan.levels.push(level.clone());
            frontier = level;
        }

        plan
    }

    /// Active components that provide something `to_activate` also provides.
    ///
    /// Components being activated are never reported against themselves.
    // TODO: add a strict mode that keeps a conflicting component when another
    // active provider would still satisfy everything it depends on.
    pub fn find_conflicting(
        &self,
        to_activate: &[ComponentKey],
        active: &[ComponentKey],
    ) -> Vec<ComponentKey> {
        let claimed = self.graph.provided_by_all(to_activate);
        let mut seen = BTreeSet::new();
        active
            .iter()
            .filter(|candidate| !to_activate.contains(candidate))
            .filter(|candidate| {
                self.graph
                    .provided(candidate)
                    .is_some_and(|provides| !provides.is_disjoint(&claimed))
            })
            .filter(|candidate| seen.insert((*candidate).clone()))
            .cloned()
            .collect()
    }

    /// Deactivate everything that depends, directly or transitively, on
    /// `to_deactivate` and return those keys.
    ///
    /// The active set (local plus network-wide on multi-tenant installs) is
    /// read once. Levels are handed to the store deepest first.
    pub fn deactivate_cascade(
        &self,
        store: &mut dyn ActivationStore,
        to_deactivate: &[ComponentKey],
    ) -> Vec<ComponentKey> {
        if to_deactivate.is_empty() {
            return Vec::new();
        }
        let snapshot = ActiveSnapshot::capture(store);
        let plan = self.plan_cascade(to_deactivate, &snapshot.combined());
        for level in plan.levels.iter().rev() {
            store.deactivate(level);
        }
        plan.keys()
    }

    /// Deactivate active components that conflict with `to_activate`, plus
    /// their dependents, and return the union (conflicting keys first).
    pub fn deactivate_conflicting(
        &self,
        store: &mut dyn ActivationStore,
        to_activate: &[ComponentKey],
    ) -> Vec<ComponentKey> {
        let conflicting = self.find_conflicting(to_activate, &store.active());
        if conflicting.is_empty() {
            return Vec::new();
        }
        debug!(conflicting = ?conflicting, "activation conflicts");

        let cascaded = self.deactivate_cascade(store, &conflicting);
        store.deactivate(&conflicting);

        let mut seen = BTreeSet::new();
        conflicting
            .into_iter()
            .chain(cascaded)
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }
}
