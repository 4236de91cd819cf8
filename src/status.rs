//! Dependency satisfaction reports for callers that render component lists.
//!
//! Each declared dependency is classified against an active-set snapshot:
//! unsatisfied when no provider is active locally or in the must-use tier,
//! network-unsatisfied (multi-tenant only) when no provider is network-active,
//! satisfied otherwise. Reports also carry provider names so a caller can show
//! "A or B" without going back to the graph.

use crate::catalog::{CapabilityName, ComponentKey, ComponentTier, DependencyGraph};
use crate::store::ActiveSnapshot;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    Satisfied,
    Unsatisfied,
    UnsatisfiedNetwork,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// A component able to satisfy a dependency.
pub struct ProviderInfo {
    pub key: ComponentKey,
    pub name: String,
    pub tier: ComponentTier,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DependencyEntry {
    pub capability: CapabilityName,
    pub status: DependencyStatus,
    pub providers: Vec<ProviderInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// Per-component summary: every dependency plus whether activation is allowed.
pub struct DependencyReport {
    pub component: ComponentKey,
    pub dependencies: Vec<DependencyEntry>,
    pub can_activate: bool,
    pub can_network_activate: bool,
}

impl DependencyReport {
    pub fn unsatisfied(&self) -> impl Iterator<Item = &CapabilityName> {
        self.dependencies
            .iter()
            .filter(|entry| entry.status == DependencyStatus::Unsatisfied)
            .map(|entry| &entry.capability)
    }
}

/// Classify every dependency of `component`.
///
/// Returns `None` when the component declares no dependencies, matching how
/// list views only annotate components that have requirements.
pub fn dependency_report(
    graph: &DependencyGraph,
    component: &ComponentKey,
    snapshot: &ActiveSnapshot,
) -> Option<DependencyReport> {
    let deps = graph.dependencies(component);
    if deps.is_empty() {
        return None;
    }

    let dependencies: Vec<DependencyEntry> = deps
        .iter()
        .map(|capability| {
            let providers = graph.providers(capability);
            let status = classify(graph, &providers, snapshot);
            DependencyEntry {
                capability: capability.clone(),
                status,
                providers: providers
                    .into_iter()
                    .map(|key| provider_info(graph, key))
                    .collect(),
            }
        })
        .collect();

    let can_activate = dependencies
        .iter()
        .all(|entry| entry.status != DependencyStatus::Unsatisfied);
    // Checked on its own: an unsatisfied entry hides its network status.
    let can_network_activate = match &snapshot.network {
        Some(network) => dependencies.iter().all(|entry| {
            entry
                .providers
                .iter()
                .any(|provider| network.contains(&provider.key))
        }),
        None => true,
    };

    Some(DependencyReport {
        component: component.clone(),
        dependencies,
        can_activate,
        can_network_activate,
    })
}

/// Reports for every component that declares dependencies, in key order.
pub fn all_reports(graph: &DependencyGraph, snapshot: &ActiveSnapshot) -> Vec<DependencyReport> {
    graph
        .keys()
        .filter_map(|key| dependency_report(graph, key, snapshot))
        .collect()
}

fn classify(
    graph: &DependencyGraph,
    providers: &[ComponentKey],
    snapshot: &ActiveSnapshot,
) -> DependencyStatus {
    let locally_available = providers.iter().any(|key| {
        snapshot.local.contains(key) || graph.tier(key) == ComponentTier::MustUse
    });
    if !locally_available {
        return DependencyStatus::Unsatisfied;
    }
    if let Some(network) = &snapshot.network {
        if !providers.iter().any(|key| network.contains(key)) {
            return DependencyStatus::UnsatisfiedNetwork;
        }
    }
    DependencyStatus::Satisfied
}

fn provider_info(graph: &DependencyGraph, key: ComponentKey) -> ProviderInfo {
    let name = match graph.name(&key) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => key.0.clone(),
    };
    ProviderInfo {
        tier: graph.tier(&key),
        name,
        key,
    }
}
