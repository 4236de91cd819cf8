//! Dependency and provision graph for plugins.
//!
//! Components declare the capabilities they provide and the capabilities they
//! depend on. The crate builds an immutable graph from that metadata and
//! answers three questions against a snapshot of the active set: who provides
//! a capability, which active components conflict with an activation, and
//! which active components must follow a deactivation. Discovery, the
//! persisted active set, and presentation stay with the caller behind the
//! narrow types re-exported here.

pub mod action;
pub mod catalog;
pub mod config;
pub mod resolver;
pub(crate) mod schema_loader;
pub mod status;
pub mod store;

pub use action::{ActionKind, ActionOutcome, allowed_action_names};
pub use catalog::{
    CapabilityName, ComponentHeaders, ComponentKey, ComponentManifest, ComponentMap,
    ComponentTier, DependencyGraph, SourceRepository, load_component_map_from_path,
    load_manifest_from_path, merge_components, parse_field, union_csv,
};
pub use resolver::{CascadePlan, Resolver};
pub use status::{DependencyReport, DependencyStatus, all_reports, dependency_report};
pub use store::{ActivationState, ActivationStore, ActiveSnapshot, JsonStateStore, MemoryStore};

/// Parse a list of component keys given as separate arguments or
/// comma-delimited values.
pub fn parse_key_list<I, S>(values: I) -> Vec<ComponentKey>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .flat_map(|value| parse_field(value.as_ref()))
        .map(ComponentKey)
        .collect()
}
