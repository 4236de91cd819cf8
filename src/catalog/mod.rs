//! Component catalog wiring.
//!
//! Discovery data (a key→headers map, optionally split into standard and
//! must-use tiers and extended by extra registries) flows through
//! `SourceRepository`, gets folded with `merge_components`, and ends up in an
//! immutable `DependencyGraph` that the resolver queries.

pub mod identity;
pub mod index;
pub mod merge;
pub mod model;
pub mod repository;

pub use identity::{CapabilityName, ComponentKey, ComponentTier};
pub use index::{DependencyGraph, MANIFEST_SCHEMA_VERSION};
pub use merge::{merge_components, union_csv};
pub use model::{ComponentHeaders, ComponentManifest, ComponentMap, parse_field};
pub use repository::SourceRepository;

pub use model::{load_component_map_from_path, load_manifest_from_path};
