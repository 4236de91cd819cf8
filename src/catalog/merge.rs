//! Folding several component registries into one map.
//!
//! Registries can describe the same component independently. Entries are only
//! combined when both sides agree on the display name; a differing name under
//! the same key is treated as a different component and left alone.

use crate::catalog::model::{ComponentMap, parse_field};
use std::collections::BTreeSet;
use tracing::warn;

/// Fold `sources` into `result`, left to right.
///
/// New keys are inserted as-is (missing header fields already default to
/// empty). Existing keys with an identical name get their `Depends` and
/// `Provides` unioned; empty incoming fields leave the existing value intact.
pub fn merge_components<I>(mut result: ComponentMap, sources: I) -> ComponentMap
where
    I: IntoIterator<Item = ComponentMap>,
{
    for source in sources {
        for (key, incoming) in source {
            let Some(existing) = result.get_mut(&key) else {
                result.insert(key, incoming);
                continue;
            };
            if existing.name != incoming.name {
                warn!(
                    key = %key,
                    existing = %existing.name,
                    incoming = %incoming.name,
                    "skipping merge for component with mismatched name"
                );
                continue;
            }
            if !incoming.depends.is_empty() {
                existing.depends = union_csv(&existing.depends, &incoming.depends);
            }
            if !incoming.provides.is_empty() {
                existing.provides = union_csv(&existing.provides, &incoming.provides);
            }
        }
    }
    result
}

/// Union of two comma-delimited lists, first occurrence wins, joined with `,`.
pub fn union_csv(a: &str, b: &str) -> String {
    let mut seen = BTreeSet::new();
    parse_field(a)
        .into_iter()
        .chain(parse_field(b))
        .filter(|token| seen.insert(token.clone()))
        .collect::<Vec<_>>()
        .join(",")
}
