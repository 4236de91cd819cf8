//! Activation state owned outside the graph engine.
//!
//! The resolver only ever reads the active set through `ActivationStore` and
//! hands deactivation instructions back to it. Deactivation is fire-and-forget:
//! implementations log their own failures instead of reporting them.

use crate::catalog::ComponentKey;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Source of the active set and sink for deactivation instructions.
pub trait ActivationStore {
    /// Keys active on the local site, in stored order.
    fn active(&self) -> Vec<ComponentKey>;

    /// Keys active network-wide; `None` outside multi-tenant deployments.
    fn network_active(&self) -> Option<Vec<ComponentKey>>;

    /// Remove `keys` from every active set.
    fn deactivate(&mut self, keys: &[ComponentKey]);
}

/// Active-set membership captured once for a single query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveSnapshot {
    pub local: Vec<ComponentKey>,
    pub network: Option<Vec<ComponentKey>>,
}

impl ActiveSnapshot {
    pub fn capture(store: &dyn ActivationStore) -> Self {
        Self {
            local: store.active(),
            network: store.network_active(),
        }
    }

    pub fn is_multisite(&self) -> bool {
        self.network.is_some()
    }

    /// Local keys followed by network keys, each key once.
    pub fn combined(&self) -> Vec<ComponentKey> {
        let mut seen = BTreeSet::new();
        self.local
            .iter()
            .chain(self.network.iter().flatten())
            .filter(|key| seen.insert((*key).clone()))
            .cloned()
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Serialized activation state.
pub struct ActivationState {
    #[serde(default)]
    pub active: Vec<ComponentKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_active: Option<Vec<ComponentKey>>,
}

impl ActivationState {
    /// Append keys that are not already active locally.
    pub fn activate(&mut self, keys: &[ComponentKey]) {
        for key in keys {
            if !self.active.contains(key) {
                self.active.push(key.clone());
            }
        }
    }

    fn remove(&mut self, keys: &[ComponentKey]) {
        self.active.retain(|key| !keys.contains(key));
        if let Some(network) = self.network_active.as_mut() {
            network.retain(|key| !keys.contains(key));
        }
    }
}

/// In-memory store; records every deactivation call it receives.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub state: ActivationState,
    pub deactivation_log: Vec<Vec<ComponentKey>>,
}

impl MemoryStore {
    pub fn new<I>(active: I) -> Self
    where
        I: IntoIterator<Item = ComponentKey>,
    {
        Self {
            state: ActivationState {
                active: active.into_iter().collect(),
                network_active: None,
            },
            deactivation_log: Vec::new(),
        }
    }

    pub fn with_network<I>(mut self, network: I) -> Self
    where
        I: IntoIterator<Item = ComponentKey>,
    {
        self.state.network_active = Some(network.into_iter().collect());
        self
    }
}

impl ActivationStore for MemoryStore {
    fn active(&self) -> Vec<ComponentKey> {
        self.state.active.clone()
    }

    fn network_active(&self) -> Option<Vec<ComponentKey>> {
        self.state.network_active.clone()
    }

    fn deactivate(&mut self, keys: &[ComponentKey]) {
        self.state.remove(keys);
        self.deactivation_log.push(keys.to_vec());
    }
}

/// Activation state persisted as a JSON file.
///
/// Every deactivation rewrites the file atomically; write failures are logged
/// and the in-memory state still reflects the instruction.
#[derive(Debug)]
pub struct JsonStateStore {
    path: PathBuf,
    state: ActivationState,
}

impl JsonStateStore {
    /// Open the state file; a missing file is an empty, single-site state.
    pub fn open(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("reading activation state {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("parsing activation state {}", path.display()))?
        } else {
            ActivationState::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    pub fn state(&self) -> &ActivationState {
        &self.state
    }

    pub fn activate(&mut self, keys: &[ComponentKey]) -> Result<()> {
        self.state.activate(keys);
        self.persist()
    }

    /// Write the current state over the backing file.
    pub fn persist(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        serde_json::to_writer_pretty(&mut tmp, &self.state)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path)
            .with_context(|| format!("writing activation state {}", self.path.display()))?;
        Ok(())
    }
}

impl ActivationStore for JsonStateStore {
    fn active(&self) -> Vec<ComponentKey> {
        self.state.active.clone()
    }

    fn network_active(&self) -> Option<Vec<ComponentKey>> {
        self.state.network_active.clone()
    }

    fn deactivate(&mut self, keys: &[ComponentKey]) {
        if keys.is_empty() {
            return;
        }
        self.state.remove(keys);
        info!(count = keys.len(), path = %self.path.display(), "deactivated components");
        if let Err(err) = self.persist() {
            warn!("failed to record deactivation: {err:#}");
        }
    }
}
