//! Request actions that trigger dependency bookkeeping.
//!
//! Deactivating components cascades to their dependents; activating
//! components deactivates whatever conflicts with them. Callers parse the
//! request action once into `ActionKind` and dispatch through `run`.

use crate::catalog::ComponentKey;
use crate::resolver::Resolver;
use crate::store::ActivationStore;
use anyhow::{Result, bail};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// `deactivate` request: cascade to dependents.
    Cascade,
    /// `activate` request: remove conflicting providers.
    Conflicting,
}

impl ActionKind {
    /// Request action string that selects this kind.
    pub fn request_action(&self) -> &'static str {
        match self {
            ActionKind::Cascade => "deactivate",
            ActionKind::Conflicting => "activate",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Cascade => "cascade",
            ActionKind::Conflicting => "conflicting",
        }
    }

    /// Message shown above the list of keys the action deactivated.
    pub fn notice(&self) -> &'static str {
        match self {
            ActionKind::Cascade => "The following plugins have also been deactivated:",
            ActionKind::Conflicting => {
                "The following plugins have been deactivated due to dependency conflicts:"
            }
        }
    }

    /// Run the dependency side of the action and return what it deactivated.
    ///
    /// For `Cascade` the requested keys are the ones being deactivated; for
    /// `Conflicting` they are the ones about to be activated.
    pub fn run(
        &self,
        resolver: &Resolver<'_>,
        store: &mut dyn ActivationStore,
        requested: &[ComponentKey],
    ) -> Vec<ComponentKey> {
        match self {
            ActionKind::Cascade => resolver.deactivate_cascade(store, requested),
            ActionKind::Conflicting => resolver.deactivate_conflicting(store, requested),
        }
    }
}

impl TryFrom<&str> for ActionKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "deactivate" => Ok(ActionKind::Cascade),
            "activate" => Ok(ActionKind::Conflicting),
            other => bail!("Unknown action: {other}"),
        }
    }
}

pub fn allowed_action_names() -> Vec<&'static str> {
    ACTIONS.iter().map(ActionKind::request_action).collect()
}

const ACTIONS: &[ActionKind] = &[ActionKind::Cascade, ActionKind::Conflicting];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// What an action deactivated, ready to be shown to the user.
pub struct ActionOutcome {
    pub action: ActionKind,
    pub requested: Vec<ComponentKey>,
    pub deactivated: Vec<ComponentKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

impl ActionOutcome {
    pub fn new(
        action: ActionKind,
        requested: Vec<ComponentKey>,
        deactivated: Vec<ComponentKey>,
    ) -> Self {
        let notice = (!deactivated.is_empty()).then(|| action.notice());
        Self {
            action,
            requested,
            deactivated,
            notice,
        }
    }
}
