use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Espacement par défaut entre deux jours de service d'un cycle.
pub const CYCLE_INTERVAL_DAYS: i64 = 11;

/// Options de génération de cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleOptions {
    pub interval_days: i64,
    pub count: usize,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            interval_days: CYCLE_INTERVAL_DAYS,
            count: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub action: ToggleAction,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("slot already claimed by {owner}")]
    Collision { owner: String },
    #[error("nothing to undo")]
    NothingToUndo,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
