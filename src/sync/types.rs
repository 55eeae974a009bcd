use super::Collection;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Options de synchronisation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Période de calme avant l'envoi d'une collection modifiée.
    pub debounce_ms: u64,
    /// Borne de chaque appel distant ; au-delà l'appel échoue.
    pub request_timeout_ms: u64,
    pub tracked: Vec<Collection>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            debounce_ms: 2_000,
            request_timeout_ms: 15_000,
            tracked: Collection::ALL.to_vec(),
        }
    }
}

impl SyncOptions {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Idle,
    Syncing,
    Error,
    Success,
}

/// État visible de la synchro manuelle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub status: SyncStatus,
    #[serde(rename = "lastError")]
    pub last_error: Option<String>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            status: SyncStatus::Idle,
            last_error: None,
        }
    }
}

impl SyncState {
    pub(super) fn begin(&mut self) {
        self.status = SyncStatus::Syncing;
        self.last_error = None;
    }
    pub(super) fn succeed(&mut self) {
        self.status = SyncStatus::Success;
        self.last_error = None;
    }
    pub(super) fn fail(&mut self, err: &SyncError) {
        self.status = SyncStatus::Error;
        self.last_error = Some(err.to_string());
    }
}

/// Phase du coordinateur. Pendant `Pulling`, aucune modification n'est mise en file.
///
/// `Pushing` retient la collection en cours d'envoi : si l'appel est abandonné
/// (future annulée), la phase reste posée et la collection est remise en file à
/// l'entrée suivante du coordinateur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Idle,
    Pulling,
    Pushing(Collection),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("remote store unavailable: {0}")]
    Remote(String),
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed remote data in {table}: {source}")]
    Malformed {
        table: &'static str,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
