#![forbid(unsafe_code)]
//! Taxishift : planification des tours partagés et synchronisation hors-ligne.
//!
//! - Cycles de service (pas de 11 jours), rotation semaine A/B, collisions de créneau.
//! - Annulation à un niveau des opérations destructives.
//! - Cache local JSON + stockage distant qui fait foi, push différé, pull protégé.
//! - Dates calendaires naïves ; l'affichage et les fuseaux restent hors de la lib.

pub mod calendar;
pub mod ledger;
pub mod model;
pub mod notification;
pub mod remote;
pub mod scheduler;
pub mod storage;
pub mod sync;

pub use calendar::{export_ics, CalendarOptions};
pub use ledger::{EntryId, Expense, ExpenseCategory, Ledger, MaintenanceItem, Service, Vehicle};
pub use model::{
    AnchorWeek, AssignmentKind, ShiftAssignment, ShiftStorage, ShiftType, UserId,
    UserShiftConfig, WorkMode,
};
pub use notification::{plan_reminders, Reminder, ReminderOptions, ReminderRenderer, TextReminder};
pub use remote::{MemoryRemote, RemoteStore};
pub use scheduler::{EffectiveShift, SchedError, ShiftScheduler, ToggleAction};
pub use storage::{JsonFileCache, LocalCache, MemoryCache};
pub use sync::{Collection, SyncCoordinator, SyncError, SyncOptions, SyncState, SyncStatus};

/// Installe un subscriber `tracing` filtré par `RUST_LOG` (idempotent).
#[cfg(feature = "logging")]
pub fn init_logging() {
    use tracing_subscriber::{fmt::Subscriber, EnvFilter};
    let _ = Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
