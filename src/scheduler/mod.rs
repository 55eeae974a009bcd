mod conflicts;
mod cycle;
mod rotation;
mod types;
mod undo;
mod util;

pub use conflicts::check_collision;
pub use cycle::{cycle_from, generate_cycle};
pub use rotation::{effective_shift, resolve, week_label, EffectiveShift, ShiftHours};
pub use types::{CycleOptions, SchedError, ToggleAction, ToggleOutcome, CYCLE_INTERVAL_DAYS};
pub use undo::{UndoBuffer, UndoState};
pub use util::{date_number, filter_future, parse_date};

use crate::model::{
    AssignmentKind, ShiftAssignment, ShiftStorage, UserId, UserShiftConfig, WorkMode,
};
use chrono::NaiveDate;
use tracing::debug;

/// ShiftScheduler : possède le `ShiftStorage` d'une session et son tampon d'annulation.
///
/// Un seul écrivain (le coordinateur de synchro) ; aucun verrou.
#[derive(Debug, Clone)]
pub struct ShiftScheduler {
    user: UserId,
    storage: ShiftStorage,
    undo: UndoBuffer,
    cycle: CycleOptions,
}

impl ShiftScheduler {
    pub fn new(user: UserId) -> Self {
        Self::with_storage(user, ShiftStorage::default())
    }

    pub fn with_storage(user: UserId, storage: ShiftStorage) -> Self {
        Self {
            user,
            storage,
            undo: UndoBuffer::new(),
            cycle: CycleOptions::default(),
        }
    }

    pub fn with_cycle_options(mut self, cycle: CycleOptions) -> Self {
        self.cycle = cycle;
        self
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }
    pub fn storage(&self) -> &ShiftStorage {
        &self.storage
    }
    pub fn undo_state(&self) -> UndoState {
        self.undo.state()
    }

    /// Remplace tout l'état (pull distant). L'instantané d'annulation est invalidé.
    pub fn replace_storage(&mut self, storage: ShiftStorage) {
        self.storage = storage;
        self.undo.clear();
    }

    /// Ajoute l'affectation si absente pour (date, user), la retire sinon.
    pub fn toggle_assignment(
        &mut self,
        date: NaiveDate,
        kind: AssignmentKind,
        user: &UserId,
    ) -> ToggleOutcome {
        let assignments = &mut self.storage.assignments;
        let action = match assignments
            .iter()
            .position(|a| a.date == date && a.belongs_to(user))
        {
            Some(pos) => {
                assignments.remove(pos);
                ToggleAction::Removed
            }
            None => {
                assignments.push(ShiftAssignment::new(date, user.clone(), kind));
                ToggleAction::Added
            }
        };
        debug!(%date, user = %user, ?action, "toggle assignment");
        ToggleOutcome { action }
    }

    /// Bascule l'appartenance de `date` à l'ensemble global des jours de repos.
    pub fn toggle_rest_day(&mut self, date: NaiveDate) -> ToggleAction {
        let rest_days = &mut self.storage.rest_days;
        match rest_days.iter().position(|d| *d == date) {
            Some(pos) => {
                rest_days.remove(pos);
                ToggleAction::Removed
            }
            None => {
                rest_days.push(date);
                ToggleAction::Added
            }
        }
    }

    /// Régénère le cycle de l'utilisateur courant à partir de `start`.
    ///
    /// Instantané pris avant mutation ; les affectations de l'utilisateur à partir de
    /// `start` sont remplacées. Date illisible : erreur, aucune mutation.
    pub fn generate_cycle(
        &mut self,
        start: &str,
        kind: AssignmentKind,
    ) -> Result<Vec<ShiftAssignment>, SchedError> {
        let from = parse_date(start).ok_or_else(|| SchedError::InvalidDate(start.to_string()))?;
        let generated = cycle_from(from, &self.user, kind, self.cycle);
        if generated.is_empty() {
            return Err(SchedError::InvalidDate(start.to_string()));
        }

        self.undo.arm(&self.storage.assignments);
        let mut kept = filter_future(&self.storage.assignments, &self.user, from);
        kept.extend(generated.iter().cloned());
        self.storage.assignments = kept;

        debug!(user = %self.user, %from, count = generated.len(), "cycle generated");
        Ok(generated)
    }

    /// Retire les affectations de l'utilisateur courant à partir de `from`.
    /// Renvoie le nombre d'affectations supprimées.
    pub fn clear_future(&mut self, from: NaiveDate) -> usize {
        self.undo.arm(&self.storage.assignments);
        let before = self.storage.assignments.len();
        self.storage.assignments = filter_future(&self.storage.assignments, &self.user, from);
        before - self.storage.assignments.len()
    }

    /// Restaure l'instantané le plus récent, puis vide le tampon.
    pub fn undo(&mut self) -> Result<(), SchedError> {
        let snapshot = self.undo.take().ok_or(SchedError::NothingToUndo)?;
        self.storage.assignments = snapshot;
        Ok(())
    }

    /// Upsert par nom ; une config en rotation est refusée si le créneau est déjà pris.
    pub fn upsert_config(&mut self, config: UserShiftConfig) -> Result<(), SchedError> {
        if config.work_mode == WorkMode::Rotating {
            if let Some(owner) = check_collision(
                config.anchor_week,
                config.shift_type,
                &config.user_name,
                &self.storage.user_configs,
            ) {
                return Err(SchedError::Collision { owner });
            }
        }

        let id = config.user_id();
        match self
            .storage
            .user_configs
            .iter_mut()
            .find(|c| c.user_id() == id)
        {
            Some(existing) => *existing = config,
            None => self.storage.user_configs.push(config),
        }
        Ok(())
    }

    /// Tour effectif d'un chauffeur pour `date`.
    pub fn effective_shift(&self, date: NaiveDate, user: &UserId) -> EffectiveShift {
        effective_shift(&self.storage, date, user)
    }

    pub fn assignments_for<'a>(
        &'a self,
        user: &'a UserId,
    ) -> impl Iterator<Item = &'a ShiftAssignment> + 'a {
        self.storage.assignments.iter().filter(move |a| a.belongs_to(user))
    }

    /// Affectations à venir (date >= `from`), triées.
    pub fn upcoming(&self, user: &UserId, from: NaiveDate) -> Vec<&ShiftAssignment> {
        let mut out: Vec<&ShiftAssignment> = self
            .storage
            .assignments
            .iter()
            .filter(|a| a.belongs_to(user) && a.date >= from)
            .collect();
        out.sort_by_key(|a| a.date);
        out
    }

    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        self.storage.is_rest_day(date)
    }
}
