//! Coordination cache local / stockage distant.
//!
//! - Push : chaque modification locale (re)démarre l'échéance de sa collection ; à l'échéance,
//!   seul le dernier état est envoyé, en un appel.
//! - Pull : remplace l'état local en bloc (le distant fait foi en lecture). Pendant
//!   l'application, la phase `Pulling` empêche toute remise en file (pas de boucle).
//! - Échecs en arrière-plan : journalisés puis ignorés. Synchro manuelle : statut explicite.
mod collection;
mod queue;
mod types;

pub use collection::{Collection, CollectionData, USER_COLUMN};
pub use queue::FlushQueue;
pub use types::{GuardPhase, SyncError, SyncOptions, SyncState, SyncStatus};

use crate::ledger::{Expense, Ledger, Service, Vehicle};
use crate::model::{ShiftStorage, UserId};
use crate::remote::RemoteStore;
use crate::scheduler::ShiftScheduler;
use crate::storage::{load_or_default, save_json, LocalCache};
use futures::future::try_join_all;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Coordinateur d'une session : seul écrivain de l'état local.
pub struct SyncCoordinator<R, C> {
    remote: R,
    cache: C,
    user: UserId,
    opts: SyncOptions,
    shifts: ShiftScheduler,
    ledger: Ledger,
    queue: FlushQueue,
    phase: GuardPhase,
    state: SyncState,
    fetched: bool,
}

impl<R: RemoteStore, C: LocalCache> SyncCoordinator<R, C> {
    /// Ouvre une session pour `display_name` et recharge le cache local.
    ///
    /// Une entrée de cache corrompue est remplacée par une structure vide.
    pub fn open(display_name: &str, remote: R, cache: C, opts: SyncOptions) -> Self {
        let user = UserId::normalize(display_name);
        let storage: ShiftStorage =
            load_or_default(&cache, &Collection::Assignments.cache_key(&user));
        let ledger = Ledger {
            services: load_or_default(&cache, &Collection::Services.cache_key(&user)),
            expenses: load_or_default(&cache, &Collection::Expenses.cache_key(&user)),
            vehicle: load_or_default(&cache, &Collection::Vehicle.cache_key(&user)),
        };
        info!(user = %user, "sync session opened");
        Self {
            shifts: ShiftScheduler::with_storage(user.clone(), storage),
            queue: FlushQueue::new(opts.debounce()),
            remote,
            cache,
            user,
            opts,
            ledger,
            phase: GuardPhase::Idle,
            state: SyncState::default(),
            fetched: false,
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }
    pub fn shifts(&self) -> &ShiftScheduler {
        &self.shifts
    }
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
    pub fn state(&self) -> &SyncState {
        &self.state
    }
    pub fn phase(&self) -> GuardPhase {
        self.phase
    }
    pub fn has_fetched(&self) -> bool {
        self.fetched
    }
    pub fn pending(&self) -> Vec<Collection> {
        self.queue.pending()
    }

    /// Modifie les tours ; si l'état a changé, il est persisté puis mis en file.
    pub fn update_shifts<T>(&mut self, f: impl FnOnce(&mut ShiftScheduler) -> T) -> T {
        let before = self.shifts.storage().clone();
        let out = f(&mut self.shifts);
        if self.shifts.storage() != &before {
            self.commit(Collection::Assignments);
        }
        out
    }

    pub fn update_services<T>(&mut self, f: impl FnOnce(&mut Vec<Service>) -> T) -> T {
        let before = self.ledger.services.clone();
        let out = f(&mut self.ledger.services);
        if self.ledger.services != before {
            self.commit(Collection::Services);
        }
        out
    }

    pub fn update_expenses<T>(&mut self, f: impl FnOnce(&mut Vec<Expense>) -> T) -> T {
        let before = self.ledger.expenses.clone();
        let out = f(&mut self.ledger.expenses);
        if self.ledger.expenses != before {
            self.commit(Collection::Expenses);
        }
        out
    }

    pub fn update_vehicle<T>(&mut self, f: impl FnOnce(&mut Vehicle) -> T) -> T {
        let before = self.ledger.vehicle.clone();
        let out = f(&mut self.ledger.vehicle);
        if self.ledger.vehicle != before {
            self.commit(Collection::Vehicle);
        }
        out
    }

    /// Pousse les collections dont l'échéance est passée. Renvoie le nombre d'envois réussis.
    pub async fn flush_due(&mut self) -> usize {
        self.requeue_interrupted();
        if self.phase == GuardPhase::Pulling {
            return 0;
        }
        let due = self.queue.take_due(Instant::now());
        self.push_in_background(due).await
    }

    /// Pousse immédiatement tout ce qui est en attente (fermeture de l'appli).
    pub async fn flush_all(&mut self) -> usize {
        self.requeue_interrupted();
        let all = self.queue.take_all();
        self.push_in_background(all).await
    }

    /// Attend chaque échéance et pousse, jusqu'à ce que la file soit vide.
    pub async fn run_until_idle(&mut self) -> usize {
        let mut pushed = 0;
        while let Some(deadline) = self.queue.next_deadline() {
            tokio::time::sleep_until(deadline).await;
            pushed += self.flush_due().await;
        }
        pushed
    }

    /// Pull initial, une seule fois par session. Renvoie `true` si l'état distant a été appliqué.
    ///
    /// En cas d'échec, l'état local reste la référence et un appel ultérieur réessaie.
    pub async fn initial_pull(&mut self) -> bool {
        if self.fetched {
            return false;
        }
        self.requeue_interrupted();
        match self.fetch_all().await {
            Ok(data) => {
                self.apply_pulled(data);
                self.fetched = true;
                info!(user = %self.user, "initial pull applied");
                true
            }
            Err(err) => {
                warn!(user = %self.user, error = %err, "initial pull failed, keeping local state");
                false
            }
        }
    }

    /// Synchro manuelle : pousse tout, puis tire. Le statut reflète le résultat.
    pub async fn sync_now(&mut self) -> Result<(), SyncError> {
        self.requeue_interrupted();
        self.state.begin();
        match self.push_then_pull().await {
            Ok(()) => {
                self.state.succeed();
                info!(user = %self.user, "manual sync succeeded");
                Ok(())
            }
            Err(err) => {
                warn!(user = %self.user, error = %err, "manual sync failed");
                self.state.fail(&err);
                Err(err)
            }
        }
    }

    /// Supprime toutes les données distantes de l'identité, puis vide l'état local.
    pub async fn purge_remote(&mut self) -> Result<(), SyncError> {
        self.state.begin();
        let timeout = self.opts.request_timeout();
        for c in self.opts.tracked.clone() {
            let deleted = bounded(
                timeout,
                self.remote.delete_where(c.table(), USER_COLUMN, self.user.as_str()),
            )
            .await;
            if let Err(err) = deleted {
                self.state.fail(&err);
                return Err(err);
            }
        }

        self.queue.clear();
        self.phase = GuardPhase::Idle;
        self.shifts.replace_storage(ShiftStorage::default());
        self.ledger = Ledger::default();
        for c in Collection::ALL {
            if let Err(err) = self.cache.remove(&c.cache_key(&self.user)) {
                warn!(collection = c.table(), error = %err, "could not clear local cache");
            }
        }
        self.state.succeed();
        info!(user = %self.user, "remote data purged");
        Ok(())
    }

    /// Fin de session : les envois en attente sont abandonnés, le prochain login re-tire.
    pub fn end_session(&mut self) {
        self.queue.clear();
        self.fetched = false;
        self.phase = GuardPhase::Idle;
        self.state = SyncState::default();
    }

    /// Un envoi abandonné en cours de route laisse la phase `Pushing` : on remet sa
    /// collection en file.
    fn requeue_interrupted(&mut self) {
        if let GuardPhase::Pushing(collection) = self.phase {
            warn!(collection = collection.table(), "previous push interrupted, queued again");
            self.phase = GuardPhase::Idle;
            self.mark_dirty(collection);
        }
    }

    fn commit(&mut self, collection: Collection) {
        self.persist(collection);
        self.mark_dirty(collection);
    }

    fn mark_dirty(&mut self, collection: Collection) {
        if !self.opts.tracked.contains(&collection) {
            return;
        }
        if self.phase == GuardPhase::Pulling {
            debug!(collection = collection.table(), "change from pull, not queued");
            return;
        }
        self.queue.mark(collection, Instant::now());
    }

    fn persist(&self, collection: Collection) {
        let key = collection.cache_key(&self.user);
        let saved = match self.snapshot(collection) {
            CollectionData::Assignments(v) => save_json(&self.cache, &key, &v),
            CollectionData::Services(v) => save_json(&self.cache, &key, &v),
            CollectionData::Expenses(v) => save_json(&self.cache, &key, &v),
            CollectionData::Vehicle(v) => save_json(&self.cache, &key, &v),
        };
        if let Err(err) = saved {
            warn!(key = %key, error = %err, "could not write local cache");
        }
    }

    fn snapshot(&self, collection: Collection) -> CollectionData {
        match collection {
            Collection::Assignments => CollectionData::Assignments(self.shifts.storage().clone()),
            Collection::Services => CollectionData::Services(self.ledger.services.clone()),
            Collection::Expenses => CollectionData::Expenses(self.ledger.expenses.clone()),
            Collection::Vehicle => CollectionData::Vehicle(self.ledger.vehicle.clone()),
        }
    }

    async fn push(&mut self, collection: Collection) -> Result<(), SyncError> {
        let row = self.snapshot(collection).to_row(&self.user)?;
        self.phase = GuardPhase::Pushing(collection);
        let pushed = bounded(
            self.opts.request_timeout(),
            self.remote.upsert_rows(collection.table(), vec![row]),
        )
        .await;
        self.phase = GuardPhase::Idle;
        debug!(collection = collection.table(), ok = pushed.is_ok(), "push");
        pushed
    }

    async fn push_in_background(&mut self, collections: Vec<Collection>) -> usize {
        let mut pushed = 0;
        for c in collections {
            match self.push(c).await {
                Ok(()) => pushed += 1,
                Err(err) => {
                    warn!(collection = c.table(), error = %err, "background push failed")
                }
            }
        }
        pushed
    }

    async fn push_then_pull(&mut self) -> Result<(), SyncError> {
        for c in self.opts.tracked.clone() {
            self.push(c).await?;
        }
        self.queue.clear();
        let data = self.fetch_all().await?;
        self.apply_pulled(data);
        self.fetched = true;
        Ok(())
    }

    /// Tire toutes les collections suivies en parallèle ; tout est validé avant application.
    async fn fetch_all(&self) -> Result<Vec<CollectionData>, SyncError> {
        let timeout = self.opts.request_timeout();
        let user = self.user.as_str();
        let fetches = self.opts.tracked.iter().map(|&c| async move {
            let rows =
                bounded(timeout, self.remote.select_where(c.table(), USER_COLUMN, user)).await?;
            CollectionData::from_rows(c, rows)
        });
        let fetched = try_join_all(fetches).await?;
        Ok(fetched.into_iter().flatten().collect())
    }

    /// Applique un pull. Une collection sans ligne distante garde son état local.
    fn apply_pulled(&mut self, data: Vec<CollectionData>) {
        self.phase = GuardPhase::Pulling;
        for item in data {
            let collection = item.collection();
            match item {
                CollectionData::Assignments(v) => self.shifts.replace_storage(v),
                CollectionData::Services(v) => self.ledger.services = v,
                CollectionData::Expenses(v) => self.ledger.expenses = v,
                CollectionData::Vehicle(v) => self.ledger.vehicle = v,
            }
            self.commit(collection);
        }
        self.phase = GuardPhase::Idle;
    }
}

/// Borne un appel distant par `limit`.
async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, SyncError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(SyncError::Remote(format!("{err:#}"))),
        Err(_) => Err(SyncError::Timeout(limit)),
    }
}
