use super::Collection;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

/// File « marquer sale, vider à échéance » : une échéance par collection,
/// repoussée à chaque nouvelle modification.
#[derive(Debug, Clone)]
pub struct FlushQueue {
    debounce: Duration,
    deadlines: BTreeMap<Collection, Instant>,
}

impl FlushQueue {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadlines: BTreeMap::new(),
        }
    }

    /// Marque la collection ; l'échéance repart de `now`.
    pub fn mark(&mut self, collection: Collection, now: Instant) -> Instant {
        let deadline = now + self.debounce;
        self.deadlines.insert(collection, deadline);
        deadline
    }

    /// Retire et renvoie les collections arrivées à échéance.
    pub fn take_due(&mut self, now: Instant) -> Vec<Collection> {
        let due: Vec<Collection> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(c, _)| *c)
            .collect();
        for c in &due {
            self.deadlines.remove(c);
        }
        due
    }

    pub fn take_all(&mut self) -> Vec<Collection> {
        std::mem::take(&mut self.deadlines).into_keys().collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn contains(&self, collection: Collection) -> bool {
        self.deadlines.contains_key(&collection)
    }

    pub fn pending(&self) -> Vec<Collection> {
        self.deadlines.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }
}
