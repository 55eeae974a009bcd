//! Stockage distant faisant autorité, vu comme une boîte noire à trois opérations.
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Colonne de clé primaire utilisée pour l'upsert.
pub const ID_COLUMN: &str = "id";

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insère ou remplace des lignes (clé : colonne `id`).
    async fn upsert_rows(&self, table: &str, rows: Vec<Value>) -> anyhow::Result<()>;
    /// Toutes les lignes où `key == value`.
    async fn select_where(&self, table: &str, key: &str, value: &str)
        -> anyhow::Result<Vec<Value>>;
    async fn delete_where(&self, table: &str, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Trace d'un appel distant, pour l'inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Upsert { table: String, rows: Vec<Value> },
    Select { table: String, key: String, value: String },
    Delete { table: String, key: String, value: String },
}

impl RemoteCall {
    pub fn table(&self) -> &str {
        match self {
            RemoteCall::Upsert { table, .. }
            | RemoteCall::Select { table, .. }
            | RemoteCall::Delete { table, .. } => table,
        }
    }

    pub fn is_upsert(&self) -> bool {
        matches!(self, RemoteCall::Upsert { .. })
    }
}

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<String, Vec<Value>>,
    calls: Vec<RemoteCall>,
}

/// Stockage distant en mémoire (mode hors-ligne, tests). Les clones partagent l'état.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<Mutex<Tables>>,
    offline: Arc<AtomicBool>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simule une panne réseau : tous les appels échouent.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.inner.lock().map(|t| t.calls.clone()).unwrap_or_default()
    }

    pub fn upserts_to(&self, table: &str) -> Vec<Vec<Value>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RemoteCall::Upsert { table: t, rows } if t == table => Some(rows),
                _ => None,
            })
            .collect()
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.inner
            .lock()
            .map(|t| t.rows.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Écrit directement côté distant sans tracer d'appel (autre appareil).
    pub fn seed(&self, table: &str, rows: Vec<Value>) -> anyhow::Result<()> {
        let mut tables = self.lock()?;
        upsert_into(tables.rows.entry(table.to_string()).or_default(), rows);
        Ok(())
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Tables>> {
        self.inner.lock().map_err(|_| anyhow!("memory remote poisoned"))
    }

    fn check_online(&self) -> anyhow::Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            bail!("remote store unavailable");
        }
        Ok(())
    }
}

fn upsert_into(existing: &mut Vec<Value>, rows: Vec<Value>) {
    for row in rows {
        let id = row.get(ID_COLUMN).cloned();
        let pos = id
            .as_ref()
            .and_then(|id| existing.iter().position(|r| r.get(ID_COLUMN) == Some(id)));
        match pos {
            Some(pos) => existing[pos] = row,
            None => existing.push(row),
        }
    }
}

fn matches(row: &Value, key: &str, value: &str) -> bool {
    row.get(key).and_then(Value::as_str) == Some(value)
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn upsert_rows(&self, table: &str, rows: Vec<Value>) -> anyhow::Result<()> {
        self.check_online()?;
        let mut tables = self.lock()?;
        tables.calls.push(RemoteCall::Upsert {
            table: table.to_string(),
            rows: rows.clone(),
        });
        upsert_into(tables.rows.entry(table.to_string()).or_default(), rows);
        Ok(())
    }

    async fn select_where(
        &self,
        table: &str,
        key: &str,
        value: &str,
    ) -> anyhow::Result<Vec<Value>> {
        self.check_online()?;
        let mut tables = self.lock()?;
        tables.calls.push(RemoteCall::Select {
            table: table.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(tables
            .rows
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches(r, key, value)).cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_where(&self, table: &str, key: &str, value: &str) -> anyhow::Result<()> {
        self.check_online()?;
        let mut tables = self.lock()?;
        tables.calls.push(RemoteCall::Delete {
            table: table.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
        if let Some(rows) = tables.rows.get_mut(table) {
            rows.retain(|r| !matches(r, key, value));
        }
        Ok(())
    }
}
