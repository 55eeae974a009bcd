use super::SyncError;
use crate::ledger::{Expense, Service, Vehicle};
use crate::model::{ShiftStorage, UserId};
use crate::remote::ID_COLUMN;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Colonne de partition des lignes distantes.
pub const USER_COLUMN: &str = "user_id";
const DATA_COLUMN: &str = "data";

/// Collection synchronisée. Chacune est stockée à distance en une ligne par identité.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Assignments,
    Services,
    Expenses,
    Vehicle,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Assignments,
        Collection::Services,
        Collection::Expenses,
        Collection::Vehicle,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Collection::Assignments => "shift_storage",
            Collection::Services => "services",
            Collection::Expenses => "expenses",
            Collection::Vehicle => "vehicles",
        }
    }

    /// Clé du cache local pour un utilisateur.
    pub fn cache_key(self, user: &UserId) -> String {
        format!("{}:{}", user.as_str(), self.table())
    }
}

/// Contenu typé d'une collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionData {
    Assignments(ShiftStorage),
    Services(Vec<Service>),
    Expenses(Vec<Expense>),
    Vehicle(Vehicle),
}

impl CollectionData {
    pub fn collection(&self) -> Collection {
        match self {
            CollectionData::Assignments(_) => Collection::Assignments,
            CollectionData::Services(_) => Collection::Services,
            CollectionData::Expenses(_) => Collection::Expenses,
            CollectionData::Vehicle(_) => Collection::Vehicle,
        }
    }

    fn to_value(&self) -> serde_json::Result<Value> {
        match self {
            CollectionData::Assignments(v) => serde_json::to_value(v),
            CollectionData::Services(v) => serde_json::to_value(v),
            CollectionData::Expenses(v) => serde_json::to_value(v),
            CollectionData::Vehicle(v) => serde_json::to_value(v),
        }
    }

    /// Valide et type une valeur JSON pour `collection`.
    pub fn decode(collection: Collection, value: Value) -> Result<Self, SyncError> {
        let malformed = |source| SyncError::Malformed {
            table: collection.table(),
            source,
        };
        Ok(match collection {
            Collection::Assignments => {
                CollectionData::Assignments(serde_json::from_value(value).map_err(malformed)?)
            }
            Collection::Services => {
                CollectionData::Services(serde_json::from_value(value).map_err(malformed)?)
            }
            Collection::Expenses => {
                CollectionData::Expenses(serde_json::from_value(value).map_err(malformed)?)
            }
            Collection::Vehicle => {
                CollectionData::Vehicle(serde_json::from_value(value).map_err(malformed)?)
            }
        })
    }

    /// Ligne distante unique : `{id, user_id, data, updated_at}`.
    pub fn to_row(&self, user: &UserId) -> Result<Value, SyncError> {
        let mut row = Map::new();
        row.insert(ID_COLUMN.to_string(), json!(user.as_str()));
        row.insert(USER_COLUMN.to_string(), json!(user.as_str()));
        row.insert(DATA_COLUMN.to_string(), self.to_value()?);
        row.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        Ok(Value::Object(row))
    }

    /// Lit la ligne d'une collection ; `None` si l'identité n'a encore rien poussé.
    pub fn from_rows(collection: Collection, rows: Vec<Value>) -> Result<Option<Self>, SyncError> {
        let Some(mut row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let data = row
            .get_mut(DATA_COLUMN)
            .map(Value::take)
            .ok_or_else(|| SyncError::Malformed {
                table: collection.table(),
                source: <serde_json::Error as serde::de::Error>::missing_field(DATA_COLUMN),
            })?;
        Self::decode(collection, data).map(Some)
    }
}
