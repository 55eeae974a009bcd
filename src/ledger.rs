//! Collections sœurs synchronisées avec les tours : courses, dépenses, véhicule.
//!
//! La saisie (formulaires) vit hors de la lib ; ici on ne garde que des types stricts,
//! validés au moment de la désérialisation.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifiant fort pour une entrée du livre (course ou dépense)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    App,
    Account,
}

/// Course effectuée. Montants en centimes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: EntryId,
    pub date: NaiveDate,
    pub amount_cents: i64,
    pub payment: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Service {
    pub fn new(date: NaiveDate, amount_cents: i64, payment: PaymentMethod) -> Self {
        Self {
            id: EntryId::random(),
            date,
            amount_cents,
            payment,
            note: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpenseCategory {
    Fuel { liters_centi: u32 },
    Maintenance,
    Insurance,
    Fees,
    Other { label: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: EntryId,
    pub date: NaiveDate,
    pub amount_cents: i64,
    pub category: ExpenseCategory,
}

impl Expense {
    pub fn new(date: NaiveDate, amount_cents: i64, category: ExpenseCategory) -> Self {
        Self {
            id: EntryId::random(),
            date,
            amount_cents,
            category,
        }
    }
}

/// Élément d'entretien : variantes taguées (`kind`), jamais de blob libre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaintenanceItem {
    OilChange { last_km: u32, interval_km: u32 },
    Tires { last_km: u32, interval_km: u32 },
    Brakes { last_km: u32, interval_km: u32 },
    Inspection { due: NaiveDate },
    InsuranceRenewal { due: NaiveDate },
}

impl MaintenanceItem {
    /// Vrai si l'échéance est atteinte pour le kilométrage / la date donnés.
    pub fn is_due(&self, odometer_km: u32, today: NaiveDate) -> bool {
        match self {
            MaintenanceItem::OilChange { last_km, interval_km }
            | MaintenanceItem::Tires { last_km, interval_km }
            | MaintenanceItem::Brakes { last_km, interval_km } => {
                odometer_km >= last_km.saturating_add(*interval_km)
            }
            MaintenanceItem::Inspection { due } | MaintenanceItem::InsuranceRenewal { due } => {
                today >= *due
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Vehicle {
    #[serde(default)]
    pub plate: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub odometer_km: u32,
    #[serde(default)]
    pub maintenance: Vec<MaintenanceItem>,
}

impl Vehicle {
    pub fn due_items(&self, today: NaiveDate) -> Vec<&MaintenanceItem> {
        self.maintenance
            .iter()
            .filter(|item| item.is_due(self.odometer_km, today))
            .collect()
    }
}

/// Livre complet d'un chauffeur (hors tours).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ledger {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub vehicle: Vehicle,
}

impl Ledger {
    pub fn net_cents(&self) -> i64 {
        let income: i64 = self.services.iter().map(|s| s.amount_cents).sum();
        let spent: i64 = self.expenses.iter().map(|e| e.amount_cents).sum();
        income - spent
    }
}
