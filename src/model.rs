use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identité normalisée d'un chauffeur (nom affiché, trim + minuscules).
///
/// Sert de clé de partition distante : `" Ana "` et `"ana"` désignent la même personne.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn normalize<S: AsRef<str>>(display_name: S) -> Self {
        Self(display_name.as_ref().trim().to_lowercase())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

/// Type d'affectation : tour standard ou journée complète.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentKind {
    Standard,
    Full,
}

/// Jour de service d'un chauffeur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub date: NaiveDate,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: AssignmentKind,
}

impl ShiftAssignment {
    pub fn new(date: NaiveDate, user_id: UserId, kind: AssignmentKind) -> Self {
        Self { date, user_id, kind }
    }

    pub fn belongs_to(&self, user: &UserId) -> bool {
        &self.user_id == user
    }
}

/// Étiquette de semaine ISO : impaire = A, paire = B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorWeek {
    #[serde(rename = "Week A")]
    WeekA,
    #[serde(rename = "Week B")]
    WeekB,
}

impl AnchorWeek {
    pub fn from_iso_week(week: u32) -> Self {
        if week % 2 == 1 {
            AnchorWeek::WeekA
        } else {
            AnchorWeek::WeekB
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Morning,
    Evening,
}

impl ShiftType {
    pub fn opposite(self) -> Self {
        match self {
            ShiftType::Morning => ShiftType::Evening,
            ShiftType::Evening => ShiftType::Morning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::Morning => "morning",
            ShiftType::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    Solo,
    Fixed,
    Rotating,
}

/// Configuration de tour d'un chauffeur (une par nom, upsert par nom).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserShiftConfig {
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "anchorWeek")]
    pub anchor_week: AnchorWeek,
    #[serde(rename = "shiftType")]
    pub shift_type: ShiftType,
    #[serde(rename = "workMode")]
    pub work_mode: WorkMode,
}

impl UserShiftConfig {
    pub fn new<N: Into<String>>(
        user_name: N,
        anchor_week: AnchorWeek,
        shift_type: ShiftType,
        work_mode: WorkMode,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            anchor_week,
            shift_type,
            work_mode,
        }
    }

    pub fn user_id(&self) -> UserId {
        UserId::normalize(&self.user_name)
    }
}

/// Agrégat persisté : un document JSON en local, une ligne distante par identité.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShiftStorage {
    #[serde(default)]
    pub assignments: Vec<ShiftAssignment>,
    #[serde(default, rename = "restDays")]
    pub rest_days: Vec<NaiveDate>,
    #[serde(default, rename = "userConfigs")]
    pub user_configs: Vec<UserShiftConfig>,
}

impl ShiftStorage {
    pub fn find_assignment(&self, date: NaiveDate, user: &UserId) -> Option<&ShiftAssignment> {
        self.assignments
            .iter()
            .find(|a| a.date == date && a.belongs_to(user))
    }

    pub fn find_config(&self, user: &UserId) -> Option<&UserShiftConfig> {
        self.user_configs.iter().find(|c| &c.user_id() == user)
    }

    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        self.rest_days.contains(&date)
    }
}
