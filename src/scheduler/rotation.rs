use crate::model::{
    AnchorWeek, AssignmentKind, ShiftStorage, ShiftType, UserId, UserShiftConfig, WorkMode,
};
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;

/// Plage horaire d'un tour (heures pleines, fin possiblement à minuit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShiftHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl ShiftHours {
    pub const MORNING: ShiftHours = ShiftHours { start_hour: 6, end_hour: 15 };
    pub const EVENING: ShiftHours = ShiftHours { start_hour: 15, end_hour: 0 };
    pub const FULL_DAY: ShiftHours = ShiftHours { start_hour: 6, end_hour: 0 };

    pub fn for_shift(shift: ShiftType) -> Self {
        match shift {
            ShiftType::Morning => Self::MORNING,
            ShiftType::Evening => Self::EVENING,
        }
    }

    pub fn start(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.start_hour % 24, 0, 0).unwrap_or_default()
    }

    pub fn end(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.end_hour % 24, 0, 0).unwrap_or_default()
    }

    /// Vrai si le tour se termine le lendemain (fin <= début).
    pub fn ends_next_day(self) -> bool {
        self.end() <= self.start()
    }

    pub fn start_label(self) -> String {
        self.start().format("%H:%M").to_string()
    }

    pub fn end_label(self) -> String {
        self.end().format("%H:%M").to_string()
    }
}

/// Tour effectif d'un chauffeur pour un jour donné.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EffectiveShift {
    /// Pas de tour (mode solo, ou aucune configuration).
    Free,
    /// Jour de repos déclaré.
    Rest,
    On { shift: ShiftType, hours: ShiftHours },
    /// Journée complète (affectation `full`).
    FullDay { hours: ShiftHours },
}

impl EffectiveShift {
    pub fn on(shift: ShiftType) -> Self {
        EffectiveShift::On {
            shift,
            hours: ShiftHours::for_shift(shift),
        }
    }

    pub fn shift_type(&self) -> Option<ShiftType> {
        match self {
            EffectiveShift::On { shift, .. } => Some(*shift),
            _ => None,
        }
    }

    pub fn hours(&self) -> Option<ShiftHours> {
        match self {
            EffectiveShift::On { hours, .. } | EffectiveShift::FullDay { hours } => Some(*hours),
            _ => None,
        }
    }
}

/// Étiquette A/B de la semaine ISO contenant `date` (lundi, semaine 1 = premier jeudi).
pub fn week_label(date: NaiveDate) -> AnchorWeek {
    AnchorWeek::from_iso_week(date.iso_week().week())
}

/// Résout le tour effectif de `date` pour une configuration. Pur, sans cache.
pub fn resolve(date: NaiveDate, config: &UserShiftConfig) -> EffectiveShift {
    match config.work_mode {
        WorkMode::Solo => EffectiveShift::Free,
        WorkMode::Fixed => EffectiveShift::on(config.shift_type),
        WorkMode::Rotating => {
            let shift = if week_label(date) == config.anchor_week {
                config.shift_type
            } else {
                config.shift_type.opposite()
            };
            EffectiveShift::on(shift)
        }
    }
}

/// Tour effectif d'un chauffeur : une affectation explicite l'emporte, puis le repos,
/// puis la rotation configurée.
///
/// Une affectation `standard` prend le tour résolu pour la date (parité de semaine en mode
/// `rotating`) ; sans tour résolu, celui de la config, matin par défaut.
pub fn effective_shift(
    storage: &ShiftStorage,
    date: NaiveDate,
    user: &UserId,
) -> EffectiveShift {
    let config = storage.find_config(user);
    if let Some(assignment) = storage.find_assignment(date, user) {
        return match assignment.kind {
            AssignmentKind::Full => EffectiveShift::FullDay {
                hours: ShiftHours::FULL_DAY,
            },
            AssignmentKind::Standard => match config.map(|c| resolve(date, c)) {
                Some(shift @ EffectiveShift::On { .. }) => shift,
                _ => EffectiveShift::on(config.map_or(ShiftType::Morning, |c| c.shift_type)),
            },
        };
    }
    if storage.is_rest_day(date) {
        return EffectiveShift::Rest;
    }
    config.map_or(EffectiveShift::Free, |c| resolve(date, c))
}
