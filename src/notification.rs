use crate::model::{ShiftAssignment, UserId};
use crate::scheduler::date_number;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Moment du rappel par rapport au jour de service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    EveningBefore,
    MorningOf,
}

impl ReminderKind {
    fn suffix(self) -> i64 {
        match self {
            ReminderKind::EveningBefore => 1,
            ReminderKind::MorningOf => 2,
        }
    }
}

/// Rappel à planifier ; la livraison est externe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: i64,
    pub date: NaiveDate,
    pub kind: ReminderKind,
    pub fire_at: NaiveDateTime,
    pub content: String,
}

/// Heures des deux rappels (veille au soir, matin même).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderOptions {
    pub eve_time: NaiveTime,
    pub morning_time: NaiveTime,
}

impl Default for ReminderOptions {
    fn default() -> Self {
        Self {
            eve_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
            morning_time: NaiveTime::from_hms_opt(5, 0, 0).unwrap_or_default(),
        }
    }
}

/// Permet de customiser le rendu du message (notification locale, SMS, etc.).
pub trait ReminderRenderer {
    fn render(&self, date: NaiveDate, kind: ReminderKind) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextReminder;

impl ReminderRenderer for TextReminder {
    fn render(&self, date: NaiveDate, kind: ReminderKind) -> String {
        match kind {
            ReminderKind::EveningBefore => {
                format!("Reminder: you are on duty tomorrow ({}).", date.format("%Y-%m-%d"))
            }
            ReminderKind::MorningOf => {
                format!("You are on duty today ({}).", date.format("%Y-%m-%d"))
            }
        }
    }
}

/// Identifiant numérique d'un jour de service (`yyyymmdd`).
pub fn notification_id(date: NaiveDate) -> i64 {
    date_number(date)
}

/// Deux rappels par date : la veille au soir puis le matin même.
pub fn plan_reminders(
    dates: &[NaiveDate],
    opts: ReminderOptions,
    renderer: &dyn ReminderRenderer,
) -> Vec<Reminder> {
    let mut out = Vec::with_capacity(dates.len() * 2);
    for &date in dates {
        let eve = date.pred_opt().map(|eve| eve.and_time(opts.eve_time));
        for (kind, fire_at) in [
            (ReminderKind::EveningBefore, eve),
            (ReminderKind::MorningOf, Some(date.and_time(opts.morning_time))),
        ] {
            // pas de veille pour le premier jour représentable
            let Some(fire_at) = fire_at else { continue };
            out.push(Reminder {
                id: notification_id(date) * 10 + kind.suffix(),
                date,
                kind,
                fire_at,
                content: renderer.render(date, kind),
            });
        }
    }
    out
}

/// Rappels encore à venir pour les affectations d'un chauffeur.
pub fn upcoming_reminders(
    assignments: &[ShiftAssignment],
    user: &UserId,
    now: NaiveDateTime,
    opts: ReminderOptions,
    renderer: &dyn ReminderRenderer,
) -> Vec<Reminder> {
    let mut dates: Vec<NaiveDate> = assignments
        .iter()
        .filter(|a| a.belongs_to(user))
        .map(|a| a.date)
        .collect();
    dates.sort();
    dates.dedup();

    let mut reminders = plan_reminders(&dates, opts, renderer);
    reminders.retain(|r| r.fire_at > now);
    reminders
}
