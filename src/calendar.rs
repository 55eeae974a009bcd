//! Export iCalendar (RFC 5545) des jours de service et de repos.
//!
//! Transformation pure : aucune horloge, aucune E/S.
use crate::model::{ShiftStorage, UserId};
use crate::scheduler::{effective_shift, EffectiveShift, ShiftHours};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarOptions {
    pub calendar_name: String,
    pub include_rest_days: bool,
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self {
            calendar_name: "Taxi shifts".to_string(),
            include_rest_days: true,
        }
    }
}

struct Event {
    date: NaiveDate,
    uid: String,
    timing: Timing,
    summary: String,
}

enum Timing {
    AllDay,
    Timed(ShiftHours),
}

/// Exporte les jours de service de `user` entre `from` et `to` inclus.
pub fn export_ics(
    storage: &ShiftStorage,
    user: &UserId,
    from: NaiveDate,
    to: NaiveDate,
    opts: &CalendarOptions,
) -> String {
    let in_range = |d: NaiveDate| d >= from && d <= to;
    let mut events = Vec::new();

    for assignment in storage
        .assignments
        .iter()
        .filter(|a| a.belongs_to(user) && in_range(a.date))
    {
        let date = assignment.date;
        let uid = format!("{}-{}@taxishift", date.format("%Y%m%d"), user.as_str());
        match effective_shift(storage, date, user) {
            EffectiveShift::On { shift, hours } => events.push(Event {
                date,
                uid,
                timing: Timing::Timed(hours),
                summary: format!(
                    "{} shift ({}-{})",
                    capitalize(shift.as_str()),
                    hours.start_label(),
                    hours.end_label()
                ),
            }),
            EffectiveShift::FullDay { .. } => events.push(Event {
                date,
                uid,
                timing: Timing::AllDay,
                summary: "Full day shift".to_string(),
            }),
            EffectiveShift::Rest | EffectiveShift::Free => {}
        }
    }

    if opts.include_rest_days {
        for &date in storage.rest_days.iter().filter(|d| in_range(**d)) {
            events.push(Event {
                date,
                uid: format!("rest-{}@taxishift", date.format("%Y%m%d")),
                timing: Timing::AllDay,
                summary: "Rest day".to_string(),
            });
        }
    }
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.uid.cmp(&b.uid)));

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//taxishift//shifts//EN".to_string(),
        format!("X-WR-CALNAME:{}", escape_text(&opts.calendar_name)),
    ];
    for event in &events {
        push_event(&mut lines, event);
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

/// Lendemain ; le dernier jour représentable se borne à lui-même.
fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

fn push_event(lines: &mut Vec<String>, event: &Event) {
    let day = event.date.format("%Y%m%d");
    lines.push("BEGIN:VEVENT".to_string());
    lines.push(format!("UID:{}", event.uid));
    lines.push(format!("DTSTAMP:{day}T000000Z"));
    match event.timing {
        Timing::AllDay => {
            let next = next_day(event.date);
            lines.push(format!("DTSTART;VALUE=DATE:{day}"));
            lines.push(format!("DTEND;VALUE=DATE:{}", next.format("%Y%m%d")));
        }
        Timing::Timed(hours) => {
            let end_date = if hours.ends_next_day() {
                next_day(event.date)
            } else {
                event.date
            };
            lines.push(format!("DTSTART:{day}T{}", hours.start().format("%H%M%S")));
            lines.push(format!(
                "DTEND:{}T{}",
                end_date.format("%Y%m%d"),
                hours.end().format("%H%M%S")
            ));
        }
    }
    lines.push(format!("SUMMARY:{}", escape_text(&event.summary)));
    lines.push("END:VEVENT".to_string());
}

fn escape_text(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
