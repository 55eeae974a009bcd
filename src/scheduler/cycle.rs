use super::{util, CycleOptions};
use crate::model::{AssignmentKind, ShiftAssignment, UserId};
use chrono::{Duration, NaiveDate};
use std::iter;

/// Génère `count` jours de service à partir de `start`, espacés de 11 jours.
///
/// Une date illisible donne une liste vide (échec silencieux, aucune panique).
/// Pas de dédoublonnage : à l'appelant de nettoyer les affectations qui se chevauchent.
pub fn generate_cycle(
    start: &str,
    user: &UserId,
    kind: AssignmentKind,
    count: usize,
) -> Vec<ShiftAssignment> {
    let opts = CycleOptions {
        count,
        ..CycleOptions::default()
    };
    match util::parse_date(start) {
        Some(date) => cycle_from(date, user, kind, opts),
        None => Vec::new(),
    }
}

pub fn cycle_from(
    start: NaiveDate,
    user: &UserId,
    kind: AssignmentKind,
    opts: CycleOptions,
) -> Vec<ShiftAssignment> {
    let step = Duration::days(opts.interval_days.max(1));
    // s'arrête au dernier jour représentable, quel que soit `count`
    iter::successors(Some(start), |d| d.checked_add_signed(step))
        .take(opts.count)
        .map(|date| ShiftAssignment::new(date, user.clone(), kind))
        .collect()
}
