use crate::model::{ShiftAssignment, UserId};
use chrono::{DateTime, NaiveDate};

/// Parse une date calendaire ISO (`YYYY-MM-DD`) ou un horodatage RFC3339.
///
/// Renvoie `None` plutôt qu'une erreur : l'appelant décide du repli.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Garde les affectations des autres chauffeurs intactes ; pour `user`, ne garde que
/// celles strictement antérieures à `from`.
pub fn filter_future(
    assignments: &[ShiftAssignment],
    user: &UserId,
    from: NaiveDate,
) -> Vec<ShiftAssignment> {
    assignments
        .iter()
        .filter(|a| !a.belongs_to(user) || a.date < from)
        .cloned()
        .collect()
}

/// Identifiant numérique dérivé d'une date (`yyyymmdd`).
pub fn date_number(date: NaiveDate) -> i64 {
    use chrono::Datelike;
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_plain_and_rfc3339() {
        let d = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        assert_eq!(parse_date("2024-12-15"), Some(d));
        assert_eq!(parse_date(" 2024-12-15 "), Some(d));
        assert_eq!(parse_date("2024-12-15T08:30:00Z"), Some(d));
        assert_eq!(parse_date("2024-13-40"), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn date_number_is_yyyymmdd() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(date_number(d), 20250106);
    }

    #[test]
    fn date_number_holds_extreme_years() {
        let far = NaiveDate::from_ymd_opt(262_142, 12, 31).unwrap();
        assert_eq!(date_number(far), 2_621_421_231);
        assert_eq!(date_number(NaiveDate::from_ymd_opt(214_749, 1, 1).unwrap()), 2_147_490_101);
    }
}
