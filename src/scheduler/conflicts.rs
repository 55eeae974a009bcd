use crate::model::{AnchorWeek, ShiftType, UserId, UserShiftConfig, WorkMode};

/// Cherche un *autre* chauffeur en rotation qui détient déjà le créneau
/// (semaine d'ancrage, type de tour). Renvoie son nom tel que saisi.
///
/// Un chauffeur qui reconfirme son propre créneau n'est jamais en collision.
pub fn check_collision(
    anchor_week: AnchorWeek,
    shift_type: ShiftType,
    requesting_user: &str,
    configs: &[UserShiftConfig],
) -> Option<String> {
    let requester = UserId::normalize(requesting_user);
    configs
        .iter()
        .filter(|c| c.work_mode == WorkMode::Rotating)
        .filter(|c| c.user_id() != requester)
        .find(|c| c.anchor_week == anchor_week && c.shift_type == shift_type)
        .map(|c| c.user_name.clone())
}
