#![forbid(unsafe_code)]
use chrono::{Duration, NaiveDate};
use taxishift::model::{
    AnchorWeek, AssignmentKind, ShiftAssignment, ShiftType, UserId, UserShiftConfig, WorkMode,
};
use taxishift::scheduler::{
    check_collision, cycle_from, filter_future, generate_cycle, resolve, week_label, CycleOptions,
    EffectiveShift, SchedError, ShiftScheduler, ToggleAction, UndoState,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn rotating(name: &str, anchor: AnchorWeek, shift: ShiftType) -> UserShiftConfig {
    UserShiftConfig::new(name, anchor, shift, WorkMode::Rotating)
}

#[test]
fn cycle_is_spaced_by_eleven_days() {
    let ana = UserId::normalize("ana");
    let cycle = generate_cycle("2024-12-15", &ana, AssignmentKind::Standard, 9);

    let dates: Vec<String> = cycle.iter().map(|a| a.date.to_string()).collect();
    assert_eq!(
        dates,
        vec![
            "2024-12-15", "2024-12-26", "2025-01-06", "2025-01-17", "2025-01-28",
            "2025-02-08", "2025-02-19", "2025-03-02", "2025-03-13",
        ]
    );
    assert!(cycle
        .iter()
        .all(|a| a.user_id == ana && a.kind == AssignmentKind::Standard));
    for pair in cycle.windows(2) {
        assert_eq!(pair[1].date - pair[0].date, Duration::days(11));
    }
}

#[test]
fn cycle_with_unparsable_date_is_empty() {
    let ana = UserId::normalize("ana");
    assert!(generate_cycle("15/12/2024", &ana, AssignmentKind::Full, 9).is_empty());
    assert!(generate_cycle("", &ana, AssignmentKind::Full, 3).is_empty());
    assert!(generate_cycle("2024-12-15", &ana, AssignmentKind::Full, 0).is_empty());
}

#[test]
fn unbounded_cycle_count_stops_at_last_representable_day() {
    let ana = UserId::normalize("ana");
    let start = NaiveDate::MAX - Duration::days(100);
    let opts = CycleOptions {
        interval_days: 11,
        count: usize::MAX,
    };

    let cycle = cycle_from(start, &ana, AssignmentKind::Standard, opts);
    assert_eq!(cycle.len(), 10);
    let last = cycle.last().unwrap().date;
    assert_eq!(last, NaiveDate::MAX - Duration::days(1));
    assert!(last.checked_add_signed(Duration::days(11)).is_none());
}

#[test]
fn filter_future_keeps_other_users_and_past() {
    let u1 = UserId::normalize("u1");
    let u2 = UserId::normalize("u2");
    let assignments = vec![
        ShiftAssignment::new(d(2024, 12, 1), u1.clone(), AssignmentKind::Standard),
        ShiftAssignment::new(d(2024, 12, 15), u1.clone(), AssignmentKind::Standard),
        ShiftAssignment::new(d(2024, 12, 20), u2.clone(), AssignmentKind::Standard),
    ];

    let kept = filter_future(&assignments, &u1, d(2024, 12, 15));
    assert_eq!(kept, vec![assignments[0].clone(), assignments[2].clone()]);
    assert!(kept.iter().all(|a| assignments.contains(a)));
    assert!(kept.iter().all(|a| a.user_id != u1 || a.date < d(2024, 12, 15)));
}

#[test]
fn rotation_alternates_weekly() {
    let config = rotating("ana", AnchorWeek::WeekA, ShiftType::Morning);
    // 2024-12-16 : semaine ISO 51 (impaire)
    let odd_week = d(2024, 12, 16);
    assert_eq!(week_label(odd_week), AnchorWeek::WeekA);

    let first = resolve(odd_week, &config);
    assert_eq!(first.shift_type(), Some(ShiftType::Morning));
    assert_eq!(first.hours().unwrap().start_label(), "06:00");

    let next = resolve(odd_week + Duration::weeks(1), &config);
    assert_eq!(next.shift_type(), Some(ShiftType::Evening));
    assert_eq!(next.hours().unwrap().start_label(), "15:00");
    assert_eq!(next.hours().unwrap().end_label(), "00:00");

    for offset in 0..20 {
        let day = odd_week + Duration::days(offset * 3);
        assert_eq!(resolve(day, &config), resolve(day, &config));
        assert_eq!(resolve(day, &config), resolve(day + Duration::weeks(2), &config));
        assert_ne!(
            resolve(day, &config).shift_type(),
            resolve(day + Duration::weeks(1), &config).shift_type()
        );
    }
}

#[test]
fn rotation_follows_iso_week_across_year_boundary() {
    let config = rotating("ana", AnchorWeek::WeekA, ShiftType::Evening);
    // 2024-12-30 appartient à la semaine 1 de 2025
    assert_eq!(week_label(d(2024, 12, 30)), AnchorWeek::WeekA);
    assert_eq!(resolve(d(2024, 12, 30), &config).shift_type(), Some(ShiftType::Evening));
    assert_eq!(resolve(d(2024, 12, 29), &config).shift_type(), Some(ShiftType::Morning));
}

#[test]
fn solo_and_fixed_modes() {
    let solo = UserShiftConfig::new("ana", AnchorWeek::WeekB, ShiftType::Evening, WorkMode::Solo);
    assert_eq!(resolve(d(2025, 3, 3), &solo), EffectiveShift::Free);

    let fixed = UserShiftConfig::new("ana", AnchorWeek::WeekB, ShiftType::Evening, WorkMode::Fixed);
    for offset in 0..14 {
        let r = resolve(d(2025, 3, 3) + Duration::days(offset), &fixed);
        assert_eq!(r.shift_type(), Some(ShiftType::Evening));
    }
}

#[test]
fn toggle_assignment_is_self_inverse() {
    let ana = UserId::normalize("ana");
    let mut s = ShiftScheduler::new(ana.clone());
    s.toggle_assignment(d(2024, 12, 1), AssignmentKind::Standard, &ana);
    let before = s.storage().assignments.clone();

    let first = s.toggle_assignment(d(2024, 12, 2), AssignmentKind::Full, &ana);
    let second = s.toggle_assignment(d(2024, 12, 2), AssignmentKind::Full, &ana);
    assert_eq!(first.action, ToggleAction::Added);
    assert_eq!(second.action, ToggleAction::Removed);
    assert_eq!(s.storage().assignments, before);
}

#[test]
fn toggle_is_keyed_by_date_and_user() {
    let ana = UserId::normalize("ana");
    let bob = UserId::normalize("bob");
    let mut s = ShiftScheduler::new(ana.clone());
    s.toggle_assignment(d(2024, 12, 2), AssignmentKind::Standard, &ana);
    let other = s.toggle_assignment(d(2024, 12, 2), AssignmentKind::Standard, &bob);
    assert_eq!(other.action, ToggleAction::Added);
    assert_eq!(s.storage().assignments.len(), 2);
}

#[test]
fn rest_days_toggle_in_global_set() {
    let mut s = ShiftScheduler::new(UserId::normalize("ana"));
    assert_eq!(s.toggle_rest_day(d(2024, 12, 25)), ToggleAction::Added);
    assert!(s.is_rest_day(d(2024, 12, 25)));
    assert_eq!(s.toggle_rest_day(d(2024, 12, 25)), ToggleAction::Removed);
    assert!(s.storage().rest_days.is_empty());
}

#[test]
fn generate_then_undo_restores_previous_state() {
    let ana = UserId::normalize("ana");
    let bob = UserId::normalize("bob");
    let mut s = ShiftScheduler::new(ana.clone());
    s.toggle_assignment(d(2024, 12, 1), AssignmentKind::Standard, &ana);
    s.toggle_assignment(d(2024, 12, 20), AssignmentKind::Standard, &ana);
    s.toggle_assignment(d(2024, 12, 21), AssignmentKind::Standard, &bob);
    let before = s.storage().assignments.clone();
    assert_eq!(s.undo_state(), UndoState::Empty);

    let generated = s.generate_cycle("2024-12-15", AssignmentKind::Standard).unwrap();
    assert_eq!(generated.len(), 9);
    assert_eq!(s.undo_state(), UndoState::Armed);
    // 12-20 (ana) remplacé, 12-21 (bob) conservé
    assert!(s.storage().find_assignment(d(2024, 12, 20), &ana).is_none());
    assert!(s.storage().find_assignment(d(2024, 12, 21), &bob).is_some());
    assert!(s.storage().find_assignment(d(2024, 12, 1), &ana).is_some());
    assert_eq!(s.storage().assignments.len(), 2 + 9);

    s.undo().unwrap();
    assert_eq!(s.storage().assignments, before);
    assert!(matches!(s.undo(), Err(SchedError::NothingToUndo)));
}

#[test]
fn only_latest_destructive_operation_is_undoable() {
    let ana = UserId::normalize("ana");
    let mut s = ShiftScheduler::new(ana.clone());
    s.generate_cycle("2024-12-15", AssignmentKind::Standard).unwrap();
    let after_generate = s.storage().assignments.clone();

    let removed = s.clear_future(d(2025, 1, 1));
    assert_eq!(removed, 7);
    assert_eq!(s.undo_state(), UndoState::Armed);

    s.undo().unwrap();
    assert_eq!(s.storage().assignments, after_generate);
    assert!(s.undo().is_err());
}

#[test]
fn generate_with_bad_date_does_not_mutate() {
    let ana = UserId::normalize("ana");
    let mut s = ShiftScheduler::new(ana.clone());
    s.toggle_assignment(d(2024, 12, 1), AssignmentKind::Standard, &ana);
    let before = s.storage().clone();

    let err = s.generate_cycle("tomorrow", AssignmentKind::Standard).unwrap_err();
    assert!(matches!(err, SchedError::InvalidDate(_)));
    assert_eq!(s.storage(), &before);
    assert_eq!(s.undo_state(), UndoState::Empty);
}

#[test]
fn collision_reports_other_owner_only() {
    let configs = vec![
        rotating("Ana", AnchorWeek::WeekA, ShiftType::Morning),
        rotating("Bob", AnchorWeek::WeekA, ShiftType::Evening),
    ];
    assert_eq!(
        check_collision(AnchorWeek::WeekA, ShiftType::Morning, "bob", &configs),
        Some("Ana".to_string())
    );
    assert_eq!(
        check_collision(AnchorWeek::WeekA, ShiftType::Morning, " ANA ", &configs),
        None
    );
    assert_eq!(
        check_collision(AnchorWeek::WeekB, ShiftType::Morning, "bob", &configs),
        None
    );
}

#[test]
fn upsert_config_refuses_claimed_slot() {
    let mut s = ShiftScheduler::new(UserId::normalize("bob"));
    s.upsert_config(rotating("Ana", AnchorWeek::WeekA, ShiftType::Morning))
        .unwrap();

    let err = s
        .upsert_config(rotating("Bob", AnchorWeek::WeekA, ShiftType::Morning))
        .unwrap_err();
    match err {
        SchedError::Collision { owner } => assert_eq!(owner, "Ana"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(s.storage().user_configs.len(), 1);

    // complémentaire : accepté ; puis upsert par nom
    s.upsert_config(rotating("Bob", AnchorWeek::WeekB, ShiftType::Morning))
        .unwrap();
    s.upsert_config(UserShiftConfig::new(
        "bob ",
        AnchorWeek::WeekB,
        ShiftType::Evening,
        WorkMode::Fixed,
    ))
    .unwrap();
    assert_eq!(s.storage().user_configs.len(), 2);
    let bob = s.storage().find_config(&UserId::normalize("Bob")).unwrap();
    assert_eq!(bob.work_mode, WorkMode::Fixed);
}

#[test]
fn effective_shift_prefers_assignment_then_rest_then_rotation() {
    let ana = UserId::normalize("ana");
    let mut s = ShiftScheduler::new(ana.clone());
    s.upsert_config(rotating("ana", AnchorWeek::WeekA, ShiftType::Morning))
        .unwrap();
    s.toggle_assignment(d(2024, 12, 27), AssignmentKind::Full, &ana);
    s.toggle_rest_day(d(2024, 12, 25));

    assert!(matches!(
        s.effective_shift(d(2024, 12, 27), &ana),
        EffectiveShift::FullDay { .. }
    ));
    assert_eq!(s.effective_shift(d(2024, 12, 25), &ana), EffectiveShift::Rest);
    assert_eq!(
        s.effective_shift(d(2024, 12, 16), &ana).shift_type(),
        Some(ShiftType::Morning)
    );
    assert_eq!(
        s.effective_shift(d(2024, 12, 16), &UserId::normalize("nobody")),
        EffectiveShift::Free
    );
}

#[test]
fn standard_assignment_follows_the_week_rotation() {
    let ana = UserId::normalize("ana");
    let bob = UserId::normalize("bob");
    let mut s = ShiftScheduler::new(ana.clone());
    s.upsert_config(rotating("ana", AnchorWeek::WeekA, ShiftType::Morning))
        .unwrap();
    s.upsert_config(UserShiftConfig::new(
        "bob",
        AnchorWeek::WeekA,
        ShiftType::Morning,
        WorkMode::Fixed,
    ))
    .unwrap();
    // 2024-12-23 : semaine 52, B
    s.toggle_assignment(d(2024, 12, 23), AssignmentKind::Standard, &ana);
    s.toggle_assignment(d(2024, 12, 23), AssignmentKind::Standard, &bob);

    assert_eq!(
        s.effective_shift(d(2024, 12, 23), &ana).shift_type(),
        Some(ShiftType::Evening)
    );
    assert_eq!(
        s.effective_shift(d(2024, 12, 23), &bob).shift_type(),
        Some(ShiftType::Morning)
    );
}

#[test]
fn upcoming_is_sorted_and_filtered() {
    let ana = UserId::normalize("ana");
    let mut s = ShiftScheduler::new(ana.clone());
    s.toggle_assignment(d(2025, 1, 20), AssignmentKind::Standard, &ana);
    s.toggle_assignment(d(2025, 1, 5), AssignmentKind::Standard, &ana);
    s.toggle_assignment(d(2024, 12, 5), AssignmentKind::Standard, &ana);

    let dates: Vec<NaiveDate> = s.upcoming(&ana, d(2025, 1, 1)).iter().map(|a| a.date).collect();
    assert_eq!(dates, vec![d(2025, 1, 5), d(2025, 1, 20)]);
    assert_eq!(s.assignments_for(&ana).count(), 3);
}

#[test]
fn shift_storage_json_shape() {
    let json = r#"{
        "assignments": [{"date": "2024-12-15", "userId": "ana", "type": "full"}],
        "restDays": ["2024-12-25"],
        "userConfigs": [{"userName": "Ana", "anchorWeek": "Week B", "shiftType": "evening", "workMode": "rotating"}]
    }"#;
    let storage: taxishift::ShiftStorage = serde_json::from_str(json).unwrap();
    assert_eq!(storage.assignments[0].kind, AssignmentKind::Full);
    assert_eq!(storage.user_configs[0].anchor_week, AnchorWeek::WeekB);

    let bad = r#"{"userConfigs": [{"userName": "Ana", "anchorWeek": "Week C", "shiftType": "evening", "workMode": "rotating"}]}"#;
    assert!(serde_json::from_str::<taxishift::ShiftStorage>(bad).is_err());
}
