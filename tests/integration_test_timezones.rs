mod common;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use common::{TestEngine, admin_actor, next_monday, now, t};
use scheduling_engine::domain::models::member::Role;
use scheduling_engine::domain::models::session::ClassKind;
use scheduling_engine::domain::ports::SchoolRepository;
use scheduling_engine::domain::services::booking::{NewSessionRequest, create_session};
use scheduling_engine::domain::services::slots::{SlotQuery, compute_slots};
use scheduling_engine::domain::services::timezone::{is_past, school_tz, to_utc_instant};
use scheduling_engine::error::EngineError;

#[tokio::test]
async fn test_slots_carry_school_local_and_utc_instants() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("America/Sao_Paulo").await;
    engine
        .add_teacher_with_window("teach1", &school.id, Weekday::Mon, t(14, 0), t(15, 0))
        .await;

    let slots = compute_slots(
        &engine.state,
        &SlotQuery {
            teacher_id: "teach1".to_string(),
            school_id: school.id.clone(),
            from: next_monday(),
            to: next_monday(),
            duration_minutes: 60,
            kind: None,
        },
        now(),
    )
    .await
    .unwrap();

    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].start_local, t(14, 0));
    // São Paulo is UTC-3, so 14:00 local is 17:00 UTC.
    let expected: DateTime<Utc> = "2030-01-07T17:00:00Z".parse().unwrap();
    assert_eq!(slots[0].start_utc, expected);
}

#[tokio::test]
async fn test_is_past_respects_the_school_timezone() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("America/Sao_Paulo").await;
    let tz = school_tz(&school);

    let date = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
    let instant = to_utc_instant(tz, date, t(14, 0)).unwrap();

    let morning: DateTime<Utc> = "2025-08-15T10:00:00-03:00".parse().unwrap();
    assert!(!is_past(instant, morning));

    let evening: DateTime<Utc> = "2025-08-15T20:00:00-03:00".parse().unwrap();
    assert!(is_past(instant, evening));
}

#[tokio::test]
async fn test_minimum_notice_uses_the_school_clock() {
    let engine = TestEngine::new().await;
    // UTC-3: at 2030-01-01T00:00Z it is 21:00 on 2029-12-31 locally.
    let school = engine.create_school("America/Sao_Paulo").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    engine.add_member("stu1", &school.id, Role::Student).await;

    // 22:30 local on 2029-12-31 is 01:30Z, only 90 minutes after "now",
    // even though the calendar date looks like yesterday from UTC.
    let err = create_session(
        &engine.state,
        NewSessionRequest {
            teacher_id: "teach1".to_string(),
            student_id: "stu1".to_string(),
            school_id: school.id.clone(),
            date: NaiveDate::from_ymd_opt(2029, 12, 31).unwrap(),
            start_time: t(22, 30),
            end_time: t(23, 30),
            kind: ClassKind::Individual,
            max_participants: None,
            metadata: None,
        },
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));

    // 23:00 local is 02:00Z: 120 minutes of notice, accepted.
    create_session(
        &engine.state,
        NewSessionRequest {
            teacher_id: "teach1".to_string(),
            student_id: "stu1".to_string(),
            school_id: school.id.clone(),
            date: NaiveDate::from_ymd_opt(2029, 12, 31).unwrap(),
            start_time: t(23, 0),
            end_time: t(23, 59),
            kind: ClassKind::Individual,
            max_participants: None,
            metadata: None,
        },
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_invalid_school_timezone_defaults_to_utc() {
    let engine = TestEngine::new().await;
    let mut school = engine.create_school("Mars/Olympus_Mons").await;
    school = engine.state.school_repo.update(&school).await.unwrap();
    assert_eq!(school_tz(&school), chrono_tz::UTC);

    engine
        .add_teacher_with_window("teach1", &school.id, Weekday::Mon, t(9, 0), t(10, 0))
        .await;

    let slots = compute_slots(
        &engine.state,
        &SlotQuery {
            teacher_id: "teach1".to_string(),
            school_id: school.id.clone(),
            from: next_monday(),
            to: next_monday(),
            duration_minutes: 60,
            kind: None,
        },
        now(),
    )
    .await
    .unwrap();

    let expected: DateTime<Utc> = "2030-01-07T09:00:00Z".parse().unwrap();
    assert_eq!(slots[0].start_utc, expected);
}
