mod common;

use chrono::NaiveDate;
use common::{TestEngine, admin_actor, now, t};
use scheduling_engine::domain::models::member::Role;
use scheduling_engine::domain::models::policy::TeacherPolicyOverride;
use scheduling_engine::domain::models::session::ClassKind;
use scheduling_engine::domain::ports::AvailabilityRepository;
use scheduling_engine::domain::services::booking::{NewSessionRequest, create_session};
use scheduling_engine::error::{EngineError, PolicyRule};

fn same_day_request(school: &str, start_h: u32, start_m: u32) -> NewSessionRequest {
    NewSessionRequest {
        teacher_id: "teach1".to_string(),
        student_id: "stu1".to_string(),
        school_id: school.to_string(),
        // The fixed test clock is 2030-01-01T00:00:00Z.
        date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        start_time: t(start_h, start_m),
        end_time: t(start_h + 1, start_m),
        kind: ClassKind::Individual,
        max_participants: None,
        metadata: None,
    }
}

#[tokio::test]
async fn test_minimum_notice_90_rejected_130_accepted() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    engine.add_member("stu1", &school.id, Role::Student).await;

    // 01:30 is 90 minutes out; the default notice is 120.
    let err = create_session(
        &engine.state,
        same_day_request(&school.id, 1, 30),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap_err();

    match err {
        EngineError::PolicyViolation(violation) => {
            assert_eq!(violation.rule, PolicyRule::MinimumNotice);
            assert_eq!(violation.limit, 120);
            assert_eq!(violation.observed, 90);
        }
        other => panic!("Expected policy violation, got {other:?}"),
    }

    // 02:10 is 130 minutes out.
    create_session(
        &engine.state,
        same_day_request(&school.id, 2, 10),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_booking_in_the_past_is_invalid() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    engine.add_member("stu1", &school.id, Role::Student).await;

    let mut req = same_day_request(&school.id, 10, 0);
    req.date = NaiveDate::from_ymd_opt(2029, 12, 31).unwrap();

    let err = create_session(&engine.state, req, &admin_actor("boss"), now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn test_teacher_override_shortens_notice() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    engine.add_member("stu1", &school.id, Role::Student).await;

    let mut over = TeacherPolicyOverride::new("teach1".to_string(), school.id.clone(), now());
    over.min_notice_minutes = Some(60);
    engine
        .state
        .availability_repo
        .upsert_policy_override(&over)
        .await
        .unwrap();

    // 90 minutes out now clears the overridden 60 minute notice.
    create_session(
        &engine.state,
        same_day_request(&school.id, 1, 30),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_removing_override_restores_school_notice() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    engine.add_member("stu1", &school.id, Role::Student).await;

    let mut over = TeacherPolicyOverride::new("teach1".to_string(), school.id.clone(), now());
    over.min_notice_minutes = Some(60);
    engine
        .state
        .availability_repo
        .upsert_policy_override(&over)
        .await
        .unwrap();
    engine
        .state
        .availability_repo
        .delete_policy_override("teach1", &school.id)
        .await
        .unwrap();

    let err = create_session(
        &engine.state,
        same_day_request(&school.id, 1, 30),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));
}
