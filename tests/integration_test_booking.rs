mod common;

use chrono::Weekday;
use common::{TestEngine, admin_actor, next_monday, now, t};
use scheduling_engine::domain::models::member::Role;
use scheduling_engine::domain::models::session::{ClassKind, SessionStatus};
use scheduling_engine::domain::services::booking::{NewSessionRequest, create_session};
use scheduling_engine::domain::services::conflict::ConflictKind;
use scheduling_engine::error::EngineError;

fn request(engine_school: &str, teacher: &str, student: &str, start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> NewSessionRequest {
    NewSessionRequest {
        teacher_id: teacher.to_string(),
        student_id: student.to_string(),
        school_id: engine_school.to_string(),
        date: next_monday(),
        start_time: t(start_h, start_m),
        end_time: t(end_h, end_m),
        kind: ClassKind::Individual,
        max_participants: None,
        metadata: None,
    }
}

#[tokio::test]
async fn test_successful_booking_starts_scheduled() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine
        .add_teacher_with_window("teach1", &school.id, Weekday::Mon, t(9, 0), t(17, 0))
        .await;
    engine.add_member("stu1", &school.id, Role::Student).await;

    let session = create_session(
        &engine.state,
        request(&school.id, "teach1", "stu1", 10, 0, 11, 0),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap();

    assert_eq!(session.status, SessionStatus::Scheduled);
    assert_eq!(session.duration_minutes, 60);
    assert_eq!(session.created_by, "boss");
}

#[tokio::test]
async fn test_booking_rejects_inverted_times() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    engine.add_member("stu1", &school.id, Role::Student).await;

    let err = create_session(
        &engine.state,
        request(&school.id, "teach1", "stu1", 11, 0, 10, 0),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn test_booking_rejects_non_member_student() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;

    let err = create_session(
        &engine.state,
        request(&school.id, "teach1", "ghost", 10, 0, 11, 0),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn test_group_booking_requires_max_participants() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    engine.add_member("stu1", &school.id, Role::Student).await;

    let mut req = request(&school.id, "teach1", "stu1", 10, 0, 11, 0);
    req.kind = ClassKind::Group;
    let err = create_session(&engine.state, req, &admin_actor("boss"), now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // And the converse: individual sessions must not carry a capacity.
    let mut req = request(&school.id, "teach1", "stu1", 10, 0, 11, 0);
    req.max_participants = Some(4);
    let err = create_session(&engine.state, req, &admin_actor("boss"), now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn test_overlapping_booking_is_a_teacher_overlap() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    engine.add_member("stu1", &school.id, Role::Student).await;
    engine.add_member("stu2", &school.id, Role::Student).await;

    create_session(
        &engine.state,
        request(&school.id, "teach1", "stu1", 10, 0, 11, 0),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap();

    let err = create_session(
        &engine.state,
        request(&school.id, "teach1", "stu2", 10, 30, 11, 30),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap_err();

    match err {
        EngineError::Conflict(conflict) => {
            assert_eq!(conflict.kind, ConflictKind::TeacherOverlap);
            assert!(conflict.session_id.is_some());
        }
        other => panic!("Expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_buffer_blocks_back_to_back_bookings() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    engine.add_member("stu1", &school.id, Role::Student).await;
    engine.add_member("stu2", &school.id, Role::Student).await;

    create_session(
        &engine.state,
        request(&school.id, "teach1", "stu1", 10, 0, 11, 0),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap();

    // 11:05 sits inside the default 15 minute buffer.
    let err = create_session(
        &engine.state,
        request(&school.id, "teach1", "stu2", 11, 5, 12, 0),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap_err();

    match err {
        EngineError::Conflict(conflict) => {
            assert_eq!(conflict.kind, ConflictKind::TeacherBuffer);
            assert_eq!(conflict.buffer_minutes, 15);
            assert!(conflict.message.contains("15"));
        }
        other => panic!("Expected buffer conflict, got {other:?}"),
    }

    // 11:15 clears the buffer.
    create_session(
        &engine.state,
        request(&school.id, "teach1", "stu2", 11, 15, 12, 15),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_cancelled_sessions_free_the_slot() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    engine.add_member("stu1", &school.id, Role::Student).await;
    engine.add_member("stu2", &school.id, Role::Student).await;

    let session = create_session(
        &engine.state,
        request(&school.id, "teach1", "stu1", 10, 0, 11, 0),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap();

    scheduling_engine::domain::services::lifecycle::cancel_session(
        &engine.state,
        &session.id,
        &admin_actor("boss"),
        None,
        now(),
    )
    .await
    .unwrap();

    create_session(
        &engine.state,
        request(&school.id, "teach1", "stu2", 10, 0, 11, 0),
        &admin_actor("boss"),
        now(),
    )
    .await
    .unwrap();
}
