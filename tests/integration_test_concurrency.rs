mod common;

use common::{TestEngine, admin_actor, next_monday, now, t};
use scheduling_engine::domain::models::member::Role;
use scheduling_engine::domain::models::session::ClassKind;
use scheduling_engine::domain::services::booking::{NewSessionRequest, create_session};
use scheduling_engine::error::EngineError;

fn request(school: &str, student: &str) -> NewSessionRequest {
    NewSessionRequest {
        teacher_id: "teach1".to_string(),
        student_id: student.to_string(),
        school_id: school.to_string(),
        date: next_monday(),
        start_time: t(10, 0),
        end_time: t(11, 0),
        kind: ClassKind::Individual,
        max_participants: None,
        metadata: None,
    }
}

#[tokio::test]
async fn test_racing_bookings_for_the_same_slot_admit_one_winner() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    for student in ["stu1", "stu2"] {
        engine.add_member(student, &school.id, Role::Student).await;
    }

    let actor = admin_actor("boss");
    let (a, b) = tokio::join!(
        create_session(&engine.state, request(&school.id, "stu1"), &actor, now()),
        create_session(&engine.state, request(&school.id, "stu2"), &actor, now()),
    );

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one of two racing bookings must succeed");

    let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(
        matches!(
            loser,
            EngineError::Conflict(_) | EngineError::ConcurrencyConflict(_)
        ),
        "loser must see a conflict, got {loser:?}"
    );
}

#[tokio::test]
async fn test_racing_bookings_for_adjacent_slots_both_succeed() {
    let engine = TestEngine::new().await;
    let school = engine.create_school("UTC").await;
    engine.add_member("teach1", &school.id, Role::Teacher).await;
    for student in ["stu1", "stu2"] {
        engine.add_member(student, &school.id, Role::Student).await;
    }

    let mut later = request(&school.id, "stu2");
    later.start_time = t(14, 0);
    later.end_time = t(15, 0);

    let actor = admin_actor("boss");
    let (a, b) = tokio::join!(
        create_session(&engine.state, request(&school.id, "stu1"), &actor, now()),
        create_session(&engine.state, later, &actor, now()),
    );

    a.unwrap();
    b.unwrap();
}
