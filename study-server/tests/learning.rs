//! Lesson, quiz, grading and tutor endpoints

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};
use study_core::testing::ScriptedProvider;
use study_server::http::{TutorResponse, VersionedQuiz};

#[tokio::test]
async fn lesson_is_generated_then_cached() {
    let app = common::spawn_app();
    let id = common::seed_curriculum(&app);

    let first: Value = app
        .server
        .post("/api/lesson")
        .json(&common::topic(&id, 0, 0))
        .await
        .json();
    let second: Value = app
        .server
        .post("/api/lesson")
        .json(&common::topic(&id, 0, 0))
        .await
        .json();

    assert_eq!(first["topic_name"], "Binary Search");
    assert_eq!(first["estimated_time_minutes"], 12);
    assert_eq!(first, second);
    assert_eq!(app.provider.call_count(), 1);
}

#[tokio::test]
async fn lesson_for_missing_topic_is_not_found() {
    let app = common::spawn_app();
    let id = common::seed_curriculum(&app);

    app.server
        .post("/api/lesson")
        .json(&common::topic(&id, 3, 0))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .post("/api/lesson")
        .json(&common::topic("deadbeef", 0, 0))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(app.provider.call_count(), 0);
}

#[tokio::test]
async fn generation_failure_is_a_server_error() {
    let app = common::spawn_app_with(ScriptedProvider::new(["I would rather not."]));
    let id = common::seed_curriculum(&app);

    let response = app
        .server
        .post("/api/lesson")
        .json(&common::topic(&id, 0, 0))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn quiz_versions_are_created_and_fetchable() {
    let app = common::spawn_app();
    let id = common::seed_curriculum(&app);

    let first: VersionedQuiz = app
        .server
        .post("/api/quiz")
        .json(&common::topic(&id, 0, 0))
        .await
        .json();
    assert_eq!(first.version, 0);
    assert_eq!(first.quiz.passing_score, 80);

    let cached: VersionedQuiz = app
        .server
        .post("/api/quiz")
        .json(&common::topic(&id, 0, 0))
        .await
        .json();
    assert_eq!(cached.version, 0);

    let fresh: VersionedQuiz = app
        .server
        .post("/api/quiz/new")
        .json(&common::topic(&id, 0, 0))
        .await
        .json();
    assert_eq!(fresh.version, 1);
    assert_eq!(app.provider.call_count(), 2);

    let by_version: Value = app
        .server
        .get(&format!("/api/quiz/{}/0/0/1", id))
        .await
        .json();
    assert_eq!(by_version["version"], 1);
    assert_eq!(by_version["questions"].as_array().unwrap().len(), 2);

    app.server
        .get(&format!("/api/quiz/{}/0/0/7", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submit_without_quiz_is_not_found() {
    let app = common::spawn_app();
    let id = common::seed_curriculum(&app);

    let mut body = common::topic(&id, 0, 0);
    body["answers"] = json!([1, 0]);
    app.server
        .post("/api/quiz/submit")
        .json(&body)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn passing_submission_updates_progress_and_history() {
    let app = common::spawn_app();
    let id = common::seed_curriculum(&app);
    app.server
        .post("/api/quiz")
        .json(&common::topic(&id, 0, 0))
        .await
        .assert_status_ok();

    let mut body = common::topic(&id, 0, 0);
    body["answers"] = json!([1, 0]);
    body["use_ai_grading"] = json!(false);
    let assessment: Value = app.server.post("/api/quiz/submit").json(&body).await.json();

    assert_eq!(assessment["score"], 100);
    assert_eq!(assessment["passed"], true);
    assert_eq!(assessment["fallback_mode"], true);
    assert_eq!(assessment["quiz_version"], 0);

    let progress: Value = app
        .server
        .get(&format!("/api/curriculums/{}/progress", id))
        .await
        .json();
    assert_eq!(progress["topics"]["0-0"]["completed"], true);
    assert_eq!(progress["topics"]["0-0"]["quiz_score"], 100);

    let assessments: Value = app
        .server
        .get(&format!("/api/assessments/{}/0/0", id))
        .await
        .json();
    assert_eq!(assessments["assessments"].as_array().unwrap().len(), 1);

    for path in ["quiz/history", "history/quiz"] {
        let history: Value = app
            .server
            .get(&format!("/api/{}/{}/0/0", path, id))
            .await
            .json();
        assert_eq!(history["total_quizzes"], 1);
        assert_eq!(history["history"][0]["version"], 0);
        assert_eq!(
            history["history"][0]["assessments"][0]["score"],
            json!(100)
        );
    }
}

#[tokio::test]
async fn ai_grading_failure_still_grades() {
    let app = common::spawn_app();
    let id = common::seed_curriculum(&app);
    app.server
        .post("/api/quiz")
        .json(&common::topic(&id, 0, 0))
        .await
        .assert_status_ok();

    // use_ai_grading defaults to true; the scripted model rejects the
    // assessment prompt.
    let mut body = common::topic(&id, 0, 0);
    body["answers"] = json!([0]);
    let assessment: Value = app.server.post("/api/quiz/submit").json(&body).await.json();

    assert_eq!(assessment["score"], 0);
    assert_eq!(assessment["passed"], false);
    assert_eq!(assessment["fallback_mode"], true);
    assert_eq!(
        assessment["question_feedback"][1]["student_choice"],
        "No answer"
    );
}

#[tokio::test]
async fn tutor_chat_is_recorded() {
    let app = common::spawn_app();
    let id = common::seed_curriculum(&app);

    let mut body = common::topic(&id, 0, 0);
    body["message"] = json!("Why must the input be sorted?");
    body["highlighted_context"] = json!("sorted input");
    let reply: TutorResponse = app.server.post("/api/tutor").json(&body).await.json();

    assert_eq!(reply.response, "Think of it as repeatedly halving a phone book.");
    assert_eq!(reply.history.len(), 2);

    let chat: Value = app
        .server
        .get(&format!("/api/chat/{}/0/0", id))
        .await
        .json();
    assert_eq!(chat["messages"][0]["role"], "user");
    assert_eq!(chat["messages"][1]["role"], "assistant");
}

#[tokio::test]
async fn tutor_unknown_curriculum_is_not_found() {
    let app = common::spawn_app();

    let mut body = common::topic("deadbeef", 0, 0);
    body["message"] = json!("Hello?");
    app.server
        .post("/api/tutor")
        .json(&body)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_chat_history_is_empty_list() {
    let app = common::spawn_app();
    let id = common::seed_curriculum(&app);

    let chat: Value = app
        .server
        .get(&format!("/api/chat/{}/1/0", id))
        .await
        .json();
    assert_eq!(chat["messages"], json!([]));
}
