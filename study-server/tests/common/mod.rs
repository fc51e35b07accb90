//! Shared setup for HTTP integration tests
//!
//! Note: Some helpers may appear unused because each test file compiles this
//! module separately.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{Value, json};
use study_core::testing::ScriptedProvider;
use study_core::{Curriculum, ModelClient, prompts};
use study_models::ChatRequest;
use study_server::{AppState, create_router};
use tempfile::TempDir;

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub provider: Arc<ScriptedProvider>,
    _dir: TempDir,
}

pub fn curriculum_json() -> Value {
    json!({
        "subject": "Algorithms",
        "description": "Classic algorithms",
        "clusters": [
            {
                "name": "Foundations",
                "description": "Start here",
                "order": 1,
                "topics": [
                    {"name": "Binary Search", "description": "Halving", "order": 1, "prerequisites": []},
                    {"name": "Sorting", "description": "Ordering", "order": 2, "prerequisites": ["Binary Search"]}
                ]
            }
        ]
    })
}

/// Answers every prompt the engine sends with a well-formed reply.
pub fn reply_for(request: &ChatRequest) -> Result<String, String> {
    let first = request
        .messages
        .first()
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    if request.system.as_deref() == Some(prompts::CURRICULUM_SYSTEM_PROMPT) {
        return Ok(curriculum_json().to_string());
    }
    if request.system.is_some() {
        return Ok("Think of it as repeatedly halving a phone book.".to_string());
    }
    if first.starts_with("Create a complete lesson") {
        return Ok(json!({
            "topic_name": "Binary Search",
            "introduction": "Searching is slow without structure.",
            "sections": [{"title": "Halving", "content": "Split the range.", "key_points": ["Sorted input"]}],
            "summary": "Use it on sorted data.",
            "estimated_time_minutes": 12
        })
        .to_string());
    }
    if first.starts_with("Create a quiz") {
        return Ok(json!({
            "topic_name": "Binary Search",
            "questions": [
                {"question": "Cost?", "options": ["O(n)", "O(log n)", "O(1)", "O(n^2)"], "correct_index": 1, "explanation": "Halving."},
                {"question": "Input?", "options": ["Sorted", "Any", "Hashed", "Empty"], "correct_index": 0, "explanation": "Order matters."}
            ]
        })
        .to_string());
    }
    Err(format!("unexpected prompt: {}", first))
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(ScriptedProvider::from_fn(reply_for))
}

pub fn spawn_app_with(provider: ScriptedProvider) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(provider);
    let model = ModelClient::new(provider.clone(), "test-model");
    let state = Arc::new(AppState::new(dir.path(), model));
    let server = TestServer::new(create_router(state.clone())).unwrap();

    TestApp {
        server,
        state,
        provider,
        _dir: dir,
    }
}

/// Store the test curriculum directly and return its id.
pub fn seed_curriculum(app: &TestApp) -> String {
    let curriculum: Curriculum = serde_json::from_value(curriculum_json()).unwrap();
    app.state.curricula.save(curriculum).unwrap()
}

pub fn topic(id: &str, cluster: usize, topic: usize) -> Value {
    json!({"curriculum_id": id, "cluster_index": cluster, "topic_index": topic})
}

/// JSON payloads of every `data:` line in an SSE body.
pub fn sse_events(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}
