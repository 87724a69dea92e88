use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use canny_recommender::{
    agent::{
        model::{ChatModel, ContentBlock, Message, ModelRequest, StreamEvent, ToolCall},
        prompt::SYSTEM_PROMPT,
        AgentConfig,
    },
    db::MaterialsStore,
    error::{AppError, AppResult},
    models::{ItemStatus, ItemType, LearningItem},
    routes::{create_router, AppState},
    services::SearchProvider,
};

/// Model double that replays scripted turns and records each request
#[derive(Default)]
struct ScriptedModel {
    turns: Mutex<VecDeque<Vec<StreamEvent>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    fn new(turns: Vec<Vec<StreamEvent>>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::default(),
        })
    }

    fn answering(text: &str) -> Arc<Self> {
        Self::new(vec![vec![StreamEvent::TextDelta(text.to_string())]])
    }
}

#[async_trait::async_trait]
impl ChatModel for ScriptedModel {
    async fn stream(
        &self,
        request: &ModelRequest<'_>,
    ) -> AppResult<mpsc::Receiver<AppResult<StreamEvent>>> {
        self.requests.lock().unwrap().push(request.messages.to_vec());
        let events = self.turns.lock().unwrap().pop_front().unwrap_or_default();

        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            tx.try_send(Ok(event)).unwrap();
        }
        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Model double whose API call fails outright
struct UnavailableModel;

#[async_trait::async_trait]
impl ChatModel for UnavailableModel {
    async fn stream(
        &self,
        _request: &ModelRequest<'_>,
    ) -> AppResult<mpsc::Receiver<AppResult<StreamEvent>>> {
        Err(AppError::ExternalApi(
            "Model API returned status 529 Overloaded".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

struct FakeStore {
    items: Option<Vec<LearningItem>>,
    queried: Mutex<Vec<i64>>,
}

impl FakeStore {
    fn with_items(items: Vec<LearningItem>) -> Arc<Self> {
        Arc::new(Self {
            items: Some(items),
            queried: Mutex::default(),
        })
    }

    fn broken() -> Arc<Self> {
        Arc::new(Self {
            items: None,
            queried: Mutex::default(),
        })
    }
}

#[async_trait::async_trait]
impl MaterialsStore for FakeStore {
    async fn public_items(&self, user_id: i64) -> AppResult<Vec<LearningItem>> {
        self.queried.lock().unwrap().push(user_id);
        self.items
            .clone()
            .ok_or(AppError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn count_users(&self) -> AppResult<i64> {
        match self.items {
            Some(_) => Ok(3),
            None => Err(AppError::Database(sqlx::Error::PoolTimedOut)),
        }
    }
}

struct FakeSearch;

#[async_trait::async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str) -> AppResult<String> {
        Ok(format!("Digital Minimalism\nhttps://example.com\nresult for {}", query))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn deep_work() -> LearningItem {
    LearningItem {
        title: "Deep Work".to_string(),
        author: Some("Cal Newport".to_string()),
        item_type: ItemType::Book,
        status: ItemStatus::CurrentlyLearning,
    }
}

fn create_test_server(model: Arc<dyn ChatModel>, store: Arc<FakeStore>) -> TestServer {
    let state = AppState::new(
        model,
        store,
        Arc::new(FakeSearch),
        AgentConfig {
            system_prompt: SYSTEM_PROMPT.to_string(),
            max_turns: 5,
        },
    );
    let app = create_router(Arc::new(state));
    TestServer::new(app).unwrap()
}

fn tool_use(id: &str, name: &str, input: Value) -> StreamEvent {
    StreamEvent::ToolUse(ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        input,
    })
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(ScriptedModel::answering("[]"), FakeStore::with_items(vec![]));

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_database_health() {
    let server = create_test_server(ScriptedModel::answering("[]"), FakeStore::with_items(vec![]));
    let response = server.get("/health/db").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["user_count"], 3);

    let server = create_test_server(ScriptedModel::answering("[]"), FakeStore::broken());
    let response = server.get("/health/db").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .starts_with("Database error"));
}

#[tokio::test]
async fn test_full_tool_flow_returns_parsed_recommendations() {
    let answer = r#"[{"title":"Digital Minimalism","author":"Cal Newport","type":"book","reason":"Same author and focus theme"}]"#;
    let model = ScriptedModel::new(vec![
        vec![tool_use(
            "toolu_1",
            "get_user_learning_materials",
            json!({ "user_id": 42 }),
        )],
        vec![
            tool_use(
                "toolu_2",
                "search_similar_content",
                json!({ "query": "books like Deep Work" }),
            ),
            tool_use(
                "toolu_3",
                "search_similar_content",
                json!({ "query": "focus productivity courses" }),
            ),
        ],
        vec![StreamEvent::TextDelta(answer.to_string())],
    ]);
    let store = FakeStore::with_items(vec![deep_work()]);
    let server = create_test_server(model.clone(), store.clone());

    let response = server.get("/api/recommendations/users/42").await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "recommendations": serde_json::from_str::<Value>(answer).unwrap() })
    );
    assert_eq!(*store.queried.lock().unwrap(), vec![42]);

    let requests = model.requests.lock().unwrap();
    assert_eq!(requests.len(), 3);

    let materials_result = &requests[1].last().unwrap().content[0];
    assert_eq!(
        materials_result,
        &ContentBlock::ToolResult {
            tool_use_id: "toolu_1".to_string(),
            content: "- Deep Work by Cal Newport (book, currently learning)".to_string(),
        }
    );

    let search_results = &requests[2].last().unwrap().content;
    assert_eq!(search_results.len(), 2);
}

#[tokio::test]
async fn test_deep_work_answer_is_returned_verbatim() {
    let answer = r#"[{"title":"Deep Work","author":"Cal Newport","type":"book","reason":"matches productivity theme"}]"#;
    let server = create_test_server(
        ScriptedModel::answering(answer),
        FakeStore::with_items(vec![]),
    );

    let response = server.get("/api/recommendations/users/7").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["recommendations"][0]["title"], "Deep Work");
    assert_eq!(body["recommendations"][0]["author"], "Cal Newport");
    assert!(body.get("raw").is_none());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_unknown_author_answer_is_returned_unchanged() {
    let answer = r#"[{"title":"The Missing Semester","author":null,"type":"course","reason":"tooling","url":"https://missing.csail.mit.edu"}]"#;
    let server = create_test_server(
        ScriptedModel::answering(answer),
        FakeStore::with_items(vec![]),
    );

    let response = server.get("/api/recommendations/users/7").await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "recommendations": serde_json::from_str::<Value>(answer).unwrap() })
    );
}

#[tokio::test]
async fn test_prose_answer_is_degraded_success() {
    let server = create_test_server(
        ScriptedModel::answering("I recommend Deep Work by Cal Newport."),
        FakeStore::with_items(vec![]),
    );

    let response = server.get("/api/recommendations/users/7").await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "recommendations": [], "raw": "I recommend Deep Work by Cal Newport." })
    );
}

#[tokio::test]
async fn test_no_answer_is_server_error() {
    let server = create_test_server(
        ScriptedModel::new(vec![vec![]]),
        FakeStore::with_items(vec![]),
    );

    let response = server.get("/api/recommendations/users/7").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({ "recommendations": [], "error": "No recommendations found." })
    );
}

#[tokio::test]
async fn test_model_failure_is_server_error() {
    let server = create_test_server(Arc::new(UnavailableModel), FakeStore::with_items(vec![]));

    let response = server.get("/api/recommendations/users/7").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["recommendations"], json!([]));
    assert!(body["error"].as_str().unwrap().contains("529"));
}

#[tokio::test]
async fn test_storage_failure_is_visible_to_agent() {
    let model = ScriptedModel::new(vec![
        vec![tool_use(
            "toolu_1",
            "get_user_learning_materials",
            json!({ "user_id": 42 }),
        )],
        vec![StreamEvent::TextDelta("[]".to_string())],
    ]);
    let server = create_test_server(model.clone(), FakeStore::broken());

    let response = server.get("/api/recommendations/users/42").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "recommendations": [] }));

    let requests = model.requests.lock().unwrap();
    match &requests[1].last().unwrap().content[0] {
        ContentBlock::ToolResult { content, .. } => {
            assert!(content.starts_with("Error fetching materials for user 42"));
        }
        other => panic!("expected tool result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server(ScriptedModel::answering("[]"), FakeStore::with_items(vec![]));

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("frontend-abc"),
        )
        .await;

    assert_eq!(response.header("x-request-id"), "frontend-abc");
}

#[tokio::test]
async fn test_list_learning_items() {
    let server = create_test_server(
        ScriptedModel::answering("[]"),
        FakeStore::with_items(vec![deep_work()]),
    );

    let response = server.get("/api/users/42/learning-items").await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!([{
            "title": "Deep Work",
            "author": "Cal Newport",
            "type": "book",
            "status": "currently_learning"
        }])
    );
}

#[tokio::test]
async fn test_non_integer_user_id_rejected() {
    let server = create_test_server(ScriptedModel::answering("[]"), FakeStore::with_items(vec![]));

    let response = server.get("/api/recommendations/users/abc").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
