//! End-to-end tests for the homework bot poll loop.
//!
//! Both external services run as local axum servers: one stands in for the
//! homework status endpoint, the other for the Telegram Bot API. The real
//! HTTP clients talk to them exactly as they would in production.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use homework_bot_orchestrator::{
    Config, CycleOutcome, Notifier, NotifyOutcome, PracticumClient, Poller, TelegramBot,
    FAILURE_PREFIX,
};
use serde_json::{json, Value};

// ============================================================================
// Stand-in servers
// ============================================================================

/// A request seen by the status server.
#[derive(Debug, Clone)]
struct StatusRequest {
    authorization: Option<String>,
    from_date: Option<String>,
}

/// Scripted homework status endpoint.
#[derive(Default)]
struct StatusServer {
    replies: Mutex<VecDeque<(StatusCode, String)>>,
    requests: Mutex<Vec<StatusRequest>>,
}

impl StatusServer {
    fn reply_json(&self, status: StatusCode, body: &Value) {
        self.reply_raw(status, body.to_string());
    }

    fn reply_raw(&self, status: StatusCode, body: impl Into<String>) {
        self.replies
            .lock()
            .expect("status server lock")
            .push_back((status, body.into()));
    }

    fn requests(&self) -> Vec<StatusRequest> {
        self.requests.lock().expect("status server lock").clone()
    }
}

async fn homework_statuses(
    State(server): State<Arc<StatusServer>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    server
        .requests
        .lock()
        .expect("status server lock")
        .push(StatusRequest {
            authorization: headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            from_date: query.get("from_date").cloned(),
        });

    server
        .replies
        .lock()
        .expect("status server lock")
        .pop_front()
        .unwrap_or_else(|| {
            (
                StatusCode::OK,
                json!({"homeworks": [], "current_date": 0}).to_string(),
            )
        })
}

/// A message delivered to the stand-in Telegram API.
#[derive(Debug, Clone)]
struct DeliveredMessage {
    bot_path: String,
    chat_id: String,
    text: String,
}

/// Recording Telegram Bot API.
#[derive(Default)]
struct TelegramServer {
    reject_with: Mutex<Option<String>>,
    messages: Mutex<Vec<DeliveredMessage>>,
}

impl TelegramServer {
    fn reject(&self, description: &str) {
        *self.reject_with.lock().expect("telegram lock") = Some(description.to_string());
    }

    fn accept(&self) {
        *self.reject_with.lock().expect("telegram lock") = None;
    }

    fn messages(&self) -> Vec<DeliveredMessage> {
        self.messages.lock().expect("telegram lock").clone()
    }

    fn texts(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.text).collect()
    }
}

async fn send_message(
    State(server): State<Arc<TelegramServer>>,
    Path(bot_path): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(description) = server.reject_with.lock().expect("telegram lock").clone() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error_code": 400, "description": description})),
        );
    }

    server
        .messages
        .lock()
        .expect("telegram lock")
        .push(DeliveredMessage {
            bot_path,
            chat_id: body["chat_id"].as_str().unwrap_or_default().to_string(),
            text: body["text"].as_str().unwrap_or_default().to_string(),
        });

    (
        StatusCode::OK,
        Json(json!({"ok": true, "result": {"message_id": 1}})),
    )
}

/// Serves `router` on an ephemeral local port.
async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    addr
}

/// Everything a test needs: both servers and a poller wired to them.
struct Harness {
    status: Arc<StatusServer>,
    telegram: Arc<TelegramServer>,
    poller: Poller<PracticumClient, TelegramBot>,
}

async fn harness() -> Harness {
    let status = Arc::new(StatusServer::default());
    let telegram = Arc::new(TelegramServer::default());

    let status_addr = spawn_server(
        Router::new()
            .route("/api/user_api/homework_statuses/", get(homework_statuses))
            .with_state(Arc::clone(&status)),
    )
    .await;
    let telegram_addr = spawn_server(
        Router::new()
            .route("/:bot_path/sendMessage", post(send_message))
            .with_state(Arc::clone(&telegram)),
    )
    .await;

    let env: HashMap<&str, String> = HashMap::from([
        ("PRACTICUM_TOKEN", "practicum-token".to_string()),
        ("TELEGRAM_TOKEN", "123:telegram-token".to_string()),
        ("TELEGRAM_CHAT_ID", "4242".to_string()),
        (
            "PRACTICUM_ENDPOINT",
            format!("http://{status_addr}/api/user_api/homework_statuses/"),
        ),
        ("TELEGRAM_API_URL", format!("http://{telegram_addr}")),
    ]);
    let config = Config::from_lookup(|name| env.get(name).cloned()).expect("valid config");

    let api = PracticumClient::new(
        &config.endpoint,
        &config.practicum_token,
        config.request_timeout(),
    )
    .expect("status client");
    let bot = TelegramBot::new(&config.telegram_api_url, &config.telegram_token)
        .expect("telegram client");
    let poller = Poller::new(
        api,
        Notifier::new(bot, &config.telegram_chat_id),
        config.retry_period(),
    );

    Harness {
        status,
        telegram,
        poller,
    }
}

const APPROVED_HW1: &str =
    "Changed review status for \"hw1\". Работа проверена: ревьюеру всё понравилось. Ура!";

// ============================================================================
// Status change tests
// ============================================================================

#[tokio::test]
async fn test_status_change_reaches_chat() {
    let mut h = harness().await;
    h.status.reply_json(
        StatusCode::OK,
        &json!({
            "homeworks": [{"homework_name": "hw1", "status": "approved"}],
            "current_date": 2000
        }),
    );

    let outcome = h.poller.run_cycle().await;

    assert_eq!(
        outcome,
        CycleOutcome::Notified {
            text: APPROVED_HW1.to_string(),
            outcome: NotifyOutcome::Sent,
        }
    );
    let messages = h.telegram.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].chat_id, "4242");
    assert_eq!(messages[0].bot_path, "bot123:telegram-token");
    assert_eq!(messages[0].text, APPROVED_HW1);
    assert_eq!(h.poller.state().cursor, 2000);
}

#[tokio::test]
async fn test_request_carries_token_and_cursor() {
    let mut h = harness().await;
    h.status.reply_json(
        StatusCode::OK,
        &json!({
            "homeworks": [{"homework_name": "hw1", "status": "reviewing"}],
            "current_date": 1700
        }),
    );

    h.poller.run_cycle().await;
    h.poller.run_cycle().await;

    let requests = h.status.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("OAuth practicum-token")
    );
    assert_eq!(requests[0].from_date.as_deref(), Some("0"));
    assert_eq!(requests[1].from_date.as_deref(), Some("1700"));
}

#[tokio::test]
async fn test_empty_homeworks_sends_nothing() {
    let mut h = harness().await;
    h.status.reply_json(
        StatusCode::OK,
        &json!({"homeworks": [], "current_date": 1000}),
    );

    let outcome = h.poller.run_cycle().await;

    assert_eq!(outcome, CycleOutcome::NoUpdate);
    assert!(h.telegram.messages().is_empty());
    assert_eq!(h.poller.state().cursor, 0);
}

// ============================================================================
// Failure reporting tests
// ============================================================================

#[tokio::test]
async fn test_unknown_status_reports_failure() {
    let mut h = harness().await;
    h.status.reply_json(
        StatusCode::OK,
        &json!({
            "homeworks": [{"homework_name": "hw2", "status": "pending"}],
            "current_date": 3000
        }),
    );

    let outcome = h.poller.run_cycle().await;

    assert!(matches!(outcome, CycleOutcome::Failed { outcome: NotifyOutcome::Sent, .. }));
    let texts = h.telegram.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with(FAILURE_PREFIX));
    assert!(texts[0].contains("pending"));
    assert_eq!(h.poller.state().cursor, 0);
}

#[tokio::test]
async fn test_service_unavailable_is_announced_once() {
    let mut h = harness().await;
    h.status
        .reply_raw(StatusCode::SERVICE_UNAVAILABLE, "maintenance");
    h.status
        .reply_raw(StatusCode::SERVICE_UNAVAILABLE, "maintenance");

    h.poller.run_cycle().await;
    let second = h.poller.run_cycle().await;

    assert!(matches!(
        second,
        CycleOutcome::Failed { outcome: NotifyOutcome::Suppressed, .. }
    ));
    let texts = h.telegram.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with(FAILURE_PREFIX));
    assert!(texts[0].contains("503"));
}

#[tokio::test]
async fn test_non_json_body_is_fetch_failure() {
    let mut h = harness().await;
    h.status.reply_raw(StatusCode::OK, "<html>oops</html>");

    let outcome = h.poller.run_cycle().await;

    let CycleOutcome::Failed { text, .. } = outcome else {
        unreachable!("expected a failed cycle, got {outcome:?}");
    };
    assert!(text.contains("not JSON"));
}

#[tokio::test]
async fn test_recovery_after_error_is_announced() {
    let mut h = harness().await;
    h.status
        .reply_raw(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    h.status.reply_json(
        StatusCode::OK,
        &json!({
            "homeworks": [{"homework_name": "hw1", "status": "approved"}],
            "current_date": 2000
        }),
    );

    h.poller.run_cycle().await;
    h.poller.run_cycle().await;

    let texts = h.telegram.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("500"));
    assert_eq!(texts[1], APPROVED_HW1);
}

// ============================================================================
// Messaging failure tests
// ============================================================================

#[tokio::test]
async fn test_rejected_message_is_retried_next_cycle() {
    let mut h = harness().await;
    let approved = json!({
        "homeworks": [{"homework_name": "hw1", "status": "approved"}],
        "current_date": 2000
    });
    h.status.reply_json(StatusCode::OK, &approved);
    h.status.reply_json(StatusCode::OK, &approved);
    h.telegram.reject("Bad Request: chat not found");

    let first = h.poller.run_cycle().await;
    assert!(matches!(
        first,
        CycleOutcome::Notified { outcome: NotifyOutcome::Failed, .. }
    ));
    assert_eq!(h.poller.state().cursor, 0);

    h.telegram.accept();
    let second = h.poller.run_cycle().await;
    assert!(matches!(
        second,
        CycleOutcome::Notified { outcome: NotifyOutcome::Sent, .. }
    ));
    assert_eq!(h.telegram.texts(), vec![APPROVED_HW1]);
    assert_eq!(h.poller.state().cursor, 2000);
    assert_eq!(h.status.requests()[1].from_date.as_deref(), Some("0"));
}
