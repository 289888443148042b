#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, LastName};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use tutorlink::{ApiClient, TokenStore};
use tutorlink_config::{ApiConfig, RealtimeConfig, ReconnectConfig};

/// A request as the mock backend received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

impl RecordedRequest {
    /// Value of a query parameter, if present.
    pub fn query_param(&self, key: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

type RequestLog = Arc<Mutex<Vec<RecordedRequest>>>;

async fn record(State(log): State<RequestLog>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    log.lock().unwrap().push(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(String::from),
        authorization: parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    });
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// In-process backend on an ephemeral port. REST routes are mounted under
/// `/api`; extra routes (WebSocket endpoints) at the root.
pub struct MockBackend {
    pub base_url: Url,
    pub ws_base_url: Url,
    log: RequestLog,
    task: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start(api_routes: Router) -> Self {
        Self::start_with(api_routes, Router::new()).await
    }

    pub async fn start_with(api_routes: Router, root_routes: Router) -> Self {
        let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .nest("/api", api_routes)
            .merge(root_routes)
            .layer(middleware::from_fn_with_state(log.clone(), record));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/api")).unwrap(),
            ws_base_url: Url::parse(&format!("ws://{addr}")).unwrap(),
            log,
            task,
        }
    }

    /// Client without a stored token.
    pub fn api(&self) -> ApiClient {
        ApiClient::new(
            &ApiConfig::with_base_url(self.base_url.clone()),
            TokenStore::in_memory(),
        )
        .unwrap()
    }

    pub async fn api_with_token(&self, token: &str) -> ApiClient {
        let api = self.api();
        api.tokens().set_token(token).await.unwrap();
        api
    }

    /// Fast-reconnecting stream settings pointing at this backend.
    pub fn realtime_config(&self) -> RealtimeConfig {
        RealtimeConfig {
            ws_base_url: self.ws_base_url.clone(),
            debug: true,
            ping_interval_secs: 30,
            reconnect: ReconnectConfig {
                base_interval_ms: 50,
                multiplier: 2.0,
                max_interval_ms: 200,
                max_attempts: 3,
            },
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request was recorded")
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Polls `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met in time"
        );
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

// Fixtures

pub fn page(results: Vec<Value>, count: u64, next: Option<&str>) -> Value {
    json!({
        "count": count,
        "next": next,
        "previous": null,
        "results": results,
    })
}

pub fn email() -> String {
    SafeEmail().fake()
}

pub fn first_name() -> String {
    FirstName().fake()
}

pub fn last_name() -> String {
    LastName().fake()
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

pub fn user_json(role: &str) -> Value {
    json!({
        "id": 1,
        "email": email(),
        "first_name": first_name(),
        "last_name": last_name(),
        "role": role,
    })
}

pub fn task_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "title": Sentence(2..5).fake::<String>(),
        "description": "",
        "status": status,
        "priority": "medium",
        "due_date": null,
        "created_at": timestamp(Utc::now()),
    })
}

pub fn notification_json(id: i64, is_read: bool) -> Value {
    json!({
        "id": id,
        "title": format!("Notification {id}"),
        "message": Sentence(3..8).fake::<String>(),
        "notification_type": "class_reminder",
        "is_read": is_read,
        "created_at": timestamp(Utc::now() - Duration::minutes(id)),
    })
}

pub fn student_json(id: i64) -> Value {
    json!({
        "id": id,
        "first_name": first_name(),
        "last_name": last_name(),
        "email": email(),
        "grade_level": "10",
        "teacher_ids": [],
        "created_at": timestamp(Utc::now()),
    })
}

pub fn teacher_json(id: i64, subjects: &[&str]) -> Value {
    json!({
        "id": id,
        "first_name": first_name(),
        "last_name": last_name(),
        "email": email(),
        "subjects": subjects,
        "hourly_rate": "40.00",
        "availability": [],
        "created_at": timestamp(Utc::now()),
    })
}

pub fn invitation_json(token: &str, status: &str, expires_at: DateTime<Utc>) -> Value {
    json!({
        "id": 5,
        "token": token,
        "email": email(),
        "first_name": "Grace",
        "last_name": "Hopper",
        "invited_by_name": "Admin",
        "message": "Welcome aboard",
        "status": status,
        "expires_at": timestamp(expires_at),
        "created_at": timestamp(Utc::now() - Duration::days(1)),
    })
}

pub fn class_json(id: i64, start: DateTime<Utc>, status: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Class {id}"),
        "teacher_id": 2,
        "teacher_name": "Ada Lovelace",
        "student_ids": [3],
        "start_time": timestamp(start),
        "end_time": timestamp(start + Duration::hours(1)),
        "status": status,
    })
}

pub fn receipt_json(id: i64) -> Value {
    json!({
        "id": id,
        "receipt_number": format!("R-{id:04}"),
        "transaction_id": 900 + id,
        "total": "80.00",
        "currency": "USD",
        "line_items": [{"description": "Lesson", "quantity": 2, "amount": "40.00"}],
        "issued_at": timestamp(Utc::now()),
    })
}

pub fn approval_json(id: i64, status: &str, minutes_ago: i64) -> Value {
    json!({
        "id": id,
        "student_id": 3,
        "student_name": "Sam Lee",
        "parent_id": 7,
        "item_description": "Chemistry workbook",
        "amount": "19.99",
        "status": status,
        "requested_at": timestamp(Utc::now() - Duration::minutes(minutes_ago)),
    })
}

pub fn summary_json(period: &str) -> Value {
    json!({
        "period": period,
        "total_students": 120,
        "active_teachers": 14,
        "classes_completed": 310,
        "classes_upcoming": 22,
        "revenue": 15250.5,
        "attendance_rate": 93.5,
    })
}
