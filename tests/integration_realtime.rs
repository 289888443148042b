mod common;

use std::sync::{Arc, Mutex};

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tutorlink::modules::{ApprovalInbox, PaymentMonitor};
use tutorlink::modules::payments::monitor::WEBHOOKS_STREAM;
use tutorlink_models::{ParentId, PurchaseApprovalId, TransactionId};
use tutorlink_realtime::{ConnectionState, StreamError};

use common::{MockBackend, approval_json, page, wait_until};

/// Pushes `frames` on connect, then holds the socket open until the client
/// goes away.
fn push_frames(
    frames: Vec<Value>,
) -> impl Fn(WebSocketUpgrade) -> std::future::Ready<Response> + Clone + Send + Sync + 'static {
    move |ws: WebSocketUpgrade| {
        let frames = frames.clone();
        std::future::ready(ws.on_upgrade(move |socket| serve(socket, frames)))
    }
}

async fn serve(mut socket: WebSocket, frames: Vec<Value>) {
    for frame in frames {
        if socket
            .send(Message::Text(frame.to_string().into()))
            .await
            .is_err()
        {
            return;
        }
    }
    while let Some(Ok(_)) = socket.recv().await {}
}

/// Closes every connection straight away, with `code` in the close frame or
/// an empty close frame when `None`.
fn close_immediately(code: Option<u16>) -> Router {
    Router::new().route(
        WEBHOOKS_STREAM,
        get(move |ws: WebSocketUpgrade| {
            let frame = code.map(|code| CloseFrame {
                code,
                reason: Utf8Bytes::from_static(""),
            });
            std::future::ready(ws.on_upgrade(move |mut socket: WebSocket| async move {
                if socket.send(Message::Close(frame)).await.is_ok() {
                    while let Some(Ok(_)) = socket.recv().await {}
                }
            }))
        }),
    )
}

/// Runs a webhooks monitor against a server that closes on connect and
/// returns it with every state it went through.
async fn watch_server_close(
    code: Option<u16>,
) -> (MockBackend, PaymentMonitor, Arc<Mutex<Vec<ConnectionState>>>) {
    let backend = MockBackend::start_with(Router::new(), close_immediately(code)).await;
    let api = backend.api_with_token("admin-token").await;
    let monitor =
        PaymentMonitor::for_path(&backend.realtime_config(), api.tokens(), WEBHOOKS_STREAM)
            .unwrap();

    let states: Arc<Mutex<Vec<ConnectionState>>> = Arc::default();
    {
        let states = Arc::clone(&states);
        monitor
            .stream()
            .on_state_change(move |state: &ConnectionState| {
                states.lock().unwrap().push(state.clone())
            })
            .detach();
    }
    monitor.start();
    (backend, monitor, states)
}

async fn assert_closed_without_reconnect(code: Option<u16>) {
    let (backend, monitor, states) = watch_server_close(code).await;

    wait_until(|| {
        let states = states.lock().unwrap();
        states.contains(&ConnectionState::Open) && states.last() == Some(&ConnectionState::Idle)
    })
    .await;
    // Several base reconnect intervals.
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(backend.requests_to("GET", WEBHOOKS_STREAM).len(), 1);
    assert_eq!(monitor.state(), ConnectionState::Idle);
    assert!(
        !states
            .lock()
            .unwrap()
            .iter()
            .any(|s| matches!(s, ConnectionState::ReconnectScheduled { .. }))
    );
}

#[tokio::test]
async fn test_server_normal_close_does_not_reconnect() {
    assert_closed_without_reconnect(Some(1000)).await;
}

#[tokio::test]
async fn test_server_close_without_status_does_not_reconnect() {
    assert_closed_without_reconnect(None).await;
}

#[tokio::test]
async fn test_server_error_close_reconnects() {
    let (backend, monitor, states) = watch_server_close(Some(1011)).await;

    wait_until(|| backend.requests_to("GET", WEBHOOKS_STREAM).len() >= 2).await;
    assert!(
        states
            .lock()
            .unwrap()
            .iter()
            .any(|s| matches!(s, ConnectionState::ReconnectScheduled { attempt: 1, .. }))
    );

    monitor.stop().await;
    assert_eq!(monitor.state(), ConnectionState::Idle);
}

fn transaction_frame(id: i64, status: &str) -> Value {
    json!({
        "type": "transaction_update",
        "data": {
            "id": id,
            "amount": "25.00",
            "status": status,
            "created_at": common::timestamp(chrono::Utc::now()),
        },
    })
}

#[tokio::test]
async fn test_payment_monitor_applies_pushed_events() {
    let frames = vec![
        json!({"type": "metrics_update", "data": {"total_revenue": "990.00", "transactions_today": 6}}),
        transaction_frame(1, "pending"),
        json!({"type": "weather", "data": {}}),
        transaction_frame(2, "succeeded"),
        transaction_frame(1, "succeeded"),
    ];
    let root = Router::new().route("/ws/admin/payments/", get(push_frames(frames)));
    let backend = MockBackend::start_with(Router::new(), root).await;
    let api = backend.api_with_token("admin-token").await;

    let monitor = PaymentMonitor::new(&backend.realtime_config(), api.tokens()).unwrap();
    assert!(monitor.is_stale());
    monitor.start();

    wait_until(|| {
        let snapshot = monitor.snapshot();
        snapshot.recent_transactions.len() == 2
            && snapshot.recent_transactions[0].id == TransactionId(1)
    })
    .await;

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.metrics.unwrap().total_revenue, "990.00");
    assert_eq!(snapshot.recent_transactions[1].id, TransactionId(2));
    assert!(snapshot.last_event_at.is_some());
    assert!(!monitor.is_stale());

    let upgrade = backend.requests_to("GET", "/ws/admin/payments/");
    assert_eq!(
        upgrade[0].query_param("token").as_deref(),
        Some("admin-token")
    );

    monitor.stop().await;
    assert_eq!(monitor.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn test_approval_inbox_merges_rest_and_stream() {
    let frames = vec![
        json!({"type": "purchase_approval_notification", "data": approval_json(10, "pending", 1)}),
        json!({"type": "metrics_update", "data": {"total_revenue": "1.00"}}),
        json!({"type": "purchase_approval_notification", "data": approval_json(4, "approved", 30)}),
    ];
    let api_routes = Router::new()
        .route(
            "/payments/purchase-approvals/",
            get(|| async { Json(page(vec![approval_json(4, "pending", 30)], 1, None)) }),
        )
        .route(
            "/payments/purchase-approvals/{id}/reject/",
            axum::routing::post(|| async { Json(approval_json(10, "rejected", 1)) }),
        );
    let root = Router::new().route("/ws/parent/7/approvals/", get(push_frames(frames)));
    let backend = MockBackend::start_with(api_routes, root).await;
    let api = backend.api_with_token("parent-token").await;

    let inbox = ApprovalInbox::new(&backend.realtime_config(), api.tokens(), ParentId(7)).unwrap();
    assert_eq!(inbox.load(&api).await.unwrap(), 1);

    inbox.start();
    wait_until(|| {
        let ids: Vec<PurchaseApprovalId> = inbox.pending().iter().map(|p| p.id).collect();
        ids == vec![PurchaseApprovalId(10)]
    })
    .await;

    inbox
        .reject(&api, PurchaseApprovalId(10), Some("Not now".to_string()))
        .await
        .unwrap();
    assert_eq!(inbox.pending_count(), 0);
    assert_eq!(backend.last_request().body["reason"], "Not now");

    inbox.stop().await;
}

#[tokio::test]
async fn test_missing_stream_gives_up_after_configured_attempts() {
    let backend = MockBackend::start(Router::new()).await;
    let api = backend.api_with_token("admin-token").await;
    let config = backend.realtime_config();

    let monitor = PaymentMonitor::for_path(&config, api.tokens(), WEBHOOKS_STREAM).unwrap();
    let errors: Arc<Mutex<Vec<StreamError>>> = Arc::default();
    let _subscription = {
        let errors = Arc::clone(&errors);
        monitor
            .stream()
            .on_error(move |e: &StreamError| errors.lock().unwrap().push(e.clone()))
    };

    monitor.start();
    wait_until(|| errors.lock().unwrap().iter().any(StreamError::is_exhausted)).await;
    assert_eq!(monitor.state(), ConnectionState::Failed);

    let errors = errors.lock().unwrap().clone();
    assert!(errors.last().unwrap().is_exhausted());
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, StreamError::Handshake(_)))
    );
    assert_eq!(
        backend.requests_to("GET", WEBHOOKS_STREAM).len(),
        1 + config.reconnect.max_attempts as usize
    );
    assert!(monitor.is_stale());
}
