//! Transport seam between the stream manager and the network.
//!
//! The manager only ever talks to a [`Connector`] and the [`Transport`] it
//! returns. [`WebSocketConnector`] is the production implementation on top of
//! `tokio-tungstenite`; tests substitute scripted connectors.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use super::error::StreamError;

/// Normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Endpoint going away (server shutdown, page navigation).
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// The peer sent a close frame without a status code.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// No close frame was received; the connection dropped.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Whether a close code ends the session without reconnecting. Any close
/// frame from the peer without an error status counts.
pub fn is_normal_closure(code: u16) -> bool {
    matches!(code, CLOSE_NORMAL | CLOSE_GOING_AWAY | CLOSE_NO_STATUS)
}

/// Something that happened on an open transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Text(String),
    /// A non-fatal transport error. The session stays open until `Closed`.
    Error(String),
    Closed { code: u16 },
}

/// Why a connection attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The request could not be built. Not retried.
    Construction(String),
    /// The peer could not be reached or refused the upgrade.
    Handshake(String),
}

impl From<ConnectError> for StreamError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Construction(msg) => StreamError::Construction(msg),
            ConnectError::Handshake(msg) => StreamError::Handshake(msg),
        }
    }
}

/// An open, bidirectional text-frame connection.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, text: String) -> Result<(), StreamError>;

    /// Waits for the next event. Must be cancel-safe.
    async fn recv(&mut self) -> TransportEvent;

    async fn close(&mut self, code: u16);
}

/// Opens transports.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>, ConnectError>;
}

/// WebSocket connector over `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>, ConnectError> {
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConnectError::Construction(format!(
                "unsupported scheme `{}`",
                url.scheme()
            )));
        }

        let (ws, response) = connect_async(url.as_str()).await.map_err(|e| match e {
            WsError::Url(err) => ConnectError::Construction(err.to_string()),
            WsError::HttpFormat(err) => ConnectError::Construction(err.to_string()),
            other => ConnectError::Handshake(other.to_string()),
        })?;
        debug!(status = %response.status(), "WebSocket handshake complete");

        Ok(Box::new(WebSocketTransport { ws, failed: false }))
    }
}

struct WebSocketTransport {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Set after an I/O error; the next `recv` reports an abnormal close.
    failed: bool,
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, text: String) -> Result<(), StreamError> {
        self.ws
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> TransportEvent {
        if self.failed {
            return TransportEvent::Closed {
                code: CLOSE_ABNORMAL,
            };
        }
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return TransportEvent::Text(text.as_str().to_owned()),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return TransportEvent::Text(text),
                    Err(_) => return TransportEvent::Error("binary frame is not UTF-8".into()),
                },
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.map(|f| u16::from(f.code)).unwrap_or(CLOSE_NO_STATUS);
                    return TransportEvent::Closed { code };
                }
                // Control frames are answered by tungstenite itself.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    return TransportEvent::Closed {
                        code: CLOSE_ABNORMAL,
                    };
                }
                Some(Err(WsError::Io(err))) => {
                    self.failed = true;
                    return TransportEvent::Error(err.to_string());
                }
                Some(Err(other)) => return TransportEvent::Error(other.to_string()),
            }
        }
    }

    async fn close(&mut self, code: u16) {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: String::new().into(),
        };
        if let Err(e) = self.ws.close(Some(frame)).await {
            debug!(error = %e, "Error while closing WebSocket");
        }
    }
}
