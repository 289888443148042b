use thiserror::Error;

/// Errors surfaced to a stream's error listeners.
///
/// None of these are fatal to the owner; the manager records the most recent
/// one and keeps going (or settles in `Idle` / `Failed`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The connection could not be set up at all (bad URL, unsupported
    /// scheme, TLS setup). Not retried.
    #[error("Failed to create connection: {0}")]
    Construction(String),

    /// The transport handshake failed; handled as an abnormal closure.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// An inbound frame was not a JSON object with a string `type`.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Failed to encode outbound frame: {0}")]
    Encode(String),

    #[error("Reconnection abandoned after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },
}

impl StreamError {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::ReconnectExhausted { .. })
    }
}
