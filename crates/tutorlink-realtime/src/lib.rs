//! # TutorLink Realtime
//!
//! Background connectivity for the TutorLink client.
//!
//! - [`stream`]: Reconnecting event-stream manager with listener registries
//! - [`poller`]: Interval polling with failure backoff
//! - [`backoff`]: Exponential backoff shared by both
//! - [`listeners`]: Listener sets with drop-to-unregister subscriptions
//!
//! Both background managers own exactly one Tokio task, release it on drop,
//! and degrade to a reported error (never a panic) when the backend is
//! unreachable.

pub mod backoff;
pub mod listeners;
pub mod poller;
pub mod stream;

pub use backoff::Backoff;
pub use listeners::{ListenerSet, Subscription};
pub use poller::{PollError, Poller};
pub use stream::{
    ConnectError, ConnectionState, Connector, StreamError, StreamManager, StreamMessage,
    StreamOptions, Transport, TransportEvent, WebSocketConnector,
};
