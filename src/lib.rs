//! ChatHub stream - streaming client for framed conversation sessions.
//!
//! This library opens a WebSocket to a conversational backend, negotiates
//! the record protocol, sends one turn request and republishes the
//! backend's records as an ordered, cancellable stream of events.
//!
//! # Architecture
//!
//! One background task per [`Session::ask_stream`] call:
//!
//! - **Connector**: dials the endpoint with headers, cookies and an optional
//!   access token, through an optional proxy
//! - **Connection**: appends the 0x1E delimiter to writes, splits reads,
//!   enforces write and read timeouts
//! - **Dispatcher**: handshake, turn request, then the read loop that
//!   classifies records and forwards them
//! - **EventStream**: ordered events, closed exactly once
//!
//! # Quick Start
//!
//! ```no_run
//! use chathub_stream::{Conversation, Result, Session};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::builder()
//!         .cookie("_U", "cookie-value")
//!         .conversation_style("Balanced")
//!         .build()?;
//!
//!     let conversation = Conversation::new("conversation-id", "client-id")
//!         .with_access_token("token");
//!
//!     let records = session
//!         .ask_stream(CancellationToken::new(), conversation, "Hello", "", "")
//!         .collect_records()
//!         .await?;
//!     println!("received {} records", records.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | [`Session`], builder, configuration, dispatcher, events |
//! | [`protocol`] | Record framing, classification, turn request |
//! | [`transport`] | Framed connection and connector |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Message and trace identifiers |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for turn requests.
pub mod identifiers;

/// Wire protocol records.
///
/// Delimiter framing, inbound classification and the turn request.
pub mod protocol;

/// Streaming session.
///
/// Use [`Session::builder()`] to create a configured session.
pub mod session;

/// WebSocket transport layer.
///
/// Framed connection, the `Transport` seam and outbound dialing.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Session types
pub use session::{
    Conversation, EventStream, KeepAlive, Session, SessionBuilder, SessionConfig, StreamEvent,
    Termination, Timeouts,
};

// Protocol types
pub use protocol::{RecordKind, TurnRequest};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{MessageId, TraceId};
