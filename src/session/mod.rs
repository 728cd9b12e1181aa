//! Streaming session.
//!
//! This module provides the main entry point: a [`Session`] sends one
//! prompt per [`Session::ask_stream`] call and returns an
//! [`EventStream`] of backend records.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Session`] | Shared configuration, spawns stream tasks |
//! | [`SessionBuilder`] | Fluent configuration builder |
//! | [`SessionConfig`] | Endpoint, cookies, locale, style, timeouts |
//! | [`Conversation`] | Caller-supplied conversation identity |
//! | [`Dispatcher`] | Handshake and read loop for one turn |
//! | [`EventStream`] | Ordered consumer-facing events |
//!
//! # Flow
//!
//! ```text
//! connect → handshake → turn request → read loop → EventStream → consumer
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for session configuration.
pub mod builder;

/// Session configuration and defaults.
pub mod config;

/// Conversation identity.
pub mod conversation;

/// Session entry point.
pub mod core;

/// Handshake and streaming read loop.
pub mod dispatcher;

/// Consumer-facing event stream.
pub mod events;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SessionBuilder;
pub use config::{KeepAlive, SessionConfig, Timeouts};
pub use conversation::Conversation;
pub use self::core::Session;
pub use dispatcher::{Dispatcher, SessionState, Termination, handshake};
pub use events::{EventStream, StreamEvent};
