//! WebSocket transport layer.
//!
//! This module handles the socket between the client and the ChatHub
//! backend.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Dispatcher     │                              │  ChatHub        │
//! │                 │   WebSocket (records + 0x1E) │  backend        │
//! │  Connection     │◄────────────────────────────►│                 │
//! │  → Transport    │   direct or CONNECT tunnel   │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `connect` - Dial the endpoint and verify the 101 upgrade
//! 2. `Connection::write_record` / `Connection::read_frame` - Framed I/O
//! 3. `Connection::close` - Release the socket when the dispatcher exits
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Framed connection and the `Transport` seam |
//! | `connector` | Outbound dialing, headers, cookies and proxy tunnel |

// ============================================================================
// Submodules
// ============================================================================

/// Framed connection over a WebSocket transport.
pub mod connection;

/// Outbound WebSocket dialing.
pub mod connector;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT, Transport};
pub use connector::{WsStream, connect, connect_url, format_cookie_header};
