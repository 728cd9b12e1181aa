//! Error types for the ChatHub stream client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`].
//! Errors raised inside a running stream are never returned directly;
//! they arrive as the single terminal [`StreamEvent::Failed`] event.
//!
//! [`StreamEvent::Failed`]: crate::StreamEvent::Failed
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidHeader`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::UpgradeRejected`], [`Error::ConnectionClosed`] |
//! | Framing | [`Error::WriteTimeout`], [`Error::ReadTimeout`], [`Error::EmptyResponse`] |
//! | Protocol | [`Error::MalformedRecord`], [`Error::Backend`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Header name or value cannot be sent in the upgrade request.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the offending header.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when dialing the endpoint or the proxy tunnel fails.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Dial did not complete within the connect timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Remote answered the upgrade request with a status other than 101.
    #[error("Cannot establish a websocket connection: HTTP {status}")]
    UpgradeRejected {
        /// HTTP status code returned by the remote.
        status: u16,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Framing Errors
    // ========================================================================
    /// A framed write did not complete in time.
    #[error("Write timeout after {timeout_ms}ms")]
    WriteTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// No frame arrived within the read timeout.
    #[error("Read timeout after {timeout_ms}ms")]
    ReadTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The server sent a text frame with no content.
    #[error("No response from server")]
    EmptyResponse,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// A record is not valid JSON.
    #[error("Malformed record: {message}")]
    MalformedRecord {
        /// Parser diagnostic.
        message: String,
    },

    /// The backend finished the turn with a non-success result.
    #[error("Backend error: {value}: {message}")]
    Backend {
        /// Value of `item.result.value`.
        value: String,
        /// Value of `item.result.message`.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL parse error.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid header error.
    #[inline]
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates an upgrade rejected error.
    #[inline]
    pub fn upgrade_rejected(status: u16) -> Self {
        Self::UpgradeRejected { status }
    }

    /// Creates a write timeout error.
    #[inline]
    pub fn write_timeout(timeout_ms: u64) -> Self {
        Self::WriteTimeout { timeout_ms }
    }

    /// Creates a read timeout error.
    #[inline]
    pub fn read_timeout(timeout_ms: u64) -> Self {
        Self::ReadTimeout { timeout_ms }
    }

    /// Creates a malformed record error.
    #[inline]
    pub fn malformed_record(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }

    /// Creates a backend error from the embedded result fields.
    #[inline]
    pub fn backend(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            value: value.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::WriteTimeout { .. } | Self::ReadTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::UpgradeRejected { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the backend reported the failure inside a record.
    #[inline]
    #[must_use]
    pub fn is_backend_error(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_backend_error_display() {
        let err = Error::backend("Throttled", "Request is throttled.");
        assert_eq!(
            err.to_string(),
            "Backend error: Throttled: Request is throttled."
        );
        assert!(err.is_backend_error());
    }

    #[test]
    fn test_empty_response_display() {
        assert_eq!(Error::EmptyResponse.to_string(), "No response from server");
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::read_timeout(30_000).is_timeout());
        assert!(Error::write_timeout(5_000).is_timeout());
        assert!(Error::connection_timeout(10_000).is_timeout());
        assert!(!Error::EmptyResponse.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::upgrade_rejected(403).is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
        assert!(!Error::malformed_record("test").is_connection_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::ConnectionRefused, "refused");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_url_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err, Error::Url(_)));
    }
}
