//! Builder pattern for session configuration.
//!
//! # Example
//!
//! ```no_run
//! use chathub_stream::Session;
//!
//! # fn example() -> chathub_stream::Result<()> {
//! let session = Session::builder()
//!     .cookie("_U", "cookie-value")
//!     .locale("en-GB")
//!     .conversation_style("Precise")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::transport::connector::parse_proxy;

use super::config::{KeepAlive, SessionConfig};
use super::core::Session;

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for configuring a [`Session`] instance.
///
/// Use [`Session::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct SessionBuilder {
    /// Configuration under construction.
    config: SessionConfig,
}

// ============================================================================
// SessionBuilder Implementation
// ============================================================================

impl SessionBuilder {
    /// Creates a builder with the default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the WebSocket endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Routes the connection through an `http://` proxy.
    ///
    /// The connection is tunnelled with HTTP `CONNECT`, with Basic auth when
    /// the URL carries credentials. `https://` and `socks5://` proxies are
    /// not supported and fail [`build`](Self::build) with [`Error::Config`].
    /// An empty string clears the proxy.
    #[inline]
    #[must_use]
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        let proxy = proxy.into();
        self.config.proxy = (!proxy.is_empty()).then_some(proxy);
        self
    }

    /// Adds or replaces an upgrade request header.
    #[inline]
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    /// Adds or replaces a cookie.
    #[inline]
    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.cookies.insert(name.into(), value.into());
        self
    }

    /// Adds multiple cookies.
    #[inline]
    #[must_use]
    pub fn cookies(
        mut self,
        cookies: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.config.cookies.extend(
            cookies
                .into_iter()
                .map(|(name, value)| (name.into(), value.into())),
        );
        self
    }

    /// Sets the locale (e.g. `en-US`).
    #[inline]
    #[must_use]
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.config.locale = locale.into();
        self
    }

    /// Sets the conversation style.
    #[inline]
    #[must_use]
    pub fn conversation_style(mut self, style: impl Into<String>) -> Self {
        self.config.conversation_style = style.into();
        self
    }

    /// Sets the option sets for a conversation style.
    #[inline]
    #[must_use]
    pub fn options_sets(
        mut self,
        style: impl Into<String>,
        sets: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.config
            .options_sets
            .insert(style.into(), sets.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the allowed message types.
    #[inline]
    #[must_use]
    pub fn allowed_message_types(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.allowed_message_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the slice ids.
    #[inline]
    #[must_use]
    pub fn slice_ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.slice_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the location hints for a locale.
    #[inline]
    #[must_use]
    pub fn location_hints(mut self, locale: impl Into<String>, hints: Vec<Value>) -> Self {
        self.config.location_hints.insert(locale.into(), hints);
        self
    }

    /// Asks the backend not to search the web.
    #[inline]
    #[must_use]
    pub fn no_search(mut self, no_search: bool) -> Self {
        self.config.no_search = no_search;
        self
    }

    /// Logs every record sent and received at debug level.
    #[inline]
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeouts.connect = timeout;
        self
    }

    /// Sets the framed write timeout.
    #[inline]
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeouts.write = timeout;
        self
    }

    /// Sets the framed read timeout.
    #[inline]
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeouts.read = timeout;
        self
    }

    /// Sets the keep-alive schedule.
    #[inline]
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: KeepAlive) -> Self {
        self.config.keep_alive = keep_alive;
        self
    }

    /// Builds the session with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the endpoint or proxy is not a URL
    /// - [`Error::Config`] if the endpoint is not `ws`/`wss`, the proxy is
    ///   not `http`, the locale is too short or a timeout is zero
    pub fn build(self) -> Result<Session> {
        self.validate_endpoint()?;
        self.validate_proxy()?;
        self.validate_locale()?;
        self.validate_timeouts()?;

        Ok(Session::new(self.config))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionBuilder {
    fn validate_endpoint(&self) -> Result<()> {
        let url = Url::parse(&self.config.endpoint)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "Endpoint must use ws:// or wss://, got: {}",
                self.config.endpoint
            )));
        }
        Ok(())
    }

    fn validate_proxy(&self) -> Result<()> {
        if let Some(proxy) = &self.config.proxy {
            parse_proxy(proxy)?;
        }
        Ok(())
    }

    fn validate_locale(&self) -> Result<()> {
        if self.config.locale.chars().count() < 2 {
            return Err(Error::config(format!(
                "Locale must end with a two-letter region, got: '{}'",
                self.config.locale
            )));
        }
        Ok(())
    }

    fn validate_timeouts(&self) -> Result<()> {
        let timeouts = &self.config.timeouts;
        if timeouts.connect.is_zero() || timeouts.write.is_zero() || timeouts.read.is_zero() {
            return Err(Error::config("Timeouts must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
