//! Session configuration.
//!
//! [`SessionConfig`] holds everything a stream needs besides the
//! conversation identity and the prompt. Build one with
//! [`Session::builder()`](crate::Session::builder).
//!
//! # Defaults
//!
//! | Setting | Default |
//! |---------|---------|
//! | endpoint | [`DEFAULT_ENDPOINT`] |
//! | locale | `en-US` |
//! | conversation style | `Creative` |
//! | connect / write / read timeout | 10s / 5s / 30s |
//! | keep-alive | wall-clock second divisible by 6 |

// ============================================================================
// Imports
// ============================================================================

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rustc_hash::FxHashMap;
use serde_json::{Value, json};

use crate::protocol::TurnOptions;
use crate::transport::{DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT};

// ============================================================================
// Constants
// ============================================================================

/// Default ChatHub endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://sydney.bing.com/sydney/ChatHub";

/// Default locale.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Default conversation style.
pub const DEFAULT_CONVERSATION_STYLE: &str = "Creative";

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default keep-alive modulus in seconds.
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 6;

const BASE_OPTIONS_SETS: &[&str] = &[
    "nlu_direct_response_filter",
    "deepleo",
    "disable_emoji_spoken_text",
    "responsible_ai_policy_235",
    "enablemm",
    "dv3sugg",
    "iyxapbing",
    "iycapbing",
];

const ALLOWED_MESSAGE_TYPES: &[&str] = &[
    "ActionRequest",
    "Chat",
    "Context",
    "InternalSearchQuery",
    "InternalSearchResult",
    "Disengaged",
    "InternalLoaderMessage",
    "Progress",
    "RenderCardRequest",
    "AdsQuery",
    "SemanticSerp",
    "GenerateContentQuery",
    "SearchQuery",
];

// ============================================================================
// Timeouts
// ============================================================================

/// Per-operation timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Dial and upgrade.
    pub connect: Duration,
    /// Each framed write.
    pub write: Duration,
    /// Each framed read.
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            write: DEFAULT_WRITE_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
        }
    }
}

// ============================================================================
// KeepAlive
// ============================================================================

/// Keep-alive schedule.
///
/// A keep-alive is due when a read returns during a wall-clock second
/// divisible by `period_secs`. This is not a fixed-period timer: with
/// sparse traffic it may not fire at all. A period of zero disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    /// Modulus applied to the current UNIX second.
    pub period_secs: u64,
}

impl KeepAlive {
    /// Disabled schedule.
    pub const DISABLED: Self = Self { period_secs: 0 };

    /// Returns `true` if a keep-alive is due at `unix_secs`.
    #[inline]
    #[must_use]
    pub fn is_due(&self, unix_secs: u64) -> bool {
        self.period_secs != 0 && unix_secs % self.period_secs == 0
    }
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self {
            period_secs: DEFAULT_KEEP_ALIVE_SECS,
        }
    }
}

/// Current UNIX time in whole seconds.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

// ============================================================================
// SessionConfig
// ============================================================================

/// Configuration shared by every stream of a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// WebSocket endpoint.
    pub endpoint: String,
    /// Optional `http://` proxy, reached through a CONNECT tunnel.
    pub proxy: Option<String>,
    /// Extra upgrade request headers.
    pub headers: FxHashMap<String, String>,
    /// Cookies, sent as one `Cookie` header.
    pub cookies: FxHashMap<String, String>,
    /// Locale; market and region derive from it.
    pub locale: String,
    /// Conversation style, sent as `tone`.
    pub conversation_style: String,
    /// Option sets per conversation style.
    pub options_sets: FxHashMap<String, Vec<String>>,
    /// Inbound message types the backend may send.
    pub allowed_message_types: Vec<String>,
    /// Experiment slice ids.
    pub slice_ids: Vec<String>,
    /// Location hints per locale.
    pub location_hints: FxHashMap<String, Vec<Value>>,
    /// Ask the backend not to search the web.
    pub no_search: bool,
    /// Log traffic at debug level.
    pub debug: bool,
    /// Operation timeouts.
    pub timeouts: Timeouts,
    /// Keep-alive schedule.
    pub keep_alive: KeepAlive,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            proxy: None,
            headers: default_headers(),
            cookies: FxHashMap::default(),
            locale: DEFAULT_LOCALE.to_string(),
            conversation_style: DEFAULT_CONVERSATION_STYLE.to_string(),
            options_sets: default_options_sets(),
            allowed_message_types: to_strings(ALLOWED_MESSAGE_TYPES),
            slice_ids: Vec::new(),
            location_hints: default_location_hints(),
            no_search: false,
            debug: false,
            timeouts: Timeouts::default(),
            keep_alive: KeepAlive::default(),
        }
    }
}

impl SessionConfig {
    /// Returns the turn-shaping view of this configuration.
    ///
    /// Unknown styles and locales resolve to empty option sets and hints.
    #[must_use]
    pub fn turn_options(&self) -> TurnOptions<'_> {
        TurnOptions {
            locale: &self.locale,
            tone: &self.conversation_style,
            options_sets: self
                .options_sets
                .get(&self.conversation_style)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            allowed_message_types: &self.allowed_message_types,
            slice_ids: &self.slice_ids,
            location_hints: self
                .location_hints
                .get(&self.locale)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            no_search: self.no_search,
        }
    }
}

// ============================================================================
// Default Tables
// ============================================================================

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn default_headers() -> FxHashMap<String, String> {
    let mut headers = FxHashMap::default();
    headers.insert("Origin".to_string(), "https://www.bing.com".to_string());
    headers.insert(
        "User-Agent".to_string(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0"
            .to_string(),
    );
    headers
}

fn default_options_sets() -> FxHashMap<String, Vec<String>> {
    let style = |extra: &[&str]| {
        let mut sets = to_strings(BASE_OPTIONS_SETS);
        sets.extend(to_strings(extra));
        sets
    };

    let mut table = FxHashMap::default();
    table.insert(
        "Creative".to_string(),
        style(&["h3imaginative", "clgalileo", "gencontentv3"]),
    );
    table.insert(
        "Balanced".to_string(),
        style(&["galileo", "saharagenconv5"]),
    );
    table.insert(
        "Precise".to_string(),
        style(&["h3precise", "clgalileo", "gencontentv3"]),
    );
    table
}

fn default_location_hints() -> FxHashMap<String, Vec<Value>> {
    let mut table = FxHashMap::default();
    table.insert(
        "en-US".to_string(),
        vec![json!({
            "country": "United States",
            "state": "California",
            "city": "Los Angeles",
            "timezoneoffset": 8,
            "countryConfidence": 8,
            "Center": {"Latitude": 34.0536909, "Longitude": -118.242766},
            "RegionType": 2,
            "SourceType": 1
        })],
    );
    table
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.connect.as_secs(), 10);
        assert_eq!(timeouts.write.as_secs(), 5);
        assert_eq!(timeouts.read.as_secs(), 30);
    }

    #[test]
    fn test_keep_alive_schedule() {
        let keep_alive = KeepAlive::default();
        assert!(keep_alive.is_due(1_700_000_004));
        assert!(!keep_alive.is_due(1_700_000_005));
        assert!(keep_alive.is_due(0));
    }

    #[test]
    fn test_keep_alive_disabled() {
        assert!(!KeepAlive::DISABLED.is_due(0));
        assert!(!KeepAlive::DISABLED.is_due(6));
    }

    #[test]
    fn test_turn_options_resolve_style_and_locale() {
        let config = SessionConfig::default();
        let options = config.turn_options();

        assert_eq!(options.locale, "en-US");
        assert_eq!(options.tone, "Creative");
        assert!(options.options_sets.iter().any(|s| s == "h3imaginative"));
        assert_eq!(options.location_hints.len(), 1);
        assert!(options.allowed_message_types.iter().any(|s| s == "Chat"));
    }

    #[test]
    fn test_turn_options_unknown_locale() {
        let config = SessionConfig {
            locale: "fr-FR".to_string(),
            conversation_style: "Unknown".to_string(),
            ..Default::default()
        };
        let options = config.turn_options();

        assert!(options.options_sets.is_empty());
        assert!(options.location_hints.is_empty());
    }
}
