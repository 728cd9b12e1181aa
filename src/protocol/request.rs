//! Turn request record.
//!
//! One [`TurnRequest`] describes a single user prompt submission. It is
//! built once per turn and serialized into one outbound record.
//!
//! # Format
//!
//! ```json
//! {
//!   "arguments": [{ "source": "cib", "message": { "text": "..." }, ... }],
//!   "invocationId": "0",
//!   "target": "chat",
//!   "type": 4
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::{MessageId, TraceId};
use crate::session::Conversation;

// ============================================================================
// Constants
// ============================================================================

/// Record type of an invocation.
pub const INVOCATION_TYPE: u8 = 4;

/// Suffix appended to the prompt when search is disabled.
pub const NO_SEARCH_MARKER: &str = " #no_search";

/// Message types the backend accepts for user input.
pub const MESSAGE_TYPES: [&str; 2] = ["Chat", "SearchQuery"];

/// Fixed id of the synthetic web page context entry.
pub const WEBPAGE_CONTEXT_ID: &str = "discover-web--page-ping-mriduna-----";

// ============================================================================
// TurnOptions
// ============================================================================

/// Session-level settings that shape a turn request.
#[derive(Debug, Clone, Copy)]
pub struct TurnOptions<'a> {
    /// Locale, also used as market.
    pub locale: &'a str,
    /// Conversation style, sent as `tone`.
    pub tone: &'a str,
    /// Option sets for the tone.
    pub options_sets: &'a [String],
    /// Allowed inbound message types.
    pub allowed_message_types: &'a [String],
    /// Experiment slice ids.
    pub slice_ids: &'a [String],
    /// Location hints for the locale.
    pub location_hints: &'a [Value],
    /// Append [`NO_SEARCH_MARKER`] to the prompt.
    pub no_search: bool,
}

// ============================================================================
// TurnRequest
// ============================================================================

/// Top-level invocation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// Exactly one argument.
    pub arguments: Vec<Argument>,
    /// Always `"0"`.
    pub invocation_id: String,
    /// Always `"chat"`.
    pub target: String,
    /// Always [`INVOCATION_TYPE`].
    #[serde(rename = "type")]
    pub record_type: u8,
}

/// Invocation argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    /// Option sets for the conversation style.
    pub options_sets: Vec<String>,
    /// Client surface name.
    pub source: String,
    /// Message types the backend may stream back.
    pub allowed_message_types: Vec<String>,
    /// Experiment slice ids.
    pub slice_ids: Vec<String>,
    /// Response verbosity.
    pub verbosity: String,
    /// Client scenario.
    pub scenario: String,
    /// Per-turn trace id.
    pub trace_id: TraceId,
    /// Same id as the message.
    pub request_id: MessageId,
    /// Whether this turn opens the conversation.
    pub is_start_of_session: bool,
    /// The user message.
    pub message: ArgumentMessage,
    /// Conversation style.
    pub tone: String,
    /// Conversation signature, omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_signature: Option<String>,
    /// Sending client.
    pub participant: Participant,
    /// Spoken text handling.
    pub spoken_text_mode: String,
    /// Conversation id.
    pub conversation_id: String,
    /// Context injected ahead of the prompt.
    pub previous_messages: Vec<PreviousMessage>,
}

/// The user message carried by the argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentMessage {
    /// Full locale, e.g. `en-US`.
    pub locale: String,
    /// Market; equal to the locale.
    pub market: String,
    /// Two-letter region taken from the locale.
    pub region: String,
    /// Location hints for the locale.
    pub location_hints: Vec<Value>,
    /// Always `user`.
    pub author: String,
    /// Input method.
    pub input_method: String,
    /// Prompt text, with the no-search marker when enabled.
    pub text: String,
    /// `Chat` or `SearchQuery`.
    pub message_type: String,
    /// Turn message id.
    pub request_id: MessageId,
    /// Turn message id.
    pub message_id: MessageId,
    /// Attached image URL, omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Conversation participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Client id.
    pub id: String,
}

/// Prior-context entry injected ahead of the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousMessage {
    /// Always `user`.
    pub author: String,
    /// Context text.
    pub description: String,
    /// Context kind.
    pub context_type: String,
    /// Context message type.
    pub message_type: String,
    /// Fixed context id.
    pub message_id: String,
}

impl PreviousMessage {
    /// Creates the synthetic web page context entry.
    #[must_use]
    pub fn webpage(description: impl Into<String>) -> Self {
        Self {
            author: "user".to_string(),
            description: description.into(),
            context_type: "WebPage".to_string(),
            message_type: "Context".to_string(),
            message_id: WEBPAGE_CONTEXT_ID.to_string(),
        }
    }
}

// ============================================================================
// TurnRequest - Construction
// ============================================================================

impl TurnRequest {
    /// Builds a turn request using the thread RNG.
    #[must_use]
    pub fn build(
        conversation: &Conversation,
        prompt: &str,
        webpage_context: &str,
        image_url: &str,
        options: TurnOptions<'_>,
    ) -> Self {
        Self::build_with(
            &mut rand::rng(),
            conversation,
            prompt,
            webpage_context,
            image_url,
            options,
        )
    }

    /// Builds a turn request drawing message type and trace id from `rng`.
    #[must_use]
    pub fn build_with<R: Rng>(
        rng: &mut R,
        conversation: &Conversation,
        prompt: &str,
        webpage_context: &str,
        image_url: &str,
        options: TurnOptions<'_>,
    ) -> Self {
        let message_id = MessageId::generate();
        let trace_id = TraceId::generate_with(rng);
        let message_type = MESSAGE_TYPES[rng.random_range(0..MESSAGE_TYPES.len())];

        let mut text = prompt.to_string();
        if options.no_search {
            text.push_str(NO_SEARCH_MARKER);
        }

        let message = ArgumentMessage {
            locale: options.locale.to_string(),
            market: options.locale.to_string(),
            region: region_of(options.locale).to_string(),
            location_hints: options.location_hints.to_vec(),
            author: "user".to_string(),
            input_method: "Keyboard".to_string(),
            text,
            message_type: message_type.to_string(),
            request_id: message_id,
            message_id,
            image_url: non_empty(image_url),
        };

        let argument = Argument {
            options_sets: options.options_sets.to_vec(),
            source: "cib".to_string(),
            allowed_message_types: options.allowed_message_types.to_vec(),
            slice_ids: options.slice_ids.to_vec(),
            verbosity: "verbose".to_string(),
            scenario: "SERP".to_string(),
            trace_id,
            request_id: message_id,
            is_start_of_session: true,
            message,
            tone: options.tone.to_string(),
            conversation_signature: non_empty(&conversation.conversation_signature),
            participant: Participant {
                id: conversation.client_id.clone(),
            },
            spoken_text_mode: "None".to_string(),
            conversation_id: conversation.conversation_id.clone(),
            previous_messages: vec![PreviousMessage::webpage(webpage_context)],
        };

        Self {
            arguments: vec![argument],
            invocation_id: "0".to_string(),
            target: "chat".to_string(),
            record_type: INVOCATION_TYPE,
        }
    }

    /// Serializes the request into a record body (without delimiter).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_record(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Returns the turn's message id.
    #[inline]
    #[must_use]
    pub fn message_id(&self) -> Option<MessageId> {
        self.arguments.first().map(|argument| argument.request_id)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Derives the region from the trailing two characters of a locale.
///
/// Locales shorter than two characters are returned whole.
#[must_use]
pub fn region_of(locale: &str) -> &str {
    match locale.char_indices().rev().nth(1) {
        Some((index, _)) => &locale[index..],
        None => locale,
    }
}

#[inline]
fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

// ============================================================================
// Tests
// ============================================================================
