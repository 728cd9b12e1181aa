//! Conversation identity.
//!
//! Supplied by the caller (typically from the create-conversation
//! response) and read-only to the stream.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Conversation
// ============================================================================

/// Identity of an existing backend conversation.
///
/// Empty strings mean "absent" for the signature and access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Conversation id.
    pub conversation_id: String,

    /// Client (participant) id.
    pub client_id: String,

    /// Conversation signature, omitted from the request when empty.
    #[serde(default)]
    pub conversation_signature: String,

    /// Access token, appended to the connect URL when non-empty.
    #[serde(default)]
    pub sec_access_token: String,
}

impl Conversation {
    /// Creates a conversation identity without signature or token.
    #[inline]
    #[must_use]
    pub fn new(conversation_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// Sets the conversation signature.
    #[inline]
    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.conversation_signature = signature.into();
        self
    }

    /// Sets the access token.
    #[inline]
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.sec_access_token = token.into();
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_no_optionals() {
        let conversation = Conversation::new("c", "p");
        assert_eq!(conversation.conversation_id, "c");
        assert_eq!(conversation.client_id, "p");
        assert!(conversation.conversation_signature.is_empty());
        assert!(conversation.sec_access_token.is_empty());
    }

    #[test]
    fn test_deserialize_create_response() {
        let json = r#"{
            "conversationId": "51D|BingProd|abc",
            "clientId": "914798",
            "result": {"value": "Success", "message": null}
        }"#;
        let conversation: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conversation.conversation_id, "51D|BingProd|abc");
        assert_eq!(conversation.client_id, "914798");
        assert!(conversation.conversation_signature.is_empty());
    }
}
