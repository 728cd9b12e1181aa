//! Type-safe identifiers for turn requests.
//!
//! | Type | Format | Scope |
//! |------|--------|-------|
//! | [`MessageId`] | time-ordered UUID (v7) | one per turn, used as request and message id |
//! | [`TraceId`] | 32 lowercase hex chars | one per turn |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Number of random bytes in a trace id.
const TRACE_ID_BYTES: usize = 16;

// ============================================================================
// MessageId
// ============================================================================

/// Identifier of one outbound turn.
///
/// The same value fills `requestId` on the argument and both `requestId`
/// and `messageId` on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generates a new time-ordered identifier.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// TraceId
// ============================================================================

/// Random hex trace identifier.
///
/// Not a security boundary; any uniform source is fine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Generates a new random trace id from the thread RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Generates a new trace id from the given RNG.
    #[must_use]
    pub fn generate_with<R: Rng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; TRACE_ID_BYTES];
        rng.fill(&mut bytes[..]);

        Self(hex::encode(bytes))
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_message_ids_are_time_ordered() {
        let first = MessageId::generate();
        let second = MessageId::generate();
        assert_ne!(first, second);
        assert!(first < second);
        assert_eq!(first.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_message_id_serializes_as_string() {
        let id = MessageId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn test_trace_id_is_lowercase_hex() {
        let id = TraceId::generate();
        assert_eq!(id.as_str().len(), TRACE_ID_BYTES * 2);
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_trace_id_is_deterministic_for_seeded_rng() {
        let a = TraceId::generate_with(&mut StdRng::seed_from_u64(7));
        let b = TraceId::generate_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_trace_id_decodes_to_random_bytes() {
        let id = TraceId::generate_with(&mut StdRng::seed_from_u64(42));
        let bytes = hex::decode(id.as_str()).unwrap();
        assert_eq!(bytes.len(), TRACE_ID_BYTES);
        assert_eq!(hex::encode(&bytes), id.as_str());
    }
}
