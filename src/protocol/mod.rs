//! Wire protocol records.
//!
//! This module defines the records exchanged with the ChatHub backend.
//!
//! # Protocol Overview
//!
//! | Record | Direction | Purpose |
//! |--------|-----------|---------|
//! | [`HANDSHAKE_RECORD`] | Local → Remote | Protocol negotiation |
//! | [`KEEP_ALIVE_RECORD`] | Local → Remote | Idle keep-alive |
//! | [`TurnRequest`] | Local → Remote | One user prompt |
//! | update / completion | Remote → Local | Classified by [`classify`] |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `record` | Delimiter framing and inbound classification |
//! | `request` | Turn request structure and builder |

// ============================================================================
// Submodules
// ============================================================================

/// Delimiter framing and inbound classification.
pub mod record;

/// Turn request structure and builder.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use record::{
    HANDSHAKE_RECORD, KEEP_ALIVE_RECORD, RECORD_DELIMITER, RecordKind, classify, frame_record,
    split_records,
};
pub use request::{PreviousMessage, TurnOptions, TurnRequest, region_of};
