//! Error types for the protocol layer.
//!
//! Every crate in Trioway defines its own error enum. A `ProtocolError`
//! always means the scenario itself is bad: it failed to parse, or it
//! parsed but describes something the room layer cannot run.

use crate::{RoomId, VisitorId};

/// Errors raised while decoding or validating a scenario.
///
/// All of these are construction-time failures. They are reported before
/// any visitor starts, so a rejected scenario never leaves a partially
/// running simulation behind.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// JSON serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// JSON deserialization failed (malformed document, missing fields,
    /// wrong types).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The text input is not valid UTF-8.
    #[error("input is not valid UTF-8")]
    NotUtf8,

    /// A token in the text input is not an integer.
    #[error("token {position} ({token:?}) is not an integer")]
    NotANumber {
        /// Zero-based index of the offending token.
        position: usize,
        /// The token as it appeared in the input.
        token: String,
    },

    /// A count, id or duration was negative.
    #[error("{field} must not be negative, got {value}")]
    NegativeValue {
        /// Which field the value was read for.
        field: &'static str,
        /// The value that was read.
        value: i64,
    },

    /// A value does not fit the type it is stored in.
    #[error("{field} value {value} is out of range")]
    ValueTooLarge {
        field: &'static str,
        value: i64,
    },

    /// The text input ended before the scenario was complete.
    #[error("input ended early: expected {expected}")]
    UnexpectedEnd {
        /// The field that was being read when the input ran out.
        expected: &'static str,
    },

    /// A route references a room outside `[0, room_count)`.
    #[error("visitor {visitor} references room {room}, but only {room_count} rooms exist")]
    RoomOutOfRange {
        visitor: VisitorId,
        room: RoomId,
        room_count: u32,
    },

    /// A visitor has no steps at all, so there is no room to leave.
    #[error("visitor {0} has an empty route")]
    EmptyRoute(VisitorId),

    /// A route lists the same room twice in a row. The visitor would
    /// still be inside when it tries to enter again, so it could never
    /// get in.
    #[error("visitor {visitor} visits room {room} twice in a row")]
    RepeatedRoom { visitor: VisitorId, room: RoomId },

    /// Two visitors share the same id.
    #[error("visitor id {0} appears more than once")]
    DuplicateVisitor(VisitorId),
}
