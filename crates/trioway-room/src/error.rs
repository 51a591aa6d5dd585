//! Error types for the room layer.

use trioway_protocol::{RoomId, VisitorId};

/// Errors that can occur during room operations.
///
/// Neither variant can happen to a visitor driven by a validated route;
/// both point at a caller that skipped a step of the protocol.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist in this table.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// A visitor tried to leave a room it is not inside.
    #[error("visitor {visitor} is not inside room {room}")]
    NotOccupied { room: RoomId, visitor: VisitorId },
}
