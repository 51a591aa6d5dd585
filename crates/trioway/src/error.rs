//! Unified error type for Trioway.

use trioway_protocol::ProtocolError;
use trioway_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum TriowayError {
    /// The scenario failed to decode or validate.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room operation failed (unknown room, exit without entry).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A visitor task panicked or was cancelled.
    #[error("visitor task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
