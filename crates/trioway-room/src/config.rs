//! Room configuration and phase machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room in a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Log a warning when a visitor has been parked longer than this,
    /// waiting either for the room to empty or for its trio to form.
    ///
    /// Diagnostic only: the visitor keeps waiting afterwards. `None`
    /// (the default) disables the check.
    pub stall_warning: Option<Duration>,
}

impl RoomConfig {
    pub fn with_stall_warning(mut self, after: Duration) -> Self {
        self.stall_warning = Some(after);
        self
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Where a room is in its admission cycle.
///
/// ```text
/// Empty → Forming → Occupied → Draining → Empty
/// ```
///
/// - **Empty**: nobody inside, nobody queued.
/// - **Forming**: nobody inside, one or two visitors queued for a trio.
/// - **Occupied**: a full trio is inside.
/// - **Draining**: part of the last trio has left; the rest are still
///   inside and new arrivals wait for the room to empty.
///
/// The phase is derived from the counters, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Empty,
    Forming,
    Occupied,
    Draining,
}

impl RoomPhase {
    /// Derives the phase from a room's counters.
    pub fn of(occupancy: usize, waiting: usize, trio: usize) -> Self {
        match (occupancy, waiting) {
            (0, 0) => Self::Empty,
            (0, _) => Self::Forming,
            (n, _) if n == trio => Self::Occupied,
            _ => Self::Draining,
        }
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Forming => write!(f, "Forming"),
            Self::Occupied => write!(f, "Occupied"),
            Self::Draining => write!(f, "Draining"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_of_counters() {
        assert_eq!(RoomPhase::of(0, 0, 3), RoomPhase::Empty);
        assert_eq!(RoomPhase::of(0, 1, 3), RoomPhase::Forming);
        assert_eq!(RoomPhase::of(0, 2, 3), RoomPhase::Forming);
        assert_eq!(RoomPhase::of(3, 0, 3), RoomPhase::Occupied);
        assert_eq!(RoomPhase::of(2, 0, 3), RoomPhase::Draining);
        assert_eq!(RoomPhase::of(1, 0, 3), RoomPhase::Draining);
    }

    #[test]
    fn test_default_config_has_no_stall_warning() {
        assert_eq!(RoomConfig::default().stall_warning, None);
        let cfg = RoomConfig::default().with_stall_warning(Duration::from_secs(2));
        assert_eq!(cfg.stall_warning, Some(Duration::from_secs(2)));
    }
}
