//! Core scenario types.
//!
//! A [`Scenario`] is everything a simulation run needs to know up front:
//! how many rooms exist and which visitors walk through them, in what
//! order, and for how long they linger in each one.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Index of a room inside the room table.
///
/// Newtype wrapper so a room index can never be confused with a visitor
/// id or a dwell duration. `#[serde(transparent)]` keeps the JSON form a
/// bare number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl RoomId {
    /// The room's position in the room table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Identifier of a visitor, as given in the input.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VisitorId(pub u64);

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// One stop on a visitor's route: which room, and how many dwell ticks
/// to spend there.
///
/// Ticks are abstract. The clock crate decides what a tick is worth in
/// wall time, so the same scenario can run in real time or instantly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub room: RoomId,
    pub dwell: u32,
}

impl Step {
    pub fn new(room: u32, dwell: u32) -> Self {
        Self {
            room: RoomId(room),
            dwell,
        }
    }
}

/// A visitor as described by the input: who it is, how long it waits
/// before arriving, and the ordered list of rooms it visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorPlan {
    pub id: VisitorId,
    /// Ticks spent outside any room before the first step.
    #[serde(default)]
    pub initial_delay: u32,
    pub route: Vec<Step>,
}

impl VisitorPlan {
    pub fn new(id: u64, initial_delay: u32, route: Vec<Step>) -> Self {
        Self {
            id: VisitorId(id),
            initial_delay,
            route,
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// The full input of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub room_count: u32,
    pub visitors: Vec<VisitorPlan>,
}

impl Scenario {
    pub fn new(room_count: u32, visitors: Vec<VisitorPlan>) -> Self {
        Self {
            room_count,
            visitors,
        }
    }

    /// Checks that the scenario can be run at all.
    ///
    /// Rejects rooms outside `[0, room_count)`, empty routes, routes that
    /// step from a room into the same room, and duplicate visitor ids.
    ///
    /// A scenario that passes may still never finish: if a room is
    /// visited by a number of visitors that can't be split into trios, the
    /// leftovers wait forever. That is a property of the input, not
    /// something validation tries to predict.
    ///
    /// # Errors
    /// Returns the first problem found, in visitor order.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let mut seen = HashSet::with_capacity(self.visitors.len());

        for plan in &self.visitors {
            if !seen.insert(plan.id) {
                return Err(ProtocolError::DuplicateVisitor(plan.id));
            }
            if plan.route.is_empty() {
                return Err(ProtocolError::EmptyRoute(plan.id));
            }
            if let Some(step) =
                plan.route.iter().find(|s| s.room.0 >= self.room_count)
            {
                return Err(ProtocolError::RoomOutOfRange {
                    visitor: plan.id,
                    room: step.room,
                    room_count: self.room_count,
                });
            }
            if let Some(pair) = plan.route.windows(2).find(|w| w[0].room == w[1].room) {
                return Err(ProtocolError::RepeatedRoom {
                    visitor: plan.id,
                    room: pair[0].room,
                });
            }
        }

        Ok(())
    }

    /// Number of visits each room receives over the whole run.
    ///
    /// Handy for spotting rooms whose visit count is not a multiple of
    /// three before starting a run that would never finish.
    pub fn visits_per_room(&self) -> Vec<usize> {
        let mut visits = vec![0; self.room_count as usize];
        for step in self.visitors.iter().flat_map(|p| &p.route) {
            if let Some(count) = visits.get_mut(step.room.index()) {
                *count += 1;
            }
        }
        visits
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
