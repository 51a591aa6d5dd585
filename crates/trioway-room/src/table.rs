//! Room table: the fixed set of rooms a simulation runs on.

use std::sync::Arc;

use trioway_protocol::{RoomId, VisitorId};

use crate::room::{Admission, EventSender, Room, RoomSnapshot};
use crate::{RoomConfig, RoomError};

/// Handle to one room of a table.
///
/// Cheap to clone (an `Arc`). Obtained from [`RoomTable::handle`], which
/// is the only place a room id is bounds-checked; after that, `enter` and
/// `exit` go straight to the room.
#[derive(Clone)]
pub struct RoomHandle {
    room: Arc<Room>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room.room_id()
    }

    /// See [`Room::enter`].
    pub async fn enter(&self, visitor: VisitorId) -> Admission {
        self.room.enter(visitor).await
    }

    /// See [`Room::exit`].
    pub async fn exit(&self, visitor: VisitorId) -> Result<(), RoomError> {
        self.room.exit(visitor).await
    }

    pub async fn snapshot(&self) -> RoomSnapshot {
        self.room.snapshot().await
    }
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("room_id", &self.room_id())
            .finish()
    }
}

/// Every room of a simulation, indexed by [`RoomId`].
///
/// Created once with a fixed size and never resized. The table itself
/// is immutable; each room synchronizes on its own lock, so there is no
/// table-wide locking.
pub struct RoomTable {
    rooms: Vec<Arc<Room>>,
}

impl RoomTable {
    /// Creates `room_count` empty rooms.
    pub fn new(room_count: u32, config: RoomConfig) -> Self {
        Self::build(room_count, config, None)
    }

    /// Creates `room_count` empty rooms that report every admission and
    /// departure on `events`.
    pub fn with_events(room_count: u32, config: RoomConfig, events: EventSender) -> Self {
        Self::build(room_count, config, Some(events))
    }

    fn build(room_count: u32, config: RoomConfig, events: Option<EventSender>) -> Self {
        let rooms = (0..room_count)
            .map(|id| Arc::new(Room::new(RoomId(id), config.clone(), events.clone())))
            .collect();
        tracing::info!(
            rooms = room_count,
            stall_warning_ms = ?config.stall_warning.map(|d| d.as_millis() as u64),
            "room table created"
        );
        Self { rooms }
    }

    /// Resolves a room id to a handle.
    ///
    /// # Errors
    /// Returns [`RoomError::NotFound`] if `room_id` is outside the table.
    pub fn handle(&self, room_id: RoomId) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(room_id.index())
            .map(|room| RoomHandle {
                room: Arc::clone(room),
            })
            .ok_or(RoomError::NotFound(room_id))
    }

    /// Number of rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Snapshots of every room, in id order.
    ///
    /// Rooms are locked one at a time, so the result is not a single
    /// atomic picture of the whole table.
    pub async fn snapshots(&self) -> Vec<RoomSnapshot> {
        let mut snapshots = Vec::with_capacity(self.rooms.len());
        for room in &self.rooms {
            snapshots.push(room.snapshot().await);
        }
        snapshots
    }
}
