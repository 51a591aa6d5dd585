//! A single room: emptiness barrier plus trio rendezvous.
//!
//! Each room owns one lock and two wait-sets. Visitors that find the room
//! occupied park on `emptied`; visitors that got in line for the next trio
//! park on `trio_ready`. Nothing here ever touches another room's state,
//! so no lock is held across rooms.
//!
//! Wait-sets are `tokio::sync::Notify`. A waiter registers interest
//! (`enable`) *before* checking the predicate under the lock, so a wakeup
//! issued between the check and the park is never lost. The predicate is
//! always rechecked after waking.

use std::fmt;
use std::pin::Pin;

use tokio::sync::futures::Notified;
use tokio::sync::{Mutex, Notify, mpsc};
use tracing::{debug, error, warn};
use trioway_protocol::{RoomId, VisitorId};

use crate::gate::{Arrival, TRIO_SIZE, TrioGate};
use crate::{RoomConfig, RoomError, RoomPhase};

/// Something that happened inside a room.
///
/// Events are sent while the room lock is held, so for a single room the
/// order a receiver sees is exactly the order things happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// A visitor passed the emptiness check and is waiting for its trio.
    Queued {
        room: RoomId,
        visitor: VisitorId,
        waiting: usize,
    },
    /// A complete trio was let in.
    Admitted {
        room: RoomId,
        batch: u64,
        visitors: Vec<VisitorId>,
    },
    /// A visitor left. `remaining` is the occupancy after it left.
    Left {
        room: RoomId,
        visitor: VisitorId,
        remaining: usize,
    },
    /// The last member of `batch` left; the room is open again.
    Emptied { room: RoomId, batch: u64 },
}

/// Channel sender for room events.
pub type EventSender = mpsc::UnboundedSender<RoomEvent>;

/// Returned by [`Room::enter`] once the visitor is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub room: RoomId,
    /// Zero-based index of the trio this visitor entered with.
    pub batch: u64,
    /// `true` for the arrival that completed the trio and released the
    /// other two.
    pub is_last: bool,
}

/// Point-in-time view of a room's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    /// Visitors currently inside.
    pub occupancy: usize,
    /// Visitors queued for the next trio.
    pub waiting: usize,
    /// Trios admitted since the room was created.
    pub batches_admitted: u64,
    pub phase: RoomPhase,
}

#[derive(Debug, Clone, Copy)]
enum WaitKind {
    Emptiness,
    Trio,
}

impl fmt::Display for WaitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emptiness => f.write_str("emptiness"),
            Self::Trio => f.write_str("trio"),
        }
    }
}

/// State guarded by the room lock.
struct RoomState {
    occupants: Vec<VisitorId>,
    gate: TrioGate,
}

/// A room shared by every visitor whose route passes through it.
pub struct Room {
    room_id: RoomId,
    config: RoomConfig,
    state: Mutex<RoomState>,
    /// Broadcast when the last occupant leaves.
    emptied: Notify,
    /// Broadcast when a trio completes. Only the two queued members of
    /// that trio can be parked here at that moment.
    trio_ready: Notify,
    events: Option<EventSender>,
}

impl Room {
    pub(crate) fn new(room_id: RoomId, config: RoomConfig, events: Option<EventSender>) -> Self {
        Self {
            room_id,
            config,
            state: Mutex::new(RoomState {
                occupants: Vec::with_capacity(TRIO_SIZE),
                gate: TrioGate::new(),
            }),
            emptied: Notify::new(),
            trio_ready: Notify::new(),
            events,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Waits until the room is empty, then until a trio has formed, and
    /// returns once the visitor is inside.
    ///
    /// Suspends indefinitely if no third visitor ever arrives. That is a
    /// property of the input, not an error.
    pub async fn enter(&self, visitor: VisitorId) -> Admission {
        match self.pass_emptiness_barrier(visitor).await {
            Arrival::Completed { generation, .. } => Admission {
                room: self.room_id,
                batch: generation,
                is_last: true,
            },
            Arrival::Queued { generation, .. } => {
                self.await_trio(visitor, generation).await;
                Admission {
                    room: self.room_id,
                    batch: generation,
                    is_last: false,
                }
            }
        }
    }

    /// Leaves the room. Never waits for anything but the lock.
    ///
    /// # Errors
    /// Returns [`RoomError::NotOccupied`] if `visitor` is not inside; the
    /// room's state is left untouched.
    pub async fn exit(&self, visitor: VisitorId) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;

        let Some(pos) = state.occupants.iter().position(|v| *v == visitor) else {
            error!(room_id = %self.room_id, %visitor, "exit from a room the visitor is not in");
            return Err(RoomError::NotOccupied {
                room: self.room_id,
                visitor,
            });
        };
        state.occupants.swap_remove(pos);
        let remaining = state.occupants.len();

        debug!(room_id = %self.room_id, %visitor, remaining, "visitor left");
        self.emit(RoomEvent::Left {
            room: self.room_id,
            visitor,
            remaining,
        });

        if remaining == 0 {
            let batch = state.gate.released().saturating_sub(1);
            debug!(room_id = %self.room_id, batch, "room emptied");
            self.emit(RoomEvent::Emptied {
                room: self.room_id,
                batch,
            });
            self.emptied.notify_waiters();
        }

        Ok(())
    }

    /// Current counters.
    pub async fn snapshot(&self) -> RoomSnapshot {
        let state = self.state.lock().await;
        let occupancy = state.occupants.len();
        let waiting = state.gate.waiting();
        RoomSnapshot {
            room_id: self.room_id,
            occupancy,
            waiting,
            batches_admitted: state.gate.released(),
            phase: RoomPhase::of(occupancy, waiting, TRIO_SIZE),
        }
    }

    /// Parks until the room is empty, then joins the forming trio while
    /// still holding the lock.
    async fn pass_emptiness_barrier(&self, visitor: VisitorId) -> Arrival {
        loop {
            let emptied = self.emptied.notified();
            tokio::pin!(emptied);
            emptied.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if state.occupants.is_empty() {
                    return self.arrive(&mut state, visitor);
                }
            }

            self.park(emptied.as_mut(), visitor, WaitKind::Emptiness).await;
        }
    }

    /// Parks until the trio formed at `generation` has been let in.
    async fn await_trio(&self, visitor: VisitorId, generation: u64) {
        loop {
            let ready = self.trio_ready.notified();
            tokio::pin!(ready);
            ready.as_mut().enable();

            let released = self.state.lock().await.gate.has_released(generation);
            if released {
                return;
            }

            self.park(ready.as_mut(), visitor, WaitKind::Trio).await;
        }
    }

    /// Must be called with the lock held and the room empty.
    fn arrive(&self, state: &mut RoomState, visitor: VisitorId) -> Arrival {
        let arrival = state.gate.arrive(visitor);

        match &arrival {
            Arrival::Queued { waiting, .. } => {
                debug!(room_id = %self.room_id, %visitor, waiting, "visitor queued for trio");
                self.emit(RoomEvent::Queued {
                    room: self.room_id,
                    visitor,
                    waiting: *waiting,
                });
            }
            Arrival::Completed { generation, trio } => {
                state.occupants.extend(trio.iter().copied());
                debug!(
                    room_id = %self.room_id,
                    batch = generation,
                    trio = ?trio,
                    "trio admitted"
                );
                self.emit(RoomEvent::Admitted {
                    room: self.room_id,
                    batch: *generation,
                    visitors: trio.clone(),
                });
                self.trio_ready.notify_waiters();
            }
        }

        arrival
    }

    /// Waits on a registered notification, logging once if the wait
    /// outlasts the configured stall threshold.
    async fn park(&self, mut notified: Pin<&mut Notified<'_>>, visitor: VisitorId, kind: WaitKind) {
        let Some(limit) = self.config.stall_warning else {
            notified.await;
            return;
        };

        if tokio::time::timeout(limit, notified.as_mut()).await.is_err() {
            warn!(
                room_id = %self.room_id,
                %visitor,
                waiting_for = %kind,
                after_ms = limit.as_millis() as u64,
                "visitor stalled; still waiting"
            );
            notified.await;
        }
    }

    fn emit(&self, event: RoomEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver just means nobody is listening.
            let _ = events.send(event);
        }
    }
}
