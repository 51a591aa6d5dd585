//! Trio-admission rooms for Trioway.
//!
//! A room lets visitors in only when it is completely empty, and only
//! three at a time: the first two arrivals wait, the third lets all three
//! in together. Once the trio has left, the next trio may form.
//!
//! # Key types
//!
//! - [`Room`]: one room's lock, counters and wait-sets
//! - [`RoomTable`]: the fixed set of rooms, indexed by id
//! - [`RoomHandle`]: a resolved reference to one room
//! - [`RoomEvent`]: optional per-room event stream for observers
//! - [`RoomConfig`] / [`RoomPhase`]: settings and the derived phase

mod config;
mod error;
mod gate;
mod room;
mod table;

pub use config::{RoomConfig, RoomPhase};
pub use error::RoomError;
pub use gate::TRIO_SIZE;
pub use room::{Admission, EventSender, Room, RoomEvent, RoomSnapshot};
pub use table::{RoomHandle, RoomTable};
