//! Scenario description for Trioway.
//!
//! This crate defines what a simulation run is made of, before anything
//! starts moving:
//!
//! - **Types** ([`Scenario`], [`VisitorPlan`], [`Step`], [`RoomId`],
//!   [`VisitorId`]): the rooms, the visitors and their routes.
//! - **Codecs** ([`ScenarioCodec`] trait, [`TextCodec`], [`JsonCodec`]):
//!   how a scenario is read from and written to bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding or
//!   validating a scenario.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about locks, tasks or clocks. It only
//! guarantees that a [`Scenario`] handed to the room layer is well formed:
//!
//! ```text
//! bytes → Codec → Scenario (validated) → RoomTable + RouteRunners
//! ```

mod codec;
mod error;
mod types;

pub use codec::{ScenarioCodec, TextCodec};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{RoomId, Scenario, Step, VisitorId, VisitorPlan};
