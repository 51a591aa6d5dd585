//! # Trioway
//!
//! Visitors walk fixed routes through shared rooms. A room admits nobody
//! until it is completely empty, and then admits exactly three visitors
//! at once. Visitors overlap one room with the next while moving on, so
//! an emptying room never has to wait for the whole building.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trioway::prelude::*;
//!
//! # async fn demo() -> Result<(), TriowayError> {
//! let scenario = TextCodec.decode(b"1 3  1 0 1 0 5  2 0 1 0 5  3 0 1 0 5")?;
//! let report = Simulation::builder()
//!     .build(scenario)?
//!     .run(TokioClock::default())
//!     .await?;
//! assert_eq!(report.visitors_completed(), 3);
//! # Ok(())
//! # }
//! ```

mod error;
mod runner;
mod sim;

pub use error::TriowayError;
pub use runner::{RouteRunner, VisitReport};
pub use sim::{Simulation, SimulationBuilder, SimulationReport};

pub mod prelude {
    pub use crate::{
        RouteRunner, Simulation, SimulationBuilder, SimulationReport, TriowayError, VisitReport,
    };
    #[cfg(feature = "json")]
    pub use trioway_protocol::JsonCodec;
    pub use trioway_clock::{ClockConfig, Dwell, InstantClock, Place, TokioClock};
    pub use trioway_protocol::{
        ProtocolError, RoomId, Scenario, ScenarioCodec, Step, TextCodec, VisitorId, VisitorPlan,
    };
    pub use trioway_room::{
        Admission, RoomConfig, RoomError, RoomEvent, RoomHandle, RoomPhase, RoomSnapshot,
        RoomTable, TRIO_SIZE,
    };
}
