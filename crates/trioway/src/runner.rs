//! Per-visitor route traversal.
//!
//! A visitor walks its route with a one-room overlap: it enters the next
//! room *before* leaving the current one, then dwells. At any instant it
//! holds one room, or two while it is between steps.
//!
//! ```text
//! lobby ─dwell─▶ enter r0 ─dwell─▶ enter r1, exit r0 ─dwell─▶ … ─▶ exit r_last
//! ```

use tracing::{debug, info};
use trioway_clock::{Dwell, Place};
use trioway_protocol::{ProtocolError, VisitorId, VisitorPlan};
use trioway_room::{Admission, RoomHandle, RoomTable};

use crate::TriowayError;

/// What a visitor went through, once its route is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitReport {
    pub visitor: VisitorId,
    /// One admission per step, in route order.
    pub admissions: Vec<Admission>,
}

impl VisitReport {
    /// How many trios this visitor completed by being the third arrival.
    pub fn trios_completed(&self) -> usize {
        self.admissions.iter().filter(|a| a.is_last).count()
    }
}

/// Drives one visitor along its route.
///
/// Room ids are resolved to handles when the runner is built, so a bad
/// route is rejected before anything runs and the traversal itself never
/// looks an id up.
pub struct RouteRunner {
    visitor: VisitorId,
    initial_delay: u32,
    route: Vec<(RoomHandle, u32)>,
}

impl RouteRunner {
    /// Resolves every step of `plan` against `table`.
    ///
    /// # Errors
    /// [`ProtocolError::EmptyRoute`] for a plan without steps, or
    /// [`trioway_room::RoomError::NotFound`] for a room outside the table.
    pub fn new(plan: &VisitorPlan, table: &RoomTable) -> Result<Self, TriowayError> {
        if plan.route.is_empty() {
            return Err(ProtocolError::EmptyRoute(plan.id).into());
        }

        let route = plan
            .route
            .iter()
            .map(|step| -> Result<_, TriowayError> { Ok((table.handle(step.room)?, step.dwell)) })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            visitor: plan.id,
            initial_delay: plan.initial_delay,
            route,
        })
    }

    /// Walks the whole route.
    ///
    /// Returns once the visitor has left its last room. Blocks forever if
    /// some room on the route never gathers a trio.
    ///
    /// # Errors
    /// Only if a room rejects an exit, which means the room and the runner
    /// disagree about who is inside.
    pub async fn run<D: Dwell>(&self, clock: &D) -> Result<VisitReport, TriowayError> {
        let visitor = self.visitor;
        debug!(%visitor, steps = self.route.len(), "visitor arriving");
        clock.dwell(visitor, Place::Lobby, self.initial_delay).await;

        let mut admissions = Vec::with_capacity(self.route.len());
        let mut current: Option<&RoomHandle> = None;

        for (room, dwell) in &self.route {
            let admission = room.enter(visitor).await;
            debug!(
                %visitor,
                room_id = %room.room_id(),
                batch = admission.batch,
                "entered"
            );

            if let Some(previous) = current {
                previous.exit(visitor).await?;
            }

            clock.dwell(visitor, Place::Room(room.room_id()), *dwell).await;
            admissions.push(admission);
            current = Some(room);
        }

        if let Some(last) = current {
            last.exit(visitor).await?;
        }

        info!(%visitor, rooms = admissions.len(), "visitor finished route");
        Ok(VisitReport {
            visitor,
            admissions,
        })
    }
}

impl std::fmt::Debug for RouteRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRunner")
            .field("visitor", &self.visitor)
            .field("initial_delay", &self.initial_delay)
            .field(
                "route",
                &self
                    .route
                    .iter()
                    .map(|(room, dwell)| (room.room_id(), *dwell))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
