//! `Simulation` builder and run loop.
//!
//! This ties the layers together: a validated scenario becomes a room
//! table plus one route runner per visitor, and `run` starts every
//! visitor at once and waits for all of them.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use trioway_clock::Dwell;
use trioway_protocol::Scenario;
use trioway_room::{EventSender, RoomConfig, RoomSnapshot, RoomTable};

use crate::runner::{RouteRunner, VisitReport};
use crate::TriowayError;

/// Builder for a [`Simulation`].
///
/// # Example
///
/// ```rust,ignore
/// use trioway::prelude::*;
///
/// let scenario = TextCodec.decode(input)?;
/// let report = Simulation::builder()
///     .room_config(RoomConfig::default())
///     .build(scenario)?
///     .run(TokioClock::default())
///     .await?;
/// ```
#[derive(Default)]
pub struct SimulationBuilder {
    room_config: RoomConfig,
    events: Option<EventSender>,
}

impl SimulationBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration shared by every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Reports every room event on `events`.
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Validates `scenario` and prepares every visitor.
    ///
    /// Nothing is started here. If any visitor's route is invalid, no
    /// visitor runs at all.
    ///
    /// # Errors
    /// Returns the first validation or room-resolution error.
    pub fn build(self, scenario: Scenario) -> Result<Simulation, TriowayError> {
        scenario.validate()?;

        let table = match self.events {
            Some(events) => RoomTable::with_events(scenario.room_count, self.room_config, events),
            None => RoomTable::new(scenario.room_count, self.room_config),
        };

        let runners = scenario
            .visitors
            .iter()
            .map(|plan| RouteRunner::new(plan, &table))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            rooms = table.len(),
            visitors = runners.len(),
            "simulation ready"
        );

        Ok(Simulation { table, runners })
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// One report per visitor, ordered by visitor id.
    pub visits: Vec<VisitReport>,
    /// Final state of every room, in id order.
    pub rooms: Vec<RoomSnapshot>,
    /// Time from the first spawn to the last join, on the Tokio clock.
    pub elapsed: Duration,
}

impl SimulationReport {
    pub fn visitors_completed(&self) -> usize {
        self.visits.len()
    }

    /// Trios admitted across all rooms.
    pub fn total_batches(&self) -> u64 {
        self.rooms.iter().map(|r| r.batches_admitted).sum()
    }

    /// Whether every room ended the run empty with nobody queued.
    pub fn all_rooms_empty(&self) -> bool {
        self.rooms.iter().all(|r| r.occupancy == 0 && r.waiting == 0)
    }
}

/// A prepared simulation: a room table and one runner per visitor.
pub struct Simulation {
    table: RoomTable,
    runners: Vec<RouteRunner>,
}

impl Simulation {
    /// Creates a new builder.
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    pub fn table(&self) -> &RoomTable {
        &self.table
    }

    pub fn visitor_count(&self) -> usize {
        self.runners.len()
    }

    /// Starts every visitor in its own task and waits for all of them.
    ///
    /// Does not return if some room never gathers a trio; wrap the call in
    /// `tokio::time::timeout` when that is possible.
    ///
    /// # Errors
    /// Returns the first visitor failure. A panicked visitor surfaces as
    /// [`TriowayError::Task`].
    pub async fn run<D: Dwell>(self, clock: D) -> Result<SimulationReport, TriowayError> {
        let clock = Arc::new(clock);
        let start = Instant::now();

        let mut tasks = JoinSet::new();
        for runner in self.runners {
            let clock = Arc::clone(&clock);
            tasks.spawn(async move { runner.run(&*clock).await });
        }
        tracing::info!(visitors = tasks.len(), "visitors started");

        let mut visits = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            visits.push(joined??);
        }
        visits.sort_by_key(|v| v.visitor);

        let elapsed = start.elapsed();
        let rooms = self.table.snapshots().await;
        let report = SimulationReport {
            visits,
            rooms,
            elapsed,
        };

        tracing::info!(
            visitors = report.visitors_completed(),
            batches = report.total_batches(),
            elapsed_ms = elapsed.as_millis() as u64,
            "simulation finished"
        );
        Ok(report)
    }
}
