//! Dwell clock for Trioway.
//!
//! Visitors spend time in two places: in the lobby before their first room
//! (the initial delay) and inside each room on their route. Both are given
//! in abstract *ticks*. A [`Dwell`] implementation decides what a tick
//! means:
//!
//! - [`TokioClock`] sleeps `ticks × tick` of Tokio time. Under
//!   `tokio::time::pause()` the sleeps resolve as soon as every task is
//!   idle, so timed scenarios stay deterministic in tests.
//! - [`InstantClock`] just yields once. Nothing in the room protocol
//!   depends on dwell times for correctness, so this is a valid clock for
//!   dry runs.
//!
//! Dwelling never happens while a room lock is held: the runner calls the
//! clock between `enter`/`exit` calls, never inside them.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use trioway_protocol::{RoomId, VisitorId};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Clock configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Wall time represented by one dwell tick. Default: 100 ms
    /// (scenarios are written in tenths of a second).
    pub tick: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
        }
    }
}

impl ClockConfig {
    /// Longest supported tick.
    pub const MAX_TICK: Duration = Duration::from_secs(60);

    /// Create a config with a specific tick length.
    pub fn with_tick(tick: Duration) -> Self {
        Self { tick }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TokioClock::new`]. A zero tick is allowed
    /// and makes every dwell a plain yield.
    pub fn validated(mut self) -> Self {
        if self.tick > Self::MAX_TICK {
            warn!(
                tick_ms = self.tick.as_millis() as u64,
                max_ms = Self::MAX_TICK.as_millis() as u64,
                "tick exceeds maximum, clamping"
            );
            self.tick = Self::MAX_TICK;
        }
        self
    }

    /// Wall time for `ticks` ticks, saturating instead of overflowing.
    pub fn dwell_duration(&self, ticks: u32) -> Duration {
        self.tick.checked_mul(ticks).unwrap_or(Duration::MAX)
    }
}

// ---------------------------------------------------------------------------
// Dwell trait
// ---------------------------------------------------------------------------

/// Where a visitor is dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    /// Outside every room, before the first step of the route.
    Lobby,
    /// Inside a room on the route.
    Room(RoomId),
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => f.write_str("lobby"),
            Self::Room(id) => write!(f, "{id}"),
        }
    }
}

/// The delay primitive visitors use to spend time.
///
/// The returned future must be `Send` because each visitor runs in its
/// own spawned task on the multi-threaded runtime.
pub trait Dwell: Send + Sync + 'static {
    /// Suspends the calling visitor for `ticks` ticks.
    fn dwell(
        &self,
        visitor: VisitorId,
        place: Place,
        ticks: u32,
    ) -> impl Future<Output = ()> + Send;
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Running totals of dwell activity, shared by every clone of a clock.
#[derive(Debug, Default)]
struct DwellCounters {
    calls: AtomicU64,
    ticks: AtomicU64,
}

/// Snapshot of a clock's dwell totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DwellStats {
    /// Number of completed dwell calls.
    pub calls: u64,
    /// Sum of the ticks of all completed dwell calls.
    pub ticks: u64,
}

// ---------------------------------------------------------------------------
// TokioClock
// ---------------------------------------------------------------------------

/// Sleeps on the Tokio timer.
///
/// Cheap to clone; clones share the same stats.
#[derive(Debug, Clone)]
pub struct TokioClock {
    config: ClockConfig,
    counters: Arc<DwellCounters>,
}

impl TokioClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config: config.validated(),
            counters: Arc::default(),
        }
    }

    /// A clock whose tick lasts `tick`.
    pub fn with_tick(tick: Duration) -> Self {
        Self::new(ClockConfig::with_tick(tick))
    }

    pub fn config(&self) -> ClockConfig {
        self.config
    }

    /// Totals of all dwells completed so far.
    pub fn stats(&self) -> DwellStats {
        DwellStats {
            calls: self.counters.calls.load(Ordering::Relaxed),
            ticks: self.counters.ticks.load(Ordering::Relaxed),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

impl Dwell for TokioClock {
    fn dwell(
        &self,
        visitor: VisitorId,
        place: Place,
        ticks: u32,
    ) -> impl Future<Output = ()> + Send {
        let duration = self.config.dwell_duration(ticks);
        let counters = Arc::clone(&self.counters);
        async move {
            trace!(%visitor, %place, ticks, "dwelling");
            if duration.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(duration).await;
            }
            counters.calls.fetch_add(1, Ordering::Relaxed);
            counters.ticks.fetch_add(u64::from(ticks), Ordering::Relaxed);
        }
    }
}

// ---------------------------------------------------------------------------
// InstantClock
// ---------------------------------------------------------------------------

/// Ignores durations and only yields to the scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantClock;

impl Dwell for InstantClock {
    fn dwell(
        &self,
        visitor: VisitorId,
        place: Place,
        ticks: u32,
    ) -> impl Future<Output = ()> + Send {
        async move {
            trace!(%visitor, %place, ticks, "dwell skipped");
            tokio::task::yield_now().await;
        }
    }
}
