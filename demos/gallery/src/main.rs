use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use trioway::prelude::*;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Runs a Trioway scenario: visitors walking through rooms that admit
/// exactly three at a time.
///
/// Log level comes from RUST_LOG (default: info).
#[derive(Parser, Debug)]
#[command(name = "gallery", version)]
struct Options {
    /// Read the scenario as JSON instead of the plain integer stream
    #[arg(long)]
    json: bool,

    /// Length of one dwell tick, in milliseconds
    #[arg(long = "tick-ms", value_name = "N", default_value_t = 100)]
    tick_ms: u64,

    /// Warn when a visitor has waited this long for a room, in milliseconds
    #[arg(long = "stall-warn-ms", value_name = "N")]
    stall_warn_ms: Option<u64>,

    /// Scenario file; stdin when omitted
    #[arg(value_name = "SCENARIO")]
    input: Option<PathBuf>,
}

impl Options {
    fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    fn stall_warning(&self) -> Option<Duration> {
        self.stall_warn_ms.map(Duration::from_millis)
    }

    fn read_scenario(&self) -> Result<Scenario, Box<dyn std::error::Error>> {
        let data = match &self.input {
            Some(path) => std::fs::read(path)?,
            None => {
                let mut buf = Vec::new();
                std::io::stdin().read_to_end(&mut buf)?;
                buf
            }
        };

        let scenario = if self.json {
            JsonCodec.decode(&data)?
        } else {
            TextCodec.decode(&data)?
        };
        Ok(scenario)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Options::parse();

    let scenario = opts.read_scenario()?;
    for (room, visits) in scenario.visits_per_room().iter().enumerate() {
        if visits % TRIO_SIZE != 0 {
            tracing::warn!(
                room_id = %RoomId(room as u32),
                visits,
                "visit count is not a multiple of three; the run will not finish"
            );
        }
    }

    let mut room_config = RoomConfig::default();
    if let Some(after) = opts.stall_warning() {
        room_config = room_config.with_stall_warning(after);
    }

    let clock = TokioClock::with_tick(opts.tick());
    let report = Simulation::builder()
        .room_config(room_config)
        .build(scenario)?
        .run(clock.clone())
        .await?;

    let stats = clock.stats();
    println!(
        "{} visitors finished, {} trios admitted, {} ticks dwelt, {:.1}s elapsed",
        report.visitors_completed(),
        report.total_batches(),
        stats.ticks,
        report.elapsed.as_secs_f64()
    );
    Ok(())
}
