//! Codecs: reading and writing scenarios.
//!
//! A codec turns bytes into a validated [`Scenario`] and back. Two formats
//! are supported:
//!
//! - [`TextCodec`]: the plain whitespace-separated integer stream:
//!
//!   ```text
//!   <rooms> <visitors>
//!   <id> <initial_delay> <visits> (<room> <dwell>){visits}
//!   ...
//!   ```
//!
//! - [`JsonCodec`]: serde_json of [`Scenario`] (feature `json`).
//!
//! Both run [`Scenario::validate`] after decoding, so a decoded scenario is
//! always safe to hand to the room layer.

use std::fmt::Write as _;

use crate::{ProtocolError, Scenario, Step, VisitorId, VisitorPlan};

/// Converts scenarios to and from bytes.
///
/// `Send + Sync + 'static` so a codec can be chosen at startup and passed
/// around freely.
pub trait ScenarioCodec: Send + Sync + 'static {
    /// Serializes a scenario.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the format can't represent it.
    fn encode(&self, scenario: &Scenario) -> Result<Vec<u8>, ProtocolError>;

    /// Parses and validates a scenario.
    ///
    /// # Errors
    /// Returns a parse error for malformed input, or the validation error
    /// for a well-formed but unrunnable scenario.
    fn decode(&self, data: &[u8]) -> Result<Scenario, ProtocolError>;
}

// ---------------------------------------------------------------------------
// TextCodec
// ---------------------------------------------------------------------------

/// The whitespace-separated integer format.
///
/// Line breaks carry no meaning; only token order does. Tokens after the
/// last visitor record are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl ScenarioCodec for TextCodec {
    fn encode(&self, scenario: &Scenario) -> Result<Vec<u8>, ProtocolError> {
        let mut out = String::new();
        // Writing to a String can't fail.
        let _ = writeln!(out, "{} {}", scenario.room_count, scenario.visitors.len());
        for plan in &scenario.visitors {
            let _ = write!(
                out,
                "{} {} {}",
                plan.id.0,
                plan.initial_delay,
                plan.route.len()
            );
            for step in &plan.route {
                let _ = write!(out, " {} {}", step.room.0, step.dwell);
            }
            out.push('\n');
        }
        Ok(out.into_bytes())
    }

    fn decode(&self, data: &[u8]) -> Result<Scenario, ProtocolError> {
        let text = std::str::from_utf8(data).map_err(|_| ProtocolError::NotUtf8)?;
        let mut tokens = Tokens::new(text);

        let room_count = tokens.next_u32("room count")?;
        let visitor_count = tokens.next_u32("visitor count")?;

        // Counts come straight from the input; never size buffers from them.
        let mut visitors = Vec::new();
        for _ in 0..visitor_count {
            let id = tokens.next_u64("visitor id")?;
            let initial_delay = tokens.next_u32("initial delay")?;
            let visits = tokens.next_u32("visit count")?;

            let mut route = Vec::new();
            for _ in 0..visits {
                let room = tokens.next_u32("room id")?;
                let dwell = tokens.next_u32("dwell")?;
                route.push(Step::new(room, dwell));
            }

            visitors.push(VisitorPlan {
                id: VisitorId(id),
                initial_delay,
                route,
            });
        }

        let scenario = Scenario::new(room_count, visitors);
        scenario.validate()?;
        Ok(scenario)
    }
}

/// Cursor over the integer tokens of a text scenario.
///
/// Every token is read as `i64` first so a negative value gets its own
/// error instead of a generic parse failure.
struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
    position: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
            position: 0,
        }
    }

    fn next_i64(&mut self, field: &'static str) -> Result<i64, ProtocolError> {
        let token = self
            .inner
            .next()
            .ok_or(ProtocolError::UnexpectedEnd { expected: field })?;
        let position = self.position;
        self.position += 1;

        let value: i64 = token.parse().map_err(|_| ProtocolError::NotANumber {
            position,
            token: token.to_string(),
        })?;
        if value < 0 {
            return Err(ProtocolError::NegativeValue { field, value });
        }
        Ok(value)
    }

    fn next_u32(&mut self, field: &'static str) -> Result<u32, ProtocolError> {
        let value = self.next_i64(field)?;
        u32::try_from(value).map_err(|_| ProtocolError::ValueTooLarge { field, value })
    }

    fn next_u64(&mut self, field: &'static str) -> Result<u64, ProtocolError> {
        // `next_i64` already rejected negatives.
        let value = self.next_i64(field)?;
        u64::try_from(value).map_err(|_| ProtocolError::ValueTooLarge { field, value })
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// JSON scenarios, via serde_json.
///
/// Handy for generated inputs and for tooling that already speaks JSON.
/// `initial_delay` may be omitted and defaults to zero.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl ScenarioCodec for JsonCodec {
    fn encode(&self, scenario: &Scenario) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec_pretty(scenario).map_err(ProtocolError::Encode)
    }

    fn decode(&self, data: &[u8]) -> Result<Scenario, ProtocolError> {
        let scenario: Scenario =
            serde_json::from_slice(data).map_err(ProtocolError::Decode)?;
        scenario.validate()?;
        Ok(scenario)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
