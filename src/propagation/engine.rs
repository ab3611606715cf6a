use chrono::{DateTime, Utc};

use super::frame::to_earth_fixed;
use super::propagator::{Propagator, Sgp4Propagator};
use super::types::{ObjectId, PositionSample};
use crate::elements::ParsedElements;

/// Produces one `PositionSample` per object per instant. Never fails: every problem
/// downgrades to an invalid sample.
#[derive(Debug, Clone, Default)]
pub struct PositionEngine<P = Sgp4Propagator> {
    propagator: P,
}

impl<P: Propagator> PositionEngine<P> {
    pub fn new(propagator: P) -> Self {
        Self { propagator }
    }

    pub fn propagator(&self) -> &P {
        &self.propagator
    }

    pub fn sample(
        &self,
        parsed: &ParsedElements,
        at: DateTime<Utc>,
        id: &ObjectId,
        name: &str,
    ) -> PositionSample {
        // Staleness guard, not an orbital decay model.
        let elapsed = minutes_since(parsed.epoch(), at);
        if elapsed > parsed.decay_limit_minutes() {
            log::debug!(
                "{id}: {elapsed:.1} min past epoch exceeds limit of {:.1} min, presumed decayed",
                parsed.decay_limit_minutes()
            );
            return PositionSample::invalid(id, name, at);
        }

        match self.propagator.propagate(parsed, at) {
            Ok(state) if !state.is_degenerate() => {
                PositionSample::valid(id, name, at, to_earth_fixed(&state, at))
            }
            Ok(_) => {
                log::debug!("{id}: propagator returned a degenerate state at {at}");
                PositionSample::invalid(id, name, at)
            }
            Err(e) => {
                log::debug!("{id}: propagation failed at {at}: {e}");
                PositionSample::invalid(id, name, at)
            }
        }
    }
}

fn minutes_since(epoch: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    (at - epoch).num_milliseconds() as f64 / 60_000.0
}
