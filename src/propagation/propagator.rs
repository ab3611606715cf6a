use chrono::{DateTime, Utc};

use super::error::PropagationError;
use super::types::InertialState;
use crate::elements::ParsedElements;

/// Turns an element set and an instant into an inertial state.
///
/// Implementations must be deterministic for a given `(elements, at)` pair and must
/// report failure as an error rather than a zero vector.
pub trait Propagator: Send + Sync {
    fn propagate(
        &self,
        elements: &ParsedElements,
        at: DateTime<Utc>,
    ) -> Result<InertialState, PropagationError>;
}

/// SGP4/SDP4 via the `sgp4` crate. Output is TEME, kilometers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Propagator;

impl Propagator for Sgp4Propagator {
    fn propagate(
        &self,
        elements: &ParsedElements,
        at: DateTime<Utc>,
    ) -> Result<InertialState, PropagationError> {
        let minutes = elements
            .elements()
            .datetime_to_minutes_since_epoch(&at.naive_utc())
            .map_err(|e| PropagationError::Sgp4(e.to_string()))?;

        let prediction = elements
            .constants()
            .propagate(minutes)
            .map_err(|e| PropagationError::Sgp4(e.to_string()))?;

        let state = InertialState {
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
        };
        if state.is_degenerate() {
            return Err(PropagationError::Degenerate);
        }
        Ok(state)
    }
}
