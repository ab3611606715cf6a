use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sgp4::{Constants, Elements};
use std::fmt;

/// A raw catalog entry: display name plus the two fixed-width element lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl ElementRecord {
    pub fn new(
        name: impl Into<String>,
        line1: impl Into<String>,
        line2: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            line1: line1.into(),
            line2: line2.into(),
        }
    }
}

/// A validated element set together with the propagator constants derived from it.
///
/// Never edited after construction; fresh elements for the same object produce a
/// new value that replaces this one.
pub struct ParsedElements {
    pub(super) name: String,
    pub(super) epoch: DateTime<Utc>,
    pub(super) decay_limit_minutes: f64,
    pub(super) elements: Elements,
    pub(super) constants: Constants,
}

impl ParsedElements {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Staleness limit in minutes past epoch. Samples beyond it are treated as decayed.
    pub fn decay_limit_minutes(&self) -> f64 {
        self.decay_limit_minutes
    }

    /// Revolutions per day.
    pub fn mean_motion(&self) -> f64 {
        self.elements.mean_motion
    }

    pub fn eccentricity(&self) -> f64 {
        self.elements.eccentricity
    }

    /// Degrees.
    pub fn inclination(&self) -> f64 {
        self.elements.inclination
    }

    /// Degrees.
    pub fn right_ascension(&self) -> f64 {
        self.elements.right_ascension
    }

    /// Degrees.
    pub fn argument_of_perigee(&self) -> f64 {
        self.elements.argument_of_perigee
    }

    /// Degrees.
    pub fn mean_anomaly(&self) -> f64 {
        self.elements.mean_anomaly
    }

    /// B* drag term, in earth radii⁻¹.
    pub fn drag_term(&self) -> f64 {
        self.elements.drag_term
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }
}

impl fmt::Debug for ParsedElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedElements")
            .field("name", &self.name)
            .field("norad_id", &self.elements.norad_id)
            .field("epoch", &self.epoch)
            .field("decay_limit_minutes", &self.decay_limit_minutes)
            .finish_non_exhaustive()
    }
}
