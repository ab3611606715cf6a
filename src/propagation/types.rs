use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Identity of a tracked object, derived from its display name.
///
/// Two records with the same (trimmed) name are the same object. Distinct objects
/// sharing a display name collapse into one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn from_name(name: &str) -> Self {
        ObjectId(name.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable display hue in degrees, `[0, 360)`.
    pub fn hue(&self) -> f64 {
        let hash = self.0.encode_utf16().fold(0i32, |acc, unit| {
            i32::from(unit).wrapping_add(acc.wrapping_shl(5).wrapping_sub(acc))
        });
        f64::from((hash % 360).abs())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(name: &str) -> Self {
        ObjectId::from_name(name)
    }
}

/// Position (km) and velocity (km/s) in the TEME inertial frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertialState {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

impl InertialState {
    /// True when the position cannot be placed on the globe: non-finite or at the origin.
    pub fn is_degenerate(&self) -> bool {
        let finite = self
            .position_km
            .iter()
            .chain(self.velocity_km_s.iter())
            .all(|v| v.is_finite());
        !finite || self.position_km.iter().all(|v| *v == 0.0)
    }
}

/// Earth-fixed cartesian position in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EarthFixedVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EarthFixedVector {
    pub const ZERO: EarthFixedVector = EarthFixedVector {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(&self, other: &EarthFixedVector) -> f64 {
        EarthFixedVector::new(self.x - other.x, self.y - other.y, self.z - other.z).norm()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSample {
    pub id: ObjectId,
    pub name: String,
    pub at: DateTime<Utc>,
    pub position: EarthFixedVector,
    /// When false, `position` is zero and the object must not be drawn for this instant.
    pub valid: bool,
}

impl PositionSample {
    pub fn valid(id: &ObjectId, name: &str, at: DateTime<Utc>, position: EarthFixedVector) -> Self {
        Self {
            id: id.clone(),
            name: name.to_string(),
            at,
            position,
            valid: true,
        }
    }

    pub fn invalid(id: &ObjectId, name: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: id.clone(),
            name: name.to_string(),
            at,
            position: EarthFixedVector::ZERO,
            valid: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_ignores_surrounding_whitespace() {
        assert_eq!(ObjectId::from_name(" ISS "), ObjectId::from("ISS"));
        assert_eq!(ObjectId::from("ISS").to_string(), "ISS");
    }

    #[test]
    fn hue_is_stable_and_in_range() {
        assert_eq!(ObjectId::from("ISS").hue(), 89.0);
        assert_eq!(ObjectId::from("ISS (ZARYA)").hue(), 57.0);
        for name in ["", "HST", "STARLINK-1007", "NOAA 19"] {
            let hue = ObjectId::from(name).hue();
            assert!((0.0..360.0).contains(&hue), "{name}: {hue}");
        }
    }

    #[test]
    fn degenerate_states() {
        let ok = InertialState {
            position_km: [6778.0, 0.0, 0.0],
            velocity_km_s: [0.0, 7.6, 0.0],
        };
        assert!(!ok.is_degenerate());

        let origin = InertialState {
            position_km: [0.0; 3],
            ..ok
        };
        assert!(origin.is_degenerate());

        let nan = InertialState {
            velocity_km_s: [f64::NAN, 0.0, 0.0],
            ..ok
        };
        assert!(nan.is_degenerate());
    }
}
