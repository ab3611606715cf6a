mod engine;
mod error;
mod frame;
mod propagator;
mod types;

pub use engine::PositionEngine;
pub use error::PropagationError;
pub use frame::{sidereal_angle, to_earth_fixed, KM_TO_M};
pub use propagator::{Propagator, Sgp4Propagator};
pub use types::{EarthFixedVector, InertialState, ObjectId, PositionSample};

#[cfg(test)]
pub(crate) mod testing;
