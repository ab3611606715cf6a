//! Propagation and reconciliation engine for live orbital object tracking.
//!
//! Element sets enter through [`roster::Reconciler::refresh`], get propagated with
//! SGP4 and rotated into the Earth-fixed frame, and leave as render events for
//! whatever draws the globe.

pub mod config;
pub mod elements;
pub mod propagation;
pub mod roster;
pub mod scheduler;
