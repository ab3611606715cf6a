//! Propagator stubs shared by unit tests.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{InertialState, PropagationError, Propagator, Sgp4Propagator};
use crate::elements::ParsedElements;

/// Counts calls and forwards to SGP4.
#[derive(Debug, Default, Clone)]
pub struct CountingPropagator {
    pub calls: Arc<AtomicUsize>,
}

impl CountingPropagator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Propagator for CountingPropagator {
    fn propagate(
        &self,
        elements: &ParsedElements,
        at: DateTime<Utc>,
    ) -> Result<InertialState, PropagationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Sgp4Propagator.propagate(elements, at)
    }
}

/// Always fails for the listed names, forwards to SGP4 otherwise.
#[derive(Debug, Default, Clone)]
pub struct FailingPropagator {
    pub failing: Vec<String>,
}

impl Propagator for FailingPropagator {
    fn propagate(
        &self,
        elements: &ParsedElements,
        at: DateTime<Utc>,
    ) -> Result<InertialState, PropagationError> {
        if self.failing.iter().any(|n| n == elements.name()) {
            return Err(PropagationError::Sgp4("forced failure".into()));
        }
        Sgp4Propagator.propagate(elements, at)
    }
}
