use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::elements::ParsedElements;
use crate::propagation::{ObjectId, PositionSample};

/// How the rendering boundary should treat an object right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Tracked, but no sample has ever been valid.
    NeverPositioned,
    /// Was positioned before; the latest sample is invalid.
    Stale,
    Live,
}

/// Live state for one tracked object.
#[derive(Debug)]
pub struct RosterEntry {
    id: ObjectId,
    parsed: ParsedElements,
    last_sample: PositionSample,
    last_valid_at: Option<DateTime<Utc>>,
}

impl RosterEntry {
    pub(super) fn new(id: ObjectId, parsed: ParsedElements, sample: PositionSample) -> Self {
        debug_assert_eq!(sample.id, id);
        Self {
            id,
            parsed,
            last_valid_at: sample.valid.then_some(sample.at),
            last_sample: sample,
        }
    }

    /// Swaps in a fresh element set. The old one is dropped whole.
    pub(super) fn replace_elements(&mut self, parsed: ParsedElements, sample: PositionSample) {
        self.parsed = parsed;
        self.record_sample(sample);
    }

    pub(super) fn record_sample(&mut self, sample: PositionSample) {
        debug_assert_eq!(sample.id, self.id);
        if sample.valid {
            self.last_valid_at = Some(sample.at);
        }
        self.last_sample = sample;
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.parsed.name()
    }

    pub fn parsed(&self) -> &ParsedElements {
        &self.parsed
    }

    pub fn last_sample(&self) -> &PositionSample {
        &self.last_sample
    }

    pub fn last_valid_at(&self) -> Option<DateTime<Utc>> {
        self.last_valid_at
    }

    pub fn visibility(&self) -> Visibility {
        match (self.last_sample.valid, self.last_valid_at) {
            (true, _) => Visibility::Live,
            (false, Some(_)) => Visibility::Stale,
            (false, None) => Visibility::NeverPositioned,
        }
    }
}

/// Outcome of one `refresh`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RosterDiff {
    /// New ids, in batch order.
    pub created: Vec<ObjectId>,
    /// Ids that were already live and got fresh elements, in batch order.
    pub updated: Vec<ObjectId>,
    /// Previously live ids absent from the batch, sorted.
    pub removed: Vec<ObjectId>,
    /// Current sample of every live entry, in batch order.
    pub samples: Vec<PositionSample>,
    /// Records dropped because they failed to parse.
    pub skipped: usize,
}

impl RosterDiff {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.samples.iter().filter(|s| s.valid).count()
    }

    /// Live ids with no position at the refresh instant: decayed or failed to propagate.
    pub fn unpositioned(&self) -> impl Iterator<Item = &ObjectId> {
        self.samples.iter().filter(|s| !s.valid).map(|s| &s.id)
    }
}
