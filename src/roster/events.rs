use serde::Serialize;
use std::collections::HashSet;

use super::types::RosterDiff;
use crate::propagation::{ObjectId, PositionSample};

/// What the rendering boundary should do with one object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    /// Newly tracked. The sample may be invalid if it has never been positioned.
    Created { sample: PositionSample },
    /// Move the drawable. Always carries a valid sample.
    Updated { sample: PositionSample },
    /// No position this instant; keep the last drawn state or hide it.
    Hold { id: ObjectId },
    Removed { id: ObjectId },
}

impl RenderEvent {
    pub fn id(&self) -> &ObjectId {
        match self {
            RenderEvent::Created { sample } | RenderEvent::Updated { sample } => &sample.id,
            RenderEvent::Hold { id } | RenderEvent::Removed { id } => id,
        }
    }
}

impl RosterDiff {
    /// Removals first, then one event per live entry in batch order.
    pub fn render_events(&self) -> Vec<RenderEvent> {
        let created: HashSet<&ObjectId> = self.created.iter().collect();

        let removals = self
            .removed
            .iter()
            .map(|id| RenderEvent::Removed { id: id.clone() });

        let live = self.samples.iter().map(|sample| {
            if created.contains(&sample.id) {
                RenderEvent::Created {
                    sample: sample.clone(),
                }
            } else {
                sample_event(sample)
            }
        });

        removals.chain(live).collect()
    }
}

pub fn tick_events(samples: &[PositionSample]) -> Vec<RenderEvent> {
    samples.iter().map(sample_event).collect()
}

fn sample_event(sample: &PositionSample) -> RenderEvent {
    if sample.valid {
        RenderEvent::Updated {
            sample: sample.clone(),
        }
    } else {
        RenderEvent::Hold {
            id: sample.id.clone(),
        }
    }
}
