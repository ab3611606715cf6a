use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use super::types::{RosterDiff, RosterEntry};
use crate::elements::{
    parse_with_limit, ElementRecord, ParsedElements, DEFAULT_DECAY_LIMIT_MINUTES,
};
use crate::propagation::{ObjectId, PositionEngine, PositionSample, Propagator, Sgp4Propagator};

/// Owns the roster: the mapping from object id to its live state.
///
/// `refresh` replaces the tracked set with a new batch; `tick` recomputes every
/// entry from its retained elements. Both take `&mut self`, so callers sharing a
/// reconciler must serialize them.
pub struct Reconciler<P = Sgp4Propagator> {
    engine: PositionEngine<P>,
    decay_limit_minutes: f64,
    entries: BTreeMap<ObjectId, RosterEntry>,
}

impl Default for Reconciler<Sgp4Propagator> {
    fn default() -> Self {
        Reconciler::new(Sgp4Propagator, DEFAULT_DECAY_LIMIT_MINUTES)
    }
}

impl<P: Propagator> Reconciler<P> {
    pub fn new(propagator: P, decay_limit_minutes: f64) -> Self {
        Self {
            engine: PositionEngine::new(propagator),
            decay_limit_minutes,
            entries: BTreeMap::new(),
        }
    }

    /// Makes `records` the authoritative set of tracked objects.
    ///
    /// Records that fail to parse are skipped and counted. When several records share
    /// a name, the last parsable one wins.
    pub fn refresh(&mut self, records: &[ElementRecord], at: DateTime<Utc>) -> RosterDiff {
        let mut batch: Vec<(ObjectId, ParsedElements)> = Vec::with_capacity(records.len());
        let mut index: HashMap<ObjectId, usize> = HashMap::with_capacity(records.len());
        let mut skipped = 0;

        for record in records {
            let parsed = match parse_with_limit(record, self.decay_limit_minutes) {
                Ok(parsed) => parsed,
                Err(e) => {
                    log::warn!("Skipping element record {:?}: {}", record.name, e);
                    skipped += 1;
                    continue;
                }
            };

            let id = ObjectId::from_name(parsed.name());
            match index.get(&id) {
                Some(&slot) => {
                    log::debug!("Duplicate name {id} in batch, later record wins");
                    batch[slot].1 = parsed;
                }
                None => {
                    index.insert(id.clone(), batch.len());
                    batch.push((id, parsed));
                }
            }
        }

        let removed: Vec<ObjectId> = self
            .entries
            .keys()
            .filter(|id| !index.contains_key(*id))
            .cloned()
            .collect();
        for id in &removed {
            self.entries.remove(id);
        }

        let mut diff = RosterDiff {
            removed,
            skipped,
            samples: Vec::with_capacity(batch.len()),
            ..RosterDiff::default()
        };

        for (id, parsed) in batch {
            let sample = self.engine.sample(&parsed, at, &id, parsed.name());
            diff.samples.push(sample.clone());

            match self.entries.get_mut(&id) {
                Some(entry) => {
                    entry.replace_elements(parsed, sample);
                    diff.updated.push(id);
                }
                None => {
                    self.entries
                        .insert(id.clone(), RosterEntry::new(id.clone(), parsed, sample));
                    diff.created.push(id);
                }
            }
        }

        for id in diff.unpositioned() {
            log::warn!("{id} has no position at {at}, presumed decayed or unpropagatable");
        }

        log::info!(
            "Refresh at {at}: {} created, {} updated, {} removed, {} skipped, {}/{} positioned",
            diff.created.len(),
            diff.updated.len(),
            diff.removed.len(),
            diff.skipped,
            diff.valid_count(),
            diff.samples.len()
        );

        diff
    }

    /// Recomputes every live entry at `at` from its retained elements.
    pub fn tick(&mut self, at: DateTime<Utc>) -> Vec<PositionSample> {
        let engine = &self.engine;
        self.entries
            .values_mut()
            .map(|entry| {
                let sample = engine.sample(entry.parsed(), at, entry.id(), entry.name());
                entry.record_sample(sample.clone());
                sample
            })
            .collect()
    }

    pub fn entry(&self, id: &ObjectId) -> Option<&RosterEntry> {
        self.entries.get(id)
    }

    /// Entries ordered by id.
    pub fn entries(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.entries.keys()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn decay_limit_minutes(&self) -> f64 {
        self.decay_limit_minutes
    }

    pub fn propagator(&self) -> &P {
        self.engine.propagator()
    }
}
