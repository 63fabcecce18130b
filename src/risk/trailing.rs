use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::Direction;

/// Identity of one trailing state: the composite of rule, position, and
/// direction. A change in any component is a different key, which is what
/// resets the tracked extreme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrailKey {
    pub rule_id: String,
    pub position_key: String,
    pub direction: Direction,
}

impl TrailKey {
    #[must_use]
    pub fn new(
        rule_id: impl Into<String>,
        position_key: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            position_key: position_key.into(),
            direction,
        }
    }
}

/// The favorable extreme tracked for one key.
///
/// Longs advance only `peak` (non-decreasing over the key's lifetime),
/// shorts advance only `trough` (non-increasing). This is the sole mutable
/// state the charting core owns.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrailingSnapshot {
    pub peak: Option<f64>,
    pub trough: Option<f64>,
}

/// Keyed book of trailing snapshots with explicit create/reset/evict
/// operations. Entries are created on first observation, persist across
/// ticks, and are evicted when their rule is disabled or the position closes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrailingBook {
    entries: IndexMap<TrailKey, TrailingSnapshot>,
}

impl TrailingBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn snapshot(&self, key: &TrailKey) -> Option<TrailingSnapshot> {
        self.entries.get(key).copied()
    }

    /// Advances the key's snapshot with one price observation.
    ///
    /// The baseline for a fresh entry is the position's average price when
    /// finite, otherwise the incoming price itself. Non-finite observations
    /// leave the snapshot untouched.
    pub fn observe(&mut self, key: &TrailKey, avg_price: f64, price: f64) -> TrailingSnapshot {
        let entry = self.entries.entry(key.clone()).or_insert_with(|| {
            trace!(rule_id = %key.rule_id, position = %key.position_key, "creating trailing snapshot");
            TrailingSnapshot::default()
        });

        if !price.is_finite() {
            return *entry;
        }

        let baseline = if avg_price.is_finite() { avg_price } else { price };
        match key.direction {
            Direction::Long => {
                entry.peak = Some(entry.peak.unwrap_or(baseline).max(price));
            }
            Direction::Short => {
                entry.trough = Some(entry.trough.unwrap_or(baseline).min(price));
            }
        }
        *entry
    }

    /// Reinitializes the key's snapshot to an empty extreme.
    pub fn reset(&mut self, key: &TrailKey) {
        self.entries.insert(key.clone(), TrailingSnapshot::default());
    }

    /// Discards the key's snapshot (rule disabled/removed or position closed).
    pub fn evict(&mut self, key: &TrailKey) -> Option<TrailingSnapshot> {
        self.entries.shift_remove(key)
    }

    /// Drops every snapshot whose key is no longer active.
    pub fn retain_active<F>(&mut self, mut is_active: F)
    where
        F: FnMut(&TrailKey) -> bool,
    {
        self.entries.retain(|key, _| is_active(key));
    }
}
