//! Trigger event log and analytics.
//!
//! A bounded per-character ring of applied trigger events. The log feeds
//! two read paths: per-character history (most recent first, optionally
//! filtered by kind) and the global top-trigger ranking used by
//! analytics.

use std::collections::{BTreeMap, VecDeque};

use dashmap::DashMap;
use serde::Serialize;

use crate::profile::{CharacterId, TriggerEvent, TriggerKind};

/// Aggregate statistics for one trigger kind across the whole log.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerStats {
    /// Trigger kind
    pub kind: TriggerKind,
    /// Number of logged events of this kind
    pub count: u64,
    /// Arithmetic mean of the logged event weights
    pub avg_weight: f64,
}

/// Bounded per-character trigger event log.
#[derive(Debug)]
pub struct TriggerLog {
    entries: DashMap<CharacterId, VecDeque<TriggerEvent>>,
    capacity: usize,
}

impl TriggerLog {
    /// Creates a log retaining at most `capacity` events per character.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends an event, evicting the oldest entry once at capacity.
    pub fn record(&self, character: &CharacterId, event: TriggerEvent) {
        let mut ring = self.entries.entry(character.clone()).or_default();
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(event);
    }

    /// Returns up to `limit` events for a character, most recent first.
    ///
    /// Empty for unknown characters.
    #[must_use]
    pub fn list(
        &self,
        character: &CharacterId,
        kind: Option<&TriggerKind>,
        limit: usize,
    ) -> Vec<TriggerEvent> {
        self.entries.get(character).map_or_else(Vec::new, |ring| {
            ring.iter()
                .rev()
                .filter(|e| kind.is_none_or(|k| &e.kind == k))
                .take(limit)
                .cloned()
                .collect()
        })
    }

    /// Per-kind occurrence counts and mean weights across all
    /// characters, sorted by count descending (kind name breaks ties).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn top_triggers(&self, limit: usize) -> Vec<TriggerStats> {
        let mut sums: BTreeMap<TriggerKind, (u64, f64)> = BTreeMap::new();
        for ring in &self.entries {
            for event in ring.value() {
                let entry = sums.entry(event.kind.clone()).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += event.weight;
            }
        }
        let mut stats: Vec<TriggerStats> = sums
            .into_iter()
            .map(|(kind, (count, total))| TriggerStats {
                kind,
                count,
                avg_weight: total / count as f64,
            })
            .collect();
        stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.kind.cmp(&b.kind)));
        stats.truncate(limit);
        stats
    }
}

// ============================================================================
// Tests
// ============================================================================
