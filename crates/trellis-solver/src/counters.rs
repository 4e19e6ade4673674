//! Case-arm counters.
//!
//! The engines report which rule produced each result as a
//! `(category, label)` pair, e.g. `("lub", "ref-eq")`. The default sink
//! drops everything; `CategoryCounters` keeps per-pair totals for offline
//! profiling of how often each collapse rule fires.

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Receiver for case-arm events.
pub trait CounterSink: Send + Sync {
    fn increment(&self, category: &'static str, label: &'static str);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCounters;

impl CounterSink for NoopCounters {
    #[inline]
    fn increment(&self, _category: &'static str, _label: &'static str) {}
}

pub(crate) static NOOP_COUNTERS: NoopCounters = NoopCounters;

/// Concurrent per-`(category, label)` totals.
#[derive(Debug, Default)]
pub struct CategoryCounters {
    counts: DashMap<(&'static str, &'static str), u64>,
}

impl CategoryCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: &str, label: &str) -> u64 {
        self.counts
            .iter()
            .filter(|entry| entry.key().0 == category && entry.key().1 == label)
            .map(|entry| *entry.value())
            .sum()
    }

    /// Sum over every label of `category`.
    pub fn total(&self, category: &str) -> u64 {
        self.counts
            .iter()
            .filter(|entry| entry.key().0 == category)
            .map(|entry| *entry.value())
            .sum()
    }

    pub fn clear(&self) {
        self.counts.clear();
    }

    /// Sorted copy of the current totals.
    pub fn snapshot(&self) -> BTreeMap<&'static str, BTreeMap<&'static str, u64>> {
        let mut out: BTreeMap<&'static str, BTreeMap<&'static str, u64>> = BTreeMap::new();
        for entry in self.counts.iter() {
            let (category, label) = *entry.key();
            out.entry(category).or_default().insert(label, *entry.value());
        }
        out
    }

    /// `{"category": {"label": count}}`, keys sorted.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for (category, labels) in self.snapshot() {
            let inner: Map<String, Value> = labels
                .into_iter()
                .map(|(label, count)| (label.to_string(), Value::from(count)))
                .collect();
            root.insert(category.to_string(), Value::Object(inner));
        }
        Value::Object(root)
    }
}

impl CounterSink for CategoryCounters {
    fn increment(&self, category: &'static str, label: &'static str) {
        *self.counts.entry((category, label)).or_insert(0) += 1;
    }
}
