//! The aggregation index: classified path records grouped by category key.
//!
//! The index is nested the same way the statistics tree is, so the reducer can
//! walk it level by level:
//!
//! ```text
//! modeGroup -> delay -> mainCategory -> hierCategory -> clockPair -> clockGroup -> mode -> [records]
//! ```
//!
//! The clock groups observed under a clock pair are the keys of that pair's
//! map. Hierarchy categories, clock pairs, and clock groups keep first-seen
//! order; main categories iterate in [`MainCategory::ALL`] order.

use crate::category::{CategoryKey, MainCategory, PathClassifier};
use crate::path::TimingPathRecord;
use indexmap::{IndexMap, IndexSet};
use star_common::DelayType;
use std::collections::BTreeMap;

/// Mode to the records queried for it, at one clock-group position.
pub type ModeBuckets = IndexMap<String, Vec<TimingPathRecord>>;
/// Clock group to its per-mode buckets.
pub type ClockGroupIndex = IndexMap<String, ModeBuckets>;
/// Clock pair to the clock groups observed for it.
pub type ClockPairIndex = IndexMap<String, ClockGroupIndex>;
/// Hierarchy category to its clock pairs.
pub type HierIndex = IndexMap<String, ClockPairIndex>;

/// Everything recorded for one `(modeGroup, delay)`.
#[derive(Clone, Debug, Default)]
pub struct DelayIndex {
    batches: IndexSet<String>,
    categories: BTreeMap<MainCategory, HierIndex>,
}

impl DelayIndex {
    /// Modes whose batch query succeeded, in recording order.
    pub fn modes_with_batch(&self) -> impl Iterator<Item = &str> {
        self.batches.iter().map(String::as_str)
    }

    /// Returns `true` if a batch was recorded for `mode`.
    pub fn has_batch(&self, mode: &str) -> bool {
        self.batches.contains(mode)
    }

    /// Populated main categories in reporting order.
    pub fn categories(&self) -> impl Iterator<Item = (MainCategory, &HierIndex)> {
        self.categories.iter().map(|(main, hier)| (*main, hier))
    }

    /// Returns the hierarchy index of one main category.
    pub fn category(&self, main: MainCategory) -> Option<&HierIndex> {
        self.categories.get(&main)
    }

    /// Iterates over every record queried for `mode` under this delay.
    pub fn mode_records<'a>(
        &'a self,
        mode: &'a str,
    ) -> impl Iterator<Item = &'a TimingPathRecord> + 'a {
        self.categories
            .values()
            .flat_map(move |hier| hier_records(hier, mode))
    }
}

/// Iterates over every record queried for `mode` below a hierarchy index.
pub fn hier_records<'a>(
    hier: &'a HierIndex,
    mode: &'a str,
) -> impl Iterator<Item = &'a TimingPathRecord> + 'a {
    hier.values().flat_map(move |pairs| pair_records(pairs, mode))
}

/// Iterates over every record queried for `mode` below a clock-pair index.
pub fn pair_records<'a>(
    pairs: &'a ClockPairIndex,
    mode: &'a str,
) -> impl Iterator<Item = &'a TimingPathRecord> + 'a {
    pairs
        .values()
        .flat_map(|groups| groups.values())
        .filter_map(move |modes| modes.get(mode))
        .flatten()
}

/// Incrementally built index of classified path records.
///
/// Buckets are created on first sight of a category key and only ever grow.
#[derive(Clone, Debug, Default)]
pub struct AggregationIndex {
    groups: IndexMap<String, IndexMap<DelayType, DelayIndex>>,
    records: usize,
}

impl AggregationIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    fn delay_entry(&mut self, mode_group: &str, delay: DelayType) -> &mut DelayIndex {
        self.groups
            .entry(mode_group.to_string())
            .or_default()
            .entry(delay)
            .or_default()
    }

    /// Records that the batch for `(mode_group, mode, delay)` was queried
    /// successfully, even if it returned no paths.
    pub fn record_batch(&mut self, mode_group: &str, mode: &str, delay: DelayType) {
        self.delay_entry(mode_group, delay)
            .batches
            .insert(mode.to_string());
    }

    /// Returns `true` if a batch was recorded for `(mode_group, mode, delay)`.
    pub fn has_batch(&self, mode_group: &str, mode: &str, delay: DelayType) -> bool {
        self.delay(mode_group, delay)
            .is_some_and(|d| d.has_batch(mode))
    }

    /// Classifies `record` and appends it to the bucket of its category key.
    ///
    /// The record's clock group is added to the set observed under its
    /// `(modeGroup, delay, mainCategory, hierCategory, clockPair)` prefix.
    pub fn classify_and_insert(
        &mut self,
        classifier: &PathClassifier,
        record: TimingPathRecord,
        mode_group: &str,
        mode: &str,
        delay: DelayType,
    ) -> CategoryKey {
        let key = classifier.key(&record, mode_group, mode, delay);
        let c = &key.category;
        self.delay_entry(mode_group, delay)
            .categories
            .entry(c.main)
            .or_default()
            .entry(c.hier.clone())
            .or_default()
            .entry(c.clock_pair.clone())
            .or_default()
            .entry(c.clock_group.clone())
            .or_default()
            .entry(mode.to_string())
            .or_default()
            .push(record);
        self.records += 1;
        key
    }

    /// Returns the records in the bucket of `key`; empty if never populated.
    pub fn bucket(&self, key: &CategoryKey) -> &[TimingPathRecord] {
        let c = &key.category;
        self.delay(&key.mode_group, key.delay)
            .and_then(|d| d.categories.get(&c.main))
            .and_then(|hier| hier.get(&c.hier))
            .and_then(|pairs| pairs.get(&c.clock_pair))
            .and_then(|groups| groups.get(&c.clock_group))
            .and_then(|modes| modes.get(&key.mode))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Clock groups observed under a clock pair, in first-seen order.
    pub fn clock_groups(
        &self,
        mode_group: &str,
        delay: DelayType,
        main: MainCategory,
        hier: &str,
        clock_pair: &str,
    ) -> Vec<&str> {
        self.delay(mode_group, delay)
            .and_then(|d| d.categories.get(&main))
            .and_then(|h| h.get(hier))
            .and_then(|pairs| pairs.get(clock_pair))
            .map(|groups| groups.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns the index of one `(mode_group, delay)`.
    pub fn delay(&self, mode_group: &str, delay: DelayType) -> Option<&DelayIndex> {
        self.groups.get(mode_group)?.get(&delay)
    }

    /// Total number of inserted records.
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(|delays| delays.values())
            .flat_map(|d| d.categories.values())
            .flat_map(|hier| hier.values())
            .flat_map(|pairs| pairs.values())
            .flat_map(|groups| groups.values())
            .map(|modes| modes.len())
            .sum()
    }
}
