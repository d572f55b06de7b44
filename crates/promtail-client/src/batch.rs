// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Buffering of log entries into per-label-set groups.
//!
//! A [`BatchStore`] covers one buffering window. Entries are grouped by the
//! fingerprint of their label set and kept in arrival order. Flushing takes
//! the whole store at once through [`BatchStore::drain`], leaving a fresh
//! empty one behind.

use crate::labels::LabelSet;
use chrono::{DateTime, Utc};
use fnv::FnvBuildHasher;
use hashbrown::HashMap;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A single timestamped line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub line: String,
}

impl LogEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn now(line: impl Into<String>) -> Self {
        Self::new(Utc::now(), line)
    }

    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, line: impl Into<String>) -> Self {
        Self {
            timestamp,
            line: line.into(),
        }
    }

    /// Nanoseconds since the Unix epoch, or `None` outside the `i64` range
    /// (before 1677 or after 2262).
    #[must_use]
    pub fn unix_nanos(&self) -> Option<i64> {
        self.timestamp.timestamp_nanos_opt()
    }

    /// Whole seconds of the timestamp: `unix_nanos / 1e9`, truncated toward
    /// zero.
    #[must_use]
    pub fn seconds(&self) -> i64 {
        self.split().0
    }

    /// Sub-second remainder of the timestamp: `unix_nanos mod 1e9`, carrying
    /// the sign of the timestamp.
    #[must_use]
    pub fn nanos(&self) -> i32 {
        self.split().1
    }

    // Built from whole seconds so timestamps outside the nanosecond range
    // keep their real value.
    fn split(&self) -> (i64, i32) {
        let seconds = self.timestamp.timestamp();
        // chrono floors the seconds; subsec only reaches 1e9 on a leap second
        let subsec = i64::from(self.timestamp.timestamp_subsec_nanos()).min(NANOS_PER_SECOND - 1);
        if seconds < 0 && subsec > 0 {
            (seconds + 1, (subsec - NANOS_PER_SECOND) as i32)
        } else {
            (seconds, subsec as i32)
        }
    }
}

/// Entries accumulated under one label set during a window.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchGroup {
    pub labels: LabelSet,
    pub entries: Vec<LogEntry>,
}

impl BatchGroup {
    fn new(labels: LabelSet) -> Self {
        Self {
            labels,
            entries: Vec::new(),
        }
    }
}

/// Drained contents of a [`BatchStore`], keyed by label fingerprint.
pub type Batch = HashMap<u64, BatchGroup, FnvBuildHasher>;

/// Per-window grouping of entries by label fingerprint.
///
/// Two distinct label sets whose fingerprints collide share a group; the
/// first label set seen for a fingerprint is the one kept.
#[derive(Debug, Default)]
pub struct BatchStore {
    groups: Batch,
    entries: usize,
}

impl BatchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` to the group for `labels`, creating it when needed.
    pub fn append(&mut self, labels: &LabelSet, entry: LogEntry) {
        self.groups
            .entry(labels.fingerprint())
            .or_insert_with(|| BatchGroup::new(labels.clone()))
            .entries
            .push(entry);
        self.entries += 1;
    }

    /// Takes every group out of the store, resetting it for the next window.
    pub fn drain(&mut self) -> Batch {
        self.entries = 0;
        std::mem::take(&mut self.groups)
    }

    /// Number of entries appended since the last drain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Total number of entries across all groups of a drained batch.
#[must_use]
pub fn entry_count(batch: &Batch) -> usize {
    batch.values().map(|group| group.entries.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_set(n: usize) -> LabelSet {
        LabelSet::new()
            .with("set", n.to_string())
            .with("value", format!("batch_label{n}"))
    }

    #[test]
    fn test_grouping_cycles_over_label_sets() {
        let sets: Vec<LabelSet> = (1..=4).map(numbered_set).collect();
        let mut store = BatchStore::new();

        let n = 10;
        for i in 0..n {
            store.append(&sets[i % 4], LogEntry::now(format!("This is log line #{i}")));
        }

        assert_eq!(store.len(), n);
        assert_eq!(store.group_count(), 4);

        let batch = store.drain();
        assert_eq!(batch.len(), 4);
        assert_eq!(entry_count(&batch), n);
    }

    #[test]
    fn test_group_preserves_arrival_order() {
        let labels = numbered_set(1);
        let mut store = BatchStore::new();
        for i in 0..5 {
            store.append(&labels, LogEntry::now(format!("line {i}")));
        }

        let batch = store.drain();
        let group = &batch[&labels.fingerprint()];
        let lines: Vec<&str> = group.entries.iter().map(|e| e.line.as_str()).collect();
        assert_eq!(lines, vec!["line 0", "line 1", "line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_same_content_in_any_order_shares_a_group() {
        let mut store = BatchStore::new();
        store.append(&LabelSet::new().with("a", "1").with("b", "2"), LogEntry::now("x"));
        store.append(&LabelSet::new().with("b", "2").with("a", "1"), LogEntry::now("y"));
        assert_eq!(store.group_count(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_group_keeps_its_own_copy_of_labels() {
        let mut labels = numbered_set(1);
        let fingerprint = labels.fingerprint();
        let mut store = BatchStore::new();
        store.append(&labels, LogEntry::now("x"));

        labels.set("set", "mutated");

        let batch = store.drain();
        assert_eq!(batch[&fingerprint].labels.get("set"), Some("1"));
    }

    #[test]
    fn test_drain_resets_store() {
        let mut store = BatchStore::new();
        store.append(&numbered_set(1), LogEntry::now("x"));
        let first = store.drain();
        assert_eq!(entry_count(&first), 1);

        assert!(store.is_empty());
        assert_eq!(store.group_count(), 0);
        assert!(store.drain().is_empty());
    }

    #[test]
    fn test_timestamp_split() {
        let timestamp = DateTime::from_timestamp_nanos(1_700_000_000_123_456_789);
        let entry = LogEntry::new(timestamp, "x");
        assert_eq!(entry.unix_nanos(), Some(1_700_000_000_123_456_789));
        assert_eq!(entry.seconds(), 1_700_000_000);
        assert_eq!(entry.nanos(), 123_456_789);
    }

    #[test]
    fn test_timestamp_split_before_epoch_truncates() {
        let timestamp = DateTime::from_timestamp_nanos(-1_500_000_000);
        let entry = LogEntry::new(timestamp, "x");
        assert_eq!(entry.unix_nanos(), Some(-1_500_000_000));
        assert_eq!(entry.seconds(), -1);
        assert_eq!(entry.nanos(), -500_000_000);

        let whole = LogEntry::new(DateTime::from_timestamp_nanos(-2_000_000_000), "x");
        assert_eq!(whole.seconds(), -2);
        assert_eq!(whole.nanos(), 0);
    }

    #[test]
    fn test_timestamp_split_outside_nanosecond_range() {
        // 1653-02-10, before the earliest i64 nanosecond timestamp
        let early = DateTime::from_timestamp(-10_000_000_000, 250).expect("valid timestamp");
        let entry = LogEntry::new(early, "x");
        assert_eq!(entry.unix_nanos(), None);
        assert_eq!(entry.seconds(), -9_999_999_999);
        assert_eq!(entry.nanos(), -999_999_750);

        // 2286-11-20, after the latest one
        let late = DateTime::from_timestamp(10_000_000_000, 7).expect("valid timestamp");
        let entry = LogEntry::new(late, "x");
        assert_eq!(entry.unix_nanos(), None);
        assert_eq!(entry.seconds(), 10_000_000_000);
        assert_eq!(entry.nanos(), 7);
    }
}
