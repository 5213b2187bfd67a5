//! Label occurrence counting.

use std::collections::BTreeMap;

use serde::Serialize;

/// Mapping from label name to occurrence count.
pub type LabelCountTable = BTreeMap<String, u64>;

/// Accumulates label occurrences and combines partial counts.
///
/// Counts only ever grow. Merging is associative and commutative, so
/// per-worker, per-split or per-task aggregators can be combined in any
/// order and match a single pass over all recorded events.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelAggregator {
    counts: LabelCountTable,
}

/// One row of a sorted label listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
}

impl LabelAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an aggregator from explicit `(label, count)` pairs.
    pub fn from_counts<S: Into<String>>(counts: impl IntoIterator<Item = (S, u64)>) -> Self {
        let mut agg = Self::new();
        for (label, count) in counts {
            agg.record_n(label, count);
        }
        agg
    }

    pub fn record(&mut self, label: impl Into<String>) {
        self.record_n(label, 1);
    }

    /// Records `n` occurrences at once. Recording zero is a no-op, so an
    /// aggregator never holds zero-count entries.
    pub fn record_n(&mut self, label: impl Into<String>, n: u64) {
        if n == 0 {
            return;
        }
        *self.counts.entry(label.into()).or_insert(0) += n;
    }

    pub fn count(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Share of `label` in all recorded occurrences, in percent.
    ///
    /// Returns 0 when nothing has been recorded.
    pub fn percentage(&self, label: &str) -> f64 {
        percentage_of(self.count(label), self.total())
    }

    /// Snapshot of the current counts.
    pub fn summary(&self) -> LabelCountTable {
        self.counts.clone()
    }

    /// Combined counts of `self` and `other`.
    pub fn merge(&self, other: &LabelAggregator) -> LabelAggregator {
        let mut merged = self.clone();
        merged.merge_from(other);
        merged
    }

    pub fn merge_from(&mut self, other: &LabelAggregator) {
        for (label, &count) in &other.counts {
            self.record_n(label.clone(), count);
        }
    }

    /// Keeps only the given labels.
    pub fn restricted_to(&self, labels: &[String]) -> LabelAggregator {
        LabelAggregator {
            counts: self
                .counts
                .iter()
                .filter(|(label, _)| labels.contains(*label))
                .map(|(label, &count)| (label.clone(), count))
                .collect(),
        }
    }

    /// Labels sorted by count descending, ties broken by name.
    pub fn sorted_by_count(&self) -> Vec<LabelCount> {
        let total = self.total();
        let mut rows: Vec<LabelCount> = self
            .counts
            .iter()
            .map(|(label, &count)| LabelCount {
                label: label.clone(),
                count,
                percentage: percentage_of(count, total),
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        rows
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LabelAggregator {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut agg = Self::new();
        agg.extend(iter);
        agg
    }
}

impl<S: Into<String>> Extend<S> for LabelAggregator {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for label in iter {
            self.record(label);
        }
    }
}

/// `count / total * 100`, or 0 for an empty total.
pub fn percentage_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_combines_disjoint_and_shared_labels() {
        let a = LabelAggregator::from_counts([("car", 5), ("person", 2)]);
        let b = LabelAggregator::from_counts([("car", 1), ("bicycle", 3)]);

        let merged = a.merge(&b);
        assert_eq!(
            merged.summary(),
            LabelCountTable::from([
                ("car".to_string(), 6),
                ("person".to_string(), 2),
                ("bicycle".to_string(), 3),
            ])
        );
        assert_eq!(merged, b.merge(&a));
    }

    #[test]
    fn percentage_is_zero_without_counts() {
        let agg = LabelAggregator::new();
        assert_eq!(agg.percentage("car"), 0.0);
        assert_eq!(agg.total(), 0);
    }

    #[test]
    fn percentage_uses_all_counts() {
        let agg: LabelAggregator = ["car", "car", "car", "person"].into_iter().collect();
        assert_eq!(agg.percentage("car"), 75.0);
        assert_eq!(agg.percentage("person"), 25.0);
        assert_eq!(agg.percentage("bicycle"), 0.0);
    }

    #[test]
    fn sorted_by_count_breaks_ties_by_name() {
        let agg = LabelAggregator::from_counts([("zebra", 2), ("apple", 2), ("car", 9)]);
        let labels: Vec<String> = agg.sorted_by_count().into_iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["car", "apple", "zebra"]);
    }

    #[test]
    fn zero_counts_are_not_stored() {
        let agg = LabelAggregator::from_counts([("car", 0)]);
        assert!(agg.is_empty());
        assert_eq!(agg, LabelAggregator::new());
    }

    #[test]
    fn restricted_to_keeps_only_targets() {
        let agg = LabelAggregator::from_counts([("car", 1), ("dog", 4)]);
        let targets = vec!["car".to_string(), "bicycle".to_string()];
        assert_eq!(
            agg.restricted_to(&targets),
            LabelAggregator::from_counts([("car", 1)])
        );
    }
}
