//! Statistics report types and terminal formatting.
//!
//! Reports render as text (Display) or serialize as JSON.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::aggregator::{percentage_of, LabelAggregator};

/// What kind of input a source was loaded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A COCO annotation JSON file (instances, person_keypoints, ...).
    CocoJson,
    /// An extracted dataset root with `labels/` and `classes.txt`.
    LabelTree,
}

/// Label statistics for a single annotation source.
#[derive(Clone, Debug, Serialize)]
pub struct SourceStats {
    /// Display name, usually the path the source was loaded from.
    pub name: String,
    pub kind: SourceKind,
    pub total_images: usize,
    /// Occurrences of every label in the source.
    pub all_labels: LabelAggregator,
    /// Occurrences of the target labels only.
    pub target_labels: LabelAggregator,
    /// Number of images holding at least one instance of each target.
    pub images_with_label: BTreeMap<String, usize>,
    /// Number of images holding at least one instance of any target.
    pub filtered_images: usize,
}

impl SourceStats {
    pub fn total_annotations(&self) -> u64 {
        self.all_labels.total()
    }

    pub fn target_annotations(&self) -> u64 {
        self.target_labels.total()
    }

    /// Share of target annotations among all annotations, in percent.
    pub fn target_ratio(&self) -> f64 {
        percentage_of(self.target_annotations(), self.total_annotations())
    }
}

/// A source that could not be loaded.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailedSource {
    pub name: String,
    pub error: String,
}

/// Totals of one source inside the cross-source summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceBreakdown {
    pub name: String,
    pub total_images: usize,
    pub total_annotations: u64,
    pub target_annotations: u64,
    pub target_counts: LabelAggregator,
}

/// Totals merged over every loaded source.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CrossSourceSummary {
    pub total_images: usize,
    pub total_annotations: u64,
    /// Merged target counts over all sources.
    pub target_totals: LabelAggregator,
    pub grand_target_total: u64,
    pub per_source: Vec<SourceBreakdown>,
}

impl CrossSourceSummary {
    /// Share of `label` among all annotations of all sources, in percent.
    pub fn target_percentage(&self, label: &str) -> f64 {
        percentage_of(self.target_totals.count(label), self.total_annotations)
    }

    /// Share of all target annotations among all annotations, in percent.
    pub fn target_ratio(&self) -> f64 {
        percentage_of(self.grand_target_total, self.total_annotations)
    }
}

/// The result of a `stats` run.
#[derive(Clone, Debug, Serialize)]
pub struct StatsReport {
    /// Target labels in request order.
    pub targets: Vec<String>,
    pub sources: Vec<SourceStats>,
    pub failed_sources: Vec<FailedSource>,
    pub summary: CrossSourceSummary,
}

impl fmt::Display for SourceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┌─ {} ", self.name)?;
        writeln!(f, "│")?;
        writeln!(
            f,
            "│   Images:           {:>12}",
            format_number(self.total_images as u64)
        )?;
        writeln!(
            f,
            "│   Annotations:      {:>12}",
            format_number(self.total_annotations())
        )?;
        writeln!(
            f,
            "│   Filtered images:  {:>12}",
            format_number(self.filtered_images as u64)
        )?;
        writeln!(f, "│")?;

        writeln!(f, "│   Label counts:")?;
        if self.all_labels.is_empty() {
            writeln!(f, "│     (none)")?;
        }
        for row in self.all_labels.sorted_by_count() {
            writeln!(
                f,
                "│     {:<20} {:>10}  {:>6.2}%",
                row.label,
                format_number(row.count),
                row.percentage
            )?;
        }
        writeln!(f, "│")?;

        writeln!(f, "│   Targets:")?;
        for (label, images) in &self.images_with_label {
            writeln!(
                f,
                "│     {:<20} {:>10} annotations in {:>8} images",
                label,
                format_number(self.target_labels.count(label)),
                format_number(*images as u64)
            )?;
        }
        writeln!(
            f,
            "│     {:<20} {:>10}  ({:.2}% of all annotations)",
            "total",
            format_number(self.target_annotations()),
            self.target_ratio()
        )?;
        write!(f, "└─")
    }
}

impl fmt::Display for CrossSourceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┌─ Summary across sources ")?;
        writeln!(f, "│")?;
        writeln!(
            f,
            "│   Images:           {:>12}",
            format_number(self.total_images as u64)
        )?;
        writeln!(
            f,
            "│   Annotations:      {:>12}",
            format_number(self.total_annotations)
        )?;
        writeln!(f, "│")?;

        writeln!(f, "│   Target totals:")?;
        for (label, count) in self.target_totals.summary() {
            writeln!(
                f,
                "│     {:<20} {:>10}  {:>6.2}%",
                label,
                format_number(count),
                self.target_percentage(&label)
            )?;
        }
        writeln!(
            f,
            "│     {:<20} {:>10}  {:>6.2}%",
            "total",
            format_number(self.grand_target_total),
            self.target_ratio()
        )?;
        writeln!(f, "│")?;

        writeln!(f, "│   Per source:")?;
        for source in &self.per_source {
            writeln!(
                f,
                "│     {}: {} images, {} annotations, {} target",
                source.name,
                format_number(source.total_images as u64),
                format_number(source.total_annotations),
                format_number(source.target_annotations)
            )?;
        }
        write!(f, "└─")
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Label statistics (targets: {})", self.targets.join(", "))?;
        writeln!(f)?;

        for source in &self.sources {
            writeln!(f, "{source}")?;
            writeln!(f)?;
        }

        if !self.failed_sources.is_empty() {
            writeln!(f, "Sources that could not be loaded:")?;
            for failed in &self.failed_sources {
                writeln!(f, "  - {}: {}", failed.name, failed.error)?;
            }
            writeln!(f)?;
        }

        write!(f, "{}", self.summary)
    }
}

/// Formats a count with thousands separators.
pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
