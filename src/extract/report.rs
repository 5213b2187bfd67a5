//! Extraction report types and terminal formatting.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::split::Split;
use crate::stats::{percentage_of, LabelCountTable};

/// The outcome of one extraction run.
///
/// `downloaded_count + skipped_count + failed_count + conversion_failures +
/// path_conflicts` always equals `total_images`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub split: Split,
    pub output_root: PathBuf,
    /// Images holding at least one target annotation.
    pub total_images: usize,
    pub downloaded_count: usize,
    /// Images already present on disk.
    pub skipped_count: usize,
    /// Images whose retrieval failed; they have no label file.
    pub failed_count: usize,
    /// Images whose dimensions made normalization impossible.
    pub conversion_failures: usize,
    /// Images dropped because an earlier image already uses their image or
    /// label path.
    pub path_conflicts: usize,
    /// Emitted annotations per class; every selected class is present.
    pub per_class_counts: LabelCountTable,
    /// Class names ordered by dense id.
    pub class_names: Vec<String>,
}

impl ExtractionReport {
    /// Number of label lines written.
    pub fn total_annotations(&self) -> u64 {
        self.per_class_counts.values().sum()
    }

    /// Images that ended up with a label file.
    pub fn labeled_images(&self) -> usize {
        self.downloaded_count + self.skipped_count
    }

    /// Share of `label` among all emitted annotations, in percent.
    pub fn percentage(&self, label: &str) -> f64 {
        let count = self.per_class_counts.get(label).copied().unwrap_or(0);
        percentage_of(count, self.total_annotations())
    }
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "Extraction summary ({})", self.split)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total images:            {}", self.total_images)?;
        writeln!(f, "Downloaded:              {}", self.downloaded_count)?;
        writeln!(f, "Skipped (already exist): {}", self.skipped_count)?;
        writeln!(f, "Failed:                  {}", self.failed_count)?;
        if self.conversion_failures > 0 {
            writeln!(f, "Invalid dimensions:      {}", self.conversion_failures)?;
        }
        if self.path_conflicts > 0 {
            writeln!(f, "Path conflicts:          {}", self.path_conflicts)?;
        }
        writeln!(f)?;

        writeln!(f, "Annotation counts:")?;
        for name in &self.class_names {
            let count = self.per_class_counts.get(name).copied().unwrap_or(0);
            writeln!(
                f,
                "  {}: {} ({:.2}%)",
                name,
                count,
                self.percentage(name)
            )?;
        }
        writeln!(f)?;

        let root = self.output_root.display();
        writeln!(f, "Data saved to: {root}")?;
        writeln!(f, "  Images:  {root}/images/{}", self.split)?;
        writeln!(f, "  Labels:  {root}/labels/{}", self.split)?;
        write!(f, "  Classes: {root}/classes.txt")
    }
}
