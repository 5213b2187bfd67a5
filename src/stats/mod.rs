//! Label statistics over annotation sources.
//!
//! A source is either a COCO annotation JSON file or an extracted dataset
//! root (`labels/**.txt` plus `classes.txt`). Every source produces a
//! [`SourceStats`]; sources are then merged into a [`CrossSourceSummary`].
//! A source that fails to load is reported and skipped.

mod aggregator;
mod report;

pub use aggregator::{percentage_of, LabelAggregator, LabelCount, LabelCountTable};
pub use report::{
    CrossSourceSummary, FailedSource, SourceBreakdown, SourceKind, SourceStats, StatsReport,
};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::classes::DEFAULT_TARGET_CLASSES;
use crate::error::CocosliceError;
use crate::ir::io_coco_json::read_coco_json;
use crate::ir::{CategoryId, Dataset, ImageId};
use crate::manifest::CLASS_LIST_FILE;

/// Options for a statistics run.
#[derive(Clone, Debug)]
pub struct StatsOptions {
    /// Labels reported individually, in request order.
    pub targets: Vec<String>,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            targets: DEFAULT_TARGET_CLASSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Computes label statistics for an in-memory dataset.
///
/// Annotations whose category is not declared are counted under
/// `<missing cat N>`.
pub fn stats_dataset(
    name: impl Into<String>,
    dataset: &Dataset,
    targets: &[String],
) -> SourceStats {
    let category_names: HashMap<CategoryId, &str> = dataset
        .categories
        .iter()
        .map(|cat| (cat.id, cat.name.as_str()))
        .collect();

    let mut all_labels = LabelAggregator::new();
    let mut images_by_label: BTreeMap<String, BTreeSet<ImageId>> = BTreeMap::new();

    for ann in &dataset.annotations {
        let label = match category_names.get(&ann.category_id) {
            Some(name) => name.to_string(),
            None => format!("<missing cat {}>", ann.category_id),
        };
        if targets.contains(&label) {
            images_by_label
                .entry(label.clone())
                .or_default()
                .insert(ann.image_id);
        }
        all_labels.record(label);
    }

    finish_source(
        name.into(),
        SourceKind::CocoJson,
        dataset.images.len(),
        all_labels,
        images_by_label,
        targets,
    )
}

/// Computes label statistics for an extracted dataset root.
///
/// Every `.txt` file below `<root>/labels` counts as one image; each
/// non-empty line is one annotation whose class is looked up in
/// `<root>/classes.txt`.
pub fn stats_label_tree(root: &Path, targets: &[String]) -> Result<SourceStats, CocosliceError> {
    let classes_path = root.join(CLASS_LIST_FILE);
    let class_names = read_class_list(&classes_path)?;

    let labels_dir = root.join("labels");
    if !labels_dir.is_dir() {
        return Err(CocosliceError::LabelTreeInvalid {
            path: labels_dir,
            message: "labels directory not found".to_string(),
        });
    }

    let mut all_labels = LabelAggregator::new();
    let mut images_by_label: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
    let mut total_images = 0usize;

    for entry in WalkDir::new(&labels_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| CocosliceError::LabelTreeInvalid {
            path: labels_dir.clone(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        let is_label_file =
            entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "txt");
        if !is_label_file {
            continue;
        }

        let image_idx = total_images;
        total_images += 1;

        let content = fs::read_to_string(path)?;
        for (line_idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let class_id = parse_label_line(path, line_idx + 1, trimmed, class_names.len())?;
            let label = class_names[class_id].clone();
            if targets.contains(&label) {
                images_by_label
                    .entry(label.clone())
                    .or_default()
                    .insert(image_idx);
            }
            all_labels.record(label);
        }
    }

    Ok(finish_source(
        root.display().to_string(),
        SourceKind::LabelTree,
        total_images,
        all_labels,
        images_by_label,
        targets,
    ))
}

/// Loads one source: a directory is read as a label tree, anything else as
/// a COCO annotation file.
pub fn load_source(path: &Path, targets: &[String]) -> Result<SourceStats, CocosliceError> {
    if path.is_dir() {
        stats_label_tree(path, targets)
    } else {
        let dataset = read_coco_json(path)?;
        Ok(stats_dataset(path.display().to_string(), &dataset, targets))
    }
}

/// Merges per-source statistics into cross-source totals.
pub fn summarize(sources: &[SourceStats]) -> CrossSourceSummary {
    let mut summary = CrossSourceSummary::default();

    for source in sources {
        summary.total_images += source.total_images;
        summary.total_annotations += source.total_annotations();
        summary.target_totals.merge_from(&source.target_labels);
        summary.per_source.push(SourceBreakdown {
            name: source.name.clone(),
            total_images: source.total_images,
            total_annotations: source.total_annotations(),
            target_annotations: source.target_annotations(),
            target_counts: source.target_labels.clone(),
        });
    }
    summary.grand_target_total = summary.target_totals.total();

    summary
}

/// Loads every source and builds the full report.
///
/// # Errors
/// Returns [`CocosliceError::NoUsableSources`] when no source could be
/// loaded. Individual failures are listed in the report instead.
pub fn build_report(paths: &[PathBuf], opts: &StatsOptions) -> Result<StatsReport, CocosliceError> {
    let mut sources = Vec::new();
    let mut failed_sources = Vec::new();

    for path in paths {
        match load_source(path, &opts.targets) {
            Ok(stats) => {
                log::info!(
                    "{}: {} images, {} annotations",
                    stats.name,
                    stats.total_images,
                    stats.total_annotations()
                );
                sources.push(stats);
            }
            Err(err) => {
                log::error!("skipping {}: {}", path.display(), err);
                failed_sources.push(FailedSource {
                    name: path.display().to_string(),
                    error: err.to_string(),
                });
            }
        }
    }

    if sources.is_empty() {
        return Err(CocosliceError::NoUsableSources(paths.len()));
    }

    let summary = summarize(&sources);
    Ok(StatsReport {
        targets: opts.targets.clone(),
        sources,
        failed_sources,
        summary,
    })
}

fn finish_source<K: Ord>(
    name: String,
    kind: SourceKind,
    total_images: usize,
    all_labels: LabelAggregator,
    images_by_label: BTreeMap<String, BTreeSet<K>>,
    targets: &[String],
) -> SourceStats {
    let target_labels = all_labels.restricted_to(targets);

    let images_with_label = targets
        .iter()
        .map(|t| {
            let n = images_by_label.get(t).map_or(0, BTreeSet::len);
            (t.clone(), n)
        })
        .collect();

    // Union over targets, not the sum: an image with two targets counts once.
    let filtered_images = images_by_label
        .values()
        .flatten()
        .collect::<BTreeSet<_>>()
        .len();

    SourceStats {
        name,
        kind,
        total_images,
        all_labels,
        target_labels,
        images_with_label,
        filtered_images,
    }
}

fn read_class_list(path: &Path) -> Result<Vec<String>, CocosliceError> {
    let content = fs::read_to_string(path).map_err(|e| CocosliceError::LabelTreeInvalid {
        path: path.to_path_buf(),
        message: format!("cannot read class list: {e}"),
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Validates a `class cx cy w h` line and returns its class id.
fn parse_label_line(
    path: &Path,
    line: usize,
    text: &str,
    class_count: usize,
) -> Result<usize, CocosliceError> {
    let parse_err = |message: String| CocosliceError::LabelParse {
        path: path.to_path_buf(),
        line,
        message,
    };

    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(parse_err(format!(
            "expected 5 fields, found {}",
            fields.len()
        )));
    }

    let class_id: usize = fields[0]
        .parse()
        .map_err(|_| parse_err(format!("invalid class id '{}'", fields[0])))?;
    if class_id >= class_count {
        return Err(parse_err(format!(
            "class id {class_id} out of range for {class_count} class(es)"
        )));
    }

    for value in &fields[1..] {
        value
            .parse::<f64>()
            .map_err(|_| parse_err(format!("invalid coordinate '{value}'")))?;
    }

    Ok(class_id)
}
