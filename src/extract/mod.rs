//! Class-filtered extraction of a COCO split into a YOLO dataset.
//!
//! For every image that holds at least one target annotation the pipeline
//! makes sure the image file is on disk and writes one label line per
//! target annotation. Per-image problems (a failed download, unusable
//! dimensions) are logged and counted; only setup and label-file I/O errors
//! abort the run.
//!
//! An image file is never stored without its label file: the label is
//! staged next to its final path and moved into place before the image.
//! An image that is already on disk is never fetched or overwritten again,
//! and no two images of a run share an output path.

mod report;

pub use report::ExtractionReport;

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::classes::DenseClassIndex;
use crate::error::CocosliceError;
use crate::fetch::{ensure_image_payload, ImageFetcher, RetrievalError};
use crate::ir::{normalize, validate_dimensions, BBoxError, CategoryId, ImageRecord};
use crate::manifest::{
    discover_splits, write_class_list, write_dataset_descriptor, CLASS_LIST_FILE, DESCRIPTOR_FILE,
};
use crate::split::Split;
use crate::stats::LabelAggregator;
use crate::store::AnnotationStore;

/// Where one split's outputs live under the dataset root.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    root: PathBuf,
    split: Split,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, split: Split) -> Self {
        Self {
            root: root.into(),
            split,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn split(&self) -> Split {
        self.split
    }

    /// `<root>/annotations/instances_<split>.json`
    pub fn annotations_path(&self) -> PathBuf {
        self.root
            .join("annotations")
            .join(self.split.instances_file_name())
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images").join(self.split.as_str())
    }

    pub fn labels_dir(&self) -> PathBuf {
        self.root.join("labels").join(self.split.as_str())
    }

    pub fn image_path(&self, image: &ImageRecord) -> PathBuf {
        self.images_dir().join(&image.file_name)
    }

    pub fn label_path(&self, image: &ImageRecord) -> PathBuf {
        self.labels_dir().join(image.label_file_name())
    }

    pub fn classes_path(&self) -> PathBuf {
        self.root.join(CLASS_LIST_FILE)
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(DESCRIPTOR_FILE)
    }

    /// Creates the image and label directories of the split.
    pub fn prepare(&self) -> Result<(), CocosliceError> {
        for dir in [self.images_dir(), self.labels_dir()] {
            fs::create_dir_all(&dir)
                .map_err(|source| CocosliceError::OutputNotWritable { path: dir, source })?;
        }
        Ok(())
    }
}

/// Options for an extraction run.
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Number of images processed concurrently; 1 processes them in order.
    pub workers: usize,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            show_progress: false,
        }
    }
}

/// Per-worker counters, merged once all images are processed.
#[derive(Clone, Debug, Default)]
struct Tally {
    downloaded: usize,
    skipped: usize,
    failed: usize,
    conversion_failures: usize,
    labels: LabelAggregator,
}

impl Tally {
    fn merge(mut self, other: Tally) -> Tally {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.conversion_failures += other.conversion_failures;
        self.labels.merge_from(&other.labels);
        self
    }
}

/// Shared, read-only state for processing one image.
struct ImageJob<'a> {
    store: &'a dyn AnnotationStore,
    fetcher: &'a dyn ImageFetcher,
    index: &'a DenseClassIndex,
    category_ids: &'a [CategoryId],
    layout: &'a OutputLayout,
}

/// A rendered label file, or the reason the image cannot be converted.
enum LabelFile {
    /// Label text plus the dense class of every line.
    Ready { text: String, classes: Vec<usize> },
    Unconvertible(BBoxError),
}

/// Extracts every image holding one of `target_classes` into `layout`.
///
/// Writes `classes.txt` before processing images and `dataset.yaml` after.
///
/// # Errors
/// Setup problems (unknown or ambiguous class names, an unwritable output
/// directory) and label-file write failures. Retrieval failures are not
/// errors; they are counted in the report.
pub fn extract(
    store: &dyn AnnotationStore,
    fetcher: &dyn ImageFetcher,
    target_classes: &[String],
    layout: &OutputLayout,
    options: &ExtractOptions,
) -> Result<ExtractionReport, CocosliceError> {
    if options.workers == 0 {
        return Err(CocosliceError::InvalidOption(
            "workers must be at least 1".to_string(),
        ));
    }

    let categories = store.resolve_categories(target_classes)?;
    let index = DenseClassIndex::build(&categories)?;
    for (dense, original) in index.pairs() {
        log::info!(
            "class {} -> {} (COCO id {})",
            index.name(dense)?,
            dense,
            original
        );
    }

    layout.prepare()?;
    write_class_list(&index, &layout.classes_path())?;

    let category_ids = index.original_ids();
    let found = store.images_containing(&category_ids);
    let total_images = found.len();
    log::info!(
        "Found {} images containing target classes in {}",
        total_images,
        layout.split()
    );
    let (images, path_conflicts) = claim_output_paths(found, layout);

    let job = ImageJob {
        store,
        fetcher,
        index: &index,
        category_ids: &category_ids,
        layout,
    };
    let progress = progress_bar(images.len() as u64, options.show_progress);

    let tally = if options.workers == 1 {
        images.iter().try_fold(Tally::default(), |mut tally, image| {
            job.process(image, &mut tally)?;
            progress.inc(1);
            Ok::<_, CocosliceError>(tally)
        })?
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .build()
            .map_err(|e| CocosliceError::WorkerPool(e.to_string()))?;

        pool.install(|| {
            images
                .par_iter()
                .try_fold(Tally::default, |mut tally, image| {
                    job.process(image, &mut tally)?;
                    progress.inc(1);
                    Ok::<_, CocosliceError>(tally)
                })
                .try_reduce(Tally::default, |a, b| Ok(a.merge(b)))
        })?
    };
    progress.finish_and_clear();

    let class_names = index.names();
    let splits = discover_splits(layout.root());
    write_dataset_descriptor(
        layout.root(),
        &splits,
        class_names.clone(),
        &layout.descriptor_path(),
    )?;

    let mut per_class_counts = tally.labels.summary();
    for name in &class_names {
        per_class_counts.entry(name.clone()).or_insert(0);
    }

    Ok(ExtractionReport {
        split: layout.split(),
        output_root: layout.root().to_path_buf(),
        total_images,
        downloaded_count: tally.downloaded,
        skipped_count: tally.skipped,
        failed_count: tally.failed,
        conversion_failures: tally.conversion_failures,
        path_conflicts,
        per_class_counts,
        class_names,
    })
}

impl ImageJob<'_> {
    fn process(&self, image: &ImageRecord, tally: &mut Tally) -> Result<(), CocosliceError> {
        let (label_text, emitted) = match self.render_labels(image)? {
            LabelFile::Ready { text, classes } => (text, classes),
            LabelFile::Unconvertible(err) => {
                log::warn!(
                    "image {} ({}): {}; skipping",
                    image.id,
                    image.file_name,
                    err
                );
                tally.conversion_failures += 1;
                return Ok(());
            }
        };

        let image_path = self.layout.image_path(image);
        let label_path = self.layout.label_path(image);
        if image_path.exists() {
            log::debug!("{} already present", image_path.display());
            write_new_file(&label_path, label_text.as_bytes())?;
            tally.skipped += 1;
        } else {
            let stored = self
                .retrieve(image)
                .and_then(|bytes| store_pair(&image_path, &bytes, &label_path, &label_text));
            match stored {
                Ok(()) => tally.downloaded += 1,
                Err(StoreError::Retrieval(err)) => {
                    log::error!(
                        "Error downloading image {} ({}): {}",
                        image.id,
                        image.file_name,
                        err
                    );
                    tally.failed += 1;
                    return Ok(());
                }
                Err(StoreError::Label(err)) => return Err(err.into()),
            }
        }

        for dense in emitted {
            tally.labels.record(self.index.name(dense)?);
        }
        Ok(())
    }

    /// Renders the label file for `image`.
    fn render_labels(&self, image: &ImageRecord) -> Result<LabelFile, CocosliceError> {
        let width = f64::from(image.width);
        let height = f64::from(image.height);
        if let Err(err) = validate_dimensions(width, height) {
            return Ok(LabelFile::Unconvertible(err));
        }

        let mut text = String::new();
        let mut classes = Vec::new();
        for ann in self.store.annotations_for(image.id, self.category_ids) {
            let dense = self.index.to_dense(ann.category_id)?;
            let norm = match normalize(&ann.bbox, width, height) {
                Ok(norm) => norm,
                Err(err) => return Ok(LabelFile::Unconvertible(err)),
            };
            // Writing into a String cannot fail.
            let _ = writeln!(text, "{} {}", dense, norm.to_label_fields());
            classes.push(dense);
        }
        Ok(LabelFile::Ready { text, classes })
    }

    fn retrieve(&self, image: &ImageRecord) -> Result<Vec<u8>, StoreError> {
        let bytes = self.fetcher.fetch(image)?;
        ensure_image_payload(&image.remote_locator, &bytes)?;
        Ok(bytes)
    }
}

/// Why storing an image and its label failed.
enum StoreError {
    /// The image could not be obtained or written; counted, not fatal.
    Retrieval(RetrievalError),
    /// The label file could not be written; aborts the run.
    Label(std::io::Error),
}

impl From<RetrievalError> for StoreError {
    fn from(err: RetrievalError) -> Self {
        StoreError::Retrieval(err)
    }
}

/// Keeps the first record (in ascending id order) claiming each image or
/// label path and drops the rest, returning how many were dropped.
///
/// `a.jpg` and `a.png` share `a.txt`; duplicate file names share both.
fn claim_output_paths(
    images: Vec<ImageRecord>,
    layout: &OutputLayout,
) -> (Vec<ImageRecord>, usize) {
    let mut claimed = BTreeSet::new();
    let mut conflicts = 0;
    let kept = images
        .into_iter()
        .filter(|image| {
            let image_path = layout.image_path(image);
            let label_path = layout.label_path(image);
            if claimed.contains(&image_path) || claimed.contains(&label_path) {
                log::error!(
                    "image {} ({}): output path {} is used by another image; skipping",
                    image.id,
                    image.file_name,
                    label_path.display()
                );
                conflicts += 1;
                return false;
            }
            claimed.insert(image_path);
            claimed.insert(label_path);
            true
        })
        .collect();
    (kept, conflicts)
}

/// Stores a freshly retrieved image together with its label file.
///
/// Both are staged as `.part` files; the label is moved into place first,
/// so a failure at any step leaves either both files or no image.
fn store_pair(
    image_path: &Path,
    bytes: &[u8],
    label_path: &Path,
    label_text: &str,
) -> Result<(), StoreError> {
    let label_tmp = part_path(label_path);
    fs::write(&label_tmp, label_text).map_err(StoreError::Label)?;

    let image_tmp = part_path(image_path);
    let image_error = |source| {
        StoreError::Retrieval(RetrievalError::Io {
            locator: image_path.display().to_string(),
            source,
        })
    };
    if let Err(source) = fs::write(&image_tmp, bytes) {
        let _ = fs::remove_file(&image_tmp);
        let _ = fs::remove_file(&label_tmp);
        return Err(image_error(source));
    }

    if let Err(source) = fs::rename(&label_tmp, label_path) {
        let _ = fs::remove_file(&image_tmp);
        let _ = fs::remove_file(&label_tmp);
        return Err(StoreError::Label(source));
    }

    fs::rename(&image_tmp, image_path).map_err(|source| {
        let _ = fs::remove_file(&image_tmp);
        let _ = fs::remove_file(label_path);
        image_error(source)
    })
}

/// Writes `bytes` to a sibling temporary file and renames it into place, so
/// an interrupted run never leaves a truncated file behind.
fn write_new_file(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = part_path(dest);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, dest).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

/// `dir/name` becomes `dir/.name.part`.
fn part_path(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{file_name}.part"))
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
