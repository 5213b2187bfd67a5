use std::path::PathBuf;
use thiserror::Error;

use crate::classes::ClassIndexError;

/// The main error type for cocoslice operations.
///
/// Every variant is a setup-level failure: it aborts the run before (or
/// instead of) any per-image work. Per-image problems are reported through
/// [`crate::fetch::RetrievalError`] and [`crate::ir::BBoxError`] and end up
/// as counts in the extraction report.
#[derive(Debug, Error)]
pub enum CocosliceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Annotation file not found: {path}")]
    AnnotationsNotFound { path: PathBuf },

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown class '{0}': no category with this name in the annotation source")]
    UnknownClass(String),

    #[error("Ambiguous class '{name}': {count} categories share this name")]
    AmbiguousClass { name: String, count: usize },

    #[error(transparent)]
    ClassIndex(#[from] ClassIndexError),

    #[error("Output directory {path} is not writable: {source}")]
    OutputNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write dataset descriptor to {path}: {source}")]
    DescriptorWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize report as JSON: {0}")]
    ReportJson(#[from] serde_json::Error),

    #[error("Invalid label tree at {path}: {message}")]
    LabelTreeInvalid { path: PathBuf, message: String },

    #[error("Failed to parse label file {path} at line {line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("None of the {0} statistics source(s) could be loaded")]
    NoUsableSources(usize),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}
