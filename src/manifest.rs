//! Training-tool manifests: `classes.txt` and `dataset.yaml`.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::classes::DenseClassIndex;
use crate::error::CocosliceError;
use crate::split::{Split, SplitRole};

pub const CLASS_LIST_FILE: &str = "classes.txt";
pub const DESCRIPTOR_FILE: &str = "dataset.yaml";

const DESCRIPTOR_HEADER: &str = "# COCO filtered dataset\n";

/// The YOLO dataset descriptor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetDescriptor {
    /// Absolute dataset root.
    pub path: String,
    /// Training image directory, relative to `path`.
    pub train: String,
    /// Validation image directory, relative to `path`.
    pub val: String,
    pub nc: usize,
    /// Class names ordered by dense id.
    pub names: Vec<String>,
}

impl DatasetDescriptor {
    /// Picks the train and val directories from the available splits.
    ///
    /// When only one role is available its directory fills both slots, so a
    /// single extracted split is still a loadable dataset.
    pub fn new(
        root: &Path,
        splits: &[Split],
        class_names: Vec<String>,
    ) -> Result<Self, CocosliceError> {
        let first = splits.first().ok_or_else(|| {
            CocosliceError::InvalidOption("dataset descriptor needs at least one split".into())
        })?;
        let by_role = |role: SplitRole| {
            splits
                .iter()
                .find(|s| s.role() == role)
                .unwrap_or(first)
        };

        Ok(Self {
            path: root.display().to_string(),
            train: image_dir(*by_role(SplitRole::Train)),
            val: image_dir(*by_role(SplitRole::Val)),
            nc: class_names.len(),
            names: class_names,
        })
    }
}

fn image_dir(split: Split) -> String {
    format!("images/{split}")
}

/// Writes one class name per line, ordered by dense id.
pub fn write_class_list(index: &DenseClassIndex, path: &Path) -> Result<(), CocosliceError> {
    let mut content = String::new();
    for name in index.names() {
        content.push_str(&name);
        content.push('\n');
    }
    fs::write(path, content)?;
    log::info!("Class names saved to {}", path.display());
    Ok(())
}

/// Writes `dataset.yaml` for the given splits.
///
/// `root` is written as an absolute path.
pub fn write_dataset_descriptor(
    root: &Path,
    splits: &[Split],
    class_names: Vec<String>,
    path: &Path,
) -> Result<DatasetDescriptor, CocosliceError> {
    let root = fs::canonicalize(root)?;
    let descriptor = DatasetDescriptor::new(&root, splits, class_names)?;

    let yaml = serde_yaml::to_string(&descriptor).map_err(|source| {
        CocosliceError::DescriptorWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, format!("{DESCRIPTOR_HEADER}{yaml}"))?;
    log::info!("Dataset config saved to {}", path.display());

    Ok(descriptor)
}

/// Known splits that already have an image directory under `root`.
pub fn discover_splits(root: &Path) -> Vec<Split> {
    Split::ALL
        .into_iter()
        .filter(|split| root.join("images").join(split.as_str()).is_dir())
        .collect()
}
