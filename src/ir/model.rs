//! Core record types read from an annotation source.
//!
//! These are read-only views: the pipeline never mutates them, it only
//! filters, converts and counts.

use serde::{Deserialize, Serialize};

use super::bbox::BBoxXYWH;
use super::ids::{AnnotationId, CategoryId, ImageId};

/// A whole annotation source loaded into memory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub images: Vec<ImageRecord>,

    pub categories: Vec<Category>,

    pub annotations: Vec<Annotation>,
}

/// A category (class label) in the annotation source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    /// Name of the category (e.g. "person", "car", "bicycle").
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// An image known to the annotation source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,

    /// File name relative to the split's image directory.
    pub file_name: String,

    /// Width in pixels. Zero marks a record that cannot be normalized.
    pub width: u32,

    /// Height in pixels. Zero marks a record that cannot be normalized.
    pub height: u32,

    /// Where the image bytes can be retrieved from (usually an HTTP URL).
    #[serde(default)]
    pub remote_locator: String,
}

impl ImageRecord {
    pub fn new(
        id: impl Into<ImageId>,
        file_name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
            remote_locator: String::new(),
        }
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.remote_locator = locator.into();
        self
    }

    /// The label file name: the image file name with its real extension
    /// replaced by `.txt`, whatever that extension is.
    pub fn label_file_name(&self) -> String {
        let path = std::path::Path::new(&self.file_name);
        path.with_extension("txt").to_string_lossy().replace('\\', "/")
    }
}

/// One labeled region attached to an image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,

    pub image_id: ImageId,

    pub category_id: CategoryId,

    /// Bounding box in absolute pixels, COCO `[x, y, w, h]` layout.
    pub bbox: BBoxXYWH,
}

impl Annotation {
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: BBoxXYWH,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox,
        }
    }
}
