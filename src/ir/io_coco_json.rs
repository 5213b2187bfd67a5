//! COCO JSON reader.
//!
//! Reads the official `instances_<split>.json` and
//! `person_keypoints_<split>.json` annotation files. Fields the pipeline has
//! no use for (segmentation polygons, keypoints, licenses) are ignored
//! during deserialization.
//!
//! COCO bounding boxes use `[x, y, width, height]` with `(x, y)` the
//! top-left corner in absolute pixels, which is exactly [`BBoxXYWH`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use super::model::{Annotation, Category, Dataset, ImageRecord};
use super::{AnnotationId, BBoxXYWH, CategoryId, ImageId};
use crate::error::CocosliceError;

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

#[derive(Debug, Deserialize)]
struct CocoDataset {
    #[serde(default)]
    images: Vec<CocoImage>,

    #[serde(default)]
    annotations: Vec<CocoAnnotation>,

    categories: Vec<CocoCategory>,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: u64,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    file_name: String,

    #[serde(default)]
    coco_url: Option<String>,

    #[serde(default)]
    flickr_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u64,

    /// [x, y, width, height] with (x, y) as top-left corner
    bbox: [f64; 4],
}

// ============================================================================
// Public API
// ============================================================================

/// Reads an annotation source from a COCO JSON file.
///
/// # Errors
/// Returns [`CocosliceError::AnnotationsNotFound`] when the file does not
/// exist and [`CocosliceError::CocoJsonParse`] when it is not valid COCO.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use cocoslice::ir::io_coco_json::read_coco_json;
///
/// let dataset = read_coco_json(Path::new("annotations/instances_val2017.json"))?;
/// # Ok::<(), cocoslice::CocosliceError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<Dataset, CocosliceError> {
    if !path.is_file() {
        return Err(CocosliceError::AnnotationsNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(CocosliceError::Io)?;
    let reader = BufReader::new(file);

    let coco: CocoDataset =
        serde_json::from_reader(reader).map_err(|source| CocosliceError::CocoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(coco_to_ir(coco))
}

/// Reads an annotation source from a COCO JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<Dataset, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_str(json)?;
    Ok(coco_to_ir(coco))
}

// ============================================================================
// Conversion: COCO -> IR
// ============================================================================

fn coco_to_ir(coco: CocoDataset) -> Dataset {
    let images = coco
        .images
        .into_iter()
        .map(|img| {
            // Prefer the COCO mirror; Flickr links are frequently dead.
            let locator = img
                .coco_url
                .filter(|url| !url.is_empty())
                .or(img.flickr_url)
                .unwrap_or_default();

            ImageRecord::new(ImageId::new(img.id), img.file_name, img.width, img.height)
                .with_locator(locator)
        })
        .collect();

    let categories = coco
        .categories
        .into_iter()
        .map(|cat| Category::new(CategoryId::new(cat.id), cat.name))
        .collect();

    let annotations = coco
        .annotations
        .into_iter()
        .map(|ann| {
            Annotation::new(
                AnnotationId::new(ann.id),
                ImageId::new(ann.image_id),
                CategoryId::new(ann.category_id),
                BBoxXYWH::from_coco(ann.bbox),
            )
        })
        .collect();

    Dataset {
        images,
        categories,
        annotations,
    }
}

// ============================================================================
// Tests
// ============================================================================
