//! Typed records for object-detection annotation sources.
//!
//! The types here mirror what a COCO annotation file provides, with newtype
//! ids and explicit pixel vs. normalized box types so the two coordinate
//! spaces cannot be mixed up.
//!
//! # Example
//!
//! ```
//! use cocoslice::ir::{normalize, BBoxXYWH};
//!
//! let norm = normalize(&BBoxXYWH::new(10.0, 20.0, 30.0, 40.0), 100.0, 200.0)?;
//! assert!((norm.x_center - 0.25).abs() < 1e-12);
//! # Ok::<(), cocoslice::ir::BBoxError>(())
//! ```

mod bbox;
mod ids;
pub mod io_coco_json;
mod model;

pub use bbox::{
    denormalize, normalize, validate_dimensions, BBoxError, BBoxXYWH, NormalizedBBox,
};
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{Annotation, Category, Dataset, ImageRecord};
