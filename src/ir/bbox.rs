//! Bounding box types and the pixel -> normalized conversion.
//!
//! Source annotations carry COCO-style `[x, y, width, height]` boxes in
//! absolute pixels with `(x, y)` at the top-left corner. Label files carry
//! YOLO-style `(x_center, y_center, width, height)` boxes as fractions of the
//! image size.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An axis-aligned box in absolute pixel coordinates (top-left + size).
///
/// Like the rest of the IR this type is permissive: negative sizes and
/// out-of-image boxes are representable and pass through unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BBoxXYWH {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBoxXYWH {
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from a COCO `bbox` array.
    #[inline]
    pub fn from_coco(bbox: [f64; 4]) -> Self {
        let [x, y, w, h] = bbox;
        Self::new(x, y, w, h)
    }
}

/// A center-relative box normalized by the image dimensions.
///
/// Values are nominally in `[0, 1]` but are never clamped: annotations that
/// touch or cross the image border produce values slightly outside it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBBox {
    #[inline]
    pub fn new(x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
        Self {
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Formats the box as the four trailing fields of a YOLO label line.
    pub fn to_label_fields(&self) -> String {
        format!(
            "{:.6} {:.6} {:.6} {:.6}",
            self.x_center, self.y_center, self.width, self.height
        )
    }
}

/// Errors raised while converting a box between coordinate spaces.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum BBoxError {
    #[error("invalid image dimensions {width}x{height}; both must be positive")]
    InvalidDimension { width: f64, height: f64 },
}

/// Checks that image dimensions can be used as normalization divisors.
pub fn validate_dimensions(image_width: f64, image_height: f64) -> Result<(), BBoxError> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if valid(image_width) && valid(image_height) {
        Ok(())
    } else {
        Err(BBoxError::InvalidDimension {
            width: image_width,
            height: image_height,
        })
    }
}

/// Converts an absolute pixel box to a normalized center box.
///
/// # Errors
/// Returns [`BBoxError::InvalidDimension`] unless both image dimensions are
/// finite and strictly positive.
pub fn normalize(
    bbox: &BBoxXYWH,
    image_width: f64,
    image_height: f64,
) -> Result<NormalizedBBox, BBoxError> {
    validate_dimensions(image_width, image_height)?;

    Ok(NormalizedBBox {
        x_center: (bbox.x + bbox.width / 2.0) / image_width,
        y_center: (bbox.y + bbox.height / 2.0) / image_height,
        width: bbox.width / image_width,
        height: bbox.height / image_height,
    })
}

/// Inverse of [`normalize`] for the same image dimensions.
pub fn denormalize(
    bbox: &NormalizedBBox,
    image_width: f64,
    image_height: f64,
) -> Result<BBoxXYWH, BBoxError> {
    validate_dimensions(image_width, image_height)?;

    let width = bbox.width * image_width;
    let height = bbox.height * image_height;
    Ok(BBoxXYWH {
        x: bbox.x_center * image_width - width / 2.0,
        y: bbox.y_center * image_height - height / 2.0,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn normalize_matches_reference_values() {
        let bbox = BBoxXYWH::new(10.0, 20.0, 30.0, 40.0);
        let norm = normalize(&bbox, 100.0, 200.0).expect("valid dims");

        assert_close(norm.x_center, 0.25);
        assert_close(norm.y_center, 0.20);
        assert_close(norm.width, 0.30);
        assert_close(norm.height, 0.20);
    }

    #[test]
    fn normalize_does_not_clamp_out_of_bounds_boxes() {
        let bbox = BBoxXYWH::new(90.0, -5.0, 20.0, 10.0);
        let norm = normalize(&bbox, 100.0, 100.0).expect("valid dims");

        assert_close(norm.x_center, 1.0);
        assert_close(norm.y_center, 0.0);
        assert!(norm.x_center + norm.width / 2.0 > 1.0);
    }

    #[test]
    fn normalize_rejects_non_positive_dimensions() {
        let bbox = BBoxXYWH::new(0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            normalize(&bbox, 0.0, 100.0),
            Err(BBoxError::InvalidDimension { .. })
        ));
        assert!(matches!(
            normalize(&bbox, 100.0, -1.0),
            Err(BBoxError::InvalidDimension { .. })
        ));
        assert!(normalize(&bbox, f64::NAN, 100.0).is_err());
    }

    #[test]
    fn denormalize_inverts_normalize() {
        let bbox = BBoxXYWH::new(12.5, 7.0, 33.0, 41.25);
        let norm = normalize(&bbox, 640.0, 480.0).unwrap();
        let back = denormalize(&norm, 640.0, 480.0).unwrap();

        assert_close(back.x, bbox.x);
        assert_close(back.y, bbox.y);
        assert_close(back.width, bbox.width);
        assert_close(back.height, bbox.height);
    }

    #[test]
    fn label_fields_use_six_decimals() {
        let norm = NormalizedBBox::new(0.25, 0.2, 0.3, 0.2);
        assert_eq!(norm.to_label_fields(), "0.250000 0.200000 0.300000 0.200000");
    }
}
