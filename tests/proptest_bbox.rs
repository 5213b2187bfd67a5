use cocoslice::ir::{denormalize, normalize};
use proptest::prelude::*;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn normalize_then_denormalize_restores_pixels(
        (dims, bbox) in proptest_helpers::arb_image_dims()
            .prop_flat_map(|(w, h)| (Just((w, h)), proptest_helpers::arb_bbox_near(w, h)))
    ) {
        let (w, h) = (dims.0 as f64, dims.1 as f64);
        let norm = normalize(&bbox, w, h).expect("positive dims");
        let back = denormalize(&norm, w, h).expect("positive dims");

        let eps = w.max(h) * 1e-9;
        prop_assert!((back.x - bbox.x).abs() <= eps, "x: {} vs {}", back.x, bbox.x);
        prop_assert!((back.y - bbox.y).abs() <= eps, "y: {} vs {}", back.y, bbox.y);
        prop_assert!((back.width - bbox.width).abs() <= eps);
        prop_assert!((back.height - bbox.height).abs() <= eps);
    }

    #[test]
    fn normalized_size_is_fraction_of_image(
        (dims, bbox) in proptest_helpers::arb_image_dims()
            .prop_flat_map(|(w, h)| (Just((w, h)), proptest_helpers::arb_bbox_near(w, h)))
    ) {
        let norm = normalize(&bbox, dims.0 as f64, dims.1 as f64).expect("positive dims");
        prop_assert!(norm.width >= 0.0 && norm.width <= 1.1 + 1e-9);
        prop_assert!(norm.height >= 0.0 && norm.height <= 1.1 + 1e-9);
    }

    #[test]
    fn non_positive_dimensions_always_fail(w in -100.0f64..=0.0, h in 1.0f64..1000.0) {
        let bbox = cocoslice::ir::BBoxXYWH::new(0.0, 0.0, 1.0, 1.0);
        prop_assert!(normalize(&bbox, w, h).is_err());
        prop_assert!(normalize(&bbox, h, w).is_err());
    }
}
