#![allow(dead_code)]

use cocoslice::ir::{BBoxXYWH, Category};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Image dimensions as COCO stores them.
pub fn arb_image_dims() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=8192, 1u32..=8192)
}

/// A box inside (or slightly past the border of) a `width` x `height` image.
pub fn arb_bbox_near(width: u32, height: u32) -> BoxedStrategy<BBoxXYWH> {
    let (w, h) = (width as f64, height as f64);
    (-0.1f64..1.0, -0.1f64..1.0, 0.0f64..1.1, 0.0f64..1.1)
        .prop_map(move |(fx, fy, fw, fh)| BBoxXYWH::new(fx * w, fy * h, fw * w, fh * h))
        .boxed()
}

/// Categories with distinct ids and names.
pub fn arb_categories(max: usize) -> BoxedStrategy<Vec<Category>> {
    proptest::collection::btree_set(1u64..=200, 1..=max)
        .prop_map(|ids| {
            ids.into_iter()
                .map(|id| Category::new(id, format!("class_{id}")))
                .collect()
        })
        .boxed()
}

/// A stream of label events drawn from a small alphabet, so merges overlap.
pub fn arb_label_events(max: usize) -> BoxedStrategy<Vec<String>> {
    proptest::collection::vec(
        prop::sample::select(vec!["car", "person", "bicycle", "dog", "bus"]),
        0..=max,
    )
    .prop_map(|labels| labels.into_iter().map(str::to_string).collect())
    .boxed()
}
