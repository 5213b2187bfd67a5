//! Criterion microbenches for cocoslice hot paths.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - COCO JSON parsing (from_coco_str)
//! - box normalization and label line rendering
//! - annotation store queries
//! - label aggregator merges

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use cocoslice::ir::io_coco_json::from_coco_str;
use cocoslice::ir::{
    normalize, Annotation, BBoxXYWH, Category, CategoryId, Dataset, ImageId, ImageRecord,
};
use cocoslice::stats::LabelAggregator;
use cocoslice::store::{AnnotationStore, DatasetStore};

const CLASS_NAMES: [&str; 5] = ["person", "bicycle", "car", "dog", "bus"];

/// A synthetic dataset with `images` images and four boxes per image.
fn synthetic_dataset(images: u64) -> Dataset {
    let categories = CLASS_NAMES
        .iter()
        .enumerate()
        .map(|(idx, name)| Category::new(idx as u64 + 1, *name))
        .collect();

    let mut annotations = Vec::new();
    let images = (1..=images)
        .map(|id| {
            for k in 0..4u64 {
                annotations.push(Annotation::new(
                    id * 10 + k,
                    id,
                    (id + k) % 5 + 1,
                    BBoxXYWH::new(k as f64 * 10.0, 5.0, 40.0, 30.0),
                ));
            }
            ImageRecord::new(id, format!("{id:012}.jpg"), 640, 480)
        })
        .collect();

    Dataset {
        images,
        categories,
        annotations,
    }
}

fn coco_fixture(images: u64) -> String {
    let dataset = synthetic_dataset(images);
    let images: Vec<_> = dataset
        .images
        .iter()
        .map(|img| {
            serde_json::json!({
                "id": img.id.as_u64(),
                "file_name": img.file_name,
                "width": img.width,
                "height": img.height,
                "coco_url": format!("http://images.cocodataset.org/val2017/{}", img.file_name),
            })
        })
        .collect();
    let categories: Vec<_> = dataset
        .categories
        .iter()
        .map(|c| serde_json::json!({"id": c.id.as_u64(), "name": c.name}))
        .collect();
    let annotations: Vec<_> = dataset
        .annotations
        .iter()
        .map(|a| {
            serde_json::json!({
                "id": a.id.as_u64(),
                "image_id": a.image_id.as_u64(),
                "category_id": a.category_id.as_u64(),
                "bbox": [a.bbox.x, a.bbox.y, a.bbox.width, a.bbox.height],
            })
        })
        .collect();

    serde_json::json!({
        "images": images,
        "categories": categories,
        "annotations": annotations,
    })
    .to_string()
}

/// Benchmark COCO JSON parsing from string.
fn bench_coco_parse(c: &mut Criterion) {
    let fixture = coco_fixture(500);
    let mut group = c.benchmark_group("coco_parse");
    group.throughput(Throughput::Bytes(fixture.len() as u64));

    group.bench_function("from_coco_str", |b| {
        b.iter(|| {
            let ds = from_coco_str(black_box(&fixture)).unwrap();
            black_box(ds)
        })
    });

    group.finish();
}

/// Benchmark normalization plus label line formatting.
fn bench_label_lines(c: &mut Criterion) {
    let boxes: Vec<BBoxXYWH> = (0..1000)
        .map(|i| BBoxXYWH::new(i as f64 % 600.0, 12.5, 33.0, 41.25))
        .collect();
    let mut group = c.benchmark_group("labels");
    group.throughput(Throughput::Elements(boxes.len() as u64));

    group.bench_function("normalize_and_format", |b| {
        b.iter(|| {
            let mut out = String::with_capacity(boxes.len() * 40);
            for bbox in &boxes {
                let norm = normalize(black_box(bbox), 640.0, 480.0).unwrap();
                out.push_str("0 ");
                out.push_str(&norm.to_label_fields());
                out.push('\n');
            }
            black_box(out)
        })
    });

    group.finish();
}

/// Benchmark the queries the extraction pipeline issues.
fn bench_store_queries(c: &mut Criterion) {
    let store = DatasetStore::new(synthetic_dataset(2000));
    let ids = [CategoryId::new(1), CategoryId::new(2), CategoryId::new(3)];
    let mut group = c.benchmark_group("store");

    group.bench_function("images_containing", |b| {
        b.iter(|| black_box(store.images_containing(black_box(&ids))))
    });

    group.bench_function("annotations_for", |b| {
        b.iter(|| {
            for id in 1..=200u64 {
                black_box(store.annotations_for(ImageId::new(id), &ids));
            }
        })
    });

    group.finish();
}

/// Benchmark merging per-worker label tallies.
fn bench_aggregator_merge(c: &mut Criterion) {
    let partials: Vec<LabelAggregator> = (0..16)
        .map(|w| {
            (0..500)
                .map(|i| CLASS_NAMES[(i + w) % CLASS_NAMES.len()])
                .collect()
        })
        .collect();
    let mut group = c.benchmark_group("aggregator");
    group.throughput(Throughput::Elements(partials.len() as u64));

    group.bench_function("merge_partials", |b| {
        b.iter(|| {
            let merged = partials
                .iter()
                .fold(LabelAggregator::new(), |acc, p| acc.merge(black_box(p)));
            black_box(merged)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_coco_parse,
    bench_label_lines,
    bench_store_queries,
    bench_aggregator_merge
);
criterion_main!(benches);
