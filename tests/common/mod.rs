#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// A small COCO instances file.
///
/// Categories: person(1), bicycle(2), car(3), dog(18).
/// - image 1 `000000000001.jpg` 100x200: car, dog
/// - image 2 `000000000002.png` 64x48: person, bicycle, person
/// - image 3 `000000000003.jpg` 50x50: dog only
/// - image 4 `000000000004.jpg` 0x0: car (unusable dimensions)
pub const SAMPLE_COCO: &str = r#"{
  "info": {"description": "cocoslice fixture"},
  "images": [
    {"id": 1, "file_name": "000000000001.jpg", "width": 100, "height": 200,
     "coco_url": "http://images.invalid/000000000001.jpg"},
    {"id": 2, "file_name": "000000000002.png", "width": 64, "height": 48,
     "coco_url": "http://images.invalid/000000000002.png"},
    {"id": 3, "file_name": "000000000003.jpg", "width": 50, "height": 50,
     "coco_url": "http://images.invalid/000000000003.jpg"},
    {"id": 4, "file_name": "000000000004.jpg", "width": 0, "height": 0,
     "coco_url": "http://images.invalid/000000000004.jpg"}
  ],
  "categories": [
    {"id": 1, "name": "person", "supercategory": "person"},
    {"id": 2, "name": "bicycle", "supercategory": "vehicle"},
    {"id": 3, "name": "car", "supercategory": "vehicle"},
    {"id": 18, "name": "dog", "supercategory": "animal"}
  ],
  "annotations": [
    {"id": 10, "image_id": 1, "category_id": 3, "bbox": [10, 20, 30, 40], "iscrowd": 0},
    {"id": 11, "image_id": 1, "category_id": 18, "bbox": [0, 0, 5, 5], "iscrowd": 0},
    {"id": 20, "image_id": 2, "category_id": 1, "bbox": [0, 0, 32, 24], "iscrowd": 0},
    {"id": 21, "image_id": 2, "category_id": 2, "bbox": [16, 12, 16, 12], "iscrowd": 0},
    {"id": 22, "image_id": 2, "category_id": 1, "bbox": [32, 24, 32, 24], "iscrowd": 0},
    {"id": 30, "image_id": 3, "category_id": 18, "bbox": [1, 1, 10, 10], "iscrowd": 0},
    {"id": 40, "image_id": 4, "category_id": 3, "bbox": [1, 1, 10, 10], "iscrowd": 0}
  ]
}"#;

pub fn write_sample_coco(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, SAMPLE_COCO).expect("write coco fixture");
}

/// Writes every fixture image into `dir` and returns `dir`.
pub fn write_sample_images(dir: &Path) -> PathBuf {
    for (name, w, h) in [
        ("000000000001.jpg", 100, 200),
        ("000000000002.png", 64, 48),
        ("000000000003.jpg", 50, 50),
        ("000000000004.jpg", 1, 1),
    ] {
        write_bmp(&dir.join(name), w, h);
    }
    dir.to_path_buf()
}

pub fn targets(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
