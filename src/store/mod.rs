//! Annotation store: the typed query surface the extraction pipeline needs.
//!
//! The pipeline never reaches into a loaded dataset directly. It asks an
//! [`AnnotationStore`] three questions (which categories do these names mean,
//! which images contain them, which of their annotations belong to an image)
//! so alternative backends can be swapped in without touching the pipeline.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use crate::error::CocosliceError;
use crate::ir::io_coco_json::read_coco_json;
use crate::ir::{Annotation, Category, CategoryId, Dataset, ImageId, ImageRecord};

/// Read-only query interface over an annotation source.
pub trait AnnotationStore: Send + Sync {
    /// Resolves each name to exactly one category, in request order.
    ///
    /// Duplicate names are resolved once.
    fn resolve_categories(&self, names: &[String]) -> Result<Vec<Category>, CocosliceError>;

    /// Images with at least one annotation in `category_ids`, ordered by
    /// ascending image id.
    fn images_containing(&self, category_ids: &[CategoryId]) -> Vec<ImageRecord>;

    /// Annotations of `image_id` whose category is in `category_ids`, in
    /// source order.
    fn annotations_for(&self, image_id: ImageId, category_ids: &[CategoryId]) -> Vec<Annotation>;
}

/// An [`AnnotationStore`] backed by an in-memory [`Dataset`].
#[derive(Debug)]
pub struct DatasetStore {
    dataset: Dataset,
    image_index: BTreeMap<ImageId, usize>,
    annotations_by_image: BTreeMap<ImageId, Vec<usize>>,
    categories_by_name: HashMap<String, Vec<usize>>,
}

impl DatasetStore {
    pub fn new(dataset: Dataset) -> Self {
        let image_index = dataset
            .images
            .iter()
            .enumerate()
            .map(|(idx, img)| (img.id, idx))
            .collect();

        let mut annotations_by_image: BTreeMap<ImageId, Vec<usize>> = BTreeMap::new();
        for (idx, ann) in dataset.annotations.iter().enumerate() {
            annotations_by_image.entry(ann.image_id).or_default().push(idx);
        }

        let mut categories_by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, cat) in dataset.categories.iter().enumerate() {
            categories_by_name
                .entry(cat.name.clone())
                .or_default()
                .push(idx);
        }

        Self {
            dataset,
            image_index,
            annotations_by_image,
            categories_by_name,
        }
    }

    /// Loads a COCO annotation file and indexes it.
    pub fn open_coco(path: &Path) -> Result<Self, CocosliceError> {
        let dataset = read_coco_json(path)?;
        log::info!(
            "Loaded {} images, {} categories, {} annotations from {}",
            dataset.images.len(),
            dataset.categories.len(),
            dataset.annotations.len(),
            path.display()
        );
        Ok(Self::new(dataset))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn image(&self, id: ImageId) -> Option<&ImageRecord> {
        self.image_index.get(&id).map(|&idx| &self.dataset.images[idx])
    }
}

impl AnnotationStore for DatasetStore {
    fn resolve_categories(&self, names: &[String]) -> Result<Vec<Category>, CocosliceError> {
        let mut seen = BTreeSet::new();
        let mut resolved = Vec::with_capacity(names.len());

        for name in names {
            if !seen.insert(name.as_str()) {
                continue;
            }

            match self.categories_by_name.get(name).map(Vec::as_slice) {
                Some([idx]) => resolved.push(self.dataset.categories[*idx].clone()),
                Some(many) if many.len() > 1 => {
                    return Err(CocosliceError::AmbiguousClass {
                        name: name.clone(),
                        count: many.len(),
                    });
                }
                _ => return Err(CocosliceError::UnknownClass(name.clone())),
            }
        }

        Ok(resolved)
    }

    fn images_containing(&self, category_ids: &[CategoryId]) -> Vec<ImageRecord> {
        let wanted: BTreeSet<CategoryId> = category_ids.iter().copied().collect();

        let matching: BTreeSet<ImageId> = self
            .dataset
            .annotations
            .iter()
            .filter(|ann| wanted.contains(&ann.category_id))
            .map(|ann| ann.image_id)
            .collect();

        matching
            .into_iter()
            .filter_map(|id| {
                let image = self.image(id);
                if image.is_none() {
                    log::debug!("annotation references unknown image {id}; ignoring");
                }
                image.cloned()
            })
            .collect()
    }

    fn annotations_for(&self, image_id: ImageId, category_ids: &[CategoryId]) -> Vec<Annotation> {
        let Some(indices) = self.annotations_by_image.get(&image_id) else {
            return Vec::new();
        };

        indices
            .iter()
            .map(|&idx| &self.dataset.annotations[idx])
            .filter(|ann| category_ids.contains(&ann.category_id))
            .cloned()
            .collect()
    }
}
