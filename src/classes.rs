//! Dense zero-based class numbering for a selected category subset.
//!
//! Label files refer to classes by position (`0..n`), not by the source's
//! sparse category ids. The index is assigned by ascending original id, so
//! the same selection always produces the same numbering no matter in which
//! order the names were requested or the categories were listed.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::ir::{Category, CategoryId};

/// Classes selected when none are requested explicitly.
pub const DEFAULT_TARGET_CLASSES: [&str; 3] = ["car", "person", "bicycle"];

/// Errors raised while building or querying a [`DenseClassIndex`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClassIndexError {
    #[error("cannot build a class index from an empty selection")]
    EmptySelection,

    #[error("category {0} is not part of the selected classes")]
    UnknownCategory(CategoryId),

    #[error("dense class id {dense} is out of range for {len} class(es)")]
    UnknownDenseId { dense: usize, len: usize },
}

/// Bijection between selected original category ids and dense ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenseClassIndex {
    /// Categories ordered by dense id (= ascending original id).
    categories: Vec<Category>,
    dense_by_original: BTreeMap<CategoryId, usize>,
}

impl DenseClassIndex {
    /// Builds the index for the given categories.
    ///
    /// Duplicate ids collapse into a single entry; the first name seen wins.
    pub fn build<'a>(
        selected: impl IntoIterator<Item = &'a Category>,
    ) -> Result<Self, ClassIndexError> {
        let mut by_id: BTreeMap<CategoryId, &Category> = BTreeMap::new();
        for category in selected {
            by_id.entry(category.id).or_insert(category);
        }

        if by_id.is_empty() {
            return Err(ClassIndexError::EmptySelection);
        }

        let categories: Vec<Category> = by_id.into_values().cloned().collect();
        let dense_by_original = categories
            .iter()
            .enumerate()
            .map(|(dense, cat)| (cat.id, dense))
            .collect();

        Ok(Self {
            categories,
            dense_by_original,
        })
    }

    pub fn to_dense(&self, original: CategoryId) -> Result<usize, ClassIndexError> {
        self.dense_by_original
            .get(&original)
            .copied()
            .ok_or(ClassIndexError::UnknownCategory(original))
    }

    pub fn to_original(&self, dense: usize) -> Result<CategoryId, ClassIndexError> {
        self.category(dense).map(|cat| cat.id)
    }

    pub fn name(&self, dense: usize) -> Result<&str, ClassIndexError> {
        self.category(dense).map(|cat| cat.name.as_str())
    }

    fn category(&self, dense: usize) -> Result<&Category, ClassIndexError> {
        self.categories
            .get(dense)
            .ok_or(ClassIndexError::UnknownDenseId {
                dense,
                len: self.categories.len(),
            })
    }

    /// Class names ordered by dense id.
    pub fn names(&self) -> Vec<String> {
        self.categories.iter().map(|cat| cat.name.clone()).collect()
    }

    /// Original ids ordered by dense id.
    pub fn original_ids(&self) -> Vec<CategoryId> {
        self.categories.iter().map(|cat| cat.id).collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Always false for a successfully built index.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Iterates `(dense_id, original_id)` pairs in dense order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, CategoryId)> + '_ {
        self.categories
            .iter()
            .enumerate()
            .map(|(dense, cat)| (dense, cat.id))
    }
}
