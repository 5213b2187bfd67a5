use std::fs;
use std::path::PathBuf;

use super::{ImageFetcher, RetrievalError};
use crate::ir::ImageRecord;

/// Copies images out of an already-downloaded COCO image folder
/// (e.g. an unpacked `val2017.zip`), looked up by file name.
#[derive(Clone, Debug)]
pub struct LocalDirFetcher {
    root: PathBuf,
}

impl LocalDirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageFetcher for LocalDirFetcher {
    fn fetch(&self, image: &ImageRecord) -> Result<Vec<u8>, RetrievalError> {
        let path = self.root.join(&image.file_name);
        fs::read(&path).map_err(|source| RetrievalError::Io {
            locator: path.display().to_string(),
            source,
        })
    }
}
