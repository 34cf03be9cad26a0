// File Source
// Byte source over a single file on disk, backing file-registered handles

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::Fetch;
use crate::resource::error::FetchError;

/// Serves the bytes of one file, whatever key is asked for
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileSource {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercased file extension, the decoder hint for this file
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }
}

#[async_trait]
impl Fetch for FileSource {
    fn fetch(&self, _key: &str) -> Result<Vec<u8>, FetchError> {
        if !self.path.is_file() {
            return Err(FetchError::Missing(self.path.display().to_string()));
        }
        Ok(fs::read(&self.path)?)
    }
}
