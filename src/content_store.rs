//! Content store receiving file blobs copied during file-inventory extraction

use crate::error::ExtractionError;
use crate::git::{CommitSource, TreeFile};
use std::fs;
use std::path::{Path, PathBuf};

/// Destination for file contents seen while enumerating commit trees
pub trait ContentStore: Send + Sync {
    /// Copy one file of `commit` from `source` into the store
    fn store(
        &self,
        commit: &str,
        file: &TreeFile,
        source: &dyn CommitSource,
    ) -> Result<(), ExtractionError>;
}

/// Store that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullContentStore;

impl ContentStore for NullContentStore {
    fn store(&self, _: &str, _: &TreeFile, _: &dyn CommitSource) -> Result<(), ExtractionError> {
        Ok(())
    }
}

/// Content-addressed directory store.
///
/// Each blob is written once to `<root>/<first two hex chars>/<remaining hex>`.
/// Blobs shared between commits are not rewritten.
#[derive(Debug, Clone)]
pub struct DirectoryContentStore {
    root: PathBuf,
}

impl DirectoryContentStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a blob inside the store
    pub fn object_path(&self, object_hash: &str) -> PathBuf {
        if object_hash.len() > 2 {
            self.root.join(&object_hash[..2]).join(&object_hash[2..])
        } else {
            self.root.join(object_hash)
        }
    }
}

impl ContentStore for DirectoryContentStore {
    fn store(
        &self,
        commit: &str,
        file: &TreeFile,
        source: &dyn CommitSource,
    ) -> Result<(), ExtractionError> {
        let path = self.object_path(&file.hash);
        if path.exists() {
            return Ok(());
        }

        let copy_failed = |reason: String| ExtractionError::ContentCopy {
            commit: commit.to_string(),
            object: file.hash.clone(),
            reason,
        };

        let content = source
            .read_blob(&file.hash)
            .map_err(|e| copy_failed(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| copy_failed(e.to_string()))?;
        }

        // The final name only ever holds complete blobs
        let partial = path.with_extension("partial");
        fs::write(&partial, &content).map_err(|e| copy_failed(e.to_string()))?;
        fs::rename(&partial, &path).map_err(|e| copy_failed(e.to_string()))?;

        tracing::trace!("Stored {} ({} bytes)", file.name, content.len());
        Ok(())
    }
}
