use crate::content_store::ContentStore;
use crate::error::{ExportError, ExtractionError};
use crate::export::{ExportSink, export_records};
use crate::git::{CommitData, CommitSource, TreeFile};
use crate::types::{FileContentVertex, shorten_hash};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Lists every file of every commit and copies file contents to a [`ContentStore`]
pub struct FileInventoryExtractor {
    hash_length: usize,
    content_store: Arc<dyn ContentStore>,
    files: Vec<FileContentVertex>,
    processed: usize,
}

impl fmt::Debug for FileInventoryExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileInventoryExtractor")
            .field("hash_length", &self.hash_length)
            .field("files", &self.files.len())
            .field("processed", &self.processed)
            .finish()
    }
}

impl FileInventoryExtractor {
    pub fn new(hash_length: usize, content_store: Arc<dyn ContentStore>) -> Self {
        Self {
            hash_length,
            content_store,
            files: Vec::new(),
            processed: 0,
        }
    }

    /// Record every file of `commit` and copy its content.
    ///
    /// Rows are only kept once every file of the commit went through. When
    /// `cancel` fires midway the commit is dropped and `Ok(0)` returned.
    /// `on_file` receives the running number of processed files.
    pub fn consume(
        &mut self,
        commit: &CommitData,
        tree: &[TreeFile],
        source: &dyn CommitSource,
        cancel: &CancellationToken,
        on_file: &mut dyn FnMut(usize),
    ) -> Result<usize, ExtractionError> {
        let commit_hash = shorten_hash(&commit.hash, self.hash_length);
        let mut rows = Vec::with_capacity(tree.len());

        for file in tree {
            if cancel.is_cancelled() {
                return Ok(0);
            }

            self.content_store.store(&commit.hash, file, source)?;

            rows.push(FileContentVertex {
                commit_hash: commit_hash.clone(),
                object_hash: shorten_hash(&file.hash, self.hash_length),
                file_name: file.name.clone(),
                file_size: i64::try_from(file.size).unwrap_or(i64::MAX),
            });
            on_file(self.processed + rows.len());
        }

        let count = rows.len();
        self.files.append(&mut rows);
        self.processed += count;
        Ok(count)
    }

    pub fn files(&self) -> &[FileContentVertex] {
        &self.files
    }

    /// Files processed since the last reset
    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn reset(&mut self) {
        self.files.clear();
        self.processed = 0;
    }

    pub fn rows(&self) -> usize {
        self.files.len()
    }

    pub fn export(&self, sink: &dyn ExportSink) -> Result<usize, ExportError> {
        export_records(sink, &self.files)
    }
}
