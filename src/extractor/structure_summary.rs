use crate::error::ExportError;
use crate::export::{ExportSink, export_records};
use crate::git::{CommitData, TreeFile};
use crate::types::StructureSummary;

/// Aggregates tree sizes over the walked history into a single row
#[derive(Debug)]
pub struct StructureSummaryExtractor {
    summary: StructureSummary,
    /// Full id of the commit HEAD resolved to for the current run
    head: Option<String>,
}

impl StructureSummaryExtractor {
    pub fn new(repository_name: &str) -> Self {
        Self {
            summary: StructureSummary {
                repository_name: repository_name.to_string(),
                ..StructureSummary::default()
            },
            head: None,
        }
    }

    pub fn set_head(&mut self, head: &str) {
        self.head = Some(head.to_string());
    }

    /// Fold one commit's tree into the summary
    pub fn consume(&mut self, commit: &CommitData, tree: &[TreeFile]) -> usize {
        let is_head = self.head.as_deref() == Some(commit.hash.as_str());
        self.summary.add_file_count(tree.len() as u64, is_head);
        tree.len()
    }

    /// Count a commit whose tree could not be enumerated
    pub fn skip(&mut self) {
        self.summary.add_skipped();
    }

    pub fn summary(&self) -> &StructureSummary {
        &self.summary
    }

    pub fn reset(&mut self) {
        self.summary = StructureSummary {
            repository_name: std::mem::take(&mut self.summary.repository_name),
            ..StructureSummary::default()
        };
        self.head = None;
    }

    /// Always one row, even for an empty history
    pub fn rows(&self) -> usize {
        1
    }

    pub fn export(&self, sink: &dyn ExportSink) -> Result<usize, ExportError> {
        export_records(sink, std::slice::from_ref(&self.summary))
    }
}
