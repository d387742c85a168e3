//! Canonical row types produced by extraction
//!
//! Every row type is a plain owned value. Columnar conversion lives in
//! [`crate::export::records`], so nothing here depends on Arrow.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default length of shortened hashes used as cross-table join keys
pub const DEFAULT_HASH_LENGTH: usize = 12;

/// Length of a full hex-encoded SHA-1 object id
pub const FULL_HASH_LENGTH: usize = 40;

/// Shorten a hex object id to a fixed-length prefix.
///
/// Returns the whole string when it is shorter than `len`. Prefix collisions
/// are not detected.
pub fn shorten_hash(hash: &str, len: usize) -> String {
    hash.get(..len).unwrap_or(hash).to_string()
}

/// Granularity at which an extractor produces rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationalLevel {
    /// Rows are produced per visited commit
    Commit,
    /// Rows summarize the whole walked history
    Repository,
}

impl OperationalLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationalLevel::Commit => "commit",
            OperationalLevel::Repository => "repository",
        }
    }
}

impl fmt::Display for OperationalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit in the commit DAG.
///
/// Identity is `(repository_name, commit_hash)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitVertex {
    /// Repository the commit was mined from
    pub repository_name: String,
    /// Shortened commit hash
    pub commit_hash: String,
    pub author_name: String,
    pub author_mail: String,
    /// Author timestamp (Unix epoch seconds)
    pub author_timestamp: i64,
    pub committer_name: String,
    pub committer_mail: String,
    /// Committer timestamp (Unix epoch seconds)
    pub committer_timestamp: i64,
    /// Full commit message
    pub commit_message: String,
}

/// A directed child -> parent arc in the commit DAG
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitEdge {
    /// Shortened hash of the child commit
    pub commit_hash: String,
    /// Shortened hash of the parent commit
    pub parent_commit_hash: String,
    /// Position of the parent in the child's parent list (0 = first parent)
    pub parent_index: u32,
}

impl CommitEdge {
    /// Build one edge per parent, in parent order
    pub fn from_parents<S: AsRef<str>>(commit_hash: &str, parents: &[S]) -> Vec<CommitEdge> {
        parents
            .iter()
            .enumerate()
            .map(|(index, parent)| CommitEdge {
                commit_hash: commit_hash.to_string(),
                parent_commit_hash: parent.as_ref().to_string(),
                parent_index: index as u32,
            })
            .collect()
    }
}

/// One file present in a commit's full tree snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileContentVertex {
    /// Shortened hash of the commit whose tree contains the file
    pub commit_hash: String,
    /// Shortened hash of the blob
    pub object_hash: String,
    /// Full path of the file inside the tree
    pub file_name: String,
    /// Blob size in bytes
    pub file_size: i64,
}

/// File-count statistics accumulated across a walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureSummary {
    pub repository_name: String,
    /// Commits whose tree was counted
    pub commits_visited: u64,
    /// Commits whose tree could not be enumerated
    pub commits_skipped: u64,
    /// Sum of per-commit file counts
    pub total_file_count: u64,
    /// Largest single-commit file count
    pub max_file_count: u64,
    /// File count of the commit HEAD resolves to, 0 when its tree was skipped
    pub head_file_count: u64,
}

impl StructureSummary {
    /// Feed one commit's file count into the accumulator
    pub fn add_file_count(&mut self, count: u64, is_head: bool) {
        if is_head {
            self.head_file_count = count;
        }
        self.commits_visited += 1;
        self.total_file_count += count;
        self.max_file_count = self.max_file_count.max(count);
    }

    /// Record a commit whose tree could not be counted
    pub fn add_skipped(&mut self) {
        self.commits_skipped += 1;
    }
}

/// Description of one column of an exported dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Descriptive record about one dataset an extractor produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Dataset name, e.g. `commit-vertices`
    pub name: String,
    /// Name of the extractor producing the dataset
    pub extractor: String,
    /// Export target, e.g. `data/commit-vertices.parquet`
    pub output: String,
    pub operational_level: OperationalLevel,
    pub schema: Vec<FieldMeta>,
}
