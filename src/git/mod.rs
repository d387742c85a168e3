//! Repository provider: read-only access to commit history and tree snapshots
//!
//! The engine only talks to [`CommitSource`]. [`GitRepository`] is the
//! libgit2-backed implementation that clones or opens a repository.

/// libgit2-backed repository acquisition and history walking
pub mod walker;

pub use walker::GitRepository;

use crate::error::GitError;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Lazy, finite sequence of commits produced by [`CommitSource::log`]
pub type CommitIter<'a> = Box<dyn Iterator<Item = Result<CommitData, GitError>> + 'a>;

/// Name, email and time of a commit author or committer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Unix epoch seconds
    pub when: i64,
}

/// Owned view of one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitData {
    /// Full hex commit id (40 characters)
    pub hash: String,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
    /// Full hex ids of the parents, in parent order
    pub parent_hashes: Vec<String>,
    /// Full hex id of the root tree
    pub tree_hash: String,
}

/// One blob in a commit's full tree snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    /// Full path inside the tree, `/`-separated
    pub name: String,
    /// Full hex blob id
    pub hash: String,
    /// Blob size in bytes
    pub size: u64,
}

/// Read-only handle over a repository's history
pub trait CommitSource: Send {
    /// Where the repository lives on disk
    fn location(&self) -> &Path;

    /// Full hex id of the commit HEAD points to
    fn head(&self) -> Result<String, GitError>;

    /// Walk every commit reachable from HEAD and all refs, each exactly once.
    ///
    /// The returned sequence is not restartable; call `log` again for a
    /// fresh walk.
    fn log(&self) -> Result<CommitIter<'_>, GitError>;

    /// Enumerate all blobs of the commit's tree.
    ///
    /// Returns [`GitError::Cancelled`] as soon as `cancel` fires.
    fn files(
        &self,
        commit: &CommitData,
        cancel: &CancellationToken,
    ) -> Result<Vec<TreeFile>, GitError>;

    /// Read the raw content of a blob
    fn read_blob(&self, object_hash: &str) -> Result<Vec<u8>, GitError>;
}
