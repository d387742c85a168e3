use super::{CommitData, CommitIter, CommitSource, Signature, TreeFile};
use crate::error::{AcquisitionError, GitError};
use git2::{
    Cred, FetchOptions, ObjectType, Oid, RemoteCallbacks, Repository, Sort, TreeWalkMode,
    TreeWalkResult,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Objects between two clone progress log lines
const PROGRESS_LOG_INTERVAL: usize = 1000;

/// libgit2-backed repository handle
///
/// When the repository was cloned, the clone lives in a temporary directory
/// owned by this value and is removed when it is dropped.
pub struct GitRepository {
    repo: Repository,
    location: PathBuf,
    // Declared after `repo` so the handle is closed before the directory goes away
    _clone_dir: Option<TempDir>,
}

impl GitRepository {
    /// Open an existing repository (bare or with a working directory)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AcquisitionError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|e| AcquisitionError::OpenFailed {
            path: path.display().to_string(),
            reason: e.message().to_string(),
        })?;

        tracing::info!("Opened git repository at: {}", path.display());

        Ok(Self {
            repo,
            location: path.to_path_buf(),
            _clone_dir: None,
        })
    }

    /// Bare-clone a remote repository into a fresh temporary directory.
    ///
    /// With `in_memory` the directory is created on a memory-backed
    /// filesystem when the platform has one. Credentials are taken from
    /// `GIT_USERNAME` / `GIT_PASSWORD` when both are set.
    pub fn clone_remote(
        url: &str,
        name: &str,
        in_memory: bool,
        print_logs: bool,
    ) -> Result<Self, AcquisitionError> {
        let base = if in_memory {
            match crate::paths::PlatformPaths::memory_temp_dir() {
                Some(dir) => {
                    tracing::info!(
                        "Cloning repository into memory. This can speed up extraction, but also requires a lot of \
                         memory for huge repositories. Disable the in-memory option in case of issues."
                    );
                    dir
                }
                None => {
                    tracing::warn!(
                        "No memory-backed filesystem available, cloning to the system temp directory instead"
                    );
                    std::env::temp_dir()
                }
            }
        } else {
            std::env::temp_dir()
        };

        let clone_dir = tempfile::Builder::new()
            .prefix(&format!("{}-", name))
            .tempdir_in(&base)
            .map_err(|e| AcquisitionError::TempDirFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            "Cloning '{}' to '{}'. This directory will be deleted after extraction.",
            url,
            clone_dir.path().display()
        );

        let mut callbacks = RemoteCallbacks::new();
        if let (Ok(user), Ok(pass)) = (std::env::var("GIT_USERNAME"), std::env::var("GIT_PASSWORD"))
        {
            callbacks.credentials(move |_url, _username_from_url, _allowed_types| {
                Cred::userpass_plaintext(&user, &pass)
            });
        }
        if print_logs {
            callbacks.transfer_progress(|stats| {
                let received = stats.received_objects();
                if received % PROGRESS_LOG_INTERVAL == 0 || received == stats.total_objects() {
                    tracing::info!(
                        "Received {}/{} objects ({} bytes)",
                        received,
                        stats.total_objects(),
                        stats.received_bytes()
                    );
                }
                true
            });
        }

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let repo = git2::build::RepoBuilder::new()
            .bare(true)
            .fetch_options(fetch_options)
            .clone(url, clone_dir.path())
            .map_err(|e| AcquisitionError::CloneFailed {
                url: url.to_string(),
                reason: e.message().to_string(),
            })?;

        Ok(Self {
            repo,
            location: clone_dir.path().to_path_buf(),
            _clone_dir: Some(clone_dir),
        })
    }

    /// Whether the repository lives in a temporary clone directory
    pub fn is_temporary(&self) -> bool {
        self._clone_dir.is_some()
    }

    fn find_commit(&self, hash: &str) -> Result<git2::Commit<'_>, GitError> {
        let oid = Oid::from_str(hash).map_err(|e| GitError::ObjectNotFound(e.to_string()))?;
        Ok(self.repo.find_commit(oid)?)
    }
}

fn to_signature(sig: &git2::Signature<'_>) -> Signature {
    Signature {
        name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
        email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
        when: sig.when().seconds(),
    }
}

fn to_commit_data(commit: &git2::Commit<'_>) -> CommitData {
    CommitData {
        hash: commit.id().to_string(),
        author: to_signature(&commit.author()),
        committer: to_signature(&commit.committer()),
        message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        parent_hashes: commit.parent_ids().map(|id| id.to_string()).collect(),
        tree_hash: commit.tree_id().to_string(),
    }
}

impl CommitSource for GitRepository {
    fn location(&self) -> &Path {
        &self.location
    }

    fn head(&self) -> Result<String, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::RefNotFound(format!("HEAD: {}", e.message())))?;
        let commit = head
            .peel_to_commit()
            .map_err(|e| GitError::RefNotFound(format!("HEAD: {}", e.message())))?;
        Ok(commit.id().to_string())
    }

    fn log(&self) -> Result<CommitIter<'_>, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk
            .push_head()
            .map_err(|e| GitError::RefNotFound(format!("HEAD: {}", e.message())))?;
        // Non-commit ref targets are ignored by glob pushes
        revwalk.push_glob("refs/*")?;

        let repo = &self.repo;
        Ok(Box::new(revwalk.map(move |oid| {
            let oid = oid.map_err(|e| GitError::IterFailed(e.message().to_string()))?;
            let commit = repo
                .find_commit(oid)
                .map_err(|e| GitError::IterFailed(format!("{}: {}", oid, e.message())))?;
            Ok(to_commit_data(&commit))
        })))
    }

    fn files(
        &self,
        commit: &CommitData,
        cancel: &CancellationToken,
    ) -> Result<Vec<TreeFile>, GitError> {
        let tree = self
            .find_commit(&commit.hash)?
            .tree()
            .map_err(|e| GitError::TreeFailed(format!("{}: {}", commit.hash, e.message())))?;
        let odb = self.repo.odb()?;

        let mut files = Vec::new();
        let mut failure: Option<GitError> = None;

        let walked = tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if cancel.is_cancelled() {
                failure = Some(GitError::Cancelled);
                return TreeWalkResult::Abort;
            }
            // Subtrees are descended into, gitlinks are not files
            if entry.kind() != Some(ObjectType::Blob) {
                return TreeWalkResult::Ok;
            }

            let name = format!("{}{}", root, String::from_utf8_lossy(entry.name_bytes()));
            match odb.read_header(entry.id()) {
                Ok((size, _)) => {
                    files.push(TreeFile {
                        name,
                        hash: entry.id().to_string(),
                        size: size as u64,
                    });
                    TreeWalkResult::Ok
                }
                Err(e) => {
                    failure = Some(GitError::ObjectNotFound(format!(
                        "{} ({}): {}",
                        name,
                        entry.id(),
                        e.message()
                    )));
                    TreeWalkResult::Abort
                }
            }
        });

        if let Some(err) = failure {
            return Err(err);
        }
        walked.map_err(|e| GitError::TreeFailed(format!("{}: {}", commit.hash, e.message())))?;

        Ok(files)
    }

    fn read_blob(&self, object_hash: &str) -> Result<Vec<u8>, GitError> {
        let oid =
            Oid::from_str(object_hash).map_err(|e| GitError::ObjectNotFound(e.to_string()))?;
        let blob = self.repo.find_blob(oid)?;
        Ok(blob.content().to_vec())
    }
}
