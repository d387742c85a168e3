// Shared test utilities exposed from the library so integration tests and benches can reuse them.
use git2::{Oid, Repository, Signature, Time};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

/// First commit timestamp used by fixtures
const BASE_TIME: i64 = 1_700_000_000;

/// A throwaway git repository whose commits are written directly to the object store.
///
/// Each commit gets an explicit full tree and explicit parents, so merges and
/// side branches can be built without a working directory. HEAD points to
/// `refs/heads/main`.
pub struct RepoFixture {
    dir: TempDir,
    repo: Repository,
    clock: Cell<i64>,
}

impl RepoFixture {
    pub fn new() -> Result<Self, git2::Error> {
        let dir = TempDir::new().map_err(|e| git2::Error::from_str(&e.to_string()))?;
        let repo = Repository::init(dir.path())?;
        repo.set_head("refs/heads/main")?;
        Ok(Self {
            dir,
            repo,
            clock: Cell::new(BASE_TIME),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Clone URL pointing at the fixture
    pub fn url(&self) -> String {
        self.dir.path().display().to_string()
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Create a commit on `branch` whose tree holds exactly `files`.
    ///
    /// Paths may contain `/` to create nested directories. The branch must
    /// either not exist yet or currently point at `parents[0]`.
    pub fn commit(
        &self,
        branch: &str,
        message: &str,
        files: &[(&str, &[u8])],
        parents: &[Oid],
    ) -> Result<Oid, git2::Error> {
        let entries: Vec<(String, Vec<u8>)> = files
            .iter()
            .map(|(path, content)| (path.to_string(), content.to_vec()))
            .collect();
        let tree_id = write_tree(&self.repo, &entries)?;
        let tree = self.repo.find_tree(tree_id)?;

        let when = self.clock.get();
        self.clock.set(when + 60);
        let author = Signature::new("Test Author", "author@example.com", &Time::new(when, 0))?;
        let committer = Signature::new(
            "Test Committer",
            "committer@example.com",
            &Time::new(when + 1, 0),
        )?;

        let parent_commits = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid))
            .collect::<Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parent_commits.iter().collect();

        let refname = format!("refs/heads/{}", branch);
        self.repo.commit(
            Some(&refname),
            &author,
            &committer,
            message,
            &tree,
            &parent_refs,
        )
    }

    /// Point a lightweight tag at a commit
    pub fn tag(&self, name: &str, target: Oid) -> Result<(), git2::Error> {
        self.repo
            .reference(&format!("refs/tags/{}", name), target, true, "tag")?;
        Ok(())
    }
}

fn write_tree(repo: &Repository, entries: &[(String, Vec<u8>)]) -> Result<Oid, git2::Error> {
    let mut builder = repo.treebuilder(None)?;
    let mut subdirs: BTreeMap<&str, Vec<(String, Vec<u8>)>> = BTreeMap::new();

    for (path, content) in entries {
        match path.split_once('/') {
            Some((dir, rest)) => subdirs
                .entry(dir)
                .or_default()
                .push((rest.to_string(), content.clone())),
            None => {
                let blob = repo.blob(content)?;
                builder.insert(path.as_str(), blob, 0o100644)?;
            }
        }
    }

    for (dir, children) in subdirs {
        let subtree = write_tree(repo, &children)?;
        builder.insert(dir, subtree, 0o040000)?;
    }

    builder.write()
}
