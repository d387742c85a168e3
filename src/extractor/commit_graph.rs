use crate::error::ExportError;
use crate::export::{ExportSink, export_records};
use crate::git::CommitData;
use crate::types::{CommitEdge, CommitVertex, shorten_hash};

/// Collects commit metadata and parent links
#[derive(Debug)]
pub struct CommitGraphExtractor {
    repository_name: String,
    hash_length: usize,
    vertices: Vec<CommitVertex>,
    edges: Vec<CommitEdge>,
}

impl CommitGraphExtractor {
    pub fn new(repository_name: &str, hash_length: usize) -> Self {
        Self {
            repository_name: repository_name.to_string(),
            hash_length,
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Record one vertex for the commit and one edge per parent
    pub fn consume(&mut self, commit: &CommitData) {
        let commit_hash = shorten_hash(&commit.hash, self.hash_length);

        let parents: Vec<String> = commit
            .parent_hashes
            .iter()
            .map(|parent| shorten_hash(parent, self.hash_length))
            .collect();
        self.edges
            .extend(CommitEdge::from_parents(&commit_hash, &parents));

        self.vertices.push(CommitVertex {
            repository_name: self.repository_name.clone(),
            commit_hash,
            author_name: commit.author.name.clone(),
            author_mail: commit.author.email.clone(),
            author_timestamp: commit.author.when,
            committer_name: commit.committer.name.clone(),
            committer_mail: commit.committer.email.clone(),
            committer_timestamp: commit.committer.when,
            commit_message: commit.message.clone(),
        });
    }

    pub fn vertices(&self) -> &[CommitVertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[CommitEdge] {
        &self.edges
    }

    pub fn reset(&mut self) {
        self.vertices.clear();
        self.edges.clear();
    }

    pub fn rows(&self) -> usize {
        self.vertices.len() + self.edges.len()
    }

    /// Write vertices and edges as two datasets
    pub fn export(&self, sink: &dyn ExportSink) -> Result<usize, ExportError> {
        let vertices = export_records(sink, &self.vertices)?;
        let edges = export_records(sink, &self.edges)?;
        Ok(vertices + edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{MemorySink, Record};
    use crate::git::Signature;

    fn commit(hash: &str, parents: &[&str]) -> CommitData {
        CommitData {
            hash: hash.to_string(),
            author: Signature {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                when: 100,
            },
            committer: Signature {
                name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
                when: 200,
            },
            message: "Change things\n".to_string(),
            parent_hashes: parents.iter().map(|p| p.to_string()).collect(),
            tree_hash: "f".repeat(40),
        }
    }

    #[test]
    fn test_root_commit_has_no_edges() {
        let mut extractor = CommitGraphExtractor::new("repo", 12);
        extractor.consume(&commit(&"a".repeat(40), &[]));

        assert_eq!(extractor.vertices().len(), 1);
        assert!(extractor.edges().is_empty());

        let vertex = &extractor.vertices()[0];
        assert_eq!(vertex.commit_hash, "a".repeat(12));
        assert_eq!(vertex.repository_name, "repo");
        assert_eq!(vertex.author_name, "Ada");
        assert_eq!(vertex.committer_mail, "grace@example.com");
        assert_eq!(vertex.author_timestamp, 100);
        assert_eq!(vertex.committer_timestamp, 200);
        assert_eq!(vertex.commit_message, "Change things\n");
    }

    #[test]
    fn test_merge_commit_edges_use_same_hash_length() {
        let mut extractor = CommitGraphExtractor::new("repo", 8);
        let merge = "m".repeat(40);
        extractor.consume(&commit(&merge, &[&"1".repeat(40), &"2".repeat(40)]));

        let edges = extractor.edges();
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.commit_hash == "mmmmmmmm"));
        assert_eq!(edges[0].parent_commit_hash, "11111111");
        assert_eq!(edges[1].parent_commit_hash, "22222222");
        assert_eq!(edges[0].parent_index, 0);
        assert_eq!(edges[1].parent_index, 1);
    }

    #[test]
    fn test_full_hash_length_keeps_hashes() {
        let mut extractor = CommitGraphExtractor::new("repo", 40);
        let hash = "0123456789abcdef0123456789abcdef01234567";
        extractor.consume(&commit(hash, &[hash]));

        assert_eq!(extractor.vertices()[0].commit_hash, hash);
        assert_eq!(extractor.edges()[0].parent_commit_hash, hash);
    }

    #[test]
    fn test_reset_clears_buffers() {
        let mut extractor = CommitGraphExtractor::new("repo", 12);
        extractor.consume(&commit(&"a".repeat(40), &[&"b".repeat(40)]));
        assert_eq!(extractor.rows(), 2);

        extractor.reset();
        assert_eq!(extractor.rows(), 0);
    }

    #[test]
    fn test_export_writes_two_datasets() {
        let mut extractor = CommitGraphExtractor::new("repo", 12);
        extractor.consume(&commit(&"a".repeat(40), &[]));
        extractor.consume(&commit(&"b".repeat(40), &[&"a".repeat(40)]));

        let sink = MemorySink::new();
        let exported = extractor.export(&sink).unwrap();

        assert_eq!(exported, 3);
        assert_eq!(sink.rows(CommitVertex::DATASET), 2);
        assert_eq!(sink.rows(CommitEdge::DATASET), 1);
        assert_eq!(sink.datasets(), vec!["commit-vertices", "commit-edges"]);
    }
}
