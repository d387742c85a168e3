//! Extractors turning walked commits into buffered record sets
//!
//! Every extractor owns its buffers. The engine feeds commits to it in walk
//! order and, once the walk is over, asks it to export its buffers to a sink.

pub mod commit_graph;
pub mod file_inventory;
pub mod structure_summary;

pub use commit_graph::CommitGraphExtractor;
pub use file_inventory::FileInventoryExtractor;
pub use structure_summary::StructureSummaryExtractor;

use crate::content_store::ContentStore;
use crate::error::ExportError;
use crate::export::{ExportSink, Record, field_metas};
use crate::types::{Meta, OperationalLevel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The kind of work an extractor performs on each commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Commit metadata and parent links
    CommitGraph,
    /// Every file of every commit's tree
    FileInventory,
    /// Aggregated tree sizes over the whole history
    StructureSummary,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::CommitGraph,
        Capability::FileInventory,
        Capability::StructureSummary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommitGraph => "commit-graph",
            Self::FileInventory => "file-inventory",
            Self::StructureSummary => "structure-summary",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|capability| capability.as_str() == name.trim())
    }

    /// Whether visiting a commit requires its tree snapshot
    pub fn needs_tree(&self) -> bool {
        match self {
            Self::CommitGraph => false,
            Self::FileInventory | Self::StructureSummary => true,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered extractor
#[derive(Debug)]
pub enum Extractor {
    CommitGraph(CommitGraphExtractor),
    FileInventory(FileInventoryExtractor),
    StructureSummary(StructureSummaryExtractor),
}

impl Extractor {
    /// Parse an extractor name as used in configuration and on the command line
    pub fn kind_from_name(name: &str) -> Option<Capability> {
        Capability::from_name(name)
    }

    /// Build an extractor of the given kind
    pub fn from_capability(
        capability: Capability,
        repository_name: &str,
        hash_length: usize,
        content_store: Arc<dyn ContentStore>,
    ) -> Self {
        match capability {
            Capability::CommitGraph => {
                Self::CommitGraph(CommitGraphExtractor::new(repository_name, hash_length))
            }
            Capability::FileInventory => Self::FileInventory(FileInventoryExtractor::new(
                hash_length,
                content_store,
            )),
            Capability::StructureSummary => {
                Self::StructureSummary(StructureSummaryExtractor::new(repository_name))
            }
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            Self::CommitGraph(_) => Capability::CommitGraph,
            Self::FileInventory(_) => Capability::FileInventory,
            Self::StructureSummary(_) => Capability::StructureSummary,
        }
    }

    pub fn name(&self) -> &'static str {
        self.capability().as_str()
    }

    pub fn operational_level(&self) -> OperationalLevel {
        match self {
            Self::CommitGraph(_) | Self::FileInventory(_) => OperationalLevel::Commit,
            Self::StructureSummary(_) => OperationalLevel::Repository,
        }
    }

    /// Datasets this extractor exports, with their schema and destination in `sink`
    pub fn meta_info(&self, sink: &dyn ExportSink) -> Vec<Meta> {
        match self {
            Self::CommitGraph(_) => vec![
                self.meta_for::<crate::types::CommitVertex>(sink),
                self.meta_for::<crate::types::CommitEdge>(sink),
            ],
            Self::FileInventory(_) => vec![self.meta_for::<crate::types::FileContentVertex>(sink)],
            Self::StructureSummary(_) => {
                vec![self.meta_for::<crate::types::StructureSummary>(sink)]
            }
        }
    }

    fn meta_for<R: Record>(&self, sink: &dyn ExportSink) -> Meta {
        Meta {
            name: R::DATASET.to_string(),
            extractor: self.name().to_string(),
            output: sink.target(R::DATASET),
            operational_level: self.operational_level(),
            schema: field_metas(&R::schema()),
        }
    }

    /// Drop everything buffered by a previous run
    pub fn reset(&mut self) {
        match self {
            Self::CommitGraph(e) => e.reset(),
            Self::FileInventory(e) => e.reset(),
            Self::StructureSummary(e) => e.reset(),
        }
    }

    /// Tell the extractor which commit HEAD resolved to for the coming walk
    pub fn set_head(&mut self, head: &str) {
        if let Self::StructureSummary(e) = self {
            e.set_head(head);
        }
    }

    /// Number of buffered rows across all of this extractor's datasets
    pub fn rows(&self) -> usize {
        match self {
            Self::CommitGraph(e) => e.rows(),
            Self::FileInventory(e) => e.rows(),
            Self::StructureSummary(e) => e.rows(),
        }
    }

    /// Write the buffers to `sink`, returning the number of rows exported
    pub fn export(&self, sink: &dyn ExportSink) -> Result<usize, ExportError> {
        match self {
            Self::CommitGraph(e) => e.export(sink),
            Self::FileInventory(e) => e.export(sink),
            Self::StructureSummary(e) => e.export(sink),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_store::NullContentStore;
    use crate::export::MemorySink;

    fn build(capability: Capability) -> Extractor {
        Extractor::from_capability(capability, "repo", 12, Arc::new(NullContentStore))
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!(
            Extractor::kind_from_name("commit-graph"),
            Some(Capability::CommitGraph)
        );
        assert_eq!(
            Extractor::kind_from_name("file-inventory"),
            Some(Capability::FileInventory)
        );
        assert_eq!(
            Extractor::kind_from_name(" structure-summary "),
            Some(Capability::StructureSummary)
        );
        assert_eq!(Extractor::kind_from_name("CommitGraph"), None);
    }

    #[test]
    fn test_capability_round_trip() {
        for capability in Capability::ALL {
            let extractor = build(capability);
            assert_eq!(extractor.capability(), capability);
            assert_eq!(extractor.name(), capability.as_str());
            assert_eq!(Capability::from_name(&capability.to_string()), Some(capability));
        }
    }

    #[test]
    fn test_needs_tree() {
        assert!(!Capability::CommitGraph.needs_tree());
        assert!(Capability::FileInventory.needs_tree());
        assert!(Capability::StructureSummary.needs_tree());
    }

    #[test]
    fn test_operational_levels() {
        assert_eq!(
            build(Capability::CommitGraph).operational_level(),
            OperationalLevel::Commit
        );
        assert_eq!(
            build(Capability::FileInventory).operational_level(),
            OperationalLevel::Commit
        );
        assert_eq!(
            build(Capability::StructureSummary).operational_level(),
            OperationalLevel::Repository
        );
    }

    #[test]
    fn test_meta_info_per_variant() {
        let sink = MemorySink::new();

        let graph = build(Capability::CommitGraph).meta_info(&sink);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph[0].name, "commit-vertices");
        assert_eq!(graph[1].name, "commit-edges");
        assert_eq!(graph[1].output, "memory://commit-edges");
        assert_eq!(graph[0].extractor, "commit-graph");

        let files = build(Capability::FileInventory).meta_info(&sink);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].schema.len(), 4);

        let summary = build(Capability::StructureSummary).meta_info(&sink);
        assert_eq!(summary[0].operational_level, OperationalLevel::Repository);
    }

    #[test]
    fn test_fresh_extractors_are_empty() {
        for capability in Capability::ALL {
            let extractor = build(capability);
            let expected = if capability == Capability::StructureSummary { 1 } else { 0 };
            assert_eq!(extractor.rows(), expected);
        }
    }
}
