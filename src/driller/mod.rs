//! Drilling engine: walks a repository's history and feeds every commit to
//! the registered extractors, then exports their buffers.

use crate::config::{Config, WalkStrategy};
use crate::content_store::{ContentStore, DirectoryContentStore, NullContentStore};
use crate::error::{AcquisitionError, DrillError, ExportError, ExtractionError, WalkError};
use crate::export::ExportSink;
use crate::extractor::{Capability, Extractor};
use crate::git::{CommitData, CommitSource, GitRepository, TreeFile};
use crate::types::{DEFAULT_HASH_LENGTH, Meta};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Settings shared by every extractor an engine builds
#[derive(Clone)]
pub struct ExtractionOptions {
    pub hash_length: usize,
    pub walk_strategy: WalkStrategy,
    /// Receives file contents seen by file-inventory extraction
    pub content_store: Arc<dyn ContentStore>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            hash_length: DEFAULT_HASH_LENGTH,
            walk_strategy: WalkStrategy::default(),
            content_store: Arc::new(NullContentStore),
        }
    }
}

impl ExtractionOptions {
    pub fn from_config(config: &Config) -> Self {
        let content_store: Arc<dyn ContentStore> = match &config.export.content_dir {
            Some(dir) => Arc::new(DirectoryContentStore::new(dir)),
            None => Arc::new(NullContentStore),
        };

        Self {
            hash_length: config.extraction.hash_length,
            walk_strategy: config.extraction.walk_strategy,
            content_store,
        }
    }
}

/// State changes reported while [`DrillingEngine::analyze`] runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Always the first event of a run
    Started { repository_name: String },
    /// A dedicated walk for one extractor begins
    ExtractorStarted { name: &'static str },
    /// Running number of files processed by the current file-inventory extractor
    FilesProcessed { count: usize },
    CommitSkipped {
        extractor: &'static str,
        commit: String,
        reason: String,
    },
    Exported { extractor: &'static str, rows: usize },
    /// Always the last event of a successful run
    Finished { commits: usize },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { repository_name } => {
                write!(f, "Starting analysis of '{}'...", repository_name)
            }
            Self::ExtractorStarted { name } => write!(f, "Running extractor '{}'...", name),
            Self::FilesProcessed { count } => write!(f, "Processed {} files", count),
            Self::CommitSkipped {
                extractor,
                commit,
                reason,
            } => write!(f, "Skipped commit {} in '{}': {}", commit, extractor, reason),
            Self::Exported { extractor, rows } => {
                write!(f, "Exported {} rows from '{}'", rows, extractor)
            }
            Self::Finished { commits } => write!(f, "Analysis finished: {} commits walked", commits),
        }
    }
}

/// Per-extractor outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorReport {
    pub name: String,
    pub commits_visited: usize,
    pub commits_skipped: usize,
    pub files_processed: usize,
    pub rows_exported: usize,
}

/// Outcome of [`DrillingEngine::analyze`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub repository_name: String,
    pub commits_walked: usize,
    pub extractors: Vec<ExtractorReport>,
    pub duration_ms: u64,
}

impl AnalysisReport {
    pub fn total_rows(&self) -> usize {
        self.extractors.iter().map(|e| e.rows_exported).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.extractors.iter().map(|e| e.commits_skipped).sum()
    }
}

/// The tree of one commit, enumerated on first use and shared afterwards
pub struct TreeSnapshot<'a> {
    source: &'a dyn CommitSource,
    commit: &'a CommitData,
    cancel: &'a CancellationToken,
    files: OnceCell<Result<Arc<[TreeFile]>, ExtractionError>>,
}

impl<'a> TreeSnapshot<'a> {
    pub fn new(
        source: &'a dyn CommitSource,
        commit: &'a CommitData,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            source,
            commit,
            cancel,
            files: OnceCell::new(),
        }
    }

    pub fn files(&self) -> Result<Arc<[TreeFile]>, ExtractionError> {
        self.files
            .get_or_init(|| {
                self.source
                    .files(self.commit, self.cancel)
                    .map(Arc::from)
                    .map_err(|e| ExtractionError::TreeEnumeration {
                        commit: self.commit.hash.clone(),
                        reason: e.to_string(),
                    })
            })
            .clone()
    }

    /// Whether the tree has been enumerated
    pub fn is_loaded(&self) -> bool {
        self.files.get().is_some()
    }
}

/// Hand one commit to one extractor.
///
/// Returns the number of files the extractor looked at. Tree enumeration and
/// content copy failures come back as [`ExtractionError`] and leave the
/// extractor's buffers as they were before the call.
pub fn visit_commit(
    commit: &CommitData,
    tree: &TreeSnapshot<'_>,
    extractor: &mut Extractor,
    on_file: &mut dyn FnMut(usize),
) -> Result<usize, ExtractionError> {
    match extractor {
        Extractor::CommitGraph(graph) => {
            graph.consume(commit);
            Ok(0)
        }
        Extractor::FileInventory(inventory) => {
            let files = tree.files()?;
            inventory.consume(commit, &files, tree.source, tree.cancel, on_file)
        }
        Extractor::StructureSummary(summary) => match tree.files() {
            Ok(files) => Ok(summary.consume(commit, &files)),
            Err(e) => {
                summary.skip();
                Err(e)
            }
        },
    }
}

/// Walks a repository's history and drives the registered extractors
///
/// # Example
///
/// ```no_run
/// use history_drill::config::Config;
/// use history_drill::driller::DrillingEngine;
/// use history_drill::export::ParquetSink;
/// use history_drill::extractor::Capability;
///
/// fn main() -> anyhow::Result<()> {
///     let mut config = Config::default();
///     config.repository.url = "https://github.com/rust-lang/log.git".to_string();
///
///     let mut engine = DrillingEngine::init(&config)?;
///     engine
///         .append_capability(Capability::CommitGraph)
///         .append_capability(Capability::StructureSummary);
///
///     let report = engine.analyze(&ParquetSink::new("data"), &mut |event| println!("{event}"))?;
///     println!("Walked {} commits", report.commits_walked);
///     Ok(())
/// }
/// ```
pub struct DrillingEngine {
    repository_name: String,
    source: Box<dyn CommitSource>,
    options: ExtractionOptions,
    extractors: Vec<Extractor>,
    cancel: CancellationToken,
}

impl DrillingEngine {
    /// Validate `config` and clone the configured repository
    pub fn init(config: &Config) -> Result<Self, DrillError> {
        config.validate()?;
        let url = config.require_url()?;
        let repository_name = config.repository_name();

        tracing::info!("Cloning {} as '{}'", url, repository_name);
        let repository = GitRepository::clone_remote(
            url,
            &repository_name,
            config.repository.use_in_memory_temp_repository,
            config.repository.print_logs,
        )?;
        tracing::debug!(
            "Repository ready at {} (temporary clone: {})",
            repository.location().display(),
            repository.is_temporary()
        );

        Ok(Self::with_source(
            repository_name,
            Box::new(repository),
            ExtractionOptions::from_config(config),
        ))
    }

    /// Build an engine over an already acquired repository
    pub fn with_source(
        repository_name: impl Into<String>,
        source: Box<dyn CommitSource>,
        options: ExtractionOptions,
    ) -> Self {
        Self {
            repository_name: repository_name.into(),
            source,
            options,
            extractors: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Register an extractor; extraction and export follow registration order
    pub fn append_extractor(&mut self, extractor: Extractor) -> &mut Self {
        tracing::info!("Registered extractor '{}'", extractor.name());
        self.extractors.push(extractor);
        self
    }

    /// Build and register an extractor of the given kind using the engine's options
    pub fn append_capability(&mut self, capability: Capability) -> &mut Self {
        let extractor = Extractor::from_capability(
            capability,
            &self.repository_name,
            self.options.hash_length,
            self.options.content_store.clone(),
        );
        self.append_extractor(extractor)
    }

    pub fn repository_name(&self) -> &str {
        &self.repository_name
    }

    pub fn repository(&self) -> &dyn CommitSource {
        self.source.as_ref()
    }

    pub fn extractors(&self) -> &[Extractor] {
        &self.extractors
    }

    /// Token that aborts [`DrillingEngine::analyze`] when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Datasets of all registered extractors, in registration order
    pub fn meta_infos(&self, sink: &dyn ExportSink) -> Vec<Meta> {
        self.extractors
            .iter()
            .flat_map(|extractor| extractor.meta_info(sink))
            .collect()
    }

    /// Walk the full history, run every extractor and export the results to `sink`
    pub fn analyze(
        &mut self,
        sink: &dyn ExportSink,
        progress: &mut dyn FnMut(&ProgressEvent),
    ) -> Result<AnalysisReport, DrillError> {
        let started = Instant::now();
        progress(&ProgressEvent::Started {
            repository_name: self.repository_name.clone(),
        });
        self.ensure_not_cancelled()?;

        for extractor in &mut self.extractors {
            extractor.reset();
        }

        let head = self
            .source
            .head()
            .map_err(|e| AcquisitionError::HeadUnresolved(e.to_string()))?;
        for extractor in &mut self.extractors {
            extractor.set_head(&head);
        }
        tracing::info!(
            "Analyzing '{}' from HEAD {} with {} extractors ({})",
            self.repository_name,
            head,
            self.extractors.len(),
            self.options.walk_strategy.as_str()
        );

        let mut reports: Vec<ExtractorReport> = self
            .extractors
            .iter()
            .map(|extractor| ExtractorReport {
                name: extractor.name().to_string(),
                ..ExtractorReport::default()
            })
            .collect();

        let commits_walked = match self.options.walk_strategy {
            WalkStrategy::SharedPass => {
                let all: Vec<usize> = (0..self.extractors.len()).collect();
                self.walk(&all, &mut reports, progress)?
            }
            WalkStrategy::PerExtractor => {
                let mut walked = 0;
                for index in 0..self.extractors.len() {
                    progress(&ProgressEvent::ExtractorStarted {
                        name: self.extractors[index].name(),
                    });
                    walked = self.walk(&[index], &mut reports, progress)?;
                }
                walked
            }
        };

        self.ensure_not_cancelled()?;
        self.export_all(sink, &mut reports, progress)?;

        progress(&ProgressEvent::Finished {
            commits: commits_walked,
        });

        let report = AnalysisReport {
            repository_name: self.repository_name.clone(),
            commits_walked,
            extractors: reports,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Analysis of '{}' finished: {} commits, {} rows, {} skipped in {}ms",
            report.repository_name,
            report.commits_walked,
            report.total_rows(),
            report.total_skipped(),
            report.duration_ms
        );
        Ok(report)
    }

    /// One history walk feeding the extractors at `targets`. Returns the number of commits walked.
    fn walk(
        &mut self,
        targets: &[usize],
        reports: &mut [ExtractorReport],
        progress: &mut dyn FnMut(&ProgressEvent),
    ) -> Result<usize, DrillError> {
        let Self {
            source,
            extractors,
            cancel,
            ..
        } = self;
        let source: &dyn CommitSource = &**source;
        let cancel: &CancellationToken = cancel;

        let log = source
            .log()
            .map_err(|e| WalkError::StartFailed(e.to_string()))?;

        let mut walked = 0;
        for commit in log {
            if cancel.is_cancelled() {
                return Err(DrillError::Cancelled);
            }
            let commit = commit.map_err(|e| WalkError::CommitFailed(e.to_string()))?;
            let tree = TreeSnapshot::new(source, &commit, cancel);

            for &index in targets {
                let extractor = &mut extractors[index];
                let name = extractor.name();
                let result = visit_commit(&commit, &tree, extractor, &mut |count: usize| {
                    progress(&ProgressEvent::FilesProcessed { count })
                });

                if cancel.is_cancelled() {
                    return Err(DrillError::Cancelled);
                }

                let report = &mut reports[index];
                match result {
                    Ok(files) => {
                        report.commits_visited += 1;
                        report.files_processed += files;
                    }
                    Err(e) => {
                        tracing::warn!("Skipping commit {} for '{}': {}", commit.hash, name, e);
                        report.commits_skipped += 1;
                        progress(&ProgressEvent::CommitSkipped {
                            extractor: name,
                            commit: commit.hash.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }

            walked += 1;
            if walked % 1000 == 0 {
                tracing::debug!("Walked {} commits", walked);
            }
        }

        Ok(walked)
    }

    /// Export every extractor in parallel, reporting in registration order
    fn export_all(
        &self,
        sink: &dyn ExportSink,
        reports: &mut [ExtractorReport],
        progress: &mut dyn FnMut(&ProgressEvent),
    ) -> Result<(), DrillError> {
        let results: Vec<Result<usize, ExportError>> = self
            .extractors
            .par_iter()
            .map(|extractor| extractor.export(sink))
            .collect();

        for ((extractor, result), report) in self.extractors.iter().zip(results).zip(reports) {
            let rows = result?;
            report.rows_exported = rows;
            progress(&ProgressEvent::Exported {
                extractor: extractor.name(),
                rows,
            });
        }
        Ok(())
    }

    fn ensure_not_cancelled(&self) -> Result<(), DrillError> {
        if self.cancel.is_cancelled() {
            tracing::info!("Analysis of '{}' cancelled", self.repository_name);
            return Err(DrillError::Cancelled);
        }
        Ok(())
    }
}
