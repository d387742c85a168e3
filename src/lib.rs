//! # history-drill - Git History Mining into Columnar Datasets
//!
//! Clones a repository, walks its complete commit history once and turns it
//! into analysis-ready Parquet datasets.
//!
//! ## Overview
//!
//! A [`driller::DrillingEngine`] owns a repository handle and a list of
//! registered extractors. Every commit reachable from HEAD or any other ref is
//! handed to each extractor in registration order. When the walk is over, all
//! extractors export their buffers in parallel to an [`export::ExportSink`].
//!
//! ## Datasets
//!
//! - `commit-vertices`: one row per commit with author, committer and message
//! - `commit-edges`: one row per parent link, merges carry one row per parent
//! - `file-content`: one row per file of every commit's full tree
//! - `structure-summary`: a single row of file-count statistics
//!
//! ## Architecture
//!
//! ```text
//!  repository URL
//!        │ clone (git2, TempDir)
//! ┌──────▼───────┐   commit stream    ┌────────────────────┐
//! │ CommitSource ├───────────────────►│   DrillingEngine   │
//! └──────────────┘  tree snapshots    │ (shared-pass walk) │
//!                                     └─────────┬──────────┘
//!              ┌────────────────────┬───────────┴─────────┐
//!       ┌──────▼──────┐   ┌─────────▼──────┐   ┌──────────▼────────┐
//!       │ CommitGraph │   │ FileInventory  │   │ StructureSummary  │
//!       └──────┬──────┘   └───┬─────────┬──┘   └──────────┬────────┘
//!              │              │ blobs   └──► ContentStore │
//!              └──────────────┴──────┬────────────────────┘
//!                             ┌──────▼──────┐
//!                             │ ExportSink  │ (Parquet, rayon)
//!                             └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`driller`]: the drilling engine, progress events and run reports
//! - [`extractor`]: commit graph, file inventory and structure summary extractors
//! - [`git`]: repository provider built on libgit2
//! - [`export`]: Arrow record schemas, Parquet sink and dataset catalog
//! - [`content_store`]: destinations for copied file contents
//! - [`config`]: configuration management with environment variable support
//! - [`types`]: record model and dataset metadata
//! - [`error`]: error types
//! - [`paths`]: platform directories
//!
//! ## Usage Example
//!
//! ```no_run
//! use history_drill::config::Config;
//! use history_drill::driller::DrillingEngine;
//! use history_drill::export::ParquetSink;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut config = Config::new()?;
//!     config.repository.url = "https://github.com/serde-rs/json.git".to_string();
//!
//!     let mut engine = DrillingEngine::init(&config)?;
//!     for capability in config.extraction.capabilities()? {
//!         engine.append_capability(capability);
//!     }
//!
//!     let sink = ParquetSink::new(&config.export.output_dir);
//!     let report = engine.analyze(&sink, &mut |event| eprintln!("{event}"))?;
//!     println!("{} rows exported", report.total_rows());
//!     Ok(())
//! }
//! ```

/// Configuration management with environment variable overrides
pub mod config;

/// Destinations for file contents copied during extraction
pub mod content_store;

/// History walking and extractor orchestration
pub mod driller;

/// Error types and utilities
pub mod error;

/// Record batches, Parquet output and the dataset catalog
pub mod export;

/// Extractor variants and capability dispatch
pub mod extractor;

/// Git repository acquisition and history walking
pub mod git;

/// Platform directories and default locations
pub mod paths;

/// Git repository fixtures for tests and benchmarks
pub mod test_utils;

/// Record model and dataset metadata
pub mod types;
