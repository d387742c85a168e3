/// End-to-end runs: clone a fixture repository, write Parquet files and a catalog
use anyhow::Result;
use arrow_array::{Array, RecordBatch, StringArray};
use history_drill::config::{Config, WalkStrategy};
use history_drill::driller::DrillingEngine;
use history_drill::error::{ConfigError, DrillError};
use history_drill::export::{Catalog, ParquetCompression, ParquetSink, Record};
use history_drill::paths::PlatformPaths;
use history_drill::test_utils::RepoFixture;
use history_drill::types::{CommitEdge, CommitVertex, FileContentVertex, StructureSummary};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;
use tempfile::TempDir;

fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
    Ok(reader.collect::<Result<Vec<_>, _>>()?)
}

fn row_count(batches: &[RecordBatch]) -> usize {
    batches.iter().map(|b| b.num_rows()).sum()
}

fn sample_repository() -> Result<RepoFixture> {
    let fixture = RepoFixture::new()?;
    let c1 = fixture.commit("main", "Add readme", &[("README.md", b"# demo\n")], &[])?;
    let c2 = fixture.commit(
        "main",
        "Add sources",
        &[("README.md", b"# demo\n"), ("src/main.rs", b"fn main() {}\n")],
        &[c1],
    )?;
    let side = fixture.commit(
        "docs",
        "Document usage",
        &[("README.md", b"# demo\nusage\n")],
        &[c1],
    )?;
    fixture.commit(
        "main",
        "Merge docs",
        &[
            ("README.md", b"# demo\nusage\n"),
            ("src/main.rs", b"fn main() {}\n"),
        ],
        &[c2, side],
    )?;
    Ok(fixture)
}

fn config_for(fixture: &RepoFixture, output: &Path) -> Config {
    let mut config = Config::default();
    config.repository.url = fixture.url();
    config.export.output_dir = output.to_path_buf();
    config.export.content_dir = Some(output.join("content"));
    config
}

fn run(config: &Config) -> Result<(Vec<history_drill::types::Meta>, String)> {
    let mut engine = DrillingEngine::init(config)?;
    for capability in config.extraction.capabilities()? {
        engine.append_capability(capability);
    }

    let sink = ParquetSink::new(&config.export.output_dir)
        .with_compression(config.export.compression);
    let report = engine.analyze(&sink, &mut |_| {})?;
    Ok((engine.meta_infos(&sink), report.repository_name))
}

#[test]
fn test_full_pipeline_writes_parquet_and_catalog() -> Result<()> {
    let fixture = sample_repository()?;
    let output = TempDir::new()?;
    let config = config_for(&fixture, output.path());

    let (datasets, repository_name) = run(&config)?;
    let catalog_path = PlatformPaths::catalog_path(output.path());
    Catalog::new(repository_name, datasets).save(&catalog_path)?;

    let vertices = read_parquet(&output.path().join("commit-vertices.parquet"))?;
    assert_eq!(row_count(&vertices), 4);
    assert_eq!(vertices[0].schema().fields(), CommitVertex::schema().fields());

    let edges = read_parquet(&output.path().join("commit-edges.parquet"))?;
    assert_eq!(row_count(&edges), 4);

    let files = read_parquet(&output.path().join("file-content.parquet"))?;
    assert_eq!(row_count(&files), 1 + 2 + 1 + 2);

    let summary = read_parquet(&output.path().join("structure-summary.parquet"))?;
    assert_eq!(row_count(&summary), 1);

    let names = vertices[0]
        .column_by_name("RepositoryName")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>().cloned())
        .expect("RepositoryName column");
    let expected_name = config.repository_name();
    assert!((0..names.len()).all(|i| names.value(i) == expected_name));

    let catalog = Catalog::load(&catalog_path)?;
    let dataset_names: Vec<&str> = catalog.datasets.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        dataset_names,
        vec![
            CommitVertex::DATASET,
            CommitEdge::DATASET,
            FileContentVertex::DATASET,
            StructureSummary::DATASET,
        ]
    );
    for meta in &catalog.datasets {
        assert!(Path::new(&meta.output).exists(), "{} missing", meta.output);
    }

    // Three distinct blobs across the history
    let content_dir = output.path().join("content");
    let stored = std::fs::read_dir(&content_dir)?
        .map(|entry| -> Result<usize> { Ok(std::fs::read_dir(entry?.path())?.count()) })
        .sum::<Result<usize>>()?;
    assert_eq!(stored, 3);

    Ok(())
}

#[test]
fn test_per_extractor_walk_with_zstd() -> Result<()> {
    let fixture = sample_repository()?;
    let output = TempDir::new()?;
    let mut config = config_for(&fixture, output.path());
    config.extraction.walk_strategy = WalkStrategy::PerExtractor;
    config.extraction.extractors = vec!["commit-graph".to_string()];
    config.export.compression = ParquetCompression::Zstd;
    config.export.content_dir = None;

    let (datasets, _) = run(&config)?;
    assert_eq!(datasets.len(), 2);

    assert_eq!(
        row_count(&read_parquet(&output.path().join("commit-vertices.parquet"))?),
        4
    );
    assert!(!output.path().join("file-content.parquet").exists());
    assert!(!output.path().join("content").exists());
    Ok(())
}

#[test]
fn test_rerun_overwrites_outputs() -> Result<()> {
    let fixture = sample_repository()?;
    let output = TempDir::new()?;
    let config = config_for(&fixture, output.path());

    run(&config)?;
    run(&config)?;

    let vertices = read_parquet(&output.path().join("commit-vertices.parquet"))?;
    assert_eq!(row_count(&vertices), 4);
    Ok(())
}

#[test]
fn test_local_mode_is_rejected() {
    let mut config = Config::default();
    config.repository.url = "https://example.com/org/repo.git".to_string();
    config.repository.is_local = true;

    let err = DrillingEngine::init(&config).err().expect("local mode must fail");
    assert!(matches!(err, DrillError::Config(ConfigError::Unsupported(_))));
}

#[test]
fn test_unreachable_remote_is_fatal() -> Result<()> {
    let missing = TempDir::new()?;
    let mut config = Config::default();
    config.repository.url = missing.path().join("nope").display().to_string();

    let err = DrillingEngine::init(&config).err().expect("clone must fail");
    assert!(matches!(err, DrillError::Acquisition(_)));
    assert!(err.is_fatal());
    Ok(())
}
