use super::ExportSink;
use crate::error::ExportError;
use arrow_array::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Page compression applied to Parquet output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCompression {
    #[default]
    Snappy,
    Zstd,
    Uncompressed,
}

impl ParquetCompression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snappy => "snappy",
            Self::Zstd => "zstd",
            Self::Uncompressed => "uncompressed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "snappy" => Some(Self::Snappy),
            "zstd" => Some(Self::Zstd),
            "uncompressed" | "none" => Some(Self::Uncompressed),
            _ => None,
        }
    }
}

impl From<ParquetCompression> for Compression {
    fn from(value: ParquetCompression) -> Self {
        match value {
            ParquetCompression::Snappy => Compression::SNAPPY,
            ParquetCompression::Zstd => Compression::ZSTD(ZstdLevel::default()),
            ParquetCompression::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Writes each dataset to `<output_dir>/<dataset>.parquet`, replacing any previous file
#[derive(Debug, Clone)]
pub struct ParquetSink {
    output_dir: PathBuf,
    compression: ParquetCompression,
}

impl ParquetSink {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            compression: ParquetCompression::default(),
        }
    }

    pub fn with_compression(mut self, compression: ParquetCompression) -> Self {
        self.compression = compression;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn compression(&self) -> ParquetCompression {
        self.compression
    }

    /// File a dataset is written to
    pub fn path_for(&self, dataset: &str) -> PathBuf {
        self.output_dir.join(format!("{}.parquet", dataset))
    }
}

impl ExportSink for ParquetSink {
    fn target(&self, dataset: &str) -> String {
        self.path_for(dataset).display().to_string()
    }

    fn write(&self, dataset: &str, batch: &RecordBatch) -> Result<(), ExportError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| ExportError::OutputDirFailed {
            path: self.output_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let target = self.target(dataset);
        let file = File::create(self.path_for(dataset)).map_err(|e| ExportError::WriterFailed {
            target: target.clone(),
            reason: e.to_string(),
        })?;

        let props = WriterProperties::builder()
            .set_compression(self.compression.into())
            .build();

        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props)).map_err(|e| {
            ExportError::WriterFailed {
                target: target.clone(),
                reason: e.to_string(),
            }
        })?;

        writer.write(batch).map_err(|e| ExportError::WriteFailed {
            target: target.clone(),
            reason: e.to_string(),
        })?;
        writer.close().map_err(|e| ExportError::WriteFailed {
            target: target.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            "Wrote {} rows to {} ({})",
            batch.num_rows(),
            target,
            self.compression.as_str()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{Record, export_records};
    use crate::types::{CommitEdge, FileContentVertex};
    use arrow_array::{Array, StringArray, UInt32Array};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    fn read_back(path: &Path) -> Vec<RecordBatch> {
        let file = File::open(path).unwrap();
        ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_parquet_round_trip_preserves_rows_and_schema() {
        let dir = tempdir().unwrap();
        let sink = ParquetSink::new(dir.path().join("out"));
        let edges = CommitEdge::from_parents("merge", &["left", "right"]);

        export_records(&sink, &edges).unwrap();

        let path = sink.path_for(CommitEdge::DATASET);
        assert!(path.ends_with("commit-edges.parquet"));

        let batches = read_back(&path);
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 2);
        assert_eq!(batches[0].schema().fields(), CommitEdge::schema().fields());

        let parents = batches[0]
            .column_by_name("ParentCommitHash")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(parents.value(0), "left");
        assert_eq!(parents.value(1), "right");

        let index = batches[0]
            .column_by_name("ParentIndex")
            .unwrap()
            .as_any()
            .downcast_ref::<UInt32Array>()
            .unwrap();
        assert_eq!(index.value(1), 1);
        assert!(!index.is_null(0));
    }

    #[test]
    fn test_empty_dataset_still_writes_file() {
        let dir = tempdir().unwrap();
        let sink = ParquetSink::new(dir.path()).with_compression(ParquetCompression::Zstd);

        export_records::<FileContentVertex>(&sink, &[]).unwrap();

        let batches = read_back(&sink.path_for(FileContentVertex::DATASET));
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn test_rewrite_replaces_previous_file() {
        let dir = tempdir().unwrap();
        let sink = ParquetSink::new(dir.path()).with_compression(ParquetCompression::Uncompressed);

        export_records(&sink, &CommitEdge::from_parents("a", &["b", "c", "d"])).unwrap();
        export_records(&sink, &CommitEdge::from_parents("a", &["b"])).unwrap();

        let batches = read_back(&sink.path_for(CommitEdge::DATASET));
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_compression_names() {
        assert_eq!(ParquetCompression::from_name("ZSTD"), Some(ParquetCompression::Zstd));
        assert_eq!(
            ParquetCompression::from_name("none"),
            Some(ParquetCompression::Uncompressed)
        );
        assert_eq!(ParquetCompression::from_name("lz4"), None);
        assert_eq!(ParquetCompression::default().as_str(), "snappy");
    }

    #[test]
    fn test_target_is_file_path() {
        let sink = ParquetSink::new("data");
        assert_eq!(sink.target("commit-vertices"), "data/commit-vertices.parquet");
    }
}
