//! Columnar export of extracted records
//!
//! Extractors turn their buffers into Arrow [`RecordBatch`]es through the
//! [`Record`] trait and hand them to an [`ExportSink`], which decides where
//! and how they are persisted.

/// JSON catalog of produced datasets
pub mod catalog;
/// Parquet file sink
pub mod parquet;
/// Arrow schemas and batch conversion for the record model
pub mod records;

pub use catalog::Catalog;
pub use parquet::{ParquetCompression, ParquetSink};
pub use records::Record;

use crate::error::ExportError;
use crate::types::FieldMeta;
use arrow_array::RecordBatch;
use arrow_schema::Schema;
use std::sync::Mutex;

/// Destination for exported datasets
pub trait ExportSink: Sync {
    /// Identifier of the output a dataset is persisted to
    fn target(&self, dataset: &str) -> String;

    /// Persist one dataset
    fn write(&self, dataset: &str, batch: &RecordBatch) -> Result<(), ExportError>;
}

/// Convert `rows` to a batch and write it to `sink` under the record's dataset name.
///
/// Returns the number of rows written.
pub fn export_records<R: Record>(sink: &dyn ExportSink, rows: &[R]) -> Result<usize, ExportError> {
    let batch = R::to_record_batch(rows).map_err(|e| ExportError::BatchFailed {
        dataset: R::DATASET.to_string(),
        reason: e.to_string(),
    })?;

    sink.write(R::DATASET, &batch)?;

    tracing::info!(
        "Exported {} rows to '{}'",
        batch.num_rows(),
        sink.target(R::DATASET)
    );
    Ok(batch.num_rows())
}

/// Describe the columns of a schema for catalog consumption
pub fn field_metas(schema: &Schema) -> Vec<FieldMeta> {
    schema
        .fields()
        .iter()
        .map(|field| FieldMeta {
            name: field.name().clone(),
            data_type: field.data_type().to_string(),
            nullable: field.is_nullable(),
        })
        .collect()
}

/// Sink that keeps every written batch in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<(String, RecordBatch)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches written for a dataset, in write order
    pub fn batches(&self, dataset: &str) -> Vec<RecordBatch> {
        self.batches
            .lock()
            .map(|batches| {
                batches
                    .iter()
                    .filter(|(name, _)| name == dataset)
                    .map(|(_, batch)| batch.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of the datasets written so far, in write order
    pub fn datasets(&self) -> Vec<String> {
        self.batches
            .lock()
            .map(|batches| batches.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Total rows written for a dataset
    pub fn rows(&self, dataset: &str) -> usize {
        self.batches(dataset).iter().map(|b| b.num_rows()).sum()
    }
}

impl ExportSink for MemorySink {
    fn target(&self, dataset: &str) -> String {
        format!("memory://{}", dataset)
    }

    fn write(&self, dataset: &str, batch: &RecordBatch) -> Result<(), ExportError> {
        let mut batches = self.batches.lock().map_err(|e| ExportError::WriteFailed {
            target: self.target(dataset),
            reason: format!("sink lock poisoned: {}", e),
        })?;
        batches.push((dataset.to_string(), batch.clone()));
        Ok(())
    }
}
