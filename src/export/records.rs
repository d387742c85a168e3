use crate::types::{CommitEdge, CommitVertex, FileContentVertex, StructureSummary};
use arrow_array::{ArrayRef, Int64Array, RecordBatch, StringArray, UInt32Array, UInt64Array};
use arrow_schema::{ArrowError, DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

/// A row type with a fixed columnar schema
pub trait Record: Sized {
    /// Dataset name the rows are exported under
    const DATASET: &'static str;

    /// Arrow schema of the dataset
    fn schema() -> SchemaRef;

    /// Convert rows into a single batch matching [`Record::schema`]
    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError>;
}

fn utf8<'a, T: 'a>(rows: &'a [T], f: impl Fn(&'a T) -> &'a str) -> ArrayRef {
    Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
}

fn int64<T>(rows: &[T], f: impl Fn(&T) -> i64) -> ArrayRef {
    Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
}

impl Record for CommitVertex {
    const DATASET: &'static str = "commit-vertices";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("RepositoryName", DataType::Utf8, false),
            Field::new("CommitHash", DataType::Utf8, false),
            Field::new("AuthorName", DataType::Utf8, false),
            Field::new("AuthorMail", DataType::Utf8, false),
            Field::new("AuthorTimestamp", DataType::Int64, false),
            Field::new("CommitterName", DataType::Utf8, false),
            Field::new("CommitterMail", DataType::Utf8, false),
            Field::new("CommitterTimestamp", DataType::Int64, false),
            Field::new("CommitMessage", DataType::Utf8, false),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        RecordBatch::try_new(
            Self::schema(),
            vec![
                utf8(rows, |r| &r.repository_name),
                utf8(rows, |r| &r.commit_hash),
                utf8(rows, |r| &r.author_name),
                utf8(rows, |r| &r.author_mail),
                int64(rows, |r| r.author_timestamp),
                utf8(rows, |r| &r.committer_name),
                utf8(rows, |r| &r.committer_mail),
                int64(rows, |r| r.committer_timestamp),
                utf8(rows, |r| &r.commit_message),
            ],
        )
    }
}

impl Record for CommitEdge {
    const DATASET: &'static str = "commit-edges";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("CommitHash", DataType::Utf8, false),
            Field::new("ParentCommitHash", DataType::Utf8, false),
            Field::new("ParentIndex", DataType::UInt32, false),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let parent_index: UInt32Array = rows.iter().map(|r| Some(r.parent_index)).collect();
        RecordBatch::try_new(
            Self::schema(),
            vec![
                utf8(rows, |r| &r.commit_hash),
                utf8(rows, |r| &r.parent_commit_hash),
                Arc::new(parent_index),
            ],
        )
    }
}

impl Record for FileContentVertex {
    const DATASET: &'static str = "file-content";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("CommitHash", DataType::Utf8, false),
            Field::new("ObjectHash", DataType::Utf8, false),
            Field::new("FileName", DataType::Utf8, false),
            Field::new("FileSize", DataType::Int64, false),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        RecordBatch::try_new(
            Self::schema(),
            vec![
                utf8(rows, |r| &r.commit_hash),
                utf8(rows, |r| &r.object_hash),
                utf8(rows, |r| &r.file_name),
                int64(rows, |r| r.file_size),
            ],
        )
    }
}

impl Record for StructureSummary {
    const DATASET: &'static str = "structure-summary";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("RepositoryName", DataType::Utf8, false),
            Field::new("CommitsVisited", DataType::UInt64, false),
            Field::new("CommitsSkipped", DataType::UInt64, false),
            Field::new("TotalFileCount", DataType::UInt64, false),
            Field::new("MaxFileCount", DataType::UInt64, false),
            Field::new("HeadFileCount", DataType::UInt64, false),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let uint64 = |f: fn(&StructureSummary) -> u64| -> ArrayRef {
            Arc::new(UInt64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
        };
        RecordBatch::try_new(
            Self::schema(),
            vec![
                utf8(rows, |r| &r.repository_name),
                uint64(|r| r.commits_visited),
                uint64(|r| r.commits_skipped),
                uint64(|r| r.total_file_count),
                uint64(|r| r.max_file_count),
                uint64(|r| r.head_file_count),
            ],
        )
    }
}
