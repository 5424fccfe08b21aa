use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("column {column} has type {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("column already present: {0}")]
    ColumnExists(String),

    #[error("snapshot file not found: {0}")]
    SnapshotNotFound(std::path::PathBuf),

    #[error("cannot save a snapshot with no batches")]
    EmptySnapshot,

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
