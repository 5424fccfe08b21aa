//! Storage layer: quality columns over Arrow batches, Parquet snapshots.

mod error;
pub use error::StoreError;

pub mod quality_columns;
pub mod snapshot;
pub mod threads;

pub use quality_columns::{QualityFilter, annotate_batch, annotate_batches, filter_by_quality};
pub use snapshot::{MemorySnapshot, ParquetSnapshot, SnapshotStore, read_parquet, write_parquet};
pub use threads::threads_to_batch;
