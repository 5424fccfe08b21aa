//! Tabular snapshot storage.
//!
//! Views load the current review table through a [`SnapshotStore`] handed to
//! them, rather than from process-wide state. [`ParquetSnapshot`] persists to
//! a single Parquet file; [`MemorySnapshot`] keeps batches in process and is
//! what tests and one-shot commands use.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::info;

use crate::StoreError;

/// Load/save access to one tabular snapshot.
pub trait SnapshotStore {
    /// Current snapshot. A store that has never been saved to is either empty
    /// or an error, depending on the backend.
    fn load(&self) -> Result<Vec<RecordBatch>, StoreError>;

    /// Replace the snapshot with `batches`.
    fn save(&mut self, batches: &[RecordBatch]) -> Result<(), StoreError>;
}

/// In-process snapshot; starts empty.
#[derive(Debug, Default, Clone)]
pub struct MemorySnapshot {
    batches: Vec<RecordBatch>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batches(batches: Vec<RecordBatch>) -> Self {
        Self { batches }
    }
}

impl SnapshotStore for MemorySnapshot {
    fn load(&self) -> Result<Vec<RecordBatch>, StoreError> {
        Ok(self.batches.clone())
    }

    fn save(&mut self, batches: &[RecordBatch]) -> Result<(), StoreError> {
        self.batches = batches.to_vec();
        Ok(())
    }
}

/// Snapshot persisted as one Parquet file.
///
/// Saves write to a sibling temp file and rename over the target, so a reader
/// never sees a half-written snapshot.
#[derive(Debug, Clone)]
pub struct ParquetSnapshot {
    path: PathBuf,
}

impl ParquetSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl SnapshotStore for ParquetSnapshot {
    fn load(&self) -> Result<Vec<RecordBatch>, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::SnapshotNotFound(self.path.clone()));
        }
        read_parquet(&self.path)
    }

    fn save(&mut self, batches: &[RecordBatch]) -> Result<(), StoreError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        if let Err(e) = write_parquet(&tmp, batches) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    info!(path = %path.display(), rows, "read parquet");
    Ok(batches)
}

/// Write RecordBatches to a Parquet file. All batches must share the first
/// batch's schema.
pub fn write_parquet(path: &Path, batches: &[RecordBatch]) -> Result<(), StoreError> {
    let first = batches.first().ok_or(StoreError::EmptySnapshot)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, first.schema(), None)?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    info!(path = %path.display(), rows, "wrote parquet");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn batch(ids: &[&str], scores: &[i32]) -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("doc", DataType::Utf8, false),
            Field::new("quality_score", DataType::Int32, false),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(ids.to_vec())),
                Arc::new(Int32Array::from(scores.to_vec())),
            ],
        )
        .unwrap()
    }

    #[test]
    fn memory_starts_empty_and_replaces() {
        let mut store = MemorySnapshot::new();
        assert!(store.load().unwrap().is_empty());

        store.save(&[batch(&["a"], &[90])]).unwrap();
        store.save(&[batch(&["b", "c"], &[80, 70])]).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].num_rows(), 2);
    }

    #[test]
    fn parquet_missing_file_errors() {
        let tmp = TempDir::new().unwrap();
        let store = ParquetSnapshot::new(tmp.path().join("missing.parquet"));
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(StoreError::SnapshotNotFound(_))));
    }

    #[test]
    fn parquet_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let mut store = ParquetSnapshot::new(tmp.path().join("reviews.parquet"));
        store
            .save(&[batch(&["a", "b"], &[91, 63]), batch(&["c"], &[0])])
            .unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        let rows: usize = loaded.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 3);
        assert_eq!(loaded[0].schema().field(1).name(), "quality_score");
        assert_eq!(loaded[0].schema().field(1).data_type(), &DataType::Int32);
    }

    #[test]
    fn parquet_save_overwrites_and_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reviews.parquet");
        let mut store = ParquetSnapshot::new(&path);
        store.save(&[batch(&["a", "b"], &[1, 2])]).unwrap();
        store.save(&[batch(&["z"], &[3])]).unwrap();

        let rows: usize = store.load().unwrap().iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 1);
        assert!(!tmp.path().join("reviews.parquet.tmp").exists());
    }

    #[test]
    fn empty_save_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut store = ParquetSnapshot::new(tmp.path().join("x.parquet"));
        assert!(matches!(store.save(&[]), Err(StoreError::EmptySnapshot)));
    }

    #[test]
    fn failed_save_removes_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mixed.parquet");
        let mut store = ParquetSnapshot::new(&path);

        // Second batch has a different schema, so the writer rejects it
        // after the temp file was created.
        let other = RecordBatch::try_new(
            Arc::new(Schema::new(vec![Field::new("n", DataType::Int32, false)])),
            vec![Arc::new(Int32Array::from(vec![1]))],
        )
        .unwrap();
        assert!(store.save(&[batch(&["a"], &[1]), other]).is_err());
        assert!(!tmp.path().join("mixed.parquet.tmp").exists());
        assert!(!store.exists());
    }

    #[test]
    fn stores_are_interchangeable() {
        fn round_trip(store: &mut dyn SnapshotStore) -> usize {
            store.save(&[batch(&["a", "b"], &[50, 60])]).unwrap();
            store.load().unwrap().iter().map(|b| b.num_rows()).sum()
        }
        let tmp = TempDir::new().unwrap();
        assert_eq!(round_trip(&mut MemorySnapshot::new()), 2);
        assert_eq!(
            round_trip(&mut ParquetSnapshot::new(tmp.path().join("s.parquet"))),
            2
        );
    }
}
