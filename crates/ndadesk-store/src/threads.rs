//! Review threads as Arrow batches, so intake output can be snapshotted
//! alongside annotated review sheets.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray, TimestampSecondArray};
use arrow::record_batch::RecordBatch;
use ndadesk_core::ReviewThread;
use ndadesk_core::review;

use crate::StoreError;

/// Build a batch with [`review::thread_schema`] from intake threads.
pub fn threads_to_batch(threads: &[ReviewThread]) -> Result<RecordBatch, StoreError> {
    let columns: Vec<ArrayRef> = vec![
        strings(threads.iter().map(|t| t.id.as_str())),
        strings(threads.iter().map(|t| t.subject.as_str())),
        strings(threads.iter().map(|t| t.sender.as_str())),
        strings(threads.iter().map(|t| t.client.as_str())),
        strings(threads.iter().map(|t| t.status.as_str())),
        strings(threads.iter().map(|t| t.priority.as_str())),
        utc_seconds(threads.iter().map(|t| t.received.timestamp())),
        utc_seconds(threads.iter().map(|t| t.deadline.timestamp())),
    ];
    Ok(RecordBatch::try_new(
        Arc::new(review::thread_schema()),
        columns,
    )?)
}

fn strings<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

fn utc_seconds(values: impl Iterator<Item = i64>) -> ArrayRef {
    Arc::new(TimestampSecondArray::from_iter_values(values).with_timezone("UTC"))
}
