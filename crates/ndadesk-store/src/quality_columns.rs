//! Quality columns: score each row's annotation and merge the report back
//! into the row, then filter and aggregate on the merged columns.
//!
//! Appended columns are listed by [`review::quality_fields`]; all are plain
//! scalars so downstream sorting and filtering need no nested access.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, Int32Array, LargeStringArray, StringArray};
use arrow::compute::filter_record_batch;
use arrow::datatypes::{FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use ndadesk_core::quality::{IssueCategory, MAX_SCORE, QualityReport, parse};
use ndadesk_core::review;
use tracing::{debug, info};

use crate::StoreError;

/// Group label for rows whose group column is null.
pub const NO_GROUP: &str = "(none)";

/// Score every row's annotation and append the quality columns.
///
/// Null cells in `column` take the parser's empty branch (score 100). Fails if
/// `column` is missing or not a string column, or if the batch already carries
/// quality columns.
pub fn annotate_batch(batch: &RecordBatch, column: &str) -> Result<RecordBatch, StoreError> {
    let schema = batch.schema();
    let quality_fields = review::quality_fields();
    if let Some(existing) = quality_fields
        .iter()
        .find(|f| schema.index_of(f.name()).is_ok())
    {
        return Err(StoreError::ColumnExists(existing.name().clone()));
    }

    let annotations = StringColumn::from_batch(batch, column)?;
    let reports: Vec<QualityReport> = (0..batch.num_rows())
        .map(|row| parse(annotations.value(row)))
        .collect();

    let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
    fields.extend(quality_fields.into_iter().map(Arc::new));
    let out_schema = Schema::new_with_metadata(fields, schema.metadata().clone());

    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns.extend(report_columns(&reports));

    debug!(rows = batch.num_rows(), column, "annotated batch");
    Ok(RecordBatch::try_new(Arc::new(out_schema), columns)?)
}

/// [`annotate_batch`] over every batch.
pub fn annotate_batches(
    batches: &[RecordBatch],
    column: &str,
) -> Result<Vec<RecordBatch>, StoreError> {
    let out = batches
        .iter()
        .map(|b| annotate_batch(b, column))
        .collect::<Result<Vec<_>, _>>()?;
    let rows: usize = out.iter().map(|b| b.num_rows()).sum();
    info!(batches = out.len(), rows, "scored annotations");
    Ok(out)
}

/// Build the quality columns for a run of reports, in
/// [`review::quality_fields`] order.
pub fn report_columns(reports: &[QualityReport]) -> Vec<ArrayRef> {
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from_iter_values(
            reports.iter().map(|r| to_i32(r.score)),
        )),
        Arc::new(Int32Array::from_iter_values(
            reports.iter().map(|r| to_i32(r.total_issues)),
        )),
        Arc::new(StringArray::from_iter_values(
            reports.iter().map(|r| r.category.as_str()),
        )),
    ];
    for category in IssueCategory::REPORTED {
        columns.push(Arc::new(Int32Array::from_iter_values(
            reports.iter().map(|r| to_i32(r.count(category))),
        )));
    }
    columns
}

fn to_i32(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

// ── Filtering ──

/// Row filter over the quality columns. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityFilter {
    pub min_score: u32,
    pub max_score: u32,
    pub min_issues: u32,
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self {
            min_score: 0,
            max_score: MAX_SCORE,
            min_issues: 0,
        }
    }
}

impl QualityFilter {
    pub fn matches(&self, score: i32, total_issues: i32) -> bool {
        let score = i64::from(score);
        score >= i64::from(self.min_score)
            && score <= i64::from(self.max_score)
            && i64::from(total_issues) >= i64::from(self.min_issues)
    }
}

/// Keep rows that satisfy `filter`. Requires an annotated batch.
pub fn filter_by_quality(
    batch: &RecordBatch,
    filter: &QualityFilter,
) -> Result<RecordBatch, StoreError> {
    let scores = int_column(batch, review::QUALITY_SCORE)?;
    let issues = int_column(batch, review::TOTAL_ISSUES)?;

    let mask: BooleanArray = (0..batch.num_rows())
        .map(|row| {
            Some(
                !scores.is_null(row)
                    && !issues.is_null(row)
                    && filter.matches(scores.value(row), issues.value(row)),
            )
        })
        .collect();

    let out = filter_record_batch(batch, &mask)?;
    debug!(kept = out.num_rows(), of = batch.num_rows(), "filtered by quality");
    Ok(out)
}

// ── Aggregation ──

/// Mean quality score for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupScore {
    pub group: String,
    pub rows: usize,
    pub mean_score: f64,
}

/// Mean `quality_score` per distinct value of `group_column`, sorted by group.
pub fn mean_score_by(
    batches: &[RecordBatch],
    group_column: &str,
) -> Result<Vec<GroupScore>, StoreError> {
    // group → (score sum, rows)
    let mut accum: BTreeMap<String, (i64, usize)> = BTreeMap::new();

    for batch in batches {
        let groups = StringColumn::from_batch(batch, group_column)?;
        let scores = int_column(batch, review::QUALITY_SCORE)?;
        for row in 0..batch.num_rows() {
            if scores.is_null(row) {
                continue;
            }
            let group = groups.value(row).unwrap_or(NO_GROUP);
            let slot = accum.entry(group.to_string()).or_insert((0, 0));
            slot.0 += i64::from(scores.value(row));
            slot.1 += 1;
        }
    }

    Ok(accum
        .into_iter()
        .map(|(group, (sum, rows))| GroupScore {
            group,
            rows,
            mean_score: sum as f64 / rows as f64,
        })
        .collect())
}

/// Rows scoring strictly below `threshold`.
pub fn count_below(batches: &[RecordBatch], threshold: u32) -> Result<usize, StoreError> {
    let mut n = 0;
    for batch in batches {
        let scores = int_column(batch, review::QUALITY_SCORE)?;
        n += (0..scores.len())
            .filter(|&row| {
                !scores.is_null(row) && i64::from(scores.value(row)) < i64::from(threshold)
            })
            .count();
    }
    Ok(n)
}

// ── Column access helpers ──

/// A string column that may be Utf8 or LargeUtf8.
enum StringColumn<'a> {
    Utf8(&'a StringArray),
    LargeUtf8(&'a LargeStringArray),
}

impl<'a> StringColumn<'a> {
    fn from_batch(batch: &'a RecordBatch, name: &str) -> Result<Self, StoreError> {
        let col = batch
            .column_by_name(name)
            .ok_or_else(|| StoreError::MissingColumn(name.to_string()))?;
        if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
            return Ok(Self::Utf8(arr));
        }
        if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
            return Ok(Self::LargeUtf8(arr));
        }
        Err(StoreError::ColumnType {
            column: name.to_string(),
            expected: "Utf8",
            found: col.data_type().to_string(),
        })
    }

    fn value(&self, row: usize) -> Option<&'a str> {
        match *self {
            Self::Utf8(arr) if !arr.is_null(row) => Some(arr.value(row)),
            Self::LargeUtf8(arr) if !arr.is_null(row) => Some(arr.value(row)),
            _ => None,
        }
    }
}

fn int_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array, StoreError> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::MissingColumn(name.to_string()))?;
    col.as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(|| StoreError::ColumnType {
            column: name.to_string(),
            expected: "Int32",
            found: col.data_type().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field};

    /// Batch with `doc`, `client` and `annotations` columns.
    fn sample_batch(rows: &[(&str, Option<&str>, Option<&str>)]) -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("doc", DataType::Utf8, false),
            Field::new("client", DataType::Utf8, true),
            Field::new("annotations", DataType::Utf8, true),
        ]);
        let docs = StringArray::from(rows.iter().map(|r| r.0).collect::<Vec<_>>());
        let clients = StringArray::from(rows.iter().map(|r| r.1).collect::<Vec<_>>());
        let notes = StringArray::from(rows.iter().map(|r| r.2).collect::<Vec<_>>());
        RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(docs), Arc::new(clients), Arc::new(notes)],
        )
        .unwrap()
    }

    fn rows() -> Vec<(&'static str, Option<&'static str>, Option<&'static str>)> {
        vec![
            (
                "nda-1",
                Some("TechCo"),
                Some("teh cat (TYPOS:spelling); bad grammer (GRAMMAR:agreement)"),
            ),
            ("nda-2", Some("TechCo"), None),
            ("nda-3", Some("Acme Corp"), Some("")),
            (
                "nda-4",
                None,
                Some("a (TYPOS:x); b (TYPOS:x); c (TYPOS:x); d (TYPOS:x); e (REPETITIONS_STYLE:x)"),
            ),
        ]
    }

    fn i32_col<'a>(batch: &'a RecordBatch, name: &str) -> &'a Int32Array {
        batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<Int32Array>()
            .unwrap()
    }

    fn str_col<'a>(batch: &'a RecordBatch, name: &str) -> &'a StringArray {
        batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
    }

    #[test]
    fn appends_quality_columns() {
        let out = annotate_batch(&sample_batch(&rows()), "annotations").unwrap();
        assert_eq!(out.num_rows(), 4);
        assert_eq!(out.num_columns(), 3 + 10);

        let scores = i32_col(&out, "quality_score");
        assert_eq!(scores.values().to_vec(), vec![91, 100, 100, 78]);

        let totals = i32_col(&out, "total_issues");
        assert_eq!(totals.values().to_vec(), vec![2, 0, 0, 5]);

        let bands = str_col(&out, "quality_category");
        assert_eq!(bands.value(0), "Excellent");
        assert_eq!(bands.value(3), "Good");

        assert_eq!(i32_col(&out, "typo_count").value(3), 4);
        assert_eq!(i32_col(&out, "misc_count").value(3), 1);
        assert_eq!(i32_col(&out, "grammar_count").value(0), 1);
    }

    #[test]
    fn existing_columns_untouched() {
        let input = sample_batch(&rows());
        let out = annotate_batch(&input, "annotations").unwrap();
        assert_eq!(out.schema().field(0).name(), "doc");
        assert_eq!(str_col(&out, "doc").value(2), "nda-3");
        assert!(str_col(&out, "annotations").is_null(1));
    }

    #[test]
    fn large_utf8_annotations_accepted() {
        let schema = Schema::new(vec![Field::new("notes", DataType::LargeUtf8, true)]);
        let notes = LargeStringArray::from(vec![Some("x (CASING:y)"), None]);
        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(notes)]).unwrap();
        let out = annotate_batch(&batch, "notes").unwrap();
        assert_eq!(i32_col(&out, "quality_score").values().to_vec(), vec![98, 100]);
    }

    #[test]
    fn missing_annotation_column() {
        let err = annotate_batch(&sample_batch(&rows()), "nope").unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn(c) if c == "nope"));
    }

    #[test]
    fn non_string_annotation_column() {
        let schema = Schema::new(vec![Field::new("annotations", DataType::Int32, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(Int32Array::from(vec![1, 2]))],
        )
        .unwrap();
        let err = annotate_batch(&batch, "annotations").unwrap_err();
        assert!(matches!(err, StoreError::ColumnType { expected: "Utf8", .. }));
    }

    #[test]
    fn annotating_twice_is_rejected() {
        let once = annotate_batch(&sample_batch(&rows()), "annotations").unwrap();
        let err = annotate_batch(&once, "annotations").unwrap_err();
        assert!(matches!(err, StoreError::ColumnExists(c) if c == "quality_score"));
    }

    #[test]
    fn filter_by_score_range() {
        let out = annotate_batch(&sample_batch(&rows()), "annotations").unwrap();
        let filter = QualityFilter {
            min_score: 80,
            max_score: 95,
            ..Default::default()
        };
        let kept = filter_by_quality(&out, &filter).unwrap();
        assert_eq!(kept.num_rows(), 1);
        assert_eq!(str_col(&kept, "doc").value(0), "nda-1");
    }

    #[test]
    fn filter_by_min_issues() {
        let out = annotate_batch(&sample_batch(&rows()), "annotations").unwrap();
        let filter = QualityFilter {
            min_issues: 1,
            ..Default::default()
        };
        let kept = filter_by_quality(&out, &filter).unwrap();
        let docs: Vec<&str> = (0..kept.num_rows())
            .map(|i| str_col(&kept, "doc").value(i))
            .collect();
        assert_eq!(docs, vec!["nda-1", "nda-4"]);
    }

    #[test]
    fn default_filter_keeps_everything() {
        let out = annotate_batch(&sample_batch(&rows()), "annotations").unwrap();
        let kept = filter_by_quality(&out, &QualityFilter::default()).unwrap();
        assert_eq!(kept.num_rows(), 4);
    }

    #[test]
    fn filter_requires_annotated_batch() {
        let err = filter_by_quality(&sample_batch(&rows()), &QualityFilter::default()).unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn(c) if c == "quality_score"));
    }

    #[test]
    fn mean_score_per_client() {
        let out = annotate_batch(&sample_batch(&rows()), "annotations").unwrap();
        let groups = mean_score_by(&[out], "client").unwrap();
        assert_eq!(
            groups,
            vec![
                GroupScore {
                    group: NO_GROUP.into(),
                    rows: 1,
                    mean_score: 78.0,
                },
                GroupScore {
                    group: "Acme Corp".into(),
                    rows: 1,
                    mean_score: 100.0,
                },
                GroupScore {
                    group: "TechCo".into(),
                    rows: 2,
                    mean_score: 95.5,
                },
            ]
        );
    }

    #[test]
    fn mean_score_spans_batches() {
        let a = annotate_batch(&sample_batch(&rows()[..2]), "annotations").unwrap();
        let b = annotate_batch(&sample_batch(&rows()[2..]), "annotations").unwrap();
        let groups = mean_score_by(&[a, b], "client").unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups.iter().map(|g| g.rows).sum::<usize>(), 4);
    }

    #[test]
    fn count_below_threshold() {
        let out = annotate_batch(&sample_batch(&rows()), "annotations").unwrap();
        assert_eq!(count_below(&[out.clone()], 80).unwrap(), 1);
        assert_eq!(count_below(&[out], 100).unwrap(), 2);
    }
}
