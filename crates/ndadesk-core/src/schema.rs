/// Arrow schema definitions for review-desk tables.
pub mod review {
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};

    use crate::quality::IssueCategory;

    pub const QUALITY_SCORE: &str = "quality_score";
    pub const TOTAL_ISSUES: &str = "total_issues";
    pub const QUALITY_CATEGORY: &str = "quality_category";

    /// Default name of the column holding checker annotations.
    pub const ANNOTATION_COLUMN: &str = "annotations";

    /// Count column for a reported category.
    ///
    /// `RepetitionStyle` has no column of its own; it is folded into
    /// `misc_count`.
    pub fn count_column(category: IssueCategory) -> &'static str {
        match category.reported_as() {
            IssueCategory::Typo => "typo_count",
            IssueCategory::Punctuation => "punctuation_count",
            IssueCategory::Grammar => "grammar_count",
            IssueCategory::Typography => "typography_count",
            IssueCategory::Redundancy => "redundancy_count",
            IssueCategory::Casing => "casing_count",
            IssueCategory::Miscellaneous | IssueCategory::RepetitionStyle => "misc_count",
        }
    }

    /// Columns appended to a row once its annotation has been scored.
    pub fn quality_fields() -> Vec<Field> {
        let mut fields = vec![
            Field::new(QUALITY_SCORE, DataType::Int32, false),
            Field::new(TOTAL_ISSUES, DataType::Int32, false),
            Field::new(QUALITY_CATEGORY, DataType::Utf8, false),
        ];
        fields.extend(
            IssueCategory::REPORTED
                .iter()
                .map(|c| Field::new(count_column(*c), DataType::Int32, false)),
        );
        fields
    }

    /// Schema for review threads opened by email intake.
    pub fn thread_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("subject", DataType::Utf8, false),
            Field::new("sender", DataType::Utf8, false),
            Field::new("client", DataType::Utf8, false),
            Field::new("status", DataType::Utf8, false),
            Field::new("priority", DataType::Utf8, false),
            Field::new(
                "received",
                DataType::Timestamp(TimeUnit::Second, Some("UTC".into())),
                false,
            ),
            Field::new(
                "deadline",
                DataType::Timestamp(TimeUnit::Second, Some("UTC".into())),
                false,
            ),
        ])
    }
}
