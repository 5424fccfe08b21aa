//! Quality-annotation parsing and scoring.
//!
//! An external spell/grammar checker writes its findings into a single
//! spreadsheet cell per document, as a `;`-separated run of excerpts each
//! followed by a parenthesized block tagged with a category marker:
//!
//! ```text
//! teh cat (TYPOS:spelling); bad grammer (GRAMMAR:agreement)
//! ```
//!
//! [`parse`] turns that cell into a [`QualityReport`]: per-category counts,
//! a 0–100 score from a linear penalty, and a [`QualityBand`].
//!
//! # Format tolerance
//!
//! The scanner is total. Unknown markers, unbalanced parentheses and free
//! prose contribute nothing; there is no error path.
//!
//! # Occurrence order
//!
//! Excerpts are extracted with one pass per category, so
//! [`QualityReport::occurrences`] is grouped by category in
//! [`IssueCategory::ALL`] order rather than by position in the text.
//! Downstream displays group on this, so it is kept as is.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Highest (and empty-input) quality score.
pub const MAX_SCORE: u32 = 100;

/// Error classes encoded by the upstream checker.
///
/// Variant order is significant: it is the extraction order of
/// [`QualityReport::occurrences`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Typo,
    Punctuation,
    Grammar,
    Typography,
    Redundancy,
    Casing,
    Miscellaneous,
    /// Counted and weighted on its own, reported under `Miscellaneous`.
    RepetitionStyle,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 8] = [
        Self::Typo,
        Self::Punctuation,
        Self::Grammar,
        Self::Typography,
        Self::Redundancy,
        Self::Casing,
        Self::Miscellaneous,
        Self::RepetitionStyle,
    ];

    /// Categories that appear in [`QualityReport::counts`].
    pub const REPORTED: [IssueCategory; 7] = [
        Self::Typo,
        Self::Punctuation,
        Self::Grammar,
        Self::Typography,
        Self::Redundancy,
        Self::Casing,
        Self::Miscellaneous,
    ];

    /// Marker token the checker writes for this category.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Typo => "TYPOS:",
            Self::Punctuation => "PUNCTUATION:",
            Self::Grammar => "GRAMMAR:",
            Self::Typography => "TYPOGRAPHY:",
            Self::Redundancy => "REDUNDANCY:",
            Self::Casing => "CASING:",
            Self::Miscellaneous => "MISC:",
            Self::RepetitionStyle => "REPETITIONS_STYLE:",
        }
    }

    /// Points deducted from the score per occurrence.
    pub fn weight(&self) -> u32 {
        match self {
            Self::Typo => 5,
            Self::Grammar => 4,
            Self::Miscellaneous => 3,
            Self::Punctuation | Self::Redundancy | Self::Casing | Self::RepetitionStyle => 2,
            Self::Typography => 1,
        }
    }

    /// The category this one is reported under.
    pub fn reported_as(&self) -> IssueCategory {
        match self {
            Self::RepetitionStyle => Self::Miscellaneous,
            other => *other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Typo => "typo",
            Self::Punctuation => "punctuation",
            Self::Grammar => "grammar",
            Self::Typography => "typography",
            Self::Redundancy => "redundancy",
            Self::Casing => "casing",
            Self::Miscellaneous => "miscellaneous",
            Self::RepetitionStyle => "repetition_style",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative band derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityBand {
    Excellent,
    Good,
    Fair,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl QualityBand {
    /// Lower bound (inclusive) of each band, checked top-down.
    const THRESHOLDS: [(u32, QualityBand); 4] = [
        (90, Self::Excellent),
        (75, Self::Good),
        (60, Self::Fair),
        (40, Self::Poor),
    ];

    pub fn from_score(score: u32) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(floor, _)| score >= *floor)
            .map(|(_, band)| *band)
            .unwrap_or(Self::VeryPoor)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

impl fmt::Display for QualityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding extracted from an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueOccurrence {
    pub category: IssueCategory,
    /// Text preceding the marker block, trimmed of whitespace and `;`.
    pub excerpt: String,
}

/// Raw marker counts for all eight categories, before folding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueCounts([u32; 8]);

impl IssueCounts {
    pub fn get(&self, category: IssueCategory) -> u32 {
        self.0[category.index()]
    }

    pub fn total(&self) -> u32 {
        self.0.iter().fold(0u32, |acc, n| acc.saturating_add(*n))
    }

    /// Sum of `weight × count`, widened so pathological inputs cannot wrap.
    pub fn deduction(&self) -> u64 {
        IssueCategory::ALL
            .iter()
            .map(|c| u64::from(c.weight()) * u64::from(self.get(*c)))
            .sum()
    }

    /// Counts keyed by reported category, with `RepetitionStyle` folded into
    /// `Miscellaneous`.
    pub fn folded(&self) -> BTreeMap<IssueCategory, u32> {
        let mut out: BTreeMap<IssueCategory, u32> =
            IssueCategory::REPORTED.iter().map(|c| (*c, 0)).collect();
        for category in IssueCategory::ALL {
            let slot = out.entry(category.reported_as()).or_default();
            *slot = slot.saturating_add(self.get(category));
        }
        out
    }
}

/// Parsed form of one annotation cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Per reported category; always holds all seven keys.
    pub counts: BTreeMap<IssueCategory, u32>,
    /// Sum of all eight raw counts.
    pub total_issues: u32,
    pub score: u32,
    pub category: QualityBand,
    pub occurrences: Vec<IssueOccurrence>,
}

impl QualityReport {
    /// Report for a cell with no annotation: no issues, perfect score.
    pub fn empty() -> Self {
        Self::from_parts(IssueCounts::default(), Vec::new())
    }

    fn from_parts(raw: IssueCounts, occurrences: Vec<IssueOccurrence>) -> Self {
        let score = score_for(&raw);
        Self {
            counts: raw.folded(),
            total_issues: raw.total(),
            score,
            category: QualityBand::from_score(score),
            occurrences,
        }
    }

    /// Reported count for a category (`RepetitionStyle` is always 0 here).
    pub fn count(&self, category: IssueCategory) -> u32 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn is_clean(&self) -> bool {
        self.total_issues == 0
    }
}

impl Default for QualityReport {
    fn default() -> Self {
        Self::empty()
    }
}

// ── Parsing ──

/// One compiled excerpt pattern per category, in [`IssueCategory::ALL`] order.
///
/// Each captures the run before `(<MARKER>...)`. Only `;` separates
/// excerpts, so an excerpt may itself contain a parenthetical.
static EXCERPT_PATTERNS: LazyLock<[Regex; 8]> =
    LazyLock::new(|| IssueCategory::ALL.map(excerpt_pattern));

fn excerpt_pattern(category: IssueCategory) -> Regex {
    let pattern = format!(r"([^;]*?)\s*\({}[^)]*\)", regex::escape(category.marker()));
    Regex::new(&pattern).expect("excerpt pattern is built from a fixed marker")
}

/// Count marker tokens per category (case-sensitive substring match).
pub fn count_markers(text: &str) -> IssueCounts {
    let mut counts = [0u32; 8];
    for category in IssueCategory::ALL {
        let n = text.matches(category.marker()).count();
        counts[category.index()] = u32::try_from(n).unwrap_or(u32::MAX);
    }
    IssueCounts(counts)
}

/// Extract excerpts, one pass per category, grouped in category order.
pub fn extract_occurrences(text: &str) -> Vec<IssueOccurrence> {
    let mut occurrences = Vec::new();
    for (category, pattern) in IssueCategory::ALL.iter().zip(EXCERPT_PATTERNS.iter()) {
        for caps in pattern.captures_iter(text) {
            let excerpt = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            occurrences.push(IssueOccurrence {
                category: *category,
                excerpt: excerpt
                    .trim_matches(|c: char| c.is_whitespace() || c == ';')
                    .to_string(),
            });
        }
    }
    occurrences
}

/// Score after deducting weighted counts from [`MAX_SCORE`], floored at 0.
pub fn score_for(counts: &IssueCounts) -> u32 {
    let remaining = u64::from(MAX_SCORE).saturating_sub(counts.deduction());
    // remaining <= MAX_SCORE, so the narrowing is lossless.
    remaining as u32
}

/// Parse one annotation cell.
///
/// `None` and `""` take the explicit empty branch: score 100, `Excellent`.
pub fn parse(text: Option<&str>) -> QualityReport {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return QualityReport::empty(),
    };

    let raw = count_markers(text);
    let report = QualityReport::from_parts(raw, extract_occurrences(text));
    tracing::trace!(
        total_issues = report.total_issues,
        score = report.score,
        band = %report.category,
        "parsed quality annotation"
    );
    report
}
