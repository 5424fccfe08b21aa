//! Quick screen of raw document text, for documents that have not been
//! through the external checker yet.
//!
//! The heuristic is deliberately coarse: one assumed spelling slip per 500
//! words (capped at three) and one style issue for documents over 5000 words.

use serde::{Deserialize, Serialize};

use crate::quality::MAX_SCORE;

const WORDS_PER_SPELLING_ISSUE: usize = 500;
const MAX_SPELLING_ISSUES: usize = 3;
const LONG_DOCUMENT_WORDS: usize = 5000;
const SPELLING_PENALTY: u32 = 5;
const STYLE_PENALTY: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenMetrics {
    pub quality_score: u32,
    pub word_count: usize,
    pub spelling_issues: u32,
    pub style_issues: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentScreen {
    pub id: String,
    #[serde(flatten)]
    pub metrics: ScreenMetrics,
}

/// Screen one document body.
pub fn screen_text(content: &str) -> ScreenMetrics {
    let word_count = content.split_whitespace().count();
    // Capped at MAX_SPELLING_ISSUES, so the narrowing is lossless.
    let spelling_issues = (word_count / WORDS_PER_SPELLING_ISSUE).min(MAX_SPELLING_ISSUES) as u32;
    let style_issues = u32::from(word_count > LONG_DOCUMENT_WORDS);
    let quality_score = MAX_SCORE
        .saturating_sub(spelling_issues * SPELLING_PENALTY + style_issues * STYLE_PENALTY);
    ScreenMetrics {
        quality_score,
        word_count,
        spelling_issues,
        style_issues,
    }
}

/// Screens documents and numbers them `D001`, `D002`, ...
#[derive(Debug, Default)]
pub struct DocumentScreener {
    analyzed: u32,
}

impl DocumentScreener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&mut self, content: &str) -> DocumentScreen {
        let metrics = screen_text(content);
        self.analyzed += 1;
        DocumentScreen {
            id: format!("D{:03}", self.analyzed),
            metrics,
        }
    }

    pub fn analyzed_count(&self) -> u32 {
        self.analyzed
    }
}

/// Whether every required section keyword appears (case-insensitive).
pub fn check_compliance<S: AsRef<str>>(content: &str, required_sections: &[S]) -> bool {
    let lower = content.to_lowercase();
    required_sections
        .iter()
        .all(|s| lower.contains(&s.as_ref().to_lowercase()))
}
