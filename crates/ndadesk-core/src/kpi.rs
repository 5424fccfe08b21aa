//! Dashboard KPIs over review threads and quality reports.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intake::{ReviewThread, ThreadStatus};
use crate::quality::{QualityBand, QualityReport};

/// Headline numbers for the review desk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_threads: usize,
    pub pending: usize,
    pub in_review: usize,
    pub completed: usize,
    /// Open threads past their deadline.
    pub overdue: usize,
    /// Percentage of threads not overdue, one decimal place.
    pub sla_compliance: f64,
}

impl Kpis {
    fn empty() -> Self {
        Self {
            total_threads: 0,
            pending: 0,
            in_review: 0,
            completed: 0,
            overdue: 0,
            sla_compliance: 100.0,
        }
    }
}

/// Compute KPIs as of `now`.
pub fn calculate_kpis(threads: &[ReviewThread], now: DateTime<Utc>) -> Kpis {
    if threads.is_empty() {
        return Kpis::empty();
    }

    let mut kpis = Kpis::empty();
    kpis.total_threads = threads.len();
    for thread in threads {
        match thread.status {
            ThreadStatus::Pending => kpis.pending += 1,
            ThreadStatus::InReview => kpis.in_review += 1,
            ThreadStatus::Completed => kpis.completed += 1,
        }
        if thread.status != ThreadStatus::Completed && thread.deadline < now {
            kpis.overdue += 1;
        }
    }

    let on_time = (kpis.total_threads - kpis.overdue) as f64;
    let pct = on_time / kpis.total_threads as f64 * 100.0;
    kpis.sla_compliance = (pct * 10.0).round() / 10.0;
    kpis
}

/// Mean score over a set of reports; `None` when there are none.
pub fn mean_quality(reports: &[QualityReport]) -> Option<f64> {
    if reports.is_empty() {
        return None;
    }
    let sum: u64 = reports.iter().map(|r| u64::from(r.score)).sum();
    Some(sum as f64 / reports.len() as f64)
}

/// Number of reports in each band; every band is present.
pub fn band_distribution(reports: &[QualityReport]) -> BTreeMap<QualityBand, usize> {
    let mut out: BTreeMap<QualityBand, usize> = [
        QualityBand::Excellent,
        QualityBand::Good,
        QualityBand::Fair,
        QualityBand::Poor,
        QualityBand::VeryPoor,
    ]
    .into_iter()
    .map(|b| (b, 0))
    .collect();
    for report in reports {
        *out.entry(report.category).or_default() += 1;
    }
    out
}
