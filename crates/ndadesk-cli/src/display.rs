//! Plain-text cards and tables for the desk views.

use chrono::{DateTime, Utc};
use ndadesk_core::kpi::Kpis;
use ndadesk_core::screen::DocumentScreen;
use ndadesk_core::util::{format_datetime, time_remaining};
use ndadesk_core::{IssueCategory, QualityBand, QualityReport, ReviewThread, ThreadStatus};
use ndadesk_store::quality_columns::GroupScore;

const MAX_OCCURRENCES: usize = 10;
const MAX_SUBJECT: usize = 40;

// ── Quality ──

/// Print one parsed annotation as a card: score, counts, then findings.
pub fn print_report_card(report: &QualityReport) {
    println!("=== Quality: {} / 100 ({}) ===", report.score, report.category);
    println!();

    println!("Issues");
    println!("  {:<26} {}", "total", report.total_issues);
    for category in IssueCategory::REPORTED {
        let n = report.count(category);
        if n > 0 {
            println!("  {:<26} {}", category.as_str(), n);
        }
    }
    println!();

    if report.occurrences.is_empty() {
        return;
    }
    println!("Findings ({}):", report.occurrences.len());
    for occ in report.occurrences.iter().take(MAX_OCCURRENCES) {
        let excerpt = if occ.excerpt.is_empty() { "-" } else { &occ.excerpt };
        println!("    {:<16} {}", occ.category.as_str(), excerpt);
    }
    if report.occurrences.len() > MAX_OCCURRENCES {
        println!(
            "    ... and {} more",
            report.occurrences.len() - MAX_OCCURRENCES
        );
    }
}

pub fn print_group_scores(group_column: &str, groups: &[GroupScore]) {
    println!("Mean quality by {group_column}");
    for g in groups {
        let band = QualityBand::from_score(g.mean_score.round().clamp(0.0, 100.0) as u32);
        println!(
            "  {:<26} {:>6.1}  {:<10} ({} rows)",
            g.group,
            g.mean_score,
            band.as_str(),
            g.rows
        );
    }
    println!();
}

// ── Threads ──

pub fn print_kpis(kpis: &Kpis) {
    println!("Dashboard");
    println!("  {:<26} {}", "total threads", kpis.total_threads);
    println!("  {:<26} {}", "pending", kpis.pending);
    println!("  {:<26} {}", "in review", kpis.in_review);
    println!("  {:<26} {}", "completed", kpis.completed);
    println!("  {:<26} {}", "overdue", kpis.overdue);
    println!("  {:<26} {:.1}%", "sla compliance", kpis.sla_compliance);
    println!();
}

/// Open (not completed) threads, capped at `limit`, plus how many open
/// threads were left out.
fn open_threads(threads: &[ReviewThread], limit: usize) -> (Vec<&ReviewThread>, usize) {
    let open: Vec<&ReviewThread> = threads
        .iter()
        .filter(|t| t.status != ThreadStatus::Completed)
        .collect();
    let hidden = open.len().saturating_sub(limit);
    (open.into_iter().take(limit).collect(), hidden)
}

/// Listing of open threads, capped at `limit` rows.
pub fn print_threads(threads: &[ReviewThread], limit: usize, now: DateTime<Utc>) {
    let (shown, hidden) = open_threads(threads, limit);
    if shown.is_empty() && hidden == 0 {
        return;
    }
    println!("Open threads ({}):", shown.len() + hidden);
    for t in shown {
        println!(
            "    {:<6} {:<40}  {:<12} {:<10} {:<8} due {}  ({})",
            t.id,
            truncate(&t.subject, MAX_SUBJECT),
            t.client,
            t.status.as_str(),
            t.priority.as_str(),
            format_datetime(&t.deadline),
            time_remaining(t.deadline, now)
        );
    }
    if hidden > 0 {
        println!("    ... and {hidden} more");
    }
    println!();
}

// ── Documents ──

pub fn print_screen(name: &str, screen: &DocumentScreen, compliant: bool) {
    let m = &screen.metrics;
    println!("=== {} ({}) ===", name, screen.id);
    println!("  {:<26} {}", "quality score", m.quality_score);
    println!("  {:<26} {}", "words", m.word_count);
    println!("  {:<26} {}", "spelling issues", m.spelling_issues);
    println!("  {:<26} {}", "style issues", m.style_issues);
    println!(
        "  {:<26} {}",
        "compliance sections",
        if compliant { "all present" } else { "missing" }
    );
    println!();
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}
