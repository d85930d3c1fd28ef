//! Per-artifact summary table shared by `init` and `deploy`.

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use stevedore_reconcile::{Reason, ReconcileReport, RollbackReport};

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "")]
    indicator: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Result")]
    result: String,
}

fn indicator(reason: Reason) -> String {
    match reason {
        Reason::Created => "■".green().bold().to_string(),
        Reason::Overwritten | Reason::Forced => "■".yellow().bold().to_string(),
        Reason::Streamed => "■".cyan().bold().to_string(),
        Reason::Unchanged => "■".bright_black().bold().to_string(),
        Reason::Declined | Reason::Protected | Reason::DiffShown => {
            "■".magenta().bold().to_string()
        }
    }
}

pub fn render(reports: &[ReconcileReport]) -> String {
    let rows: Vec<SummaryRow> = reports
        .iter()
        .map(|r| SummaryRow {
            indicator: indicator(r.reason),
            file: r.path.display().to_string(),
            result: r.reason.to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// One-line tally, e.g. `2 written, 1 unchanged, 1 kept`.
pub fn tally(reports: &[ReconcileReport]) -> String {
    let written = reports.iter().filter(|r| r.written()).count();
    let unchanged = reports
        .iter()
        .filter(|r| r.reason == Reason::Unchanged)
        .count();
    let kept = reports.len() - written - unchanged;
    format!("{written} written, {unchanged} unchanged, {kept} kept")
}

/// Hint printed after a run that left differing files alone.
pub fn kept_hint(reports: &[ReconcileReport]) -> Option<String> {
    let protected: Vec<String> = reports
        .iter()
        .filter(|r| r.reason == Reason::Protected)
        .map(|r| r.path.display().to_string())
        .collect();
    if protected.is_empty() {
        return None;
    }
    Some(format!(
        "Kept {} (differs from generated). Re-run with --force to overwrite.",
        protected.join(", ")
    ))
}

pub fn describe_rollback(report: &RollbackReport) -> String {
    let mut line = format!(
        "rolled back {} file(s) and {} dir(s)",
        report.removed_files.len(),
        report.removed_dirs.len()
    );
    if !report.kept_dirs.is_empty() {
        line.push_str(&format!(", kept {} non-empty dir(s)", report.kept_dirs.len()));
    }
    if !report.failures.is_empty() {
        line.push_str(&format!(", {} could not be removed", report.failures.len()));
    }
    line
}
