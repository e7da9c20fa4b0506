//! Format node listings, metadata, and deletion reports as text.

use crate::delete::{AbortReason, DeletionOutcome, DeletionReport, DeletionStatus};
use crate::path::NodePath;
use crate::store::Stat;
use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// One child name per line.
pub fn format_children_text(children: &[String]) -> String {
    if children.is_empty() {
        return "(no children)".to_string();
    }
    children.join("\n")
}

/// Node metadata as a two-column table.
pub fn format_stat_text(path: &NodePath, stat: &Stat) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["version".to_string(), stat.version.to_string()]);
    table.add_row(vec!["child_version".to_string(), stat.child_version.to_string()]);
    table.add_row(vec!["num_children".to_string(), stat.num_children.to_string()]);
    table.add_row(vec!["data_length".to_string(), stat.data_length.to_string()]);
    table.add_row(vec!["created".to_string(), format_millis(stat.created_ms)]);
    table.add_row(vec!["modified".to_string(), format_millis(stat.modified_ms)]);
    format!("{}\n\n{}\n", format_section_heading(path.as_str()), table)
}

/// Single-node delete result.
pub fn format_outcome_text(outcome: &DeletionOutcome) -> String {
    match outcome.status.reason() {
        Some(reason) => format!("{} {}: {}", outcome.status.label(), outcome.path, reason),
        None => format!("{} {}", outcome.status.label(), outcome.path),
    }
}

/// Full report of a recursive delete: per-node table then a summary line.
pub fn format_report_text(report: &DeletionReport, connect_string: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Delete {} on {}", report.root, connect_string))
    ));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Path", "Status", "Reason"]);
    for outcome in report.outcomes() {
        table.add_row(vec![
            outcome.path.to_string(),
            outcome.status.label().to_string(),
            outcome.status.reason().unwrap_or("").to_string(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));

    let summary = report.summary();
    let line = format!(
        "deleted: {}, not found: {}, conflicts: {}, failed: {} ({} ms)",
        summary.deleted,
        summary.not_found,
        summary.version_conflicts,
        summary.failed,
        report.duration_ms
    );
    if report.is_complete() {
        out.push_str(&format!("{}\n", line.green()));
    } else {
        out.push_str(&format!("{}\n", line.yellow()));
    }

    match &report.aborted {
        Some(AbortReason::StoreUnavailable { path, error }) => {
            out.push_str(&format!("{} at {}: {}\n", "aborted".red(), path, error));
        }
        Some(AbortReason::Cancelled { path }) => {
            out.push_str(&format!("{} at {}\n", "cancelled".red(), path));
        }
        None => {}
    }
    if matches!(
        report.root_outcome().map(|o| &o.status),
        Some(DeletionStatus::VersionConflict)
    ) {
        out.push_str("root changed concurrently; re-run to retry\n");
    }
    out
}

fn format_millis(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}
