// SPDX-License-Identifier: GPL-3.0-only

use subvolize_core::ReportSink;
use subvolize_types::{MigrationOutcome, RunSummary, TargetReport, Tally};

/// Prints one line per finished target to stdout
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn report(&mut self, report: &TargetReport) {
        println!("{}", format_report(report));
        if let Some(warning) = &report.ownership_warning {
            println!("    ownership needs manual correction: {warning}");
        }
    }
}

/// Reports are only collected for the JSON document printed at the end
pub struct SilentSink;

impl ReportSink for SilentSink {
    fn report(&mut self, _report: &TargetReport) {}
}

fn outcome_label(outcome: MigrationOutcome, planned: bool) -> &'static str {
    match (outcome, planned) {
        (MigrationOutcome::AlreadySubvolume, _) => "ok",
        (MigrationOutcome::Created, false) => "created",
        (MigrationOutcome::Created, true) => "would create",
        (MigrationOutcome::Converted, false) => "converted",
        (MigrationOutcome::Converted, true) => "would convert",
        (MigrationOutcome::Skipped, _) => "skipped",
        (MigrationOutcome::Failed, _) => "failed",
    }
}

pub fn format_report(report: &TargetReport) -> String {
    format!(
        "[{}] {}: {}",
        outcome_label(report.outcome, report.planned),
        report.path.display(),
        report.message
    )
}

/// Human-readable end-of-run summary for all volumes
pub fn format_summary(summaries: &[RunSummary]) -> String {
    let mut tally = Tally::default();
    for summary in summaries {
        tally.merge(summary.tally);
    }
    let dry_run = summaries.iter().any(|summary| summary.dry_run);

    let mut lines = vec![
        String::new(),
        "=== Summary ===".to_string(),
        format!("Already subvolumes: {}", tally.existing),
    ];
    if dry_run {
        lines.push(format!("Would create/convert: {}", tally.created));
    } else {
        lines.push(format!("Created/converted: {}", tally.created));
    }
    lines.push(format!("Failed/Manual intervention needed: {}", tally.failed));

    for summary in summaries {
        if let Some(quarantine) = &summary.quarantine {
            if summary.dry_run {
                lines.push(format!(
                    "Original data would be kept in {}",
                    quarantine.display()
                ));
            } else {
                lines.push(format!(
                    "Original data kept in {}; verify the new subvolumes, then remove it manually",
                    quarantine.display()
                ));
            }
        }
    }

    if tally.failed > 0 {
        lines.push(String::new());
        lines.push("Some targets need attention:".to_string());
        lines.push(
            "  - skipped targets hold data; rerun with --interactive to convert them".to_string(),
        );
        lines.push(
            "  - failed targets list the failing step and where their data is above".to_string(),
        );
    }

    lines.join("\n")
}
