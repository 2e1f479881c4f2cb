// SPDX-License-Identifier: GPL-3.0-only

use subvolize_types::TargetReport;

/// Receives each target's report as soon as it is final
pub trait ReportSink {
    fn report(&mut self, report: &TargetReport);
}

impl ReportSink for Vec<TargetReport> {
    fn report(&mut self, report: &TargetReport) {
        self.push(report.clone());
    }
}
