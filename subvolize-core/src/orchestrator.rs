// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use subvolize_btrfs::SubvolumeOps;
use subvolize_types::{
    ConversionTarget, MigrationOutcome, RunSummary, TargetReport, TargetStatus, VolumeSpec,
};

use crate::classifier::classify;
use crate::context::RunContext;
use crate::error::{ClassificationError, MigrationError, MigrationStep, RunError, TargetError};
use crate::executor::MigrationExecutor;
use crate::resolver::resolve;

/// Bring every target of `spec` to the subvolume state, one target at a time.
///
/// Only configuration and privilege problems are returned as errors, and both are
/// detected before any target is looked at. Everything that goes wrong with an
/// individual target ends up in that target's report and the run moves on.
pub fn run(ctx: &mut RunContext<'_>, spec: &VolumeSpec) -> Result<RunSummary, RunError> {
    spec.validate()?;

    if !ctx.options.dry_run && !ctx.options.privileged {
        return Err(RunError::Permission {
            base: spec.base_path.clone(),
            euid: ctx.options.euid,
        });
    }

    let targets = resolve(spec);
    tracing::info!(
        "Processing {} targets under {}{}",
        targets.len(),
        spec.base_path.display(),
        if ctx.options.dry_run { " (dry run)" } else { "" }
    );

    let executor =
        MigrationExecutor::new(ctx.subvolumes, spec.quarantine_path()).with_ownership(ctx.ownership);
    let mut summary = RunSummary::new(spec.base_path.clone(), ctx.options.dry_run);

    for target in &targets {
        tracing::info!("Processing: {}", target.full_path.display());

        let (report, quarantined) = process_target(ctx, &executor, target);
        if quarantined.is_some() {
            summary.quarantine = Some(executor.quarantine_root().to_path_buf());
        }

        ctx.sink.report(&report);
        summary.push(report);
    }

    Ok(summary)
}

/// Classify every target without changing anything
pub fn survey(
    subvolumes: &dyn SubvolumeOps,
    spec: &VolumeSpec,
) -> Result<Vec<(ConversionTarget, Result<TargetStatus, ClassificationError>)>, RunError> {
    spec.validate()?;

    Ok(resolve(spec)
        .into_iter()
        .map(|target| {
            let status = classify(subvolumes, &target.full_path);
            (target, status)
        })
        .collect())
}

/// Report for one target, plus where its data sits in quarantine (planned or actual)
fn process_target(
    ctx: &mut RunContext<'_>,
    executor: &MigrationExecutor<'_>,
    target: &ConversionTarget,
) -> (TargetReport, Option<PathBuf>) {
    let status = match classify(ctx.subvolumes, &target.full_path) {
        Ok(status) => status,
        Err(error) => {
            tracing::error!("  ✗ {}", error);
            return (failed(target, None, TargetError::from(error)), None);
        }
    };

    match status {
        TargetStatus::IsSubvolume => {
            tracing::info!("  ✓ Already a subvolume");
            let report =
                report(target, status, MigrationOutcome::AlreadySubvolume, "already a subvolume");
            (report, None)
        }
        TargetStatus::NotPresent => (create_missing(ctx, target), None),
        TargetStatus::ExistsAsPlainPath => convert_existing(ctx, executor, target),
    }
}

fn create_missing(ctx: &mut RunContext<'_>, target: &ConversionTarget) -> TargetReport {
    let status = TargetStatus::NotPresent;

    if ctx.options.dry_run {
        tracing::info!("    [DRY RUN] Would create subvolume: {}", target.full_path.display());
        let mut planned = report(target, status, MigrationOutcome::Created, "would create subvolume");
        planned.planned = true;
        return planned;
    }

    match ctx.subvolumes.create(&target.full_path) {
        Ok(()) => {
            tracing::info!("    Created subvolume: {}", target.full_path.display());
            report(target, status, MigrationOutcome::Created, "created subvolume")
        }
        Err(e) => {
            let error = MigrationError::new(
                MigrationStep::CreateSubvolume,
                target.full_path.clone(),
                e,
            );
            tracing::error!("    Failed to create subvolume: {}", error);
            failed(target, Some(status), error.into())
        }
    }
}

fn convert_existing(
    ctx: &mut RunContext<'_>,
    executor: &MigrationExecutor<'_>,
    target: &ConversionTarget,
) -> (TargetReport, Option<PathBuf>) {
    let status = TargetStatus::ExistsAsPlainPath;
    let quarantined = executor.quarantine_path(target);
    tracing::warn!("  ⚠ Path exists as regular directory/file");

    if let Err(error) = executor.preflight(target) {
        tracing::error!("    {}", error);
        let mut report = failed(target, Some(status), error.into());
        report.planned = ctx.options.dry_run;
        return (report, None);
    }

    if ctx.options.dry_run {
        let (mut planned, quarantined) = if ctx.options.interactive {
            tracing::info!(
                "    [DRY RUN] Would convert via {}",
                quarantined.display()
            );
            let planned = report(
                target,
                status,
                MigrationOutcome::Converted,
                format!("would convert via {}", quarantined.display()),
            );
            (planned, Some(quarantined))
        } else {
            tracing::info!("    [DRY RUN] Would need interactive confirmation to convert");
            let planned = report(
                target,
                status,
                MigrationOutcome::Skipped,
                "would need interactive confirmation to convert",
            );
            (planned, None)
        };
        planned.planned = true;
        return (planned, quarantined);
    }

    if !ctx.options.interactive {
        tracing::warn!("    Conversion needs an interactive run - skipped");
        let skipped = report(
            target,
            status,
            MigrationOutcome::Skipped,
            "holds data; rerun interactively to convert",
        );
        return (skipped, None);
    }

    let description = format!(
        "Convert {} into a subvolume? Its data will be moved to {} and copied back.",
        target.full_path.display(),
        quarantined.display()
    );
    if !ctx.confirm.confirm(&description) {
        tracing::warn!("    Conversion declined");
        let declined = report(target, status, MigrationOutcome::Skipped, "conversion declined");
        return (declined, None);
    }

    match executor.convert(target) {
        Ok(conversion) => {
            tracing::info!("  ✓ Converted {}", target.full_path.display());
            let mut converted = report(
                target,
                status,
                MigrationOutcome::Converted,
                format!(
                    "converted; original kept at {}",
                    conversion.quarantined.display()
                ),
            );
            converted.ownership = Some(conversion.ownership);
            converted.ownership_warning = conversion.ownership_error.map(|e| e.to_string());
            (converted, Some(conversion.quarantined))
        }
        Err(error) => {
            tracing::error!("  ✗ {}", error);
            tracing::error!("    {}", error.recovery_hint());
            let quarantined = error.quarantined.clone();
            (failed(target, Some(status), error.into()), quarantined)
        }
    }
}

fn report(
    target: &ConversionTarget,
    status: TargetStatus,
    outcome: MigrationOutcome,
    message: impl Into<String>,
) -> TargetReport {
    TargetReport {
        name: target.name.clone(),
        path: target.full_path.clone(),
        status: Some(status),
        outcome,
        planned: false,
        message: message.into(),
        ownership: None,
        ownership_warning: None,
    }
}

fn failed(
    target: &ConversionTarget,
    status: Option<TargetStatus>,
    error: TargetError,
) -> TargetReport {
    let (message, ownership) = match &error {
        TargetError::Classification(e) => (e.to_string(), None),
        TargetError::Migration(e) => (format!("{}; {}", e, e.recovery_hint()), e.ownership),
    };

    TargetReport {
        name: target.name.clone(),
        path: target.full_path.clone(),
        status,
        outcome: MigrationOutcome::Failed,
        planned: false,
        message,
        ownership,
        ownership_warning: None,
    }
}
