// SPDX-License-Identifier: GPL-3.0-only

//! subvolize - prepare a btrbk-managed tree by turning its configured
//! directories into BTRFS subvolumes
//!
//! Must run as root unless `--dry-run` is given.

mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use subvolize_btrfs::SubvolumeManager;
use subvolize_core::{ConsolePrompt, ReportSink, RunContext, RunOptions};
use subvolize_types::{RunSummary, VolumeSpec};

use crate::output::{ConsoleSink, SilentSink};

/// Create or convert BTRFS subvolumes declared in a btrbk configuration
#[derive(Parser)]
#[command(name = "subvolize")]
#[command(about = "Create BTRFS subvolumes from btrbk configuration", long_about = None)]
struct Cli {
    /// Path to btrbk.conf
    #[arg(long, global = true, default_value = "btrbk.conf")]
    config: PathBuf,

    /// Log debug detail (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing subvolumes and convert directories that hold data
    Convert {
        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,
        /// Ask before converting each directory that already holds data
        #[arg(long)]
        interactive: bool,
        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Show the current state of every configured target
    Status {
        /// Print statuses as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for reports and JSON
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode> {
    tracing::info!("Reading config: {}", cli.config.display());
    let specs = config::load_config(&cli.config)?;
    let total: usize = specs.iter().map(|spec| spec.target_names.len()).sum();
    tracing::info!("Found {} subvolumes to process", total);

    let subvolumes = SubvolumeManager::new();

    match cli.command {
        Commands::Convert {
            dry_run,
            interactive,
            json,
        } => {
            let options = RunOptions {
                dry_run,
                interactive,
                privileged: subvolize_sys::is_privileged(),
                euid: subvolize_sys::effective_uid(),
            };
            if dry_run {
                tracing::info!("=== DRY RUN MODE - No changes will be made ===");
            }

            let mut prompt = ConsolePrompt::stdio();
            let mut console = ConsoleSink;
            let mut silent = SilentSink;
            let sink: &mut dyn ReportSink = if json { &mut silent } else { &mut console };

            let mut ctx = RunContext::new(options, &subvolumes, &mut prompt, sink);
            let (summaries, outcome) = convert_volumes(&mut ctx, &specs);

            // Volumes finished before a run-level error still get their summary printed
            if !summaries.is_empty() || outcome.is_ok() {
                if json {
                    println!("{}", serde_json::to_string_pretty(&summaries)?);
                } else {
                    println!("{}", output::format_summary(&summaries));
                }
            }
            outcome?;

            if summaries.iter().all(RunSummary::is_clean) {
                Ok(ExitCode::SUCCESS)
            } else {
                tracing::warn!("Some directories need manual conversion.");
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Status { json } => {
            let mut rows = Vec::new();
            let mut all_classified = true;

            for spec in &specs {
                for (target, status) in subvolize_core::survey(&subvolumes, spec)? {
                    let (status, error) = match status {
                        Ok(status) => (Some(status), None),
                        Err(e) => {
                            all_classified = false;
                            (None, Some(e.to_string()))
                        }
                    };

                    if !json {
                        let label = match (&status, &error) {
                            (Some(status), _) => status.as_str().to_string(),
                            (None, Some(error)) => format!("error: {error}"),
                            (None, None) => "unknown".to_string(),
                        };
                        println!("{}: {}", target.full_path.display(), label);
                    }

                    rows.push(serde_json::json!({
                        "name": target.name,
                        "path": target.full_path,
                        "status": status,
                        "error": error,
                    }));
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }

            Ok(if all_classified {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Run every volume in order, stopping at the first run-level error.
///
/// Summaries of the volumes finished before that error are still returned.
fn convert_volumes(
    ctx: &mut RunContext<'_>,
    specs: &[VolumeSpec],
) -> (Vec<RunSummary>, Result<()>) {
    let mut summaries = Vec::with_capacity(specs.len());

    for spec in specs {
        match subvolize_core::run(ctx, spec)
            .with_context(|| format!("volume {}", spec.base_path.display()))
        {
            Ok(summary) => summaries.push(summary),
            Err(e) => return (summaries, Err(e)),
        }
    }

    (summaries, Ok(()))
}
