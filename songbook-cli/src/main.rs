//! Songbook — keep a directory of per-song JSON files and its consolidated
//! index in sync.
//!
//! # Usage
//!
//! ```text
//! songbook [--root <dir>] [--config <file>] [-v] sync [--dry-run] [--json]
//! songbook check [--json]
//! songbook diff
//! ```
//!
//! Exit status is 0 when the aggregate ends up synchronized and sorted,
//! 1 otherwise (fatal error, residual desync, refusal or interruption).

mod commands;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{check::CheckArgs, diff::DiffArgs, sync::SyncArgs};
use songbook_sync::{Interrupt, SyncError, SyncState};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "songbook",
    version,
    about = "Reconcile per-song JSON files with their consolidated index",
    long_about = None,
)]
struct Cli {
    /// Directory that relative detail/aggregate paths resolve against.
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    root: PathBuf,

    /// Config file (defaults to <root>/songbook.yaml when present).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add, remove and reorder aggregate records to match the detail files.
    Sync(SyncArgs),

    /// Report whether the aggregate matches the detail files, without writing.
    Check(CheckArgs),

    /// Show a unified diff of what sync would write to the aggregate.
    Diff(DiffArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub root: PathBuf,
    pub config: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let global = GlobalArgs {
        root: cli.root,
        config: cli.config,
    };
    let interrupt = Interrupt::new();

    let result = install_interrupt_handler(&interrupt).and_then(|()| match cli.command {
        Commands::Sync(args) => args.run(&global, &interrupt),
        Commands::Check(args) => args.run(&global),
        Commands::Diff(args) => args.run(&global),
    });

    match result {
        Ok(code) => code,
        Err(err) => {
            if let Some(SyncError::Interrupted { state, saved }) = err.downcast_ref::<SyncError>() {
                eprintln!("\n⏹  {}", interrupted_message(*state, *saved));
            } else {
                eprintln!("{} {err:#}", "error:".red().bold());
            }
            ExitCode::FAILURE
        }
    }
}

fn interrupted_message(state: SyncState, saved: bool) -> String {
    if saved {
        format!("sync interrupted before {state}; aggregate written but not verified")
    } else {
        format!("sync interrupted before {state}; aggregate left untouched")
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// First Ctrl-C raises the interrupt flag so the run stops at the next state
/// boundary; a second one exits immediately.
fn install_interrupt_handler(interrupt: &Interrupt) -> Result<()> {
    let interrupt = interrupt.clone();
    ctrlc::set_handler(move || {
        if interrupt.is_raised() {
            std::process::exit(1);
        }
        tracing::warn!("received ctrl-c, stopping at the next step");
        interrupt.raise();
    })
    .context("failed to install Ctrl-C handler")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_before_save_reports_untouched_aggregate() {
        let msg = interrupted_message(SyncState::SortAndSave, false);
        assert_eq!(msg, "sync interrupted before sort-and-save; aggregate left untouched");
    }

    #[test]
    fn interrupt_after_save_does_not_claim_untouched() {
        let msg = interrupted_message(SyncState::Verify, true);
        assert!(msg.contains("written but not verified"), "got: {msg}");
        assert!(!msg.contains("untouched"));
    }
}
