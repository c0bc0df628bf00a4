//! `songbook sync` — reconcile, sort, persist and verify the aggregate.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use songbook_core::{DuplicatePolicy, OrphanPolicy};
use songbook_sync::{
    pipeline::{self, SyncOptions},
    Interrupt,
};

use super::{open_store, resolve_config, LayoutArgs};
use crate::{report, GlobalArgs};

/// Arguments for `songbook sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Show what would change without writing the aggregate.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the full run report as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Overwrite aggregate records whose content drifted from their detail file.
    #[arg(long)]
    pub refresh_existing: bool,

    /// Aggregate records without a detail file: remove | refuse.
    #[arg(long, value_name = "POLICY")]
    pub orphans: Option<OrphanPolicy>,

    /// Two detail files with the same Title: warn | fail.
    #[arg(long, value_name = "POLICY")]
    pub duplicates: Option<DuplicatePolicy>,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs, interrupt: &Interrupt) -> Result<ExitCode> {
        let mut config = resolve_config(global, &self.layout)?;
        if let Some(orphans) = self.orphans {
            config.orphans = orphans;
        }
        if let Some(duplicates) = self.duplicates {
            config.duplicates = duplicates;
        }
        config.refresh_existing |= self.refresh_existing;

        let store = open_store(global, &config);
        let options = SyncOptions::from_config(&config, self.dry_run);
        let report = pipeline::run(&store, &options, interrupt)
            .with_context(|| format!("sync failed for '{}'", store.aggregate.display()))?;

        if self.json {
            report::print_sync_json(&report)?;
        } else {
            report::print_sync(&report);
        }

        Ok(if report.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}
