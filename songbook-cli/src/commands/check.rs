//! `songbook check` — verify without reconciling or writing.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use songbook_sync::pipeline;

use super::{open_store, resolve_config, LayoutArgs};
use crate::{report, GlobalArgs};

/// Arguments for `songbook check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub layout: LayoutArgs,
}

impl CheckArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let config = resolve_config(global, &self.layout)?;
        let store = open_store(global, &config);
        let report = pipeline::check(&store)
            .with_context(|| format!("check failed for '{}'", store.aggregate.display()))?;

        if self.json {
            report::print_check_json(&report)?;
        } else {
            report::print_check(&report);
        }

        Ok(if report.verification.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}
