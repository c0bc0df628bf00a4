//! `songbook diff` — show the unified diff sync would apply to the aggregate.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use songbook_sync::{
    pipeline::{self, SyncOptions},
    unified_diff,
};

use super::{open_store, resolve_config, LayoutArgs};
use crate::GlobalArgs;

/// Arguments for `songbook diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Include drifted-content refreshes in the diff.
    #[arg(long)]
    pub refresh_existing: bool,
}

impl DiffArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let mut config = resolve_config(global, &self.layout)?;
        config.refresh_existing |= self.refresh_existing;
        let store = open_store(global, &config);

        let preview = pipeline::preview(&store, &SyncOptions::from_config(&config, true))
            .with_context(|| format!("diff failed for '{}'", store.aggregate.display()))?;

        let label = preview
            .aggregate_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| preview.aggregate_path.display().to_string());
        let diff = unified_diff(&preview.current, &preview.proposed, &label);
        if diff.is_empty() {
            println!("No differences for '{label}'.");
            return Ok(ExitCode::SUCCESS);
        }

        print!("{diff}");
        if !diff.ends_with('\n') {
            println!();
        }
        Ok(ExitCode::SUCCESS)
    }
}
