pub mod check;
pub mod diff;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use songbook_core::{config, SyncConfig};
use songbook_sync::FsStore;

use crate::GlobalArgs;

/// Path overrides shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct LayoutArgs {
    /// Directory of per-song JSON files (overrides `detail_dir`).
    #[arg(long, value_name = "DIR")]
    pub detail_dir: Option<PathBuf>,

    /// Consolidated JSON array file (overrides `aggregate`).
    #[arg(long, value_name = "FILE")]
    pub aggregate: Option<PathBuf>,
}

impl LayoutArgs {
    fn apply(&self, config: &mut SyncConfig) {
        if let Some(dir) = &self.detail_dir {
            config.detail_dir = dir.clone();
        }
        if let Some(aggregate) = &self.aggregate {
            config.aggregate = aggregate.clone();
        }
    }
}

/// Load the config named by `--config`, or `<root>/songbook.yaml`, then
/// apply path overrides.
pub fn resolve_config(global: &GlobalArgs, layout: &LayoutArgs) -> Result<SyncConfig> {
    let mut config = match &global.config {
        Some(path) => config::load_file(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => config::load_at(&global.root).with_context(|| {
            format!("failed to load config under '{}'", global.root.display())
        })?,
    };
    layout.apply(&mut config);
    tracing::debug!("resolved config: {config:?}");
    Ok(config)
}

/// Filesystem store rooted at `--root`.
pub fn open_store(global: &GlobalArgs, config: &SyncConfig) -> FsStore {
    FsStore::from_config_at(&global.root, config)
}
