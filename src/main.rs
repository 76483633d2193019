//! settings-registry command-line entry point.

use anyhow::Result;
use clap::Parser;
use settings_registry::categories::builtin_units;
use settings_registry::cli::{Cli, commands};
use settings_registry::config::{SettingsLoader, SettingsPaths};
use settings_registry::env::ProcessEnv;
use settings_registry::logging::{self, LogTarget};
use settings_registry::registry::Registry;
use std::path::PathBuf;
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let target: LogTarget = cli.log.parse()?;
    logging::init(&target, cli.verbose)?;

    let mut paths = SettingsPaths::discover();
    if let Some(config_path) = &cli.config {
        paths = paths.with_explicit_file(config_path);
    }
    let mut loader = SettingsLoader::load_with(paths, &ProcessEnv)?;
    if let Some(source) = loader.source_file() {
        debug!(path = %source.display(), "Loaded registry settings");
    }

    // CLI overrides
    if let Some(db_path) = &cli.database {
        loader.settings_mut().store.db_path = PathBuf::from(db_path);
    }
    let settings = loader.into_settings();

    info!(db_path = %settings.store.db_path.display(), prefix = %settings.store.key_prefix, "Opening store");
    let store = settings.open_store()?;
    let ctx = settings.module_context(store);
    let registry = Registry::discover(builtin_units(), &ctx);

    let output = commands::execute(&registry, &cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
