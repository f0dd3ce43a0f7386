pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::debug;

pub enum AppCommand {
    Fetch,
    Latest,
    Dump { limit: usize },
    Check,
}

/// Loads the configuration from `config_path`, or from the default location.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config: &AppConfig) -> Result<()> {
    match command {
        AppCommand::Fetch => cli::fetch::run(config).await.map(|_| ()),
        AppCommand::Latest => cli::latest::run(config),
        AppCommand::Dump { limit } => cli::dump::run(config, limit),
        AppCommand::Check => cli::check::run(config).await,
    }
}
