pub mod check;
pub mod dump;
pub mod fetch;
pub mod latest;
pub mod setup;
pub mod ui;

use crate::core::FetchRequest;
use crate::core::config::AppConfig;
use crate::store::SqliteStore;
use anyhow::{Context, Result};

/// Store for the configured database, creating its directory if needed.
pub(crate) fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(SqliteStore::new(path))
}

pub(crate) fn fetch_request(config: &AppConfig) -> FetchRequest {
    FetchRequest {
        base: config.base_currency.clone(),
        targets: config.target_currencies.clone(),
        timeout: config.timeout(),
    }
}
