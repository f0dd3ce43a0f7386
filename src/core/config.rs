use crate::core::currency::CurrencyCode;
use crate::core::log::{LogConfig, LogFormat};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.frankfurter.app/latest";
pub const DEFAULT_DATABASE_FILE: &str = "exchange_rates.db";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_base_currency() -> CurrencyCode {
    CurrencyCode::try_from("USD".to_string()).expect("valid currency code")
}

fn default_target_currencies() -> BTreeSet<CurrencyCode> {
    ["EUR", "GBP", "SEK", "CNY"]
        .into_iter()
        .filter_map(|code| code.parse().ok())
        .collect()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_base_currency")]
    pub base_currency: CurrencyCode,
    /// Allow-list of target currencies that get persisted.
    #[serde(default = "default_target_currencies")]
    pub target_currencies: BTreeSet<CurrencyCode>,
    pub database_path: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    pub log_file: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_url: default_api_url(),
            base_currency: default_base_currency(),
            target_currencies: default_target_currencies(),
            database_path: None,
            timeout_seconds: default_timeout_seconds(),
            log_file: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "fxlog", "fxlog")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.database_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "fxlog", "fxlog")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join(DEFAULT_DATABASE_FILE))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn log_config(&self, verbose: bool) -> LogConfig {
        LogConfig {
            level: if verbose {
                "debug".to_string()
            } else {
                self.log_level.clone()
            },
            format: self.log_format,
            file: self.log_file.as_ref().map(PathBuf::from),
        }
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
api_url: "http://localhost:8080/latest"
base_currency: "eur"
target_currencies: [USD, JPY]
database_path: "/tmp/rates.db"
timeout_seconds: 3
log_file: "/tmp/fxlog.log"
log_level: "warn"
log_format: json
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.api_url, "http://localhost:8080/latest");
        assert_eq!(config.base_currency.as_str(), "EUR");
        let targets: Vec<&str> = config.target_currencies.iter().map(|c| c.as_str()).collect();
        assert_eq!(targets, vec!["JPY", "USD"]);
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/rates.db")
        );
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.log_file.as_deref(), Some("/tmp/fxlog.log"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.base_currency.as_str(), "USD");
        assert_eq!(config.target_currencies.len(), 4);
        assert!(config.database_path.is_none());
        assert_eq!(config.timeout_seconds, 10);
        assert!(config.log_file.is_none());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Full);
    }

    #[test]
    fn test_invalid_currency_is_rejected() {
        let yaml_str = r#"
base_currency: "DOLLAR"
"#;
        assert!(serde_yaml::from_str::<AppConfig>(yaml_str).is_err());
    }

    #[test]
    fn test_verbose_overrides_log_level() {
        let config = AppConfig::default();
        assert_eq!(config.log_config(false).level, "info");
        assert_eq!(config.log_config(true).level, "debug");
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load_from_path(dir.path().join("missing.yaml"));
        assert!(result.is_err());
    }
}
