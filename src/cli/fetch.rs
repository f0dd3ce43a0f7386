use super::{fetch_request, open_store};
use crate::core::config::AppConfig;
use crate::core::{RunError, RunReport, run_cycle};
use crate::providers::FrankfurterProvider;
use anyhow::Result;
use tracing::{error, info};

/// Runs one tracking cycle. Fails when storage can't be prepared or the fetch fails;
/// insert failures for individual pairs only show up in the report.
pub async fn run(config: &AppConfig) -> Result<RunReport> {
    info!("Starting currency exchange rate tracker");

    let store = open_store(config)?;
    let source = FrankfurterProvider::new(&config.api_url);
    let request = fetch_request(config);

    match run_cycle(&source, &store, &request).await {
        Ok(report) => {
            if report.is_success() {
                info!("Currency tracking completed successfully");
            } else {
                error!(
                    failed = report.failed.len(),
                    "Currency tracking completed with errors"
                );
            }
            Ok(report)
        }
        Err(e @ RunError::Fetch(_)) => {
            error!(error = %e, "Failed to fetch data from API");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
