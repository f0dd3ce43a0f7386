use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::currency::{CurrencyCode, QuoteSet, RateSource};
use crate::core::error::FetchError;

const INVALID_RATES: &str = "missing or invalid rates field";

/// Client for Frankfurter style `latest` endpoints taking `from` and `to` query parameters.
pub struct FrankfurterProvider {
    api_url: String,
}

impl FrankfurterProvider {
    pub fn new(api_url: &str) -> Self {
        FrankfurterProvider {
            api_url: api_url.to_string(),
        }
    }
}

fn request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}

/// Validates a response body and turns it into a quote set.
fn parse_latest(body: &str, requested_base: &CurrencyCode) -> Result<QuoteSet, FetchError> {
    let data: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("Failed to parse JSON: {e}")))?;

    let base = match data.get("base") {
        Some(Value::String(code)) => code
            .parse()
            .map_err(|e| FetchError::MalformedResponse(format!("Invalid base field: {e}")))?,
        Some(Value::Null) | None => requested_base.clone(),
        Some(other) => {
            return Err(FetchError::MalformedResponse(format!(
                "Invalid base field: {other}"
            )));
        }
    };

    let entries = data
        .get("rates")
        .and_then(Value::as_object)
        .ok_or_else(|| FetchError::MalformedResponse(INVALID_RATES.to_string()))?;

    let mut rates = BTreeMap::new();
    for (code, value) in entries {
        let target: CurrencyCode = code
            .parse()
            .map_err(|_| FetchError::MalformedResponse(INVALID_RATES.to_string()))?;
        let rate = value
            .as_f64()
            .filter(|rate| *rate > 0.0 && rate.is_finite())
            .ok_or_else(|| FetchError::MalformedResponse(INVALID_RATES.to_string()))?;
        // Keys differing only in case would otherwise collapse into one entry
        if rates.insert(target, rate).is_some() {
            return Err(FetchError::MalformedResponse(INVALID_RATES.to_string()));
        }
    }

    Ok(QuoteSet { base, rates })
}

#[async_trait]
impl RateSource for FrankfurterProvider {
    #[instrument(
        name = "FrankfurterFetch",
        skip(self, base, targets),
        fields(base = %base)
    )]
    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
        targets: &BTreeSet<CurrencyCode>,
        timeout: Duration,
    ) -> Result<QuoteSet, FetchError> {
        let to = targets
            .iter()
            .map(CurrencyCode::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = reqwest::Url::parse_with_params(
            &self.api_url,
            &[("from", base.as_str()), ("to", to.as_str())],
        )
        .map_err(|e| FetchError::Transport(format!("Invalid API URL {}: {}", self.api_url, e)))?;
        debug!("Requesting exchange rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("fxlog/1.0")
            .timeout(timeout)
            .build()
            .map_err(request_error)?;

        let response = client.get(url).send().await.map_err(request_error)?;

        debug!(response = ?response, "Received rate response");

        if !response.status().is_success() {
            return Err(FetchError::Transport(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let text = response.text().await.map_err(request_error)?;
        parse_latest(&text, base)
    }
}
