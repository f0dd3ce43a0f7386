//! Currency codes, quotes and the rate source abstraction

use crate::core::error::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A three letter, uppercase currency code such as `USD`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid currency code: '{0}'")]
pub struct InvalidCurrencyCode(pub String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(CurrencyCode(code.to_ascii_uppercase()))
        } else {
            Err(InvalidCurrencyCode(s.to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> String {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single base to target rate obtained from one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub rate: f64,
}

/// All rates returned by one request, sharing a base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSet {
    pub base: CurrencyCode,
    pub rates: BTreeMap<CurrencyCode, f64>,
}

impl QuoteSet {
    /// Quotes in ascending target order.
    pub fn quotes(&self) -> impl Iterator<Item = Quote> + '_ {
        self.rates.iter().map(|(target, rate)| Quote {
            base: self.base.clone(),
            target: target.clone(),
            rate: *rate,
        })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Issues exactly one request for `base` against `targets`, bounded by `timeout`.
    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
        targets: &BTreeSet<CurrencyCode>,
        timeout: Duration,
    ) -> Result<QuoteSet, FetchError>;
}
