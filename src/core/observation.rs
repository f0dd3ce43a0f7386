//! Persisted observations and the store abstraction

use crate::core::currency::CurrencyCode;
use crate::core::error::StoreError;
use chrono::{DateTime, Utc};

/// One stored rate, captured during a tracking run.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: i64,
    pub captured_at: DateTime<Utc>,
    pub base_currency: CurrencyCode,
    pub target_currency: CurrencyCode,
    pub rate: f64,
    /// Assigned by the store when the row was written.
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Append-only storage of observations.
///
/// Implementations hold no session state between calls: each operation acquires
/// its own storage handle and releases it before returning.
pub trait ObservationStore {
    /// Creates the observation table if it does not exist yet.
    fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Appends one observation. Rates are stored as given.
    fn insert(
        &self,
        captured_at: DateTime<Utc>,
        base: &CurrencyCode,
        target: &CurrencyCode,
        rate: f64,
    ) -> Result<(), StoreError>;

    /// Most recent observation for every pair, ordered by target currency.
    fn latest_per_pair(&self) -> Result<Vec<Observation>, StoreError>;
}
