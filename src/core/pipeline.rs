//! One tracking run: prepare storage, fetch rates once, persist the allowed quotes.

use crate::core::currency::{CurrencyCode, RateSource};
use crate::core::error::RunError;
use crate::core::observation::ObservationStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// What to fetch and which targets may be stored.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub base: CurrencyCode,
    pub targets: BTreeSet<CurrencyCode>,
    pub timeout: Duration,
}

/// Outcome of a run whose schema check and fetch both succeeded.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub captured_at: DateTime<Utc>,
    pub base: CurrencyCode,
    pub inserted: usize,
    pub failed: Vec<CurrencyCode>,
    /// Quotes returned by the source but outside the allow-list.
    pub skipped: Vec<CurrencyCode>,
    pub expected: usize,
}

impl RunReport {
    /// A run counts as successful once any single rate was stored.
    pub fn is_success(&self) -> bool {
        self.inserted > 0
    }
}

#[instrument(name = "TrackingRun", skip_all, fields(base = %request.base))]
pub async fn run_cycle<S>(
    source: &dyn RateSource,
    store: &S,
    request: &FetchRequest,
) -> Result<RunReport, RunError>
where
    S: ObservationStore + ?Sized,
{
    store.ensure_schema().map_err(RunError::Schema)?;

    info!(
        "Fetching exchange rates for {} to {:?}",
        request.base,
        request
            .targets
            .iter()
            .map(CurrencyCode::as_str)
            .collect::<Vec<_>>()
    );
    let quotes = source
        .fetch_rates(&request.base, &request.targets, request.timeout)
        .await?;
    info!(count = quotes.len(), "Fetched exchange rates");

    let captured_at = Utc::now();
    let mut report = RunReport {
        captured_at,
        base: quotes.base.clone(),
        inserted: 0,
        failed: Vec::new(),
        skipped: Vec::new(),
        expected: request.targets.len(),
    };

    for quote in quotes.quotes() {
        if !request.targets.contains(&quote.target) {
            debug!(target_currency = %quote.target, "Skipping currency outside allow-list");
            report.skipped.push(quote.target);
            continue;
        }

        match store.insert(captured_at, &quote.base, &quote.target, quote.rate) {
            Ok(()) => {
                debug!("Stored rate {}->{} = {}", quote.base, quote.target, quote.rate);
                report.inserted += 1;
            }
            Err(e) => {
                warn!(error = %e, "Failed to insert rate for {}", quote.target);
                report.failed.push(quote.target);
            }
        }
    }

    info!(
        "Successfully processed {} out of {} currency rates",
        report.inserted, report.expected
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::QuoteSet;
    use crate::core::error::{FetchError, StoreError};
    use crate::core::observation::Observation;
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn request(targets: &[&str]) -> FetchRequest {
        FetchRequest {
            base: code("USD"),
            targets: targets.iter().map(|t| code(t)).collect(),
            timeout: Duration::from_secs(1),
        }
    }

    struct StaticSource {
        result: Mutex<Option<Result<QuoteSet, FetchError>>>,
        calls: Mutex<usize>,
    }

    impl StaticSource {
        fn new(result: Result<QuoteSet, FetchError>) -> Self {
            StaticSource {
                result: Mutex::new(Some(result)),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl RateSource for StaticSource {
        async fn fetch_rates(
            &self,
            _base: &CurrencyCode,
            _targets: &BTreeSet<CurrencyCode>,
            _timeout: Duration,
        ) -> Result<QuoteSet, FetchError> {
            *self.calls.lock().unwrap() += 1;
            self.result
                .lock()
                .unwrap()
                .take()
                .expect("source called more than once")
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        schema_fails: bool,
        failing_target: Option<CurrencyCode>,
        rows: RefCell<Vec<(DateTime<Utc>, String, String, f64)>>,
    }

    impl ObservationStore for RecordingStore {
        fn ensure_schema(&self) -> Result<(), StoreError> {
            if self.schema_fails {
                return Err(StoreError::Schema("disk full".to_string()));
            }
            Ok(())
        }

        fn insert(
            &self,
            captured_at: DateTime<Utc>,
            base: &CurrencyCode,
            target: &CurrencyCode,
            rate: f64,
        ) -> Result<(), StoreError> {
            if self.failing_target.as_ref() == Some(target) {
                return Err(StoreError::Write("database is locked".to_string()));
            }
            self.rows.borrow_mut().push((
                captured_at,
                base.to_string(),
                target.to_string(),
                rate,
            ));
            Ok(())
        }

        fn latest_per_pair(&self) -> Result<Vec<Observation>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn quote_set(base: &str, rates: &[(&str, f64)]) -> QuoteSet {
        QuoteSet {
            base: code(base),
            rates: rates
                .iter()
                .map(|(c, r)| (code(c), *r))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[tokio::test]
    async fn test_only_allowed_targets_are_stored() {
        let source = StaticSource::new(Ok(quote_set(
            "USD",
            &[("EUR", 0.9), ("GBP", 0.8), ("SEK", 10.1)],
        )));
        let store = RecordingStore::default();

        let report = run_cycle(&source, &store, &request(&["EUR", "GBP"]))
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.inserted, 2);
        assert_eq!(report.expected, 2);
        assert_eq!(report.skipped, vec![code("SEK")]);
        assert!(report.failed.is_empty());

        let rows = store.rows.borrow();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].2, "EUR");
        assert_eq!(rows[0].3, 0.9);
        assert_eq!(rows[1].2, "GBP");
        assert_eq!(rows[1].3, 0.8);
        // All rows of one run share the capture time
        assert_eq!(rows[0].0, rows[1].0);
        assert_eq!(rows[0].0, report.captured_at);
    }

    #[tokio::test]
    async fn test_partial_insert_failure_is_tolerated() {
        let source = StaticSource::new(Ok(quote_set("USD", &[("EUR", 0.9), ("GBP", 0.8)])));
        let store = RecordingStore {
            failing_target: Some(code("EUR")),
            ..Default::default()
        };

        let report = run_cycle(&source, &store, &request(&["EUR", "GBP"]))
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.inserted, 1);
        assert_eq!(report.failed, vec![code("EUR")]);
        assert_eq!(store.rows.borrow()[0].2, "GBP");
    }

    #[tokio::test]
    async fn test_all_inserts_failing_is_not_success() {
        let source = StaticSource::new(Ok(quote_set("USD", &[("EUR", 0.9)])));
        let store = RecordingStore {
            failing_target: Some(code("EUR")),
            ..Default::default()
        };

        let report = run_cycle(&source, &store, &request(&["EUR"])).await.unwrap();
        assert!(!report.is_success());
        assert_eq!(report.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_stores_nothing() {
        let source = StaticSource::new(Err(FetchError::Transport(
            "connection refused".to_string(),
        )));
        let store = RecordingStore::default();

        let result = run_cycle(&source, &store, &request(&["EUR", "GBP"])).await;
        assert!(matches!(
            result,
            Err(RunError::Fetch(FetchError::Transport(_)))
        ));
        assert!(store.rows.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_schema_failure_aborts_before_fetch() {
        let source = StaticSource::new(Ok(quote_set("USD", &[("EUR", 0.9)])));
        let store = RecordingStore {
            schema_fails: true,
            ..Default::default()
        };

        let result = run_cycle(&source, &store, &request(&["EUR"])).await;
        assert!(matches!(result, Err(RunError::Schema(StoreError::Schema(_)))));
        assert_eq!(source.calls(), 0);
        assert!(store.rows.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_response_base_is_used_for_rows() {
        let source = StaticSource::new(Ok(quote_set("EUR", &[("GBP", 0.85)])));
        let store = RecordingStore::default();

        let report = run_cycle(&source, &store, &request(&["GBP"])).await.unwrap();
        assert_eq!(report.base, code("EUR"));
        assert_eq!(store.rows.borrow()[0].1, "EUR");
    }
}
