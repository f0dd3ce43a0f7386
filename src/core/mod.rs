//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod observation;
pub mod pipeline;

// Re-export main types for cleaner imports
pub use currency::{CurrencyCode, Quote, QuoteSet, RateSource};
pub use error::{FetchError, RunError, StoreError};
pub use observation::{Observation, ObservationStore};
pub use pipeline::{FetchRequest, RunReport, run_cycle};
