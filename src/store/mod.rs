//! Persistent storage backends for observations.

pub mod sqlite;

pub use sqlite::SqliteStore;
