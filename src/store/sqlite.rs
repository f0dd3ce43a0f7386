use crate::core::currency::CurrencyCode;
use crate::core::error::StoreError;
use crate::core::observation::{Observation, ObservationStore};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OpenFlags, Row, params};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Fixed width so that text ordering in SQL matches chronological ordering.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const CREATE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS exchange_rates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp DATETIME NOT NULL,
        base_currency TEXT NOT NULL,
        target_currency TEXT NOT NULL,
        exchange_rate REAL NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS idx_exchange_rates_pair
        ON exchange_rates(base_currency, target_currency, timestamp);
";

const SELECT_COLUMNS: &str =
    "id, timestamp, base_currency, target_currency, exchange_rate, created_at";

impl ToSql for CurrencyCode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CurrencyCode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Timestamp column as written by this store or by `CURRENT_TIMESTAMP`, both UTC.
struct StoredTimestamp(DateTime<Utc>);

impl FromSql for StoredTimestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        NaiveDateTime::parse_from_str(value.as_str()?, TIMESTAMP_PARSE_FORMAT)
            .map(|dt| StoredTimestamp(dt.and_utc()))
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn to_observation(row: &Row<'_>) -> rusqlite::Result<Observation> {
    Ok(Observation {
        id: row.get(0)?,
        captured_at: row.get::<_, StoredTimestamp>(1)?.0,
        base_currency: row.get(2)?,
        target_currency: row.get(3)?,
        rate: row.get(4)?,
        recorded_at: row.get::<_, Option<StoredTimestamp>>(5)?.map(|ts| ts.0),
    })
}

/// SQLite backed observation log.
///
/// Holds only the database path; every operation opens its own connection,
/// which is closed when it goes out of scope.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SqliteStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        Connection::open(&self.path)
    }

    // Reads never create the database file.
    fn connect_read_only(&self) -> rusqlite::Result<Connection> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    fn query_observations(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Observation>, StoreError> {
        let read = || -> rusqlite::Result<Vec<Observation>> {
            let conn = self.connect_read_only()?;
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params, to_observation)?;
            rows.collect()
        };
        read().map_err(|e| {
            error!("Error reading exchange rates: {}", e);
            StoreError::Read(e.to_string())
        })
    }

    /// Names of all tables in the database.
    pub fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let read = || -> rusqlite::Result<Vec<String>> {
            let conn = self.connect_read_only()?;
            let mut stmt =
                conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
            let names = stmt.query_map([], |row| row.get(0))?;
            names.collect()
        };
        read().map_err(|e| StoreError::Read(e.to_string()))
    }

    /// Most recently captured observations, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Observation>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM exchange_rates
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1"
        );
        self.query_observations(&sql, params![i64::try_from(limit).unwrap_or(i64::MAX)])
    }
}

impl ObservationStore for SqliteStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        let create = || -> rusqlite::Result<()> {
            let conn = self.connect()?;
            conn.execute_batch(CREATE_SCHEMA)
        };
        create().map_err(|e| {
            error!("Error creating database table: {}", e);
            StoreError::Schema(e.to_string())
        })?;
        info!("Database table verified/created successfully");
        Ok(())
    }

    fn insert(
        &self,
        captured_at: DateTime<Utc>,
        base: &CurrencyCode,
        target: &CurrencyCode,
        rate: f64,
    ) -> Result<(), StoreError> {
        let write = || -> rusqlite::Result<usize> {
            let conn = self.connect()?;
            conn.execute(
                "INSERT INTO exchange_rates (timestamp, base_currency, target_currency, exchange_rate)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    captured_at.format(TIMESTAMP_FORMAT).to_string(),
                    base,
                    target,
                    rate
                ],
            )
        };
        write().map_err(|e| {
            error!("Error inserting exchange rate: {}", e);
            StoreError::Write(e.to_string())
        })?;
        info!("Successfully inserted rate: {}->{} = {}", base, target, rate);
        Ok(())
    }

    fn latest_per_pair(&self) -> Result<Vec<Observation>, StoreError> {
        // Ties on the newest capture time resolve to the highest id.
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM exchange_rates AS e
             WHERE e.id = (
                 SELECT e2.id FROM exchange_rates AS e2
                 WHERE e2.base_currency = e.base_currency
                   AND e2.target_currency = e.target_currency
                 ORDER BY e2.timestamp DESC, e2.id DESC
                 LIMIT 1
             )
             ORDER BY e.target_currency, e.base_currency"
        );
        let observations = self.query_observations(&sql, [])?;
        debug!(count = observations.len(), "Loaded latest rates");
        Ok(observations)
    }
}
