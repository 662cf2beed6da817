//! SQLite store adapter.
//!
//! Acts as both the persistence target and the database-backed data
//! provider: the same tables written by the persist cycle and the import
//! pipeline are read back by `fetch_all`.

use crate::domain::error::PairviewError;
use crate::domain::series::{InstrumentSeries, Sample};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_provider::{DataProvider, FetchReport};
use crate::ports::instrument_store::InstrumentStore;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
    load_limit: Option<usize>,
}

impl SqliteStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PairviewError> {
        let db_path = config
            .get_string("sqlite", "path")
            .ok_or_else(|| PairviewError::ConfigMissing {
                section: "sqlite".into(),
                key: "path".into(),
            })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;
        let load_count = config.get_int("provider", "load_count", 0);

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder().max_size(pool_size).build(manager).map_err(
            |e: r2d2::Error| PairviewError::SourceUnavailable {
                source_name: db_path.clone(),
                reason: e.to_string(),
            },
        )?;

        Ok(Self {
            pool,
            load_limit: (load_count > 0).then_some(load_count as usize),
        })
    }

    pub fn in_memory() -> Result<Self, PairviewError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(
            |e: r2d2::Error| PairviewError::SourceUnavailable {
                source_name: ":memory:".into(),
                reason: e.to_string(),
            },
        )?;

        Ok(Self {
            pool,
            load_limit: None,
        })
    }

    /// Caps `fetch_all` to the most recent N samples per instrument.
    pub fn with_load_limit(mut self, limit: usize) -> Self {
        self.load_limit = Some(limit);
        self
    }

    pub fn initialize_schema(&self) -> Result<(), PairviewError> {
        let conn = self.connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS instruments (
                code TEXT PRIMARY KEY
            );
            CREATE TABLE IF NOT EXISTS samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL REFERENCES instruments(code),
                ts TEXT NOT NULL,
                price REAL NOT NULL,
                volume INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_samples_code ON samples(code);",
        )
        .map_err(|e: rusqlite::Error| PairviewError::Persistence {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    fn connection(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, PairviewError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| PairviewError::SourceUnavailable {
                source_name: "sqlite".into(),
                reason: e.to_string(),
            })
    }

    fn fetch_samples(
        &self,
        conn: &rusqlite::Connection,
        code: &str,
    ) -> Result<Vec<Sample>, PairviewError> {
        // newest-first under a limit, then restored to insertion order
        let query = match self.load_limit {
            Some(_) => {
                "SELECT ts, price, volume FROM samples WHERE code = ?1
                 ORDER BY id DESC LIMIT ?2"
            }
            None => "SELECT ts, price, volume FROM samples WHERE code = ?1 ORDER BY id ASC",
        };

        let mut stmt = conn
            .prepare(query)
            .map_err(|e: rusqlite::Error| PairviewError::Persistence {
                reason: e.to_string(),
            })?;

        let map_row = |row: &rusqlite::Row<'_>| {
            let ts_str: String = row.get(0)?;
            let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        ts_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Utc);
            Ok(Sample {
                timestamp,
                price: row.get(1)?,
                volume: row.get(2)?,
            })
        };

        let rows = match self.load_limit {
            Some(limit) => stmt.query_map(params![code, limit as i64], map_row),
            None => stmt.query_map(params![code], map_row),
        }
        .map_err(|e: rusqlite::Error| PairviewError::Persistence {
            reason: e.to_string(),
        })?;

        let mut samples = Vec::new();
        for row in rows {
            samples.push(
                row.map_err(|e: rusqlite::Error| PairviewError::Persistence {
                    reason: e.to_string(),
                })?,
            );
        }

        if self.load_limit.is_some() {
            samples.reverse();
        }
        Ok(samples)
    }
}

impl InstrumentStore for SqliteStore {
    fn upsert_history(&self, code: &str, samples: &[Sample]) -> Result<(), PairviewError> {
        let mut conn = self.connection()?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| PairviewError::Persistence {
                reason: e.to_string(),
            })?;

        tx.execute(
            "INSERT OR IGNORE INTO instruments (code) VALUES (?1)",
            params![code],
        )
        .map_err(|e: rusqlite::Error| PairviewError::Persistence {
            reason: e.to_string(),
        })?;

        for sample in samples {
            tx.execute(
                "INSERT INTO samples (code, ts, price, volume) VALUES (?1, ?2, ?3, ?4)",
                params![
                    code,
                    sample.timestamp.to_rfc3339(),
                    sample.price,
                    sample.volume
                ],
            )
            .map_err(|e: rusqlite::Error| PairviewError::Persistence {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| PairviewError::Persistence {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    fn fetch_instrument(&self, code: &str) -> Result<Option<InstrumentSeries>, PairviewError> {
        let conn = self.connection()?;

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM instruments WHERE code = ?1)",
                params![code],
                |row| row.get(0),
            )
            .map_err(|e: rusqlite::Error| PairviewError::Persistence {
                reason: e.to_string(),
            })?;

        if !exists {
            return Ok(None);
        }

        let samples = self.fetch_samples(&conn, code)?;
        Ok(Some(InstrumentSeries::with_samples(code, samples)))
    }

    fn list_codes(&self) -> Result<Vec<String>, PairviewError> {
        let conn = self.connection()?;

        let mut stmt = conn
            .prepare("SELECT code FROM instruments ORDER BY code")
            .map_err(|e: rusqlite::Error| PairviewError::Persistence {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e: rusqlite::Error| PairviewError::Persistence {
                reason: e.to_string(),
            })?;

        let mut codes = Vec::new();
        for row in rows {
            codes.push(
                row.map_err(|e: rusqlite::Error| PairviewError::Persistence {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(codes)
    }
}

impl DataProvider for SqliteStore {
    fn fetch_all(&self) -> Result<FetchReport, PairviewError> {
        let conn = self.connection()?;

        let mut instruments = Vec::new();
        for code in self.list_codes()? {
            let samples = self.fetch_samples(&conn, &code)?;
            instruments.push(InstrumentSeries::with_samples(code, samples));
        }

        Ok(FetchReport {
            instruments,
            skipped_rows: 0,
        })
    }
}
