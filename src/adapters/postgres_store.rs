//! PostgreSQL store adapter.
//!
//! Same contract as the SQLite adapter against a PostgreSQL catalog. The
//! client sits behind a `Mutex` so the scheduler can share the store across
//! its timer lines.

use crate::domain::error::PairviewError;
use crate::domain::series::{InstrumentSeries, Sample};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_provider::{DataProvider, FetchReport};
use crate::ports::instrument_store::InstrumentStore;
use chrono::{DateTime, Utc};
use postgres::{Client, NoTls};
use std::sync::Mutex;

pub struct PostgresStore {
    client: Mutex<Client>,
    load_limit: Option<usize>,
}

impl PostgresStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PairviewError> {
        let conninfo = config
            .get_string("postgres", "conninfo")
            .ok_or_else(|| PairviewError::ConfigMissing {
                section: "postgres".into(),
                key: "conninfo".into(),
            })?;
        if conninfo.trim().is_empty() {
            return Err(PairviewError::ConfigInvalid {
                section: "postgres".into(),
                key: "conninfo".into(),
                reason: "connection descriptor must not be empty".into(),
            });
        }

        let client =
            Client::connect(&conninfo, NoTls).map_err(|e| PairviewError::SourceUnavailable {
                source_name: "postgres".into(),
                reason: e.to_string(),
            })?;

        let load_count = config.get_int("provider", "load_count", 0);

        Ok(Self {
            client: Mutex::new(client),
            load_limit: (load_count > 0).then_some(load_count as usize),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), PairviewError> {
        self.client
            .lock()
            .unwrap()
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS instruments (
                    code TEXT PRIMARY KEY
                );
                CREATE TABLE IF NOT EXISTS samples (
                    id BIGSERIAL PRIMARY KEY,
                    code TEXT NOT NULL REFERENCES instruments(code),
                    ts TIMESTAMPTZ NOT NULL,
                    price DOUBLE PRECISION NOT NULL,
                    volume BIGINT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_samples_code ON samples(code);",
            )
            .map_err(|e| PairviewError::Persistence {
                reason: e.to_string(),
            })
    }

    fn fetch_samples(&self, client: &mut Client, code: &str) -> Result<Vec<Sample>, PairviewError> {
        let rows = match self.load_limit {
            Some(limit) => client.query(
                "SELECT ts, price, volume FROM samples WHERE code = $1
                 ORDER BY id DESC LIMIT $2",
                &[&code, &(limit as i64)],
            ),
            None => client.query(
                "SELECT ts, price, volume FROM samples WHERE code = $1 ORDER BY id ASC",
                &[&code],
            ),
        }
        .map_err(|e| PairviewError::Persistence {
            reason: e.to_string(),
        })?;

        let mut samples: Vec<Sample> = rows
            .into_iter()
            .map(|row| {
                let timestamp: DateTime<Utc> = row.get(0);
                Sample {
                    timestamp,
                    price: row.get(1),
                    volume: row.get(2),
                }
            })
            .collect();

        if self.load_limit.is_some() {
            samples.reverse();
        }
        Ok(samples)
    }
}

impl InstrumentStore for PostgresStore {
    fn upsert_history(&self, code: &str, samples: &[Sample]) -> Result<(), PairviewError> {
        let mut client = self.client.lock().unwrap();

        let mut tx = client.transaction().map_err(|e| PairviewError::Persistence {
            reason: e.to_string(),
        })?;

        tx.execute(
            "INSERT INTO instruments (code) VALUES ($1) ON CONFLICT (code) DO NOTHING",
            &[&code],
        )
        .map_err(|e| PairviewError::Persistence {
            reason: e.to_string(),
        })?;

        for sample in samples {
            tx.execute(
                "INSERT INTO samples (code, ts, price, volume) VALUES ($1, $2, $3, $4)",
                &[&code, &sample.timestamp, &sample.price, &sample.volume],
            )
            .map_err(|e| PairviewError::Persistence {
                reason: e.to_string(),
            })?;
        }

        tx.commit().map_err(|e| PairviewError::Persistence {
            reason: e.to_string(),
        })
    }

    fn fetch_instrument(&self, code: &str) -> Result<Option<InstrumentSeries>, PairviewError> {
        let mut client = self.client.lock().unwrap();

        let rows = client
            .query("SELECT 1 FROM instruments WHERE code = $1", &[&code])
            .map_err(|e| PairviewError::Persistence {
                reason: e.to_string(),
            })?;
        if rows.is_empty() {
            return Ok(None);
        }

        let samples = self.fetch_samples(&mut client, code)?;
        Ok(Some(InstrumentSeries::with_samples(code, samples)))
    }

    fn list_codes(&self) -> Result<Vec<String>, PairviewError> {
        let mut client = self.client.lock().unwrap();

        let rows = client
            .query("SELECT code FROM instruments ORDER BY code", &[])
            .map_err(|e| PairviewError::Persistence {
                reason: e.to_string(),
            })?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }
}

impl DataProvider for PostgresStore {
    fn fetch_all(&self) -> Result<FetchReport, PairviewError> {
        let codes = self.list_codes()?;
        let mut client = self.client.lock().unwrap();

        let mut instruments = Vec::with_capacity(codes.len());
        for code in codes {
            let samples = self.fetch_samples(&mut client, &code)?;
            instruments.push(InstrumentSeries::with_samples(code, samples));
        }

        Ok(FetchReport {
            instruments,
            skipped_rows: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    struct ConnInfoConfig(&'static str);

    impl ConfigPort for ConnInfoConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            (section == "postgres" && key == "conninfo").then(|| self.0.to_string())
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    #[test]
    fn from_config_missing_conninfo() {
        let result = PostgresStore::from_config(&EmptyConfig);
        match result {
            Err(PairviewError::ConfigMissing { section, key }) => {
                assert_eq!(section, "postgres");
                assert_eq!(key, "conninfo");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn from_config_empty_conninfo() {
        let result = PostgresStore::from_config(&ConnInfoConfig("  "));
        assert!(matches!(
            result,
            Err(PairviewError::ConfigInvalid { key, .. }) if key == "conninfo"
        ));
    }
}
