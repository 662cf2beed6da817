#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pairview::domain::error::PairviewError;
pub use pairview::domain::series::{InstrumentSeries, Sample};
use pairview::ports::data_provider::{DataProvider, FetchReport};
use pairview::ports::instrument_store::InstrumentStore;
use pairview::ports::progress_port::ProgressSink;
use std::collections::HashMap;
use std::sync::Mutex;

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn make_sample(secs: i64, price: f64, volume: i64) -> Sample {
    Sample {
        timestamp: ts(secs),
        price,
        volume,
    }
}

pub fn make_series(code: &str, prices: &[f64]) -> InstrumentSeries {
    let samples = prices
        .iter()
        .enumerate()
        .map(|(i, &price)| make_sample(i as i64 * 60, price, 1000 + i as i64))
        .collect();
    InstrumentSeries::with_samples(code, samples)
}

pub struct MockProvider {
    pub instruments: Vec<InstrumentSeries>,
    pub skipped_rows: usize,
    pub error: Option<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            instruments: Vec::new(),
            skipped_rows: 0,
            error: None,
        }
    }

    pub fn with_series(mut self, series: InstrumentSeries) -> Self {
        self.instruments.push(series);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataProvider for MockProvider {
    fn fetch_all(&self) -> Result<FetchReport, PairviewError> {
        if let Some(reason) = &self.error {
            return Err(PairviewError::SourceUnavailable {
                source_name: "mock".into(),
                reason: reason.clone(),
            });
        }
        Ok(FetchReport {
            instruments: self.instruments.clone(),
            skipped_rows: self.skipped_rows,
        })
    }
}

/// Thread-safe in-memory store with an optional per-code failure.
pub struct MockStore {
    pub records: Mutex<HashMap<String, Vec<Sample>>>,
    pub fail_on: Option<String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_on: None,
        }
    }

    pub fn failing_on(code: &str) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_on: Some(code.to_string()),
        }
    }

    pub fn seed(&self, code: &str, samples: Vec<Sample>) {
        self.records.lock().unwrap().insert(code.to_string(), samples);
    }

    pub fn history_len(&self, code: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .get(code)
            .map_or(0, |samples| samples.len())
    }
}

impl InstrumentStore for MockStore {
    fn upsert_history(&self, code: &str, samples: &[Sample]) -> Result<(), PairviewError> {
        if self.fail_on.as_deref() == Some(code) {
            return Err(PairviewError::Persistence {
                reason: format!("injected failure for {code}"),
            });
        }
        self.records
            .lock()
            .unwrap()
            .entry(code.to_string())
            .or_default()
            .extend_from_slice(samples);
        Ok(())
    }

    fn fetch_instrument(&self, code: &str) -> Result<Option<InstrumentSeries>, PairviewError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(code)
            .map(|samples| InstrumentSeries::with_samples(code, samples.clone())))
    }

    fn list_codes(&self) -> Result<Vec<String>, PairviewError> {
        let mut codes: Vec<String> = self.records.lock().unwrap().keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }
}

/// Records every notification for later assertions.
#[derive(Debug, PartialEq)]
pub enum ProgressEvent {
    Progress(f64),
    Complete { success: bool, message: String },
}

pub struct RecordingSink {
    pub events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn fractions(&self) -> Vec<f64> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Progress(fraction) => Some(*fraction),
                _ => None,
            })
            .collect()
    }

    pub fn completion(&self) -> Option<(bool, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find_map(|event| match event {
                ProgressEvent::Complete { success, message } => {
                    Some((*success, message.clone()))
                }
                _ => None,
            })
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, fraction: f64) {
        self.events
            .lock()
            .unwrap()
            .push(ProgressEvent::Progress(fraction));
    }

    fn on_complete(&self, success: bool, message: &str) {
        self.events.lock().unwrap().push(ProgressEvent::Complete {
            success,
            message: message.to_string(),
        });
    }
}
