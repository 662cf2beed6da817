//! One-shot bulk import: provider -> persisted per-instrument records.
//!
//! Every instrument the provider yields is upserted individually, so a
//! mid-run failure only loses the instruments not yet processed; everything
//! already persisted stays committed. The terminal completion notice is
//! emitted on every path, success or not, matching the original behaviour of
//! always telling the operator the run has ended.

use crate::domain::series::Sample;
use crate::ports::data_provider::DataProvider;
use crate::ports::instrument_store::InstrumentStore;
use crate::ports::progress_port::ProgressSink;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How an import run ended.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub imported: usize,
    pub total: usize,
    /// Rows the provider skipped as malformed.
    pub skipped_rows: usize,
    pub cancelled: bool,
    pub failure: Option<String>,
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failure.is_none()
    }
}

pub struct ImportPipeline {
    stop: Arc<AtomicBool>,
}

impl ImportPipeline {
    pub fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between instruments; setting it stops the run cleanly.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Runs the import to completion, cancellation or first failure.
    ///
    /// Timestamps are normalized to the single ingestion instant captured at
    /// run start. On failure the remaining loop is aborted and progress is
    /// reset to zero; the terminal notice is still emitted.
    pub fn run(
        &self,
        provider: &dyn DataProvider,
        store: &dyn InstrumentStore,
        progress: &dyn ProgressSink,
    ) -> ImportOutcome {
        let report = match provider.fetch_all() {
            Ok(report) => report,
            Err(e) => {
                let outcome = ImportOutcome {
                    imported: 0,
                    total: 0,
                    skipped_rows: 0,
                    cancelled: false,
                    failure: Some(e.to_string()),
                };
                progress.on_progress(0.0);
                progress.on_complete(false, &e.to_string());
                return outcome;
            }
        };

        let total = report.instruments.len();
        let ingested_at = Utc::now();

        let mut imported = 0usize;
        let mut cancelled = false;
        let mut failure = None;

        for instrument in report.instruments {
            if self.stop.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }

            let stamped: Vec<Sample> = instrument
                .samples()
                .iter()
                .map(|s| Sample {
                    timestamp: ingested_at,
                    price: s.price,
                    volume: s.volume,
                })
                .collect();

            if let Err(e) = store.upsert_history(&instrument.code, &stamped) {
                failure = Some(e.to_string());
                progress.on_progress(0.0);
                break;
            }

            imported += 1;
            progress.on_progress(imported as f64 / total as f64);
        }

        let outcome = ImportOutcome {
            imported,
            total,
            skipped_rows: report.skipped_rows,
            cancelled,
            failure,
        };

        let message = if let Some(reason) = &outcome.failure {
            format!(
                "import failed after {} of {} instruments: {}",
                outcome.imported, outcome.total, reason
            )
        } else if outcome.cancelled {
            format!(
                "import cancelled after {} of {} instruments",
                outcome.imported, outcome.total
            )
        } else {
            format!("import complete: {} instruments", outcome.imported)
        };
        progress.on_complete(outcome.is_success(), &message);

        outcome
    }
}

impl Default for ImportPipeline {
    fn default() -> Self {
        Self::new()
    }
}
