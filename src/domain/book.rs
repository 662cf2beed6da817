//! In-memory pair state shared between the interactive surface and the
//! background cycles.

use crate::domain::error::PairviewError;
use crate::domain::pair::PairConfig;
use crate::domain::series::InstrumentSeries;
use crate::domain::synthesis::{synthesize, Synthesis};

/// The current instrument snapshot plus the selected pair transform.
///
/// Refresh replaces the snapshot wholesale; persist reads it. Callers share a
/// `PairBook` across threads behind a single lock so the two never race.
#[derive(Debug)]
pub struct PairBook {
    instruments: Vec<InstrumentSeries>,
    pair: PairConfig,
}

impl PairBook {
    pub fn new(pair: PairConfig) -> Self {
        Self {
            instruments: Vec::new(),
            pair,
        }
    }

    pub fn replace_instruments(&mut self, instruments: Vec<InstrumentSeries>) {
        self.instruments = instruments;
    }

    pub fn instruments(&self) -> &[InstrumentSeries] {
        &self.instruments
    }

    pub fn get(&self, code: &str) -> Option<&InstrumentSeries> {
        self.instruments.iter().find(|s| s.code == code)
    }

    pub fn pair_config(&self) -> &PairConfig {
        &self.pair
    }

    /// Derives a fresh pair series for the two named legs.
    pub fn synthesize_pair(&self, x_code: &str, y_code: &str) -> Result<Synthesis, PairviewError> {
        let x = self
            .get(x_code)
            .ok_or_else(|| PairviewError::UnknownInstrument {
                code: x_code.to_string(),
            })?;
        let y = self
            .get(y_code)
            .ok_or_else(|| PairviewError::UnknownInstrument {
                code: y_code.to_string(),
            })?;

        Ok(synthesize(x, y, &self.pair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pair::TransformKind;
    use crate::domain::series::Sample;
    use chrono::{TimeZone, Utc};

    fn series(code: &str, prices: &[f64]) -> InstrumentSeries {
        let samples = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| Sample {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
                price,
                volume: 10,
            })
            .collect();
        InstrumentSeries::with_samples(code, samples)
    }

    fn book() -> PairBook {
        let mut book = PairBook::new(PairConfig {
            kind: TransformKind::Ratio,
            beta: 1.0,
        });
        book.replace_instruments(vec![series("AAA", &[1.0, 2.0]), series("BBB", &[3.0, 6.0])]);
        book
    }

    #[test]
    fn synthesize_pair_finds_legs() {
        let result = book().synthesize_pair("AAA", "BBB").unwrap();
        assert_eq!(result.series.code, "AAA|BBB");
        assert_eq!(result.series.len(), 2);
    }

    #[test]
    fn unknown_leg_fails() {
        let err = book().synthesize_pair("AAA", "ZZZ").unwrap_err();
        assert!(matches!(
            err,
            PairviewError::UnknownInstrument { code } if code == "ZZZ"
        ));
    }

    #[test]
    fn replace_swaps_snapshot() {
        let mut book = book();
        book.replace_instruments(vec![series("CCC", &[1.0])]);
        assert!(book.get("AAA").is_none());
        assert!(book.get("CCC").is_some());
    }
}
