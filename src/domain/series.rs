//! Instrument series representation.

use chrono::{DateTime, Utc};

/// One timestamped price/volume observation. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: i64,
}

/// Ordered, append-only history for one instrument, keyed by code.
///
/// Timestamps are non-decreasing. [`push`](InstrumentSeries::push) clamps an
/// older timestamp to the current tail so a backwards wall-clock step cannot
/// break the ordering invariant.
#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    pub code: String,
    samples: Vec<Sample>,
}

impl InstrumentSeries {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            samples: Vec::new(),
        }
    }

    pub fn with_samples(code: impl Into<String>, samples: Vec<Sample>) -> Self {
        let mut series = Self::new(code);
        for sample in samples {
            series.push(sample);
        }
        series
    }

    pub fn push(&mut self, mut sample: Sample) {
        if let Some(last) = self.samples.last() {
            if sample.timestamp < last.timestamp {
                sample.timestamp = last.timestamp;
            }
        }
        self.samples.push(sample);
    }

    pub fn append(&mut self, tail: Vec<Sample>) {
        for sample in tail {
            self.push(sample);
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn sample(secs: i64, price: f64) -> Sample {
        Sample {
            timestamp: ts(secs),
            price,
            volume: 1000,
        }
    }

    #[test]
    fn push_keeps_order() {
        let mut series = InstrumentSeries::new("AAA");
        series.push(sample(10, 1.0));
        series.push(sample(20, 2.0));
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().unwrap().price, 2.0);
    }

    #[test]
    fn push_clamps_backwards_timestamp() {
        let mut series = InstrumentSeries::new("AAA");
        series.push(sample(20, 1.0));
        series.push(sample(10, 2.0));

        let samples = series.samples();
        assert_eq!(samples[1].timestamp, ts(20));
        assert_eq!(samples[1].price, 2.0);
    }

    #[test]
    fn append_extends_history() {
        let mut series = InstrumentSeries::with_samples("AAA", vec![sample(10, 1.0)]);
        series.append(vec![sample(20, 2.0), sample(30, 3.0)]);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn equal_timestamps_allowed() {
        let mut series = InstrumentSeries::new("AAA");
        series.push(sample(10, 1.0));
        series.push(sample(10, 2.0));
        assert_eq!(series.len(), 2);
    }
}
