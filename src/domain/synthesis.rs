//! Pair synthesis engine.
//!
//! Combines two instrument series into one derived series under a selectable
//! transform. A single correlation coefficient over the aligned legs picks
//! between the linear (r >= 0) and logarithmic (r < 0) combination branch:
//!
//!   Ratio:          y / x           | ln(y) * ln(x)
//!   RatioWithBeta:  y / (beta * x)  | ln(y) * ln(beta * x)
//!   Spread:         y - x           | y + x
//!   SpreadWithBeta: y - beta * x    | y + beta * x
//!
//! Join policy: positional trailing alignment — the last min(len x, len y)
//! samples of each leg are paired index-wise. The source formula is
//! pointwise, and file-sourced timestamps are synthesized at ingestion time,
//! so a timestamp-intersection join would be degenerate.
//!
//! The derived sample carries leg y's timestamp and volume. Numeric edge
//! cases (zero divisor, non-positive log operand) emit no sample and are
//! returned as a skip count, never as an error.

use crate::domain::correlation::pearson;
use crate::domain::pair::{PairConfig, TransformKind};
use crate::domain::series::{InstrumentSeries, Sample};

/// Result of one synthesis pass.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub series: InstrumentSeries,
    /// Correlation coefficient that selected the branch.
    pub r: f64,
    /// Aligned points omitted for numeric edge cases.
    pub skipped: usize,
}

pub fn synthesize(x: &InstrumentSeries, y: &InstrumentSeries, config: &PairConfig) -> Synthesis {
    let n = x.len().min(y.len());
    let xs = &x.samples()[x.len() - n..];
    let ys = &y.samples()[y.len() - n..];

    let x_prices: Vec<f64> = xs.iter().map(|s| s.price).collect();
    let y_prices: Vec<f64> = ys.iter().map(|s| s.price).collect();
    let r = pearson(&x_prices, &y_prices);
    let log_branch = r < 0.0;

    let mut series = InstrumentSeries::new(format!("{}|{}", x.code, y.code));
    let mut skipped = 0usize;

    for (sample_x, sample_y) in xs.iter().zip(ys) {
        match combine(
            config.kind,
            config.beta,
            sample_x.price,
            sample_y.price,
            log_branch,
        ) {
            Some(price) => series.push(Sample {
                timestamp: sample_y.timestamp,
                price,
                volume: sample_y.volume,
            }),
            None => skipped += 1,
        }
    }

    Synthesis { series, r, skipped }
}

fn combine(kind: TransformKind, beta: f64, x: f64, y: f64, log_branch: bool) -> Option<f64> {
    match (kind, log_branch) {
        (TransformKind::Ratio, false) => (x != 0.0).then(|| y / x),
        (TransformKind::Ratio, true) => (x > 0.0 && y > 0.0).then(|| y.ln() * x.ln()),
        (TransformKind::RatioWithBeta, false) => {
            let bx = beta * x;
            (bx != 0.0).then(|| y / bx)
        }
        (TransformKind::RatioWithBeta, true) => {
            let bx = beta * x;
            (bx > 0.0 && y > 0.0).then(|| y.ln() * bx.ln())
        }
        (TransformKind::Spread, false) => Some(y - x),
        (TransformKind::Spread, true) => Some(y + x),
        (TransformKind::SpreadWithBeta, false) => Some(y - beta * x),
        (TransformKind::SpreadWithBeta, true) => Some(y + beta * x),
    }
}
