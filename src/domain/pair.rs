//! Pair transform configuration.

use crate::domain::error::PairviewError;
use crate::ports::config_port::ConfigPort;
use std::fmt;
use std::str::FromStr;

/// The algebraic form applied to a pair of legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Ratio,
    RatioWithBeta,
    Spread,
    SpreadWithBeta,
}

impl TransformKind {
    pub fn uses_beta(&self) -> bool {
        matches!(self, Self::RatioWithBeta | Self::SpreadWithBeta)
    }
}

impl FromStr for TransformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ratio" => Ok(Self::Ratio),
            "ratio-with-beta" => Ok(Self::RatioWithBeta),
            "spread" => Ok(Self::Spread),
            "spread-with-beta" => Ok(Self::SpreadWithBeta),
            other => Err(format!(
                "unknown transform {:?} (expected ratio, ratio-with-beta, spread or spread-with-beta)",
                other
            )),
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ratio => "ratio",
            Self::RatioWithBeta => "ratio-with-beta",
            Self::Spread => "spread",
            Self::SpreadWithBeta => "spread-with-beta",
        };
        f.write_str(name)
    }
}

/// Transform kind plus the beta weighting coefficient. Beta is only read by
/// the *-with-beta kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct PairConfig {
    pub kind: TransformKind,
    pub beta: f64,
}

impl PairConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PairviewError> {
        let kind_str = config
            .get_string("pair", "transform")
            .ok_or_else(|| PairviewError::ConfigMissing {
                section: "pair".into(),
                key: "transform".into(),
            })?;
        let kind = kind_str
            .parse()
            .map_err(|reason| PairviewError::ConfigInvalid {
                section: "pair".into(),
                key: "transform".into(),
                reason,
            })?;

        let beta = config.get_double("pair", "beta", 1.0);
        if !beta.is_finite() {
            return Err(PairviewError::ConfigInvalid {
                section: "pair".into(),
                key: "beta".into(),
                reason: "beta must be finite".into(),
            });
        }

        Ok(Self { kind, beta })
    }
}
