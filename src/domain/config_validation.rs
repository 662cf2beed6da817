//! Configuration validation.
//!
//! Validates every field a subcommand needs before any I/O starts.

use crate::domain::csv_format::CsvFormat;
use crate::domain::error::PairviewError;
use crate::domain::pair::PairConfig;
use crate::domain::schedule::ScheduleConfig;
use crate::ports::config_port::ConfigPort;

/// Provider selection, the two-valued external configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Csv,
    Database,
}

pub fn validate_provider_config(config: &dyn ConfigPort) -> Result<ProviderKind, PairviewError> {
    let kind = match config.get_string("provider", "kind").as_deref() {
        Some("csv") => ProviderKind::Csv,
        Some("database") => ProviderKind::Database,
        Some(other) => {
            return Err(PairviewError::ConfigInvalid {
                section: "provider".into(),
                key: "kind".into(),
                reason: format!("unknown provider kind {:?} (expected csv or database)", other),
            })
        }
        None => {
            return Err(PairviewError::ConfigMissing {
                section: "provider".into(),
                key: "kind".into(),
            })
        }
    };

    match kind {
        ProviderKind::Csv => {
            validate_csv_root(config)?;
            CsvFormat::from_config(config)?;
        }
        ProviderKind::Database => {
            validate_database_config(config)?;
            validate_load_count(config)?;
        }
    }

    Ok(kind)
}

fn validate_csv_root(config: &dyn ConfigPort) -> Result<(), PairviewError> {
    match config.get_string("provider", "root") {
        Some(root) if !root.trim().is_empty() => Ok(()),
        _ => Err(PairviewError::ConfigMissing {
            section: "provider".into(),
            key: "root".into(),
        }),
    }
}

fn validate_load_count(config: &dyn ConfigPort) -> Result<(), PairviewError> {
    let count = config.get_int("provider", "load_count", 1);
    if count < 1 {
        return Err(PairviewError::ConfigInvalid {
            section: "provider".into(),
            key: "load_count".into(),
            reason: "load_count must be at least 1".into(),
        });
    }
    Ok(())
}

pub fn validate_database_config(config: &dyn ConfigPort) -> Result<(), PairviewError> {
    match config.get_string("database", "backend").as_deref() {
        Some("sqlite") => match config.get_string("sqlite", "path") {
            Some(path) if !path.trim().is_empty() => Ok(()),
            _ => Err(PairviewError::ConfigMissing {
                section: "sqlite".into(),
                key: "path".into(),
            }),
        },
        Some("postgres") => match config.get_string("postgres", "conninfo") {
            Some(conninfo) if !conninfo.trim().is_empty() => Ok(()),
            // an empty connection descriptor is a configuration error, not a
            // connectivity one
            Some(_) => Err(PairviewError::ConfigInvalid {
                section: "postgres".into(),
                key: "conninfo".into(),
                reason: "connection descriptor must not be empty".into(),
            }),
            None => Err(PairviewError::ConfigMissing {
                section: "postgres".into(),
                key: "conninfo".into(),
            }),
        },
        Some(other) => Err(PairviewError::ConfigInvalid {
            section: "database".into(),
            key: "backend".into(),
            reason: format!("unknown backend {:?} (expected sqlite or postgres)", other),
        }),
        None => Err(PairviewError::ConfigMissing {
            section: "database".into(),
            key: "backend".into(),
        }),
    }
}

pub fn validate_pair_config(config: &dyn ConfigPort) -> Result<(), PairviewError> {
    PairConfig::from_config(config)?;
    validate_leg(config, "x")?;
    validate_leg(config, "y")?;
    Ok(())
}

fn validate_leg(config: &dyn ConfigPort, key: &str) -> Result<(), PairviewError> {
    match config.get_string("pair", key) {
        Some(code) if !code.trim().is_empty() => Ok(()),
        _ => Err(PairviewError::ConfigMissing {
            section: "pair".into(),
            key: key.into(),
        }),
    }
}

pub fn validate_schedule_config(config: &dyn ConfigPort) -> Result<(), PairviewError> {
    ScheduleConfig::from_config(config)?;
    Ok(())
}
