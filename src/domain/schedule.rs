//! Background cycle intervals.

use crate::domain::error::PairviewError;
use crate::ports::config_port::ConfigPort;
use std::time::Duration;

/// Refresh and persist intervals for the background scheduler.
///
/// Configured as positive integer seconds, unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub refresh: Duration,
    pub persist: Duration,
}

impl ScheduleConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PairviewError> {
        Ok(Self {
            refresh: read_interval(config, "refresh_interval")?,
            persist: read_interval(config, "persist_interval")?,
        })
    }
}

fn read_interval(config: &dyn ConfigPort, key: &str) -> Result<Duration, PairviewError> {
    let secs = config.get_int("schedule", key, 0);
    if secs < 1 {
        return Err(PairviewError::ConfigInvalid {
            section: "schedule".into(),
            key: key.into(),
            reason: "interval must be a positive number of seconds".into(),
        });
    }
    Ok(Duration::from_secs(secs as u64))
}
