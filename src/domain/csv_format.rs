//! Delimited flat-file format descriptor.

use crate::domain::error::PairviewError;
use crate::ports::config_port::ConfigPort;

/// Separators accepted by the file provider.
pub const ALLOWED_SEPARATORS: &[char] = &[',', '.', ';', ':', '\\', '|'];

/// Column layout for delimited market-data files.
///
/// Column indices are 0-based internally. Configuration files use 1-based
/// columns; [`from_config`](CsvFormat::from_config) is the conversion
/// boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvFormat {
    pub separator: char,
    pub price_index: usize,
    pub volume_index: usize,
    pub has_header: bool,
}

impl CsvFormat {
    /// Checks the format invariants. Must pass before any file I/O is
    /// attempted.
    pub fn validate(&self) -> Result<(), PairviewError> {
        if !ALLOWED_SEPARATORS.contains(&self.separator) {
            return Err(PairviewError::ConfigInvalid {
                section: "csv".into(),
                key: "separator".into(),
                reason: format!("separator {:?} is not in the allowed set", self.separator),
            });
        }
        if self.price_index == self.volume_index {
            return Err(PairviewError::ConfigInvalid {
                section: "csv".into(),
                key: "price_column".into(),
                reason: "price and volume columns must differ".into(),
            });
        }
        Ok(())
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PairviewError> {
        let separator = config
            .get_string("csv", "separator")
            .unwrap_or_else(|| ",".to_string());
        let separator = separator
            .chars()
            .next()
            .ok_or_else(|| PairviewError::ConfigInvalid {
                section: "csv".into(),
                key: "separator".into(),
                reason: "separator must be a single character".into(),
            })?;

        let format = Self {
            separator,
            price_index: read_column(config, "price_column")?,
            volume_index: read_column(config, "volume_column")?,
            has_header: config.get_bool("csv", "has_header", true),
        };
        format.validate()?;
        Ok(format)
    }
}

fn read_column(config: &dyn ConfigPort, key: &str) -> Result<usize, PairviewError> {
    let value = config.get_int("csv", key, 0);
    if value < 1 {
        return Err(PairviewError::ConfigInvalid {
            section: "csv".into(),
            key: key.into(),
            reason: "columns are 1-based and must be at least 1".into(),
        });
    }
    Ok((value - 1) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn format(separator: char, price: usize, volume: usize) -> CsvFormat {
        CsvFormat {
            separator,
            price_index: price,
            volume_index: volume,
            has_header: true,
        }
    }

    #[test]
    fn valid_format_passes() {
        assert!(format(',', 5, 6).validate().is_ok());
        assert!(format('|', 0, 1).validate().is_ok());
    }

    #[test]
    fn equal_indices_rejected() {
        let err = format(',', 5, 5).validate().unwrap_err();
        assert!(matches!(
            err,
            PairviewError::ConfigInvalid { key, .. } if key == "price_column"
        ));
    }

    #[test]
    fn disallowed_separator_rejected() {
        let err = format('\t', 5, 6).validate().unwrap_err();
        assert!(matches!(
            err,
            PairviewError::ConfigInvalid { key, .. } if key == "separator"
        ));
    }

    #[test]
    fn from_config_converts_one_based_columns() {
        let config = FileConfigAdapter::from_string(
            "[csv]\nseparator = |\nprice_column = 6\nvolume_column = 7\nhas_header = false\n",
        )
        .unwrap();

        let format = CsvFormat::from_config(&config).unwrap();
        assert_eq!(format.separator, '|');
        assert_eq!(format.price_index, 5);
        assert_eq!(format.volume_index, 6);
        assert!(!format.has_header);
    }

    #[test]
    fn from_config_defaults() {
        let config =
            FileConfigAdapter::from_string("[csv]\nprice_column = 2\nvolume_column = 3\n").unwrap();

        let format = CsvFormat::from_config(&config).unwrap();
        assert_eq!(format.separator, ',');
        assert!(format.has_header);
    }

    #[test]
    fn from_config_rejects_zero_column() {
        let config =
            FileConfigAdapter::from_string("[csv]\nprice_column = 0\nvolume_column = 3\n").unwrap();

        let err = CsvFormat::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PairviewError::ConfigInvalid { key, .. } if key == "price_column"
        ));
    }
}
