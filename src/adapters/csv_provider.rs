//! Flat-file data provider.
//!
//! Every `*.csv` file under the root is one instrument; the code is the
//! upper-cased file stem. Timestamps are synthesized at processing time — a
//! known approximation, the source files carry no usable clock.

use crate::domain::csv_format::CsvFormat;
use crate::domain::error::PairviewError;
use crate::domain::series::{InstrumentSeries, Sample};
use crate::ports::data_provider::{DataProvider, FetchReport};
use chrono::Utc;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct CsvProvider {
    root: PathBuf,
    format: CsvFormat,
}

impl CsvProvider {
    /// Fails fast with `ConfigInvalid` on a bad format, before any I/O.
    pub fn new(root: impl Into<PathBuf>, format: CsvFormat) -> Result<Self, PairviewError> {
        format.validate()?;
        Ok(Self {
            root: root.into(),
            format,
        })
    }

    fn read_file(&self, path: &Path) -> Result<(InstrumentSeries, usize), PairviewError> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_uppercase())
            .unwrap_or_default();
        let display = path.display().to_string();

        let file = File::open(path).map_err(|e| PairviewError::SourceUnavailable {
            source_name: display.clone(),
            reason: e.to_string(),
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.format.separator as u8)
            .has_headers(self.format.has_header)
            .flexible(true)
            .from_reader(file);

        let mut series = InstrumentSeries::new(name);
        let mut skipped = 0usize;
        // data rows start after the optional header
        let first_line = if self.format.has_header { 2 } else { 1 };

        for (i, record) in reader.records().enumerate() {
            let line = first_line + i;
            match parse_row(record, &self.format, &display, line) {
                Ok((price, volume)) => series.push(Sample {
                    timestamp: Utc::now(),
                    price,
                    volume,
                }),
                Err(_) => skipped += 1,
            }
        }

        Ok((series, skipped))
    }
}

fn parse_row(
    record: Result<csv::StringRecord, csv::Error>,
    format: &CsvFormat,
    file: &str,
    line: usize,
) -> Result<(f64, i64), PairviewError> {
    let malformed = |reason: String| PairviewError::MalformedRecord {
        file: file.to_string(),
        line,
        reason,
    };

    let record = record.map_err(|e| malformed(e.to_string()))?;

    let price_field = record
        .get(format.price_index)
        .ok_or_else(|| malformed(format!("missing column {}", format.price_index + 1)))?;
    let price: f64 = price_field
        .trim()
        .parse()
        .map_err(|_| malformed(format!("invalid price {:?}", price_field)))?;

    let volume_field = record
        .get(format.volume_index)
        .ok_or_else(|| malformed(format!("missing column {}", format.volume_index + 1)))?;
    let volume: i64 = volume_field
        .trim()
        .parse()
        .map_err(|_| malformed(format!("invalid volume {:?}", volume_field)))?;

    Ok((price, volume))
}

impl DataProvider for CsvProvider {
    fn fetch_all(&self) -> Result<FetchReport, PairviewError> {
        let entries =
            std::fs::read_dir(&self.root).map_err(|e| PairviewError::SourceUnavailable {
                source_name: self.root.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PairviewError::SourceUnavailable {
                source_name: self.root.display().to_string(),
                reason: e.to_string(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut instruments = Vec::with_capacity(paths.len());
        let mut skipped_rows = 0usize;

        for path in &paths {
            let (series, skipped) = self.read_file(path)?;
            skipped_rows += skipped;
            instruments.push(series);
        }

        Ok(FetchReport {
            instruments,
            skipped_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn format() -> CsvFormat {
        CsvFormat {
            separator: ',',
            price_index: 1,
            volume_index: 2,
            has_header: true,
        }
    }

    fn setup(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn fetch_all_yields_one_record_per_data_line() {
        let dir = setup(&[(
            "aaa.csv",
            "date,price,volume\n2024-01-01,100.5,5000\n2024-01-02,101.0,6000\n",
        )]);
        let provider = CsvProvider::new(dir.path(), format()).unwrap();

        let report = provider.fetch_all().unwrap();
        assert_eq!(report.instruments.len(), 1);
        assert_eq!(report.skipped_rows, 0);

        let series = &report.instruments[0];
        assert_eq!(series.code, "AAA");
        assert_eq!(series.len(), 2);
        assert_eq!(series.samples()[0].price, 100.5);
        assert_eq!(series.samples()[0].volume, 5000);
        assert_eq!(series.samples()[1].price, 101.0);
    }

    #[test]
    fn fetch_all_orders_instruments_by_file_name() {
        let dir = setup(&[
            ("bbb.csv", "h,p,v\nx,1.0,1\n"),
            ("aaa.csv", "h,p,v\nx,2.0,2\n"),
        ]);
        let provider = CsvProvider::new(dir.path(), format()).unwrap();

        let report = provider.fetch_all().unwrap();
        let codes: Vec<_> = report.instruments.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["AAA", "BBB"]);
    }

    #[test]
    fn header_not_skipped_when_absent() {
        let dir = setup(&[("aaa.csv", "x,1.5,100\ny,2.5,200\n")]);
        let mut fmt = format();
        fmt.has_header = false;
        let provider = CsvProvider::new(dir.path(), fmt).unwrap();

        let report = provider.fetch_all().unwrap();
        assert_eq!(report.instruments[0].len(), 2);
    }

    #[test]
    fn malformed_rows_skipped_and_counted() {
        let dir = setup(&[(
            "aaa.csv",
            "date,price,volume\n2024-01-01,100.5,5000\n2024-01-02,not-a-price,6000\n2024-01-03,short\n2024-01-04,102.0,7000\n",
        )]);
        let provider = CsvProvider::new(dir.path(), format()).unwrap();

        let report = provider.fetch_all().unwrap();
        assert_eq!(report.instruments[0].len(), 2);
        assert_eq!(report.skipped_rows, 2);
    }

    #[test]
    fn custom_separator() {
        let dir = setup(&[("aaa.csv", "d|p|v\nx|3.5|10\n")]);
        let mut fmt = format();
        fmt.separator = '|';
        let provider = CsvProvider::new(dir.path(), fmt).unwrap();

        let report = provider.fetch_all().unwrap();
        assert_eq!(report.instruments[0].samples()[0].price, 3.5);
    }

    #[test]
    fn missing_root_is_source_unavailable() {
        let provider = CsvProvider::new("/nonexistent/market-data", format()).unwrap();
        let err = provider.fetch_all().unwrap_err();
        assert!(matches!(err, PairviewError::SourceUnavailable { .. }));
    }

    #[test]
    fn equal_indices_rejected_before_io() {
        let mut fmt = format();
        fmt.volume_index = fmt.price_index;
        // the root does not exist; validation must fail first
        let err = CsvProvider::new("/nonexistent/market-data", fmt).unwrap_err();
        assert!(matches!(err, PairviewError::ConfigInvalid { .. }));
    }

    #[test]
    fn non_csv_files_ignored() {
        let dir = setup(&[
            ("aaa.csv", "h,p,v\nx,1.0,1\n"),
            ("notes.txt", "not market data"),
        ]);
        let provider = CsvProvider::new(dir.path(), format()).unwrap();

        let report = provider.fetch_all().unwrap();
        assert_eq!(report.instruments.len(), 1);
    }

    #[test]
    fn timestamps_are_non_decreasing() {
        let dir = setup(&[(
            "aaa.csv",
            "d,p,v\na,1.0,1\nb,2.0,2\nc,3.0,3\n",
        )]);
        let provider = CsvProvider::new(dir.path(), format()).unwrap();

        let report = provider.fetch_all().unwrap();
        let samples = report.instruments[0].samples();
        for pair in samples.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }
}
