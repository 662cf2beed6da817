//! Data ingestion port trait.

use crate::domain::error::PairviewError;
use crate::domain::series::InstrumentSeries;

/// Result of one full ingestion pass.
///
/// Malformed rows are omissions counted in `skipped_rows`, never a fetch
/// failure.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub instruments: Vec<InstrumentSeries>,
    pub skipped_rows: usize,
}

/// Capability contract for an instrument data source.
///
/// Variants are selected at construction time; nothing downstream branches on
/// the source kind.
pub trait DataProvider {
    /// Fetches every instrument the source knows about, with history.
    ///
    /// Fails with [`PairviewError::SourceUnavailable`] when the underlying
    /// file root or store connection is unreachable.
    fn fetch_all(&self) -> Result<FetchReport, PairviewError>;
}
