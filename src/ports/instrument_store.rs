//! Persistence port trait.

use crate::domain::error::PairviewError;
use crate::domain::series::{InstrumentSeries, Sample};

/// Store-side record access, keyed by instrument code.
///
/// Records are create-on-first-sight with append-only history; the core never
/// deletes them.
pub trait InstrumentStore {
    /// Insert-if-absent, append-if-present. One call persists one
    /// instrument's change.
    fn upsert_history(&self, code: &str, samples: &[Sample]) -> Result<(), PairviewError>;

    fn fetch_instrument(&self, code: &str) -> Result<Option<InstrumentSeries>, PairviewError>;

    fn list_codes(&self) -> Result<Vec<String>, PairviewError>;
}
