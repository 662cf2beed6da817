//! Progress notification port trait.

/// Receives incremental progress and the terminal completion notice from
/// long-running operations.
pub trait ProgressSink {
    /// Fraction of work completed, in `0.0..=1.0`.
    fn on_progress(&self, fraction: f64);

    /// Terminal notice. Emitted exactly once per run, success or failure.
    fn on_complete(&self, success: bool, message: &str);
}

/// Sink for callers that do not observe progress.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_progress(&self, _fraction: f64) {}
    fn on_complete(&self, _success: bool, _message: &str) {}
}
