//! Domain error types.

/// Top-level error type for pairview.
#[derive(Debug, thiserror::Error)]
pub enum PairviewError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("malformed record in {file} line {line}: {reason}")]
    MalformedRecord {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("persistence error: {reason}")]
    Persistence { reason: String },

    #[error("unknown instrument: {code}")]
    UnknownInstrument { code: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PairviewError> for std::process::ExitCode {
    fn from(err: &PairviewError) -> Self {
        let code: u8 = match err {
            PairviewError::Io(_) => 1,
            PairviewError::ConfigParse { .. }
            | PairviewError::ConfigMissing { .. }
            | PairviewError::ConfigInvalid { .. } => 2,
            PairviewError::SourceUnavailable { .. } => 3,
            PairviewError::Persistence { .. } => 4,
            PairviewError::MalformedRecord { .. } | PairviewError::UnknownInstrument { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
