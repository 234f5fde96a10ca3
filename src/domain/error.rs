//! Domain error types.

/// Top-level error type for papertrader.
#[derive(Debug, thiserror::Error)]
pub enum PapertraderError {
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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("insufficient data for {ticker}: have {samples} samples, need {minimum}")]
    InsufficientData {
        ticker: String,
        samples: usize,
        minimum: usize,
    },

    #[error("invalid signal for {ticker}: {reason}")]
    InvalidSignal { ticker: String, reason: String },

    #[error("inconsistent engine state for {ticker}: {reason}")]
    InconsistentState { ticker: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PapertraderError> for std::process::ExitCode {
    fn from(err: &PapertraderError) -> Self {
        let code: u8 = match err {
            PapertraderError::Io(_) => 1,
            PapertraderError::ConfigParse { .. }
            | PapertraderError::ConfigMissing { .. }
            | PapertraderError::ConfigInvalid { .. } => 2,
            PapertraderError::Data { .. } | PapertraderError::InsufficientData { .. } => 3,
            PapertraderError::InvalidSignal { .. } => 4,
            PapertraderError::InconsistentState { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
