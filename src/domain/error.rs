//! Domain error types.

/// Top-level error type for smacross.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("price fetch failed: {reason}")]
    Fetch { reason: String },

    #[error("not enough data in the rolling window to compute an average")]
    InsufficientData,

    #[error("invalid price {price}: must be finite and positive")]
    InvalidPrice { price: f64 },

    #[error("failed to persist history to {path}: {reason}")]
    Persistence { path: String, reason: String },

    #[error("history at {path} is unreadable: {reason}")]
    LoadCorruption { path: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("section '{section}' is already empty, nothing to delete")]
    EmptySection { section: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// Errors the trading loop logs and survives.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BotError::Fetch { .. }
                | BotError::InsufficientData
                | BotError::InvalidPrice { .. }
                | BotError::Persistence { .. }
                | BotError::LoadCorruption { .. }
        )
    }
}

impl From<&BotError> for std::process::ExitCode {
    fn from(err: &BotError) -> Self {
        let code: u8 = match err {
            BotError::Io(_) | BotError::EmptySection { .. } => 1,
            BotError::ConfigParse { .. } | BotError::ConfigInvalid { .. } => 2,
            BotError::Persistence { .. } | BotError::LoadCorruption { .. } => 3,
            BotError::Fetch { .. } | BotError::InsufficientData | BotError::InvalidPrice { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_errors_are_recoverable() {
        assert!(BotError::Fetch { reason: "timeout".into() }.is_recoverable());
        assert!(BotError::InsufficientData.is_recoverable());
        assert!(BotError::InvalidPrice { price: f64::NAN }.is_recoverable());
        assert!(
            BotError::Persistence {
                path: "h.json".into(),
                reason: "disk full".into()
            }
            .is_recoverable()
        );
    }

    #[test]
    fn config_errors_are_fatal() {
        let err = BotError::ConfigInvalid {
            section: "bot".into(),
            key: "sma_window_secs".into(),
            reason: "must be positive".into(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "invalid config value [bot] sma_window_secs: must be positive"
        );
    }

    #[test]
    fn empty_section_message() {
        let err = BotError::EmptySection {
            section: "transactions".into(),
        };
        assert_eq!(
            err.to_string(),
            "section 'transactions' is already empty, nothing to delete"
        );
    }
}
