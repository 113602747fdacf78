use thiserror::Error;

/// Fatal errors. Per-tick conditions the loop recovers from are
/// [`crate::game::TickIssue`] values instead.
#[derive(Error, Debug)]
pub enum KickrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("History database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not initialise {source_name}: {reason}")]
    SourceInit { source_name: String, reason: String },

    #[error("Malformed recording at line {line}: {reason}")]
    Recording { line: usize, reason: String },
}

impl KickrError {
    pub fn source_init(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        KickrError::SourceInit {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Errors that abort before the game screen is entered.
    pub fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            KickrError::SourceInit { .. } | KickrError::Recording { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, KickrError>;
