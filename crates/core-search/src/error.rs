use thiserror::Error;

/// Failures the engine resolves internally; only `SessionResult` leaves a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Expected and recoverable; surfaces as a status flag.
    #[error("no match for `{0}`")]
    NoMatch(String),
    /// Suppressed while typing, reported when the session tries to commit.
    #[error("invalid regexp `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
    /// Committing an empty search string ends the session silently.
    #[error("nothing to search for")]
    EmptyInput,
    /// The buffer went away under an open session; the session tears down.
    #[error("search target was disposed")]
    TargetDisposed,
}

impl From<core_text::FindError> for SearchError {
    fn from(err: core_text::FindError) -> Self {
        match err {
            core_text::FindError::InvalidPattern { pattern, message } => {
                SearchError::InvalidPattern { pattern, message }
            }
        }
    }
}
