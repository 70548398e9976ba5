//! What a finished session reports to its caller.

use crate::error::SearchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Incremental search committed; whether the string ever matched.
    Found(bool),
    /// Query replace finished after this many replacements.
    Replaced(usize),
    /// The user aborted, or there was nothing to do.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub cursor: usize,
    pub outcome: Outcome,
    /// One-line summary for the status area; may be empty.
    pub status: String,
    /// The session ended because of a failure rather than user intent.
    pub error: bool,
    /// A key the session did not consume and hands back to the editor.
    pub reinject: Option<char>,
}

impl SessionResult {
    pub fn new(cursor: usize, outcome: Outcome, status: impl Into<String>) -> Self {
        Self {
            cursor,
            outcome,
            status: status.into(),
            error: false,
            reinject: None,
        }
    }

    pub(crate) fn disposed(cursor: usize) -> Self {
        Self {
            error: true,
            ..Self::new(cursor, Outcome::Aborted, SearchError::TargetDisposed.to_string())
        }
    }
}

/// Result of feeding one command to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The session is still open.
    Continue,
    /// The command was refused; the session stays open so the user can fix it.
    Rejected(SearchError),
    Finished(SessionResult),
}

impl Step {
    pub fn is_finished(&self) -> bool {
        matches!(self, Step::Finished(_))
    }

    pub fn finished(&self) -> Option<&SessionResult> {
        match self {
            Step::Finished(result) => Some(result),
            _ => None,
        }
    }
}
