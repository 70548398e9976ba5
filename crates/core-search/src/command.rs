//! Logical commands understood by search sessions.
//!
//! Mapping physical keys to these commands is the host's business; the
//! default bindings are noted on each variant.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCommand {
    /// Self-inserting character.
    Char(char),
    /// `DEL`
    Backspace,
    /// `C-d`
    Delete,
    /// `C-s`
    SearchForward,
    /// `C-r`
    SearchBackward,
    /// `M-c`
    ToggleCase,
    /// `M-r`
    ToggleRegex,
    /// `C-w`
    YankWord,
    /// `C-y`
    YankLine,
    /// `M-p`
    HistoryPrevious,
    /// `M-n`
    HistoryNext,
    /// `RET`
    Commit,
    /// `C-g`
    Cancel,
    /// `ESC`
    Quit,
}

/// Sub-commands accepted while a query-replace session is prompting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceAnswer {
    /// `SPC` / `y`
    Replace,
    /// `n` / `DEL`
    Skip,
    /// `.`
    ReplaceAndExit,
    /// `,`
    ReplaceAndPause,
    /// `!`
    ReplaceAll,
    /// `q` / `RET`
    Quit,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AnswerParseError {
    #[error("`{0}` is not a query-replace answer")]
    Unknown(char),
}

impl TryFrom<char> for ReplaceAnswer {
    type Error = AnswerParseError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            ' ' | 'y' | 'Y' => Ok(ReplaceAnswer::Replace),
            'n' | 'N' | '\u{7f}' | '\u{8}' => Ok(ReplaceAnswer::Skip),
            '.' => Ok(ReplaceAnswer::ReplaceAndExit),
            ',' => Ok(ReplaceAnswer::ReplaceAndPause),
            '!' => Ok(ReplaceAnswer::ReplaceAll),
            'q' | 'Q' | '\r' | '\n' => Ok(ReplaceAnswer::Quit),
            other => Err(AnswerParseError::Unknown(other)),
        }
    }
}

/// Classify a command received while prompting. Non-character commands
/// that have no answer meaning come back as `Err(None)`.
pub fn parse_answer(command: SearchCommand) -> Result<ReplaceAnswer, Option<AnswerParseError>> {
    match command {
        SearchCommand::Char(c) => ReplaceAnswer::try_from(c).map_err(Some),
        SearchCommand::Backspace | SearchCommand::Delete => Ok(ReplaceAnswer::Skip),
        SearchCommand::Commit => Ok(ReplaceAnswer::Quit),
        _ => Err(None),
    }
}
