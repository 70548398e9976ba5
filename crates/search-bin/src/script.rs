//! Key script syntax.
//!
//! Plain characters self-insert; named keys go in angle brackets:
//! `<C-s>` `<C-r>` `<BS>` `<C-d>` `<RET>` `<C-g>` `<ESC>` `<M-c>` `<M-r>`
//! `<C-w>` `<C-y>` `<M-p>` `<M-n>` `<SPC>` `<TAB>` `<C-j>` and `<lt>` for a
//! literal `<`.

use core_search::SearchCommand;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unterminated key name starting at byte {0}")]
    Unterminated(usize),
    #[error("unknown key name `<{0}>`")]
    UnknownKey(String),
}

pub fn parse(source: &str) -> Result<Vec<SearchCommand>, ScriptError> {
    let mut commands = Vec::new();
    let mut rest = source;
    let mut offset = 0;
    while let Some(c) = rest.chars().next() {
        if c != '<' {
            commands.push(SearchCommand::Char(c));
            offset += c.len_utf8();
            rest = &rest[c.len_utf8()..];
            continue;
        }
        let Some(close) = rest.find('>') else {
            return Err(ScriptError::Unterminated(offset));
        };
        let name = &rest[1..close];
        commands.push(named_key(name)?);
        offset += close + 1;
        rest = &rest[close + 1..];
    }
    Ok(commands)
}

fn named_key(name: &str) -> Result<SearchCommand, ScriptError> {
    let command = match name {
        "C-s" => SearchCommand::SearchForward,
        "C-r" => SearchCommand::SearchBackward,
        "BS" | "DEL" => SearchCommand::Backspace,
        "C-d" => SearchCommand::Delete,
        "RET" => SearchCommand::Commit,
        "C-g" => SearchCommand::Cancel,
        "ESC" => SearchCommand::Quit,
        "M-c" => SearchCommand::ToggleCase,
        "M-r" => SearchCommand::ToggleRegex,
        "C-w" => SearchCommand::YankWord,
        "C-y" => SearchCommand::YankLine,
        "M-p" => SearchCommand::HistoryPrevious,
        "M-n" => SearchCommand::HistoryNext,
        "SPC" => SearchCommand::Char(' '),
        "TAB" => SearchCommand::Char('\t'),
        "C-j" => SearchCommand::Char('\n'),
        "lt" => SearchCommand::Char('<'),
        other => return Err(ScriptError::UnknownKey(other.to_string())),
    };
    Ok(command)
}
