#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_ring::RotationMode;
use core_search::{HistoryRegistry, SearchCommand, Step};
use core_state::Document;

pub fn doc(content: &str) -> Document {
    Document::from_str("t", content).unwrap()
}

pub fn history() -> HistoryRegistry {
    HistoryRegistry::new(8, RotationMode::Wrap)
}

/// Expand a compact key string: `\n` commits, every other char self-inserts.
pub fn keys(s: &str) -> Vec<SearchCommand> {
    s.chars()
        .map(|c| match c {
            '\n' => SearchCommand::Commit,
            other => SearchCommand::Char(other),
        })
        .collect()
}

/// Feed commands, returning the last step.
pub fn feed(mut handle: impl FnMut(SearchCommand) -> Step, commands: &[SearchCommand]) -> Step {
    let mut last = Step::Continue;
    for command in commands {
        last = handle(*command);
    }
    last
}
