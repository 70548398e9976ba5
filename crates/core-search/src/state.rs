//! Checkpoints of the search session, one per mutating keystroke.
//!
//! Every key that changes the search pushes the state it is about to leave.
//! Popping restores it exactly, so backspace is the inverse of the key
//! before it. Consecutive checkpoints holding the same text share it: the
//! older one drops its copy and inherits the text of the checkpoint above.

use core_state::Selection;
use tracing::trace;

use crate::policy::{CasePolicy, PatternPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Forward)
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Progress toward "the whole buffer was searched".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapState {
    #[default]
    Unwrapped,
    /// A search failed; the next repeat starts over from the buffer edge.
    /// `depth` is the checkpoint depth at which the failure happened.
    Armed { depth: usize },
    /// The wrapped search failed too. Repeats stop searching.
    Exhausted,
}

/// Snapshot of everything a keystroke can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    /// `None` when equal to the text of the checkpoint pushed after this one.
    pub text: Option<String>,
    pub regex_text: Option<String>,
    pub selection: Selection,
    pub caret: usize,
    pub search_offset: usize,
    pub found: bool,
    pub failing: bool,
    pub direction: Direction,
    pub wrap: WrapState,
    pub case: CasePolicy,
    pub pattern: PatternPolicy,
    pub pattern_valid: bool,
}

#[derive(Debug, Default)]
pub struct StateStack {
    states: Vec<SearchState>,
}

impl StateStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn push(&mut self, state: SearchState) {
        if let Some(top) = self.states.last_mut()
            && (top.text.is_none() || top.text == state.text)
        {
            top.text = None;
            top.regex_text = None;
            trace!(target: "search.engine", depth = self.states.len(), "checkpoint_text_merged");
        }
        self.states.push(state);
        trace!(target: "search.engine", depth = self.states.len(), "checkpoint_pushed");
    }

    pub fn pop(&mut self) -> Option<SearchState> {
        let state = self.states.pop();
        trace!(target: "search.engine", depth = self.states.len(), popped = state.is_some(), "checkpoint_popped");
        state
    }

    pub fn top(&self) -> Option<&SearchState> {
        self.states.last()
    }
}
