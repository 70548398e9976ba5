//! Incremental search sessions (`C-s`, `C-r`, `C-M-s`, `C-M-r`).
//!
//! The controller maps commands onto the engine and decides when the session
//! ends. Commit records the string in history and leaves the caret at the
//! match (or at the starting point when nothing ever matched). `C-g` first
//! rolls a failing search back to its last match and only aborts, back to
//! the starting point, when there is nothing to roll back.

use core_ring::Rotation;
use tracing::{debug, trace, warn};

use crate::command::SearchCommand;
use crate::engine::{EngineOptions, SearchEngine, Signal};
use crate::error::SearchError;
use crate::history::HistoryRegistry;
use crate::session::{Outcome, SessionResult, Step};
use crate::state::Direction;
use crate::target::SearchHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsearchKind {
    Forward,
    Backward,
    RegexForward,
    RegexBackward,
}

impl IsearchKind {
    pub fn direction(self) -> Direction {
        match self {
            IsearchKind::Forward | IsearchKind::RegexForward => Direction::Forward,
            IsearchKind::Backward | IsearchKind::RegexBackward => Direction::Backward,
        }
    }

    pub fn is_regex(self) -> bool {
        matches!(self, IsearchKind::RegexForward | IsearchKind::RegexBackward)
    }
}

pub struct IncrementalSearchController<'a, H: SearchHost + ?Sized> {
    host: &'a mut H,
    history: &'a mut HistoryRegistry,
    engine: SearchEngine,
    kind: IsearchKind,
    done: Option<SessionResult>,
}

impl<'a, H: SearchHost + ?Sized> IncrementalSearchController<'a, H> {
    pub fn new(
        host: &'a mut H,
        history: &'a mut HistoryRegistry,
        options: EngineOptions,
        kind: IsearchKind,
    ) -> Self {
        let start = host.caret();
        let engine = SearchEngine::new(options.live(true), kind.direction(), kind.is_regex(), start);
        debug!(target: "search.isearch", ?kind, start, "session_start");
        Self {
            host,
            history,
            engine,
            kind,
            done: None,
        }
    }

    pub fn kind(&self) -> IsearchKind {
        self.kind
    }
    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }
    pub fn host(&self) -> &H {
        &*self.host
    }
    pub fn prompt(&self) -> String {
        self.engine.prompt()
    }
    pub fn take_signals(&mut self) -> Vec<Signal> {
        self.engine.take_signals()
    }
    pub fn result(&self) -> Option<&SessionResult> {
        self.done.as_ref()
    }

    /// Feed one command. After the session finished every call repeats the result.
    pub fn handle(&mut self, command: SearchCommand) -> Step {
        if let Some(result) = &self.done {
            return Step::Finished(result.clone());
        }
        trace!(target: "search.isearch", ?command, "command");
        let step = match self.dispatch(command) {
            Ok(step) => step,
            Err(SearchError::TargetDisposed) => {
                warn!(target: "search.isearch", "target_disposed");
                Step::Finished(SessionResult::disposed(self.engine.start_offset()))
            }
            Err(err) => Step::Rejected(err),
        };
        if let Step::Finished(result) = &step {
            self.done = Some(result.clone());
        }
        step
    }

    fn dispatch(&mut self, command: SearchCommand) -> Result<Step, SearchError> {
        match command {
            SearchCommand::Char(c) => {
                self.engine.add_character(&mut *self.host, c)?;
            }
            SearchCommand::Backspace | SearchCommand::Delete => {
                if !self.engine.backspace(&mut *self.host) {
                    self.engine.bell();
                }
            }
            SearchCommand::SearchForward => self.repeat(Direction::Forward)?,
            SearchCommand::SearchBackward => self.repeat(Direction::Backward)?,
            SearchCommand::ToggleCase => {
                self.engine.toggle_case(&mut *self.host)?;
            }
            SearchCommand::ToggleRegex => {
                self.engine.toggle_regex(&mut *self.host)?;
            }
            SearchCommand::YankWord => {
                self.engine.yank_word(&mut *self.host)?;
            }
            SearchCommand::YankLine => {
                self.engine.yank_line(&mut *self.host)?;
            }
            SearchCommand::HistoryPrevious => {
                self.engine
                    .recall_history(&mut *self.host, self.history, Rotation::Older)?;
            }
            SearchCommand::HistoryNext => {
                self.engine
                    .recall_history(&mut *self.host, self.history, Rotation::Newer)?;
            }
            SearchCommand::Commit => return Ok(self.commit()),
            SearchCommand::Cancel => return Ok(self.cancel()),
            SearchCommand::Quit => return Ok(self.abort(false)),
        }
        Ok(Step::Continue)
    }

    fn repeat(&mut self, direction: Direction) -> Result<(), SearchError> {
        if direction != self.engine.direction() {
            let found = self.engine.reverse(&mut *self.host);
            if !found && !self.engine.text().is_empty() {
                self.engine.find_next(&mut *self.host, false)?;
            }
            return Ok(());
        }
        if self.engine.text().is_empty() {
            let latest = self.history.latest(self.engine.flavor()).map(str::to_owned);
            match latest {
                Some(latest) => {
                    self.engine.seed(&mut *self.host, &latest)?;
                }
                None => self.engine.bell(),
            }
            return Ok(());
        }
        self.engine.repeat(&mut *self.host)?;
        Ok(())
    }

    fn commit(&mut self) -> Step {
        if let Some(err) = self.engine.pattern_error() {
            debug!(target: "search.isearch", error = %err, "commit_rejected");
            return Step::Rejected(err);
        }
        let start = self.engine.start_offset();
        let text = self.engine.text().to_string();
        if !text.is_empty() {
            self.history.remember(self.engine.flavor(), &text);
        }
        let matched = self.engine.has_matched();
        let (cursor, status) = if matched {
            self.host.push_mark(start);
            (self.host.caret(), "Mark saved where search started".to_string())
        } else {
            self.host.set_caret(start);
            let status = if text.is_empty() {
                String::new()
            } else {
                SearchError::NoMatch(text).to_string()
            };
            (start, status)
        };
        debug!(target: "search.isearch", cursor, matched, "session_commit");
        Step::Finished(SessionResult::new(cursor, Outcome::Found(matched), status))
    }

    fn cancel(&mut self) -> Step {
        if self.engine.cancel(&mut *self.host) {
            return Step::Continue;
        }
        self.abort(true)
    }

    fn abort(&mut self, bell: bool) -> Step {
        let start = self.engine.start_offset();
        self.host.set_caret(start);
        if bell {
            self.engine.bell();
        }
        debug!(target: "search.isearch", start, "session_cancel");
        Step::Finished(SessionResult::new(start, Outcome::Aborted, "Quit"))
    }
}
