//! Query replace (`M-%`, `C-M-%`) and replace-string sessions.
//!
//! A session moves through three stages and never goes back:
//! 1. `CollectingSearch`: the engine collects the pattern without searching.
//!    Committing an empty pattern ends the session silently.
//! 2. `CollectingReplacement`: plain text collection. Commit either starts
//!    prompting at the first match or, in `ReplaceMode::All`, replaces every
//!    match at once.
//! 3. `Replacing`: each key is a one-letter answer (see `ReplaceAnswer`).
//!    An unknown key finishes the session and is handed back for reinjection.
//!
//! A non-empty selection at session start pins a region limit at its end;
//! matches reaching past the limit count as "not found". The limit follows
//! the length change of every replacement made before it.

use core_ring::Rotation;
use core_text::grapheme;
use tracing::{debug, trace, warn};

use crate::command::{AnswerParseError, ReplaceAnswer, SearchCommand, parse_answer};
use crate::engine::{EngineOptions, SearchEngine, Signal};
use crate::error::SearchError;
use crate::history::HistoryRegistry;
use crate::policy::{ReplacementTemplate, case_replace};
use crate::session::{Outcome, SessionResult, Step};
use crate::state::Direction;
use crate::target::{FindRequest, SearchHost, TargetError, UndoGroupGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceMode {
    /// Ask before every replacement.
    #[default]
    Query,
    /// Replace every match without asking.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceStage {
    CollectingSearch,
    CollectingReplacement,
    Replacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOptions {
    pub engine: EngineOptions,
    pub preserve_case: bool,
    pub mode: ReplaceMode,
    pub regex: bool,
}

impl ReplaceOptions {
    pub fn from_config(cfg: &core_config::SearchConfig) -> Self {
        Self {
            engine: EngineOptions::from_config(cfg),
            preserve_case: cfg.preserve_case(),
            mode: ReplaceMode::Query,
            regex: false,
        }
    }

    pub fn mode(mut self, mode: ReplaceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn regex(mut self, yes: bool) -> Self {
        self.regex = yes;
        self
    }
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self::from_config(&core_config::SearchConfig::defaults())
    }
}

/// The frozen pattern and replacement plus the running tally.
#[derive(Debug)]
struct ReplaceJob {
    pattern: String,
    regex: bool,
    case_sensitive: bool,
    whole_word: bool,
    template: ReplacementTemplate,
    preserve_case: bool,
    region_limit: Option<usize>,
    count: usize,
    matched: bool,
    /// The current match was empty. The next search starts one grapheme
    /// past the selection end, whether or not it was replaced.
    empty_match: bool,
}

impl ReplaceJob {
    fn find_from<H>(&mut self, host: &mut H, start: usize) -> Result<bool, TargetError>
    where
        H: SearchHost + ?Sized,
    {
        let before = host.selection();
        let before_caret = host.caret();
        let req = FindRequest {
            start,
            pattern: &self.pattern,
            forward: true,
            case_sensitive: self.case_sensitive,
            whole_word: self.whole_word,
            regex: self.regex,
        };
        if host.find_and_select(&req)?.is_none() {
            return Ok(false);
        }
        let sel = host.selection();
        if let Some(limit) = self.region_limit
            && sel.end() > limit
        {
            trace!(target: "search.replace", offset = sel.offset, limit, "match_outside_region");
            host.select(before, before_caret);
            return Ok(false);
        }
        self.matched = true;
        self.empty_match = sel.is_empty();
        Ok(true)
    }

    fn find_next<H>(&mut self, host: &mut H) -> Result<bool, TargetError>
    where
        H: SearchHost + ?Sized,
    {
        let sel = host.selection();
        let start = if self.empty_match {
            let contents = host.contents();
            if sel.end() >= contents.len() {
                return Ok(false);
            }
            grapheme::next_boundary(&contents, sel.end())
        } else {
            sel.end()
        };
        self.find_from(host, start)
    }

    /// Replace the selected match. Case-preserving replacement is a second
    /// edit over the raw result; both land in one undo step.
    fn replace_current<H>(&mut self, host: &mut H) -> Result<(), TargetError>
    where
        H: SearchHost + ?Sized,
    {
        let mut group = UndoGroupGuard::open(host);
        let host = group.host();
        let matched = host.selection_text();
        let was_empty = host.selection().is_empty();
        let len_before = host.text_len();
        host.replace_selection(&self.template.text, self.template.expand)?;
        if self.preserve_case && !self.case_sensitive {
            let raw = host.selection_text();
            let cased = case_replace(&matched, &raw);
            if cased != raw {
                host.replace_selection(&cased, false)?;
            }
        }
        let len_after = host.text_len();
        if let Some(limit) = self.region_limit.as_mut() {
            *limit = (*limit + len_after).saturating_sub(len_before);
        }
        self.count += 1;
        self.empty_match = was_empty;
        trace!(target: "search.replace", count = self.count, matched = matched.as_str(), "replaced");
        Ok(())
    }

    fn replace_remaining<H>(&mut self, host: &mut H, first_found: bool) -> Result<(), TargetError>
    where
        H: SearchHost + ?Sized,
    {
        let mut group = UndoGroupGuard::open(host);
        let host = group.host();
        let mut found = first_found;
        while found {
            self.replace_current(host)?;
            found = self.find_next(host)?;
        }
        Ok(())
    }
}

pub struct QueryReplaceController<'a, H: SearchHost + ?Sized> {
    host: &'a mut H,
    history: &'a mut HistoryRegistry,
    engine: SearchEngine,
    options: ReplaceOptions,
    stage: ReplaceStage,
    replacement: String,
    job: Option<ReplaceJob>,
    region_limit: Option<usize>,
    start_offset: usize,
    paused: bool,
    done: Option<SessionResult>,
}

impl<'a, H: SearchHost + ?Sized> QueryReplaceController<'a, H> {
    pub fn new(host: &'a mut H, history: &'a mut HistoryRegistry, options: ReplaceOptions) -> Self {
        let sel = host.selection();
        let (start_offset, region_limit) = if sel.is_empty() {
            (host.caret(), None)
        } else {
            (sel.offset, Some(sel.end()))
        };
        host.set_caret(start_offset);
        let engine = SearchEngine::new(
            options.engine.live(false),
            Direction::Forward,
            options.regex,
            start_offset,
        );
        debug!(target: "search.replace", start = start_offset, ?region_limit, mode = ?options.mode, "session_start");
        Self {
            host,
            history,
            engine,
            options,
            stage: ReplaceStage::CollectingSearch,
            replacement: String::new(),
            job: None,
            region_limit,
            start_offset,
            paused: false,
            done: None,
        }
    }

    pub fn stage(&self) -> ReplaceStage {
        self.stage
    }
    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }
    pub fn host(&self) -> &H {
        &*self.host
    }
    pub fn replacement(&self) -> &str {
        &self.replacement
    }
    pub fn match_count(&self) -> usize {
        self.job.as_ref().map_or(0, |job| job.count)
    }
    pub fn region_limit(&self) -> Option<usize> {
        self.job
            .as_ref()
            .map_or(self.region_limit, |job| job.region_limit)
    }
    pub fn is_paused(&self) -> bool {
        self.paused
    }
    pub fn take_signals(&mut self) -> Vec<Signal> {
        self.engine.take_signals()
    }
    pub fn result(&self) -> Option<&SessionResult> {
        self.done.as_ref()
    }

    pub fn prompt(&self) -> String {
        let what = match (self.options.mode, self.engine.is_regex()) {
            (ReplaceMode::Query, false) => "Query replace",
            (ReplaceMode::Query, true) => "Query replace regexp",
            (ReplaceMode::All, false) => "Replace string",
            (ReplaceMode::All, true) => "Replace regexp",
        };
        match self.stage {
            ReplaceStage::CollectingSearch => format!("{what}: {}", self.engine.text()),
            ReplaceStage::CollectingReplacement => {
                format!("{what} {} with: {}", self.engine.text(), self.replacement)
            }
            ReplaceStage::Replacing => format!(
                "Query replacing {} with {}: (y, n, !, ., ,, q)",
                self.engine.text(),
                self.replacement
            ),
        }
    }

    /// Feed one command. After the session finished every call repeats the result.
    pub fn handle(&mut self, command: SearchCommand) -> Step {
        if let Some(result) = &self.done {
            return Step::Finished(result.clone());
        }
        trace!(target: "search.replace", stage = ?self.stage, ?command, "command");
        let step = match self.stage {
            ReplaceStage::CollectingSearch => self.collect_search(command),
            ReplaceStage::CollectingReplacement => self.collect_replacement(command),
            ReplaceStage::Replacing => self.answer(command),
        };
        let step = match step {
            Ok(step) => step,
            Err(SearchError::TargetDisposed) => {
                warn!(target: "search.replace", "target_disposed");
                Step::Finished(SessionResult::disposed(self.start_offset))
            }
            Err(err) => Step::Rejected(err),
        };
        if let Step::Finished(result) = &step {
            self.done = Some(result.clone());
        }
        step
    }

    fn collect_search(&mut self, command: SearchCommand) -> Result<Step, SearchError> {
        match command {
            SearchCommand::Char(c) => {
                self.engine.add_character(&mut *self.host, c)?;
            }
            SearchCommand::Backspace | SearchCommand::Delete => {
                if !self.engine.backspace(&mut *self.host) {
                    self.engine.bell();
                }
            }
            SearchCommand::YankWord => {
                self.engine.yank_word(&mut *self.host)?;
            }
            SearchCommand::YankLine => {
                self.engine.yank_line(&mut *self.host)?;
            }
            SearchCommand::ToggleCase => {
                self.engine.toggle_case(&mut *self.host)?;
            }
            SearchCommand::ToggleRegex => {
                self.engine.toggle_regex(&mut *self.host)?;
            }
            SearchCommand::HistoryPrevious => {
                self.engine
                    .recall_history(&mut *self.host, self.history, Rotation::Older)?;
            }
            SearchCommand::HistoryNext => {
                self.engine
                    .recall_history(&mut *self.host, self.history, Rotation::Newer)?;
            }
            SearchCommand::SearchForward | SearchCommand::SearchBackward => {}
            SearchCommand::Commit => return Ok(self.commit_search()),
            SearchCommand::Cancel | SearchCommand::Quit => return Ok(self.abort()),
        }
        Ok(Step::Continue)
    }

    fn commit_search(&mut self) -> Step {
        let text = self.engine.text().to_string();
        if text.is_empty() {
            debug!(target: "search.replace", error = %SearchError::EmptyInput, "session_cancel");
            return Step::Finished(SessionResult::new(self.start_offset, Outcome::Aborted, ""));
        }
        if let Some(err) = self.engine.pattern_error() {
            return Step::Rejected(err);
        }
        self.history.remember(self.engine.flavor(), &text);
        self.stage = ReplaceStage::CollectingReplacement;
        trace!(target: "search.replace", pattern = text.as_str(), "pattern_frozen");
        Step::Continue
    }

    fn collect_replacement(&mut self, command: SearchCommand) -> Result<Step, SearchError> {
        match command {
            SearchCommand::Char(c) => self.replacement.push(c),
            SearchCommand::Backspace | SearchCommand::Delete => {
                if self.replacement.pop().is_none() {
                    self.engine.bell();
                }
            }
            SearchCommand::Commit => return self.start_replacing(),
            SearchCommand::Cancel | SearchCommand::Quit => return Ok(self.abort()),
            _ => {}
        }
        Ok(Step::Continue)
    }

    fn start_replacing(&mut self) -> Result<Step, SearchError> {
        let regex = self.engine.is_regex();
        let pattern = if regex {
            self.engine.regex_text()
        } else {
            self.engine.text()
        };
        let mut job = ReplaceJob {
            pattern: pattern.to_string(),
            regex,
            case_sensitive: self.engine.case_sensitive(),
            whole_word: self.options.engine.whole_word,
            template: ReplacementTemplate::parse(&self.replacement, regex),
            preserve_case: self.options.preserve_case,
            region_limit: self.region_limit,
            count: 0,
            matched: false,
            empty_match: false,
        };
        let found = job.find_from(&mut *self.host, self.start_offset)?;
        self.stage = ReplaceStage::Replacing;
        self.job = Some(job);
        if self.options.mode == ReplaceMode::All {
            self.with_job(|job, host| job.replace_remaining(host, found))?;
            return Ok(self.finish(None));
        }
        if !found {
            return Ok(self.finish(None));
        }
        Ok(Step::Continue)
    }

    fn answer(&mut self, command: SearchCommand) -> Result<Step, SearchError> {
        let answer = match parse_answer(command) {
            Ok(answer) => answer,
            Err(Some(AnswerParseError::Unknown(c))) => return Ok(self.finish(Some(c))),
            Err(None) => {
                return Ok(match command {
                    SearchCommand::Cancel | SearchCommand::Quit => self.finish(None),
                    _ => Step::Continue,
                });
            }
        };
        trace!(target: "search.replace", ?answer, paused = self.paused, "answer");
        if self.paused {
            self.paused = false;
            match answer {
                ReplaceAnswer::Quit => return Ok(self.finish(None)),
                ReplaceAnswer::Skip => return self.advance(),
                _ => {
                    if !self.with_job(|job, host| job.find_next(host))? {
                        return Ok(self.finish(None));
                    }
                }
            }
        }
        match answer {
            ReplaceAnswer::Replace => {
                self.with_job(|job, host| job.replace_current(host))?;
                self.advance()
            }
            ReplaceAnswer::Skip => self.advance(),
            ReplaceAnswer::ReplaceAndExit => {
                self.with_job(|job, host| job.replace_current(host))?;
                Ok(self.finish(None))
            }
            ReplaceAnswer::ReplaceAndPause => {
                self.with_job(|job, host| job.replace_current(host))?;
                self.paused = true;
                Ok(Step::Continue)
            }
            ReplaceAnswer::ReplaceAll => {
                self.with_job(|job, host| job.replace_remaining(host, true))?;
                Ok(self.finish(None))
            }
            ReplaceAnswer::Quit => Ok(self.finish(None)),
        }
    }

    /// Move to the next match, finishing when there is none.
    fn advance(&mut self) -> Result<Step, SearchError> {
        if self.with_job(|job, host| job.find_next(host))? {
            Ok(Step::Continue)
        } else {
            Ok(self.finish(None))
        }
    }

    fn with_job<R>(
        &mut self,
        f: impl FnOnce(&mut ReplaceJob, &mut H) -> Result<R, TargetError>,
    ) -> Result<R, SearchError> {
        let Some(job) = self.job.as_mut() else {
            return Err(SearchError::EmptyInput);
        };
        Ok(f(job, &mut *self.host)?)
    }

    fn finish(&mut self, reinject: Option<char>) -> Step {
        let (count, matched) = self
            .job
            .as_ref()
            .map_or((0, false), |job| (job.count, job.matched));
        let cursor = if matched {
            let end = self.host.selection().end();
            self.host.set_caret(end);
            end
        } else {
            self.host.set_caret(self.start_offset);
            self.start_offset
        };
        self.host.push_mark(self.start_offset);
        let status = format!(
            "{count} replacement{} made",
            if count == 1 { "" } else { "s" }
        );
        debug!(target: "search.replace", count, cursor, ?reinject, "replace_finished");
        Step::Finished(SessionResult {
            reinject,
            ..SessionResult::new(cursor, Outcome::Replaced(count), status)
        })
    }

    fn abort(&mut self) -> Step {
        self.host.set_caret(self.start_offset);
        debug!(target: "search.replace", stage = ?self.stage, "session_cancel");
        Step::Finished(SessionResult::new(self.start_offset, Outcome::Aborted, ""))
    }
}
