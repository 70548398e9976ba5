//! The incremental search engine shared by both controllers.
//!
//! `SearchEngine` accumulates the search string one key at a time and drives
//! the match primitive of a [`BufferSearchTarget`]. Before every mutating key
//! it checkpoints its state on a [`StateStack`], so backspace undoes exactly
//! one key, including any match, failure or wrap that key caused.
//!
//! Scan start for `find_next`:
//! - while typing: the current match start when found, otherwise the offset
//!   the current search started from;
//! - on a repeat after a match: past the match in the search direction;
//! - on a repeat after a failure: the buffer edge (a wrap). A wrapped search
//!   that fails as well exhausts the search and later repeats do nothing.
//!
//! A failing search rings the bell once, on the transition into failing.
//! While an in-progress regex does not compile no search runs at all.
//! Signals are queued for the caller (`take_signals`), never emitted here.

use core_config::SearchConfig;
use core_ring::Rotation;
use core_text::{FindSpec, Matcher, grapheme};
use tracing::trace;

use crate::error::SearchError;
use crate::history::{HistoryFlavor, HistoryRegistry};
use crate::policy::{CasePolicy, PatternPolicy};
use crate::state::{Direction, SearchState, StateStack, WrapState};
use crate::target::{BufferSearchTarget, FindRequest, TargetError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub case_fold: bool,
    pub wrap: bool,
    pub whole_word: bool,
    /// Search on every key. Query replace collects its pattern without searching.
    pub live: bool,
}

impl EngineOptions {
    pub fn from_config(cfg: &SearchConfig) -> Self {
        Self {
            case_fold: cfg.case_fold(),
            wrap: cfg.wrap(),
            whole_word: cfg.whole_word(),
            live: true,
        }
    }

    pub fn live(mut self, yes: bool) -> Self {
        self.live = yes;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from_config(&SearchConfig::defaults())
    }
}

/// Feedback the caller should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Bell,
}

/// Where the current search string came from. Consumed by every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputOrigin {
    #[default]
    Editing,
    HistoryRecalled,
}

#[derive(Debug)]
pub struct SearchEngine {
    text: String,
    /// Regex form of `text`: quoted in literal mode, verbatim in regex mode.
    regex_text: String,
    direction: Direction,
    found: bool,
    failing: bool,
    wrap: WrapState,
    start_offset: usize,
    search_offset: usize,
    case: CasePolicy,
    pattern: PatternPolicy,
    pattern_valid: bool,
    stack: StateStack,
    options: EngineOptions,
    origin: InputOrigin,
    matched: bool,
    signals: Vec<Signal>,
}

impl SearchEngine {
    pub fn new(options: EngineOptions, direction: Direction, regex: bool, start_offset: usize) -> Self {
        Self {
            text: String::new(),
            regex_text: String::new(),
            direction,
            found: false,
            failing: false,
            wrap: WrapState::Unwrapped,
            start_offset,
            search_offset: start_offset,
            case: CasePolicy::new(options.case_fold),
            pattern: PatternPolicy::from_regex_flag(regex),
            pattern_valid: true,
            stack: StateStack::new(),
            options,
            origin: InputOrigin::Editing,
            matched: false,
            signals: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn regex_text(&self) -> &str {
        &self.regex_text
    }
    pub fn direction(&self) -> Direction {
        self.direction
    }
    pub fn is_found(&self) -> bool {
        self.found
    }
    pub fn is_failing(&self) -> bool {
        self.failing
    }
    pub fn wrap_state(&self) -> WrapState {
        self.wrap
    }
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }
    pub fn search_offset(&self) -> usize {
        self.search_offset
    }
    pub fn is_regex(&self) -> bool {
        self.pattern.is_regex()
    }
    pub fn pattern_valid(&self) -> bool {
        self.pattern_valid
    }
    pub fn case_policy(&self) -> CasePolicy {
        self.case
    }
    pub fn case_sensitive(&self) -> bool {
        self.case.is_sensitive()
    }
    pub fn options(&self) -> EngineOptions {
        self.options
    }
    pub fn origin(&self) -> InputOrigin {
        self.origin
    }
    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }
    /// Whether any search in this session has matched.
    pub fn has_matched(&self) -> bool {
        self.matched
    }
    pub fn flavor(&self) -> HistoryFlavor {
        HistoryFlavor::from_regex_flag(self.pattern.is_regex())
    }

    pub fn take_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    pub fn bell(&mut self) {
        trace!(target: "search.engine", text = self.text.as_str(), "bell");
        self.signals.push(Signal::Bell);
    }

    /// Compile error of the current pattern, if it is an invalid regex.
    pub fn pattern_error(&self) -> Option<SearchError> {
        if !self.pattern.is_regex() {
            return None;
        }
        Matcher::validate(&FindSpec::regex(&self.text))
            .err()
            .map(SearchError::from)
    }

    /// Arm (or clear) the wrap marker at the current checkpoint depth.
    pub fn wrap(&mut self, armed: bool) {
        self.wrap = if armed {
            WrapState::Armed {
                depth: self.stack.depth(),
            }
        } else {
            WrapState::Unwrapped
        };
    }

    /// Prompt line describing the session, e.g. `Failing I-search backward: foo`.
    pub fn prompt(&self) -> String {
        let mut prefix = String::new();
        if self.failing {
            prefix.push_str("failing ");
        }
        if self.wrap == WrapState::Exhausted {
            prefix.push_str("wrapped ");
        }
        if self.pattern.is_regex() {
            prefix.push_str("regexp ");
        }
        prefix.push_str("I-search");
        if !self.direction.is_forward() {
            prefix.push_str(" backward");
        }
        let mut chars = prefix.chars();
        let mut prompt: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        prompt.push_str(": ");
        prompt.push_str(&self.text);
        if !self.pattern_valid {
            prompt.push_str(" [incomplete input]");
        }
        prompt
    }

    pub fn add_character<T>(&mut self, target: &mut T, c: char) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.take_origin();
        self.checkpoint(target);
        self.case.note_typed(c, self.text.len());
        self.text.push(c);
        self.pattern.push_mirrored(&mut self.regex_text, c);
        self.revalidate();
        trace!(target: "search.engine", ch = %c, text = self.text.as_str(), valid = self.pattern_valid, "add_character");
        self.search_after_edit(target)
    }

    /// Undo the last key. `false` when there is nothing left to undo.
    pub fn backspace<T>(&mut self, target: &mut T) -> bool
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.take_origin();
        let Some(state) = self.stack.pop() else {
            return false;
        };
        self.restore(target, state);
        trace!(target: "search.engine", text = self.text.as_str(), found = self.found, "backspace");
        true
    }

    pub fn delete<T>(&mut self, target: &mut T) -> bool
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.backspace(target)
    }

    /// Roll back to the last state that had a match. Returns `false` when
    /// the search currently matches or nothing could be rolled back.
    pub fn cancel<T>(&mut self, target: &mut T) -> bool
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.take_origin();
        if self.found {
            return false;
        }
        let mut rolled_back = false;
        while let Some(state) = self.stack.pop() {
            rolled_back = true;
            let found = state.found;
            self.restore(target, state);
            if found {
                break;
            }
        }
        trace!(target: "search.engine", rolled_back, text = self.text.as_str(), "cancel");
        rolled_back
    }

    pub fn toggle_case<T>(&mut self, target: &mut T) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.take_origin();
        self.checkpoint(target);
        self.case.toggle();
        trace!(target: "search.engine", sensitive = self.case.is_sensitive(), "toggle_case");
        self.search_after_edit(target)
    }

    /// Switch between literal and regex matching, keeping the typed text.
    pub fn toggle_regex<T>(&mut self, target: &mut T) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.take_origin();
        self.checkpoint(target);
        self.pattern = PatternPolicy::from_regex_flag(!self.pattern.is_regex());
        self.regex_text = self.pattern.mirror(&self.text);
        self.revalidate();
        trace!(target: "search.engine", regex = self.pattern.is_regex(), valid = self.pattern_valid, "toggle_regex");
        self.search_after_edit(target)
    }

    /// Flip the direction. A current match stays selected and the caret
    /// moves to its far end so the next repeat continues past it.
    pub fn reverse<T>(&mut self, target: &mut T) -> bool
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.take_origin();
        self.checkpoint(target);
        self.direction = self.direction.reversed();
        if self.found {
            let sel = target.selection();
            let caret = if self.direction.is_forward() {
                sel.end()
            } else {
                sel.offset
            };
            target.select(sel, caret);
            self.search_offset = caret;
        } else {
            self.wrap = WrapState::Unwrapped;
            self.failing = false;
            self.search_offset = target.caret();
        }
        trace!(target: "search.engine", direction = ?self.direction, found = self.found, "reverse");
        self.found
    }

    /// Append the rest of the word after the match (or caret).
    pub fn yank_word<T>(&mut self, target: &mut T) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.yank_with(target, grapheme::word_end)
    }

    /// Append the rest of the line after the match (or caret).
    pub fn yank_line<T>(&mut self, target: &mut T) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.yank_with(target, grapheme::line_end)
    }

    /// Replace the search string with a history entry. The first recall after
    /// editing takes the entry under the yank pointer; consecutive recalls
    /// keep walking in the same direction.
    pub fn recall_history<T>(
        &mut self,
        target: &mut T,
        history: &mut HistoryRegistry,
        rotation: Rotation,
    ) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        let origin = self.take_origin();
        let ring = history.ring_mut(self.flavor());
        let entry = match (origin, rotation) {
            (_, Rotation::Newer) => match ring.rotate_yank_pos(Rotation::Newer) {
                Ok(_) => ring.yank().cloned(),
                Err(_) => None,
            },
            (InputOrigin::Editing, Rotation::Older) => ring.yank().cloned(),
            (InputOrigin::HistoryRecalled, Rotation::Older) => ring.yank_pop().cloned(),
        };
        let Some(entry) = entry else {
            self.bell();
            return Ok(false);
        };
        trace!(target: "search.engine", ?origin, ?rotation, entry = entry.as_str(), "recall_history");
        let found = self.replace_text(target, entry);
        self.origin = InputOrigin::HistoryRecalled;
        found
    }

    /// Start over with `text` as if it had been typed in one key.
    pub fn seed<T>(&mut self, target: &mut T, text: &str) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.take_origin();
        self.replace_text(target, text.to_string())
    }

    /// Search again for the current string (`C-s` / `C-r` with text present).
    pub fn repeat<T>(&mut self, target: &mut T) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.take_origin();
        self.checkpoint(target);
        self.find_next(target, false)
    }

    pub fn find_next<T>(&mut self, target: &mut T, incremental: bool) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        if self.text.is_empty() {
            return Ok(false);
        }
        if !self.pattern_valid {
            trace!(target: "search.engine", text = self.text.as_str(), "skip_invalid_pattern");
            return Ok(false);
        }
        let forward = self.direction.is_forward();
        let mut wrapping = false;
        let start = if incremental {
            Some(if self.found {
                target.selection().offset
            } else {
                self.search_offset
            })
        } else if self.found {
            let sel = target.selection();
            match (forward, sel.is_empty()) {
                (true, false) => Some(sel.end()),
                (true, true) => {
                    let contents = target.contents();
                    (sel.offset < contents.len())
                        .then(|| grapheme::next_boundary(&contents, sel.offset))
                }
                (false, _) => (sel.offset > 0)
                    .then(|| grapheme::prev_boundary(&target.contents(), sel.offset)),
            }
        } else {
            match self.wrap {
                WrapState::Exhausted => return Ok(false),
                WrapState::Armed { .. } if !self.options.wrap => return Ok(false),
                WrapState::Armed { .. } => {
                    wrapping = true;
                    Some(if forward { 0 } else { target.text_len() })
                }
                WrapState::Unwrapped => Some(self.search_offset),
            }
        };
        let Some(start) = start else {
            return Ok(self.fail(wrapping));
        };
        if !incremental {
            self.search_offset = start;
        }
        let pattern = if self.pattern.is_regex() {
            self.regex_text.as_str()
        } else {
            self.text.as_str()
        };
        let req = FindRequest {
            start,
            pattern,
            forward,
            case_sensitive: self.case.is_sensitive(),
            whole_word: self.options.whole_word,
            regex: self.pattern.is_regex(),
        };
        match target.find_and_select(&req) {
            Ok(Some(offset)) => {
                self.found = true;
                self.failing = false;
                self.wrap = WrapState::Unwrapped;
                self.matched = true;
                trace!(target: "search.engine", start, offset, incremental, wrapping, "match");
                Ok(true)
            }
            Ok(None) => Ok(self.fail(wrapping)),
            Err(TargetError::InvalidPattern(message)) => {
                trace!(target: "search.engine", message = message.as_str(), "pattern_rejected");
                self.found = false;
                Ok(false)
            }
            Err(TargetError::Disposed | TargetError::StaleMatch) => Err(SearchError::TargetDisposed),
        }
    }

    fn fail(&mut self, wrapping: bool) -> bool {
        self.found = false;
        if !self.failing {
            self.failing = true;
            self.bell();
        }
        self.wrap = match self.wrap {
            _ if wrapping => WrapState::Exhausted,
            WrapState::Unwrapped => WrapState::Armed {
                depth: self.stack.depth(),
            },
            other => other,
        };
        trace!(target: "search.engine", text = self.text.as_str(), wrap = ?self.wrap, "no_match");
        false
    }

    fn yank_with<T>(&mut self, target: &mut T, end_of: fn(&str, usize) -> usize) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.take_origin();
        let contents = target.contents();
        let from = if self.found {
            target.selection().end()
        } else {
            target.caret()
        };
        let from = from.min(contents.len());
        let end = end_of(&contents, from);
        let Some(piece) = contents.get(from..end).filter(|p| !p.is_empty()) else {
            self.bell();
            return Ok(false);
        };
        let piece = if self.pattern.is_regex() {
            regex::escape(piece)
        } else {
            piece.to_string()
        };
        self.checkpoint(target);
        let mirrored = self.pattern.mirror(&piece);
        self.text.push_str(&piece);
        self.regex_text.push_str(&mirrored);
        self.revalidate();
        trace!(target: "search.engine", yanked = piece.as_str(), "yank");
        self.search_after_edit(target)
    }

    fn replace_text<T>(&mut self, target: &mut T, text: String) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        self.checkpoint(target);
        self.regex_text = self.pattern.mirror(&text);
        self.case.infer_from(&text);
        self.text = text;
        self.revalidate();
        self.found = false;
        self.failing = false;
        self.wrap = WrapState::Unwrapped;
        self.search_after_edit(target)
    }

    fn search_after_edit<T>(&mut self, target: &mut T) -> Result<bool, SearchError>
    where
        T: BufferSearchTarget + ?Sized,
    {
        if self.options.live {
            self.find_next(target, true)
        } else {
            Ok(self.found)
        }
    }

    fn revalidate(&mut self) {
        self.pattern_valid = !self.pattern.is_regex()
            || Matcher::validate(&FindSpec::regex(&self.text)).is_ok();
    }

    fn take_origin(&mut self) -> InputOrigin {
        std::mem::take(&mut self.origin)
    }

    fn checkpoint<T>(&mut self, target: &T)
    where
        T: BufferSearchTarget + ?Sized,
    {
        let state = SearchState {
            text: Some(self.text.clone()),
            regex_text: Some(self.regex_text.clone()),
            selection: target.selection(),
            caret: target.caret(),
            search_offset: self.search_offset,
            found: self.found,
            failing: self.failing,
            direction: self.direction,
            wrap: self.wrap,
            case: self.case,
            pattern: self.pattern,
            pattern_valid: self.pattern_valid,
        };
        self.stack.push(state);
    }

    fn restore<T>(&mut self, target: &mut T, state: SearchState)
    where
        T: BufferSearchTarget + ?Sized,
    {
        if let Some(text) = state.text {
            self.text = text;
        }
        if let Some(regex_text) = state.regex_text {
            self.regex_text = regex_text;
        }
        target.select(state.selection, state.caret);
        self.search_offset = state.search_offset;
        self.found = state.found;
        self.failing = state.failing;
        self.direction = state.direction;
        self.wrap = state.wrap;
        self.case = state.case;
        self.pattern = state.pattern;
        self.pattern_valid = state.pattern_valid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_ring::RotationMode;
    use core_state::{Document, Selection};

    fn doc(content: &str) -> Document {
        Document::from_str("t", content).unwrap()
    }

    fn engine() -> SearchEngine {
        SearchEngine::new(EngineOptions::default(), Direction::Forward, false, 0)
    }

    fn type_str(e: &mut SearchEngine, d: &mut Document, s: &str) -> bool {
        let mut found = false;
        for c in s.chars() {
            found = e.add_character(d, c).unwrap();
        }
        found
    }

    #[test]
    fn typing_extends_match_in_place() {
        let mut d = doc("fob foo");
        let mut e = engine();
        assert!(type_str(&mut e, &mut d, "fo"));
        assert_eq!(d.selection(), Selection::new(0, 2));
        assert!(type_str(&mut e, &mut d, "o"));
        assert_eq!(d.selection(), Selection::new(4, 3));
        assert_eq!(e.regex_text(), "foo");
    }

    #[test]
    fn uppercase_makes_search_case_sensitive() {
        let mut d = doc("foo Foo");
        let mut e = engine();
        assert!(type_str(&mut e, &mut d, "Fo"));
        assert!(e.case_sensitive());
        assert_eq!(d.selection().offset, 4);
    }

    #[test]
    fn bell_rings_once_per_failure() {
        let mut d = doc("abc");
        let mut e = engine();
        type_str(&mut e, &mut d, "x");
        type_str(&mut e, &mut d, "yz");
        assert_eq!(e.take_signals(), vec![Signal::Bell]);
        assert!(e.is_failing());
        e.backspace(&mut d);
        e.backspace(&mut d);
        assert!(e.is_failing());
        e.backspace(&mut d);
        assert!(!e.is_failing());
        type_str(&mut e, &mut d, "q");
        assert_eq!(e.take_signals(), vec![Signal::Bell]);
    }

    #[test]
    fn invalid_regex_is_quiet_until_complete() {
        let mut d = doc("abc");
        let mut e = SearchEngine::new(EngineOptions::default(), Direction::Forward, true, 0);
        assert!(!type_str(&mut e, &mut d, "b("));
        assert!(!e.pattern_valid());
        assert!(!e.is_failing());
        assert!(e.take_signals().is_empty());
        assert!(e.prompt().ends_with("[incomplete input]"));
        assert!(matches!(e.pattern_error(), Some(SearchError::InvalidPattern { .. })));
        assert!(type_str(&mut e, &mut d, "c)"));
        assert!(e.pattern_error().is_none());
    }

    #[test]
    fn repeat_wraps_then_exhausts() {
        let mut d = doc("xx foo");
        let mut e = engine();
        e.add_character(&mut d, 'f').unwrap();
        e.add_character(&mut d, 'z').unwrap();
        assert!(!e.is_found());
        assert!(matches!(e.wrap_state(), WrapState::Armed { .. }));
        assert!(!e.repeat(&mut d).unwrap());
        assert_eq!(e.wrap_state(), WrapState::Exhausted);
        assert_eq!(e.prompt(), "Failing wrapped I-search: fz");
        assert!(!e.find_next(&mut d, false).unwrap());
        assert_eq!(e.take_signals(), vec![Signal::Bell]);
    }

    #[test]
    fn wrap_disabled_stays_failed() {
        let mut d = doc("foo bar");
        let opts = EngineOptions {
            wrap: false,
            ..EngineOptions::default()
        };
        let mut e = SearchEngine::new(opts, Direction::Forward, false, 4);
        assert!(!type_str(&mut e, &mut d, "foo"));
        assert!(!e.find_next(&mut d, false).unwrap());
        assert!(matches!(e.wrap_state(), WrapState::Armed { .. }));
    }

    #[test]
    fn backward_repeat_moves_to_earlier_match() {
        let mut d = doc("ab ab ab");
        d.set_caret(8);
        let mut e = SearchEngine::new(EngineOptions::default(), Direction::Backward, false, 8);
        assert!(type_str(&mut e, &mut d, "ab"));
        assert_eq!(d.selection().offset, 6);
        assert!(e.repeat(&mut d).unwrap());
        assert_eq!(d.selection().offset, 3);
        assert_eq!(d.caret(), 3);
        assert!(e.prompt().starts_with("I-search backward"));
    }

    #[test]
    fn reverse_keeps_match_and_moves_caret() {
        let mut d = doc("one two one");
        let mut e = engine();
        assert!(type_str(&mut e, &mut d, "two"));
        assert_eq!(d.caret(), 7);
        assert!(e.reverse(&mut d));
        assert_eq!(d.selection(), Selection::new(4, 3));
        assert_eq!(d.caret(), 4);
        assert!(e.backspace(&mut d));
        assert_eq!(e.direction(), Direction::Forward);
        assert_eq!(d.caret(), 7);
    }

    #[test]
    fn cancel_rolls_back_to_last_match() {
        let mut d = doc("foo");
        let mut e = engine();
        type_str(&mut e, &mut d, "foxx");
        assert!(e.cancel(&mut d));
        assert_eq!(e.text(), "fo");
        assert!(e.is_found());
        assert!(!e.cancel(&mut d));
    }

    #[test]
    fn toggle_case_overrides_inference() {
        let mut d = doc("foo FOO");
        let mut e = engine();
        assert!(type_str(&mut e, &mut d, "FOO"));
        assert_eq!(d.selection().offset, 4);
        e.toggle_case(&mut d).unwrap();
        assert!(!e.case_sensitive());
        assert!(e.backspace(&mut d));
        assert!(e.case_sensitive());
    }

    #[test]
    fn toggle_regex_rederives_mirror() {
        let mut d = doc("a.b axb");
        let mut e = engine();
        type_str(&mut e, &mut d, "a.b");
        assert_eq!(e.regex_text(), r"a\.b");
        e.toggle_regex(&mut d).unwrap();
        assert!(e.is_regex());
        assert_eq!(e.regex_text(), "a.b");
        assert_eq!(e.text(), "a.b");
        assert!(e.prompt().starts_with("Regexp I-search"));
    }

    #[test]
    fn yank_word_extends_from_match_end() {
        let mut d = doc("hello world, hello wide");
        let mut e = engine();
        type_str(&mut e, &mut d, "hello w");
        assert!(e.yank_word(&mut d).unwrap());
        assert_eq!(e.text(), "hello world");
        assert!(!e.case_sensitive());
        assert!(e.yank_line(&mut d).unwrap());
        assert_eq!(e.text(), "hello world, hello wide");
        assert!(!e.yank_word(&mut d).unwrap());
        assert_eq!(e.take_signals(), vec![Signal::Bell]);
    }

    #[test]
    fn history_recall_walks_older_then_newer() {
        let mut d = doc("alpha beta gamma");
        let mut h = HistoryRegistry::new(8, RotationMode::Wrap);
        for s in ["alpha", "beta", "gamma"] {
            h.remember(HistoryFlavor::Text, s);
        }
        let mut e = engine();
        assert!(e.recall_history(&mut d, &mut h, Rotation::Older).unwrap());
        assert_eq!(e.text(), "gamma");
        assert_eq!(e.origin(), InputOrigin::HistoryRecalled);
        e.recall_history(&mut d, &mut h, Rotation::Older).unwrap();
        assert_eq!(e.text(), "beta");
        e.recall_history(&mut d, &mut h, Rotation::Newer).unwrap();
        assert_eq!(e.text(), "gamma");
        e.add_character(&mut d, 'x').unwrap();
        assert_eq!(e.origin(), InputOrigin::Editing);
    }

    #[test]
    fn recalled_uppercase_entry_turns_case_sensitivity_on() {
        let mut d = doc("foo Foo");
        let mut h = HistoryRegistry::new(4, RotationMode::Wrap);
        h.remember(HistoryFlavor::Text, "Foo");
        let mut e = engine();
        assert!(e.recall_history(&mut d, &mut h, Rotation::Older).unwrap());
        assert!(e.case_sensitive());
        assert_eq!(d.selection(), Selection::new(4, 3));
    }

    #[test]
    fn yanked_uppercase_leaves_case_folding_alone() {
        let mut d = doc("ab CD ab CD");
        let mut e = engine();
        type_str(&mut e, &mut d, "ab ");
        assert!(e.yank_word(&mut d).unwrap());
        assert_eq!(e.text(), "ab CD");
        assert!(!e.case_sensitive());
    }

    #[test]
    fn recall_from_empty_history_bells() {
        let mut d = doc("abc");
        let mut h = HistoryRegistry::new(4, RotationMode::Wrap);
        let mut e = engine();
        assert!(!e.recall_history(&mut d, &mut h, Rotation::Older).unwrap());
        assert_eq!(e.take_signals(), vec![Signal::Bell]);
        assert_eq!(e.stack_depth(), 0);
    }

    #[test]
    fn disposed_target_is_fatal() {
        let mut d = doc("abc");
        d.dispose();
        let mut e = engine();
        assert_eq!(e.add_character(&mut d, 'a'), Err(SearchError::TargetDisposed));
    }

    #[test]
    fn non_live_engine_only_collects() {
        let mut d = doc("foo");
        let mut e = SearchEngine::new(EngineOptions::default().live(false), Direction::Forward, false, 0);
        assert!(!type_str(&mut e, &mut d, "foo"));
        assert_eq!(e.text(), "foo");
        assert!(d.selection().is_empty());
    }
}
