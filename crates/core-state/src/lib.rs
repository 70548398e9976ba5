//! Document state: buffer, selection, caret, mark ring and undo engine.
//!
//! `Document` is the concrete host the search engine drives. It owns the
//! text, remembers the last pattern it matched (so a regex replacement can
//! expand group references against the selected match) and records every
//! edit in the snapshot `UndoEngine`.
//!
//! Undo grouping:
//! - `begin_undo_group` / `end_undo_group` nest; only the outermost pair
//!   captures a snapshot, so any number of edits inside undo as one step.
//! - Edits outside a group each capture their own snapshot.
//!
//! Disposal: once `dispose` is called the document refuses further finds
//! and edits with `EditError::Disposed`. Sessions observing this tear down.

use core_ring::{RingBuffer, RingValue};
use core_text::{Buffer, FindError, FindSpec, Matcher};
use std::ops::Range;
use thiserror::Error;
use tracing::{trace, warn};

pub mod undo;
use undo::UndoEngine;
pub use undo::{GroupState, UNDO_HISTORY_MAX};

/// Capacity of the per-document mark ring.
pub const MARK_RING_MAX: usize = 16;

/// Selected range as (offset, length) in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub offset: usize,
    pub length: usize,
}

impl Selection {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }
    pub fn caret(offset: usize) -> Self {
        Self { offset, length: 0 }
    }
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// A remembered caret position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(pub usize);

impl RingValue for Mark {
    fn is_empty_value(&self) -> bool {
        false
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("document has been disposed")]
    Disposed,
    #[error("selection no longer holds a match of the last pattern")]
    StaleMatch,
    #[error(transparent)]
    Find(#[from] FindError),
}

/// Owned copy of the last pattern handed to `find`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LastFind {
    pattern: String,
    regex: bool,
    case_sensitive: bool,
    whole_word: bool,
}

impl LastFind {
    fn spec(&self) -> FindSpec<'_> {
        FindSpec {
            pattern: &self.pattern,
            regex: self.regex,
            case_sensitive: self.case_sensitive,
            whole_word: self.whole_word,
        }
    }
}

pub struct Document {
    buffer: Buffer,
    selection: Selection,
    caret: usize,
    undo: UndoEngine,
    marks: RingBuffer<Mark>,
    last_find: Option<LastFind>,
    disposed: bool,
}

impl Document {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            buffer,
            selection: Selection::default(),
            caret: 0,
            undo: UndoEngine::new(),
            marks: RingBuffer::new(MARK_RING_MAX),
            last_find: None,
            disposed: false,
        }
    }

    pub fn from_str(name: &str, content: &str) -> anyhow::Result<Self> {
        Ok(Self::new(Buffer::from_str(name, content)?))
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
    pub fn text(&self) -> String {
        self.buffer.text()
    }
    pub fn len_bytes(&self) -> usize {
        self.buffer.len_bytes()
    }
    pub fn selection(&self) -> Selection {
        self.selection
    }
    pub fn caret(&self) -> usize {
        self.caret
    }
    pub fn undo_depth(&self) -> usize {
        self.undo.undo_depth()
    }
    pub fn undo_group(&self) -> GroupState {
        self.undo.group()
    }
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Select `[offset, offset+length)` (clamped) and put the caret at its end.
    pub fn set_selection(&mut self, selection: Selection) {
        let start = self.buffer.clamp_offset(selection.offset);
        let end = self.buffer.clamp_offset(selection.end()).max(start);
        self.selection = Selection::new(start, end - start);
        self.caret = end;
    }

    /// Collapse the selection onto `offset` (clamped).
    pub fn set_caret(&mut self, offset: usize) {
        let at = self.buffer.clamp_offset(offset);
        self.selection = Selection::caret(at);
        self.caret = at;
    }

    /// Restore a selection and caret exactly (both clamped).
    pub fn select(&mut self, selection: Selection, caret: usize) {
        let start = self.buffer.clamp_offset(selection.offset);
        let end = self.buffer.clamp_offset(selection.end()).max(start);
        self.selection = Selection::new(start, end - start);
        self.caret = self.buffer.clamp_offset(caret);
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        self.buffer.slice_bytes(start, end)
    }

    pub fn selection_text(&self) -> String {
        self.buffer
            .slice_bytes(self.selection.offset, self.selection.end())
    }

    /// Search from `start` and select the match. The caret lands at the match
    /// end for forward searches and at its start for backward searches.
    pub fn find_and_select(
        &mut self,
        start: usize,
        spec: &FindSpec<'_>,
        forward: bool,
    ) -> Result<Option<usize>, EditError> {
        if self.disposed {
            return Err(EditError::Disposed);
        }
        let matcher = Matcher::compile(spec)?;
        self.last_find = Some(LastFind {
            pattern: spec.pattern.to_string(),
            regex: spec.regex,
            case_sensitive: spec.case_sensitive,
            whole_word: spec.whole_word,
        });
        let text = self.buffer.text();
        let found = if forward {
            matcher.find_forward(&text, start)
        } else {
            matcher.find_backward(&text, start)
        };
        let Some(range) = found else {
            return Ok(None);
        };
        self.selection = Selection::new(range.start, range.len());
        self.caret = if forward { range.end } else { range.start };
        trace!(target: "state.find", offset = range.start, length = range.len(), forward, "match_selected");
        Ok(Some(range.start))
    }

    /// Replace the selection with `text`, selecting the inserted text.
    ///
    /// With `expand` set, `text` is a template (`$0`, `${1}`, `$$`) expanded
    /// against the last pattern's match at the selection start.
    pub fn replace_selection(&mut self, text: &str, expand: bool) -> Result<(), EditError> {
        if self.disposed {
            return Err(EditError::Disposed);
        }
        let replacement = if expand {
            let last = self.last_find.as_ref().ok_or(EditError::StaleMatch)?;
            let matcher = Matcher::compile(&last.spec())?;
            let content = self.buffer.text();
            matcher
                .expand_at(&content, self.selection.offset, text)
                .ok_or(EditError::StaleMatch)?
        } else {
            text.to_string()
        };
        self.undo
            .before_edit(&self.buffer, self.selection, self.caret);
        let (start, end) = self.buffer.replace_bytes(
            self.selection.offset,
            self.selection.end(),
            &replacement,
        );
        self.selection = Selection::new(start, end - start);
        self.caret = end;
        trace!(target: "state.edit", offset = start, inserted = end - start, "replace_selection");
        Ok(())
    }

    pub fn begin_undo_group(&mut self) {
        self.undo
            .begin_group(&self.buffer, self.selection, self.caret);
    }

    pub fn end_undo_group(&mut self) {
        self.undo.end_group();
    }

    pub fn undo(&mut self) -> bool {
        self.undo
            .undo(&mut self.buffer, &mut self.selection, &mut self.caret)
    }

    pub fn redo(&mut self) -> bool {
        self.undo
            .redo(&mut self.buffer, &mut self.selection, &mut self.caret)
    }

    /// Remember `offset` on the mark ring.
    pub fn push_mark(&mut self, offset: usize) {
        let mark = Mark(self.buffer.clamp_offset(offset));
        if self.marks.current() == Some(&mark) {
            return;
        }
        if let Err(err) = self.marks.put_next(mark) {
            trace!(target: "state.marks", offset, %err, "push_mark_rejected");
        }
    }

    /// Marks from newest to oldest.
    pub fn marks(&self) -> Vec<usize> {
        self.marks.iter().map(|m| m.0).collect()
    }

    /// Tear the document down; any open session must stop using it.
    pub fn dispose(&mut self) {
        warn!(target: "state", name = self.buffer.name.as_str(), "document_disposed");
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> Document {
        Document::from_str("t", content).unwrap()
    }

    #[test]
    fn find_selects_match_and_places_caret() {
        let mut d = doc("foo bar foo");
        let at = d.find_and_select(1, &FindSpec::literal("foo"), true).unwrap();
        assert_eq!(at, Some(8));
        assert_eq!(d.selection(), Selection::new(8, 3));
        assert_eq!(d.caret(), 11);
        let back = d.find_and_select(7, &FindSpec::literal("foo"), false).unwrap();
        assert_eq!(back, Some(0));
        assert_eq!(d.caret(), 0);
    }

    #[test]
    fn not_found_keeps_selection() {
        let mut d = doc("foo");
        d.set_selection(Selection::new(0, 3));
        assert_eq!(d.find_and_select(0, &FindSpec::literal("zzz"), true).unwrap(), None);
        assert_eq!(d.selection(), Selection::new(0, 3));
    }

    #[test]
    fn replace_selection_is_one_undo_step() {
        let mut d = doc("foo bar");
        d.find_and_select(0, &FindSpec::literal("bar"), true).unwrap();
        d.replace_selection("quux", false).unwrap();
        assert_eq!(d.text(), "foo quux");
        assert_eq!(d.selection(), Selection::new(4, 4));
        assert!(d.undo());
        assert_eq!(d.text(), "foo bar");
        assert_eq!(d.selection(), Selection::new(4, 3));
        assert!(d.redo());
        assert_eq!(d.text(), "foo quux");
    }

    #[test]
    fn grouped_edits_undo_together() {
        let mut d = doc("a a a");
        d.begin_undo_group();
        d.begin_undo_group();
        for start in [0, 2, 4] {
            d.find_and_select(start, &FindSpec::literal("a"), true).unwrap();
            d.replace_selection("b", false).unwrap();
        }
        d.end_undo_group();
        assert!(matches!(d.undo_group(), GroupState::Active { depth: 1, edits: 3 }));
        d.end_undo_group();
        assert_eq!(d.undo_group(), GroupState::Inactive);
        assert_eq!(d.text(), "b b b");
        assert_eq!(d.undo_depth(), 1);
        d.undo();
        assert_eq!(d.text(), "a a a");
    }

    #[test]
    fn expanded_replacement_uses_last_pattern_groups() {
        let mut d = doc("key=value");
        d.find_and_select(0, &FindSpec::regex(r"(\w+)=(\w+)"), true)
            .unwrap();
        d.replace_selection("${2}=${1}", true).unwrap();
        assert_eq!(d.text(), "value=key");
    }

    #[test]
    fn disposed_document_refuses_work() {
        let mut d = doc("foo");
        d.dispose();
        assert_eq!(
            d.find_and_select(0, &FindSpec::literal("foo"), true),
            Err(EditError::Disposed)
        );
        assert_eq!(d.replace_selection("x", false), Err(EditError::Disposed));
    }

    #[test]
    fn mark_ring_skips_repeats() {
        let mut d = doc("hello world");
        d.push_mark(3);
        d.push_mark(3);
        d.push_mark(99);
        assert_eq!(d.marks(), vec![11, 3]);
    }

    #[test]
    fn mark_ring_keeps_every_push_up_to_capacity() {
        let mut d = doc(&"x".repeat(40));
        for offset in 0..MARK_RING_MAX + 2 {
            d.push_mark(offset);
        }
        let marks = d.marks();
        assert_eq!(marks.len(), MARK_RING_MAX);
        assert_eq!(marks[0], MARK_RING_MAX + 1);
        assert_eq!(marks[MARK_RING_MAX - 1], 2);
    }
}
