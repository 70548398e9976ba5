//! Collaborators a search session drives.
//!
//! The engine never touches a concrete editor. It talks to a
//! [`BufferSearchTarget`] for matching and editing, to an [`UndoGroup`] to
//! bracket bulk replacement and to a [`MarkRing`] to leave a breadcrumb at
//! the position a session started from. `core_state::Document` implements
//! all three.

use core_state::{Document, EditError, Selection};
use core_text::{FindError, FindSpec};
use thiserror::Error;

use crate::error::SearchError;

/// One call of the match primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindRequest<'a> {
    pub start: usize,
    pub pattern: &'a str,
    pub forward: bool,
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub regex: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("target disposed")]
    Disposed,
    #[error("selection does not hold a match")]
    StaleMatch,
}

pub trait BufferSearchTarget {
    /// Search from `start` and select the match. `Ok(None)` is "not found",
    /// which is distinct from a match at offset 0.
    fn find_and_select(&mut self, req: &FindRequest<'_>) -> Result<Option<usize>, TargetError>;
    fn selection(&self) -> Selection;
    /// Restore a selection together with an explicit caret.
    fn select(&mut self, selection: Selection, caret: usize);
    fn caret(&self) -> usize;
    fn set_caret(&mut self, offset: usize);
    /// Replace the selection. With `regex` set, `text` is an expansion
    /// template evaluated against the selected match.
    fn replace_selection(&mut self, text: &str, regex: bool) -> Result<(), TargetError>;
    fn selection_text(&self) -> String;
    fn text_len(&self) -> usize;
    fn contents(&self) -> String;
}

/// Brackets a run of edits so the host records one undoable action.
pub trait UndoGroup {
    fn begin(&mut self);
    fn end(&mut self);
}

pub trait MarkRing {
    fn push_mark(&mut self, offset: usize);
}

/// Everything a session needs from its host.
pub trait SearchHost: BufferSearchTarget + UndoGroup + MarkRing {}

impl<T: BufferSearchTarget + UndoGroup + MarkRing> SearchHost for T {}

/// Closes the undo group it opened when dropped.
pub struct UndoGroupGuard<'a, H: UndoGroup + ?Sized> {
    host: &'a mut H,
}

impl<'a, H: UndoGroup + ?Sized> UndoGroupGuard<'a, H> {
    pub fn open(host: &'a mut H) -> Self {
        host.begin();
        Self { host }
    }

    pub fn host(&mut self) -> &mut H {
        &mut *self.host
    }
}

impl<H: UndoGroup + ?Sized> Drop for UndoGroupGuard<'_, H> {
    fn drop(&mut self) {
        self.host.end();
    }
}

impl From<EditError> for TargetError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::Disposed => TargetError::Disposed,
            EditError::StaleMatch => TargetError::StaleMatch,
            EditError::Find(FindError::InvalidPattern { message, .. }) => {
                TargetError::InvalidPattern(message)
            }
        }
    }
}

impl From<TargetError> for SearchError {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::InvalidPattern(message) => SearchError::InvalidPattern {
                pattern: String::new(),
                message,
            },
            TargetError::Disposed | TargetError::StaleMatch => SearchError::TargetDisposed,
        }
    }
}

impl BufferSearchTarget for Document {
    fn find_and_select(&mut self, req: &FindRequest<'_>) -> Result<Option<usize>, TargetError> {
        let spec = FindSpec {
            pattern: req.pattern,
            regex: req.regex,
            case_sensitive: req.case_sensitive,
            whole_word: req.whole_word,
        };
        Ok(Document::find_and_select(self, req.start, &spec, req.forward)?)
    }

    fn selection(&self) -> Selection {
        Document::selection(self)
    }

    fn select(&mut self, selection: Selection, caret: usize) {
        Document::select(self, selection, caret)
    }

    fn caret(&self) -> usize {
        Document::caret(self)
    }

    fn set_caret(&mut self, offset: usize) {
        Document::set_caret(self, offset)
    }

    fn replace_selection(&mut self, text: &str, regex: bool) -> Result<(), TargetError> {
        Ok(Document::replace_selection(self, text, regex)?)
    }

    fn selection_text(&self) -> String {
        Document::selection_text(self)
    }

    fn text_len(&self) -> usize {
        self.len_bytes()
    }

    fn contents(&self) -> String {
        self.text()
    }
}

impl UndoGroup for Document {
    fn begin(&mut self) {
        self.begin_undo_group();
    }

    fn end(&mut self) {
        self.end_undo_group();
    }
}

impl MarkRing for Document {
    fn push_mark(&mut self, offset: usize) {
        Document::push_mark(self, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::GroupState;

    #[test]
    fn guard_closes_group_on_drop() {
        let mut doc = Document::from_str("t", "abc").unwrap();
        {
            let mut guard = UndoGroupGuard::open(&mut doc);
            assert!(matches!(guard.host().undo_group(), GroupState::Active { depth: 1, .. }));
        }
        assert_eq!(doc.undo_group(), GroupState::Inactive);
    }

    #[test]
    fn document_errors_map_to_target_errors() {
        let mut doc = Document::from_str("t", "abc").unwrap();
        let req = FindRequest {
            start: 0,
            pattern: "a(",
            forward: true,
            case_sensitive: false,
            whole_word: false,
            regex: true,
        };
        assert!(matches!(
            BufferSearchTarget::find_and_select(&mut doc, &req),
            Err(TargetError::InvalidPattern(_))
        ));
        doc.dispose();
        assert!(doc.is_disposed());
        assert_eq!(
            BufferSearchTarget::find_and_select(&mut doc, &FindRequest { regex: false, ..req }),
            Err(TargetError::Disposed)
        );
    }
}
