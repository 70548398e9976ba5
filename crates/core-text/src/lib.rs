//! Rope-based text buffer addressed by absolute byte offsets.
//!
//! Search and replace operate on flat byte offsets into the UTF-8 content,
//! so the buffer exposes offset-based slicing and replacement on top of the
//! rope. Offsets handed in are clamped to the content length and snapped
//! down to the nearest char boundary; callers never see a panic for an
//! out-of-range offset.

use anyhow::Result;
use ropey::Rope;

pub mod find;

pub use find::{FindError, FindSpec, Matcher};

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            rope: Rope::from_str(content),
            name: name.into(),
        })
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Return the requested line as an owned `String` (including trailing newline if present).
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx < self.rope.len_lines() {
            Some(self.rope.line(idx).to_string())
        } else {
            None
        }
    }

    /// Content length in bytes.
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    /// Whole content as one string. Matching runs over this flat view.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Clamp `offset` into the buffer and snap it down to a char boundary.
    pub fn clamp_offset(&self, offset: usize) -> usize {
        let offset = offset.min(self.rope.len_bytes());
        let char_idx = self.rope.byte_to_char(offset);
        self.rope.char_to_byte(char_idx)
    }

    /// Return the UTF-8 slice in the absolute byte range `[start,end)` (clamped).
    pub fn slice_bytes(&self, start: usize, end: usize) -> String {
        let s = self.clamp_offset(start);
        let e = self.clamp_offset(end);
        if s >= e {
            return String::new();
        }
        let start_char = self.rope.byte_to_char(s);
        let end_char = self.rope.byte_to_char(e);
        self.rope.slice(start_char..end_char).to_string()
    }

    /// Delete the UTF-8 slice in absolute byte range `[start,end)` (clamped).
    /// Returns the removed text.
    pub fn delete_bytes(&mut self, start: usize, end: usize) -> String {
        let s = self.clamp_offset(start);
        let e = self.clamp_offset(end);
        if s >= e {
            return String::new();
        }
        let start_char = self.rope.byte_to_char(s);
        let end_char = self.rope.byte_to_char(e);
        let removed = self.rope.slice(start_char..end_char).to_string();
        self.rope.remove(start_char..end_char);
        removed
    }

    /// Insert `text` at absolute byte `offset` (clamped). Returns the insert offset.
    pub fn insert_str(&mut self, offset: usize, text: &str) -> usize {
        let at = self.clamp_offset(offset);
        let char_idx = self.rope.byte_to_char(at);
        self.rope.insert(char_idx, text);
        at
    }

    /// Replace `[start,end)` with `text`; returns the byte range now holding `text`.
    pub fn replace_bytes(&mut self, start: usize, end: usize, text: &str) -> (usize, usize) {
        let s = self.clamp_offset(start);
        self.delete_bytes(s, end);
        let at = self.insert_str(s, text);
        (at, at + text.len())
    }
}

/// Grapheme utilities operating on plain string slices.
pub mod grapheme {
    use unicode_segmentation::UnicodeSegmentation;

    /// Previous grapheme boundary (returns 0 if already at or below 1st boundary).
    pub fn prev_boundary(text: &str, byte: usize) -> usize {
        if byte == 0 || byte > text.len() {
            return 0;
        }
        let mut last = 0;
        for (idx, _) in text.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            last = idx;
        }
        last
    }

    /// Next grapheme boundary (returns text.len() if at or beyond end).
    pub fn next_boundary(text: &str, byte: usize) -> usize {
        if byte >= text.len() {
            return text.len();
        }
        for (idx, _) in text.grapheme_indices(true) {
            if idx > byte {
                return idx;
            }
        }
        text.len()
    }

    /// Naive word classification: alphanumeric or underscore start.
    pub fn is_word(g: &str) -> bool {
        g.chars()
            .next()
            .map(|c| c == '_' || c.is_alphanumeric())
            .unwrap_or(false)
    }

    /// End of the next word at or after `from`: skips leading non-word
    /// clusters, then consumes word clusters.
    pub fn word_end(text: &str, from: usize) -> usize {
        let mut byte = from.min(text.len());
        while byte < text.len() {
            let nb = next_boundary(text, byte);
            if is_word(&text[byte..nb]) {
                break;
            }
            byte = nb;
        }
        while byte < text.len() {
            let nb = next_boundary(text, byte);
            if !is_word(&text[byte..nb]) {
                break;
            }
            byte = nb;
        }
        byte
    }

    /// End of the current line (exclusive of the newline). When `from` sits
    /// on the newline itself, the newline is taken so progress is made.
    pub fn line_end(text: &str, from: usize) -> usize {
        let from = from.min(text.len());
        match text[from..].find('\n') {
            Some(0) => from + 1,
            Some(rel) => from + rel,
            None => text.len(),
        }
    }
}
