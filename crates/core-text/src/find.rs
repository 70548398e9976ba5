//! Literal and regex matching over a flat text view.
//!
//! Both flavors compile down to one `regex::Regex`: literal patterns are
//! escaped first, whole-word matching wraps the pattern in `\b` anchors and
//! case folding is a builder flag. Forward search returns the first match
//! starting at or after the start offset; backward search returns the last
//! match starting at or before it. Matches may overlap the start offset in
//! the backward case, which keeps a growing backward search anchored on its
//! current match.

use regex::{Regex, RegexBuilder};
use std::ops::Range;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FindError {
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// What to look for and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindSpec<'a> {
    pub pattern: &'a str,
    pub regex: bool,
    pub case_sensitive: bool,
    pub whole_word: bool,
}

impl<'a> FindSpec<'a> {
    pub fn literal(pattern: &'a str) -> Self {
        Self {
            pattern,
            regex: false,
            case_sensitive: false,
            whole_word: false,
        }
    }

    pub fn regex(pattern: &'a str) -> Self {
        Self {
            regex: true,
            ..Self::literal(pattern)
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn whole_word(mut self, yes: bool) -> Self {
        self.whole_word = yes;
        self
    }
}

/// A compiled search pattern.
#[derive(Debug, Clone)]
pub struct Matcher {
    re: Regex,
}

impl Matcher {
    pub fn compile(spec: &FindSpec<'_>) -> Result<Self, FindError> {
        let body = if spec.regex {
            spec.pattern.to_string()
        } else {
            regex::escape(spec.pattern)
        };
        let source = if spec.whole_word {
            format!(r"\b(?:{body})\b")
        } else {
            body
        };
        let re = RegexBuilder::new(&source)
            .case_insensitive(!spec.case_sensitive)
            .multi_line(true)
            .build()
            .map_err(|e| FindError::InvalidPattern {
                pattern: spec.pattern.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { re })
    }

    /// Check a pattern for syntax errors without keeping the compiled form.
    pub fn validate(spec: &FindSpec<'_>) -> Result<(), FindError> {
        Self::compile(spec).map(|_| ())
    }

    /// First match starting at or after `start`.
    pub fn find_forward(&self, haystack: &str, start: usize) -> Option<Range<usize>> {
        if start > haystack.len() {
            return None;
        }
        let start = floor_char_boundary(haystack, start);
        let found = self.re.find_at(haystack, start).map(|m| m.range());
        trace!(target: "text.find", start, ?found, "find_forward");
        found
    }

    /// Last match starting at or before `start`.
    pub fn find_backward(&self, haystack: &str, start: usize) -> Option<Range<usize>> {
        let start = floor_char_boundary(haystack, start.min(haystack.len()));
        let mut best = None;
        let mut pos = 0;
        while pos <= start {
            match self.re.find_at(haystack, pos) {
                Some(m) if m.start() <= start => {
                    best = Some(m.range());
                    if m.start() >= haystack.len() {
                        break;
                    }
                    pos = next_char_boundary(haystack, m.start());
                }
                _ => break,
            }
        }
        trace!(target: "text.find", start, found = ?best, "find_backward");
        best
    }

    /// Expand a replacement template (`$0`, `${1}`, `$$`) against the match
    /// of this pattern that starts exactly at `at`.
    pub fn expand_at(&self, haystack: &str, at: usize, template: &str) -> Option<String> {
        if at > haystack.len() || !haystack.is_char_boundary(at) {
            return None;
        }
        let caps = self.re.captures_at(haystack, at)?;
        let whole = caps.get(0)?;
        if whole.start() != at {
            return None;
        }
        let mut out = String::new();
        caps.expand(template, &mut out);
        Some(out)
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn next_char_boundary(s: &str, idx: usize) -> usize {
    let mut next = idx + 1;
    while next < s.len() && !s.is_char_boundary(next) {
        next += 1;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_is_escaped_and_folded() {
        let m = Matcher::compile(&FindSpec::literal("a.b")).unwrap();
        assert_eq!(m.find_forward("axb A.B", 0), Some(4..7));
    }

    #[test]
    fn case_sensitive_skips_other_case() {
        let m = Matcher::compile(&FindSpec::literal("Foo").case_sensitive(true)).unwrap();
        assert_eq!(m.find_forward("foo FOO Foo", 0), Some(8..11));
    }

    #[test]
    fn backward_finds_last_start_at_or_before() {
        let m = Matcher::compile(&FindSpec::literal("foo")).unwrap();
        let hay = "foo bar foo baz";
        assert_eq!(m.find_backward(hay, 15), Some(8..11));
        assert_eq!(m.find_backward(hay, 8), Some(8..11));
        assert_eq!(m.find_backward(hay, 7), Some(0..3));
        assert_eq!(Matcher::compile(&FindSpec::literal("baz")).unwrap().find_backward(hay, 3), None);
    }

    #[test]
    fn backward_sees_overlapping_matches() {
        let m = Matcher::compile(&FindSpec::literal("aa")).unwrap();
        assert_eq!(m.find_backward("aaa", 1), Some(1..3));
    }

    #[test]
    fn whole_word_requires_boundaries() {
        let m = Matcher::compile(&FindSpec::literal("foo").whole_word(true)).unwrap();
        assert_eq!(m.find_forward("food foo", 0), Some(5..8));
    }

    #[test]
    fn invalid_regex_reports_pattern() {
        let err = Matcher::compile(&FindSpec::regex("fo(")).unwrap_err();
        assert!(matches!(err, FindError::InvalidPattern { ref pattern, .. } if pattern == "fo("));
    }

    #[test]
    fn expand_uses_groups() {
        let m = Matcher::compile(&FindSpec::regex(r"(\w+)@(\w+)")).unwrap();
        let hay = "mail bob@host now";
        assert_eq!(m.expand_at(hay, 5, "${2}:${1}").as_deref(), Some("host:bob"));
        assert_eq!(m.expand_at(hay, 4, "$0"), None);
    }
}
