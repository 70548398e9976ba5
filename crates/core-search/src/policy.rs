//! Small strategy objects shared by the search and replace controllers:
//! case-sensitivity inference, pattern escaping, case-preserving
//! replacement and replacement templates.

/// User override layered on top of case inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseOverride {
    #[default]
    Unset,
    Sensitive,
    Insensitive,
}

/// Decides whether a search is case-sensitive.
///
/// Searches fold case by default until the user types an uppercase letter;
/// an explicit toggle overrides the inference either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CasePolicy {
    fold_by_default: bool,
    /// Byte index in the search text of the first typed uppercase letter.
    toggle_pos: Option<usize>,
    overridden: CaseOverride,
}

impl CasePolicy {
    pub fn new(fold_by_default: bool) -> Self {
        Self {
            fold_by_default,
            toggle_pos: None,
            overridden: CaseOverride::Unset,
        }
    }

    pub fn toggle_pos(&self) -> Option<usize> {
        self.toggle_pos
    }
    pub fn overridden(&self) -> CaseOverride {
        self.overridden
    }

    pub fn is_sensitive(&self) -> bool {
        match self.overridden {
            CaseOverride::Sensitive => true,
            CaseOverride::Insensitive => false,
            CaseOverride::Unset => !self.fold_by_default || self.toggle_pos.is_some(),
        }
    }

    /// Note a typed character that lands at byte index `at`.
    pub fn note_typed(&mut self, c: char, at: usize) {
        if self.toggle_pos.is_none() && c.is_uppercase() {
            self.toggle_pos = Some(at);
        }
    }

    /// Re-derive the toggle position from a whole string (history recall).
    pub fn infer_from(&mut self, text: &str) {
        self.toggle_pos = text
            .char_indices()
            .find(|(_, c)| c.is_uppercase())
            .map(|(i, _)| i);
    }

    /// Flip the override. The first flip picks the opposite of the inferred value.
    pub fn toggle(&mut self) {
        self.overridden = match self.overridden {
            CaseOverride::Unset if self.is_sensitive() => CaseOverride::Insensitive,
            CaseOverride::Unset => CaseOverride::Sensitive,
            CaseOverride::Sensitive => CaseOverride::Insensitive,
            CaseOverride::Insensitive => CaseOverride::Sensitive,
        };
    }
}

/// How typed text maps onto the pattern handed to the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternPolicy {
    /// Text is matched literally; the regex mirror holds its quoted form.
    Literal,
    /// Text is a regular expression and is mirrored verbatim.
    Regex,
}

impl PatternPolicy {
    pub fn from_regex_flag(regex: bool) -> Self {
        if regex {
            PatternPolicy::Regex
        } else {
            PatternPolicy::Literal
        }
    }

    pub fn is_regex(self) -> bool {
        matches!(self, PatternPolicy::Regex)
    }

    /// Append the mirror form of `c` to `mirror`.
    pub fn push_mirrored(self, mirror: &mut String, c: char) {
        match self {
            PatternPolicy::Literal => {
                let mut buf = [0u8; 4];
                mirror.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
            PatternPolicy::Regex => mirror.push(c),
        }
    }

    /// Mirror form of a whole string.
    pub fn mirror(self, text: &str) -> String {
        match self {
            PatternPolicy::Literal => regex::escape(text),
            PatternPolicy::Regex => text.to_string(),
        }
    }
}

/// Re-case `replacement` after the shape of `matched`: all caps when every
/// letter of the match is uppercase, capitalized when only its first letter
/// is, unchanged otherwise.
pub fn case_replace(matched: &str, replacement: &str) -> String {
    let mut letters = matched.chars().filter(|c| c.is_alphabetic());
    let Some(first) = letters.next() else {
        return replacement.to_string();
    };
    let rest_upper = letters.clone().all(|c| c.is_uppercase());
    let rest_lower = letters.all(|c| !c.is_uppercase());
    if first.is_uppercase() && rest_upper {
        replacement.to_uppercase()
    } else if first.is_uppercase() && rest_lower {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}

fn capitalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut done = false;
    for c in text.chars() {
        if !done && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            done = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// A replacement string prepared for the target's replace primitive.
///
/// `\&` stands for the whole match, `\N` for group N (regex searches only)
/// and `\\` for a backslash. When any reference is present the text is
/// handed over as an expansion template (`${0}`, `${N}`, `$$`); otherwise as
/// plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementTemplate {
    pub text: String,
    pub expand: bool,
}

impl ReplacementTemplate {
    pub fn parse(raw: &str, regex: bool) -> Self {
        let mut literal = String::with_capacity(raw.len());
        let mut template = String::with_capacity(raw.len());
        let mut expand = false;
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            match (c, chars.peek().copied()) {
                ('\\', Some('&')) => {
                    chars.next();
                    expand = true;
                    literal.push('&');
                    template.push_str("${0}");
                }
                ('\\', Some(d)) if regex && d.is_ascii_digit() => {
                    chars.next();
                    expand = true;
                    literal.push(d);
                    template.push_str(&format!("${{{d}}}"));
                }
                ('\\', Some('\\')) => {
                    chars.next();
                    literal.push('\\');
                    template.push('\\');
                }
                ('$', _) => {
                    literal.push('$');
                    template.push_str("$$");
                }
                (c, _) => {
                    literal.push(c);
                    template.push(c);
                }
            }
        }
        if expand {
            Self {
                text: template,
                expand,
            }
        } else {
            Self {
                text: literal,
                expand,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_until_uppercase_typed() {
        let mut p = CasePolicy::new(true);
        assert!(!p.is_sensitive());
        p.note_typed('f', 0);
        assert!(!p.is_sensitive());
        p.note_typed('O', 1);
        assert!(p.is_sensitive());
        assert_eq!(p.toggle_pos(), Some(1));
        p.note_typed('X', 2);
        assert_eq!(p.toggle_pos(), Some(1));
    }

    #[test]
    fn no_fold_config_is_always_sensitive() {
        let p = CasePolicy::new(false);
        assert!(p.is_sensitive());
    }

    #[test]
    fn toggle_starts_opposite_of_inference() {
        let mut p = CasePolicy::new(true);
        p.toggle();
        assert_eq!(p.overridden(), CaseOverride::Sensitive);
        p.toggle();
        assert_eq!(p.overridden(), CaseOverride::Insensitive);

        let mut q = CasePolicy::new(true);
        q.note_typed('A', 0);
        q.toggle();
        assert!(!q.is_sensitive());
    }

    #[test]
    fn literal_mirror_is_quoted() {
        let mut m = String::new();
        PatternPolicy::Literal.push_mirrored(&mut m, '.');
        PatternPolicy::Literal.push_mirrored(&mut m, 'a');
        assert_eq!(m, r"\.a");
        assert_eq!(PatternPolicy::Regex.mirror("a.b"), "a.b");
    }

    #[test]
    fn case_replace_shapes() {
        assert_eq!(case_replace("FOO", "qux"), "QUX");
        assert_eq!(case_replace("Foo", "qux"), "Qux");
        assert_eq!(case_replace("foo", "qux"), "qux");
        assert_eq!(case_replace("fOo", "qux"), "qux");
        assert_eq!(case_replace("123", "qux"), "qux");
        assert_eq!(case_replace("Foo", "2nd place"), "2Nd place");
    }

    #[test]
    fn template_whole_match_and_groups() {
        let t = ReplacementTemplate::parse(r"<\&>", false);
        assert_eq!(t, ReplacementTemplate { text: "<${0}>".into(), expand: true });
        let g = ReplacementTemplate::parse(r"\2-\1 $5", true);
        assert_eq!(g.text, "${2}-${1} $$5");
        assert!(g.expand);
        let plain = ReplacementTemplate::parse(r"a\\b $x \1", false);
        assert_eq!(plain, ReplacementTemplate { text: r"a\b $x \1".into(), expand: false });
    }
}
