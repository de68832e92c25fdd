//! Text patterns for pseudo-class arguments.
//!
//! Arguments are either plain strings or JavaScript-style `/pattern/flags`
//! literals. Regexes are compiled once, when the selector is parsed.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::error::SelectorError;

static REGEX_FLAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[gimsuyd]*$").unwrap());

#[derive(Debug, Clone)]
pub enum TextPattern {
    /// Substring match.
    Contains(String),
    /// Whole-value match.
    Exact(String),
    Regex(Regex),
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Contains(a), Self::Contains(b)) | (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl TextPattern {
    /// `:has-text` argument: `/re/` or `/re/i`, otherwise a substring.
    pub fn text(argument: &str) -> Result<Self, SelectorError> {
        let pattern = strip_wrapping_quotes(argument);
        if let Some(body) = pattern.strip_prefix('/') {
            let parsed = match body.strip_suffix("/i") {
                Some(source) => Some((source, "i")),
                None => body.strip_suffix('/').map(|source| (source, "")),
            };
            if let Some((source, flags)) = parsed {
                return compile(source, flags).map(Self::Regex);
            }
        }
        Ok(Self::Contains(pattern.to_string()))
    }

    /// Exact string unless the argument is a `/re/flags` literal.
    pub fn exact_or_regex(argument: &str) -> Result<Self, SelectorError> {
        if is_regex_literal(argument) {
            parse_regex(argument).map(Self::Regex)
        } else {
            Ok(Self::Exact(argument.to_string()))
        }
    }

    /// Always a regex: `/re/flags`, or the whole argument as a pattern.
    pub fn regex(argument: &str) -> Result<Self, SelectorError> {
        parse_regex(argument).map(Self::Regex)
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Contains(needle) => text.contains(needle.as_str()),
            Self::Exact(value) => text == value,
            Self::Regex(re) => re.is_match(text),
        }
    }
}

pub fn strip_wrapping_quotes(s: &str) -> &str {
    if s.len() >= 2 && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\''))) {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// `/.../` with a closing slash after the first character.
pub fn is_regex_literal(s: &str) -> bool {
    s.starts_with('/') && s.rfind('/').is_some_and(|i| i > 0)
}

/// Compile `/pattern/flags`, or the whole string when it is not a literal.
pub fn parse_regex(s: &str) -> Result<Regex, SelectorError> {
    if !is_regex_literal(s) {
        return compile(s, "");
    }
    let last = s.rfind('/').unwrap_or(0);
    let (source, flags) = (&s[1..last], &s[last + 1..]);
    if !REGEX_FLAGS.is_match(flags) {
        return Err(SelectorError::InvalidRegexFlags(flags.to_string()));
    }
    compile(source, flags)
}

fn compile(source: &str, flags: &str) -> Result<Regex, SelectorError> {
    // `g`, `y` and `d` only change iteration state, `u` is always on.
    RegexBuilder::new(source)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|e| SelectorError::InvalidRegex {
            pattern: source.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_patterns() {
        assert_eq!(TextPattern::text("\"Sponsored\"").expect("literal"), TextPattern::Contains("Sponsored".into()));
        assert!(TextPattern::text("ad").expect("literal").is_match("read more"));

        let re = TextPattern::text("/^promo\\d+$/i").expect("regex");
        assert!(re.is_match("PROMO42"));
        assert!(!re.is_match("promo"));

        // Only `/re/` and `/re/i` count as regexes here.
        assert_eq!(TextPattern::text("/a/g").expect("literal"), TextPattern::Contains("/a/g".into()));
    }

    #[test]
    fn regex_literals() {
        assert!(parse_regex("/foo/").expect("regex").is_match("/foo/bar"));
        assert!(parse_regex("/FOO/i").expect("regex").is_match("foo"));
        // Leading slash without a closing one is a plain pattern.
        assert!(parse_regex("/news").expect("regex").is_match("/news/1"));
        assert!(parse_regex("a.c").expect("regex").is_match("abc"));
    }

    #[test]
    fn bad_flags_and_patterns_fail() {
        assert!(matches!(parse_regex("/a/x"), Err(SelectorError::InvalidRegexFlags(flags)) if flags == "x"));
        assert!(matches!(parse_regex("/a(/"), Err(SelectorError::InvalidRegex { .. })));
        assert!(TextPattern::text("/(/").is_err());
    }

    #[test]
    fn exact_values() {
        let exact = TextPattern::exact_or_regex("ad").expect("exact");
        assert!(exact.is_match("ad"));
        assert!(!exact.is_match("ads"));
        assert!(TextPattern::exact_or_regex("/^ad/").expect("regex").is_match("ads"));
    }

    #[test]
    fn quote_stripping() {
        assert_eq!(strip_wrapping_quotes("'a'"), "a");
        assert_eq!(strip_wrapping_quotes("\"a'"), "\"a'");
        assert_eq!(strip_wrapping_quotes("\""), "\"");
    }
}
