//! Balance-aware scanning of CSS selector text.
//!
//! The converters and the cosmetic parser only need to find pseudo-class
//! calls and top-level separators, so this module walks the raw text instead
//! of building a full selector tree. Quoted strings and backslash escapes are
//! skipped; parentheses and square brackets are tracked independently.

/// Walk `s`, calling `f(index, byte, paren_depth, bracket_depth)` for every
/// byte outside quoted strings and escapes. Depths are the values *before*
/// the byte is applied. Stops early when `f` returns `false`.
fn walk(s: &str, mut f: impl FnMut(usize, u8, usize, usize) -> bool) -> Result<(), usize> {
    let bytes = s.as_bytes();
    let mut parens = 0usize;
    let mut brackets = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\\' => {
                i += 2;
                continue;
            }
            b'"' | b'\'' if opens_string(bytes, i) => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j] != b {
                    if bytes[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
                if j >= bytes.len() {
                    return Err(i);
                }
                i = j + 1;
                continue;
            }
            _ => {}
        }
        if !f(i, b, parens, brackets) {
            return Ok(());
        }
        match b {
            b'(' => parens += 1,
            b')' => parens = parens.checked_sub(1).ok_or(i)?,
            b'[' => brackets += 1,
            b']' => brackets = brackets.checked_sub(1).ok_or(i)?,
            _ => {}
        }
        i += 1;
    }
    Ok(())
}

/// A quote only starts a string at the beginning of a token, so apostrophes
/// inside words (`:has-text(don't)`) stay literal.
fn opens_string(bytes: &[u8], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    matches!(bytes[i - 1], b'(' | b'[' | b'=' | b',' | b' ' | b'\t')
}

/// Whether parentheses, brackets and quotes in `s` are balanced.
pub fn is_balanced(s: &str) -> bool {
    let mut depth = (0usize, 0usize);
    let walked = walk(s, |_, b, parens, brackets| {
        depth = match b {
            b'(' => (parens + 1, brackets),
            b')' => (parens.saturating_sub(1), brackets),
            b'[' => (parens, brackets + 1),
            b']' => (parens, brackets.saturating_sub(1)),
            _ => (parens, brackets),
        };
        true
    });
    walked.is_ok() && depth == (0, 0)
}

/// Index of the `)` matching the `(` at `open`.
pub fn find_closing_paren(s: &str, open: usize) -> Option<usize> {
    if s.as_bytes().get(open) != Some(&b'(') {
        return None;
    }
    let mut found = None;
    let base = open + 1;
    walk(&s[base..], |i, b, parens, _| {
        if b == b')' && parens == 0 {
            found = Some(base + i);
            return false;
        }
        true
    })
    .ok()?;
    found
}

/// Byte offset of the first `needle` found outside parentheses, brackets and
/// strings.
pub fn find_top_level(s: &str, needle: u8) -> Option<usize> {
    let mut found = None;
    walk(s, |i, b, parens, brackets| {
        if b == needle && parens == 0 && brackets == 0 {
            found = Some(i);
            return false;
        }
        true
    })
    .ok()?;
    found
}

/// Split on `sep` at the top level. Separators inside parentheses, brackets
/// or strings are kept.
pub fn split_top_level(s: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let walked = walk(s, |i, b, parens, brackets| {
        if b == sep && parens == 0 && brackets == 0 {
            parts.push(&s[start..i]);
            start = i + 1;
        }
        true
    });
    if walked.is_err() {
        return vec![s];
    }
    parts.push(&s[start..]);
    parts
}

/// A `:name(argument)` occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoCall<'a> {
    /// Offset of the leading `:`.
    pub start: usize,
    /// Offset just past the call (after `)` if there is an argument).
    pub end: usize,
    pub name: &'a str,
    pub argument: Option<&'a str>,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Pseudo-class occurrences at any nesting depth, skipping pseudo-elements
/// and colons inside attribute selectors.
pub fn pseudo_classes(selector: &str) -> Vec<PseudoCall<'_>> {
    collect_pseudo_classes(selector, false)
}

/// Pseudo-class occurrences outside any parentheses.
pub fn top_level_pseudo_classes(selector: &str) -> Vec<PseudoCall<'_>> {
    collect_pseudo_classes(selector, true)
}

fn collect_pseudo_classes(selector: &str, top_level_only: bool) -> Vec<PseudoCall<'_>> {
    let bytes = selector.as_bytes();
    let mut calls = Vec::new();
    let _ = walk(selector, |i, b, parens, brackets| {
        if b != b':' || brackets > 0 || (top_level_only && parens > 0) {
            return true;
        }
        if i > 0 && bytes[i - 1] == b':' {
            return true;
        }
        if bytes.get(i + 1) == Some(&b':') {
            return true;
        }
        let mut end = i + 1;
        while end < bytes.len() && is_ident_byte(bytes[end]) {
            end += 1;
        }
        if end == i + 1 {
            return true;
        }
        let name = &selector[i + 1..end];
        let mut call = PseudoCall {
            start: i,
            end,
            name,
            argument: None,
        };
        if bytes.get(end) == Some(&b'(') {
            if let Some(close) = find_closing_paren(selector, end) {
                call.argument = Some(&selector[end + 1..close]);
                call.end = close + 1;
            }
        }
        calls.push(call);
        true
    });
    calls
}
