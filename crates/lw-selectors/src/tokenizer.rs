//! Selector Tokenizer
//!
//! One regex per token kind, tried in a fixed order. Each regex only sees
//! text that earlier kinds left unclaimed.
//!
//! # Architecture
//!
//! Nested structures would defeat the regexes, so they are masked first:
//!
//! 1. Quoted strings become runs of `§`.
//! 2. The contents of every top-level `(...)` become runs of `¶`.
//! 3. The masked text is split by the grammar, kind by kind.
//! 4. Token text and captures are sliced back out of the original input,
//!    which restores the masked strings and arguments.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SelectorError;

const STRING_MASK: char = '§';
const PAREN_MASK: char = '¶';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Attribute,
    Id,
    Class,
    Comma,
    Combinator,
    PseudoElement,
    PseudoClass,
    Type,
}

/// Grammar in matching order. Comma precedes combinator, attribute precedes
/// combinator, pseudo-element precedes pseudo-class and type comes last.
static GRAMMAR: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    vec![
        (
            TokenKind::Attribute,
            Regex::new(
                r"\[\s*(?:(?P<namespace>\*|[-\w]*)\|)?(?P<name>[-\w\x{0080}-\x{FFFF}]+)\s*(?:(?P<operator>\W?=)\s*(?P<value>.+?)(?:\s+(?P<case>[iIsS]))?\s*)?\]",
            )
            .unwrap(),
        ),
        (
            TokenKind::Id,
            Regex::new(r"#(?P<name>(?:[-\w\x{0080}-\x{FFFF}]|\\.)+)").unwrap(),
        ),
        (
            TokenKind::Class,
            Regex::new(r"\.(?P<name>(?:[-\w\x{0080}-\x{FFFF}]|\\.)+)").unwrap(),
        ),
        (TokenKind::Comma, Regex::new(r"\s*,\s*").unwrap()),
        (TokenKind::Combinator, Regex::new(r"\s*[\s>+~]\s*").unwrap()),
        (
            TokenKind::PseudoElement,
            Regex::new(r"::(?P<name>[-\w\x{0080}-\x{FFFF}]+)(?:\((?P<argument>¶*)\))?").unwrap(),
        ),
        (
            TokenKind::PseudoClass,
            Regex::new(r":(?P<name>[-\w\x{0080}-\x{FFFF}]+)(?:\((?P<argument>¶*)\))?").unwrap(),
        ),
        (
            TokenKind::Type,
            Regex::new(r"(?:(?P<namespace>\*|[-\w]*)\|)?(?P<name>[-\w\x{0080}-\x{FFFF}]+)|\*").unwrap(),
        ),
    ]
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the whole token. Commas and combinators are trimmed;
    /// a whitespace combinator is `" "`.
    pub content: String,
    pub name: Option<String>,
    /// Pseudo-class argument, without the parentheses.
    pub argument: Option<String>,
    pub namespace: Option<String>,
    pub operator: Option<String>,
    pub value: Option<String>,
    pub case_flag: Option<String>,
    /// Byte offset in the input.
    pub offset: usize,
}

enum Piece {
    Text(usize, usize),
    Token(Token),
}

/// Masked copy of the input plus a byte offset map back into it.
struct Masked<'a> {
    source: &'a str,
    text: String,
    /// `offsets[i]` is the source offset of masked byte `i`, valid at char
    /// boundaries; one extra entry maps the end.
    offsets: Vec<usize>,
}

impl<'a> Masked<'a> {
    fn new(source: &'a str) -> Result<Self, SelectorError> {
        let chars: Vec<(usize, char)> = source.char_indices().collect();
        let mut masked: Vec<char> = chars.iter().map(|&(_, c)| c).collect();

        // Strings.
        let mut i = 0;
        while i < chars.len() {
            let quote = chars[i].1;
            if quote == '"' || quote == '\'' {
                let mut j = i + 1;
                while j < chars.len() && chars[j].1 != quote {
                    if chars[j].1 == '\\' {
                        j += 1;
                    }
                    j += 1;
                }
                if j < chars.len() {
                    for c in &mut masked[i..=j] {
                        *c = STRING_MASK;
                    }
                    i = j;
                }
            }
            i += 1;
        }

        // Top-level parentheses. Escaped characters never open or close.
        let mut depth = 0usize;
        let mut open = 0usize;
        let mut i = 0;
        while i < masked.len() {
            match masked[i] {
                '\\' => i += 1,
                '(' => {
                    if depth == 0 {
                        open = i;
                    }
                    depth += 1;
                }
                ')' => {
                    if depth == 0 {
                        return Err(SelectorError::UnbalancedParens(chars[i].0));
                    }
                    depth -= 1;
                    if depth == 0 {
                        for c in &mut masked[open + 1..i] {
                            *c = PAREN_MASK;
                        }
                    }
                }
                _ => {}
            }
            i += 1;
        }
        if depth > 0 {
            return Err(SelectorError::UnbalancedParens(chars[open].0));
        }

        let mut text = String::with_capacity(source.len());
        let mut offsets = Vec::with_capacity(source.len() + 1);
        for (&(offset, _), &c) in chars.iter().zip(&masked) {
            text.push(c);
            offsets.resize(text.len(), offset);
        }
        offsets.push(source.len());
        Ok(Self { source, text, offsets })
    }

    fn source_offset(&self, masked: usize) -> usize {
        self.offsets[masked]
    }

    fn restore(&self, start: usize, end: usize) -> &'a str {
        &self.source[self.source_offset(start)..self.source_offset(end)]
    }
}

/// Split a selector into tokens.
pub fn tokenize(selector: &str) -> Result<Vec<Token>, SelectorError> {
    let trimmed = selector.trim();
    let lead = selector.len() - selector.trim_start().len();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let masked = Masked::new(trimmed).map_err(|e| match e {
        SelectorError::UnbalancedParens(offset) => SelectorError::UnbalancedParens(offset + lead),
        other => other,
    })?;

    let mut pieces = vec![Piece::Text(0, masked.text.len())];
    for (kind, re) in GRAMMAR.iter() {
        let mut next = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let (start, end) = match piece {
                Piece::Text(start, end) => (start, end),
                token => {
                    next.push(token);
                    continue;
                }
            };
            let mut cursor = start;
            for caps in re.captures_iter(&masked.text[start..end]) {
                let Some(whole) = caps.get(0) else { continue };
                let (m_start, m_end) = (start + whole.start(), start + whole.end());
                if m_start > cursor {
                    next.push(Piece::Text(cursor, m_start));
                }
                let group = |name: &str| {
                    caps.name(name)
                        .map(|m| masked.restore(start + m.start(), start + m.end()).to_string())
                };
                next.push(Piece::Token(Token {
                    kind: *kind,
                    content: masked.restore(m_start, m_end).to_string(),
                    name: group("name"),
                    argument: group("argument"),
                    namespace: group("namespace"),
                    operator: group("operator"),
                    value: group("value"),
                    case_flag: group("case"),
                    offset: lead + masked.source_offset(m_start),
                }));
                cursor = m_end;
            }
            if cursor < end {
                next.push(Piece::Text(cursor, end));
            }
        }
        pieces = next;
    }

    let mut tokens = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match piece {
            Piece::Token(mut token) => {
                if matches!(token.kind, TokenKind::Comma | TokenKind::Combinator) {
                    let content = token.content.trim();
                    token.content = if content.is_empty() { " ".to_string() } else { content.to_string() };
                }
                tokens.push(token);
            }
            Piece::Text(start, end) => {
                return Err(SelectorError::UnexpectedToken {
                    token: masked.restore(start, end).to_string(),
                    offset: lead + masked.source_offset(start),
                });
            }
        }
    }
    Ok(tokens)
}

/// Drop CSS backslash escapes from an identifier.
pub fn unescape_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(selector: &str) -> Vec<(TokenKind, String)> {
        tokenize(selector)
            .expect(selector)
            .into_iter()
            .map(|t| (t.kind, t.content))
            .collect()
    }

    #[test]
    fn splits_by_kind() {
        assert_eq!(
            kinds("div#main > a.link[href^=\"http\"]"),
            vec![
                (TokenKind::Type, "div".to_string()),
                (TokenKind::Id, "#main".to_string()),
                (TokenKind::Combinator, ">".to_string()),
                (TokenKind::Type, "a".to_string()),
                (TokenKind::Class, ".link".to_string()),
                (TokenKind::Attribute, "[href^=\"http\"]".to_string()),
            ]
        );
        assert_eq!(
            kinds("p , span  em"),
            vec![
                (TokenKind::Type, "p".to_string()),
                (TokenKind::Comma, ",".to_string()),
                (TokenKind::Type, "span".to_string()),
                (TokenKind::Combinator, " ".to_string()),
                (TokenKind::Type, "em".to_string()),
            ]
        );
    }

    #[test]
    fn arguments_are_restored() {
        let tokens = tokenize("div:has(> a:has-text(\"x) y\"))::before").expect("tokenize");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].kind, TokenKind::PseudoClass);
        assert_eq!(tokens[1].name.as_deref(), Some("has"));
        assert_eq!(tokens[1].argument.as_deref(), Some("> a:has-text(\"x) y\")"));
        assert_eq!(tokens[2].kind, TokenKind::PseudoElement);
        assert_eq!(tokens[2].name.as_deref(), Some("before"));
    }

    #[test]
    fn attribute_parts() {
        let tokens = tokenize("[ data-ad *= 'a,b' i ]").expect("tokenize");
        assert_eq!(tokens.len(), 1);
        let attr = &tokens[0];
        assert_eq!(attr.name.as_deref(), Some("data-ad"));
        assert_eq!(attr.operator.as_deref(), Some("*="));
        assert_eq!(attr.value.as_deref(), Some("'a,b'"));
        assert_eq!(attr.case_flag.as_deref(), Some("i"));
    }

    #[test]
    fn non_ascii_offsets() {
        let tokens = tokenize(".é:has-text(ü)").expect("tokenize");
        assert_eq!(tokens[0].name.as_deref(), Some("é"));
        assert_eq!(tokens[1].argument.as_deref(), Some("ü"));
        assert_eq!(tokens[1].offset, 3);
    }

    #[test]
    fn errors() {
        assert_eq!(tokenize("div:has(a"), Err(SelectorError::UnbalancedParens(7)));
        assert_eq!(tokenize("  a)"), Err(SelectorError::UnbalancedParens(3)));
        assert!(matches!(tokenize("div!"), Err(SelectorError::UnexpectedToken { offset: 3, .. })));
        assert_eq!(tokenize("   "), Ok(Vec::new()));
    }

    #[test]
    fn escaped_parentheses_stay_balanced() {
        let tokens = tokenize(r"div:matches-css(background-image: /^url\(data/)").expect("tokenize");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].argument.as_deref(), Some(r"background-image: /^url\(data/"));

        let tokens = tokenize(r".a\(b").expect("tokenize");
        assert_eq!(tokens[0].name.as_deref(), Some(r"a\(b"));
        assert_eq!(tokenize(r"div:has(a\)"), Err(SelectorError::UnbalancedParens(7)));
    }

    #[test]
    fn unescapes_identifiers() {
        assert_eq!(unescape_identifier(r"a\:b"), "a:b");
        assert_eq!(unescape_identifier("plain"), "plain");
    }
}
