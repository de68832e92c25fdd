//! Selector Parser
//!
//! Builds a [`Selector`] tree from tokens:
//!
//! - commas split the input into a `List`
//! - the right-most combinator splits a chain into `Complex { left, right }`,
//!   so combinators associate to the left
//! - several tokens without a combinator form a `Compound`
//!
//! Pseudo-class arguments are parsed here too, so that bad regexes and
//! nested selectors fail at parse time and matching never has to.

use std::fmt;

use crate::error::SelectorError;
use crate::native::{Nth, Structural};
use crate::pattern::{is_regex_literal, strip_wrapping_quotes, TextPattern};
use crate::tokenizer::{tokenize, unescape_identifier, Token, TokenKind};
use crate::xpath::XPath;

// =============================================================================
// Selector AST
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Id(String),
    Class(String),
    /// Tag name, `None` for `*`.
    Type(Option<String>),
    Attribute(AttributeSelector),
    PseudoClass(PseudoClass),
    PseudoElement(String),
    /// Every member must match the same element.
    Compound(Vec<Selector>),
    /// `left` is absent for relative selectors such as `> .x` in `:has()`.
    Complex {
        left: Option<Box<Selector>>,
        combinator: Combinator,
        right: Box<Selector>,
    },
    /// Any member may match.
    List(Vec<Selector>),
}

impl Selector {
    /// Members of a compound, or the selector itself.
    pub fn as_slice(&self) -> &[Selector] {
        match self {
            Self::Compound(members) => members,
            other => std::slice::from_ref(other),
        }
    }

    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Id(_) | Self::Class(_) | Self::Type(_) | Self::Attribute(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// ` `
    Descendant,
    /// `>`
    Child,
    /// `+`
    NextSibling,
    /// `~`
    SubsequentSibling,
}

impl Combinator {
    fn from_token(content: &str) -> Option<Self> {
        match content {
            " " => Some(Self::Descendant),
            ">" => Some(Self::Child),
            "+" => Some(Self::NextSibling),
            "~" => Some(Self::SubsequentSibling),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Descendant => " ",
            Self::Child => ">",
            Self::NextSibling => "+",
            Self::SubsequentSibling => "~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOperator {
    /// `=`
    Equals,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
}

impl AttributeOperator {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "=" => Some(Self::Equals),
            "~=" => Some(Self::Includes),
            "|=" => Some(Self::DashMatch),
            "^=" => Some(Self::Prefix),
            "$=" => Some(Self::Suffix),
            "*=" => Some(Self::Substring),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::Includes => "~=",
            Self::DashMatch => "|=",
            Self::Prefix => "^=",
            Self::Suffix => "$=",
            Self::Substring => "*=",
        }
    }
}

/// `[name]` or `[name op "value" i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    /// Operator and unquoted value.
    pub value: Option<(AttributeOperator, String)>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PseudoClass {
    pub name: String,
    pub argument: Option<String>,
    pub kind: PseudoKind,
}

/// What a pseudo-class does, decided at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoKind {
    /// `:has()`, `:-abp-has()`, `:if()`
    Has(Box<Selector>),
    /// `:if-not()`
    HasNot(Box<Selector>),
    /// `:not()`
    Not(Box<Selector>),
    /// `:is()`, `:matches()`, `:where()`, `:any()`
    Is(Box<Selector>),
    /// `:has-text()`, `:contains()`, `:-abp-contains()`
    HasText(TextPattern),
    /// `None` when the argument is not a non-negative number; never matches.
    MinTextLength(Option<usize>),
    MatchesPath(TextPattern),
    MatchesAttr(AttrPattern),
    MatchesCss(CssPattern),
    Upward(Upward),
    /// `None` when the expression is outside the supported subset.
    XPath(Option<XPath>),
    Structural(Structural),
    /// Anything else; never matches.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttrPattern {
    pub name: TextPattern,
    pub value: Option<TextPattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CssPattern {
    /// `before` or `after`.
    pub pseudo_element: Option<String>,
    pub property: String,
    pub value: TextPattern,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Upward {
    /// Ancestor distance; only `1..256` yields anything.
    Count(i64),
    Selector(Box<Selector>),
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse an extended CSS selector.
pub fn parse_selector(text: &str) -> Result<Selector, SelectorError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(SelectorError::Empty);
    }
    nest(&tokens, true)
}

fn nest(tokens: &[Token], list: bool) -> Result<Selector, SelectorError> {
    if list && tokens.iter().any(|t| t.kind == TokenKind::Comma) {
        let mut selectors = Vec::new();
        let mut start = 0;
        for (i, token) in tokens.iter().enumerate() {
            if token.kind == TokenKind::Comma {
                if i == start {
                    return Err(SelectorError::MisplacedComma(token.offset));
                }
                selectors.push(nest(&tokens[start..i], false)?);
                start = i + 1;
            }
        }
        if start == tokens.len() {
            let offset = tokens.last().map_or(0, |t| t.offset);
            return Err(SelectorError::MisplacedComma(offset));
        }
        selectors.push(nest(&tokens[start..], false)?);
        return Ok(Selector::List(selectors));
    }

    if let Some(i) = tokens.iter().rposition(|t| t.kind == TokenKind::Combinator) {
        let token = &tokens[i];
        let combinator = Combinator::from_token(&token.content).ok_or_else(|| SelectorError::UnexpectedToken {
            token: token.content.clone(),
            offset: token.offset,
        })?;
        let (left, right) = (&tokens[..i], &tokens[i + 1..]);
        if right.is_empty() {
            return Err(SelectorError::DanglingCombinator(token.content.clone()));
        }
        let left = if left.is_empty() {
            None
        } else {
            Some(Box::new(nest(left, false)?))
        };
        return Ok(Selector::Complex {
            left,
            combinator,
            right: Box::new(nest(right, false)?),
        });
    }

    match tokens {
        [] => Err(SelectorError::Empty),
        [token] => simple(token),
        _ => Ok(Selector::Compound(tokens.iter().map(simple).collect::<Result<_, _>>()?)),
    }
}

fn simple(token: &Token) -> Result<Selector, SelectorError> {
    let name = token.name.as_deref().unwrap_or_default();
    match token.kind {
        TokenKind::Id => Ok(Selector::Id(unescape_identifier(name))),
        TokenKind::Class => Ok(Selector::Class(unescape_identifier(name))),
        TokenKind::Type => Ok(Selector::Type(token.name.as_ref().map(|n| n.to_ascii_lowercase()))),
        TokenKind::Attribute => attribute(token),
        TokenKind::PseudoElement => Ok(Selector::PseudoElement(name.to_ascii_lowercase())),
        TokenKind::PseudoClass => pseudo_class(&name.to_ascii_lowercase(), token.argument.as_deref()),
        TokenKind::Comma | TokenKind::Combinator => Err(SelectorError::UnexpectedToken {
            token: token.content.clone(),
            offset: token.offset,
        }),
    }
}

fn attribute(token: &Token) -> Result<Selector, SelectorError> {
    let name = token.name.clone().unwrap_or_default();
    let value = match (&token.operator, &token.value) {
        (Some(op), Some(value)) => {
            let op = AttributeOperator::parse(op).ok_or_else(|| SelectorError::UnexpectedToken {
                token: op.clone(),
                offset: token.offset,
            })?;
            let value = strip_wrapping_quotes(value);
            Some((op, unescape_identifier(value)))
        }
        _ => None,
    };
    Ok(Selector::Attribute(AttributeSelector {
        name,
        value,
        case_insensitive: token.case_flag.as_deref().is_some_and(|f| f.eq_ignore_ascii_case("i")),
    }))
}

fn subtree(name: &str, argument: Option<&str>) -> Result<Box<Selector>, SelectorError> {
    let argument = argument.ok_or_else(|| SelectorError::argument(name, "missing selector"))?;
    parse_selector(argument).map(Box::new)
}

fn required<'a>(name: &str, argument: Option<&'a str>) -> Result<&'a str, SelectorError> {
    argument.ok_or_else(|| SelectorError::argument(name, "missing argument"))
}

fn pseudo_class(name: &str, argument: Option<&str>) -> Result<Selector, SelectorError> {
    let kind = match name {
        "has" | "-abp-has" | "if" => PseudoKind::Has(subtree(name, argument)?),
        "if-not" => PseudoKind::HasNot(subtree(name, argument)?),
        "not" => PseudoKind::Not(subtree(name, argument)?),
        "is" | "matches" | "where" | "any" => PseudoKind::Is(subtree(name, argument)?),
        "has-text" | "contains" | "-abp-contains" => PseudoKind::HasText(TextPattern::text(required(name, argument)?)?),
        "min-text-length" => PseudoKind::MinTextLength(min_text_length(required(name, argument)?)),
        "matches-path" => PseudoKind::MatchesPath(TextPattern::regex(required(name, argument)?)?),
        "matches-attr" => PseudoKind::MatchesAttr(attr_pattern(required(name, argument)?)?),
        "matches-css" => PseudoKind::MatchesCss(css_pattern(name, required(name, argument)?, None)?),
        "matches-css-before" => {
            PseudoKind::MatchesCss(css_pattern(name, required(name, argument)?, Some("before"))?)
        }
        "matches-css-after" => PseudoKind::MatchesCss(css_pattern(name, required(name, argument)?, Some("after"))?),
        "upward" => PseudoKind::Upward(upward(name, required(name, argument)?)?),
        "xpath" => {
            let expression = required(name, argument)?;
            let parsed = XPath::parse(expression);
            if parsed.is_none() {
                log::debug!("unsupported xpath expression: {expression}");
            }
            PseudoKind::XPath(parsed)
        }
        "first-child" => PseudoKind::Structural(Structural::FirstChild),
        "last-child" => PseudoKind::Structural(Structural::LastChild),
        "only-child" => PseudoKind::Structural(Structural::OnlyChild),
        "empty" => PseudoKind::Structural(Structural::Empty),
        "root" => PseudoKind::Structural(Structural::Root),
        "nth-child" => {
            let argument = required(name, argument)?;
            let nth = Nth::parse(argument)
                .ok_or_else(|| SelectorError::argument(name, format!("invalid index '{argument}'")))?;
            PseudoKind::Structural(Structural::NthChild(nth))
        }
        _ => PseudoKind::Unsupported,
    };
    Ok(Selector::PseudoClass(PseudoClass {
        name: name.to_string(),
        argument: argument.map(str::to_string),
        kind,
    }))
}

fn min_text_length(argument: &str) -> Option<usize> {
    let min: f64 = argument.trim().parse().ok()?;
    (min >= 0.0).then(|| min.ceil() as usize)
}

fn attr_pattern(argument: &str) -> Result<AttrPattern, SelectorError> {
    let (name, value) = match argument.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (argument, None),
    };
    let name = strip_wrapping_quotes(name);
    let name = if is_regex_literal(name) {
        TextPattern::regex(name)?
    } else {
        TextPattern::Exact(name.to_string())
    };
    let value = match value.map(strip_wrapping_quotes) {
        Some(value) if !value.is_empty() => Some(TextPattern::exact_or_regex(value)?),
        _ => None,
    };
    Ok(AttrPattern { name, value })
}

fn css_pattern(name: &str, argument: &str, pseudo_element: Option<&str>) -> Result<CssPattern, SelectorError> {
    let mut pseudo_element = pseudo_element.map(str::to_string);
    let mut declaration = argument;
    // AdGuard form: `:matches-css(before, content: "x")`.
    if pseudo_element.is_none() {
        if let Some((first, rest)) = argument.split_once(',') {
            let first = first.trim();
            if first == "before" || first == "after" {
                pseudo_element = Some(first.to_string());
                declaration = rest;
            }
        }
    }
    let (property, value) = declaration
        .split_once(':')
        .ok_or_else(|| SelectorError::argument(name, "expected 'property: value'"))?;
    Ok(CssPattern {
        pseudo_element,
        property: property.trim().to_string(),
        value: TextPattern::exact_or_regex(value.trim())?,
    })
}

fn upward(name: &str, argument: &str) -> Result<Upward, SelectorError> {
    let argument = strip_wrapping_quotes(argument);
    let trimmed = argument.trim();
    if trimmed.is_empty() {
        return Ok(Upward::Count(0));
    }
    if let Ok(count) = trimmed.parse::<i64>() {
        return Ok(Upward::Count(count));
    }
    parse_selector(argument)
        .map(|s| Upward::Selector(Box::new(s)))
        .map_err(|e| SelectorError::argument(name, e.to_string()))
}

// =============================================================================
// Display
// =============================================================================

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(name) => write!(f, "#{name}"),
            Self::Class(name) => write!(f, ".{name}"),
            Self::Type(Some(name)) => f.write_str(name),
            Self::Type(None) => f.write_str("*"),
            Self::Attribute(attr) => {
                write!(f, "[{}", attr.name)?;
                if let Some((op, value)) = &attr.value {
                    write!(f, "{}\"{}\"", op.as_str(), value.replace('"', "\\\""))?;
                    if attr.case_insensitive {
                        f.write_str(" i")?;
                    }
                }
                f.write_str("]")
            }
            Self::PseudoClass(pseudo) => match &pseudo.argument {
                Some(argument) => write!(f, ":{}({})", pseudo.name, argument),
                None => write!(f, ":{}", pseudo.name),
            },
            Self::PseudoElement(name) => write!(f, "::{name}"),
            Self::Compound(members) => members.iter().try_for_each(|m| write!(f, "{m}")),
            Self::Complex { left, combinator, right } => {
                if let Some(left) = left {
                    write!(f, "{left}")?;
                    if *combinator != Combinator::Descendant {
                        f.write_str(" ")?;
                    }
                }
                match combinator {
                    Combinator::Descendant => write!(f, " {right}"),
                    other => write!(f, "{} {right}", other.as_str()),
                }
            }
            Self::List(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Selector {
        parse_selector(text).expect(text)
    }

    #[test]
    fn simple_and_compound() {
        assert_eq!(parse("#a"), Selector::Id("a".into()));
        assert_eq!(parse("DIV"), Selector::Type(Some("div".into())));
        assert_eq!(parse("*"), Selector::Type(None));
        assert_eq!(
            parse("p.x"),
            Selector::Compound(vec![Selector::Type(Some("p".into())), Selector::Class("x".into())])
        );
    }

    #[test]
    fn combinators_associate_left() {
        let selector = parse("a > b c");
        let Selector::Complex { left, combinator, right } = selector else {
            panic!("expected complex selector");
        };
        assert_eq!(combinator, Combinator::Descendant);
        assert_eq!(*right, Selector::Type(Some("c".into())));
        assert!(matches!(left.as_deref(), Some(Selector::Complex { combinator: Combinator::Child, .. })));
    }

    #[test]
    fn relative_selector_in_has() {
        let selector = parse("#a:has(> .x)");
        let Selector::Compound(members) = selector else {
            panic!("expected compound");
        };
        let Selector::PseudoClass(PseudoClass { kind: PseudoKind::Has(inner), .. }) = &members[1] else {
            panic!("expected :has");
        };
        assert!(matches!(
            inner.as_ref(),
            Selector::Complex { left: None, combinator: Combinator::Child, .. }
        ));
    }

    #[test]
    fn lists() {
        let Selector::List(members) = parse("p, span > a") else {
            panic!("expected list");
        };
        assert_eq!(members.len(), 2);
        assert!(matches!(parse_selector(", p"), Err(SelectorError::MisplacedComma(0))));
        assert!(matches!(parse_selector("p,"), Err(SelectorError::MisplacedComma(_))));
        assert!(matches!(parse_selector("p,,a"), Err(SelectorError::MisplacedComma(2))));
    }

    #[test]
    fn attributes() {
        assert_eq!(
            parse("[href^='http' i]"),
            Selector::Attribute(AttributeSelector {
                name: "href".into(),
                value: Some((AttributeOperator::Prefix, "http".into())),
                case_insensitive: true,
            })
        );
        assert_eq!(
            parse("[class=ads]"),
            Selector::Attribute(AttributeSelector {
                name: "class".into(),
                value: Some((AttributeOperator::Equals, "ads".into())),
                case_insensitive: false,
            })
        );
        assert!(parse_selector("[a!=b]").is_err());
    }

    #[test]
    fn pseudo_class_arguments() {
        let pseudo = |text: &str| match parse(text) {
            Selector::PseudoClass(p) => p.kind,
            other => panic!("expected pseudo-class, got {other:?}"),
        };
        assert_eq!(pseudo(":has-text(\"Ad\")"), PseudoKind::HasText(TextPattern::Contains("Ad".into())));
        assert_eq!(pseudo(":min-text-length(10)"), PseudoKind::MinTextLength(Some(10)));
        assert_eq!(pseudo(":min-text-length(-1)"), PseudoKind::MinTextLength(None));
        assert_eq!(pseudo(":upward(2)"), PseudoKind::Upward(Upward::Count(2)));
        assert_eq!(
            pseudo(":upward(div.x)"),
            PseudoKind::Upward(Upward::Selector(Box::new(parse("div.x"))))
        );
        assert_eq!(
            pseudo(":matches-attr(\"data-*\"=\"/^ad/\")"),
            PseudoKind::MatchesAttr(AttrPattern {
                name: TextPattern::Exact("data-*".into()),
                value: Some(TextPattern::exact_or_regex("/^ad/").expect("regex")),
            })
        );
        let PseudoKind::MatchesCss(css) = pseudo(":matches-css(before, content: /ad/)") else {
            panic!("expected :matches-css");
        };
        assert_eq!(css.pseudo_element.as_deref(), Some("before"));
        assert_eq!(css.property, "content");
        assert_eq!(pseudo(":hover"), PseudoKind::Unsupported);
    }

    #[test]
    fn bad_arguments_fail_at_parse_time() {
        assert!(matches!(parse_selector("a:has-text(/[/)"), Err(SelectorError::InvalidRegex { .. })));
        assert!(matches!(parse_selector("a:matches-path(/x/q)"), Err(SelectorError::InvalidRegexFlags(_))));
        assert!(matches!(parse_selector("a:matches-css(color)"), Err(SelectorError::InvalidArgument { .. })));
        assert!(matches!(parse_selector("a:has()"), Err(SelectorError::Empty)));
        assert!(matches!(parse_selector("a:nth-child(x)"), Err(SelectorError::InvalidArgument { .. })));
        assert!(matches!(parse_selector("a >"), Err(SelectorError::DanglingCombinator(_))));
        assert_eq!(parse_selector(""), Err(SelectorError::Empty));
    }

    #[test]
    fn display_round_trip() {
        for text in [
            "#a > .x:has-text(\"hi\")",
            "div.ad:upward(2)",
            "p, span ~ a + b",
            "a[href^=\"http\"]",
            "div:has(> a)",
        ] {
            assert_eq!(parse(text).to_string(), text);
        }
    }
}
