//! Comment-category sub-parsers.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Ctx, ParserOptions};
use crate::ast::{
    Agent, AgentCommentRule, CommentRule, ConfigCommentRule, ConfigParams, Hint, HintCommentRule,
    LogicalExpression, MetadataCommentRule, PreProcessorCommentRule, PreProcessorParams,
    SimpleCommentRule, Span,
};
use crate::error::AdblockSyntaxError;
use crate::syntax::{syntax_from_agent_name, AdblockSyntax, CommentMarker, CosmeticSeparator};

/// Header names recognized in metadata comments (compared case-insensitively).
pub const METADATA_HEADERS: &[&str] = &[
    "Checksum",
    "Description",
    "Expires",
    "Homepage",
    "Last Modified",
    "LastModified",
    "Licence",
    "License",
    "Time Updated",
    "TimeUpdated",
    "Title",
    "Version",
];

/// Linter configuration commands.
pub const CONFIG_COMMANDS: &[&str] = &[
    "aglint",
    "aglint-disable",
    "aglint-enable",
    "aglint-disable-next-line",
    "aglint-enable-next-line",
];

/// Pre-processor directives with fixed parameter shapes.
pub const DIRECTIVE_IF: &str = "if";
pub const DIRECTIVE_ELSE: &str = "else";
pub const DIRECTIVE_ENDIF: &str = "endif";
pub const DIRECTIVE_INCLUDE: &str = "include";
pub const DIRECTIVE_SAFARI_CB_AFFINITY: &str = "safari_cb_affinity";

static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\.\d+(\.\d+)?\b").unwrap());

// =============================================================================
// Detection
// =============================================================================

/// Whether a trimmed line belongs to the comment category.
pub fn is_comment_line(text: &str) -> bool {
    is_agent_rule(text) || is_simple_comment(text)
}

fn is_agent_rule(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('[') && text.ends_with(']') && !text.starts_with("[$")
}

fn is_simple_comment(text: &str) -> bool {
    match text.as_bytes().first() {
        Some(b'!') => true,
        // `##.ad` and friends are cosmetic rules without a domain list
        Some(b'#') => match CosmeticSeparator::find(text) {
            Some((start, separator)) => !starts_selector(&text[start + separator.as_str().len()..]),
            None => true,
        },
        _ => false,
    }
}

/// A cosmetic body starts right after the separator, and not with another `##`.
fn starts_selector(body: &str) -> bool {
    match body.chars().next() {
        Some(c) if c.is_whitespace() => false,
        Some(_) => !body.starts_with("##"),
        None => false,
    }
}

pub(crate) fn parse_comment(text: &str, ctx: &Ctx) -> Result<CommentRule, AdblockSyntaxError> {
    if is_agent_rule(text) {
        return parse_agent_comment(text, ctx).map(CommentRule::Agent);
    }
    if let Some(rule) = parse_hint_comment(text, ctx)? {
        return Ok(CommentRule::Hint(rule));
    }
    if let Some(rule) = parse_preprocessor(text, ctx)? {
        return Ok(CommentRule::PreProcessor(rule));
    }

    let (marker, rest) = split_marker(text);
    if let Some(rule) = parse_metadata(marker, rest, ctx) {
        return Ok(CommentRule::Metadata(rule));
    }
    if let Some(rule) = parse_config(marker, rest, ctx)? {
        return Ok(CommentRule::Config(rule));
    }

    Ok(CommentRule::Simple(SimpleCommentRule {
        marker,
        text: rest.to_string(),
        span: ctx.span(0, text.len()),
        raws: ctx.raws(),
    }))
}

fn split_marker(text: &str) -> (CommentMarker, &str) {
    let marker = text
        .chars()
        .next()
        .and_then(CommentMarker::from_char)
        .unwrap_or_default();
    (marker, &text[1..])
}

// =============================================================================
// Agents
// =============================================================================

fn parse_agent_comment(text: &str, ctx: &Ctx) -> Result<AgentCommentRule, AdblockSyntaxError> {
    let inner = &text[1..text.len() - 1];
    if inner.trim().is_empty() {
        return Err(AdblockSyntaxError::new(
            "Agent comment must contain at least one agent",
            0,
            text.len(),
        ));
    }

    let mut agents = Vec::new();
    let mut start = 1;
    for part in inner.split(';') {
        agents.push(agent_at(part, start, ctx.options, ctx.offset)?);
        start += part.len() + 1;
    }

    Ok(AgentCommentRule {
        agents,
        span: ctx.span(0, text.len()),
        raws: ctx.raws(),
    })
}

/// Parse a single agent such as `Adblock Plus 2.0`.
pub fn parse_agent(text: &str) -> Result<Agent, AdblockSyntaxError> {
    agent_at(text, 0, &ParserOptions::default(), 0)
}

/// `base` is the position of `text` inside the trimmed line, `offset` the
/// position of the trimmed line inside the original one.
fn agent_at(
    text: &str,
    base: usize,
    options: &ParserOptions,
    offset: usize,
) -> Result<Agent, AdblockSyntaxError> {
    let mut name_range: Option<(usize, usize)> = None;
    let mut version: Option<&str> = None;

    for (start, word) in words(text) {
        let end = start + word.len();
        if VERSION_RE.is_match(word) {
            if version.is_some() {
                return Err(AdblockSyntaxError::new(
                    "Duplicated versions are not allowed",
                    base + start,
                    base + end,
                ));
            }
            version = Some(word);
        } else if version.is_none() {
            name_range = Some(match name_range {
                Some((name_start, _)) => (name_start, end),
                None => (start, end),
            });
        }
    }

    let Some((name_start, name_end)) = name_range else {
        return Err(AdblockSyntaxError::new(
            "Agent name cannot be empty",
            base,
            base + text.len(),
        ));
    };
    let adblock = &text[name_start..name_end];

    let trimmed_start = text.len() - text.trim_start().len();
    let trimmed_end = text.trim_end().len();
    Ok(Agent {
        adblock: adblock.to_string(),
        version: version.map(str::to_string),
        syntax: syntax_from_agent_name(adblock),
        span: options
            .is_loc_included
            .then(|| Span::new(offset + base + trimmed_start, offset + base + trimmed_end)),
    })
}

/// Whitespace separated words with their byte offsets.
fn words(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split(|c: char| c.is_ascii_whitespace())
        .scan(0usize, |pos, word| {
            let start = *pos;
            *pos += word.len() + 1;
            Some((start, word))
        })
        .filter(|(_, word)| !word.is_empty())
}

// =============================================================================
// Hints
// =============================================================================

fn is_hint_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn char_at(body: &str, i: usize) -> char {
    body[i..].chars().next().unwrap_or_default()
}

fn parse_hint_comment(text: &str, ctx: &Ctx) -> Result<Option<HintCommentRule>, AdblockSyntaxError> {
    let Some(body) = text.strip_prefix("!+") else {
        return Ok(None);
    };
    let bytes = body.as_bytes();
    let base = 2;
    let mut hints = Vec::new();
    let mut i = 0;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let start = i;
        while i < bytes.len() && is_hint_name_byte(bytes[i]) {
            i += 1;
        }
        if i == start {
            let c = char_at(body, i);
            return Err(AdblockSyntaxError::new(
                format!("Invalid character '{c}' in hint name"),
                base + i,
                base + i + c.len_utf8(),
            ));
        }
        let name = &body[start..i];

        let mut params = None;
        if bytes.get(i) == Some(&b'(') {
            let Some(close) = body[i..].find(')').map(|p| i + p) else {
                return Err(AdblockSyntaxError::new(
                    format!("Missing closing parenthesis for hint '{name}'"),
                    base + start,
                    base + body.len(),
                ));
            };
            let inner = body[i + 1..close].trim();
            params = Some(if inner.is_empty() {
                Vec::new()
            } else {
                inner.split(',').map(|p| p.trim().to_string()).collect()
            });
            i = close + 1;
        }

        if i < bytes.len() && !bytes[i].is_ascii_whitespace() {
            let c = char_at(body, i);
            return Err(AdblockSyntaxError::new(
                format!("Unexpected character '{c}' after hint '{name}'"),
                base + i,
                base + i + c.len_utf8(),
            ));
        }

        hints.push(Hint {
            name: name.to_string(),
            params,
            span: ctx.span(base + start, base + i),
        });
    }

    if hints.is_empty() {
        return Err(AdblockSyntaxError::new(
            "Hint comment must contain at least one hint",
            0,
            text.len(),
        ));
    }

    Ok(Some(HintCommentRule {
        hints,
        span: ctx.span(0, text.len()),
        raws: ctx.raws(),
    }))
}

// =============================================================================
// Pre-processor Directives
// =============================================================================

fn parse_preprocessor(
    text: &str,
    ctx: &Ctx,
) -> Result<Option<PreProcessorCommentRule>, AdblockSyntaxError> {
    let Some(body) = text.strip_prefix("!#") else {
        return Ok(None);
    };
    let name_len = body
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    if name_len == 0 || !body.as_bytes()[0].is_ascii_alphabetic() {
        return Ok(None);
    }
    let name = &body[..name_len];
    let after = &body[name_len..];
    if !(after.is_empty() || after.starts_with('(') || after.starts_with(char::is_whitespace)) {
        return Ok(None);
    }

    let params_base = 2 + name_len;
    let value = after.trim();
    let value_start = params_base + (after.len() - after.trim_start().len());
    let mut syntax = AdblockSyntax::Adg;

    let params = match name {
        DIRECTIVE_IF => {
            if value.is_empty() {
                return Err(AdblockSyntaxError::new(
                    "Directive 'if' requires a condition",
                    0,
                    text.len(),
                ));
            }
            let expr = parse_expression_at(value, value_start)?;
            Some(PreProcessorParams::Expression(expr))
        }
        DIRECTIVE_ELSE | DIRECTIVE_ENDIF => {
            if !value.is_empty() {
                return Err(AdblockSyntaxError::new(
                    format!("Directive '{name}' does not accept parameters"),
                    value_start,
                    text.len(),
                ));
            }
            None
        }
        DIRECTIVE_SAFARI_CB_AFFINITY => {
            if after.is_empty() {
                None
            } else {
                let Some(inner) = after.strip_prefix('(').and_then(|s| s.strip_suffix(')')) else {
                    return Err(AdblockSyntaxError::new(
                        "Directive 'safari_cb_affinity' expects a parenthesized parameter list",
                        params_base,
                        text.len(),
                    ));
                };
                Some(PreProcessorParams::Parameters(
                    inner
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect(),
                ))
            }
        }
        _ => {
            if name == DIRECTIVE_INCLUDE && value.is_empty() {
                return Err(AdblockSyntaxError::new(
                    "Directive 'include' requires a value",
                    0,
                    text.len(),
                ));
            }
            if name != DIRECTIVE_INCLUDE {
                syntax = AdblockSyntax::Common;
            }
            (!value.is_empty()).then(|| PreProcessorParams::Value(value.to_string()))
        }
    };

    Ok(Some(PreProcessorCommentRule {
        name: name.to_string(),
        params,
        syntax,
        span: ctx.span(0, text.len()),
        raws: ctx.raws(),
    }))
}

/// Parse a pre-processor condition such as `adguard && !adguard_ext_safari`.
pub fn parse_logical_expression(text: &str) -> Result<LogicalExpression, AdblockSyntaxError> {
    parse_expression_at(text, 0)
}

fn parse_expression_at(text: &str, base: usize) -> Result<LogicalExpression, AdblockSyntaxError> {
    let tokens = tokenize_expression(text, base)?;
    let mut parser = ExprParser {
        tokens,
        pos: 0,
        end: base + text.len(),
    };
    let expr = parser.or()?;
    if let Some(token) = parser.tokens.get(parser.pos) {
        return Err(AdblockSyntaxError::new(
            "Unexpected token in logical expression",
            token.start,
            token.end,
        ));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ExprTokenKind {
    Variable(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

#[derive(Debug, Clone)]
struct ExprToken {
    kind: ExprTokenKind,
    start: usize,
    end: usize,
}

fn tokenize_expression(text: &str, base: usize) -> Result<Vec<ExprToken>, AdblockSyntaxError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        let kind = match bytes[i] {
            b if b.is_ascii_whitespace() => {
                i += 1;
                continue;
            }
            b'!' => {
                i += 1;
                ExprTokenKind::Not
            }
            b'(' => {
                i += 1;
                ExprTokenKind::Open
            }
            b')' => {
                i += 1;
                ExprTokenKind::Close
            }
            b'&' if bytes.get(i + 1) == Some(&b'&') => {
                i += 2;
                ExprTokenKind::And
            }
            b'|' if bytes.get(i + 1) == Some(&b'|') => {
                i += 2;
                ExprTokenKind::Or
            }
            b if b.is_ascii_alphanumeric() || b == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                ExprTokenKind::Variable(text[start..i].to_string())
            }
            b => {
                return Err(AdblockSyntaxError::new(
                    format!("Unexpected character '{}' in logical expression", b as char),
                    base + i,
                    base + i + 1,
                ));
            }
        };
        tokens.push(ExprToken {
            kind,
            start: base + start,
            end: base + i,
        });
    }
    Ok(tokens)
}

/// Recursive descent: `or := and ('||' and)*`, `and := not ('&&' not)*`,
/// `not := '!' not | '(' or ')' | variable`.
struct ExprParser {
    tokens: Vec<ExprToken>,
    pos: usize,
    end: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&ExprTokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn or(&mut self) -> Result<LogicalExpression, AdblockSyntaxError> {
        let mut left = self.and()?;
        while self.peek() == Some(&ExprTokenKind::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = LogicalExpression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<LogicalExpression, AdblockSyntaxError> {
        let mut left = self.not()?;
        while self.peek() == Some(&ExprTokenKind::And) {
            self.pos += 1;
            let right = self.not()?;
            left = LogicalExpression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<LogicalExpression, AdblockSyntaxError> {
        let Some(token) = self.tokens.get(self.pos).cloned() else {
            return Err(AdblockSyntaxError::new(
                "Unexpected end of logical expression",
                self.end,
                self.end,
            ));
        };
        self.pos += 1;
        match token.kind {
            ExprTokenKind::Not => Ok(LogicalExpression::Not(Box::new(self.not()?))),
            ExprTokenKind::Variable(name) => Ok(LogicalExpression::Variable(name)),
            ExprTokenKind::Open => {
                let inner = self.or()?;
                if self.peek() != Some(&ExprTokenKind::Close) {
                    return Err(AdblockSyntaxError::new(
                        "Missing closing parenthesis in logical expression",
                        token.start,
                        self.end,
                    ));
                }
                self.pos += 1;
                Ok(LogicalExpression::Parenthesis(Box::new(inner)))
            }
            ExprTokenKind::And | ExprTokenKind::Or | ExprTokenKind::Close => Err(
                AdblockSyntaxError::new("Unexpected token in logical expression", token.start, token.end),
            ),
        }
    }
}

// =============================================================================
// Metadata & Config
// =============================================================================

fn parse_metadata(marker: CommentMarker, rest: &str, ctx: &Ctx) -> Option<MetadataCommentRule> {
    let colon = rest.find(':')?;
    let header = rest[..colon].trim();
    if !METADATA_HEADERS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(header))
    {
        return None;
    }
    let value = rest[colon + 1..].trim();
    if value.is_empty() {
        return None;
    }
    Some(MetadataCommentRule {
        marker,
        header: header.to_string(),
        value: value.to_string(),
        span: ctx.span(0, rest.len() + 1),
        raws: ctx.raws(),
    })
}

fn parse_config(
    marker: CommentMarker,
    rest: &str,
    ctx: &Ctx,
) -> Result<Option<ConfigCommentRule>, AdblockSyntaxError> {
    let body = rest.trim_start();
    let body_start = 1 + rest.len() - body.len();
    let command_len = body.find(char::is_whitespace).unwrap_or(body.len());
    let command = &body[..command_len];
    if !CONFIG_COMMANDS.contains(&command) {
        return Ok(None);
    }

    let after = &body[command_len..];
    let (params_text, comment) = match after.find("--") {
        Some(pos) => {
            let comment = after[pos + 2..].trim();
            (&after[..pos], (!comment.is_empty()).then(|| comment.to_string()))
        }
        None => (after, None),
    };
    let params_text = params_text.trim();
    let params_start = body_start + command_len + (after.len() - after.trim_start().len());

    let params = if command == "aglint" {
        if params_text.is_empty() {
            return Err(AdblockSyntaxError::new(
                "Missing configuration object",
                body_start,
                body_start + body.len(),
            ));
        }
        let object = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(params_text)
            .map_err(|e| {
                AdblockSyntaxError::new(
                    format!("Invalid configuration object: {e}"),
                    params_start,
                    params_start + params_text.len(),
                )
            })?;
        Some(ConfigParams::Object(object))
    } else {
        let rules: Vec<String> = params_text
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
        (!rules.is_empty()).then_some(ConfigParams::RuleList(rules))
    };

    Ok(Some(ConfigCommentRule {
        marker,
        command: command.to_string(),
        params,
        comment,
        span: ctx.span(0, rest.len() + 1),
        raws: ctx.raws(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RuleNode;
    use crate::parser::parse_rule;

    fn comment(line: &str) -> CommentRule {
        match parse_rule(line, &ParserOptions::default()).expect("comment parses") {
            RuleNode::Comment(rule) => rule,
            other => panic!("expected comment, got {other:?}"),
        }
    }

    #[test]
    fn agent_with_name_and_version() {
        let agent = parse_agent("Adblock Plus 2.0").expect("agent");
        assert_eq!(agent.adblock, "Adblock Plus");
        assert_eq!(agent.version.as_deref(), Some("2.0"));
        assert_eq!(agent.syntax, AdblockSyntax::Abp);
    }

    #[test]
    fn agent_without_version() {
        let agent = parse_agent("AdGuard").expect("agent");
        assert_eq!(agent.adblock, "AdGuard");
        assert_eq!(agent.version, None);
    }

    #[test]
    fn agent_duplicate_version_points_at_second_version() {
        let err = parse_agent("Adblock Plus 2.0 3.0").expect_err("duplicate");
        assert_eq!(err.message, "Duplicated versions are not allowed");
        assert_eq!((err.start, err.end), (17, 20));
    }

    #[test]
    fn agent_requires_a_name() {
        let err = parse_agent("2.0").expect_err("no name");
        assert_eq!(err.message, "Agent name cannot be empty");
        assert_eq!(
            parse_agent("").expect_err("empty").message,
            "Agent name cannot be empty"
        );
    }

    #[test]
    fn agent_comment_lists_every_agent() {
        let CommentRule::Agent(rule) = comment("[Adblock Plus 2.0; AdGuard]") else {
            panic!("expected agent comment");
        };
        assert_eq!(rule.agents.len(), 2);
        assert_eq!(rule.agents[1].adblock, "AdGuard");
        assert_eq!(rule.agents[1].span, Some(Span::new(19, 26)));
    }

    #[test]
    fn modifier_prefix_is_not_an_agent() {
        let node = parse_rule("[$path=/page]##.ad", &ParserOptions::default()).expect("cosmetic");
        assert!(matches!(node, RuleNode::Cosmetic(_)));
    }

    #[test]
    fn hints_with_params() {
        let CommentRule::Hint(rule) = comment("!+ NOT_OPTIMIZED PLATFORM(windows, mac)") else {
            panic!("expected hint");
        };
        assert_eq!(rule.hints[0].name, "NOT_OPTIMIZED");
        assert_eq!(rule.hints[0].params, None);
        assert_eq!(
            rule.hints[1].params,
            Some(vec!["windows".to_string(), "mac".to_string()])
        );
    }

    #[test]
    fn preprocessor_if_builds_expression() {
        let CommentRule::PreProcessor(rule) = comment("!#if (adguard_app || adguard_ext) && !adguard_ext_safari") else {
            panic!("expected directive");
        };
        let Some(PreProcessorParams::Expression(LogicalExpression::And(left, right))) = rule.params else {
            panic!("expected conjunction");
        };
        assert!(matches!(*left, LogicalExpression::Parenthesis(_)));
        assert_eq!(
            *right,
            LogicalExpression::Not(Box::new(LogicalExpression::Variable("adguard_ext_safari".into())))
        );
    }

    #[test]
    fn preprocessor_errors() {
        let options = ParserOptions::default();
        assert!(parse_rule("!#if", &options).is_err());
        assert!(parse_rule("!#endif now", &options).is_err());
        assert!(parse_rule("!#if (a", &options).is_err());
        assert!(parse_rule("!#include", &options).is_err());
    }

    #[test]
    fn safari_affinity_parameters() {
        let CommentRule::PreProcessor(rule) = comment("!#safari_cb_affinity(general,privacy)") else {
            panic!("expected directive");
        };
        assert_eq!(
            rule.params,
            Some(PreProcessorParams::Parameters(vec!["general".into(), "privacy".into()]))
        );
    }

    #[test]
    fn double_hash_after_bang_is_a_plain_comment() {
        assert!(matches!(comment("!## section"), CommentRule::Simple(_)));
    }

    #[test]
    fn metadata_headers() {
        let CommentRule::Metadata(rule) = comment("! Homepage: https://example.org/list") else {
            panic!("expected metadata");
        };
        assert_eq!(rule.header, "Homepage");
        assert_eq!(rule.value, "https://example.org/list");
        assert!(matches!(comment("! Unknown: value"), CommentRule::Simple(_)));
    }

    #[test]
    fn config_comments() {
        let CommentRule::Config(rule) = comment("! aglint-disable rule-a, rule-b -- noisy") else {
            panic!("expected config");
        };
        assert_eq!(
            rule.params,
            Some(ConfigParams::RuleList(vec!["rule-a".into(), "rule-b".into()]))
        );
        assert_eq!(rule.comment.as_deref(), Some("noisy"));

        let CommentRule::Config(rule) = comment(r#"# aglint {"no-short-rules": "off"}"#) else {
            panic!("expected config");
        };
        assert_eq!(rule.marker, CommentMarker::Hashmark);
        assert!(matches!(rule.params, Some(ConfigParams::Object(ref map)) if map.len() == 1));

        assert!(parse_rule("! aglint {oops", &ParserOptions::default()).is_err());
    }

    #[test]
    fn hash_comment_versus_cosmetic() {
        assert!(matches!(comment("# hosts comment"), CommentRule::Simple(_)));
        let node = parse_rule("##.ad", &ParserOptions::default()).expect("cosmetic");
        assert!(matches!(node, RuleNode::Cosmetic(_)));
        let node = parse_rule("###banner", &ParserOptions::default()).expect("cosmetic");
        assert!(matches!(node, RuleNode::Cosmetic(_)));
    }

    #[test]
    fn hash_section_headers_are_comments() {
        let CommentRule::Simple(rule) = comment("## Section header") else {
            panic!("expected simple comment");
        };
        assert_eq!(rule.marker, CommentMarker::Hashmark);
        assert_eq!(rule.text, "# Section header");

        assert!(matches!(comment("####"), CommentRule::Simple(_)));
        assert!(matches!(comment("##"), CommentRule::Simple(_)));
        assert!(matches!(comment("#### Title ####"), CommentRule::Simple(_)));
    }

    #[test]
    fn hint_errors_name_the_offending_character() {
        let err = parse_rule("!+ NOT_OPTIMIZED é", &ParserOptions::default()).expect_err("bad hint");
        assert_eq!(err.message, "Invalid character 'é' in hint name");
        assert_eq!((err.start, err.end), (17, 19));
    }
}
