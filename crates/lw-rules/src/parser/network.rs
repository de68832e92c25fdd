//! Network and hosts-file rule sub-parsers.

use std::net::IpAddr;

use super::{Ctx, ParserOptions};
use crate::ast::{HostRule, Modifier, ModifierList, NetworkRule};
use crate::error::AdblockSyntaxError;
use crate::syntax::AdblockSyntax;

pub const EXCEPTION_MARKER: &str = "@@";
pub const MODIFIERS_SEPARATOR: u8 = b'$';
pub const MODIFIER_DELIMITER: u8 = b',';
pub const MODIFIER_EXCEPTION_MARKER: char = '~';

/// First occurrence of `needle` at or after `from` that is not escaped by a
/// backslash.
pub(crate) fn find_unescaped(text: &str, needle: u8, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == needle => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Offset of the `$` that starts the modifier list of a network rule body.
///
/// A regex pattern (`/.../`) may itself contain `$`, so for those the list
/// only starts right after the closing slash.
pub fn find_modifier_separator(body: &str) -> Option<usize> {
    if body.starts_with('/') {
        let bytes = body.as_bytes();
        let mut i = 1;
        while i + 1 < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'/' if bytes[i + 1] == MODIFIERS_SEPARATOR => return Some(i + 1),
                _ => i += 1,
            }
        }
        if body.len() > 1 && body.ends_with('/') {
            return None;
        }
    }
    find_unescaped(body, MODIFIERS_SEPARATOR, 0)
}

/// Parse a comma separated modifier list such as `third-party,~script`.
pub fn parse_modifier_list(text: &str) -> Result<ModifierList, AdblockSyntaxError> {
    let options = ParserOptions::default();
    let ctx = Ctx {
        options: &options,
        offset: 0,
        line: text,
    };
    modifier_list_at(text, 0, &ctx)
}

/// `base` is the offset of `text` inside the trimmed line.
pub(crate) fn modifier_list_at(text: &str, base: usize, ctx: &Ctx) -> Result<ModifierList, AdblockSyntaxError> {
    let mut children = Vec::new();
    let mut start = 0;

    loop {
        let end = find_unescaped(text, MODIFIER_DELIMITER, start).unwrap_or(text.len());
        children.push(parse_modifier(&text[start..end], base + start, ctx)?);
        if end >= text.len() {
            break;
        }
        start = end + 1;
    }

    Ok(ModifierList {
        children,
        span: ctx.span(base, base + text.len()),
    })
}

fn parse_modifier(raw: &str, base: usize, ctx: &Ctx) -> Result<Modifier, AdblockSyntaxError> {
    let trimmed = raw.trim();
    let lead = raw.len() - raw.trim_start().len();
    let start = base + lead;
    let end = start + trimmed.len();

    let (exception, body) = match trimmed.strip_prefix(MODIFIER_EXCEPTION_MARKER) {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };

    let (name, value) = match find_unescaped(body, b'=', 0) {
        Some(eq) => (body[..eq].trim(), Some(body[eq + 1..].trim())),
        None => (body, None),
    };

    if name.is_empty() {
        return Err(AdblockSyntaxError::new(
            "Modifier name cannot be empty",
            start,
            end.max(start + 1),
        ));
    }
    if value.is_some_and(str::is_empty) {
        return Err(AdblockSyntaxError::new(
            format!("Value cannot be empty for modifier '{name}'"),
            start,
            end,
        ));
    }

    Ok(Modifier {
        name: name.to_string(),
        value: value.map(str::to_string),
        exception,
        span: ctx.span(start, end),
    })
}

pub(crate) fn parse_network_rule(text: &str, ctx: &Ctx) -> Result<NetworkRule, AdblockSyntaxError> {
    let (exception, body_start) = match text.strip_prefix(EXCEPTION_MARKER) {
        Some(_) => (true, EXCEPTION_MARKER.len()),
        None => (false, 0),
    };
    let body = &text[body_start..];

    let (pattern, modifiers) = match find_modifier_separator(body) {
        Some(sep) => {
            let list_start = body_start + sep + 1;
            (
                &body[..sep],
                Some(modifier_list_at(&text[list_start..], list_start, ctx)?),
            )
        }
        None => (body, None),
    };

    if pattern.is_empty() && modifiers.is_none() {
        return Err(AdblockSyntaxError::new(
            "Network rule must have a pattern or modifiers",
            0,
            text.len(),
        ));
    }

    Ok(NetworkRule {
        syntax: AdblockSyntax::Common,
        exception,
        pattern: pattern.to_string(),
        modifiers,
        span: ctx.span(0, text.len()),
        raws: ctx.raws(),
    })
}

/// `127.0.0.1 example.com www.example.com # comment`
///
/// Returns `None` when the line does not start with an IP address followed by
/// at least one hostname.
pub(crate) fn parse_host_rule(text: &str, ctx: &Ctx) -> Option<HostRule> {
    let (content, comment) = match text.find('#') {
        Some(pos) => {
            let comment = text[pos + 1..].trim();
            (&text[..pos], (!comment.is_empty()).then(|| comment.to_string()))
        }
        None => (text, None),
    };

    let mut tokens = content.split_ascii_whitespace();
    let ip = tokens.next()?;
    ip.parse::<IpAddr>().ok()?;
    let hostnames: Vec<String> = tokens.map(str::to_string).collect();
    if hostnames.is_empty() {
        return None;
    }

    Some(HostRule {
        ip: ip.to_string(),
        hostnames,
        comment,
        span: ctx.span(0, text.len()),
        raws: ctx.raws(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RuleNode;
    use crate::parser::parse_rule;

    fn network(line: &str) -> NetworkRule {
        match parse_rule(line, &ParserOptions::default()).expect("rule parses") {
            RuleNode::Network(rule) => rule,
            other => panic!("expected network rule, got {other:?}"),
        }
    }

    #[test]
    fn blocking_rule_with_modifiers() {
        let rule = network("||example.org^$third-party,~script,domain=a.com|~b.com");
        assert!(!rule.exception);
        assert_eq!(rule.pattern, "||example.org^");
        let modifiers = rule.modifiers.expect("modifiers");
        assert_eq!(modifiers.children.len(), 3);
        assert_eq!(modifiers.children[1], Modifier {
            name: "script".into(),
            value: None,
            exception: true,
            span: Some(crate::ast::Span::new(27, 34)),
        });
        assert_eq!(modifiers.children[2].value.as_deref(), Some("a.com|~b.com"));
    }

    #[test]
    fn exception_rule() {
        let rule = network("@@||example.org^$generichide");
        assert!(rule.exception);
        assert_eq!(rule.pattern, "||example.org^");
    }

    #[test]
    fn regex_pattern_keeps_inner_dollar() {
        let rule = network(r"/ads\d+$/$script");
        assert_eq!(rule.pattern, r"/ads\d+$/");
        assert_eq!(rule.modifiers.expect("modifiers").children[0].name, "script");

        let rule = network("/banner$/");
        assert_eq!(rule.pattern, "/banner$/");
        assert!(rule.modifiers.is_none());
    }

    #[test]
    fn escaped_comma_stays_in_value() {
        let rule = network(r"||example.org^$removeparam=/a\,b/,script");
        let modifiers = rule.modifiers.expect("modifiers");
        assert_eq!(modifiers.children[0].value.as_deref(), Some(r"/a\,b/"));
        assert_eq!(modifiers.children[1].name, "script");
    }

    #[test]
    fn modifier_only_rule() {
        let rule = network("$websocket,domain=example.org");
        assert_eq!(rule.pattern, "");
        assert_eq!(rule.modifiers.expect("modifiers").children.len(), 2);
    }

    #[test]
    fn modifier_errors() {
        let options = ParserOptions::default();
        let err = parse_rule("||example.org^$script,", &options).expect_err("trailing comma");
        assert_eq!(err.message, "Modifier name cannot be empty");
        assert!(parse_rule("||example.org^$=value", &options).is_err());
        assert!(parse_rule("||example.org^$domain=", &options).is_err());
        assert!(parse_rule("@@", &options).is_err());
    }

    #[test]
    fn standalone_modifier_list() {
        let list = parse_modifier_list("~third-party, important").expect("list");
        assert!(list.children[0].exception);
        assert_eq!(list.children[1].name, "important");
    }

    #[test]
    fn host_rules() {
        let options = ParserOptions {
            parse_host_rules: true,
            ..ParserOptions::default()
        };
        let RuleNode::Host(rule) = parse_rule("::1 localhost ip6-localhost # loopback", &options).expect("host") else {
            panic!("expected host rule");
        };
        assert_eq!(rule.ip, "::1");
        assert_eq!(rule.hostnames, vec!["localhost", "ip6-localhost"]);
        assert_eq!(rule.comment.as_deref(), Some("loopback"));

        let node = parse_rule("0.0.0.0", &options).expect("falls back to network");
        assert!(matches!(node, RuleNode::Network(_)));
    }
}
