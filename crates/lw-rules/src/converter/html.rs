//! HTML filtering and response header removal.
//!
//! ```text
//! uBO:  example.com##^script:has-text(ad):min-text-length(10)
//! ADG:  example.com$$script[tag-content="ad"][min-length="10"]
//!
//! uBO:  example.com##^responseheader(refresh)
//! ADG:  ||example.com^$removeheader=refresh
//! ```

use crate::ast::{CosmeticBody, CosmeticRule, Domain, Modifier, ModifierList, NetworkRule};
use crate::css;
use crate::error::RuleConversionError;
use crate::parser::cosmetic::{strip_ranges, UBO_HTML_MASK};
use crate::syntax::{AdblockSyntax, CosmeticSeparator};

const UBO_RESPONSEHEADER: &str = "responseheader";
const ADG_REMOVEHEADER: &str = "removeheader";
const URL_START: &str = "||";
const URL_SEPARATOR: &str = "^";

const UBO_HAS_TEXT: &str = "has-text";
const UBO_MIN_TEXT_LENGTH: &str = "min-text-length";
const ADG_TAG_CONTENT: &str = "tag-content";
const ADG_MIN_LENGTH: &str = "min-length";

fn html_body(rule: &CosmeticRule) -> &str {
    match &rule.body {
        CosmeticBody::HtmlFiltering(body) => body.trim(),
        _ => "",
    }
}

// =============================================================================
// Header removal
// =============================================================================

/// `##^responseheader(name)` as an AdGuard `$removeheader` network rule.
///
/// Returns `None` when the body is not a header removal.
pub(super) fn header_removal_to_adg(rule: &CosmeticRule) -> Result<Option<NetworkRule>, RuleConversionError> {
    let Some(call) = html_body(rule).strip_prefix(UBO_HTML_MASK) else {
        return Ok(None);
    };
    let call = call.trim_start();
    let Some(after_name) = call.strip_prefix(UBO_RESPONSEHEADER) else {
        return Ok(None);
    };
    if !after_name.starts_with('(') {
        return Ok(None);
    }
    let close = css::find_closing_paren(after_name, 0).ok_or_else(|| {
        RuleConversionError::new(format!("Unclosed '{UBO_RESPONSEHEADER}' function"))
    })?;
    let param = after_name[1..close].trim();
    if param.is_empty() {
        return Err(RuleConversionError::new(format!(
            "Empty parameter for '{UBO_RESPONSEHEADER}' function"
        )));
    }
    let trailing = after_name[close + 1..].trim();
    if !trailing.is_empty() {
        return Err(RuleConversionError::new(format!(
            "Expected end of rule, but got '{trailing}'"
        )));
    }

    let pattern = match rule.domains.as_slice() {
        [] => String::new(),
        [domain] => format!("{URL_START}{}{URL_SEPARATOR}", domain.value),
        _ => {
            return Err(RuleConversionError::new(
                "Multiple domains are not supported yet",
            ));
        }
    };

    Ok(Some(NetworkRule {
        syntax: AdblockSyntax::Adg,
        exception: rule.exception,
        pattern,
        modifiers: Some(ModifierList::new(vec![Modifier::new(
            ADG_REMOVEHEADER,
            Some(param.to_string()),
            false,
        )])),
        span: None,
        raws: None,
    }))
}

/// `||domain^$removeheader=name` as a uBO `##^responseheader(name)` rule.
///
/// Returns `None` for any other network rule.
pub(super) fn header_removal_to_ubo(rule: &NetworkRule) -> Option<CosmeticRule> {
    let modifiers = rule.modifiers.as_ref()?;
    let [modifier] = modifiers.children.as_slice() else {
        return None;
    };
    if modifier.name != ADG_REMOVEHEADER || modifier.exception {
        return None;
    }
    let header = modifier.value.as_deref().filter(|v| !v.is_empty())?;
    let domains = if rule.pattern.is_empty() {
        Vec::new()
    } else {
        let domain = rule
            .pattern
            .strip_prefix(URL_START)?
            .strip_suffix(URL_SEPARATOR)?;
        if domain.is_empty() || domain.contains(['/', '*', '^', '|']) {
            return None;
        }
        vec![Domain::new(domain, false)]
    };

    Some(CosmeticRule {
        syntax: AdblockSyntax::Ubo,
        exception: rule.exception,
        modifiers: None,
        domains,
        separator: CosmeticSeparator::element_hiding(rule.exception, false),
        body: CosmeticBody::HtmlFiltering(format!("{UBO_HTML_MASK}{UBO_RESPONSEHEADER}({header})")),
        span: rule.span,
        raws: None,
    })
}

// =============================================================================
// HTML filtering
// =============================================================================

fn quote_attribute(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// uBO HTML filter to AdGuard. One AdGuard rule per selector in the list.
pub(super) fn to_adg(rule: &CosmeticRule) -> Result<Option<Vec<CosmeticRule>>, RuleConversionError> {
    if rule.syntax != AdblockSyntax::Ubo {
        return Ok(None);
    }

    let mut rules = Vec::new();
    for part in css::split_top_level(html_body(rule), b',') {
        let part = part.trim();
        let selector = part.strip_prefix(UBO_HTML_MASK).unwrap_or(part).trim();
        if selector.is_empty() {
            return Err(RuleConversionError::new("HTML filtering selector cannot be empty"));
        }

        let mut removed = Vec::new();
        let mut attributes = String::new();
        for call in css::top_level_pseudo_classes(selector) {
            let argument = call.argument.map(str::trim).unwrap_or_default();
            let attribute = match call.name {
                UBO_HAS_TEXT => ADG_TAG_CONTENT,
                UBO_MIN_TEXT_LENGTH => ADG_MIN_LENGTH,
                name => {
                    return Err(RuleConversionError::new(format!(
                        "Pseudo-class ':{name}' is not supported in AdGuard HTML filtering rules"
                    )));
                }
            };
            if argument.is_empty() {
                return Err(RuleConversionError::new(format!(
                    "':{}' requires an argument",
                    call.name
                )));
            }
            if call.name == UBO_HAS_TEXT && argument.len() > 1 && argument.starts_with('/') {
                return Err(RuleConversionError::new(
                    "Regular expressions in ':has-text()' cannot be converted to AdGuard",
                ));
            }
            attributes.push_str(&format!("[{attribute}={}]", quote_attribute(argument)));
            removed.push((call.start, call.end));
        }

        let mut converted = rule.clone();
        converted.syntax = AdblockSyntax::Adg;
        converted.separator = CosmeticSeparator::html_filtering(rule.exception);
        converted.body = CosmeticBody::HtmlFiltering(format!(
            "{}{attributes}",
            strip_ranges(selector, &removed).trim()
        ));
        rules.push(converted);
    }
    Ok(Some(rules))
}

/// Parsed `[name="value"]` of an AdGuard HTML filter.
struct Attribute<'a> {
    start: usize,
    end: usize,
    name: &'a str,
    value: String,
}

/// Top-level attribute selectors of `selector`.
fn attributes(selector: &str) -> Result<Vec<Attribute<'_>>, RuleConversionError> {
    let bytes = selector.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'[' {
            i += 1;
            continue;
        }
        let start = i;
        let eq = selector[start..]
            .find(['=', ']'])
            .map(|p| start + p)
            .ok_or_else(|| RuleConversionError::new("Unclosed attribute selector"))?;
        let name = selector[start + 1..eq].trim();
        if bytes[eq] == b']' {
            out.push(Attribute { start, end: eq + 1, name, value: String::new() });
            i = eq + 1;
            continue;
        }

        // Quoted value; a doubled quote is a literal quote.
        let mut j = eq + 1;
        let quote = bytes.get(j).copied().filter(|q| *q == b'"' || *q == b'\'');
        let mut value = String::new();
        match quote {
            Some(q) => {
                j += 1;
                loop {
                    let Some(&b) = bytes.get(j) else {
                        return Err(RuleConversionError::new("Unclosed attribute value"));
                    };
                    if b == q {
                        if bytes.get(j + 1) == Some(&q) {
                            value.push(q as char);
                            j += 2;
                            continue;
                        }
                        j += 1;
                        break;
                    }
                    let c = selector[j..].chars().next().unwrap_or_default();
                    value.push(c);
                    j += c.len_utf8();
                }
            }
            None => {
                let close = selector[j..]
                    .find(']')
                    .ok_or_else(|| RuleConversionError::new("Unclosed attribute selector"))?;
                value.push_str(selector[j..j + close].trim());
                j += close;
            }
        }
        if bytes.get(j) != Some(&b']') {
            return Err(RuleConversionError::new("Unclosed attribute selector"));
        }
        out.push(Attribute { start, end: j + 1, name, value });
        i = j + 1;
    }
    Ok(out)
}

/// AdGuard HTML filter to uBO.
pub(super) fn to_ubo(rule: &CosmeticRule) -> Result<Option<Vec<CosmeticRule>>, RuleConversionError> {
    if rule.syntax == AdblockSyntax::Ubo {
        return Ok(None);
    }

    let selector = html_body(rule);
    let mut removed = Vec::new();
    let mut pseudo_classes = String::new();
    for attribute in attributes(selector)? {
        let pseudo = match attribute.name {
            ADG_TAG_CONTENT => UBO_HAS_TEXT,
            ADG_MIN_LENGTH => UBO_MIN_TEXT_LENGTH,
            "max-length" | "wildcard" => {
                return Err(RuleConversionError::new(format!(
                    "Attribute '{}' is not supported by uBlock Origin",
                    attribute.name
                )));
            }
            _ => continue,
        };
        pseudo_classes.push_str(&format!(":{pseudo}({})", attribute.value));
        removed.push((attribute.start, attribute.end));
    }

    let mut converted = rule.clone();
    converted.syntax = AdblockSyntax::Ubo;
    converted.separator = CosmeticSeparator::element_hiding(rule.exception, false);
    converted.body = CosmeticBody::HtmlFiltering(format!(
        "{UBO_HTML_MASK}{}{pseudo_classes}",
        strip_ranges(selector, &removed).trim()
    ));
    Ok(Some(vec![converted]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RuleNode;
    use crate::generator::generate;
    use crate::parser::{parse_rule, ParserOptions};

    fn cosmetic(line: &str) -> CosmeticRule {
        match parse_rule(line, &ParserOptions::default()).expect(line) {
            RuleNode::Cosmetic(rule) => rule,
            other => panic!("expected cosmetic rule, got {other:?}"),
        }
    }

    fn text(rules: Vec<CosmeticRule>) -> Vec<String> {
        rules.into_iter().map(|r| generate(&RuleNode::Cosmetic(r))).collect()
    }

    #[test]
    fn response_header_to_removeheader() {
        let network = header_removal_to_adg(&cosmetic("example.com##^responseheader(refresh)"))
            .expect("convert")
            .expect("header removal");
        assert_eq!(generate(&RuleNode::Network(network)), "||example.com^$removeheader=refresh");

        let network = header_removal_to_adg(&cosmetic("example.com#@#^responseheader(x)"))
            .expect("convert")
            .expect("header removal");
        assert_eq!(generate(&RuleNode::Network(network)), "@@||example.com^$removeheader=x");
    }

    #[test]
    fn response_header_errors() {
        assert!(header_removal_to_adg(&cosmetic("a.com,b.com##^responseheader(x)")).is_err());
        assert!(header_removal_to_adg(&cosmetic("a.com##^responseheader( )")).is_err());
        assert!(header_removal_to_adg(&cosmetic("a.com##^responseheader(x) div")).is_err());
        assert_eq!(header_removal_to_adg(&cosmetic("a.com##^script")).expect("ok"), None);
    }

    #[test]
    fn removeheader_back_to_response_header() {
        let network = match parse_rule("||example.com^$removeheader=refresh", &ParserOptions::default())
            .expect("network")
        {
            RuleNode::Network(rule) => rule,
            other => panic!("expected network rule, got {other:?}"),
        };
        let cosmetic = header_removal_to_ubo(&network).expect("header removal");
        assert_eq!(
            generate(&RuleNode::Cosmetic(cosmetic)),
            "example.com##^responseheader(refresh)"
        );
    }

    #[test]
    fn ubo_html_filter_to_adg() {
        let rules = to_adg(&cosmetic("example.com##^script:has-text(ad\"s):min-text-length(10), ^div"))
            .expect("convert")
            .expect("converted");
        assert_eq!(
            text(rules),
            vec![
                r#"example.com$$script[tag-content="ad""s"][min-length="10"]"#,
                "example.com$$div",
            ]
        );
        assert!(to_adg(&cosmetic("example.com##^script:has-text(/re/)")).is_err());
        assert!(to_adg(&cosmetic("example.com##^script:upward(1)")).is_err());
    }

    #[test]
    fn adg_html_filter_to_ubo() {
        let rules = to_ubo(&cosmetic(r#"example.com$@$script[id="x"][tag-content="a""b"]"#))
            .expect("convert")
            .expect("converted");
        assert_eq!(
            text(rules),
            vec![r#"example.com#@#^script[id="x"]:has-text(a"b)"#]
        );
        assert!(to_ubo(&cosmetic(r#"example.com$$script[max-length="10"]"#)).is_err());
    }
}
