//! Cosmetic rule sub-parser.
//!
//! Layout of a cosmetic line:
//!
//! ```text
//! [$modifiers]domain1,~domain2<separator>body
//! ```
//!
//! The separator decides how the body is read. uBO-only constructs
//! (`+js()`, `##^`, `:style()`, `:matches-path()`) hide behind the plain
//! `##` separator and are only recognized when enabled in the options.

use super::network::{find_unescaped, modifier_list_at};
use super::{Ctx, ParserOptions};
use crate::ast::{
    CosmeticBody, CosmeticRule, CssInjectionBody, Domain, ElementHidingBody, Modifier, ModifierList,
    ScriptletBody, ScriptletCall,
};
use crate::css;
use crate::error::AdblockSyntaxError;
use crate::syntax::{AdblockSyntax, CosmeticSeparator};

pub const ADG_SCRIPTLET_PREFIX: &str = "//scriptlet(";
pub const UBO_SCRIPTLET_PREFIX: &str = "+js(";
pub const UBO_LEGACY_SCRIPTLET_PREFIX: &str = "script:inject(";
pub const UBO_HTML_MASK: char = '^';
pub const UBO_MATCHES_PATH: &str = "matches-path";
pub const UBO_MATCHES_MEDIA: &str = "matches-media";
pub const UBO_STYLE: &str = "style";
pub const UBO_REMOVE: &str = "remove";
pub const REMOVE_DECLARATION: &str = "remove: true;";

struct ParsedBody {
    syntax: AdblockSyntax,
    body: CosmeticBody,
    /// uBO operators lifted out of the selector.
    modifiers: Option<ModifierList>,
}

impl ParsedBody {
    fn plain(syntax: AdblockSyntax, body: CosmeticBody) -> Self {
        Self {
            syntax,
            body,
            modifiers: None,
        }
    }
}

pub(crate) fn parse_cosmetic(text: &str, ctx: &Ctx) -> Result<Option<CosmeticRule>, AdblockSyntaxError> {
    let mut modifiers = None;
    let mut rest_start = 0;

    if text.starts_with("[$") {
        let close = find_unescaped(text, b']', 2).ok_or_else(|| {
            AdblockSyntaxError::new("Missing closing bracket for modifier list", 0, text.len())
        })?;
        modifiers = Some(modifier_list_at(&text[2..close], 2, ctx)?);
        rest_start = close + 1;
    }

    let Some((sep_rel, separator)) = CosmeticSeparator::find(&text[rest_start..]) else {
        if modifiers.is_some() {
            return Err(AdblockSyntaxError::new(
                "Missing cosmetic rule separator",
                rest_start,
                text.len(),
            ));
        }
        return Ok(None);
    };
    let sep_start = rest_start + sep_rel;
    let body_start = sep_start + separator.as_str().len();

    let domains = parse_domain_list(&text[rest_start..sep_start], rest_start, ctx)?;

    let raw_body = &text[body_start..];
    let body = raw_body.trim();
    if body.is_empty() {
        return Err(AdblockSyntaxError::new(
            "Empty cosmetic rule body",
            body_start,
            text.len(),
        ));
    }
    let body_offset = body_start + (raw_body.len() - raw_body.trim_start().len());

    let parsed = parse_body(separator, body, body_offset, ctx.options)?;

    let syntax = match (&modifiers, parsed.syntax) {
        (Some(_), AdblockSyntax::Abp | AdblockSyntax::Ubo) => {
            return Err(AdblockSyntaxError::new(
                format!(
                    "AdGuard modifier list cannot be used with {} syntax",
                    parsed.syntax
                ),
                0,
                text.len(),
            ));
        }
        (Some(_), _) => AdblockSyntax::Adg,
        (None, syntax) => syntax,
    };

    Ok(Some(CosmeticRule {
        syntax,
        exception: separator.is_exception(),
        modifiers: modifiers.or(parsed.modifiers),
        domains,
        separator,
        body: parsed.body,
        span: ctx.span(0, text.len()),
        raws: ctx.raws(),
    }))
}

fn parse_domain_list(text: &str, base: usize, ctx: &Ctx) -> Result<Vec<Domain>, AdblockSyntaxError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let mut domains = Vec::new();
    let mut start = 0;
    for item in text.split(',') {
        let end = start + item.len();
        let trimmed = item.trim();
        if trimmed.is_empty() {
            return Err(AdblockSyntaxError::new(
                "Empty domain specified in domain list",
                base + start,
                base + end,
            ));
        }
        if trimmed.contains(char::is_whitespace) {
            return Err(AdblockSyntaxError::new(
                format!("Domain '{trimmed}' cannot contain whitespace"),
                base + start,
                base + end,
            ));
        }
        let (exception, value) = match trimmed.strip_prefix('~') {
            Some(value) => (true, value),
            None => (false, trimmed),
        };
        if value.is_empty() {
            return Err(AdblockSyntaxError::new(
                "Exception marker must be followed by a domain",
                base + start,
                base + end,
            ));
        }
        let lead = item.len() - item.trim_start().len();
        domains.push(Domain {
            value: value.to_string(),
            exception,
            span: ctx.span(base + start + lead, base + start + lead + trimmed.len()),
        });
        start = end + 1;
    }
    Ok(domains)
}

fn parse_body(
    separator: CosmeticSeparator,
    body: &str,
    base: usize,
    options: &ParserOptions,
) -> Result<ParsedBody, AdblockSyntaxError> {
    use CosmeticSeparator as Sep;

    match separator {
        Sep::ElementHiding | Sep::ElementHidingException => {
            if !options.parse_ubo_specific_rules {
                return Ok(ParsedBody::plain(
                    AdblockSyntax::Common,
                    element_hiding(body),
                ));
            }
            if body.starts_with(UBO_SCRIPTLET_PREFIX) {
                return parse_ubo_scriptlet(body, UBO_SCRIPTLET_PREFIX.len(), base);
            }
            if body.starts_with(UBO_LEGACY_SCRIPTLET_PREFIX) {
                return parse_ubo_scriptlet(body, UBO_LEGACY_SCRIPTLET_PREFIX.len(), base);
            }
            if body.starts_with(UBO_HTML_MASK) {
                return Ok(ParsedBody::plain(
                    AdblockSyntax::Ubo,
                    CosmeticBody::HtmlFiltering(body.to_string()),
                ));
            }
            parse_ubo_selector(body, base)
        }
        Sep::ExtendedElementHiding | Sep::ExtendedElementHidingException => Ok(ParsedBody::plain(
            AdblockSyntax::Common,
            element_hiding(body),
        )),
        Sep::CssInjection
        | Sep::CssInjectionException
        | Sep::ExtendedCssInjection
        | Sep::ExtendedCssInjectionException => {
            if let Some(injection) = parse_adg_css_injection(body, base)? {
                return Ok(ParsedBody::plain(
                    AdblockSyntax::Adg,
                    CosmeticBody::CssInjection(injection),
                ));
            }
            if !separator.is_extended() && options.parse_abp_specific_rules {
                return parse_abp_snippet(body, base);
            }
            Err(AdblockSyntaxError::new(
                "Invalid CSS injection body",
                base,
                base + body.len(),
            ))
        }
        Sep::JsInjection | Sep::JsInjectionException => {
            if body.starts_with(ADG_SCRIPTLET_PREFIX) {
                return parse_adg_scriptlet(body, base);
            }
            Ok(ParsedBody::plain(
                AdblockSyntax::Adg,
                CosmeticBody::JsInjection(body.to_string()),
            ))
        }
        Sep::HtmlFiltering | Sep::HtmlFilteringException => Ok(ParsedBody::plain(
            AdblockSyntax::Adg,
            CosmeticBody::HtmlFiltering(body.to_string()),
        )),
    }
}

fn element_hiding(selector: &str) -> CosmeticBody {
    CosmeticBody::ElementHiding(ElementHidingBody {
        selector_list: selector.to_string(),
    })
}

// =============================================================================
// uBO selector operators
// =============================================================================

/// `:matches-path(x)` as the whole of `text`.
fn sole_matches_path(text: &str) -> Option<&str> {
    let calls = css::top_level_pseudo_classes(text);
    match calls.as_slice() {
        [call] if call.name == UBO_MATCHES_PATH && call.start == 0 && call.end == text.len() => {
            call.argument
        }
        _ => None,
    }
}

fn required_argument<'a>(
    call: &css::PseudoCall<'a>,
    base: usize,
) -> Result<&'a str, AdblockSyntaxError> {
    match call.argument.map(str::trim) {
        Some(arg) if !arg.is_empty() => Ok(arg),
        _ => Err(AdblockSyntaxError::new(
            format!("':{}' requires a value", call.name),
            base + call.start,
            base + call.end,
        )),
    }
}

/// Lift `:matches-path()`, `:matches-media()`, `:style()` and `:remove()`
/// out of a `##` selector.
fn parse_ubo_selector(body: &str, base: usize) -> Result<ParsedBody, AdblockSyntaxError> {
    let calls = css::top_level_pseudo_classes(body);
    let mut removed: Vec<(usize, usize)> = Vec::new();
    let mut modifiers = Vec::new();
    let mut media = None;
    let mut declarations = None;
    let mut remove = false;

    for call in &calls {
        match call.name {
            UBO_MATCHES_PATH => {
                let value = required_argument(call, base)?;
                modifiers.push(Modifier::new(UBO_MATCHES_PATH, Some(value.to_string()), false));
                removed.push((call.start, call.end));
            }
            "not" => {
                let Some(inner) = call.argument.map(str::trim) else {
                    continue;
                };
                if let Some(value) = sole_matches_path(inner) {
                    let value = value.trim();
                    if value.is_empty() {
                        return Err(AdblockSyntaxError::new(
                            format!("':{UBO_MATCHES_PATH}' requires a value"),
                            base + call.start,
                            base + call.end,
                        ));
                    }
                    modifiers.push(Modifier::new(UBO_MATCHES_PATH, Some(value.to_string()), true));
                    removed.push((call.start, call.end));
                }
            }
            UBO_MATCHES_MEDIA => {
                media = Some(required_argument(call, base)?.to_string());
                removed.push((call.start, call.end));
            }
            UBO_STYLE if call.end == body.len() => {
                declarations = Some(required_argument(call, base)?.to_string());
                removed.push((call.start, call.end));
            }
            UBO_REMOVE if call.end == body.len() => {
                if call.argument.is_some_and(|arg| !arg.trim().is_empty()) {
                    return Err(AdblockSyntaxError::new(
                        "':remove()' does not accept arguments",
                        base + call.start,
                        base + call.end,
                    ));
                }
                remove = true;
                removed.push((call.start, call.end));
            }
            _ => {}
        }
    }

    let selector = strip_ranges(body, &removed);
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(AdblockSyntaxError::new(
            "Selector cannot be empty",
            base,
            base + body.len(),
        ));
    }

    let is_injection = declarations.is_some() || remove;
    if media.is_some() && !is_injection {
        return Err(AdblockSyntaxError::new(
            "':matches-media()' is only supported together with ':style()' or ':remove()'",
            base,
            base + body.len(),
        ));
    }

    let syntax = if is_injection || !modifiers.is_empty() {
        AdblockSyntax::Ubo
    } else {
        AdblockSyntax::Common
    };
    let body = if is_injection {
        CosmeticBody::CssInjection(CssInjectionBody {
            media_query_list: media,
            selector_list: selector.to_string(),
            declaration_list: declarations,
            remove,
        })
    } else {
        element_hiding(selector)
    };

    Ok(ParsedBody {
        syntax,
        body,
        modifiers: (!modifiers.is_empty()).then(|| ModifierList::new(modifiers)),
    })
}

pub(crate) fn strip_ranges(text: &str, ranges: &[(usize, usize)]) -> String {
    let mut sorted = ranges.to_vec();
    sorted.sort_unstable();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for (start, end) in sorted {
        if start >= pos {
            out.push_str(&text[pos..start]);
            pos = end;
        }
    }
    out.push_str(&text[pos..]);
    out
}

// =============================================================================
// CSS injection
// =============================================================================

/// `selector { declarations }` or `@media query { selector { declarations } }`.
///
/// Returns `None` when the body has no declaration block at all.
fn parse_adg_css_injection(
    body: &str,
    base: usize,
) -> Result<Option<CssInjectionBody>, AdblockSyntaxError> {
    let err = |message: &str| AdblockSyntaxError::new(message, base, base + body.len());

    if let Some(after_at) = body.strip_prefix("@media") {
        let open = css::find_top_level(after_at, b'{').ok_or_else(|| err("Missing '{' after media query"))?;
        let media = after_at[..open].trim();
        if media.is_empty() {
            return Err(err("Media query cannot be empty"));
        }
        let inner = after_at[open + 1..]
            .strip_suffix('}')
            .ok_or_else(|| err("Missing closing '}' of media block"))?
            .trim();
        let Some(mut injection) = parse_style_block(inner, base, body.len())? else {
            return Err(err("Media block must contain a style block"));
        };
        injection.media_query_list = Some(media.to_string());
        return Ok(Some(injection));
    }

    parse_style_block(body, base, body.len())
}

fn parse_style_block(
    text: &str,
    base: usize,
    len: usize,
) -> Result<Option<CssInjectionBody>, AdblockSyntaxError> {
    let err = |message: &str| AdblockSyntaxError::new(message, base, base + len);

    let Some(open) = css::find_top_level(text, b'{') else {
        return Ok(None);
    };
    let selector = text[..open].trim();
    if selector.is_empty() {
        return Err(err("Selector cannot be empty"));
    }
    let declarations = text[open + 1..]
        .strip_suffix('}')
        .ok_or_else(|| err("Missing closing '}' of style block"))?
        .trim();
    if declarations.is_empty() {
        return Err(err("Declaration list cannot be empty"));
    }

    let remove = is_remove_declaration(declarations);
    Ok(Some(CssInjectionBody {
        media_query_list: None,
        selector_list: selector.to_string(),
        declaration_list: (!remove).then(|| declarations.to_string()),
        remove,
    }))
}

fn is_remove_declaration(declarations: &str) -> bool {
    let declaration = declarations.trim_end_matches(';').trim();
    match declaration.split_once(':') {
        Some((name, value)) => name.trim() == "remove" && value.trim() == "true",
        None => false,
    }
}

// =============================================================================
// Scriptlets
// =============================================================================

/// Split on unescaped separators; quotes opened at the start of a token hide
/// separators until they close.
pub(crate) fn split_unquoted(s: &str, is_sep: impl Fn(u8) -> bool) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<u8> = None;
    let mut token_start = true;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            token_start = false;
            i += 2;
            continue;
        }
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if is_sep(b) {
            parts.push(&s[start..i]);
            start = i + 1;
            token_start = true;
        } else if (b == b'\'' || b == b'"') && token_start {
            quote = Some(b);
            token_start = false;
        } else if !b.is_ascii_whitespace() {
            token_start = false;
        }
        i += 1;
    }
    parts.push(&s[start.min(s.len())..]);
    parts
}

fn comma_params(inner: &str, base: usize) -> Result<Vec<String>, AdblockSyntaxError> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parts = split_unquoted(inner, |b| b == b',');
    let mut params = Vec::with_capacity(parts.len());
    let mut pos = 0;
    for part in parts {
        let param = part.trim();
        if param.is_empty() {
            return Err(AdblockSyntaxError::new(
                "Scriptlet parameter cannot be empty",
                base + pos,
                base + pos + part.len(),
            ));
        }
        params.push(param.to_string());
        pos += part.len() + 1;
    }
    Ok(params)
}

fn parse_adg_scriptlet(body: &str, base: usize) -> Result<ParsedBody, AdblockSyntaxError> {
    let prefix = ADG_SCRIPTLET_PREFIX.len();
    let Some(inner) = body.strip_suffix(')').map(|b| &b[prefix..]) else {
        return Err(AdblockSyntaxError::new(
            "Missing closing parenthesis of scriptlet call",
            base,
            base + body.len(),
        ));
    };
    let params = comma_params(inner, base + prefix)?;
    Ok(ParsedBody::plain(
        AdblockSyntax::Adg,
        CosmeticBody::Scriptlet(ScriptletBody {
            calls: vec![ScriptletCall { params }],
        }),
    ))
}

fn parse_ubo_scriptlet(body: &str, prefix: usize, base: usize) -> Result<ParsedBody, AdblockSyntaxError> {
    let Some(inner) = body.strip_suffix(')').map(|b| &b[prefix..]) else {
        return Err(AdblockSyntaxError::new(
            "Missing closing parenthesis of scriptlet call",
            base,
            base + body.len(),
        ));
    };
    let params = comma_params(inner, base + prefix)?;
    Ok(ParsedBody::plain(
        AdblockSyntax::Ubo,
        CosmeticBody::Scriptlet(ScriptletBody {
            calls: vec![ScriptletCall { params }],
        }),
    ))
}

/// `name arg arg; name arg`
fn parse_abp_snippet(body: &str, base: usize) -> Result<ParsedBody, AdblockSyntaxError> {
    let calls: Vec<ScriptletCall> = split_unquoted(body, |b| b == b';')
        .into_iter()
        .map(|call| ScriptletCall {
            params: split_unquoted(call, |b| b.is_ascii_whitespace())
                .into_iter()
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        })
        .filter(|call| !call.params.is_empty())
        .collect();
    if calls.is_empty() {
        return Err(AdblockSyntaxError::new(
            "Snippet rule must contain at least one call",
            base,
            base + body.len(),
        ));
    }
    Ok(ParsedBody::plain(
        AdblockSyntax::Abp,
        CosmeticBody::Scriptlet(ScriptletBody { calls }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RuleNode;
    use crate::parser::parse_rule;

    fn cosmetic(line: &str) -> CosmeticRule {
        match parse_rule(line, &ParserOptions::default()).expect("rule parses") {
            RuleNode::Cosmetic(rule) => rule,
            other => panic!("expected cosmetic rule, got {other:?}"),
        }
    }

    fn params(rule: &CosmeticRule) -> Vec<Vec<String>> {
        match &rule.body {
            CosmeticBody::Scriptlet(body) => body.calls.iter().map(|c| c.params.clone()).collect(),
            other => panic!("expected scriptlet body, got {other:?}"),
        }
    }

    #[test]
    fn element_hiding_with_domains() {
        let rule = cosmetic("example.com,~sub.example.com##.ad");
        assert_eq!(rule.syntax, AdblockSyntax::Common);
        assert!(!rule.exception);
        assert_eq!(rule.domains.len(), 2);
        assert!(rule.domains[1].exception);
        assert_eq!(rule.domains[1].value, "sub.example.com");
        assert_eq!(
            rule.body,
            CosmeticBody::ElementHiding(ElementHidingBody { selector_list: ".ad".into() })
        );
    }

    #[test]
    fn exception_follows_separator() {
        let rule = cosmetic("example.com#@#.ad");
        assert!(rule.exception);
        assert_eq!(rule.separator, CosmeticSeparator::ElementHidingException);
    }

    #[test]
    fn adg_modifier_prefix() {
        let rule = cosmetic("[$path=/page]example.com##.ad");
        assert_eq!(rule.syntax, AdblockSyntax::Adg);
        let modifiers = rule.modifiers.expect("modifiers");
        assert_eq!(modifiers.children[0].name, "path");
        assert_eq!(modifiers.children[0].value.as_deref(), Some("/page"));
        assert_eq!(rule.domains[0].value, "example.com");
    }

    #[test]
    fn adg_modifier_prefix_errors() {
        let options = ParserOptions::default();
        assert!(parse_rule("[$path=/page", &options).is_err());
        assert!(parse_rule("[$path=/page]example.com", &options).is_err());
        assert!(parse_rule("[$path=/page]example.com##+js(nobab)", &options).is_err());
    }

    #[test]
    fn ubo_matches_path_becomes_modifier() {
        let rule = cosmetic("example.com##:matches-path(/shop) .ad");
        assert_eq!(rule.syntax, AdblockSyntax::Ubo);
        let modifiers = rule.modifiers.expect("modifiers");
        assert_eq!(modifiers.children, vec![Modifier::new("matches-path", Some("/shop".into()), false)]);
        assert_eq!(
            rule.body,
            CosmeticBody::ElementHiding(ElementHidingBody { selector_list: ".ad".into() })
        );

        let rule = cosmetic("example.com##.ad:not(:matches-path(/shop))");
        let modifiers = rule.modifiers.expect("modifiers");
        assert!(modifiers.children[0].exception);
    }

    #[test]
    fn ubo_css_injection() {
        let rule = cosmetic("example.com##:matches-media((min-width: 100px)) .ad:style(color: red !important)");
        assert_eq!(rule.syntax, AdblockSyntax::Ubo);
        assert_eq!(
            rule.body,
            CosmeticBody::CssInjection(CssInjectionBody {
                media_query_list: Some("(min-width: 100px)".into()),
                selector_list: ".ad".into(),
                declaration_list: Some("color: red !important".into()),
                remove: false,
            })
        );

        let rule = cosmetic("example.com##.ad:remove()");
        assert!(matches!(rule.body, CosmeticBody::CssInjection(ref body) if body.remove));
    }

    #[test]
    fn adg_css_injection() {
        let rule = cosmetic("example.com#$#@media (min-width: 100px) { .ad { display: none; } }");
        assert_eq!(rule.syntax, AdblockSyntax::Adg);
        assert_eq!(
            rule.body,
            CosmeticBody::CssInjection(CssInjectionBody {
                media_query_list: Some("(min-width: 100px)".into()),
                selector_list: ".ad".into(),
                declaration_list: Some("display: none;".into()),
                remove: false,
            })
        );

        let rule = cosmetic("example.com#$?#.ad:has(> a) { remove: true; }");
        assert!(matches!(rule.body, CosmeticBody::CssInjection(ref body) if body.remove && body.declaration_list.is_none()));
    }

    #[test]
    fn scriptlets_in_each_dialect() {
        let adg = cosmetic("example.com#%#//scriptlet('set-constant', 'a.b', 'true')");
        assert_eq!(adg.syntax, AdblockSyntax::Adg);
        assert_eq!(params(&adg), vec![vec!["'set-constant'", "'a.b'", "'true'"]]);

        let ubo = cosmetic("example.com##+js(set-constant, a.b, true)");
        assert_eq!(ubo.syntax, AdblockSyntax::Ubo);
        assert_eq!(params(&ubo), vec![vec!["set-constant", "a.b", "true"]]);

        let abp = cosmetic("example.com#$#log hello; abort-on-property-read 'x y'");
        assert_eq!(abp.syntax, AdblockSyntax::Abp);
        assert_eq!(
            params(&abp),
            vec![vec!["log", "hello"], vec!["abort-on-property-read", "'x y'"]]
        );
    }

    #[test]
    fn ubo_scriptlet_escaped_comma() {
        let rule = cosmetic(r"example.com##+js(rmnt, script, /a\,b/)");
        assert_eq!(params(&rule), vec![vec!["rmnt", "script", r"/a\,b/"]]);
    }

    #[test]
    fn html_and_js_bodies() {
        let ubo = cosmetic("example.com##^script:has-text(ads)");
        assert_eq!(ubo.syntax, AdblockSyntax::Ubo);
        assert_eq!(ubo.body, CosmeticBody::HtmlFiltering("^script:has-text(ads)".into()));

        let adg = cosmetic("example.com$@$script[tag-content=\"ads\"]");
        assert!(adg.exception);
        assert_eq!(adg.syntax, AdblockSyntax::Adg);

        let js = cosmetic("example.com#%#window.ads = false;");
        assert_eq!(js.body, CosmeticBody::JsInjection("window.ads = false;".into()));
    }

    #[test]
    fn ubo_constructs_need_the_option() {
        let options = ParserOptions {
            parse_ubo_specific_rules: false,
            ..ParserOptions::default()
        };
        let RuleNode::Cosmetic(rule) = parse_rule("example.com##+js(nobab)", &options).expect("parses") else {
            panic!("expected cosmetic rule");
        };
        assert_eq!(rule.syntax, AdblockSyntax::Common);
        assert!(matches!(rule.body, CosmeticBody::ElementHiding(_)));
    }

    #[test]
    fn body_and_domain_errors() {
        let options = ParserOptions::default();
        assert!(parse_rule("example.com##", &options).is_err());
        assert!(parse_rule("a.com,,b.com##.ad", &options).is_err());
        assert!(parse_rule("~##.ad", &options).is_err());
        assert!(parse_rule("example.com##:matches-path() .ad", &options).is_err());
        assert!(parse_rule("example.com#$?#just-a-selector", &options).is_err());
    }
}
