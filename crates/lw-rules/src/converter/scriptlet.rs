//! Scriptlet rule conversion.
//!
//! AdGuard runs uBO and ABP scriptlets under prefixed names (`ubo-`,
//! `abp-`), so converting to AdGuard never needs the alias tables. The way
//! back does: an AdGuard name must map to a uBO scriptlet.

use crate::ast::{CosmeticBody, CosmeticRule, ScriptletBody, ScriptletCall};
use crate::compat::{
    canonical_ubo_scriptlet, scriptlet_by_abp_name, scriptlet_by_adg_name, ADG_ABP_SCRIPTLET_PREFIX,
    ADG_UBO_SCRIPTLET_PREFIX,
};
use crate::error::RuleConversionError;
use crate::syntax::{AdblockSyntax, CosmeticSeparator};

fn calls(rule: &CosmeticRule) -> &[ScriptletCall] {
    match &rule.body {
        CosmeticBody::Scriptlet(body) => &body.calls,
        _ => &[],
    }
}

fn with_call(rule: &CosmeticRule, syntax: AdblockSyntax, separator: CosmeticSeparator, params: Vec<String>) -> CosmeticRule {
    let mut converted = rule.clone();
    converted.syntax = syntax;
    converted.separator = separator;
    converted.body = CosmeticBody::Scriptlet(ScriptletBody {
        calls: vec![ScriptletCall { params }],
    });
    converted
}

// =============================================================================
// Parameter quoting
// =============================================================================

/// Strip matching outer quotes and unescape the quote character.
pub(super) fn unquote(param: &str) -> String {
    let bytes = param.as_bytes();
    if bytes.len() >= 2 {
        let quote = bytes[0];
        if (quote == b'\'' || quote == b'"') && bytes[bytes.len() - 1] == quote {
            let q = quote as char;
            return param[1..param.len() - 1].replace(&format!("\\{q}"), &q.to_string());
        }
    }
    param.to_string()
}

/// Single-quoted AdGuard parameter.
fn quote_adg(param: &str) -> String {
    format!("'{}'", param.replace('\'', "\\'"))
}

/// uBO parameters are unquoted; commas separate them.
fn escape_ubo(param: &str) -> String {
    param.replace(',', "\\,")
}

fn unescape_ubo(param: &str) -> String {
    param.replace("\\,", ",")
}

// =============================================================================
// Conversion
// =============================================================================

pub(super) fn to_adg(rule: &CosmeticRule) -> Result<Option<Vec<CosmeticRule>>, RuleConversionError> {
    let separator = CosmeticSeparator::js_injection(rule.exception);
    match rule.syntax {
        AdblockSyntax::Adg => Ok(None),
        AdblockSyntax::Ubo => {
            let call = calls(rule).first().map(|c| c.params.as_slice()).unwrap_or_default();
            let params = match call.split_first() {
                None => Vec::new(),
                Some((name, args)) => {
                    let mut name = unescape_ubo(name);
                    if !name.ends_with(".js") {
                        name.push_str(".js");
                    }
                    std::iter::once(format!("{ADG_UBO_SCRIPTLET_PREFIX}{name}"))
                        .chain(args.iter().map(|arg| unescape_ubo(arg)))
                        .map(|p| quote_adg(&p))
                        .collect()
                }
            };
            Ok(Some(vec![with_call(rule, AdblockSyntax::Adg, separator, params)]))
        }
        AdblockSyntax::Abp | AdblockSyntax::Common => {
            let rules = calls(rule)
                .iter()
                .filter_map(|call| call.params.split_first())
                .map(|(name, args)| {
                    let params = std::iter::once(format!("{ADG_ABP_SCRIPTLET_PREFIX}{}", unquote(name)))
                        .chain(args.iter().map(|arg| unquote(arg)))
                        .map(|p| quote_adg(&p))
                        .collect();
                    with_call(rule, AdblockSyntax::Adg, separator, params)
                })
                .collect();
            Ok(Some(rules))
        }
    }
}

fn ubo_name_for_adg(name: &str) -> Result<String, RuleConversionError> {
    if let Some(ubo) = name.strip_prefix(ADG_UBO_SCRIPTLET_PREFIX) {
        return Ok(canonical_ubo_scriptlet(ubo).map_or_else(|| ubo.to_string(), str::to_string));
    }
    let info = match name.strip_prefix(ADG_ABP_SCRIPTLET_PREFIX) {
        Some(abp) => scriptlet_by_abp_name(abp),
        None => scriptlet_by_adg_name(name),
    };
    info.and_then(|info| info.ubo.first())
        .map(|ubo| ubo.to_string())
        .ok_or_else(|| {
            RuleConversionError::new(format!(
                "Scriptlet '{name}' has no uBlock Origin equivalent"
            ))
        })
}

pub(super) fn to_ubo(rule: &CosmeticRule) -> Result<Option<Vec<CosmeticRule>>, RuleConversionError> {
    let separator = CosmeticSeparator::element_hiding(rule.exception, false);
    match rule.syntax {
        AdblockSyntax::Ubo => Ok(None),
        AdblockSyntax::Adg => {
            let call = calls(rule).first().map(|c| c.params.as_slice()).unwrap_or_default();
            let params = match call.split_first() {
                None => Vec::new(),
                Some((name, args)) => {
                    let name = ubo_name_for_adg(&unquote(name))?;
                    std::iter::once(name)
                        .chain(args.iter().map(|arg| escape_ubo(&unquote(arg))))
                        .collect()
                }
            };
            Ok(Some(vec![with_call(rule, AdblockSyntax::Ubo, separator, params)]))
        }
        AdblockSyntax::Abp | AdblockSyntax::Common => {
            let mut rules = Vec::new();
            for (name, args) in calls(rule).iter().filter_map(|call| call.params.split_first()) {
                let name = unquote(name);
                let ubo = scriptlet_by_abp_name(&name)
                    .and_then(|info| info.ubo.first())
                    .ok_or_else(|| {
                        RuleConversionError::new(format!(
                            "Snippet '{name}' has no uBlock Origin equivalent"
                        ))
                    })?;
                let params = std::iter::once(ubo.to_string())
                    .chain(args.iter().map(|arg| escape_ubo(&unquote(arg))))
                    .collect();
                rules.push(with_call(rule, AdblockSyntax::Ubo, separator, params));
            }
            Ok(Some(rules))
        }
    }
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
    fn quoting_helpers() {
        assert_eq!(unquote("'a\\'b'"), "a'b");
        assert_eq!(unquote("\"x\""), "x");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(quote_adg("it's"), "'it\\'s'");
    }

    #[test]
    fn ubo_scriptlet_to_adg() {
        let rules = to_adg(&cosmetic("example.com##+js(set, foo\\, bar, 1)"))
            .expect("convert")
            .expect("converted");
        assert_eq!(
            text(rules),
            vec!["example.com#%#//scriptlet('ubo-set.js', 'foo, bar', '1')"]
        );

        let rules = to_adg(&cosmetic("example.com#@#+js()")).expect("convert").expect("converted");
        assert_eq!(text(rules), vec!["example.com#@%#//scriptlet()"]);
    }

    #[test]
    fn abp_snippets_expand_per_call() {
        let rules = to_adg(&cosmetic("example.com#$#abort-on-property-read foo; log 'a b'"))
            .expect("convert")
            .expect("converted");
        assert_eq!(
            text(rules),
            vec![
                "example.com#%#//scriptlet('abp-abort-on-property-read', 'foo')",
                "example.com#%#//scriptlet('abp-log', 'a b')",
            ]
        );
    }

    #[test]
    fn adg_scriptlet_to_ubo() {
        let convert = |line: &str| text(to_ubo(&cosmetic(line)).expect(line).expect("converted"));
        assert_eq!(
            convert("example.com#%#//scriptlet('set-constant', 'a', 'b,c')"),
            vec!["example.com##+js(set-constant.js, a, b\\,c)"]
        );
        assert_eq!(
            convert("example.com#@%#//scriptlet('ubo-aopr', 'x')"),
            vec!["example.com#@#+js(abort-on-property-read.js, x)"]
        );
        assert_eq!(
            convert("example.com#%#//scriptlet('abp-json-prune', 'a')"),
            vec!["example.com##+js(json-prune.js, a)"]
        );
    }

    #[test]
    fn unknown_scriptlets_fail_for_ubo() {
        assert!(to_ubo(&cosmetic("example.com#%#//scriptlet('adg-only')")).is_err());
        assert!(to_ubo(&cosmetic("example.com#$#hide-if-contains ad")).is_err());
    }

    #[test]
    fn native_rules_are_unchanged() {
        assert!(to_adg(&cosmetic("example.com#%#//scriptlet('log')")).expect("ok").is_none());
        assert!(to_ubo(&cosmetic("example.com##+js(set, a, 1)")).expect("ok").is_none());
    }
}
