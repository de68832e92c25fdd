//! Cosmetic rule conversion.
//!
//! Selector rewriting works on the raw selector text through the
//! balance-aware helpers in [`crate::css`]; only pseudo-class names and
//! a few argument shapes differ between dialects.

use super::{html, scriptlet};
use crate::ast::{CosmeticBody, CosmeticRule, Domain, Modifier, ModifierList, RuleNode};
use crate::compat::{is_strict_ext_css_pseudo_class, LEGACY_EXT_CSS_ATTRIBUTE_PREFIX};
use crate::css::{self, PseudoCall};
use crate::error::RuleConversionError;
use crate::parser::cosmetic::UBO_MATCHES_PATH;
use crate::syntax::{AdblockSyntax, CosmeticSeparator};

pub(super) const ADG_PATH_MODIFIER: &str = "path";
pub(super) const ADG_DOMAIN_MODIFIER: &str = "domain";

// =============================================================================
// To AdGuard
// =============================================================================

pub(super) fn to_adg(rule: &CosmeticRule) -> Result<Option<Vec<RuleNode>>, RuleConversionError> {
    let body = match &rule.body {
        CosmeticBody::ElementHiding(_) => element_hiding_to_adg(rule).map(|r| vec![RuleNode::Cosmetic(r)]),
        CosmeticBody::CssInjection(_) => css_injection_to_adg(rule).map(|r| vec![RuleNode::Cosmetic(r)]),
        CosmeticBody::Scriptlet(_) => {
            scriptlet::to_adg(rule)?.map(|rules| rules.into_iter().map(RuleNode::Cosmetic).collect())
        }
        CosmeticBody::HtmlFiltering(_) => match html::header_removal_to_adg(rule)? {
            Some(network) => Some(vec![RuleNode::Network(network)]),
            None => html::to_adg(rule)?.map(|rules| rules.into_iter().map(RuleNode::Cosmetic).collect()),
        },
        CosmeticBody::JsInjection(_) => None,
    };

    let modifiers = match (&rule.modifiers, rule.syntax) {
        (Some(_), AdblockSyntax::Ubo) if matches!(rule.body, CosmeticBody::Scriptlet(_)) => {
            return Err(RuleConversionError::new(
                "uBO scriptlet injection rules don't support cosmetic rule modifiers",
            ));
        }
        (Some(list), AdblockSyntax::Ubo) => Some(modifiers_from_ubo(list)?),
        (Some(_), AdblockSyntax::Abp) => {
            return Err(RuleConversionError::new(
                "ABP doesn't support cosmetic rule modifiers",
            ));
        }
        _ => None,
    };

    let mut nodes = match (body, &modifiers) {
        (Some(nodes), _) => nodes,
        (None, Some(_)) => {
            let mut clone = rule.clone();
            clone.syntax = AdblockSyntax::Adg;
            vec![RuleNode::Cosmetic(clone)]
        }
        (None, None) => return Ok(None),
    };

    if let Some(modifiers) = modifiers {
        for node in &mut nodes {
            if let RuleNode::Cosmetic(converted) = node {
                converted.modifiers = Some(modifiers.clone());
            }
        }
    }
    Ok(Some(nodes))
}

fn element_hiding_to_adg(rule: &CosmeticRule) -> Option<CosmeticRule> {
    let CosmeticBody::ElementHiding(body) = &rule.body else {
        return None;
    };
    let selector = selector_to_adg(&body.selector_list);
    let converted_selector = selector.as_deref().unwrap_or(&body.selector_list);

    // The extended separator is forced when needed, never the plain one.
    let separator = if has_strict_ext_css(converted_selector) {
        CosmeticSeparator::element_hiding(rule.exception, true)
    } else {
        rule.separator
    };

    let native = matches!(rule.syntax, AdblockSyntax::Common | AdblockSyntax::Adg);
    if native && separator == rule.separator && selector.is_none() {
        return None;
    }

    let mut converted = rule.clone();
    converted.syntax = AdblockSyntax::Adg;
    converted.separator = separator;
    if let (Some(selector), CosmeticBody::ElementHiding(body)) = (selector, &mut converted.body) {
        body.selector_list = selector;
    }
    Some(converted)
}

fn css_injection_to_adg(rule: &CosmeticRule) -> Option<CosmeticRule> {
    let CosmeticBody::CssInjection(body) = &rule.body else {
        return None;
    };
    let selector = selector_to_adg(&body.selector_list);
    let converted_selector = selector.as_deref().unwrap_or(&body.selector_list);
    let extended = rule.separator.is_extended() || has_strict_ext_css(converted_selector);
    let separator = CosmeticSeparator::css_injection(rule.exception, extended);

    if rule.syntax == AdblockSyntax::Adg && separator == rule.separator && selector.is_none() {
        return None;
    }

    let mut converted = rule.clone();
    converted.syntax = AdblockSyntax::Adg;
    converted.separator = separator;
    if let (Some(selector), CosmeticBody::CssInjection(body)) = (selector, &mut converted.body) {
        body.selector_list = selector;
    }
    Some(converted)
}

/// `:matches-path()` operators become `$path` modifiers.
fn modifiers_from_ubo(list: &ModifierList) -> Result<ModifierList, RuleConversionError> {
    let mut children = Vec::with_capacity(list.children.len());
    for modifier in &list.children {
        if modifier.name != UBO_MATCHES_PATH {
            children.push(modifier.clone());
            continue;
        }
        let value = modifier
            .value
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                RuleConversionError::new(format!("'{UBO_MATCHES_PATH}' operator requires a value"))
            })?;
        let value = if modifier.exception {
            negated_path_regex(value)
        } else if is_regex_pattern(value) {
            escape_modifier_regex(value)
        } else {
            value.to_string()
        };
        children.push(Modifier::new(ADG_PATH_MODIFIER, Some(value), false));
    }
    Ok(ModifierList::new(children))
}

pub(super) fn is_regex_pattern(value: &str) -> bool {
    value.len() > 2 && value.starts_with('/') && value.ends_with('/')
}

/// Characters that would end a `[$...]` modifier value.
fn escape_modifier_regex(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Regex matching every path that the given path pattern does not match.
fn negated_path_regex(value: &str) -> String {
    let inner = if is_regex_pattern(value) {
        value[1..value.len() - 1].to_string()
    } else {
        regex::escape(value).replace('/', "\\/")
    };
    escape_modifier_regex(&format!("/^((?!{inner}).)*$/"))
}

// =============================================================================
// To uBlock Origin
// =============================================================================

pub(super) fn to_ubo(rule: &CosmeticRule) -> Result<Option<Vec<RuleNode>>, RuleConversionError> {
    if rule.syntax == AdblockSyntax::Ubo {
        return Ok(None);
    }

    match &rule.body {
        CosmeticBody::HtmlFiltering(_) => {
            return Ok(html::to_ubo(rule)?.map(|rules| rules.into_iter().map(RuleNode::Cosmetic).collect()));
        }
        CosmeticBody::Scriptlet(_) => {
            return Ok(scriptlet::to_ubo(rule)?.map(|rules| rules.into_iter().map(RuleNode::Cosmetic).collect()));
        }
        CosmeticBody::JsInjection(_) => {
            return Err(RuleConversionError::new(
                "uBO does not support JS injection rules",
            ));
        }
        CosmeticBody::ElementHiding(_) => {
            let plain = matches!(
                rule.separator,
                CosmeticSeparator::ElementHiding | CosmeticSeparator::ElementHidingException
            );
            if plain && rule.modifiers.is_none() {
                return Ok(None);
            }
        }
        CosmeticBody::CssInjection(_) => {}
    }

    let mut converted = rule.clone();
    converted.syntax = AdblockSyntax::Ubo;
    converted.separator = CosmeticSeparator::element_hiding(rule.exception, false);

    match &mut converted.body {
        CosmeticBody::ElementHiding(body) => {
            if let Some(selector) = selector_to_ubo(&body.selector_list) {
                body.selector_list = selector;
            }
        }
        CosmeticBody::CssInjection(body) => {
            if let Some(selector) = selector_to_ubo(&body.selector_list) {
                body.selector_list = selector;
            }
        }
        _ => {}
    }

    if let Some(list) = &rule.modifiers {
        if rule.syntax == AdblockSyntax::Abp {
            return Err(RuleConversionError::new(
                "ABP doesn't support cosmetic rule modifiers",
            ));
        }
        let (modifiers, domains) = modifiers_to_ubo(list)?;
        converted.modifiers = (!modifiers.children.is_empty()).then_some(modifiers);
        if !domains.is_empty() {
            if !converted.domains.is_empty() {
                return Err(RuleConversionError::new(
                    "Rule cannot have both a domain list and a '$domain' modifier",
                ));
            }
            converted.domains = domains;
        }
    }

    Ok(Some(vec![RuleNode::Cosmetic(converted)]))
}

/// `$path` becomes `:matches-path()`, `$domain` moves into the domain list.
fn modifiers_to_ubo(list: &ModifierList) -> Result<(ModifierList, Vec<Domain>), RuleConversionError> {
    let mut children = Vec::new();
    let mut domains = Vec::new();
    for modifier in &list.children {
        let value = modifier.value.as_deref().unwrap_or_default();
        match modifier.name.as_str() {
            ADG_PATH_MODIFIER if !value.is_empty() => {
                children.push(Modifier::new(UBO_MATCHES_PATH, Some(value.to_string()), modifier.exception));
            }
            ADG_DOMAIN_MODIFIER if !value.is_empty() => {
                for item in value.split('|') {
                    match item.strip_prefix('~') {
                        Some(domain) => domains.push(Domain::new(domain, true)),
                        None => domains.push(Domain::new(item, false)),
                    }
                }
            }
            name => {
                return Err(RuleConversionError::new(format!(
                    "Cosmetic rule modifier '{name}' is not supported by uBlock Origin"
                )));
            }
        }
    }
    Ok((ModifierList::new(children), domains))
}

// =============================================================================
// Selectors
// =============================================================================

fn has_strict_ext_css(selector: &str) -> bool {
    selector.contains(LEGACY_EXT_CSS_ATTRIBUTE_PREFIX)
        || css::pseudo_classes(selector)
            .iter()
            .any(|call| is_strict_ext_css_pseudo_class(call.name))
}

/// Apply per-call replacements. Each replacement covers `start..end` of the
/// selector; overlapping ones after the first are skipped.
fn rewrite_pseudo_classes(
    selector: &str,
    rewrite: impl Fn(&PseudoCall<'_>) -> Option<(usize, usize, String)>,
) -> Option<String> {
    let mut replacements: Vec<(usize, usize, String)> =
        css::pseudo_classes(selector).iter().filter_map(&rewrite).collect();
    if replacements.is_empty() {
        return None;
    }
    replacements.sort_by_key(|(start, _, _)| *start);

    let mut out = String::with_capacity(selector.len());
    let mut pos = 0;
    for (start, end, text) in replacements {
        if start < pos {
            continue;
        }
        out.push_str(&selector[pos..start]);
        out.push_str(&text);
        pos = end;
    }
    out.push_str(&selector[pos..]);
    Some(out)
}

fn rename(call: &PseudoCall<'_>, name: &str) -> (usize, usize, String) {
    (call.start, call.start + 1 + call.name.len(), format!(":{name}"))
}

/// ABP and uBO pseudo-classes in AdGuard spelling.
pub(super) fn selector_to_adg(selector: &str) -> Option<String> {
    rewrite_pseudo_classes(selector, |call| match call.name {
        "-abp-contains" | "has-text" => Some(rename(call, "contains")),
        "-abp-has" => Some(rename(call, "has")),
        "matches-css-before" | "matches-css-after" => {
            let pseudo = call.name.trim_start_matches("matches-css-");
            let argument = call.argument?;
            Some((call.start, call.end, format!(":matches-css({pseudo}, {argument})")))
        }
        _ => None,
    })
}

/// AdGuard and ABP pseudo-classes in uBO spelling.
pub(super) fn selector_to_ubo(selector: &str) -> Option<String> {
    rewrite_pseudo_classes(selector, |call| match call.name {
        "contains" | "-abp-contains" => Some(rename(call, "has-text")),
        "-abp-has" => Some(rename(call, "has")),
        "matches-css" => {
            let (pseudo, rest) = call.argument?.split_once(',')?;
            let pseudo = pseudo.trim();
            if pseudo != "before" && pseudo != "after" {
                return None;
            }
            Some((
                call.start,
                call.end,
                format!(":matches-css-{pseudo}({})", rest.trim()),
            ))
        }
        _ => None,
    })
}
