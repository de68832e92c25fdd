//! Network rule conversion.
//!
//! Only the modifier list differs between dialects. The rule is rebuilt
//! when at least one modifier changed.

use super::{html, ConversionTarget};
use crate::ast::{Modifier, ModifierList, NetworkRule, RuleNode};
use crate::compat::{
    find_modifier, normalize_modifier_name, redirect_to_adg, redirect_to_ubo, Dialects,
    FIRST_PARTY_ALIASES, REDIRECT_MODIFIERS,
};
use crate::error::RuleConversionError;

const THIRD_PARTY: &str = "third-party";

pub(super) fn convert(
    rule: &NetworkRule,
    target: ConversionTarget,
) -> Result<Option<Vec<RuleNode>>, RuleConversionError> {
    if target == ConversionTarget::Ubo {
        if let Some(cosmetic) = html::header_removal_to_ubo(rule) {
            return Ok(Some(vec![RuleNode::Cosmetic(cosmetic)]));
        }
    }

    let Some(list) = &rule.modifiers else {
        return Ok(None);
    };
    let Some(modifiers) = convert_modifier_list(list, target)? else {
        return Ok(None);
    };

    let mut converted = rule.clone();
    converted.modifiers = Some(modifiers);
    Ok(Some(vec![RuleNode::Network(converted)]))
}

/// Convert a modifier list. Returns `None` when every modifier already fits.
pub fn convert_modifier_list(
    list: &ModifierList,
    target: ConversionTarget,
) -> Result<Option<ModifierList>, RuleConversionError> {
    let mut changed = false;
    let mut children = Vec::with_capacity(list.children.len());
    for modifier in &list.children {
        match convert_modifier(modifier, target)? {
            Some(converted) => {
                changed = true;
                children.push(converted);
            }
            None => children.push(modifier.clone()),
        }
    }
    Ok(changed.then(|| ModifierList {
        children,
        span: list.span,
    }))
}

fn convert_modifier(
    modifier: &Modifier,
    target: ConversionTarget,
) -> Result<Option<Modifier>, RuleConversionError> {
    let name = normalize_modifier_name(&modifier.name);
    let (required, dialect) = match target {
        ConversionTarget::Adg => (Dialects::ADG, "AdGuard"),
        ConversionTarget::Ubo => (Dialects::UBO, "uBlock Origin"),
    };

    // `1p` and `first-party` only exist in uBO and mean `~third-party`.
    if target == ConversionTarget::Adg && FIRST_PARTY_ALIASES.contains(&name) {
        return Ok(Some(Modifier {
            name: THIRD_PARTY.to_string(),
            value: None,
            exception: !modifier.exception,
            span: modifier.span,
        }));
    }

    let mut converted_name = name;
    if let Some(info) = find_modifier(name) {
        if !info.support.contains(required) {
            return Err(RuleConversionError::new(format!(
                "Modifier '{name}' is not supported by {dialect}"
            )));
        }
        if target == ConversionTarget::Adg {
            converted_name = info.name;
        }
    }

    let mut converted_value = modifier.value.clone();
    if REDIRECT_MODIFIERS.contains(&converted_name) {
        if let Some(value) = &modifier.value {
            // Priority suffix: `noop.js:5`.
            let (resource, priority) = match value.split_once(':') {
                Some((resource, priority)) => (resource, Some(priority)),
                None => (value.as_str(), None),
            };
            let mapped = match target {
                ConversionTarget::Adg => redirect_to_adg(resource),
                ConversionTarget::Ubo => redirect_to_ubo(resource),
            };
            if let Some(mapped) = mapped {
                converted_value = Some(match priority {
                    Some(priority) => format!("{mapped}:{priority}"),
                    None => mapped.to_string(),
                });
            }
        }
    }

    if converted_name == modifier.name && converted_value == modifier.value {
        return Ok(None);
    }
    log::debug!(
        "modifier '{}' converted to '{}' for {}",
        modifier.name,
        converted_name,
        dialect
    );
    Ok(Some(Modifier {
        name: converted_name.to_string(),
        value: converted_value,
        exception: modifier.exception,
        span: modifier.span,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use crate::parser::{parse_rule, ParserOptions};

    fn network(line: &str) -> NetworkRule {
        match parse_rule(line, &ParserOptions::default()).expect(line) {
            RuleNode::Network(rule) => rule,
            other => panic!("expected network rule, got {other:?}"),
        }
    }

    fn text(line: &str, target: ConversionTarget) -> Option<String> {
        convert(&network(line), target)
            .expect(line)
            .map(|nodes| nodes.iter().map(generate).collect::<Vec<_>>().join("\n"))
    }

    #[test]
    fn aliases_become_canonical_for_adg() {
        assert_eq!(
            text("||example.org^$3p,xhr,css,frame,doc,ghide,ehide,shide", ConversionTarget::Adg),
            Some(
                "||example.org^$third-party,xmlhttprequest,stylesheet,subdocument,document,generichide,elemhide,specifichide"
                    .to_string()
            )
        );
        assert_eq!(
            text("||example.org^$script,domain=a.com", ConversionTarget::Adg),
            None
        );
    }

    #[test]
    fn first_party_flips_third_party() {
        assert_eq!(
            text("||example.org^$1p", ConversionTarget::Adg),
            Some("||example.org^$~third-party".to_string())
        );
        assert_eq!(
            text("||example.org^$~first-party", ConversionTarget::Adg),
            Some("||example.org^$third-party".to_string())
        );
    }

    #[test]
    fn redirect_resources_are_renamed() {
        assert_eq!(
            text("||example.org^$script,redirect=noop.js:5", ConversionTarget::Adg),
            Some("||example.org^$script,redirect=noopjs:5".to_string())
        );
        assert_eq!(
            text("||example.org^$redirect-rule=noopjs", ConversionTarget::Ubo),
            Some("||example.org^$redirect-rule=noop.js".to_string())
        );
    }

    #[test]
    fn noop_runs_are_normalized() {
        assert_eq!(
            text("||example.org^$___,script", ConversionTarget::Adg),
            Some("||example.org^$_,script".to_string())
        );
    }

    #[test]
    fn dialect_only_modifiers_fail() {
        let err = convert(&network("||example.org^$strict1p"), ConversionTarget::Adg)
            .expect_err("uBO only");
        assert_eq!(err.0, "Modifier 'strict1p' is not supported by AdGuard");
        assert!(convert(&network("||example.org^$stealth"), ConversionTarget::Ubo).is_err());
        assert!(convert(&network("||example.org^$removeheader=x,script"), ConversionTarget::Ubo).is_err());
    }

    #[test]
    fn removeheader_becomes_response_header_for_ubo() {
        assert_eq!(
            text("||example.org^$removeheader=refresh", ConversionTarget::Ubo),
            Some("example.org##^responseheader(refresh)".to_string())
        );
    }

    #[test]
    fn rules_without_modifiers_are_unchanged() {
        assert_eq!(text("||example.org^", ConversionTarget::Adg), None);
        assert_eq!(text("/banner/", ConversionTarget::Ubo), None);
    }
}
