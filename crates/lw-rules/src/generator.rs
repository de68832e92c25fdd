//! Rule text generator
//!
//! Turns a [`RuleNode`] back into filter-list text.
//!
//! [`generate`] always emits the canonical form derived from the node's
//! fields, so `parse(generate(node))` yields a structurally equal node.
//! [`generate_preserving`] returns the original line when the parser kept it.

use crate::ast::{
    Agent, AgentCommentRule, CommentRule, ConfigCommentRule, ConfigParams, CosmeticBody,
    CosmeticRule, CssInjectionBody, Domain, Hint, HintCommentRule, HostRule, LogicalExpression,
    MetadataCommentRule, Modifier, ModifierList, NetworkRule, PreProcessorCommentRule,
    PreProcessorParams, RuleNode, ScriptletBody, SimpleCommentRule,
};
use crate::parser::comment::DIRECTIVE_SAFARI_CB_AFFINITY;
use crate::parser::cosmetic::{
    ADG_SCRIPTLET_PREFIX, REMOVE_DECLARATION, UBO_MATCHES_MEDIA, UBO_REMOVE,
    UBO_SCRIPTLET_PREFIX, UBO_STYLE,
};
use crate::syntax::AdblockSyntax;

/// Canonical text of a node.
pub fn generate(node: &RuleNode) -> String {
    match node {
        RuleNode::Empty(_) => String::new(),
        RuleNode::Invalid(rule) => rule.raw.clone(),
        RuleNode::Comment(rule) => generate_comment(rule),
        RuleNode::Cosmetic(rule) => generate_cosmetic(rule),
        RuleNode::Network(rule) => generate_network(rule),
        RuleNode::Host(rule) => generate_host(rule),
    }
}

/// Original text when available, canonical text otherwise.
pub fn generate_preserving(node: &RuleNode) -> String {
    match node.raw_text() {
        Some(raw) => raw.to_string(),
        None => generate(node),
    }
}

// =============================================================================
// Comments
// =============================================================================

pub fn generate_comment(rule: &CommentRule) -> String {
    match rule {
        CommentRule::Agent(rule) => generate_agent_comment(rule),
        CommentRule::Hint(rule) => generate_hint_comment(rule),
        CommentRule::PreProcessor(rule) => generate_preprocessor(rule),
        CommentRule::Metadata(rule) => generate_metadata(rule),
        CommentRule::Config(rule) => generate_config(rule),
        CommentRule::Simple(SimpleCommentRule { marker, text, .. }) => {
            format!("{}{}", marker.as_char(), text)
        }
    }
}

pub fn generate_agent(agent: &Agent) -> String {
    match &agent.version {
        Some(version) => format!("{} {}", agent.adblock, version),
        None => agent.adblock.clone(),
    }
}

fn generate_agent_comment(rule: &AgentCommentRule) -> String {
    let agents: Vec<String> = rule.agents.iter().map(generate_agent).collect();
    format!("[{}]", agents.join("; "))
}

fn generate_hint(hint: &Hint) -> String {
    match &hint.params {
        Some(params) => format!("{}({})", hint.name, params.join(", ")),
        None => hint.name.clone(),
    }
}

fn generate_hint_comment(rule: &HintCommentRule) -> String {
    let hints: Vec<String> = rule.hints.iter().map(generate_hint).collect();
    format!("!+ {}", hints.join(" "))
}

pub fn generate_logical_expression(expr: &LogicalExpression) -> String {
    match expr {
        LogicalExpression::Variable(name) => name.clone(),
        LogicalExpression::Not(inner) => format!("!{}", generate_logical_expression(inner)),
        LogicalExpression::And(left, right) => format!(
            "{} && {}",
            generate_logical_expression(left),
            generate_logical_expression(right)
        ),
        LogicalExpression::Or(left, right) => format!(
            "{} || {}",
            generate_logical_expression(left),
            generate_logical_expression(right)
        ),
        LogicalExpression::Parenthesis(inner) => {
            format!("({})", generate_logical_expression(inner))
        }
    }
}

fn generate_preprocessor(rule: &PreProcessorCommentRule) -> String {
    let mut out = format!("!#{}", rule.name);
    match &rule.params {
        None => {}
        Some(PreProcessorParams::Value(value)) => {
            out.push(' ');
            out.push_str(value);
        }
        Some(PreProcessorParams::Parameters(params)) => {
            if rule.name != DIRECTIVE_SAFARI_CB_AFFINITY {
                out.push(' ');
            }
            out.push('(');
            out.push_str(&params.join(","));
            out.push(')');
        }
        Some(PreProcessorParams::Expression(expr)) => {
            out.push(' ');
            out.push_str(&generate_logical_expression(expr));
        }
    }
    out
}

fn generate_metadata(rule: &MetadataCommentRule) -> String {
    format!("{} {}: {}", rule.marker.as_char(), rule.header, rule.value)
}

fn generate_config(rule: &ConfigCommentRule) -> String {
    let mut out = format!("{} {}", rule.marker.as_char(), rule.command);
    match &rule.params {
        None => {}
        Some(ConfigParams::Object(object)) => {
            out.push(' ');
            out.push_str(&serde_json::Value::Object(object.clone()).to_string());
        }
        Some(ConfigParams::RuleList(rules)) => {
            out.push(' ');
            out.push_str(&rules.join(", "));
        }
    }
    if let Some(comment) = &rule.comment {
        out.push_str(" -- ");
        out.push_str(comment);
    }
    out
}

// =============================================================================
// Cosmetic Rules
// =============================================================================

pub fn generate_domain_list(domains: &[Domain]) -> String {
    domains
        .iter()
        .map(|d| {
            if d.exception {
                format!("~{}", d.value)
            } else {
                d.value.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// uBO operators that precede the selector.
fn generate_ubo_operators(modifiers: &ModifierList) -> String {
    let mut out = String::new();
    for modifier in &modifiers.children {
        let value = modifier.value.as_deref().unwrap_or_default();
        let call = format!(":{}({})", modifier.name, value);
        if modifier.exception {
            out.push_str(&format!(":not({call})"));
        } else {
            out.push_str(&call);
        }
    }
    out
}

pub fn generate_cosmetic(rule: &CosmeticRule) -> String {
    let mut out = String::new();

    let ubo_operators = match (&rule.modifiers, rule.syntax) {
        (Some(modifiers), AdblockSyntax::Ubo) => Some(generate_ubo_operators(modifiers)),
        (Some(modifiers), _) => {
            out.push_str("[$");
            out.push_str(&generate_modifier_list(modifiers));
            out.push(']');
            None
        }
        (None, _) => None,
    };

    out.push_str(&generate_domain_list(&rule.domains));
    out.push_str(rule.separator.as_str());
    if let Some(operators) = ubo_operators.filter(|ops| !ops.is_empty()) {
        out.push_str(&operators);
        out.push(' ');
    }
    out.push_str(&generate_cosmetic_body(&rule.body, rule.syntax));
    out
}

/// Body text in the given dialect.
pub fn generate_cosmetic_body(body: &CosmeticBody, syntax: AdblockSyntax) -> String {
    match body {
        CosmeticBody::ElementHiding(body) => body.selector_list.clone(),
        CosmeticBody::CssInjection(body) => {
            if syntax == AdblockSyntax::Ubo {
                generate_ubo_css_injection(body)
            } else {
                generate_adg_css_injection(body)
            }
        }
        CosmeticBody::Scriptlet(body) => generate_scriptlet(body, syntax),
        CosmeticBody::HtmlFiltering(text) | CosmeticBody::JsInjection(text) => text.clone(),
    }
}

fn generate_adg_css_injection(body: &CssInjectionBody) -> String {
    let declarations = if body.remove {
        REMOVE_DECLARATION
    } else {
        body.declaration_list.as_deref().unwrap_or_default()
    };
    let block = format!("{} {{ {} }}", body.selector_list, declarations);
    match &body.media_query_list {
        Some(media) => format!("@media {media} {{ {block} }}"),
        None => block,
    }
}

fn generate_ubo_css_injection(body: &CssInjectionBody) -> String {
    let mut out = String::new();
    if let Some(media) = &body.media_query_list {
        out.push_str(&format!(":{UBO_MATCHES_MEDIA}({media}) "));
    }
    out.push_str(&body.selector_list);
    if body.remove {
        out.push_str(&format!(":{UBO_REMOVE}()"));
    } else {
        let declarations = body.declaration_list.as_deref().unwrap_or_default();
        out.push_str(&format!(":{UBO_STYLE}({declarations})"));
    }
    out
}

fn generate_scriptlet(body: &ScriptletBody, syntax: AdblockSyntax) -> String {
    if syntax == AdblockSyntax::Abp {
        return body
            .calls
            .iter()
            .map(|call| call.params.join(" "))
            .collect::<Vec<_>>()
            .join("; ");
    }

    if body.calls.len() > 1 {
        log::warn!(
            "{} scriptlet rule holds {} calls, only the first is emitted",
            syntax,
            body.calls.len()
        );
    }
    let params = body
        .calls
        .first()
        .map(|call| call.params.join(", "))
        .unwrap_or_default();
    let prefix = if syntax == AdblockSyntax::Ubo {
        UBO_SCRIPTLET_PREFIX
    } else {
        ADG_SCRIPTLET_PREFIX
    };
    format!("{prefix}{params})")
}

// =============================================================================
// Network Rules
// =============================================================================

pub fn generate_modifier(modifier: &Modifier) -> String {
    let mut out = String::new();
    if modifier.exception {
        out.push('~');
    }
    out.push_str(&modifier.name);
    if let Some(value) = &modifier.value {
        out.push('=');
        out.push_str(value);
    }
    out
}

pub fn generate_modifier_list(list: &ModifierList) -> String {
    list.children
        .iter()
        .map(generate_modifier)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn generate_network(rule: &NetworkRule) -> String {
    let mut out = String::new();
    if rule.exception {
        out.push_str("@@");
    }
    out.push_str(&rule.pattern);
    if let Some(modifiers) = &rule.modifiers {
        out.push('$');
        out.push_str(&generate_modifier_list(modifiers));
    }
    out
}

pub fn generate_host(rule: &HostRule) -> String {
    let mut out = rule.ip.clone();
    for hostname in &rule.hostnames {
        out.push(' ');
        out.push_str(hostname);
    }
    if let Some(comment) = &rule.comment {
        out.push_str(" # ");
        out.push_str(comment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_rule, ParserOptions};

    fn options() -> ParserOptions {
        ParserOptions {
            include_raws: false,
            is_loc_included: false,
            parse_host_rules: true,
            ..ParserOptions::default()
        }
    }

    #[test]
    fn canonical_lines_round_trip() {
        let lines = [
            "",
            "! simple comment",
            "# hash comment",
            "[Adblock Plus 2.0; AdGuard]",
            "!+ NOT_OPTIMIZED PLATFORM(windows, mac)",
            "!#if (adguard_app || adguard_ext) && !adguard_ext_safari",
            "!#endif",
            "!#include https://example.org/list.txt",
            "!#safari_cb_affinity(general,privacy)",
            "! Title: Example list",
            "! aglint-disable rule-a, rule-b -- noisy",
            r#"! aglint {"no-short-rules":"off"}"#,
            "example.com,~sub.example.com##.ad",
            "example.com#@#.ad",
            "#?#div:has(> .ad)",
            "[$path=/page,domain=example.com]##.ad",
            "example.com##:matches-path(/shop) .ad",
            "example.com##:not(:matches-path(/shop)) .ad",
            "example.com##:matches-media((min-width: 100px)) .ad:style(color: red)",
            "example.com##.ad:remove()",
            "example.com#$#.ad { display: none; }",
            "example.com#$#@media (min-width: 100px) { .ad { display: none; } }",
            "example.com#$?#.ad:has(> a) { remove: true; }",
            "example.com#%#//scriptlet('set-constant', 'a.b', 'true')",
            "example.com##+js(set-constant, a.b, true)",
            "example.com#$#log hello; abort-on-property-read x",
            "example.com$$script[tag-content=\"ads\"]",
            "example.com##^script:has-text(ads)",
            "example.com#%#window.ads = false;",
            "||example.org^$third-party,~script,domain=a.com|~b.com",
            "@@||example.org^$generichide",
            r"/ads\d+$/$script",
            "127.0.0.1 ads.example.com tracker.example.com # blocked",
        ];
        for line in lines {
            let node = parse_rule(line, &options()).expect(line);
            let text = generate(&node);
            assert_eq!(text, line);
            assert_eq!(parse_rule(&text, &options()).expect(line), node);
        }
    }

    #[test]
    fn preserving_returns_raw_text() {
        let node = parse_rule("example.com#$#.ad   {  display: none; }", &ParserOptions::default())
            .expect("parses");
        assert_eq!(generate(&node), "example.com#$#.ad { display: none; }");
        assert_eq!(generate_preserving(&node), "example.com#$#.ad   {  display: none; }");
    }

    #[test]
    fn extra_calls_are_dropped_for_single_call_dialects() {
        let node = parse_rule("example.com#$#log a; log b", &options()).expect("parses");
        let RuleNode::Cosmetic(rule) = node else {
            panic!("expected cosmetic rule");
        };
        assert_eq!(generate_cosmetic_body(&rule.body, AdblockSyntax::Ubo), "+js(log, a)");
    }
}
