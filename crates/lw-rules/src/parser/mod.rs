//! Filter rule parser
//!
//! Classifies one filter-list line and builds its [`RuleNode`].
//!
//! # Architecture
//!
//! Classification order (first match wins):
//!
//! 1. blank line → `Empty`
//! 2. comment sub-parsers (agent, hint, pre-processor, metadata, config, simple)
//! 3. cosmetic rule (a cosmetic separator was found)
//! 4. hosts-file rule, when enabled
//! 5. network rule
//!
//! Sub-parsers work on the trimmed line and report offsets relative to it;
//! [`Ctx`] shifts them back onto the original line.

pub mod comment;
pub mod cosmetic;
pub mod network;

use serde::{Deserialize, Serialize};

use crate::ast::{EmptyRule, InvalidRule, InvalidRuleError, Raws, RuleNode, Span};
use crate::error::AdblockSyntaxError;

pub use comment::{is_comment_line, parse_agent, parse_logical_expression};
pub use network::{find_modifier_separator, parse_modifier_list};

/// Parser configuration.
///
/// Deserializes from JSON with every field optional, so a config file only
/// has to name what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Return `Invalid` nodes instead of errors.
    pub tolerant: bool,
    /// Fill `span` fields.
    pub is_loc_included: bool,
    /// Recognize ABP snippet rules behind `#$#`.
    pub parse_abp_specific_rules: bool,
    /// Recognize `+js()`, `##^`, `:style()` and uBO cosmetic operators.
    pub parse_ubo_specific_rules: bool,
    /// Keep the original line in `raws`.
    pub include_raws: bool,
    /// Turn comment lines into `Empty` nodes.
    pub ignore_comments: bool,
    /// Recognize `/etc/hosts` style lines.
    pub parse_host_rules: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            tolerant: false,
            is_loc_included: true,
            parse_abp_specific_rules: true,
            parse_ubo_specific_rules: true,
            include_raws: true,
            ignore_comments: false,
            parse_host_rules: false,
        }
    }
}

/// Shared state of one parse call.
pub(crate) struct Ctx<'a> {
    pub options: &'a ParserOptions,
    /// Offset of the trimmed text inside the original line.
    pub offset: usize,
    /// The original line.
    pub line: &'a str,
}

impl Ctx<'_> {
    /// Span for a range of the trimmed text, if locations are enabled.
    pub fn span(&self, start: usize, end: usize) -> Option<Span> {
        self.options
            .is_loc_included
            .then(|| Span::new(self.offset + start, self.offset + end))
    }

    /// Span covering the whole original line.
    pub fn line_span(&self) -> Option<Span> {
        self.options
            .is_loc_included
            .then(|| Span::new(0, self.line.len()))
    }

    pub fn raws(&self) -> Option<Raws> {
        self.options.include_raws.then(|| Raws {
            text: self.line.to_string(),
        })
    }
}

/// Parse one filter-list line.
///
/// In tolerant mode syntax errors are folded into an `Invalid` node and this
/// never fails.
pub fn parse_rule(line: &str, options: &ParserOptions) -> Result<RuleNode, AdblockSyntaxError> {
    match parse_rule_strict(line, options) {
        Ok(node) => Ok(node),
        Err(err) if options.tolerant => {
            log::debug!("invalid rule '{}': {}", line, err.message);
            Ok(RuleNode::Invalid(InvalidRule {
                raw: line.to_string(),
                error: InvalidRuleError {
                    name: AdblockSyntaxError::NAME.to_string(),
                    message: err.message,
                    span: options
                        .is_loc_included
                        .then(|| Span::new(err.start, err.end)),
                },
                span: options.is_loc_included.then(|| Span::new(0, line.len())),
            }))
        }
        Err(err) => Err(err),
    }
}

fn parse_rule_strict(line: &str, options: &ParserOptions) -> Result<RuleNode, AdblockSyntaxError> {
    let without_leading = line.trim_start();
    let offset = line.len() - without_leading.len();
    let text = without_leading.trim_end();
    let ctx = Ctx {
        options,
        offset,
        line,
    };

    if text.is_empty() {
        return Ok(RuleNode::Empty(EmptyRule {
            span: ctx.line_span(),
        }));
    }

    if comment::is_comment_line(text) {
        if options.ignore_comments {
            return Ok(RuleNode::Empty(EmptyRule {
                span: ctx.line_span(),
            }));
        }
        return comment::parse_comment(text, &ctx)
            .map(RuleNode::Comment)
            .map_err(|e| e.shifted(offset));
    }

    if let Some(rule) = cosmetic::parse_cosmetic(text, &ctx).map_err(|e| e.shifted(offset))? {
        return Ok(RuleNode::Cosmetic(rule));
    }

    if options.parse_host_rules {
        if let Some(rule) = network::parse_host_rule(text, &ctx) {
            return Ok(RuleNode::Host(rule));
        }
    }

    network::parse_network_rule(text, &ctx)
        .map(RuleNode::Network)
        .map_err(|e| e.shifted(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{RuleCategory, RuleType};

    #[test]
    fn blank_lines_are_empty() {
        let node = parse_rule("   ", &ParserOptions::default()).expect("blank parses");
        assert_eq!(node, RuleNode::Empty(EmptyRule { span: Some(Span::new(0, 3)) }));
    }

    #[test]
    fn classifies_each_category() {
        let options = ParserOptions::default();
        let cases = [
            ("! comment", RuleType::CommentRule),
            ("[Adblock Plus 2.0]", RuleType::AgentCommentRule),
            ("!+ NOT_OPTIMIZED", RuleType::HintCommentRule),
            ("!#if adguard", RuleType::PreProcessorCommentRule),
            ("! Title: List", RuleType::MetadataCommentRule),
            ("! aglint-disable", RuleType::ConfigCommentRule),
            ("example.org##.banner", RuleType::ElementHidingRule),
            ("example.org#$#body { color: red; }", RuleType::CssInjectionRule),
            ("example.org#%#//scriptlet('log')", RuleType::ScriptletInjectionRule),
            ("example.org$$script", RuleType::HtmlFilteringRule),
            ("example.org#%#window.x = 1;", RuleType::JsInjectionRule),
            ("||example.org^$script", RuleType::NetworkRule),
        ];
        for (line, expected) in cases {
            let node = parse_rule(line, &options).expect(line);
            assert_eq!(node.rule_type(), expected, "{line}");
        }
    }

    #[test]
    fn host_rules_need_the_option() {
        let line = "127.0.0.1 ads.example.com";
        let default = parse_rule(line, &ParserOptions::default()).expect("network");
        assert_eq!(default.rule_type(), RuleType::NetworkRule);

        let options = ParserOptions {
            parse_host_rules: true,
            ..ParserOptions::default()
        };
        let host = parse_rule(line, &options).expect("host");
        assert_eq!(host.rule_type(), RuleType::HostRule);
        assert_eq!(host.category(), RuleCategory::Network);
    }

    #[test]
    fn tolerant_mode_wraps_errors() {
        let options = ParserOptions {
            tolerant: true,
            ..ParserOptions::default()
        };
        let node = parse_rule("[Adblock Plus 2.0 3.0]", &options).expect("tolerant never fails");
        match node {
            RuleNode::Invalid(invalid) => {
                assert_eq!(invalid.raw, "[Adblock Plus 2.0 3.0]");
                assert_eq!(invalid.error.name, "AdblockSyntaxError");
                assert_eq!(invalid.error.message, "Duplicated versions are not allowed");
                assert_eq!(invalid.error.span, Some(Span::new(18, 21)));
            }
            other => panic!("expected invalid node, got {other:?}"),
        }
    }

    #[test]
    fn strict_mode_reports_offsets_on_the_original_line() {
        let err = parse_rule("  [Adblock Plus 2.0 3.0]", &ParserOptions::default())
            .expect_err("duplicate version");
        assert_eq!(err.start, 20);
        assert_eq!(err.end, 23);
    }

    #[test]
    fn ignore_comments_yields_empty_nodes() {
        let options = ParserOptions {
            ignore_comments: true,
            is_loc_included: false,
            ..ParserOptions::default()
        };
        let node = parse_rule("! skipped", &options).expect("parses");
        assert_eq!(node, RuleNode::Empty(EmptyRule { span: None }));
    }

    #[test]
    fn raws_and_locations_follow_options() {
        let options = ParserOptions {
            include_raws: false,
            is_loc_included: false,
            ..ParserOptions::default()
        };
        let node = parse_rule("example.org##.banner", &options).expect("parses");
        assert_eq!(node.raw_text(), None);
        assert_eq!(node.span(), None);

        let node = parse_rule("example.org##.banner", &ParserOptions::default()).expect("parses");
        assert_eq!(node.raw_text(), Some("example.org##.banner"));
        assert_eq!(node.span(), Some(Span::new(0, 20)));
    }

    #[test]
    fn options_load_from_partial_json() {
        let options: ParserOptions =
            serde_json::from_str(r#"{"tolerant": true, "parse_host_rules": true}"#).expect("json");
        assert!(options.tolerant);
        assert!(options.parse_host_rules);
        assert!(options.include_raws);
    }
}
