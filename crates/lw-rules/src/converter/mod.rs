//! Cross-Dialect Rule Converter
//!
//! Rewrites rule nodes so that a target adblocker understands them.
//!
//! # Architecture
//!
//! [`convert`] dispatches on the node category:
//!
//! - comments: `comment`
//! - cosmetic rules: `cosmetic`, which hands scriptlet bodies to `scriptlet`
//!   and HTML filtering bodies to `html`
//! - network rules: `network`, driven by the modifier alias tables in
//!   [`crate::compat`]
//!
//! A node that already fits the target comes back as
//! [`NodeConversion::Unchanged`], borrowing the input. Anything rewritten is a
//! fresh clone, so the input is never mutated. A construct the target cannot
//! express is a [`RuleConversionError`]; nothing is dropped silently.

mod comment;
mod cosmetic;
mod html;
mod network;
mod scriptlet;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ast::RuleNode;
use crate::error::RuleConversionError;
use crate::syntax::AdblockSyntax;

pub use network::convert_modifier_list;

/// Dialect a rule is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionTarget {
    /// AdGuard
    Adg,
    /// uBlock Origin
    Ubo,
}

impl ConversionTarget {
    pub fn syntax(self) -> AdblockSyntax {
        match self {
            Self::Adg => AdblockSyntax::Adg,
            Self::Ubo => AdblockSyntax::Ubo,
        }
    }
}

impl FromStr for ConversionTarget {
    type Err = RuleConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adg" | "adguard" => Ok(Self::Adg),
            "ubo" | "ublock" | "ublock origin" | "ublockorigin" => Ok(Self::Ubo),
            other => Err(RuleConversionError::new(format!(
                "Unknown conversion target '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ConversionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.syntax(), f)
    }
}

/// Outcome of converting one node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConversion<'a> {
    /// The input already fits the target.
    Unchanged(&'a RuleNode),
    /// Freshly built replacement nodes. One input may expand into several.
    Converted(Vec<RuleNode>),
}

impl<'a> NodeConversion<'a> {
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted(_))
    }

    /// Resulting nodes, cloning the input when it was left unchanged.
    pub fn into_nodes(self) -> Vec<RuleNode> {
        match self {
            Self::Unchanged(node) => vec![node.clone()],
            Self::Converted(nodes) => nodes,
        }
    }
}

/// Convert a node to the target dialect.
pub fn convert(
    node: &RuleNode,
    target: ConversionTarget,
) -> Result<NodeConversion<'_>, RuleConversionError> {
    let converted = match (node, target) {
        (RuleNode::Empty(_) | RuleNode::Invalid(_) | RuleNode::Host(_), _) => None,
        (RuleNode::Comment(rule), ConversionTarget::Adg) => comment::to_adg(rule),
        (RuleNode::Comment(_), ConversionTarget::Ubo) => None,
        (RuleNode::Cosmetic(rule), ConversionTarget::Adg) => cosmetic::to_adg(rule)?,
        (RuleNode::Cosmetic(rule), ConversionTarget::Ubo) => cosmetic::to_ubo(rule)?,
        (RuleNode::Network(rule), target) => network::convert(rule, target)?,
    };

    match converted {
        None => Ok(NodeConversion::Unchanged(node)),
        Some(mut nodes) => {
            for converted in &mut nodes {
                converted.clear_raws();
            }
            log::debug!(
                "converted {:?} to {} as {} node(s)",
                node.rule_type(),
                target,
                nodes.len()
            );
            Ok(NodeConversion::Converted(nodes))
        }
    }
}

/// Convert every node, flattening expansions.
pub fn convert_rules(
    nodes: &[RuleNode],
    target: ConversionTarget,
) -> Result<Vec<RuleNode>, RuleConversionError> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        out.extend(convert(node, target)?.into_nodes());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use crate::parser::{parse_rule, ParserOptions};

    fn parse(line: &str) -> RuleNode {
        parse_rule(line, &ParserOptions::default()).expect(line)
    }

    fn convert_text(line: &str, target: ConversionTarget) -> Vec<String> {
        let node = parse(line);
        convert(&node, target)
            .expect(line)
            .into_nodes()
            .iter()
            .map(generate)
            .collect()
    }

    #[test]
    fn target_dialect_nodes_are_returned_by_reference() {
        for (line, target) in [
            ("example.org##.banner", ConversionTarget::Adg),
            ("example.org##.banner", ConversionTarget::Ubo),
            ("example.org#%#//scriptlet('set-constant', 'a', '1')", ConversionTarget::Adg),
            ("example.org##+js(set, a, 1)", ConversionTarget::Ubo),
            ("||example.org^$third-party", ConversionTarget::Adg),
            ("! comment", ConversionTarget::Adg),
            ("", ConversionTarget::Ubo),
        ] {
            let node = parse(line);
            match convert(&node, target).expect(line) {
                NodeConversion::Unchanged(same) => assert!(std::ptr::eq(same, &node), "{line}"),
                NodeConversion::Converted(nodes) => panic!("{line} converted to {nodes:?}"),
            }
        }
    }

    #[test]
    fn converted_nodes_drop_raws_and_leave_input_alone() {
        let node = parse("# hashmark comment");
        let before = node.clone();
        let nodes = convert(&node, ConversionTarget::Adg).expect("convert").into_nodes();
        assert_eq!(node, before);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].raw_text(), None);
    }

    #[test]
    fn matches_path_becomes_path_modifier() {
        assert_eq!(
            convert_text("example.com##p:matches-path(/foo)", ConversionTarget::Adg),
            vec!["[$path=/foo]example.com##p"]
        );
    }

    #[test]
    fn convert_rules_flattens_expansions() {
        let nodes = vec![parse("example.com#$#log a; log b"), parse("! keep")];
        let out = convert_rules(&nodes, ConversionTarget::Adg).expect("convert");
        let text: Vec<String> = out.iter().map(generate).collect();
        assert_eq!(
            text,
            vec![
                "example.com#%#//scriptlet('abp-log', 'a')",
                "example.com#%#//scriptlet('abp-log', 'b')",
                "! keep",
            ]
        );
    }

    #[test]
    fn parses_targets() {
        assert_eq!("adg".parse::<ConversionTarget>(), Ok(ConversionTarget::Adg));
        assert_eq!("uBlock Origin".parse::<ConversionTarget>(), Ok(ConversionTarget::Ubo));
        assert!("abp".parse::<ConversionTarget>().is_err());
        assert_eq!(ConversionTarget::Ubo.to_string(), "uBlockOrigin");
    }
}
