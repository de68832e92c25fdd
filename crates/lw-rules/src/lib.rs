//! Listwright Rule Engine
//!
//! This crate parses adblock filter-list lines into a typed AST, writes the AST
//! back out as text, stores it in a compact binary form and converts rules
//! between the AdGuard, uBlock Origin and Adblock Plus dialects.
//!
//! # Architecture
//!
//! Every stage works on one owned [`RuleNode`] tree per line:
//!
//! ```text
//! text -> parser -> RuleNode -> generator  -> text
//!                            -> binary     -> bytes
//!                            -> converter  -> RuleNode(s)
//! ```
//!
//! Dispatch is a `match` over closed enums throughout, so every category/type
//! pair has exactly one parser, generator, encoder and converter arm.
//!
//! # Modules
//!
//! - `ast`: Rule node types
//! - `syntax`: Dialects, categories, rule types, separators and markers
//! - `parser`: Line parser and its comment, cosmetic and network sub-parsers
//! - `generator`: AST to text
//! - `binary`: Versioned binary codec with frequent-value tables
//! - `converter`: Cross-dialect conversion
//! - `compat`: Modifier, redirect, scriptlet and extended-CSS tables
//! - `css`: Balance-aware scanning of selector text
//! - `list`: Whole filter lists
//! - `error`: Error types

pub mod ast;
pub mod binary;
pub mod compat;
pub mod converter;
pub mod css;
pub mod error;
pub mod generator;
pub mod list;
pub mod parser;
pub mod syntax;

// Re-export commonly used types
pub use ast::{CommentRule, CosmeticBody, CosmeticRule, HostRule, Modifier, ModifierList, NetworkRule, RuleNode, Span};
pub use binary::{
    deserialize_rule, deserialize_rules, read_header, serialize_rule, serialize_rules, BinaryInfo, DeserializeError,
    SerializeError, BINARY_SCHEMA_VERSION,
};
pub use converter::{convert, convert_rules, ConversionTarget, NodeConversion};
pub use error::{AdblockSyntaxError, Error, RuleConversionError};
pub use generator::{generate, generate_preserving};
pub use list::{generate_filter_list, parse_filter_list, FilterList, ListItem, ListStats};
pub use parser::{parse_rule, ParserOptions};
pub use syntax::{AdblockSyntax, CosmeticSeparator, RuleCategory, RuleType};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_hiding_rule_end_to_end() {
        let node = parse_rule("example.org##.banner", &ParserOptions::default()).expect("parse");
        assert_eq!(node.category(), RuleCategory::Cosmetic);
        assert_eq!(node.rule_type(), RuleType::ElementHidingRule);
        match &node {
            RuleNode::Cosmetic(rule) => {
                let domains: Vec<&str> = rule.domains.iter().map(|d| d.value.as_str()).collect();
                assert_eq!(domains, vec!["example.org"]);
            }
            other => panic!("expected cosmetic rule, got {other:?}"),
        }
        assert_eq!(generate(&node), "example.org##.banner");
    }

    #[test]
    fn umbrella_error_wraps_every_stage() -> Result<(), Error> {
        let node = parse_rule("example.org##+js(set, a, 1)", &ParserOptions::default())?;
        let nodes = convert(&node, ConversionTarget::Adg)?.into_nodes();
        let bytes = serialize_rules(&nodes)?;
        assert_eq!(deserialize_rules(&bytes)?.len(), 1);

        let err: Error = parse_rule("example.org##", &ParserOptions::default())
            .expect_err("empty selector")
            .into();
        assert!(matches!(err, Error::Syntax(_)));
        Ok(())
    }
}
