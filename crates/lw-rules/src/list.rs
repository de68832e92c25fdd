//! Whole filter lists.
//!
//! Lists are parsed line by line in tolerant mode: a broken line becomes an
//! `Invalid` node and the rest of the list still parses.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::RuleNode;
use crate::generator::{generate, generate_preserving};
use crate::parser::{parse_rule, ParserOptions};
use crate::syntax::RuleCategory;

/// One parsed line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// 1-based line number in the source text.
    pub line: usize,
    pub node: RuleNode,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterList {
    pub items: Vec<ListItem>,
}

impl FilterList {
    pub fn nodes(&self) -> impl Iterator<Item = &RuleNode> {
        self.items.iter().map(|item| &item.node)
    }

    pub fn into_nodes(self) -> Vec<RuleNode> {
        self.items.into_iter().map(|item| item.node).collect()
    }

    /// Lines that failed to parse.
    pub fn invalid(&self) -> impl Iterator<Item = &ListItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.node, RuleNode::Invalid(_)))
    }

    pub fn stats(&self) -> ListStats {
        ListStats::from_nodes(self.nodes())
    }
}

/// Parse every line of `text`. `options.tolerant` is forced on.
pub fn parse_filter_list(text: &str, options: &ParserOptions) -> FilterList {
    let options = ParserOptions {
        tolerant: true,
        ..options.clone()
    };

    let mut items = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let node = match parse_rule(line, &options) {
            Ok(node) => node,
            Err(err) => {
                // Tolerant parsing folds errors into `Invalid` nodes.
                log::warn!("line {}: {}", index + 1, err);
                continue;
            }
        };
        if let RuleNode::Invalid(invalid) = &node {
            log::warn!("line {}: {}", index + 1, invalid.error.message);
        }
        items.push(ListItem {
            line: index + 1,
            node,
        });
    }
    FilterList { items }
}

/// Join generated lines with `\n`.
///
/// With `preserve` set, lines that kept their source text are written back
/// verbatim.
pub fn generate_filter_list<'a>(nodes: impl IntoIterator<Item = &'a RuleNode>, preserve: bool) -> String {
    nodes
        .into_iter()
        .map(|node| {
            if preserve {
                generate_preserving(node)
            } else {
                generate(node)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line counts per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListStats {
    pub total: usize,
    pub empty: usize,
    pub invalid: usize,
    pub comment: usize,
    pub cosmetic: usize,
    pub network: usize,
}

impl ListStats {
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a RuleNode>) -> Self {
        let mut stats = Self::default();
        for node in nodes {
            stats.total += 1;
            match node.category() {
                RuleCategory::Empty => stats.empty += 1,
                RuleCategory::Invalid => stats.invalid += 1,
                RuleCategory::Comment => stats.comment += 1,
                RuleCategory::Cosmetic => stats.cosmetic += 1,
                RuleCategory::Network => stats.network += 1,
            }
        }
        stats
    }
}

impl fmt::Display for ListStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lines:    {}", self.total)?;
        writeln!(f, "Empty:    {}", self.empty)?;
        writeln!(f, "Comment:  {}", self.comment)?;
        writeln!(f, "Cosmetic: {}", self.cosmetic)?;
        writeln!(f, "Network:  {}", self.network)?;
        write!(f, "Invalid:  {}", self.invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "[Adblock Plus 2.0]\n\
                        ! Title: Example\n\
                        \n\
                        example.com##.ad\n\
                        ||ads.example^$third-party\n\
                        example.com##\n\
                        @@||example.com^$document\n";

    #[test]
    fn parses_every_line_with_line_numbers() {
        let list = parse_filter_list(LIST, &ParserOptions::default());
        assert_eq!(list.items.len(), 7);
        assert_eq!(list.items[3].line, 4);

        let invalid: Vec<usize> = list.invalid().map(|item| item.line).collect();
        assert_eq!(invalid, vec![6]);
    }

    #[test]
    fn counts_categories() {
        let stats = parse_filter_list(LIST, &ParserOptions::default()).stats();
        assert_eq!(
            stats,
            ListStats {
                total: 7,
                empty: 1,
                invalid: 1,
                comment: 2,
                cosmetic: 1,
                network: 2,
            }
        );
    }

    #[test]
    fn regenerates_the_list() {
        let text = "! comment\nexample.com##.ad\n||ads.example^";
        let list = parse_filter_list(text, &ParserOptions::default());
        assert_eq!(generate_filter_list(list.nodes(), false), text);

        let spaced = "example.com##.ad   \n||a.example^$3p";
        let list = parse_filter_list(spaced, &ParserOptions::default());
        assert_eq!(generate_filter_list(list.nodes(), true), spaced);
    }
}
