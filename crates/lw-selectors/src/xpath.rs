//! XPath subset for `:xpath()`.
//!
//! Supported:
//!
//! - location paths: relative, `/...` and `//...`
//! - abbreviated steps `.` and `..`
//! - axes `child`, `parent`, `self`, `ancestor`, `ancestor-or-self`,
//!   `descendant`, `descendant-or-self`, `following-sibling`,
//!   `preceding-sibling`
//! - name tests: a tag name, `*` or `node()`
//! - predicates `[N]`, `[@a]`, `[@a="v"]`, `[contains(@a,"v")]`,
//!   `[contains(text(),"v")]`
//!
//! [`XPath::parse`] returns `None` for anything else and the caller treats
//! the selector as matching nothing.

use std::collections::HashSet;

use crate::dom::{Document, NodeData, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Parent,
    SelfAxis,
    Ancestor,
    AncestorOrSelf,
    Descendant,
    DescendantOrSelf,
    FollowingSibling,
    PrecedingSibling,
}

impl Axis {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Self::Child,
            "parent" => Self::Parent,
            "self" => Self::SelfAxis,
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "following-sibling" => Self::FollowingSibling,
            "preceding-sibling" => Self::PrecedingSibling,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// Element with this (lowercase) name.
    Name(String),
    /// `*`: any element.
    AnyElement,
    /// `node()`: any node.
    AnyNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// 1-based proximity position.
    Position(usize),
    HasAttribute(String),
    AttributeEquals(String, String),
    AttributeContains(String, String),
    TextContains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

impl Step {
    fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

impl XPath {
    pub fn parse(expression: &str) -> Option<Self> {
        let mut rest = expression.trim();
        let mut steps = Vec::new();
        let absolute = rest.starts_with('/');
        if absolute && !rest.starts_with("//") {
            rest = &rest[1..];
        }
        loop {
            if let Some(after) = rest.strip_prefix("//") {
                steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::AnyNode));
                rest = after;
            }
            let (step, after) = parse_step(rest)?;
            steps.push(step);
            rest = after.trim_start();
            if rest.is_empty() {
                break;
            }
            if !rest.starts_with("//") {
                rest = rest.strip_prefix('/')?;
            }
        }
        Some(Self { absolute, steps })
    }

    /// Evaluate from `context`, returning elements in document order.
    pub fn evaluate(&self, doc: &Document, context: NodeId) -> Vec<NodeId> {
        let mut current = vec![if self.absolute { doc.document() } else { context }];
        for step in &self.steps {
            let mut seen = HashSet::new();
            let mut next = Vec::new();
            for &node in &current {
                for found in step.select(doc, node) {
                    if seen.insert(found) {
                        next.push(found);
                    }
                }
            }
            current = next;
        }
        current.retain(|&n| doc.is_element(n));
        doc.sort_document_order(&mut current);
        current
    }
}

fn parse_step(input: &str) -> Option<(Step, &str)> {
    let input = input.trim_start();
    if let Some(rest) = input.strip_prefix("..") {
        return Some((Step::new(Axis::Parent, NodeTest::AnyNode), rest));
    }
    if let Some(rest) = input.strip_prefix('.') {
        return Some((Step::new(Axis::SelfAxis, NodeTest::AnyNode), rest));
    }

    let (axis, input) = match input.find("::") {
        Some(i) if input[..i].chars().all(|c| c.is_ascii_alphabetic() || c == '-') => {
            (Axis::parse(&input[..i])?, &input[i + 2..])
        }
        _ => (Axis::Child, input),
    };

    let (test, mut rest) = if let Some(rest) = input.strip_prefix("node()") {
        (NodeTest::AnyNode, rest)
    } else if let Some(rest) = input.strip_prefix('*') {
        (NodeTest::AnyElement, rest)
    } else {
        let len = input
            .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(input.len());
        if len == 0 {
            return None;
        }
        (NodeTest::Name(input[..len].to_ascii_lowercase()), &input[len..])
    };

    let mut step = Step::new(axis, test);
    while let Some(after) = rest.trim_start().strip_prefix('[') {
        let end = predicate_end(after)?;
        step.predicates.push(parse_predicate(after[..end].trim())?);
        rest = &after[end + 1..];
    }
    Some((step, rest))
}

/// Index of the `]` closing a predicate, skipping quoted strings.
fn predicate_end(input: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn string_literal(input: &str) -> Option<String> {
    let input = input.trim();
    let quote = input.chars().next().filter(|&c| c == '"' || c == '\'')?;
    input
        .strip_prefix(quote)?
        .strip_suffix(quote)
        .filter(|s| !s.contains(quote))
        .map(str::to_string)
}

fn attribute_name(input: &str) -> Option<String> {
    let name = input.trim().strip_prefix('@')?;
    (!name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == ':'))
        .then(|| name.to_ascii_lowercase())
}

fn parse_predicate(input: &str) -> Option<Predicate> {
    if let Ok(position) = input.parse::<usize>() {
        return (position > 0).then_some(Predicate::Position(position));
    }
    if let Some(args) = input.strip_prefix("contains(").and_then(|s| s.strip_suffix(')')) {
        let (target, needle) = args.split_once(',')?;
        let needle = string_literal(needle)?;
        return if target.trim() == "text()" {
            Some(Predicate::TextContains(needle))
        } else {
            Some(Predicate::AttributeContains(attribute_name(target)?, needle))
        };
    }
    match input.split_once('=') {
        Some((name, value)) => Some(Predicate::AttributeEquals(attribute_name(name)?, string_literal(value)?)),
        None => Some(Predicate::HasAttribute(attribute_name(input)?)),
    }
}

impl Step {
    fn select(&self, doc: &Document, node: NodeId) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = axis_nodes(doc, node, self.axis)
            .into_iter()
            .filter(|&n| self.test_node(doc, n))
            .collect();
        for predicate in &self.predicates {
            nodes = match predicate {
                Predicate::Position(position) => nodes.get(position - 1).copied().into_iter().collect(),
                other => nodes.into_iter().filter(|&n| other.matches(doc, n)).collect(),
            };
        }
        nodes
    }

    fn test_node(&self, doc: &Document, node: NodeId) -> bool {
        match &self.test {
            NodeTest::AnyNode => true,
            NodeTest::AnyElement => doc.is_element(node),
            NodeTest::Name(name) => doc.tag_name(node) == Some(name.as_str()),
        }
    }
}

impl Predicate {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match self {
            Self::Position(_) => true,
            Self::HasAttribute(name) => doc.has_attribute(node, name),
            Self::AttributeEquals(name, value) => doc.attribute(node, name) == Some(value.as_str()),
            Self::AttributeContains(name, needle) => doc
                .attribute(node, name)
                .is_some_and(|v| v.contains(needle.as_str())),
            Self::TextContains(needle) => doc
                .children(node)
                .iter()
                .find_map(|&c| match doc.data(c) {
                    NodeData::Text(text) => Some(text.contains(needle.as_str())),
                    _ => None,
                })
                .unwrap_or(false),
        }
    }
}

/// Nodes on `axis` from `node`, in proximity order.
fn axis_nodes(doc: &Document, node: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children(node).to_vec(),
        Axis::Parent => doc.parent(node).into_iter().collect(),
        Axis::SelfAxis => vec![node],
        Axis::Ancestor => doc.ancestors(node).collect(),
        Axis::AncestorOrSelf => std::iter::once(node).chain(doc.ancestors(node)).collect(),
        Axis::Descendant => all_descendants(doc, node),
        Axis::DescendantOrSelf => std::iter::once(node).chain(all_descendants(doc, node)).collect(),
        Axis::FollowingSibling => siblings(doc, node, true),
        Axis::PrecedingSibling => siblings(doc, node, false),
    }
}

fn all_descendants(doc: &Document, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(node).iter().rev().copied().collect();
    while let Some(current) = stack.pop() {
        out.push(current);
        stack.extend(doc.children(current).iter().rev().copied());
    }
    out
}

fn siblings(doc: &Document, node: NodeId, following: bool) -> Vec<NodeId> {
    let Some(parent) = doc.parent(node) else {
        return Vec::new();
    };
    let children = doc.children(parent);
    let Some(position) = children.iter().position(|&c| c == node) else {
        return Vec::new();
    };
    if following {
        children[position + 1..].to_vec()
    } else {
        children[..position].iter().rev().copied().collect()
    }
}
