//! Native CSS matching: simple selectors and structural pseudo-classes.

use crate::dom::{Document, NodeData, NodeId};
use crate::parser::{AttributeOperator, AttributeSelector, Selector};

/// Structural pseudo-classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structural {
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
    Root,
    NthChild(Nth),
}

/// `an+b` index formula; `odd` is `2n+1`, `even` is `2n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    pub a: i64,
    pub b: i64,
}

impl Nth {
    pub fn parse(text: &str) -> Option<Self> {
        let text: String = text.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase();
        match text.as_str() {
            "odd" => return Some(Self { a: 2, b: 1 }),
            "even" => return Some(Self { a: 2, b: 0 }),
            _ => {}
        }
        let Some(n) = text.find('n') else {
            return text.parse().ok().map(|b| Self { a: 0, b });
        };
        let a = match &text[..n] {
            "" | "+" => 1,
            "-" => -1,
            coefficient => coefficient.parse().ok()?,
        };
        let b = match &text[n + 1..] {
            "" => 0,
            offset if offset.starts_with('+') || offset.starts_with('-') => offset.parse().ok()?,
            _ => return None,
        };
        Some(Self { a, b })
    }

    /// Whether the 1-based `index` is selected.
    pub fn matches(self, index: i64) -> bool {
        if self.a == 0 {
            return index == self.b;
        }
        let diff = index - self.b;
        diff % self.a == 0 && diff / self.a >= 0
    }
}

/// Match an id, class, type or attribute selector. Anything else is `false`.
pub fn matches_simple(doc: &Document, node: NodeId, selector: &Selector) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };
    match selector {
        Selector::Id(id) => doc.id(node) == Some(id.as_str()),
        Selector::Class(class) => doc.class_list(node).any(|c| c == class),
        Selector::Type(None) => true,
        Selector::Type(Some(name)) => element.name.eq_ignore_ascii_case(name),
        Selector::Attribute(attr) => matches_attribute(doc, node, attr),
        _ => false,
    }
}

fn matches_attribute(doc: &Document, node: NodeId, attr: &AttributeSelector) -> bool {
    let Some(actual) = doc.attribute(node, &attr.name) else {
        return false;
    };
    let Some((op, expected)) = &attr.value else {
        return true;
    };
    let (actual, expected) = if attr.case_insensitive {
        (actual.to_lowercase(), expected.to_lowercase())
    } else {
        (actual.to_string(), expected.clone())
    };
    match op {
        AttributeOperator::Equals => actual == expected,
        AttributeOperator::Includes => actual.split_ascii_whitespace().any(|word| word == expected),
        AttributeOperator::DashMatch => {
            actual == expected || actual.strip_prefix(expected.as_str()).is_some_and(|rest| rest.starts_with('-'))
        }
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

pub fn matches_structural(doc: &Document, node: NodeId, structural: Structural) -> bool {
    if !doc.is_element(node) {
        return false;
    }
    let siblings = || {
        doc.parent(node)
            .map(|parent| doc.element_children(parent).collect::<Vec<_>>())
            .unwrap_or_default()
    };
    match structural {
        Structural::FirstChild => doc.preceding_element_siblings(node).is_empty() && doc.parent(node).is_some(),
        Structural::LastChild => doc.following_element_siblings(node).is_empty() && doc.parent(node).is_some(),
        Structural::OnlyChild => siblings().len() == 1,
        Structural::Empty => doc.children(node).iter().all(|&child| match doc.data(child) {
            NodeData::Text(text) => text.is_empty(),
            _ => false,
        }),
        Structural::Root => doc.parent(node) == Some(doc.document()),
        Structural::NthChild(nth) => siblings()
            .iter()
            .position(|&sibling| sibling == node)
            .is_some_and(|index| nth.matches(index as i64 + 1)),
    }
}

/// Descendants of `root` matching a simple selector, in document order.
pub fn query_simple(doc: &Document, root: NodeId, selector: &Selector) -> Vec<NodeId> {
    doc.descendants(root)
        .into_iter()
        .filter(|&node| matches_simple(doc, node, selector))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::parser::parse_selector;

    fn select(html: &str, selector: &str) -> Vec<String> {
        let doc = parse_html(html);
        let selector = parse_selector(selector).expect(selector);
        query_simple(&doc, doc.document(), &selector)
            .into_iter()
            .map(|n| doc.text_content(n))
            .collect()
    }

    #[test]
    fn simple_selectors() {
        let html = r#"<div id="a" class="x y">1</div><p class="xy">2</p><p lang="en-US">3</p>"#;
        assert_eq!(select(html, "#a"), vec!["1"]);
        assert_eq!(select(html, ".x"), vec!["1"]);
        assert_eq!(select(html, "P"), vec!["2", "3"]);
        assert_eq!(select(html, "[class]"), vec!["1", "2"]);
        assert_eq!(select(html, "[class~=y]"), vec!["1"]);
        assert_eq!(select(html, "[lang|=en]"), vec!["3"]);
        assert_eq!(select(html, "[class^=x]"), vec!["1", "2"]);
        assert_eq!(select(html, "[class$=y]"), vec!["1", "2"]);
        assert_eq!(select(html, "[class*=\" \"]"), vec!["1"]);
        assert_eq!(select(html, "[lang=EN-us i]"), vec!["3"]);
        assert!(select(html, "[lang=EN-us]").is_empty());
        assert!(select(html, "[class^=\"\"]").is_empty());
    }

    #[test]
    fn nth_formulas() {
        assert_eq!(Nth::parse("odd"), Some(Nth { a: 2, b: 1 }));
        assert_eq!(Nth::parse(" -n + 3 "), Some(Nth { a: -1, b: 3 }));
        assert_eq!(Nth::parse("4"), Some(Nth { a: 0, b: 4 }));
        assert_eq!(Nth::parse("3n2"), None);
        let first_three = Nth { a: -1, b: 3 };
        assert!(first_three.matches(1) && first_three.matches(3) && !first_three.matches(4));
        let even = Nth { a: 2, b: 0 };
        assert!(even.matches(2) && !even.matches(1));
    }

    #[test]
    fn structural() {
        let doc = parse_html("<ul><li>a</li><li></li><li>c</li></ul>");
        let ul = doc.document_element().expect("ul");
        let items: Vec<NodeId> = doc.element_children(ul).collect();
        assert!(matches_structural(&doc, ul, Structural::Root));
        assert!(matches_structural(&doc, ul, Structural::OnlyChild));
        assert!(matches_structural(&doc, items[0], Structural::FirstChild));
        assert!(matches_structural(&doc, items[2], Structural::LastChild));
        assert!(matches_structural(&doc, items[1], Structural::Empty));
        assert!(!matches_structural(&doc, items[0], Structural::Empty));
        assert!(matches_structural(&doc, items[1], Structural::NthChild(Nth { a: 2, b: 0 })));
    }
}
