//! Extended Selector Engine
//!
//! Evaluates a [`Selector`] tree against a [`Document`].
//!
//! # Architecture
//!
//! ```text
//! query_selector_all(root, selector)
//!     ├─ simple       → native descendant scan
//!     ├─ list         → union of members
//!     ├─ compound     → first member's results, then traverse(rest)
//!     ├─ complex      → left results, combinator step, traverse(right)
//!     └─ pseudo-class → traverse([selector]) from every descendant
//!
//! traverse(element, selectors)
//!     for each selector in order:
//!         transpose operator (:upward, :xpath) → continue from new elements
//!         otherwise                             → matches() or drop branch
//!
//! matches(element, a > b) checks `b` on the element, then walks back to `a`.
//! ```
//!
//! Every result set is deduplicated and keeps first-seen order.

use std::collections::HashSet;

use crate::dom::{Document, NodeId};
use crate::native::{matches_simple, matches_structural, query_simple};
use crate::parser::{AttrPattern, Combinator, CssPattern, PseudoKind, Selector, Upward};
use crate::pattern::TextPattern;

/// `:upward(N)` only climbs `1..MAX_UPWARD` levels.
pub const MAX_UPWARD: i64 = 256;

// =============================================================================
// Matcher
// =============================================================================

/// Selector evaluation over one document.
#[derive(Clone, Copy)]
pub struct Matcher<'a> {
    doc: &'a Document,
}

impl<'a> Matcher<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Whether `element` itself satisfies `selector`.
    pub fn matches(&self, element: NodeId, selector: &Selector) -> bool {
        match selector {
            Selector::Id(_) | Selector::Class(_) | Selector::Type(_) | Selector::Attribute(_) => {
                matches_simple(self.doc, element, selector)
            }
            Selector::List(members) => members.iter().any(|s| self.matches(element, s)),
            Selector::Compound(members) => members.iter().all(|s| self.matches(element, s)),
            Selector::PseudoClass(pseudo) => self.matches_pseudo(element, &pseudo.kind),
            Selector::Complex {
                left: Some(left),
                combinator,
                right,
            } => self.matches_complex(element, left, *combinator, right),
            // relative selectors only make sense inside `:has()`
            Selector::Complex { left: None, .. } | Selector::PseudoElement(_) => false,
        }
    }

    /// Right to left: `right` must match `element`, then an element reached
    /// backwards through `combinator` must match `left`.
    fn matches_complex(&self, element: NodeId, left: &Selector, combinator: Combinator, right: &Selector) -> bool {
        if !self.matches(element, right) {
            return false;
        }
        let doc = self.doc;
        match combinator {
            Combinator::Descendant => std::iter::successors(doc.parent_element(element), |&n| doc.parent_element(n))
                .any(|ancestor| self.matches(ancestor, left)),
            Combinator::Child => doc.parent_element(element).is_some_and(|parent| self.matches(parent, left)),
            Combinator::NextSibling => doc
                .preceding_element_siblings(element)
                .first()
                .is_some_and(|&sibling| self.matches(sibling, left)),
            Combinator::SubsequentSibling => doc
                .preceding_element_siblings(element)
                .into_iter()
                .any(|sibling| self.matches(sibling, left)),
        }
    }

    fn matches_pseudo(&self, element: NodeId, kind: &PseudoKind) -> bool {
        let doc = self.doc;
        match kind {
            PseudoKind::Has(sub) => !self.query_selector_all(element, sub).is_empty(),
            PseudoKind::HasNot(sub) => self.query_selector_all(element, sub).is_empty(),
            PseudoKind::Not(sub) => self.traverse(element, std::slice::from_ref(sub.as_ref())).is_empty(),
            PseudoKind::Is(sub) => !self.traverse(element, std::slice::from_ref(sub.as_ref())).is_empty(),
            PseudoKind::HasText(pattern) => pattern.is_match(doc.text_content(element).trim()),
            PseudoKind::MinTextLength(Some(min)) => doc.text_content(element).chars().count() >= *min,
            PseudoKind::MinTextLength(None) => false,
            PseudoKind::MatchesPath(pattern) => doc.location().is_some_and(|path| pattern.is_match(path)),
            PseudoKind::MatchesAttr(pattern) => self.matches_attr(element, pattern),
            PseudoKind::MatchesCss(pattern) => self.matches_css(element, pattern),
            PseudoKind::Structural(structural) => matches_structural(doc, element, *structural),
            PseudoKind::Upward(_) | PseudoKind::XPath(_) | PseudoKind::Unsupported => false,
        }
    }

    fn matches_attr(&self, element: NodeId, pattern: &AttrPattern) -> bool {
        let value_matches = |value: &str| pattern.value.as_ref().map_or(true, |p| p.is_match(value));
        match &pattern.name {
            TextPattern::Regex(name) => self
                .doc
                .attributes(element)
                .iter()
                .any(|(attr, value)| name.is_match(attr) && value_matches(value)),
            name => self
                .doc
                .attributes(element)
                .iter()
                .find(|(attr, _)| name.is_match(attr))
                .is_some_and(|(_, value)| value_matches(value)),
        }
    }

    fn matches_css(&self, element: NodeId, pattern: &CssPattern) -> bool {
        match self
            .doc
            .computed_style(element, pattern.pseudo_element.as_deref(), &pattern.property)
        {
            Some(value) => pattern.value.is_match(value),
            None => {
                log::debug!("no computed style for {} on {:?}", pattern.property, element);
                false
            }
        }
    }

    /// Elements a transpose operator moves to, or `None` when `selector`
    /// is not one.
    pub fn transpose(&self, element: NodeId, selector: &Selector) -> Option<Vec<NodeId>> {
        let Selector::PseudoClass(pseudo) = selector else {
            return None;
        };
        match &pseudo.kind {
            PseudoKind::Upward(Upward::Count(count)) => {
                if *count <= 0 || *count >= MAX_UPWARD {
                    return Some(Vec::new());
                }
                let steps = (*count - 1) as usize;
                Some(
                    std::iter::successors(self.doc.parent_element(element), |&n| self.doc.parent_element(n))
                        .nth(steps)
                        .into_iter()
                        .collect(),
                )
            }
            PseudoKind::Upward(Upward::Selector(sub)) => Some(
                std::iter::successors(self.doc.parent_element(element), |&n| self.doc.parent_element(n))
                    .find(|&n| self.matches(n, sub))
                    .into_iter()
                    .collect(),
            ),
            PseudoKind::XPath(Some(xpath)) => Some(xpath.evaluate(self.doc, element)),
            PseudoKind::XPath(None) => Some(Vec::new()),
            _ => None,
        }
    }

    /// Run `selectors` in sequence starting at `root`. Transpose operators
    /// fork the walk; any other selector must match or the branch ends.
    pub fn traverse(&self, root: NodeId, selectors: &[Selector]) -> Vec<NodeId> {
        let mut results = Results::default();
        if selectors.is_empty() {
            return results.into_vec();
        }
        let mut stack = vec![(root, 0usize)];
        'walk: while let Some((element, start)) = stack.pop() {
            for (index, selector) in selectors.iter().enumerate().skip(start) {
                if let Some(candidates) = self.transpose(element, selector) {
                    stack.extend(candidates.into_iter().map(|c| (c, index + 1)));
                    continue 'walk;
                }
                if !self.matches(element, selector) {
                    continue 'walk;
                }
            }
            results.push(element);
        }
        results.into_vec()
    }

    /// All elements under `root` selected by `selector`.
    pub fn query_selector_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        match selector {
            Selector::Id(_) | Selector::Class(_) | Selector::Type(_) | Selector::Attribute(_) => {
                query_simple(self.doc, root, selector)
            }
            Selector::List(members) => {
                let mut results = Results::default();
                for member in members {
                    results.extend(self.query_selector_all(root, member));
                }
                results.into_vec()
            }
            Selector::Compound(members) => {
                let Some((first, rest)) = members.split_first() else {
                    return Vec::new();
                };
                let mut results = Results::default();
                for subject in self.query_selector_all(root, first) {
                    results.extend(self.traverse(subject, rest));
                }
                results.into_vec()
            }
            Selector::Complex {
                left,
                combinator,
                right,
            } => self.query_complex(root, left.as_deref(), *combinator, right),
            Selector::PseudoClass(_) => {
                let mut results = Results::default();
                for subject in self.doc.descendants(root) {
                    results.extend(self.traverse(subject, std::slice::from_ref(selector)));
                }
                results.into_vec()
            }
            Selector::PseudoElement(_) => Vec::new(),
        }
    }

    fn query_complex(
        &self,
        root: NodeId,
        left: Option<&Selector>,
        combinator: Combinator,
        right: &Selector,
    ) -> Vec<NodeId> {
        let doc = self.doc;
        let left_elements = match left {
            Some(left) => self.query_selector_all(root, left),
            None => vec![root],
        };
        let selectors = right.as_slice();
        let mut results = Results::default();
        for left_element in left_elements {
            let candidates: Vec<NodeId> = match combinator {
                Combinator::Descendant => doc.descendants(left_element),
                Combinator::Child => doc.element_children(left_element).collect(),
                Combinator::SubsequentSibling => doc.following_element_siblings(left_element),
                Combinator::NextSibling => doc.next_element_sibling(left_element).into_iter().collect(),
            };
            for candidate in candidates {
                results.extend(self.traverse(candidate, selectors));
            }
        }
        results.into_vec()
    }
}

/// Ordered set of elements.
#[derive(Default)]
struct Results {
    seen: HashSet<NodeId>,
    order: Vec<NodeId>,
}

impl Results {
    fn push(&mut self, node: NodeId) {
        if self.seen.insert(node) {
            self.order.push(node);
        }
    }

    fn extend(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        for node in nodes {
            self.push(node);
        }
    }

    fn into_vec(self) -> Vec<NodeId> {
        self.order
    }
}

// =============================================================================
// Free functions
// =============================================================================

pub fn matches(doc: &Document, element: NodeId, selector: &Selector) -> bool {
    Matcher::new(doc).matches(element, selector)
}

pub fn query_selector_all(doc: &Document, root: NodeId, selector: &Selector) -> Vec<NodeId> {
    Matcher::new(doc).query_selector_all(root, selector)
}

pub fn traverse(doc: &Document, root: NodeId, selectors: &[Selector]) -> Vec<NodeId> {
    Matcher::new(doc).traverse(root, selectors)
}

pub fn transpose(doc: &Document, element: NodeId, selector: &Selector) -> Option<Vec<NodeId>> {
    Matcher::new(doc).transpose(element, selector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::parser::parse_selector;

    fn by_id(doc: &Document, id: &str) -> NodeId {
        doc.descendants(doc.document())
            .into_iter()
            .find(|&n| doc.id(n) == Some(id))
            .expect(id)
    }

    fn select(doc: &Document, selector: &str) -> Vec<NodeId> {
        let selector = parse_selector(selector).expect(selector);
        query_selector_all(doc, doc.document(), &selector)
    }

    fn labels(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
        nodes
            .iter()
            .map(|&n| match doc.id(n) {
                Some(id) => format!("#{id}"),
                None => doc.tag_name(n).unwrap_or_default().to_string(),
            })
            .collect()
    }

    fn query(html: &str, selector: &str) -> Vec<String> {
        let doc = parse_html(html);
        labels(&doc, &select(&doc, selector))
    }

    #[test]
    fn has_text_and_relative_has() {
        let doc = parse_html(r#"<div id="a"><span class="x">hi</span></div>"#);
        let div = by_id(&doc, "a");
        let span = doc.element_children(div).next().expect("span");

        assert_eq!(select(&doc, "#a > .x:has-text(\"hi\")"), vec![span]);
        assert_eq!(select(&doc, "#a:has(> .x)"), vec![div]);
        assert!(select(&doc, "#a > .x:has-text(bye)").is_empty());
    }

    #[test]
    fn complex_selectors_match_in_place() {
        let html = r#"<body><div id="box"><p id="in"></p></div><p id="out"></p><span id="s"></span></body>"#;
        assert_eq!(query(html, "p:not(div > p)"), vec!["#out"]);
        assert_eq!(query(html, "p:is(body div p)"), vec!["#in"]);
        assert_eq!(query(html, "p:is(#nothing, div > p)"), vec!["#in"]);
        assert_eq!(query(html, "p:upward(body > div)"), vec!["#box"]);
        assert_eq!(query(html, "p:is(div + p)"), vec!["#out"]);
        assert_eq!(query(html, "span:is(div ~ span)"), vec!["#s"]);
        assert!(query(html, "span:is(div + span)").is_empty());

        let doc = parse_html(html);
        let inner = by_id(&doc, "in");
        let selector = parse_selector("body > div > p").expect("selector");
        assert!(matches(&doc, inner, &selector));
        let selector = parse_selector("body > p").expect("selector");
        assert!(!matches(&doc, inner, &selector));
    }

    #[test]
    fn upward_bounds() {
        let doc = parse_html(r#"<div id="a"><span class="x">hi</span></div>"#);
        let div = by_id(&doc, "a");
        let span = doc.element_children(div).next().expect("span");

        for (argument, expected) in [("0", vec![]), ("256", vec![]), ("1", vec![div]), ("-1", vec![])] {
            let upward = parse_selector(&format!(":upward({argument})")).expect("upward");
            assert_eq!(transpose(&doc, span, &upward), Some(expected), ":upward({argument})");
        }
        assert_eq!(select(&doc, ".x:upward(1)"), vec![div]);
        assert!(select(&doc, ".x:upward(2)").is_empty());
        assert_eq!(select(&doc, ".x:upward(div)"), vec![div]);
        assert_eq!(transpose(&doc, span, &parse_selector(".x").expect("class")), None);
    }

    #[test]
    fn combinators() {
        let html = r#"<div id="r"><p id="p1"></p><p id="p2"><b id="b"></b></p><i id="i"></i></div>"#;
        assert_eq!(query(html, "#r p"), vec!["#p1", "#p2"]);
        assert_eq!(query(html, "#r > b"), Vec::<String>::new());
        assert_eq!(query(html, "#r b"), vec!["#b"]);
        assert_eq!(query(html, "#p1 ~ *"), vec!["#p2", "#i"]);
        assert_eq!(query(html, "#p1 + p"), vec!["#p2"]);
        assert_eq!(query(html, "#p2 + p"), Vec::<String>::new());
        assert_eq!(query(html, "div > p:has(b)"), vec!["#p2"]);
    }

    #[test]
    fn lists_are_deduplicated() {
        let html = r#"<p id="x" class="a b"></p><p id="y" class="b"></p>"#;
        assert_eq!(query(html, ".a, .b, p"), vec!["#x", "#y"]);
        assert_eq!(query(html, "p:not(.a)"), vec!["#y"]);
        assert_eq!(query(html, "p:is(.a, #y)"), vec!["#x", "#y"]);
    }

    #[test]
    fn text_predicates() {
        let html = r#"<p id="s">Sponsored</p><p id="l">long enough text</p><p id="e"></p>"#;
        assert_eq!(query(html, "p:has-text(/^spon/i)"), vec!["#s"]);
        assert_eq!(query(html, "p:contains(Spons)"), vec!["#s"]);
        assert_eq!(query(html, "p:min-text-length(10)"), vec!["#l"]);
        assert_eq!(query(html, "p:min-text-length(0)"), vec!["#s", "#l", "#e"]);
        assert_eq!(query(html, "p:empty"), vec!["#e"]);
    }

    #[test]
    fn attribute_predicates() {
        let html = r#"<div id="a" data-ad-slot="top"></div><div id="b" data-track="1"></div>"#;
        assert_eq!(query(html, "div:matches-attr(\"/^data-ad/\")"), vec!["#a"]);
        assert_eq!(query(html, "div:matches-attr(\"/^data-/\"=\"/^\\d+$/\")"), vec!["#b"]);
        assert_eq!(query(html, "div:matches-attr(data-track=1)"), vec!["#b"]);
        assert!(query(html, "div:matches-attr(data-track=2)").is_empty());
    }

    #[test]
    fn path_and_style_predicates() {
        let mut doc = parse_html(r#"<div id="a"></div><div id="b"></div>"#);
        assert!(select(&doc, "div:matches-path(/page)").is_empty());
        doc.set_location("/page?x=1");
        assert_eq!(labels(&doc, &select(&doc, "#a:matches-path(/page)")), vec!["#a"]);
        assert!(select(&doc, "#a:matches-path(/^\\/other/)").is_empty());

        let b = by_id(&doc, "b");
        doc.set_computed_style(b, None, "position", "fixed");
        doc.set_computed_style(b, Some("before"), "content", "Ad");
        assert_eq!(labels(&doc, &select(&doc, "div:matches-css(position: fixed)")), vec!["#b"]);
        assert_eq!(labels(&doc, &select(&doc, "div:matches-css-before(content: /^Ad$/)")), vec!["#b"]);
        assert!(select(&doc, "div:matches-css(display: none)").is_empty());
    }

    #[test]
    fn xpath_transposes() {
        let html = r#"<div id="a"><span>x</span></div><div id="b"></div>"#;
        assert_eq!(query(html, "span:xpath(../following-sibling::div)"), vec!["#b"]);
        assert!(query(html, "span:xpath(count(//div))").is_empty());
    }

    #[test]
    fn unsupported_pseudo_classes_match_nothing() {
        assert!(query("<p></p>", "p:hover").is_empty());
        assert!(query("<p></p>", "p::before").is_empty());
    }

    #[test]
    fn traverse_with_no_selectors_is_empty() {
        let doc = parse_html("<p></p>");
        assert!(traverse(&doc, doc.document(), &[]).is_empty());
    }
}
