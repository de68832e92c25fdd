//! Arena DOM
//!
//! A small document model with just enough surface for selector matching:
//! element names, attributes, text, tree links, a page location for
//! `:matches-path` and a computed-style table for `:matches-css`.
//!
//! Nodes live in one `Vec` and are addressed by [`NodeId`]. Detached nodes
//! stay in the arena; [`Document::is_connected`] tells them apart.

use std::collections::{HashMap, HashSet};

/// Index of a node in its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub name: String,
    /// Attributes in source order, names lowercased.
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Computed style key: element plus optional pseudo-element (`before`/`after`).
type StyleKey = (NodeId, Option<String>);

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    location: Option<String>,
    styles: HashMap<StyleKey, HashMap<String, String>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            location: None,
            styles: HashMap::new(),
        }
    }

    /// The document node itself.
    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    /// First element child of the document.
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.document()).next()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    /// Append `child` to `parent`, detaching it from its previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Unlink `node` from its parent. The subtree stays intact.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != node);
        }
    }

    // =========================================================================
    // Tree access
    // =========================================================================

    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.index()].data
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.data(node), NodeData::Element(_))
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.index()].children
    }

    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node).iter().copied().filter(|&c| self.is_element(c))
    }

    /// Siblings after `node`, elements only, nearest first.
    pub fn following_element_siblings(&self, node: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(node) else {
            return Vec::new();
        };
        let siblings = self.children(parent);
        let Some(position) = siblings.iter().position(|&c| c == node) else {
            return Vec::new();
        };
        siblings[position + 1..]
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    /// Siblings before `node`, elements only, nearest first.
    pub fn preceding_element_siblings(&self, node: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(node) else {
            return Vec::new();
        };
        let siblings = self.children(parent);
        let Some(position) = siblings.iter().position(|&c| c == node) else {
            return Vec::new();
        };
        siblings[..position]
            .iter()
            .rev()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.following_element_siblings(node).into_iter().next()
    }

    /// All descendant elements of `node` in document order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.is_element(current) {
                out.push(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Ancestors of `node`, nearest first, up to and including the document.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |&n| self.parent(n))
    }

    /// Whether `node` is reachable from the document node.
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.document() || self.ancestors(node).any(|n| n == self.document())
    }

    /// Sort `nodes` into document order, dropping duplicates and detached nodes.
    pub fn sort_document_order(&self, nodes: &mut Vec<NodeId>) {
        let wanted: HashSet<NodeId> = nodes.iter().copied().collect();
        nodes.clear();
        let mut stack = vec![self.document()];
        while let Some(current) = stack.pop() {
            if wanted.contains(&current) {
                nodes.push(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
    }

    // =========================================================================
    // Element data
    // =========================================================================

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.data(node) {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[node.index()].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.name.as_str())
    }

    pub fn attributes(&self, node: NodeId) -> &[(String, String)] {
        self.element(node).map_or(&[], |e| e.attributes.as_slice())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attributes(node)
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        let name = name.to_ascii_lowercase();
        match element.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => element.attributes.push((name, value.to_string())),
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attributes.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        }
    }

    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id")
    }

    pub fn class_list(&self, node: NodeId) -> impl Iterator<Item = &str> {
        self.attribute(node, "class").unwrap_or_default().split_ascii_whitespace()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match self.data(current) {
                NodeData::Text(text) => out.push_str(text),
                _ => stack.extend(self.children(current).iter().rev().copied()),
            }
        }
        out
    }

    /// Replace all children of `node` with a single text node.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        for child in std::mem::take(&mut self.nodes[node.index()].children) {
            self.nodes[child.index()].parent = None;
        }
        if !text.is_empty() {
            let child = self.create_text(text);
            self.append_child(node, child);
        }
    }

    // =========================================================================
    // Environment
    // =========================================================================

    /// Page path plus query string, e.g. `/news/article?id=1`.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn set_location(&mut self, path_and_query: &str) {
        self.location = Some(path_and_query.to_string());
    }

    /// Record a computed style value; `pseudo` is `before`/`after` or `None`.
    pub fn set_computed_style(&mut self, node: NodeId, pseudo: Option<&str>, property: &str, value: &str) {
        self.styles
            .entry((node, pseudo.map(str::to_string)))
            .or_default()
            .insert(property.to_string(), value.to_string());
    }

    pub fn computed_style(&self, node: NodeId, pseudo: Option<&str>, property: &str) -> Option<&str> {
        self.styles
            .get(&(node, pseudo.map(str::to_string)))
            .and_then(|style| style.get(property))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let html = doc.create_element("HTML");
        let root = doc.document();
        doc.append_child(root, html);
        let a = doc.create_element("div");
        let b = doc.create_element("p");
        doc.append_child(html, a);
        doc.append_child(html, b);
        let text = doc.create_text("hello");
        doc.append_child(a, text);
        (doc, html, a, b)
    }

    #[test]
    fn tree_links() {
        let (doc, html, a, b) = sample();
        assert_eq!(doc.document_element(), Some(html));
        assert_eq!(doc.tag_name(html), Some("html"));
        assert_eq!(doc.parent_element(a), Some(html));
        assert_eq!(doc.parent_element(html), None);
        assert_eq!(doc.next_element_sibling(a), Some(b));
        assert_eq!(doc.preceding_element_siblings(b), vec![a]);
        assert_eq!(doc.descendants(doc.document()), vec![html, a, b]);
    }

    #[test]
    fn detach_and_reconnect() {
        let (mut doc, html, a, _) = sample();
        doc.detach(a);
        assert!(!doc.is_connected(a));
        assert_eq!(doc.text_content(a), "hello");
        doc.append_child(html, a);
        assert!(doc.is_connected(a));
    }

    #[test]
    fn attributes_are_case_insensitive() {
        let (mut doc, _, a, _) = sample();
        doc.set_attribute(a, "Class", "x  y");
        assert_eq!(doc.attribute(a, "class"), Some("x  y"));
        assert_eq!(doc.class_list(a).collect::<Vec<_>>(), vec!["x", "y"]);
        doc.remove_attribute(a, "CLASS");
        assert!(!doc.has_attribute(a, "class"));
    }

    #[test]
    fn text_content_replacement() {
        let (mut doc, html, a, _) = sample();
        assert_eq!(doc.text_content(html), "hello");
        doc.set_text_content(a, "");
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.text_content(html), "");
    }

    #[test]
    fn document_order_sorting() {
        let (doc, html, a, b) = sample();
        let mut nodes = vec![b, a, html, b];
        doc.sort_document_order(&mut nodes);
        assert_eq!(nodes, vec![html, a, b]);
    }
}
