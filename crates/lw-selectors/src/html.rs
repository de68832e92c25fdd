//! Minimal HTML fragment parser.
//!
//! Builds a [`Document`] from well-formed-ish markup: elements, attributes
//! (quoted, unquoted or bare), text, comments, void and self-closing tags,
//! and raw text inside `script`/`style`. Stray end tags are ignored and
//! unclosed elements are closed at the end of input. There is no error path.

use crate::dom::{Document, NodeId};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

pub fn parse_html(html: &str) -> Document {
    let mut doc = Document::new();
    let mut parser = Parser {
        input: html,
        pos: 0,
        stack: vec![doc.document()],
    };
    parser.run(&mut doc);
    doc
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    stack: Vec<NodeId>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn current(&self) -> NodeId {
        self.stack[self.stack.len() - 1]
    }

    fn run(&mut self, doc: &mut Document) {
        while self.pos < self.input.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.pos += rest.find("-->").map_or(rest.len(), |end| end + 3);
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.pos += rest.find('>').map_or(rest.len(), |end| end + 1);
            } else if rest.starts_with("</") {
                self.end_tag(doc);
            } else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                self.start_tag(doc);
            } else {
                let first = rest.chars().next().map_or(1, char::len_utf8);
                let len = rest[first..].find('<').map_or(rest.len(), |i| i + first);
                let text = decode_entities(&rest[..len]);
                let node = doc.create_text(&text);
                doc.append_child(self.current(), node);
                self.pos += len;
            }
        }
    }

    fn end_tag(&mut self, doc: &Document) {
        let rest = self.rest();
        let end = rest.find('>').map_or(rest.len(), |i| i + 1);
        let name = rest[2..end.saturating_sub(1).max(2)].trim().to_ascii_lowercase();
        self.pos += end;
        if let Some(depth) = self
            .stack
            .iter()
            .rposition(|&node| doc.tag_name(node) == Some(name.as_str()))
        {
            self.stack.truncate(depth);
        }
    }

    fn start_tag(&mut self, doc: &mut Document) {
        self.pos += 1;
        let name = self.take_while(|c| !c.is_whitespace() && c != '>' && c != '/').to_ascii_lowercase();
        let element = doc.create_element(&name);
        doc.append_child(self.current(), element);

        let mut self_closing = false;
        loop {
            self.take_while(char::is_whitespace);
            let rest = self.rest();
            if rest.is_empty() {
                break;
            }
            if let Some(after) = rest.strip_prefix("/>") {
                self_closing = true;
                self.pos = self.input.len() - after.len();
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let attr = self.take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/');
            self.take_while(char::is_whitespace);
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.take_while(char::is_whitespace);
                self.attribute_value()
            } else {
                String::new()
            };
            if !attr.is_empty() && !doc.has_attribute(element, attr) {
                doc.set_attribute(element, attr, &value);
            }
        }

        if self_closing || VOID_TAGS.contains(&name.as_str()) {
            return;
        }
        if RAW_TEXT_TAGS.contains(&name.as_str()) {
            let rest = self.rest();
            let close = format!("</{name}");
            let len = rest.to_ascii_lowercase().find(&close).unwrap_or(rest.len());
            if len > 0 {
                let text = doc.create_text(&rest[..len]);
                doc.append_child(element, text);
            }
            self.pos += len;
            self.pos += self.rest().find('>').map_or(self.rest().len(), |i| i + 1);
            return;
        }
        self.stack.push(element);
    }

    fn attribute_value(&mut self) -> String {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let end = rest[1..].find(quote).map_or(rest.len(), |i| i + 1);
                let value = decode_entities(&rest[1..end]);
                self.pos += (end + 1).min(rest.len());
                value
            }
            _ => decode_entities(self.take_while(|c| !c.is_whitespace() && c != '>')),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_elements() {
        let doc = parse_html(r#"<div id="a"><span class='x'>hi</span> there</div>"#);
        let div = doc.document_element().expect("div");
        assert_eq!(doc.tag_name(div), Some("div"));
        assert_eq!(doc.id(div), Some("a"));
        let span = doc.element_children(div).next().expect("span");
        assert_eq!(doc.attribute(span, "class"), Some("x"));
        assert_eq!(doc.text_content(div), "hi there");
    }

    #[test]
    fn void_and_self_closing_tags() {
        let doc = parse_html("<p>a<br>b<img src=x.png/><custom/>c</p>");
        let p = doc.document_element().expect("p");
        let names: Vec<&str> = doc.element_children(p).filter_map(|n| doc.tag_name(n)).collect();
        assert_eq!(names, vec!["br", "img", "custom"]);
        assert_eq!(doc.text_content(p), "abc");
    }

    #[test]
    fn attributes_and_entities() {
        let doc = parse_html(r#"<a href=/x?a=1&amp;b=2 hidden data-t="&lt;b&gt;">x &amp; y</a>"#);
        let a = doc.document_element().expect("a");
        assert_eq!(doc.attribute(a, "href"), Some("/x?a=1&b=2"));
        assert_eq!(doc.attribute(a, "hidden"), Some(""));
        assert_eq!(doc.attribute(a, "data-t"), Some("<b>"));
        assert_eq!(doc.text_content(a), "x & y");
    }

    #[test]
    fn comments_raw_text_and_stray_tags() {
        let doc = parse_html("<!DOCTYPE html><html><!-- c --><script>if (a < b) {}</script></b><body>x</html>");
        let html = doc.document_element().expect("html");
        let children: Vec<&str> = doc.element_children(html).filter_map(|n| doc.tag_name(n)).collect();
        assert_eq!(children, vec!["script", "body"]);
        assert_eq!(doc.text_content(html), "if (a < b) {}x");
    }
}
