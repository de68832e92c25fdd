//! Listwright Selector Engine
//!
//! Extended CSS selectors for cosmetic filtering: procedural pseudo-classes
//! (`:has-text`, `:upward`, `:xpath`, `:matches-css`, ...) evaluated over a
//! small arena DOM, plus the debounced batching that re-applies them as a
//! page changes.
//!
//! # Architecture
//!
//! ```text
//! "div:has(> .ad)" ──► tokenizer ──► parser ──► Selector
//!                                                  │
//!                          Document ◄── html       ▼
//!                              └──────────► query (Matcher)
//!                                                  │
//!           changed nodes ──► batch ──► session ◄──┘
//!                                         └─► hide / remove / un-hide
//! ```
//!
//! # Modules
//!
//! - `tokenizer`: regex token grammar with balanced-argument masking
//! - `parser`: `Selector` AST and pseudo-class argument parsing
//! - `pattern`: string and `/regex/flags` arguments
//! - `dom`, `html`: arena document and a forgiving HTML parser
//! - `native`: simple and structural selectors
//! - `query`: `matches`, `traverse`, `transpose`, `query_selector_all`
//! - `xpath`: the `:xpath()` subset
//! - `batch`, `session`: debounced batching and per-document state

pub mod batch;
pub mod dom;
pub mod error;
pub mod html;
pub mod native;
pub mod parser;
pub mod pattern;
pub mod query;
pub mod session;
pub mod tokenizer;
pub mod xpath;

pub use batch::{Batch, BatchConfig, Batcher, Debouncer, FlushReason};
pub use dom::{Document, NodeData, NodeId};
pub use error::{BatchClosed, SelectorError, SessionError};
pub use html::parse_html;
pub use parser::{parse_selector, Combinator, PseudoKind, Selector};
pub use pattern::TextPattern;
pub use query::{matches, query_selector_all, transpose, traverse, Matcher};
pub use session::{extract_features, CosmeticSession, ExtendedSelector, ExtendedUpdate, Features, Policy, SessionUpdate};
pub use xpath::XPath;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_query_a_page() {
        let doc = parse_html(r#"<ul><li class="ad">Sponsored</li><li>News</li></ul>"#);
        let selector = parse_selector("ul > li:has-text(/sponsor/i)").expect("selector");
        let found = query_selector_all(&doc, doc.document(), &selector);
        assert_eq!(found.len(), 1);
        assert_eq!(doc.attribute(found[0], "class"), Some("ad"));
    }

    #[test]
    fn regex_arguments_may_escape_parentheses() {
        let mut doc = parse_html(r#"<div id="a"></div><div id="b"></div>"#);
        let a = doc.descendants(doc.document())[0];
        doc.set_computed_style(a, None, "background-image", "url(data:image/png;base64,xyz)");
        let selector = parse_selector(r"div:matches-css(background-image: /^url\(data/)").expect("selector");
        assert_eq!(query_selector_all(&doc, doc.document(), &selector), vec![a]);
    }

    #[test]
    fn parse_errors_surface_early() {
        assert_eq!(parse_selector(""), Err(SelectorError::Empty));
        assert!(matches!(
            parse_selector("p:matches-path(/a/z)"),
            Err(SelectorError::InvalidRegexFlags(_))
        ));
    }
}
