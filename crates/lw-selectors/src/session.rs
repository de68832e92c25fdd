//! Cosmetic Session
//!
//! Per-document state for applying cosmetic filters as the page changes.
//!
//! # Architecture
//!
//! ```text
//! notify(changed nodes) ─► Batcher ─► next_batch() ─► process(doc, batch)
//!                                                        ├─ feature extraction
//!                                                        │    (new ids, classes, hrefs)
//!                                                        └─ extended update
//!                                                             (hide, remove, un-hide)
//! ```
//!
//! The session owns everything that survives between batches: known
//! features, registered extended selectors, the pending roots and the map
//! of elements it has hidden.

use std::collections::{HashMap, HashSet};

use crate::batch::{Batch, BatchConfig, Batcher};
use crate::dom::{Document, NodeId};
use crate::error::SessionError;
use crate::parser::Selector;
use crate::query::Matcher;

/// Tags never reported as changed elements or scanned for features.
pub const IGNORED_TAGS: &[&str] = &["br", "head", "link", "meta", "script", "style", "s"];

/// What to do with elements an extended selector picks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Set this (empty) attribute; a stylesheet is expected to hide it.
    Hide { attribute: String },
    /// Clear the element's text and detach it.
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedSelector {
    /// Registration key; re-adding a key replaces the selector.
    pub key: String,
    pub selector: Selector,
    pub policy: Policy,
}

/// Ids, classes and hrefs seen for the first time in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features {
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub hrefs: Vec<String>,
}

impl Features {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.classes.is_empty() && self.hrefs.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedUpdate {
    pub hidden: Vec<NodeId>,
    pub removed: Vec<NodeId>,
    pub unhidden: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    /// Batch elements minus ignored tags.
    pub elements: Vec<NodeId>,
    /// `None` when nothing new was seen.
    pub features: Option<Features>,
    pub extended: ExtendedUpdate,
}

#[derive(Debug, Clone)]
struct Hidden {
    key: String,
    attribute: String,
    root: NodeId,
}

pub struct CosmeticSession {
    config: BatchConfig,
    batcher: Option<Batcher<NodeId>>,
    known_ids: HashSet<String>,
    known_classes: HashSet<String>,
    known_hrefs: HashSet<String>,
    extended: Vec<ExtendedSelector>,
    pending: Vec<NodeId>,
    hidden: HashMap<NodeId, Hidden>,
}

impl Default for CosmeticSession {
    fn default() -> Self {
        Self::new(BatchConfig::default())
    }
}

impl CosmeticSession {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            batcher: None,
            known_ids: HashSet::new(),
            known_classes: HashSet::new(),
            known_hrefs: HashSet::new(),
            extended: Vec::new(),
            pending: Vec::new(),
            hidden: HashMap::new(),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawn the batcher. Needs a tokio runtime; a second call is a no-op
    /// while the batcher is running.
    pub fn start(&mut self) {
        if self.batcher.as_ref().is_some_and(|b| !b.is_stopped()) {
            return;
        }
        log::debug!("starting cosmetic session");
        self.batcher = Some(Batcher::spawn(self.config.clone()));
    }

    pub fn stop(&mut self) {
        if let Some(batcher) = &mut self.batcher {
            log::debug!("stopping cosmetic session");
            batcher.stop();
        }
    }

    /// Report changed elements.
    pub fn notify(&self, nodes: Vec<NodeId>) -> Result<(), SessionError> {
        let batcher = self.batcher.as_ref().ok_or(SessionError::NotStarted)?;
        Ok(batcher.push(nodes)?)
    }

    /// Wait for the next batch; `None` when not started or stopped.
    pub async fn next_batch(&mut self) -> Option<Batch<NodeId>> {
        self.batcher.as_mut()?.next_batch().await
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Scan the whole document, as on page load.
    pub fn query_all(&mut self, doc: &mut Document) -> SessionUpdate {
        let roots: Vec<NodeId> = doc.document_element().into_iter().collect();
        self.process_elements(doc, &roots)
    }

    pub fn process(&mut self, doc: &mut Document, batch: &Batch<NodeId>) -> SessionUpdate {
        self.process_elements(doc, &batch.items)
    }

    fn process_elements(&mut self, doc: &mut Document, nodes: &[NodeId]) -> SessionUpdate {
        let elements: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|&n| doc.tag_name(n).is_some_and(|tag| !IGNORED_TAGS.contains(&tag)))
            .collect();
        let features = self.new_features(extract_features(doc, nodes));
        self.queue_roots(doc, &elements);
        let extended = self.update_extended(doc);
        SessionUpdate {
            elements,
            features,
            extended,
        }
    }

    fn new_features(&mut self, found: Features) -> Option<Features> {
        fn keep_new(known: &mut HashSet<String>, found: Vec<String>) -> Vec<String> {
            found.into_iter().filter(|f| known.insert(f.clone())).collect()
        }
        let features = Features {
            ids: keep_new(&mut self.known_ids, found.ids),
            classes: keep_new(&mut self.known_classes, found.classes),
            hrefs: keep_new(&mut self.known_hrefs, found.hrefs),
        };
        (!features.is_empty()).then_some(features)
    }

    // =========================================================================
    // Extended selectors
    // =========================================================================

    /// Register selectors and queue a full-document pass.
    pub fn add_selectors(&mut self, doc: &Document, selectors: impl IntoIterator<Item = ExtendedSelector>) {
        let mut added = false;
        for selector in selectors {
            added = true;
            match self.extended.iter_mut().find(|s| s.key == selector.key) {
                Some(existing) => *existing = selector,
                None => self.extended.push(selector),
            }
        }
        if added {
            let roots: Vec<NodeId> = doc.document_element().into_iter().collect();
            self.queue_roots(doc, &roots);
        }
    }

    pub fn pending(&self) -> &[NodeId] {
        &self.pending
    }

    pub fn hidden(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.hidden.keys().copied()
    }

    fn queue_roots(&mut self, doc: &Document, elements: &[NodeId]) {
        if self.extended.is_empty() {
            return;
        }
        let root = doc.document_element();
        if root.is_some_and(|r| self.pending.contains(&r)) {
            return;
        }
        for &element in elements {
            if Some(element) == root {
                self.pending.clear();
                self.pending.push(element);
                return;
            }
            if !self.pending.contains(&element) {
                self.pending.push(element);
            }
        }
    }

    /// Apply extended selectors to the pending roots and un-hide elements
    /// that no longer match.
    pub fn update_extended(&mut self, doc: &mut Document) -> ExtendedUpdate {
        let mut update = ExtendedUpdate::default();
        if self.pending.is_empty() || self.extended.is_empty() {
            return update;
        }

        let roots: Vec<NodeId> = std::mem::take(&mut self.pending)
            .into_iter()
            .filter(|&r| doc.is_connected(r))
            .collect();
        let mut cache = QueryCache::default();
        let mut to_hide: Vec<(NodeId, Hidden)> = Vec::new();

        for &root in &roots {
            for selector in &self.extended {
                let selected = cache.query(doc, root, selector);
                match &selector.policy {
                    Policy::Remove => {
                        for element in selected {
                            if doc.is_connected(element) {
                                doc.set_text_content(element, "");
                                doc.detach(element);
                                update.removed.push(element);
                            }
                        }
                    }
                    Policy::Hide { attribute } => {
                        for element in selected {
                            if self.hidden.contains_key(&element) || to_hide.iter().any(|(e, _)| *e == element) {
                                continue;
                            }
                            to_hide.push((
                                element,
                                Hidden {
                                    key: selector.key.clone(),
                                    attribute: attribute.clone(),
                                    root,
                                },
                            ));
                        }
                    }
                }
            }
        }

        for (element, hidden) in to_hide {
            doc.set_attribute(element, &hidden.attribute, "");
            self.hidden.insert(element, hidden);
            update.hidden.push(element);
        }

        let mut hidden: Vec<NodeId> = self.hidden.keys().copied().collect();
        hidden.sort();
        for element in hidden {
            let Some(entry) = self.hidden.get(&element) else {
                continue;
            };
            let still_selected = doc.is_connected(entry.root)
                && doc.is_connected(element)
                && self
                    .extended
                    .iter()
                    .find(|s| s.key == entry.key)
                    .is_some_and(|s| cache.query(doc, entry.root, s).contains(&element));
            if !still_selected {
                if let Some(entry) = self.hidden.remove(&element) {
                    doc.remove_attribute(element, &entry.attribute);
                    update.unhidden.push(element);
                }
            }
        }

        log::debug!(
            "extended update over {} roots: {} hidden, {} removed, {} unhidden",
            roots.len(),
            update.hidden.len(),
            update.removed.len(),
            update.unhidden.len()
        );
        update
    }
}

/// Query results per root for hide selectors, valid for one update.
#[derive(Default)]
struct QueryCache {
    results: HashMap<(NodeId, String), Vec<NodeId>>,
}

impl QueryCache {
    fn query(&mut self, doc: &Document, root: NodeId, selector: &ExtendedSelector) -> Vec<NodeId> {
        let key = (root, selector.key.clone());
        if let Some(cached) = self.results.get(&key) {
            return cached.clone();
        }
        let selected = Matcher::new(doc).query_selector_all(root, &selector.selector);
        if matches!(selector.policy, Policy::Hide { .. }) {
            self.results.insert(key, selected.clone());
        }
        selected
    }
}

// =============================================================================
// Feature extraction
// =============================================================================

/// Ids, classes and hrefs under `roots`. Each root is scanned along with
/// its descendants carrying one of those attributes, except `html` and
/// `body` below the root.
pub fn extract_features(doc: &Document, roots: &[NodeId]) -> Features {
    let mut features = Features::default();
    let mut seen_elements = HashSet::new();
    let mut seen = (HashSet::new(), HashSet::new(), HashSet::new());

    for &root in roots {
        let candidates = std::iter::once(root).chain(doc.descendants(root).into_iter().filter(|&n| {
            !matches!(doc.tag_name(n), Some("html" | "body"))
                && (doc.has_attribute(n, "id") || doc.has_attribute(n, "class") || doc.has_attribute(n, "href"))
        }));
        for element in candidates {
            if !seen_elements.insert(element) {
                continue;
            }
            match doc.tag_name(element) {
                Some(tag) if !IGNORED_TAGS.contains(&tag) => {}
                _ => continue,
            }
            if let Some(id) = doc.id(element) {
                if seen.0.insert(id.to_string()) {
                    features.ids.push(id.to_string());
                }
            }
            for class in doc.class_list(element) {
                if seen.1.insert(class.to_string()) {
                    features.classes.push(class.to_string());
                }
            }
            if let Some(href) = doc.attribute(element, "href") {
                if seen.2.insert(href.to_string()) {
                    features.hrefs.push(href.to_string());
                }
            }
        }
    }
    features
}
