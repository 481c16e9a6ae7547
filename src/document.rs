//! The assembled document owned by a reading session.

use std::collections::HashSet;

use crate::dom::{Dom, NodeId, inner_html, parse_html};
use crate::error::{Error, Result};

/// A single document tree holding every content document of a book, in
/// spine order, under one `<body>`.
///
/// Mutated in place by segmentation (once, at load) and by the lazy
/// tokenizer (once per block). Boundary markers are known by node id, never
/// by their markup: content can carry any class names it likes.
pub struct Document {
    dom: Dom,
    body: NodeId,
    markers: HashSet<NodeId>,
    segmented: bool,
}

impl Document {
    /// Parse markup into a document. Fails if the parse yields no body.
    pub fn parse(markup: &str) -> Result<Self> {
        Self::from_dom(parse_html(markup))
    }

    pub fn from_dom(dom: Dom) -> Result<Self> {
        let body = dom
            .body()
            .ok_or_else(|| Error::MalformedArchive("document has no body".into()))?;
        Ok(Self {
            dom,
            body,
            markers: HashSet::new(),
            segmented: false,
        })
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn is_segmented(&self) -> bool {
        self.segmented
    }

    /// Was `id` inserted as a boundary marker by segmentation?
    pub fn is_marker(&self, id: NodeId) -> bool {
        self.markers.contains(&id)
    }

    pub(crate) fn record_markers(&mut self, markers: &[NodeId]) {
        self.markers.extend(markers.iter().copied());
        self.segmented = true;
    }

    /// Text nodes under `root` in document order, not descending into any
    /// element for which `skip` returns true (`root` itself is never skipped).
    pub fn text_leaves<F>(&self, root: NodeId, skip: F) -> Vec<NodeId>
    where
        F: Fn(&Dom, NodeId) -> bool,
    {
        let mut leaves = Vec::new();
        let mut current = Some(root);
        while let Some(id) = current {
            let skipped = id != root && self.dom.is_element(id) && skip(&self.dom, id);
            if !skipped && self.dom.is_text(id) {
                leaves.push(id);
            }
            current = self.dom.next_in_order(id, root, !skipped);
        }
        leaves
    }

    /// Nearest ancestor of `id` (below the body) satisfying `pred`.
    pub fn nearest_ancestor<F>(&self, id: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&Dom, NodeId) -> bool,
    {
        self.dom
            .ancestors(id)
            .take_while(|&a| a != self.body)
            .find(|&a| pred(&self.dom, a))
    }

    /// Serialized body content.
    pub fn body_html(&self) -> String {
        inner_html(&self.dom, self.body)
    }

    /// All readable text of the body, script/style excluded.
    pub fn text(&self) -> String {
        self.text_leaves(self.body, |dom, id| dom.is_non_content(id))
            .into_iter()
            .filter_map(|id| self.dom.text_content(id))
            .collect()
    }
}
