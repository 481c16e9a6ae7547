//! Summary segmentation: boundary markers every N characters of text.
//!
//! The walk counts characters over the body's text leaves in document order.
//! When a leaf pushes the running count across a multiple of the interval,
//! the leaf's nearest block ancestor becomes a boundary element. Once the walk
//! is done, each boundary element (first-encounter order, no duplicates) gets
//! an empty marker appended as its last child, so a marker never lands in the
//! middle of a sentence or splits inline formatting.

use std::collections::HashSet;

use tracing::debug;

use crate::document::Document;
use crate::dom::{Attribute, NodeId};
use crate::util::{collapse_whitespace, truncate_chars};

/// Class carried by every boundary marker element, for the host's styling.
/// Markers are identified by node, so content using the same class is not
/// mistaken for one.
pub const MARKER_CLASS: &str = "summary-marker";

/// Result of segmenting a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    /// Marker elements in document order.
    pub markers: Vec<NodeId>,
    /// Characters counted over all text leaves.
    pub total_chars: usize,
}

/// Insert boundary markers into `doc` every `interval` characters.
///
/// Running it on an already segmented document inserts nothing and returns
/// the markers already present. An interval of zero inserts nothing.
pub fn segment(doc: &mut Document, interval: usize) -> Segmentation {
    let leaves = doc.text_leaves(doc.body(), |dom, id| {
        dom.is_non_content(id) || doc.is_marker(id)
    });
    let counting = interval > 0 && !doc.is_segmented();

    let mut total = 0usize;
    let mut boundaries: Vec<NodeId> = Vec::new();
    let mut seen: HashSet<NodeId> = HashSet::new();

    for leaf in leaves {
        let len = doc.dom().text_content(leaf).map_or(0, |t| t.chars().count());
        let start = total;
        total += len;

        if !counting || total / interval <= start / interval {
            continue;
        }
        if let Some(block) = doc.nearest_ancestor(leaf, |dom, id| dom.is_block(id))
            && seen.insert(block)
        {
            boundaries.push(block);
        }
    }

    if !counting {
        return Segmentation {
            markers: markers(doc),
            total_chars: total,
        };
    }

    let dom = doc.dom_mut();
    let inserted: Vec<NodeId> = boundaries
        .into_iter()
        .map(|block| {
            let marker = dom.create_html_element("div", vec![Attribute::new("class", MARKER_CLASS)]);
            dom.append(block, marker);
            marker
        })
        .collect();
    doc.record_markers(&inserted);

    debug!(
        markers = inserted.len(),
        chars = total,
        interval,
        "segmented document"
    );

    Segmentation {
        markers: markers(doc),
        total_chars: total,
    }
}

/// Marker elements currently in the document, in document order.
pub fn markers(doc: &Document) -> Vec<NodeId> {
    let dom = doc.dom();
    dom.descendants(doc.body())
        .filter(|&id| doc.is_marker(id))
        .collect()
}

/// Text of the section ending at marker `index`: everything after the previous
/// marker (or the start of the body) up to the marker itself.
///
/// Whitespace runs are collapsed, block boundaries count as whitespace, and
/// the result is truncated to `max_chars` characters. `None` if the document
/// has no marker at `index`.
pub fn section_text(doc: &Document, index: usize, max_chars: usize) -> Option<String> {
    let dom = doc.dom();
    let body = doc.body();
    let mut section = 0usize;
    let mut raw = String::new();
    let mut found = false;

    let mut current = dom.next_in_order(body, body, true);
    while let Some(id) = current {
        if doc.is_marker(id) {
            if section == index {
                found = true;
                break;
            }
            section += 1;
            current = dom.next_in_order(id, body, false);
            continue;
        }
        if dom.is_non_content(id) {
            current = dom.next_in_order(id, body, false);
            continue;
        }
        if section == index {
            if dom.is_block(id) || dom.is_tag(id, "br") {
                raw.push(' ');
            } else if let Some(text) = dom.text_content(id) {
                raw.push_str(text);
            }
        }
        current = dom.next_in_order(id, body, true);
    }

    if !found {
        return None;
    }
    let collapsed = collapse_whitespace(&raw);
    Some(truncate_chars(&collapsed, max_chars).to_string())
}
