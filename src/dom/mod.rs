//! Document tree: arena storage, html5ever parsing, HTML serialization.

mod arena;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, ChildrenIter, Descendants, Dom, Node, NodeData, NodeId};
pub use serialize::{ClassDecorator, inner_html, inner_html_with};
pub use tree_sink::{DomSink, NodeHandle};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

/// Block-level elements that may own a boundary marker.
pub const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote",
];

/// Elements whose subtrees never carry readable text.
pub const NON_CONTENT_TAGS: &[&str] = &["script", "style"];

/// Parse an HTML (or XHTML served as HTML) string into a [`Dom`].
pub fn parse_html(html: &str) -> Dom {
    let sink = DomSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

impl Dom {
    /// The `<body>` element, if the tree has one.
    pub fn body(&self) -> Option<NodeId> {
        self.find_by_tag("body")
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        self.element_name(id)
            .is_some_and(|n| BLOCK_TAGS.contains(&n.as_ref()))
    }

    pub fn is_non_content(&self, id: NodeId) -> bool {
        self.element_name(id)
            .is_some_and(|n| NON_CONTENT_TAGS.contains(&n.as_ref()))
    }
}
