//! Resource inlining: image references become embedded data URIs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use crate::dom::{Dom, NodeData, NodeId, inner_html, parse_html};
use crate::epub::resolve_path;
use crate::error::Error;
use crate::io::ArchiveReader;
use crate::util::image_media_type;

/// A content document after inlining: body markup plus what happened to its
/// image references.
#[derive(Debug, Clone, Default)]
pub struct InlinedDocument {
    /// Serialized children of the document's `<body>`; head is discarded.
    pub body_markup: String,
    pub inlined: usize,
    /// Archive paths of image references that could not be read.
    pub missing: Vec<String>,
}

/// An image reference found in a content document.
struct ImageRef {
    node: NodeId,
    /// Attribute local name holding the reference (`src` or `href`).
    attr: &'static str,
    value: String,
}

/// Rewrite every image reference in `markup` (the content document at
/// `content_path`) to a base64 data URI read from the archive.
///
/// Missing entries are logged and left as they were.
pub fn inline_images<A: ArchiveReader + ?Sized>(
    archive: &mut A,
    content_path: &str,
    markup: &str,
) -> InlinedDocument {
    let mut dom = parse_html(markup);
    let mut result = InlinedDocument::default();

    for image in collect_image_refs(&dom) {
        if is_external(&image.value) {
            continue;
        }

        let path = resolve_path(content_path, strip_fragment(&image.value));
        match archive.read_binary(&path) {
            Ok(data) => {
                let uri = format!(
                    "data:{};base64,{}",
                    image_media_type(&path),
                    STANDARD.encode(&data)
                );
                set_attr_keep_prefix(&mut dom, image.node, image.attr, uri);
                result.inlined += 1;
            }
            Err(Error::MissingResource(_)) => {
                warn!(image = %path, document = %content_path, "image not found");
                result.missing.push(path);
            }
            Err(e) => {
                warn!(image = %path, document = %content_path, error = %e, "image unreadable");
                result.missing.push(path);
            }
        }
    }

    result.body_markup = match dom.body() {
        Some(body) => inner_html(&dom, body),
        None => markup.to_string(),
    };

    debug!(
        document = %content_path,
        inlined = result.inlined,
        missing = result.missing.len(),
        "inlined images"
    );
    result
}

fn collect_image_refs(dom: &Dom) -> Vec<ImageRef> {
    let mut refs = Vec::new();
    for id in dom.descendants(dom.document()) {
        let Some(tag) = dom.element_name(id) else {
            continue;
        };
        match tag.as_ref() {
            "img" => {
                if let Some(src) = dom.get_attr(id, "src").filter(|s| !s.is_empty()) {
                    refs.push(ImageRef {
                        node: id,
                        attr: "src",
                        value: src.to_string(),
                    });
                }
            }
            // SVG <image> uses href, or xlink:href in SVG 1.1 (same local name)
            "image" => {
                if let Some(href) = dom.get_attr(id, "href").filter(|s| !s.is_empty()) {
                    refs.push(ImageRef {
                        node: id,
                        attr: "href",
                        value: href.to_string(),
                    });
                }
            }
            _ => {}
        }
    }
    refs
}

/// Replace an attribute's value in place, preserving its namespace prefix.
fn set_attr_keep_prefix(dom: &mut Dom, id: NodeId, attr_name: &str, value: String) {
    if let Some(node) = dom.get_mut(id)
        && let NodeData::Element { attrs, .. } = &mut node.data
        && let Some(attr) = attrs.iter_mut().find(|a| a.name.local.as_ref() == attr_name)
    {
        attr.value = value;
    }
}

/// Data URIs and absolute URLs are not archive entries.
fn is_external(reference: &str) -> bool {
    reference.starts_with("data:") || reference.contains("://")
}

fn strip_fragment(reference: &str) -> &str {
    reference
        .split(['#', '?'])
        .next()
        .unwrap_or(reference)
}
