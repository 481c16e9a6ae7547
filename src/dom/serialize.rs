//! HTML serialization of [`Dom`] subtrees.

use super::arena::{Dom, NodeData, NodeId};

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text content is written verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Hook for decorating elements while serializing.
///
/// Returns extra classes to add to the element's `class` attribute.
pub trait ClassDecorator {
    fn extra_classes(&self, id: NodeId) -> Option<&'static str>;
}

impl ClassDecorator for () {
    fn extra_classes(&self, _id: NodeId) -> Option<&'static str> {
        None
    }
}

/// Serialize the children of `id` (its "inner HTML").
pub fn inner_html(dom: &Dom, id: NodeId) -> String {
    inner_html_with(dom, id, &())
}

/// Serialize the children of `id`, letting `decorator` add classes.
pub fn inner_html_with<D: ClassDecorator + ?Sized>(dom: &Dom, id: NodeId, decorator: &D) -> String {
    let mut out = String::new();
    let raw = dom
        .element_name(id)
        .is_some_and(|n| RAW_TEXT_ELEMENTS.contains(&n.as_ref()));
    for child in dom.children(id) {
        write_node(dom, child, raw, decorator, &mut out);
    }
    out
}

fn write_node<D: ClassDecorator + ?Sized>(
    dom: &Dom,
    id: NodeId,
    raw_text: bool,
    decorator: &D,
    out: &mut String,
) {
    let Some(node) = dom.get(id) else { return };
    match &node.data {
        NodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, false, decorator, out);
            }
        }
        NodeData::Doctype { name } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                escape_into(text, false, out);
            }
        }
        NodeData::Element { name, attrs } => {
            let tag = name.local.as_ref();
            let extra = decorator.extra_classes(id);
            out.push('<');
            out.push_str(tag);

            let mut wrote_class = false;
            for attr in attrs {
                out.push(' ');
                if let Some(prefix) = &attr.name.prefix {
                    out.push_str(prefix.as_ref());
                    out.push(':');
                }
                let attr_name = attr.name.local.as_ref();
                out.push_str(attr_name);
                out.push_str("=\"");
                if attr_name == "class"
                    && attr.name.prefix.is_none()
                    && let Some(extra) = extra
                {
                    wrote_class = true;
                    let joined = format!("{} {}", attr.value, extra);
                    escape_into(joined.trim(), true, out);
                } else {
                    escape_into(&attr.value, true, out);
                }
                out.push('"');
            }
            if !wrote_class && let Some(extra) = extra {
                out.push_str(" class=\"");
                escape_into(extra, true, out);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&tag) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&tag);
            for child in dom.children(id) {
                write_node(dom, child, raw, decorator, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{A0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
