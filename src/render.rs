//! HTML output of the assembled document with word display states.

use crate::document::Document;
use crate::dom::{ClassDecorator, NodeId, inner_html_with};
use crate::tokenize::{WordState, WordTable};

impl ClassDecorator for WordTable {
    fn extra_classes(&self, id: NodeId) -> Option<&'static str> {
        match self.state(id)? {
            WordState::Plain => None,
            WordState::Highlighted => Some("highlighted"),
            WordState::Defined => Some("defined"),
        }
    }
}

/// Body markup with `highlighted` / `defined` classes on word units.
pub fn render_html(doc: &Document, words: &WordTable) -> String {
    inner_html_with(doc.dom(), doc.body(), words)
}

const PAGE_STYLE: &str = "\
body{max-width:40em;margin:0 auto;padding:1em;line-height:1.6}\
.word.highlighted{background:#fff3a0}\
.word.defined{text-decoration:underline dotted}\
.summary-marker{border-top:1px dashed #999;margin:1.5em 0;height:0}";

/// A standalone HTML page around [`render_html`].
pub fn render_page(doc: &Document, words: &WordTable, title: &str) -> String {
    let mut page = String::from("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>");
    for c in title.chars() {
        match c {
            '&' => page.push_str("&amp;"),
            '<' => page.push_str("&lt;"),
            '>' => page.push_str("&gt;"),
            c => page.push(c),
        }
    }
    page.push_str("</title><style>");
    page.push_str(PAGE_STYLE);
    page.push_str("</style></head><body>");
    page.push_str(&render_html(doc, words));
    page.push_str("</body></html>\n");
    page
}
