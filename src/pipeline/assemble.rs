//! Document assembly: spine-ordered body fragments → one document tree.

use tracing::debug;

use crate::document::Document;
use crate::error::{Error, Result};

/// Concatenate body fragments in the order given and parse them once.
///
/// No reordering and no id deduplication across fragments. Fails with
/// [`Error::MalformedArchive`] when there is nothing to assemble.
pub fn assemble<S: AsRef<str>>(fragments: &[S]) -> Result<Document> {
    let total: usize = fragments.iter().map(|f| f.as_ref().len()).sum();
    if fragments.iter().all(|f| f.as_ref().trim().is_empty()) {
        return Err(Error::MalformedArchive("No content found in EPUB".into()));
    }

    // An explicit body keeps leading style/link fragments out of <head>
    let mut markup = String::with_capacity(total + 64);
    markup.push_str("<!DOCTYPE html><html><head></head><body>");
    for fragment in fragments {
        markup.push_str(fragment.as_ref());
    }
    markup.push_str("</body></html>");

    let document = Document::parse(&markup)?;
    debug!(fragments = fragments.len(), bytes = total, "assembled document");
    Ok(document)
}
