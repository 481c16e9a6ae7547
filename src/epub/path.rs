//! Archive-internal path resolution.
//!
//! One resolver serves every reference in a book: manifest hrefs (relative to
//! the package document) and image references (relative to the content
//! document that contains them).

/// Resolve `reference` against the document at `base_path`.
///
/// A reference with a leading `/` is archive-absolute and is used as-is minus
/// the slash. Otherwise it is joined to the directory of `base_path`; `.` and
/// empty segments are dropped and `..` pops the previous segment.
///
/// ```
/// use marginalia::epub::resolve_path;
///
/// assert_eq!(resolve_path("OEBPS/text/ch1.xhtml", "../images/fig1.png"), "OEBPS/images/fig1.png");
/// assert_eq!(resolve_path("OEBPS/text/ch1.xhtml", "/images/fig1.png"), "images/fig1.png");
/// ```
pub fn resolve_path(base_path: &str, reference: &str) -> String {
    if let Some(absolute) = reference.strip_prefix('/') {
        return absolute.to_string();
    }

    let base_dir = parent_dir(base_path);
    let mut resolved: Vec<&str> = Vec::new();
    for part in base_dir.split('/').chain(reference.split('/')) {
        match part {
            ".." => {
                resolved.pop();
            }
            "." | "" => {}
            segment => resolved.push(segment),
        }
    }
    resolved.join("/")
}

/// Directory part of `path`, including the trailing slash (`""` at the root).
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "",
    }
}
