//! Package resolution: container descriptor → package document → manifest
//! and spine → ordered content-document paths.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::parser::{PackageMetadata, parse_container_xml, parse_opf};
use super::path::{parent_dir, resolve_path};
use crate::error::{Error, Result};
use crate::io::ArchiveReader;

/// Fixed location of the container descriptor in every EPUB.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// One manifest item with its href resolved to an archive path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: String,
    /// The href as written in the package document.
    pub href: String,
    pub media_type: String,
    /// Absolute path of the entry within the archive.
    pub path: String,
}

/// The resolved package of an EPUB archive.
///
/// Built once per archive and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Package {
    /// Archive path of the package document (e.g. `OEBPS/content.opf`).
    pub opf_path: String,
    /// Directory of the package document, with trailing slash (`""` at the root).
    pub base_dir: String,
    pub metadata: PackageMetadata,
    pub manifest: Vec<ManifestEntry>,
    /// Spine idrefs, in reading order.
    pub spine: Vec<String>,
    /// Archive paths of the spine's content documents, in reading order.
    pub content_paths: Vec<String>,
}

impl Package {
    pub fn manifest_entry(&self, id: &str) -> Option<&ManifestEntry> {
        self.manifest.iter().find(|item| item.id == id)
    }
}

/// Walk container → package document → manifest/spine.
///
/// Fails with [`Error::MalformedArchive`] when the container descriptor is
/// absent, the package document path cannot be resolved or read, the package
/// document does not parse, or the manifest is empty. Spine references to
/// unknown manifest ids are skipped with a warning.
pub fn resolve_package<A: ArchiveReader + ?Sized>(archive: &mut A) -> Result<Package> {
    let container = archive.read_text(CONTAINER_PATH).map_err(|e| match e {
        Error::MissingResource(_) => Error::MalformedArchive("container.xml not found".into()),
        other => other,
    })?;
    let opf_path = parse_container_xml(&container)?;
    let opf_path = opf_path.trim_start_matches('/').to_string();

    let opf_content = archive.read_text(&opf_path).map_err(|e| match e {
        Error::MissingResource(path) => {
            Error::MalformedArchive(format!("package document not found: {path}"))
        }
        other => other,
    })?;
    let opf = parse_opf(&opf_content)?;

    if opf.manifest.is_empty() {
        return Err(Error::MalformedArchive("no manifest items found".into()));
    }

    let manifest: Vec<ManifestEntry> = opf
        .manifest
        .into_iter()
        .map(|item| ManifestEntry {
            path: resolve_path(&opf_path, &item.href),
            id: item.id,
            href: item.href,
            media_type: item.media_type,
        })
        .collect();

    let by_id: HashMap<&str, &ManifestEntry> =
        manifest.iter().map(|item| (item.id.as_str(), item)).collect();

    let mut content_paths = Vec::with_capacity(opf.spine_ids.len());
    for idref in &opf.spine_ids {
        match by_id.get(idref.as_str()) {
            Some(item) => content_paths.push(item.path.clone()),
            None => warn!(%idref, "spine references unknown manifest item"),
        }
    }

    debug!(
        opf = %opf_path,
        manifest = manifest.len(),
        spine = content_paths.len(),
        "resolved package"
    );

    Ok(Package {
        base_dir: parent_dir(&opf_path).to_string(),
        opf_path,
        metadata: opf.metadata,
        manifest,
        spine: opf.spine_ids,
        content_paths,
    })
}
