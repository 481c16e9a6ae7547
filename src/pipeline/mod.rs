//! The load pipeline: package resolution → inlining → assembly → segmentation.
//!
//! Stages run strictly in that order within one load. Each stage takes what
//! it needs as parameters; nothing about the current archive is kept between
//! loads.

mod assemble;
mod inline;

pub use assemble::assemble;
pub use inline::{InlinedDocument, inline_images};

use tracing::{info, warn};

use crate::config::ReaderConfig;
use crate::document::Document;
use crate::epub::{Package, resolve_package};
use crate::error::{Error, Result};
use crate::io::ArchiveReader;
use crate::segment::{Segmentation, segment};

/// What happened to individual resources during a load.
///
/// Per-resource failures never abort the load; they end up here.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Content documents assembled into the tree.
    pub documents: usize,
    /// Content documents that could not be read.
    pub skipped_documents: Vec<String>,
    pub images_inlined: usize,
    pub missing_images: Vec<String>,
}

/// A fully loaded book: resolved package plus the segmented document.
pub struct LoadedBook {
    pub package: Package,
    pub document: Document,
    pub segmentation: Segmentation,
    pub report: LoadReport,
}

/// Load a book from an archive.
///
/// Fails with [`Error::MalformedArchive`] if the package cannot be resolved
/// or if no content document yields any content.
pub fn load_book<A: ArchiveReader + ?Sized>(
    archive: &mut A,
    config: &ReaderConfig,
) -> Result<LoadedBook> {
    let package = resolve_package(archive)?;
    let mut report = LoadReport::default();
    let mut fragments = Vec::with_capacity(package.content_paths.len());

    for path in &package.content_paths {
        let markup = match archive.read_text(path) {
            Ok(markup) => markup,
            Err(e @ (Error::MissingResource(_) | Error::Io(_) | Error::Zip(_))) => {
                warn!(document = %path, error = %e, "skipping content document");
                report.skipped_documents.push(path.clone());
                continue;
            }
            Err(e) => return Err(e),
        };

        let inlined = inline_images(archive, path, &markup);
        report.images_inlined += inlined.inlined;
        report.missing_images.extend(inlined.missing);
        report.documents += 1;
        fragments.push(inlined.body_markup);
    }

    let mut document = assemble(&fragments)?;
    let segmentation = segment(&mut document, config.summary_interval);

    info!(
        title = %package.metadata.title,
        documents = report.documents,
        skipped = report.skipped_documents.len(),
        markers = segmentation.markers.len(),
        "loaded book"
    );

    Ok(LoadedBook {
        package,
        document,
        segmentation,
        report,
    })
}
