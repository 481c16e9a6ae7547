//! EPUB package structure: container, package document, path resolution.

mod package;
mod parser;
mod path;

pub use package::{CONTAINER_PATH, ManifestEntry, Package, resolve_package};
pub use parser::{OpfData, PackageMetadata, RawManifestItem, parse_container_xml, parse_opf};
pub use path::{parent_dir, resolve_path};
