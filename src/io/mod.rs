//! Archive access abstractions.

mod archive;

pub use archive::{ArchiveReader, MemoryArchive, ZipArchiveReader};
