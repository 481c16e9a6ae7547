use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::util::{decode_text, extract_xml_encoding, strip_bom};

/// Named-entry access to an ebook archive.
///
/// This is the only capability the loading pipeline needs from the
/// container format: enumerate entries, and read one as bytes or text.
pub trait ArchiveReader {
    /// All entry paths, in archive order.
    fn list_entries(&self) -> Vec<String>;

    /// Read an entry's raw bytes. Fails with [`Error::MissingResource`] if
    /// no entry has this path.
    fn read_binary(&mut self, path: &str) -> Result<Vec<u8>>;

    /// Read an entry as text, stripping a UTF-8 BOM and honoring the XML
    /// declaration's encoding when the bytes are not valid UTF-8.
    fn read_text(&mut self, path: &str) -> Result<String> {
        let bytes = self.read_binary(path)?;
        let bytes = strip_bom(&bytes);
        let hint = extract_xml_encoding(bytes);
        Ok(decode_text(bytes, hint).into_owned())
    }

    fn contains(&self, path: &str) -> bool {
        self.list_entries().iter().any(|p| p == path)
    }
}

// --- Implementation: ZIP ---

/// An [`ArchiveReader`] over a ZIP file (the EPUB container).
pub struct ZipArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl ZipArchiveReader<BufReader<File>> {
    /// Open an EPUB file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl ZipArchiveReader<Cursor<Vec<u8>>> {
    /// Wrap archive bytes already held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(data))
    }
}

impl<R: Read + Seek> ZipArchiveReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::MalformedArchive(format!("not a ZIP archive: {e}")))?;
        Ok(Self { archive })
    }

    fn read_exact_name(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.archive.by_name(path) {
            Ok(mut file) => {
                let mut contents = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut contents)?;
                Ok(Some(contents))
            }
            Err(zip::result::ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl<R: Read + Seek> ArchiveReader for ZipArchiveReader<R> {
    fn list_entries(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    fn read_binary(&mut self, path: &str) -> Result<Vec<u8>> {
        if let Some(contents) = self.read_exact_name(path)? {
            return Ok(contents);
        }

        // Fallback: try percent-decoded path (handles malformed EPUBs)
        if let Ok(decoded) = percent_encoding::percent_decode_str(path).decode_utf8()
            && decoded != path
            && let Some(contents) = self.read_exact_name(&decoded)?
        {
            return Ok(contents);
        }

        Err(Error::MissingResource(path.to_string()))
    }

    fn contains(&self, path: &str) -> bool {
        self.archive.index_for_name(path).is_some()
    }
}

// --- Implementation: In-Memory ---

/// An in-memory [`ArchiveReader`] backed by a path-to-bytes map.
#[derive(Debug, Default, Clone)]
pub struct MemoryArchive {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.entries.insert(path.into(), data.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_entry(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }
}

impl ArchiveReader for MemoryArchive {
    fn list_entries(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn read_binary(&mut self, path: &str) -> Result<Vec<u8>> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| Error::MissingResource(path.to_string()))
    }

    fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}
