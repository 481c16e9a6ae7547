//! # marginalia
//!
//! A reading core for EPUB books shown as one continuous scroll, with
//! click-to-define words and per-section summaries.
//!
//! ## Features
//!
//! - Resolve the package (container, manifest, spine) of an EPUB archive
//! - Inline images as data URIs and assemble every content document into one tree
//! - Insert summary boundary markers every N characters, at block granularity
//! - Tokenize text into clickable word units lazily, as blocks come into view
//! - Compose adjacent clicked words into phrases within a debounce window
//! - Cache-first definitions and summaries from a chat-completion endpoint
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::rc::Rc;
//!
//! use marginalia::annotate::{AnnotationCache, AnnotationService, HttpGenerationClient, JsonFileStore};
//! use marginalia::io::ZipArchiveReader;
//! use marginalia::{ReaderConfig, ReadingSession};
//!
//! # fn main() -> marginalia::Result<()> {
//! let config = ReaderConfig::default();
//! let store = Rc::new(JsonFileStore::open("marginalia-cache.json")?);
//! let cache = AnnotationCache::new(store, config.summary_key_prefix);
//! let client = HttpGenerationClient::from_config(&config)?;
//! let service = AnnotationService::new(Box::new(client), cache, config.clone());
//!
//! let mut archive = ZipArchiveReader::open("book.epub")?;
//! let mut session = ReadingSession::open(&mut archive, config, service)?;
//! println!("{} sections", session.markers().len() + 1);
//!
//! // The host reports visible blocks; text is wrapped as they appear
//! let first = session.visibility_targets()[0];
//! session.on_block_visible(first);
//! # Ok(())
//! # }
//! ```
//!
//! ## Loading Without a Session
//!
//! The pipeline stages are usable on their own:
//!
//! ```
//! use marginalia::io::MemoryArchive;
//! use marginalia::{ReaderConfig, load_book};
//!
//! let mut archive = MemoryArchive::new()
//!     .with_entry(
//!         "META-INF/container.xml",
//!         r#"<container><rootfiles><rootfile full-path="OPS/book.opf"/></rootfiles></container>"#,
//!     )
//!     .with_entry(
//!         "OPS/book.opf",
//!         r#"<package><manifest><item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/></manifest>
//!            <spine><itemref idref="c1"/></spine></package>"#,
//!     )
//!     .with_entry("OPS/c1.xhtml", "<html><body><p>Hello.</p></body></html>");
//!
//! let book = load_book(&mut archive, &ReaderConfig::default())?;
//! assert_eq!(book.document.body_html(), "<p>Hello.</p>");
//! # Ok::<(), marginalia::Error>(())
//! ```

pub mod annotate;
pub mod config;
pub mod document;
pub mod dom;
pub mod epub;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod render;
pub mod segment;
pub mod selection;
pub mod session;
pub mod tokenize;
pub(crate) mod util;

pub use config::ReaderConfig;
pub use document::Document;
pub use error::{Error, Result};
pub use pipeline::{LoadedBook, load_book};
pub use segment::{Segmentation, section_text, segment};
pub use selection::{ClickOutcome, LookupRequest, SelectionEngine};
pub use session::{PanelContent, ReadingSession, SessionMetadata};
pub use tokenize::{Tokenizer, ViewportObserver, WordState, WordTable};
