//! A reading session: one loaded book plus everything layered on it.
//!
//! The session owns the assembled document and routes host events (block
//! visibility, clicks, scrolls, marker activation) to the tokenizer, the
//! selection engine and the annotation service. Lookup failures come back as
//! [`PanelContent::Message`] and never disturb the document or the selection.

use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::annotate::{AnnotationService, KeyValueStore};
use crate::config::ReaderConfig;
use crate::document::Document;
use crate::dom::NodeId;
use crate::epub::Package;
use crate::error::{Error, Result};
use crate::io::ArchiveReader;
use crate::pipeline::{LoadReport, load_book};
use crate::render::render_html;
use crate::segment::section_text;
use crate::selection::{ClickOutcome, LookupRequest, SelectionEngine};
use crate::tokenize::{Tokenizer, ViewportObserver, WordState, WordTable};

pub const FILE_NAME_KEY: &str = "epub:fileName";
pub const FILE_SIZE_KEY: &str = "epub:fileSize";
pub const SCROLL_POSITION_KEY: &str = "epub:scrollPosition";

/// What the lookup panel should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelContent {
    Definition {
        word: String,
        definition: String,
        example: String,
    },
    Summary {
        summary: String,
    },
    Message {
        title: String,
        text: String,
    },
}

/// Last-opened file and reading position, kept in the key-value store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMetadata {
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub scroll_offset: u64,
}

impl SessionMetadata {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            file_name: store.get(FILE_NAME_KEY),
            file_size: store.get(FILE_SIZE_KEY).and_then(|s| s.parse().ok()),
            scroll_offset: store
                .get(SCROLL_POSITION_KEY)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        match &self.file_name {
            Some(name) => store.set(FILE_NAME_KEY, name)?,
            None => store.delete(FILE_NAME_KEY)?,
        }
        match self.file_size {
            Some(size) => store.set(FILE_SIZE_KEY, &size.to_string())?,
            None => store.delete(FILE_SIZE_KEY)?,
        }
        store.set(SCROLL_POSITION_KEY, &self.scroll_offset.to_string())
    }

    /// Does this metadata describe the given file?
    pub fn is_for(&self, file_name: &str, file_size: u64) -> bool {
        self.file_name.as_deref() == Some(file_name) && self.file_size == Some(file_size)
    }
}

pub struct ReadingSession {
    config: ReaderConfig,
    package: Package,
    document: Document,
    markers: Vec<NodeId>,
    report: LoadReport,
    targets: Vec<NodeId>,
    tokenizer: Tokenizer,
    selection: SelectionEngine,
    service: AnnotationService,
    store: Rc<dyn KeyValueStore>,
}

impl ReadingSession {
    /// Load a book and start a session on it.
    ///
    /// Fails only if the book itself cannot be loaded.
    pub fn open<A: ArchiveReader + ?Sized>(
        archive: &mut A,
        config: ReaderConfig,
        service: AnnotationService,
    ) -> Result<Self> {
        config.validate()?;
        let book = load_book(archive, &config)?;
        let targets = Tokenizer::visibility_targets(&book.document);
        let store = service.cache().store().clone();

        Ok(Self {
            selection: SelectionEngine::new(config.debounce(), config.adjacency_window),
            config,
            package: book.package,
            document: book.document,
            markers: book.segmentation.markers,
            report: book.report,
            targets,
            tokenizer: Tokenizer::new(),
            service,
            store,
        })
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn markers(&self) -> &[NodeId] {
        &self.markers
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn words(&self) -> &WordTable {
        self.tokenizer.words()
    }

    pub fn selection(&self) -> &SelectionEngine {
        &self.selection
    }

    pub fn service(&self) -> &AnnotationService {
        &self.service
    }

    pub fn set_online(&mut self, online: bool) {
        self.service.set_online(online);
    }

    /// Blocks the host should watch for visibility, in document order.
    pub fn visibility_targets(&self) -> &[NodeId] {
        &self.targets
    }

    /// Register every target block with the host's observer, using the
    /// configured pre-load margin.
    pub fn attach_viewport(&self, observer: &mut dyn ViewportObserver) -> usize {
        Tokenizer::attach(&self.document, observer, self.config.preload_margin_px)
    }

    /// A watched block came into (or near) view.
    pub fn on_block_visible(&mut self, block: NodeId) -> usize {
        let cache = self.service.cache();
        self.tokenizer
            .on_visible(&mut self.document, block, |word| cache.has_definition(word))
    }

    /// Tokenize the whole book at once.
    pub fn wrap_all(&mut self) -> usize {
        let cache = self.service.cache();
        self.tokenizer
            .wrap_all(&mut self.document, |word| cache.has_definition(word))
    }

    pub fn click_word(&mut self, unit: NodeId, now: Instant) -> ClickOutcome {
        self.selection
            .click(&self.document, &mut self.tokenizer, unit, now)
    }

    /// The pending selection, if its debounce deadline has passed by `now`.
    pub fn poll_selection(&mut self, now: Instant) -> Option<LookupRequest> {
        self.selection.fire(self.tokenizer.words_mut(), now)
    }

    /// Wait out the debounce and return the composed selection.
    ///
    /// `None` if nothing is pending, or if the selection was cancelled while
    /// waiting.
    pub async fn next_selection(&mut self) -> Option<LookupRequest> {
        let deadline = self.selection.deadline()?;
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        self.poll_selection(Instant::now().max(deadline))
    }

    /// Look up a word or phrase and say what the panel should show.
    pub async fn resolve(&mut self, request: &LookupRequest) -> PanelContent {
        let outcome = match self.service.lookup_word(&request.text).await {
            Err(e) => self.service.cache().definition(&request.text).ok_or(e),
            found => found,
        };
        self.release(&request.units);

        match outcome {
            Ok(def) => {
                self.tokenizer.words_mut().mark_defined(&request.text);
                PanelContent::Definition {
                    word: request.text.clone(),
                    definition: def.definition,
                    example: def.example,
                }
            }
            Err(e) => {
                log_failure(&e, "lookup failed");
                PanelContent::Message {
                    title: request.text.clone(),
                    text: friendly_message(&e, "Failed to get definition. Please try again."),
                }
            }
        }
    }

    /// Summarize the section ending at marker `index`.
    pub async fn activate_marker(&mut self, index: usize) -> PanelContent {
        let Some(text) = section_text(&self.document, index, self.config.max_summary_text)
        else {
            return PanelContent::Message {
                title: "Summary".into(),
                text: format!("No section {index}"),
            };
        };

        match self.service.summarize_section(&text).await {
            Ok(summary) => PanelContent::Summary { summary },
            Err(e) => match self.service.cache().summary(&text) {
                Some(summary) => PanelContent::Summary { summary },
                None => {
                    log_failure(&e, "summary failed");
                    PanelContent::Message {
                        title: "Summary".into(),
                        text: friendly_message(&e, "Failed to generate summary. Please try again."),
                    }
                }
            },
        }
    }

    /// Forget a definition and return its word units to plain.
    pub fn unmark_word(&mut self, word: &str) -> Result<usize> {
        self.service.remove_word(word)?;
        Ok(self.tokenizer.words_mut().unmark_defined(word))
    }

    /// The reader scrolled: drop transient selection state and remember the
    /// position.
    pub fn on_scroll(&mut self, offset: u64) {
        self.selection.clear(self.tokenizer.words_mut());
        if offset > 0
            && let Err(e) = self
                .store
                .set(SCROLL_POSITION_KEY, &offset.to_string())
        {
            warn!(error = %e, "could not save scroll position");
        }
    }

    pub fn close_panel(&mut self) {
        self.selection.clear(self.tokenizer.words_mut());
    }

    /// Record which file this session is reading.
    pub fn remember_file(&self, file_name: &str, file_size: u64) -> Result<()> {
        let previous = SessionMetadata::load(self.store.as_ref());
        let scroll_offset = if previous.is_for(file_name, file_size) {
            previous.scroll_offset
        } else {
            0
        };
        SessionMetadata {
            file_name: Some(file_name.to_string()),
            file_size: Some(file_size),
            scroll_offset,
        }
        .save(self.store.as_ref())
    }

    /// Saved scroll offset, if the store's metadata is for this file.
    pub fn saved_scroll(&self, file_name: &str, file_size: u64) -> Option<u64> {
        let meta = SessionMetadata::load(self.store.as_ref());
        (meta.is_for(file_name, file_size) && meta.scroll_offset > 0).then_some(meta.scroll_offset)
    }

    pub fn render_html(&self) -> String {
        render_html(&self.document, self.tokenizer.words())
    }

    /// Lookup done (or failed): the units involved are no longer pending.
    fn release(&mut self, units: &[NodeId]) {
        let words = self.tokenizer.words_mut();
        for &id in units {
            if words.state(id) == Some(WordState::Highlighted) {
                words.set_state(id, WordState::Plain);
            }
        }
    }
}

/// Routine lookup failures log at debug, the rest at warn.
fn log_failure(error: &Error, what: &str) {
    if error.is_transient() {
        debug!(error = %error, "{what}");
    } else {
        warn!(error = %error, "{what}");
    }
}

fn friendly_message(error: &Error, fallback: &str) -> String {
    match error {
        Error::Unavailable(message) => message.clone(),
        Error::InsufficientText { .. } => "Not enough text to summarize.".to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::MemoryStore;

    #[test]
    fn test_metadata_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(SessionMetadata::load(&store), SessionMetadata::default());

        let meta = SessionMetadata {
            file_name: Some("book.epub".into()),
            file_size: Some(1234),
            scroll_offset: 880,
        };
        meta.save(&store).unwrap();
        assert_eq!(store.get(FILE_SIZE_KEY).as_deref(), Some("1234"));

        let loaded = SessionMetadata::load(&store);
        assert_eq!(loaded, meta);
        assert!(loaded.is_for("book.epub", 1234));
        assert!(!loaded.is_for("book.epub", 99));
    }

    #[test]
    fn test_friendly_messages() {
        let offline = Error::Unavailable("You are offline.".into());
        assert_eq!(friendly_message(&offline, "x"), "You are offline.");
        let failed = Error::GenerationFailure("500".into());
        assert_eq!(friendly_message(&failed, "Try again."), "Try again.");
    }
}
