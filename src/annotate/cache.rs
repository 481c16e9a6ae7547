//! Annotation cache: definitions and summaries over a key-value store.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::KeyValueStore;
use crate::error::Result;
use crate::util::normalize_word;

/// A cached (or freshly generated) word definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub definition: String,
    #[serde(default)]
    pub example: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CachedSummary {
    summary: String,
}

/// Cache key of a word definition: `definition:<normalized word>`.
pub fn definition_key(word: &str) -> String {
    format!("definition:{}", normalize_word(word))
}

/// Cache key of a section summary.
///
/// Only the first `prefix_chars` characters feed the key, with all whitespace
/// removed and lowercased, so trailing edits to a section reuse the entry.
pub fn summary_key(text: &str, prefix_chars: usize) -> String {
    let prefix: String = text
        .chars()
        .take(prefix_chars)
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    format!("summary:{}", sha1_smol::Sha1::from(prefix).digest())
}

/// Typed view of the annotation entries in a shared store.
#[derive(Clone)]
pub struct AnnotationCache {
    store: Rc<dyn KeyValueStore>,
    summary_prefix: usize,
}

impl AnnotationCache {
    pub fn new(store: Rc<dyn KeyValueStore>, summary_prefix: usize) -> Self {
        Self {
            store,
            summary_prefix,
        }
    }

    pub fn store(&self) -> &Rc<dyn KeyValueStore> {
        &self.store
    }

    /// Cached definition for `word`, if any. Unreadable entries count as misses.
    pub fn definition(&self, word: &str) -> Option<Definition> {
        let key = definition_key(word);
        let raw = self.store.get(&key)?;
        match serde_json::from_str(&raw) {
            Ok(def) => {
                debug!(key = %key, "definition cache hit");
                Some(def)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    pub fn has_definition(&self, word: &str) -> bool {
        self.store.get(&definition_key(word)).is_some()
    }

    pub fn put_definition(&self, word: &str, definition: &Definition) -> Result<()> {
        let json = serde_json::to_string(definition)?;
        self.store.set(&definition_key(word), &json)
    }

    pub fn remove_definition(&self, word: &str) -> Result<()> {
        self.store.delete(&definition_key(word))
    }

    pub fn summary(&self, text: &str) -> Option<String> {
        let key = summary_key(text, self.summary_prefix);
        let raw = self.store.get(&key)?;
        match serde_json::from_str::<CachedSummary>(&raw) {
            Ok(cached) => {
                debug!(key = %key, "summary cache hit");
                Some(cached.summary)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    pub fn put_summary(&self, text: &str, summary: &str) -> Result<()> {
        let json = serde_json::to_string(&CachedSummary {
            summary: summary.to_string(),
        })?;
        self.store
            .set(&summary_key(text, self.summary_prefix), &json)
    }
}
