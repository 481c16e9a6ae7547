//! Cache-first word lookups and section summaries.

use tracing::{debug, info, warn};

use super::cache::{AnnotationCache, Definition};
use super::client::{GenerationClient, GenerationRequest};
use super::parse::{example_uses_word, parse_definition, parse_example};
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::util::truncate_chars;

pub const OFFLINE_DEFINITION: &str = "You are offline. No cached definition available.";
pub const OFFLINE_SUMMARY: &str = "You are offline. No cached summary available.";

fn definition_prompt(word: &str) -> String {
    format!(
        "For the word \"{word}\", provide:\n\
         1. A brief, simple definition in one sentence.\n\
         2. A simple example sentence using the word.\n\
         \n\
         Format your response as:\n\
         Definition: [definition]\n\
         Example: [example sentence]"
    )
}

fn strict_example_prompt(word: &str) -> String {
    format!(
        "Write one simple example sentence that contains the exact word \"{word}\".\n\
         Format your response as:\n\
         Example: [example sentence]"
    )
}

fn summary_prompt(text: &str) -> String {
    format!("Summarize the following text in 5-6 sentences:\n\n{text}")
}

/// Looks words and sections up, cache first, generating on a miss.
pub struct AnnotationService {
    client: Box<dyn GenerationClient>,
    cache: AnnotationCache,
    config: ReaderConfig,
    online: bool,
}

impl AnnotationService {
    pub fn new(
        client: Box<dyn GenerationClient>,
        cache: AnnotationCache,
        config: ReaderConfig,
    ) -> Self {
        Self {
            client,
            cache,
            config,
            online: true,
        }
    }

    pub fn cache(&self) -> &AnnotationCache {
        &self.cache
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn set_online(&mut self, online: bool) {
        if self.online != online {
            info!(online, "connectivity changed");
        }
        self.online = online;
    }

    /// Definition of `word`: from the cache if present, otherwise generated
    /// and cached before returning.
    pub async fn lookup_word(&self, word: &str) -> Result<Definition> {
        let word = word.trim();
        if let Some(cached) = self.cache.definition(word) {
            return Ok(cached);
        }
        if !self.online {
            return Err(Error::Unavailable(OFFLINE_DEFINITION.into()));
        }

        debug!(word, "definition cache miss");
        let request = GenerationRequest::prompt(
            &self.config.model,
            definition_prompt(word),
            self.config.definition_max_tokens,
        );
        let content = self.client.generate(&request).await?;
        let mut definition = parse_definition(&content);

        if self.config.retry_example_without_word && !example_uses_word(&definition.example, word) {
            self.retry_example(word, &mut definition).await;
        }

        // A failed write only costs a future cache miss
        if let Err(e) = self.cache.put_definition(word, &definition) {
            warn!(word, error = %e, "could not cache definition");
        }
        Ok(definition)
    }

    async fn retry_example(&self, word: &str, definition: &mut Definition) {
        let request = GenerationRequest::prompt(
            &self.config.model,
            strict_example_prompt(word),
            self.config.definition_max_tokens,
        );
        match self.client.generate(&request).await {
            Ok(content) => {
                let example = parse_example(&content);
                if example_uses_word(&example, word) {
                    definition.example = example;
                } else {
                    debug!(word, "retried example still omits the word");
                }
            }
            Err(e) => debug!(word, error = %e, "example retry failed"),
        }
    }

    /// Forget the cached definition of `word`.
    ///
    /// Word units already marked defined are left alone; sweeping them is
    /// up to the caller.
    pub fn remove_word(&self, word: &str) -> Result<()> {
        self.cache.remove_definition(word)
    }

    /// Summary of a section's text, cache first.
    ///
    /// A failed generation falls back to a cached summary when there is one.
    pub async fn summarize_section(&self, text: &str) -> Result<String> {
        let len = text.chars().count();
        if len < self.config.min_summary_chars {
            return Err(Error::InsufficientText {
                len,
                min: self.config.min_summary_chars,
            });
        }

        if let Some(summary) = self.cache.summary(text) {
            return Ok(summary);
        }
        if !self.online {
            return Err(Error::Unavailable(OFFLINE_SUMMARY.into()));
        }

        let request = GenerationRequest::prompt(
            &self.config.model,
            summary_prompt(truncate_chars(text, self.config.max_summary_text)),
            self.config.summary_max_tokens,
        );
        match self.client.generate(&request).await {
            Ok(summary) => {
                let summary = summary.trim().to_string();
                if let Err(e) = self.cache.put_summary(text, &summary) {
                    warn!(error = %e, "could not cache summary");
                }
                Ok(summary)
            }
            Err(e) => match self.cache.summary(text) {
                Some(summary) => {
                    warn!(error = %e, "summary generation failed, using cached summary");
                    Ok(summary)
                }
                None => Err(e),
            },
        }
    }
}
