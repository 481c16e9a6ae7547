//! Word definitions and section summaries, cache first.
//!
//! The [`AnnotationService`] answers from the [`AnnotationCache`] when it can
//! and calls a [`GenerationClient`] only on a miss. Both the cache and the
//! session metadata live in one [`KeyValueStore`].

mod cache;
mod client;
mod parse;
mod service;
mod store;

pub use cache::{AnnotationCache, Definition, definition_key, summary_key};
pub use client::{
    ChatMessage, GenerationClient, GenerationRequest, HttpGenerationClient,
    parse_generation_response,
};
pub use parse::{example_uses_word, parse_definition, parse_example};
pub use service::{AnnotationService, OFFLINE_DEFINITION, OFFLINE_SUMMARY};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
