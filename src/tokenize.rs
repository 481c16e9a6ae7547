//! Lazy, visibility-driven word tokenization.
//!
//! Text is wrapped into word units one block at a time, the first time the
//! host reports that block as (nearly) visible. Display state lives in a
//! [`WordTable`] keyed by the unit's node, not in element classes.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::document::Document;
use crate::dom::{Attribute, Dom, NodeId};
use crate::util::normalize_word;

/// Class carried by every word-unit span.
pub const WORD_CLASS: &str = "word";

/// Elements that own the text directly beneath them for tokenization.
///
/// Wider than the segmentation block set so that table cells, list terms and
/// sectioning content become observable on their own.
const OWNER_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "section", "article",
    "aside", "header", "footer", "nav", "main", "figure", "figcaption", "table", "caption", "td",
    "th", "dd", "dt", "pre", "address",
];

fn is_owner(dom: &Dom, id: NodeId) -> bool {
    dom.element_name(id)
        .is_some_and(|n| OWNER_TAGS.contains(&n.as_ref()))
}

/// Display state of a word unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordState {
    #[default]
    Plain,
    /// Transient: part of a selection being composed.
    Highlighted,
    /// Persistent: a cached definition exists for the word.
    Defined,
}

/// One clickable word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordUnit {
    /// The run of non-whitespace characters as it appears in the text.
    pub text: String,
    /// Lowercased, trimmed form used for cache keys and sweeps.
    pub normalized: String,
    pub state: WordState,
    /// The block whose tokenization created this unit.
    pub block: NodeId,
}

/// Display state for every word unit created so far.
#[derive(Debug, Default)]
pub struct WordTable {
    units: HashMap<NodeId, WordUnit>,
}

impl WordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&WordUnit> {
        self.units.get(&id)
    }

    pub fn state(&self, id: NodeId) -> Option<WordState> {
        self.units.get(&id).map(|u| u.state)
    }

    /// Set a unit's state. Returns false for unknown nodes.
    pub fn set_state(&mut self, id: NodeId, state: WordState) -> bool {
        match self.units.get_mut(&id) {
            Some(unit) => {
                unit.state = state;
                true
            }
            None => false,
        }
    }

    pub fn is_highlighted(&self, id: NodeId) -> bool {
        self.state(id) == Some(WordState::Highlighted)
    }

    pub fn highlighted(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.units
            .iter()
            .filter(|(_, u)| u.state == WordState::Highlighted)
            .map(|(&id, _)| id)
    }

    /// Drop every transient highlight. Returns how many were cleared.
    pub fn clear_highlights(&mut self) -> usize {
        let mut cleared = 0;
        for unit in self.units.values_mut() {
            if unit.state == WordState::Highlighted {
                unit.state = WordState::Plain;
                cleared += 1;
            }
        }
        cleared
    }

    /// Mark every unit whose normalized text matches `word` as defined.
    pub fn mark_defined(&mut self, word: &str) -> usize {
        self.sweep(word, WordState::Defined)
    }

    /// Return every defined unit matching `word` to plain.
    pub fn unmark_defined(&mut self, word: &str) -> usize {
        let key = normalize_word(word);
        let mut changed = 0;
        for unit in self.units.values_mut() {
            if unit.normalized == key && unit.state == WordState::Defined {
                unit.state = WordState::Plain;
                changed += 1;
            }
        }
        changed
    }

    pub fn is_defined(&self, word: &str) -> bool {
        let key = normalize_word(word);
        self.units
            .values()
            .any(|u| u.normalized == key && u.state == WordState::Defined)
    }

    fn sweep(&mut self, word: &str, state: WordState) -> usize {
        let key = normalize_word(word);
        let mut changed = 0;
        for unit in self.units.values_mut() {
            if unit.normalized == key && unit.state != state {
                unit.state = state;
                changed += 1;
            }
        }
        changed
    }

    fn insert(&mut self, id: NodeId, unit: WordUnit) {
        self.units.insert(id, unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Source of visibility notifications, implemented by the host.
///
/// The host calls back into [`Tokenizer::on_visible`] once an observed block
/// comes within `margin_px` of the viewport.
pub trait ViewportObserver {
    fn observe(&mut self, block: NodeId, margin_px: u32);
}

/// Wraps text into word units, one block at a time.
#[derive(Debug, Default)]
pub struct Tokenizer {
    wrapped: HashSet<NodeId>,
    words: WordTable,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn words(&self) -> &WordTable {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut WordTable {
        &mut self.words
    }

    /// Blocks that own readable text, in document order.
    ///
    /// Text with no owning block belongs to the body itself.
    pub fn visibility_targets(doc: &Document) -> Vec<NodeId> {
        let dom = doc.dom();
        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        let leaves = doc.text_leaves(doc.body(), |dom, id| {
            dom.is_non_content(id) || doc.is_marker(id)
        });
        for leaf in leaves {
            if dom.text_content(leaf).is_none_or(|t| t.trim().is_empty()) {
                continue;
            }
            let owner = doc.nearest_ancestor(leaf, is_owner).unwrap_or(doc.body());
            if seen.insert(owner) {
                targets.push(owner);
            }
        }
        targets
    }

    /// Register every visibility target with the host's observer.
    pub fn attach(doc: &Document, observer: &mut dyn ViewportObserver, margin_px: u32) -> usize {
        let targets = Self::visibility_targets(doc);
        for &block in &targets {
            observer.observe(block, margin_px);
        }
        targets.len()
    }

    /// Wrap the text owned by `block` into word units.
    ///
    /// Only the first call per block does anything; repeats return 0. Units
    /// whose normalized text satisfies `is_cached` start out defined.
    pub fn on_visible<F>(&mut self, doc: &mut Document, block: NodeId, is_cached: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        if !self.wrapped.insert(block) {
            return 0;
        }

        // Existing units belong to an earlier visit; nested owners get their own
        let words = &self.words;
        let leaves = doc.text_leaves(block, |dom, id| {
            dom.is_non_content(id)
                || doc.is_marker(id)
                || words.get(id).is_some()
                || (id != block && is_owner(dom, id))
        });

        let dom = doc.dom_mut();
        let mut created = 0;
        for leaf in leaves {
            let Some(text) = dom.text_content(leaf).map(str::to_owned) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }

            for run in split_runs(&text) {
                let node = if run.trim().is_empty() {
                    dom.create_text(run.to_string())
                } else {
                    let span =
                        dom.create_html_element("span", vec![Attribute::new("class", WORD_CLASS)]);
                    let inner = dom.create_text(run.to_string());
                    dom.append(span, inner);

                    let normalized = normalize_word(run);
                    let state = if is_cached(&normalized) {
                        WordState::Defined
                    } else {
                        WordState::Plain
                    };
                    self.words.insert(
                        span,
                        WordUnit {
                            text: run.to_string(),
                            normalized,
                            state,
                            block,
                        },
                    );
                    created += 1;
                    span
                };
                dom.insert_before(leaf, node);
            }
            dom.detach(leaf);
        }

        debug!(block = block.0, units = created, "tokenized block");
        created
    }

    /// Tokenize every target at once (used when rendering a whole book).
    pub fn wrap_all<F>(&mut self, doc: &mut Document, is_cached: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        Self::visibility_targets(doc)
            .into_iter()
            .map(|block| self.on_visible(doc, block, &is_cached))
            .sum()
    }

    /// The word unit preceding or following `id` in document order, within
    /// the body. Nodes that are not units are passed over.
    pub fn neighbor(&self, doc: &Document, id: NodeId, forward: bool) -> Option<NodeId> {
        let dom = doc.dom();
        let body = doc.body();
        let mut current = id;
        loop {
            current = if forward {
                dom.next_in_order(current, body, current != id)?
            } else {
                dom.prev_in_order(current, body)?
            };
            if current == body {
                return None;
            }
            if self.words.get(current).is_some() {
                return Some(current);
            }
        }
    }
}

/// Split text into alternating whitespace / non-whitespace runs, in order.
fn split_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (idx, c) in text.char_indices() {
        let space = c.is_whitespace();
        match in_space {
            Some(prev) if prev != space => {
                runs.push(&text[start..idx]);
                start = idx;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        runs.push(&text[start..]);
    }
    runs
}
