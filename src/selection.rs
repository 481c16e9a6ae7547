//! Click-driven selection: highlighting words and composing phrases.
//!
//! The engine owns the pending selection and the debounce deadline. Time is
//! passed in explicitly; the session decides when to call [`SelectionEngine::fire`].
//!
//! ```text
//! Idle ──click plain──▶ Pending ──deadline──▶ lookup, Idle
//!   ▲                     │  ▲
//!   └──click highlighted──┘  └─click plain (restart timer)
//! ```

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::document::Document;
use crate::dom::NodeId;
use crate::tokenize::{Tokenizer, WordState, WordTable};
use crate::util::is_whitespace_or_punctuation;

/// Word or phrase to look up, with the units it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub text: String,
    pub units: Vec<NodeId>,
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The word is already defined: look it up now, no composition.
    Immediate(LookupRequest),
    /// The selection grew (or started); the lookup fires at `deadline`.
    Pending { units: Vec<NodeId>, deadline: Instant },
    /// A highlighted word was toggled off; composition is abandoned.
    Cancelled,
    /// Not a word unit.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    Pending { deadline: Instant },
}

pub struct SelectionEngine {
    delay: Duration,
    window: usize,
    pending: Vec<NodeId>,
    deadline: Option<Instant>,
}

impl SelectionEngine {
    /// `delay` is the debounce window; `window` bounds the neighbor scan in
    /// each direction, counted in word units.
    pub fn new(delay: Duration, window: usize) -> Self {
        Self {
            delay,
            window,
            pending: Vec::new(),
            deadline: None,
        }
    }

    pub fn state(&self) -> SelectionState {
        match self.deadline {
            Some(deadline) => SelectionState::Pending { deadline },
            None => SelectionState::Idle,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn pending(&self) -> &[NodeId] {
        &self.pending
    }

    /// Handle a click on `unit` at time `now`.
    pub fn click(
        &mut self,
        doc: &Document,
        tokenizer: &mut Tokenizer,
        unit: NodeId,
        now: Instant,
    ) -> ClickOutcome {
        let Some(state) = tokenizer.words().state(unit) else {
            return ClickOutcome::Ignored;
        };

        match state {
            WordState::Defined => ClickOutcome::Immediate(LookupRequest {
                text: unit_text(tokenizer.words(), unit).to_string(),
                units: vec![unit],
            }),
            WordState::Highlighted => {
                tokenizer.words_mut().set_state(unit, WordState::Plain);
                self.pending.clear();
                self.deadline = None;
                debug!(unit = unit.0, "selection cancelled");
                ClickOutcome::Cancelled
            }
            WordState::Plain => {
                tokenizer.words_mut().set_state(unit, WordState::Highlighted);
                let deadline = now + self.delay;
                self.deadline = Some(deadline);
                self.pending = adjacent_highlighted(doc, tokenizer, unit, self.window);
                debug!(units = self.pending.len(), "selection pending");
                ClickOutcome::Pending {
                    units: self.pending.clone(),
                    deadline,
                }
            }
        }
    }

    /// Resolve the pending selection if its deadline has passed.
    pub fn fire(&mut self, words: &mut WordTable, now: Instant) -> Option<LookupRequest> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        let units = std::mem::take(&mut self.pending);
        if units.is_empty() {
            return None;
        }

        if units.len() > 1 {
            for &id in &units {
                words.set_state(id, WordState::Highlighted);
            }
        }
        let text = units
            .iter()
            .filter_map(|&id| words.get(id))
            .map(|u| u.text.trim())
            .collect::<Vec<_>>()
            .join(" ");

        debug!(phrase = %text, units = units.len(), "selection fired");
        Some(LookupRequest { text, units })
    }

    /// Drop all transient highlights and any pending selection (scroll,
    /// panel close).
    pub fn clear(&mut self, words: &mut WordTable) {
        self.pending.clear();
        self.deadline = None;
        words.clear_highlights();
    }
}

fn unit_text(words: &WordTable, id: NodeId) -> &str {
    words.get(id).map_or("", |u| u.text.trim())
}

/// The clicked unit plus its highlighted neighbors, in document order.
///
/// Scans up to `window` units each way. Whitespace/punctuation units and
/// unhighlighted repeats of an already collected word are passed over; any
/// other unhighlighted word ends the scan.
fn adjacent_highlighted(
    doc: &Document,
    tokenizer: &Tokenizer,
    unit: NodeId,
    window: usize,
) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    seen.insert(unit_text(tokenizer.words(), unit));

    let mut before = scan(doc, tokenizer, unit, false, window, &mut seen);
    let after = scan(doc, tokenizer, unit, true, window, &mut seen);

    before.reverse();
    before.push(unit);
    before.extend(after);
    before
}

fn scan<'t>(
    doc: &Document,
    tokenizer: &'t Tokenizer,
    start: NodeId,
    forward: bool,
    window: usize,
    seen: &mut HashSet<&'t str>,
) -> Vec<NodeId> {
    let words = tokenizer.words();
    let mut found = Vec::new();
    let mut current = start;
    for _ in 0..window {
        let Some(next) = tokenizer.neighbor(doc, current, forward) else {
            break;
        };
        current = next;
        let text = unit_text(words, next);
        let highlighted = words.is_highlighted(next);

        if seen.contains(text) && !highlighted {
            continue;
        }
        if highlighted {
            found.push(next);
            seen.insert(text);
        } else if is_whitespace_or_punctuation(text) {
            continue;
        } else {
            break;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(800);

    fn setup(html: &str) -> (Document, Tokenizer, Vec<NodeId>) {
        let mut doc = Document::parse(html).unwrap();
        let mut tokenizer = Tokenizer::new();
        tokenizer.wrap_all(&mut doc, |_| false);
        let units = doc
            .dom()
            .descendants(doc.body())
            .filter(|&id| tokenizer.words().get(id).is_some())
            .collect();
        (doc, tokenizer, units)
    }

    #[test]
    fn test_two_adjacent_clicks_compose_one_phrase() {
        let (doc, mut tok, u) = setup("<p>the New York times</p>");
        let mut engine = SelectionEngine::new(DELAY, 10);
        let t0 = Instant::now();

        assert!(matches!(
            engine.click(&doc, &mut tok, u[1], t0),
            ClickOutcome::Pending { .. }
        ));
        let t1 = t0 + Duration::from_millis(300);
        let outcome = engine.click(&doc, &mut tok, u[2], t1);
        assert_eq!(
            outcome,
            ClickOutcome::Pending {
                units: vec![u[1], u[2]],
                deadline: t1 + DELAY
            }
        );

        // First timer was replaced
        assert_eq!(engine.fire(tok.words_mut(), t0 + DELAY), None);
        let request = engine.fire(tok.words_mut(), t1 + DELAY).unwrap();
        assert_eq!(request.text, "New York");
        assert_eq!(request.units, vec![u[1], u[2]]);
        assert_eq!(engine.state(), SelectionState::Idle);
        assert_eq!(engine.fire(tok.words_mut(), t1 + DELAY * 2), None);
    }

    #[test]
    fn test_single_word_fires_alone() {
        let (doc, mut tok, u) = setup("<p>alpha beta</p>");
        let mut engine = SelectionEngine::new(DELAY, 10);
        let t0 = Instant::now();
        engine.click(&doc, &mut tok, u[0], t0);
        let request = engine.fire(tok.words_mut(), t0 + DELAY).unwrap();
        assert_eq!(request.text, "alpha");
    }

    #[test]
    fn test_toggle_off_cancels() {
        let (doc, mut tok, u) = setup("<p>alpha beta</p>");
        let mut engine = SelectionEngine::new(DELAY, 10);
        let t0 = Instant::now();
        engine.click(&doc, &mut tok, u[0], t0);
        assert_eq!(engine.click(&doc, &mut tok, u[0], t0), ClickOutcome::Cancelled);
        assert_eq!(tok.words().state(u[0]), Some(WordState::Plain));
        assert!(engine.pending().is_empty());
        assert_eq!(engine.fire(tok.words_mut(), t0 + DELAY), None);
    }

    #[test]
    fn test_defined_word_bypasses_selection() {
        let (doc, mut tok, u) = setup("<p>alpha beta</p>");
        tok.words_mut().mark_defined("beta");
        let mut engine = SelectionEngine::new(DELAY, 10);
        let outcome = engine.click(&doc, &mut tok, u[1], Instant::now());
        assert_eq!(
            outcome,
            ClickOutcome::Immediate(LookupRequest {
                text: "beta".into(),
                units: vec![u[1]]
            })
        );
        assert_eq!(engine.state(), SelectionState::Idle);
    }

    #[test]
    fn test_scan_skips_punctuation_and_stops_at_plain_words() {
        let (doc, mut tok, u) = setup("<p>far away — here now</p>");
        // units: far, away, —, here, now
        let mut engine = SelectionEngine::new(DELAY, 10);
        let t0 = Instant::now();
        engine.click(&doc, &mut tok, u[1], t0);
        engine.click(&doc, &mut tok, u[3], t0);
        assert_eq!(engine.pending(), &[u[1], u[3]]);

        let request = engine.fire(tok.words_mut(), t0 + DELAY).unwrap();
        assert_eq!(request.text, "away here");
    }

    #[test]
    fn test_scan_skips_unhighlighted_duplicates() {
        let (doc, mut tok, u) = setup("<p>big cat big dog</p>");
        let mut engine = SelectionEngine::new(DELAY, 10);
        let t0 = Instant::now();
        engine.click(&doc, &mut tok, u[1], t0);
        engine.click(&doc, &mut tok, u[2], t0);
        assert_eq!(engine.pending(), &[u[1], u[2]]);

        // "big" at u[0] is an unhighlighted repeat of a collected word: skipped
        engine.click(&doc, &mut tok, u[3], t0);
        assert_eq!(engine.pending(), &[u[1], u[2], u[3]]);
        let request = engine.fire(tok.words_mut(), t0 + DELAY).unwrap();
        assert_eq!(request.text, "cat big dog");
    }

    #[test]
    fn test_window_bounds_the_scan() {
        let (doc, mut tok, u) = setup("<p>a , , , b</p>");
        let t0 = Instant::now();

        let mut narrow = SelectionEngine::new(DELAY, 2);
        narrow.click(&doc, &mut tok, u[0], t0);
        narrow.click(&doc, &mut tok, u[4], t0);
        assert_eq!(narrow.pending(), &[u[4]]);

        narrow.clear(tok.words_mut());
        let mut wide = SelectionEngine::new(DELAY, 4);
        wide.click(&doc, &mut tok, u[0], t0);
        wide.click(&doc, &mut tok, u[4], t0);
        assert_eq!(wide.pending(), &[u[0], u[4]]);
    }

    #[test]
    fn test_clear_drops_everything() {
        let (doc, mut tok, u) = setup("<p>alpha beta</p>");
        let mut engine = SelectionEngine::new(DELAY, 10);
        let t0 = Instant::now();
        engine.click(&doc, &mut tok, u[0], t0);
        engine.click(&doc, &mut tok, u[1], t0);
        engine.clear(tok.words_mut());

        assert_eq!(engine.state(), SelectionState::Idle);
        assert_eq!(tok.words().highlighted().count(), 0);
        assert_eq!(engine.fire(tok.words_mut(), t0 + DELAY), None);
    }

    #[test]
    fn test_click_on_non_unit_is_ignored() {
        let (doc, mut tok, _) = setup("<p>alpha</p>");
        let mut engine = SelectionEngine::new(DELAY, 10);
        assert_eq!(
            engine.click(&doc, &mut tok, doc.body(), Instant::now()),
            ClickOutcome::Ignored
        );
    }
}
