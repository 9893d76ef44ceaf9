//! The speech sink.
//!
//! The engine decides *what* is said and *when*; rendering it (chat log,
//! speech bubble, audio) belongs to the host. The sink is called
//! synchronously and must not panic.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::{NpcId, Rewards};

/// Receives every line an NPC speaks.
pub trait Speaker: Send {
    /// Render `text` for `npc`, granting `rewards`.
    fn speak(&mut self, npc: &NpcId, text: &str, rewards: &Rewards);
}

impl<F> Speaker for F
where
    F: FnMut(&NpcId, &str, &Rewards) + Send,
{
    fn speak(&mut self, npc: &NpcId, text: &str, rewards: &Rewards) {
        self(npc, text, rewards);
    }
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Speaker for Silent {
    fn speak(&mut self, _npc: &NpcId, _text: &str, _rewards: &Rewards) {}
}

/// Helper that pins a closure's signature so argument types need not be
/// spelled out.
pub fn from_fn<F>(f: F) -> F
where
    F: FnMut(&NpcId, &str, &Rewards) + Send,
{
    f
}

/// One rendered line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Who spoke.
    pub npc: NpcId,
    /// What was said.
    pub text: String,
    /// What was granted.
    pub rewards: Rewards,
}

/// A sink that records every line. Clones share the same log, so one clone
/// can be handed to the engine and another kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct Transcript(Arc<Mutex<Vec<Line>>>);

impl Transcript {
    /// Empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every line so far.
    #[must_use]
    pub fn lines(&self) -> Vec<Line> {
        self.0.lock().clone()
    }

    /// Just the spoken texts, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.0.lock().iter().map(|l| l.text.clone()).collect()
    }

    /// Number of lines recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Whether nothing has been said.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Drop all recorded lines.
    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

impl Speaker for Transcript {
    fn speak(&mut self, npc: &NpcId, text: &str, rewards: &Rewards) {
        self.0.lock().push(Line {
            npc: npc.clone(),
            text: text.to_string(),
            rewards: rewards.clone(),
        });
    }
}
