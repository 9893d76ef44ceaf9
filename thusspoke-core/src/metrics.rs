//! Engine counters and tracing span names.
//!
//! The engine is single-context, so counters are plain integers updated in
//! place and copied out by [`crate::Engine::stats`].

use crate::npc::AskOutcome;

/// Running totals since the engine was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// NPCs registered (including replacements).
    pub npcs_created: u64,
    /// NPCs removed by `destroy` or replaced by `create`.
    pub npcs_destroyed: u64,
    /// Questions addressed to registered NPCs.
    pub asks: u64,
    /// Questions answered by a fully matching message.
    pub asks_answered: u64,
    /// Questions answered by the greeting fallback.
    pub asks_greeted: u64,
    /// Questions swallowed because the NPC was cooling down.
    pub asks_in_cooldown: u64,
    /// Questions with no matching message and no greeting.
    pub asks_unmatched: u64,
    /// Questions from beyond the NPC's range.
    pub asks_out_of_range: u64,
    /// Scripted lines spoken through `say`.
    pub scripted_lines: u64,
    /// Banter timer ticks handled.
    pub banter_ticks: u64,
    /// Banter lines actually spoken.
    pub banter_lines: u64,
}

impl EngineStats {
    pub(crate) fn record_ask(&mut self, outcome: AskOutcome) {
        match outcome {
            AskOutcome::Answered => self.asks_answered += 1,
            AskOutcome::Greeted => self.asks_greeted += 1,
            AskOutcome::CoolingDown => self.asks_in_cooldown += 1,
            AskOutcome::NoMatch => self.asks_unmatched += 1,
            AskOutcome::OutOfRange => self.asks_out_of_range += 1,
            AskOutcome::UnknownNpc => return,
        }
        self.asks += 1;
    }

    /// Total lines spoken, from any source.
    #[must_use]
    pub fn lines_spoken(&self) -> u64 {
        self.asks_answered + self.asks_greeted + self.scripted_lines + self.banter_lines
    }

    /// Human-readable one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "npcs={}/{} asks={} answered={} greeted={} cooldown={} unmatched={} out_of_range={} \
             scripted={} banter={}/{}",
            self.npcs_created,
            self.npcs_destroyed,
            self.asks,
            self.asks_answered,
            self.asks_greeted,
            self.asks_in_cooldown,
            self.asks_unmatched,
            self.asks_out_of_range,
            self.scripted_lines,
            self.banter_lines,
            self.banter_ticks,
        )
    }
}

/// Span names used with `tracing` spans.
pub mod spans {
    /// A player question.
    pub const ASK: &str = "thusspoke::ask";
    /// Timer dispatch during `advance`.
    pub const ADVANCE: &str = "thusspoke::advance";
    /// One banter tick.
    pub const BANTER: &str = "thusspoke::banter";
    /// NPC registration.
    pub const CREATE: &str = "thusspoke::create";
}
