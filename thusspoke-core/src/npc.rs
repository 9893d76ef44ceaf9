//! Live state of one registered NPC.

use std::fmt;

use tracing::{debug, trace, trace_span};

use crate::banter::{self, BanterTick};
use crate::config::NpcConfig;
use crate::interaction::InteractionState;
use crate::matcher::{self, MatchOutcome};
use crate::message::NpcMessage;
use crate::metrics::{EngineStats, spans};
use crate::rng::RandomSource;
use crate::speaker::Speaker;
use crate::timer::{FiredTimer, TimerKind, TimerQueue};
use crate::types::{Conditions, NpcId, Rewards};

/// What happened to a question. Informational only: none of these is an
/// error, and only `Answered` and `Greeted` produced speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    /// A fully matching message was spoken.
    Answered,
    /// The greeting fallback was spoken.
    Greeted,
    /// Nothing matched and there is no greeting.
    NoMatch,
    /// The asker was beyond the NPC's range.
    OutOfRange,
    /// The NPC is cooling down; the question was not considered.
    CoolingDown,
    /// No NPC is registered under that id.
    UnknownNpc,
}

impl AskOutcome {
    /// Whether the NPC said something.
    #[must_use]
    pub fn spoke(self) -> bool {
        matches!(self, Self::Answered | Self::Greeted)
    }
}

/// Rule set, settings, sink and state machine of one NPC.
pub struct NpcState {
    id: NpcId,
    config: NpcConfig,
    messages: Vec<NpcMessage>,
    speaker: Box<dyn Speaker>,
    state: InteractionState,
}

impl fmt::Debug for NpcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NpcState")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("messages", &self.messages.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl NpcState {
    pub(crate) fn new(
        id: NpcId,
        config: NpcConfig,
        messages: Vec<NpcMessage>,
        speaker: Box<dyn Speaker>,
        timers: &mut TimerQueue,
    ) -> Self {
        let state = InteractionState::start(&id, &config, timers);
        Self {
            id,
            config,
            messages,
            speaker,
            state,
        }
    }

    /// Registry key.
    #[must_use]
    pub fn id(&self) -> &NpcId {
        &self.id
    }

    /// Effective settings.
    #[must_use]
    pub fn config(&self) -> &NpcConfig {
        &self.config
    }

    /// Rule set in authoring order.
    #[must_use]
    pub fn messages(&self) -> &[NpcMessage] {
        &self.messages
    }

    /// Current interaction state.
    #[must_use]
    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub(crate) fn push_message(&mut self, message: NpcMessage) {
        self.messages.push(message);
    }

    pub(crate) fn ask(&mut self, query: &Conditions, timers: &mut TimerQueue) -> AskOutcome {
        if self.state.is_cooling_down() {
            debug!(npc = %self.id, "question ignored during cooldown");
            return AskOutcome::CoolingDown;
        }

        let (outcome, message) = match matcher::evaluate(query, &self.messages, self.config.range) {
            MatchOutcome::Matched(m) => (AskOutcome::Answered, m),
            MatchOutcome::Greeting(m) => (AskOutcome::Greeted, m),
            MatchOutcome::OutOfRange => {
                debug!(npc = %self.id, range = self.config.range, "question from out of range");
                return AskOutcome::OutOfRange;
            }
            MatchOutcome::NoMatch => {
                debug!(npc = %self.id, "no message matched");
                return AskOutcome::NoMatch;
            }
        };

        debug!(npc = %self.id, ?outcome, text = message.text(), "answering");
        self.speaker.speak(&self.id, message.text(), message.rewards());
        self.state.answered(&self.id, &self.config, timers);
        outcome
    }

    pub(crate) fn say(&mut self, text: &str, rewards: &Rewards) {
        self.speaker.speak(&self.id, text, rewards);
    }

    pub(crate) fn on_timer(
        &mut self,
        fired: &FiredTimer,
        timers: &mut TimerQueue,
        rng: &mut dyn RandomSource,
        stats: &mut EngineStats,
    ) {
        trace!(npc = %self.id, kind = ?fired.kind, at_ms = fired.at_ms, "timer fired");
        match fired.kind {
            TimerKind::Cooldown => {
                self.state.cooldown_elapsed(fired.handle, &self.id, &self.config, timers);
            }
            TimerKind::Banter => {
                if self.state.banter_timer() != Some(fired.handle) {
                    return;
                }
                let _span = trace_span!(spans::BANTER, npc = %self.id).entered();
                stats.banter_ticks += 1;
                if let BanterTick::Speak(message) =
                    banter::tick(&self.messages, self.config.banter_chance_percent, rng)
                {
                    debug!(npc = %self.id, text = message.text(), "banter");
                    self.speaker.speak(&self.id, message.text(), message.rewards());
                    stats.banter_lines += 1;
                }
            }
        }
    }

    pub(crate) fn teardown(&mut self, timers: &mut TimerQueue) {
        self.state.cancel_timers(timers);
    }
}
