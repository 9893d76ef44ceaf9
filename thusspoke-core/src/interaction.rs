//! Per-NPC interaction state machine.
//!
//! ```text
//!            ask answered (tolerance > 0)
//!   ┌──────┐ ─────────────────────────────▶ ┌──────────┐
//!   │ Idle │                                │ Cooldown │
//!   └──────┘ ◀───────────────────────────── └──────────┘
//!                  cooldown timer fires
//! ```
//!
//! Each state owns the timer handles that are valid in it. Idle holds the
//! banter timer (if the NPC banters); Cooldown holds only its expiry timer,
//! so banter is cancelled for as long as the NPC is cooling down. Every
//! transition cancels what the old state owned before scheduling anything.

use tracing::debug;

use crate::config::NpcConfig;
use crate::timer::{TimerHandle, TimerKind, TimerQueue};
use crate::types::NpcId;

/// Current interaction state and the timers it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    /// Accepting questions; banter ticking if configured.
    Idle {
        /// Repeating banter timer, `None` when banter is disabled.
        banter: Option<TimerHandle>,
    },
    /// Rejecting questions until `expiry` fires.
    Cooldown {
        /// One-shot timer that returns the NPC to Idle.
        expiry: TimerHandle,
    },
}

impl InteractionState {
    /// Initial state: Idle, with the banter timer started if enabled.
    pub fn start(npc: &NpcId, config: &NpcConfig, timers: &mut TimerQueue) -> Self {
        Self::Idle {
            banter: start_banter(npc, config, timers),
        }
    }

    /// Whether questions are currently rejected.
    #[must_use]
    pub fn is_cooling_down(&self) -> bool {
        matches!(self, Self::Cooldown { .. })
    }

    /// The live banter timer, if any.
    #[must_use]
    pub fn banter_timer(&self) -> Option<TimerHandle> {
        match self {
            Self::Idle { banter } => *banter,
            Self::Cooldown { .. } => None,
        }
    }

    /// The live cooldown timer, if any.
    #[must_use]
    pub fn cooldown_timer(&self) -> Option<TimerHandle> {
        match self {
            Self::Idle { .. } => None,
            Self::Cooldown { expiry } => Some(*expiry),
        }
    }

    /// A question was answered. With a non-zero tolerance, suspend banter
    /// and start the quiet period; otherwise stay Idle.
    pub fn answered(&mut self, npc: &NpcId, config: &NpcConfig, timers: &mut TimerQueue) {
        if config.tolerance_ms == 0 {
            return;
        }
        self.cancel_timers(timers);
        let expiry = timers.schedule_once(npc.clone(), TimerKind::Cooldown, config.tolerance_ms);
        debug!(npc = %npc, tolerance_ms = config.tolerance_ms, "entering cooldown");
        *self = Self::Cooldown { expiry };
    }

    /// The timer `handle` fired. If it is this state's cooldown expiry,
    /// return to Idle and restart banter at the full interval.
    ///
    /// Returns whether a transition happened.
    pub fn cooldown_elapsed(
        &mut self,
        handle: TimerHandle,
        npc: &NpcId,
        config: &NpcConfig,
        timers: &mut TimerQueue,
    ) -> bool {
        match *self {
            Self::Cooldown { expiry } if expiry == handle => {
                *self = Self::start(npc, config, timers);
                debug!(npc = %npc, "cooldown over");
                true
            }
            _ => false,
        }
    }

    /// Cancel every timer this state owns. Safe to call repeatedly.
    pub fn cancel_timers(&mut self, timers: &mut TimerQueue) {
        match *self {
            Self::Idle { banter } => {
                if let Some(handle) = banter {
                    timers.cancel(handle);
                }
                *self = Self::Idle { banter: None };
            }
            Self::Cooldown { expiry } => {
                timers.cancel(expiry);
            }
        }
    }
}

fn start_banter(npc: &NpcId, config: &NpcConfig, timers: &mut TimerQueue) -> Option<TimerHandle> {
    config
        .banters()
        .then(|| timers.schedule_repeating(npc.clone(), TimerKind::Banter, config.banter_interval_ms))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
