//! The engine: an owned registry of NPCs plus the clock that drives them.
//!
//! All operations run to completion on the caller's thread. Timers only
//! fire inside [`Engine::advance`], so a question and a pending banter tick
//! or cooldown expiry can never interleave.
//!
//! ```
//! use std::time::Duration;
//! use thusspoke_core::{Engine, EngineConfig, NpcConfig, ScalarMap, speaker::Transcript};
//!
//! let log = Transcript::new();
//! let mut engine = Engine::new(EngineConfig::default());
//! engine.create(
//!     1,
//!     log.clone(),
//!     NpcConfig::default().with_tolerance_ms(1000),
//!     "greeting=true|Hello!|<<<item=ring|You found my ring!|<<<",
//! )?;
//!
//! engine.ask(1, "item=ring")?;
//! engine.ask(1, "item=ring")?; // cooling down: swallowed
//! engine.advance(Duration::from_millis(1000));
//! engine.ask(1, ScalarMap::new())?; // greeting fallback
//!
//! assert_eq!(log.texts(), ["You found my ring!", "Hello!"]);
//! # Ok::<(), thusspoke_core::EngineError>(())
//! ```

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, info_span, trace_span};

use crate::codec::{ConditionSource, RuleSource};
use crate::config::{DriverConfig, EngineConfig, NpcConfig, NpcDefinition};
use crate::error::Result;
use crate::message::NpcMessage;
use crate::metrics::{EngineStats, spans};
use crate::npc::{AskOutcome, NpcState};
use crate::rng::{RandomSource, StdRandom};
use crate::speaker::Speaker;
use crate::timer::TimerQueue;
use crate::types::{NpcId, Rewards};

/// Registry of NPCs with their timers.
pub struct Engine {
    npcs: HashMap<NpcId, NpcState>,
    timers: TimerQueue,
    elapsed: Duration,
    rng: Box<dyn RandomSource>,
    defaults: NpcConfig,
    driver: DriverConfig,
    stats: EngineStats,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("npcs", &self.npcs.len())
            .field("timers", &self.timers.len())
            .field("elapsed", &self.elapsed)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Empty engine using an entropy-seeded random source. NPCs listed in
    /// `config` are not registered; see [`Engine::load`].
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_random(config, StdRandom::from_entropy())
    }

    /// Empty engine with an injected random source.
    #[must_use]
    pub fn with_random(config: EngineConfig, rng: impl RandomSource + 'static) -> Self {
        Self {
            npcs: HashMap::new(),
            timers: TimerQueue::new(),
            elapsed: Duration::ZERO,
            rng: Box::new(rng),
            defaults: config.defaults,
            driver: config.driver,
            stats: EngineStats::default(),
        }
    }

    /// Engine with every NPC declared in `config` registered, each with the
    /// sink `speaker_for` returns for its id.
    ///
    /// # Errors
    /// Fails on the first invalid definition; nothing is registered then.
    pub fn load<S, F>(config: EngineConfig, rng: impl RandomSource + 'static, mut speaker_for: F) -> Result<Self>
    where
        S: Speaker + 'static,
        F: FnMut(&NpcId) -> S,
    {
        config.validate()?;
        let definitions = config.npcs.clone();
        let mut engine = Self::with_random(config, rng);
        for def in definitions {
            let speaker = speaker_for(&def.id);
            engine.create_from_definition(def, speaker)?;
        }
        Ok(engine)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Register an NPC, replacing (and tearing down) any NPC already
    /// registered under `id`. Banter starts immediately if enabled.
    ///
    /// # Errors
    /// [`crate::EngineError::Config`] for invalid settings,
    /// [`crate::EngineError::Validation`] or [`crate::EngineError::Format`]
    /// for a bad rule set. On error any existing NPC is left untouched.
    pub fn create(
        &mut self,
        id: impl Into<NpcId>,
        speaker: impl Speaker + 'static,
        config: NpcConfig,
        messages: impl Into<RuleSource>,
    ) -> Result<()> {
        let id = id.into();
        let _span = info_span!(spans::CREATE, npc = %id).entered();
        config.validate()?;
        let messages = messages.into().resolve()?;

        if let Some(mut previous) = self.npcs.remove(&id) {
            previous.teardown(&mut self.timers);
            self.stats.npcs_destroyed += 1;
            info!(npc = %id, "replacing existing NPC");
        }

        info!(
            npc = %id,
            messages = messages.len(),
            tolerance_ms = config.tolerance_ms,
            banter_interval_ms = config.banter_interval_ms,
            "NPC registered"
        );
        let state = NpcState::new(id.clone(), config, messages, Box::new(speaker), &mut self.timers);
        self.npcs.insert(id, state);
        self.stats.npcs_created += 1;
        Ok(())
    }

    /// Register an NPC from a configuration entry, filling unset fields from
    /// the engine's defaults.
    ///
    /// # Errors
    /// Same as [`Engine::create`].
    pub fn create_from_definition(&mut self, definition: NpcDefinition, speaker: impl Speaker + 'static) -> Result<()> {
        let config = definition.config(&self.defaults);
        self.create(definition.id, speaker, config, definition.messages)
    }

    /// Remove an NPC and cancel its timers. Returns whether it existed.
    pub fn destroy(&mut self, id: impl Into<NpcId>) -> bool {
        let id = id.into();
        let Some(mut npc) = self.npcs.remove(&id) else {
            debug!(npc = %id, "destroy: unknown NPC");
            return false;
        };
        npc.teardown(&mut self.timers);
        self.stats.npcs_destroyed += 1;
        info!(npc = %id, "NPC destroyed");
        true
    }

    /// Remove every NPC.
    pub fn destroy_all(&mut self) {
        let ids: Vec<NpcId> = self.npcs.keys().cloned().collect();
        for id in ids {
            self.destroy(id);
        }
    }

    // -----------------------------------------------------------------------
    // Interaction
    // -----------------------------------------------------------------------

    /// Append a rule to an NPC's rule set. Unknown ids are ignored.
    ///
    /// # Errors
    /// [`crate::EngineError::Validation`] for empty conditions or text,
    /// [`crate::EngineError::Format`] for malformed encoded conditions. The
    /// message is validated before the id is looked up.
    pub fn add(
        &mut self,
        id: impl Into<NpcId>,
        conditions: impl Into<ConditionSource>,
        text: impl Into<String>,
        rewards: Rewards,
    ) -> Result<()> {
        let id = id.into();
        let message = NpcMessage::new(conditions.into().resolve()?, text, rewards)?;
        match self.npcs.get_mut(&id) {
            Some(npc) => {
                debug!(npc = %id, text = message.text(), "rule added");
                npc.push_message(message);
            }
            None => debug!(npc = %id, "add: unknown NPC"),
        }
        Ok(())
    }

    /// Ask an NPC something. Speaks at most once.
    ///
    /// # Errors
    /// [`crate::EngineError::Format`] only, for malformed encoded
    /// conditions. Unknown ids, cooldowns and misses are reported through
    /// [`AskOutcome`].
    pub fn ask(&mut self, id: impl Into<NpcId>, conditions: impl Into<ConditionSource>) -> Result<AskOutcome> {
        let id = id.into();
        let query = conditions.into().resolve()?;
        let _span = info_span!(spans::ASK, npc = %id).entered();

        let outcome = match self.npcs.get_mut(&id) {
            Some(npc) => npc.ask(&query, &mut self.timers),
            None => {
                debug!(npc = %id, "ask: unknown NPC");
                AskOutcome::UnknownNpc
            }
        };
        self.stats.record_ask(outcome);
        Ok(outcome)
    }

    /// Speak `text` through an NPC's sink without matching. Unknown ids are
    /// ignored. Does not affect cooldown.
    pub fn say(&mut self, id: impl Into<NpcId>, text: &str, rewards: &Rewards) {
        let id = id.into();
        match self.npcs.get_mut(&id) {
            Some(npc) => {
                npc.say(text, rewards);
                self.stats.scripted_lines += 1;
            }
            None => debug!(npc = %id, "say: unknown NPC"),
        }
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Move the clock forward by `delta`, firing every timer that falls due
    /// in deadline order.
    pub fn advance(&mut self, delta: Duration) {
        self.elapsed = self.elapsed.saturating_add(delta);
        let target_ms = u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX);
        let _span = trace_span!(spans::ADVANCE, target_ms).entered();

        while let Some(fired) = self.timers.pop_due(target_ms) {
            if let Some(npc) = self.npcs.get_mut(&fired.npc) {
                npc.on_timer(&fired, &mut self.timers, self.rng.as_mut(), &mut self.stats);
            }
        }
        self.timers.set_now(target_ms);
    }

    /// Time elapsed on the engine clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.elapsed
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Whether an NPC is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: impl Into<NpcId>) -> bool {
        self.npcs.contains_key(&id.into())
    }

    /// Number of registered NPCs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    /// Whether no NPCs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }

    /// Registered ids, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &NpcId> {
        self.npcs.keys()
    }

    /// Read-only view of one NPC.
    #[must_use]
    pub fn npc(&self, id: impl Into<NpcId>) -> Option<&NpcState> {
        self.npcs.get(&id.into())
    }

    /// An NPC's rule set in authoring order.
    #[must_use]
    pub fn messages(&self, id: impl Into<NpcId>) -> Option<&[NpcMessage]> {
        self.npc(id).map(NpcState::messages)
    }

    /// Whether an NPC is currently rejecting questions. `false` for
    /// unknown ids.
    #[must_use]
    pub fn is_cooling_down(&self, id: impl Into<NpcId>) -> bool {
        self.npc(id).is_some_and(|npc| npc.state().is_cooling_down())
    }

    /// Number of live timers across all NPCs.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Settings applied to definitions that leave fields out.
    #[must_use]
    pub fn defaults(&self) -> &NpcConfig {
        &self.defaults
    }

    /// Settings for the real-time driver.
    #[must_use]
    pub fn driver_config(&self) -> &DriverConfig {
        &self.driver
    }

    /// Counters since creation.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;
    use crate::message::MessageDraft;
    use crate::speaker::{Silent, Transcript};
    use crate::types::ScalarMap;

    const RULES: &str = "greeting=true|Hello!|<<<item=ring|You found my ring!|gold=5<<<";

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn engine() -> Engine {
        Engine::with_random(EngineConfig::default(), StdRandom::seeded(1))
    }

    #[test]
    fn create_then_ask() {
        let log = Transcript::new();
        let mut engine = engine();
        engine.create("smith", log.clone(), NpcConfig::default(), RULES).expect("valid");

        let outcome = engine.ask("smith", "item=ring").expect("valid query");
        assert_eq!(outcome, AskOutcome::Answered);
        let lines = log.lines();
        assert_eq!(lines[0].text, "You found my ring!");
        assert_eq!(lines[0].npc, NpcId::from("smith"));
        assert_eq!(lines[0].rewards.get("gold").and_then(|g| g.as_number()), Some(5.0));
    }

    #[test]
    fn unknown_ids_are_silent_no_ops() {
        let mut engine = engine();
        assert_eq!(engine.ask("ghost", "a=1").expect("valid"), AskOutcome::UnknownNpc);
        engine.add("ghost", "a=1", "boo", Rewards::new()).expect("valid message");
        engine.say("ghost", "boo", &Rewards::new());
        assert!(!engine.destroy("ghost"));
        assert_eq!(engine.stats().asks, 0);
    }

    #[test]
    fn invalid_rule_set_is_rejected() {
        let mut engine = engine();
        let drafts = vec![MessageDraft {
            text: Some("no conditions".into()),
            ..Default::default()
        }];
        let err = engine.create(1, Silent, NpcConfig::default(), drafts).unwrap_err();
        assert!(matches!(err, EngineError::Validation { field: "conditions", .. }));
        assert!(!engine.contains(1));
    }

    #[test]
    fn failed_create_keeps_previous_npc() {
        let log = Transcript::new();
        let mut engine = engine();
        engine.create(1, log.clone(), NpcConfig::default(), RULES).expect("valid");
        assert!(engine.create(1, Silent, NpcConfig::default(), "broken").is_err());
        assert!(engine.create(1, Silent, NpcConfig::default().with_banter(101, 10), RULES).is_err());
        engine.ask(1, ScalarMap::new()).expect("valid");
        assert_eq!(log.texts(), ["Hello!"]);
    }

    #[test]
    fn recreate_cancels_previous_timers() {
        let old_log = Transcript::new();
        let new_log = Transcript::new();
        let mut engine = engine();
        let banter = NpcConfig::default().with_banter(100, 100);
        engine.create(1, old_log.clone(), banter, "banter=true|old|<<<").expect("valid");
        engine.create(1, new_log.clone(), banter, "banter=true|new|<<<").expect("valid");
        assert_eq!(engine.pending_timers(), 1);

        engine.advance(ms(300));
        assert!(old_log.is_empty());
        assert_eq!(new_log.len(), 3);
        assert_eq!(engine.stats().npcs_destroyed, 1);
    }

    #[test]
    fn recreate_during_cooldown_cancels_expiry() {
        let mut engine = engine();
        let cfg = NpcConfig::default().with_tolerance_ms(1000);
        engine.create(1, Silent, cfg, RULES).expect("valid");
        engine.ask(1, "item=ring").expect("valid");
        assert!(engine.is_cooling_down(1));
        engine.create(1, Silent, cfg, RULES).expect("valid");
        assert!(!engine.is_cooling_down(1));
        assert_eq!(engine.pending_timers(), 0);
    }

    #[test]
    fn destroy_cancels_both_timers() {
        let mut engine = engine();
        let cfg = NpcConfig::default().with_tolerance_ms(500).with_banter(100, 200);
        engine.create(1, Silent, cfg, RULES).expect("valid");
        engine.create(2, Silent, cfg, RULES).expect("valid");
        engine.ask(2, "item=ring").expect("valid");
        assert_eq!(engine.pending_timers(), 2);

        assert!(engine.destroy(1));
        assert!(engine.destroy(2));
        assert!(!engine.destroy(2));
        assert_eq!(engine.pending_timers(), 0);
        assert!(engine.is_empty());
    }

    #[test]
    fn add_appends_in_authoring_order() {
        let log = Transcript::new();
        let mut engine = engine();
        engine.create(1, log.clone(), NpcConfig::default(), RULES).expect("valid");
        engine
            .add(1, ScalarMap::new().with("item", "ring"), "Shadowed.", Rewards::new())
            .expect("valid");
        engine.add(1, "item=sword", "A fine blade.", Rewards::new()).expect("valid");

        engine.ask(1, "item=ring").expect("valid");
        engine.ask(1, "item=sword").expect("valid");
        assert_eq!(log.texts(), ["You found my ring!", "A fine blade."]);
        assert_eq!(engine.messages(1).map(<[NpcMessage]>::len), Some(4));
    }

    #[test]
    fn add_validates_before_lookup() {
        let mut engine = engine();
        let err = engine.add("ghost", ScalarMap::new(), "text", Rewards::new()).unwrap_err();
        assert!(matches!(err, EngineError::Validation { field: "conditions", .. }));
        let err = engine.add("ghost", "a=1", "", Rewards::new()).unwrap_err();
        assert!(matches!(err, EngineError::Validation { field: "text", .. }));
    }

    #[test]
    fn malformed_encoded_query_is_format_error() {
        let mut engine = engine();
        engine.create(1, Silent, NpcConfig::default(), RULES).expect("valid");
        assert!(matches!(engine.ask(1, "item").unwrap_err(), EngineError::Format { .. }));
    }

    #[test]
    fn say_bypasses_matching_and_cooldown() {
        let log = Transcript::new();
        let mut engine = engine();
        let cfg = NpcConfig::default().with_tolerance_ms(1000);
        engine.create(1, log.clone(), cfg, RULES).expect("valid");
        engine.ask(1, "item=ring").expect("valid");
        engine.say(1, "The gate opens!", &Rewards::new().with("key", true));
        assert!(engine.is_cooling_down(1));
        assert_eq!(log.texts(), ["You found my ring!", "The gate opens!"]);
        assert_eq!(engine.stats().scripted_lines, 1);
    }

    #[test]
    fn clock_accumulates_sub_millisecond_steps() {
        let log = Transcript::new();
        let mut engine = engine();
        engine
            .create(1, log.clone(), NpcConfig::default().with_banter(100, 10), "banter=true|hm|<<<")
            .expect("valid");
        for _ in 0..40 {
            engine.advance(Duration::from_micros(250));
        }
        assert_eq!(engine.now(), ms(10));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn advance_to_end_of_clock_returns() {
        let mut engine = engine();
        let cfg = NpcConfig::default().with_tolerance_ms(u64::MAX).with_banter(0, u64::MAX / 2);
        engine.create(1, Silent, cfg, "banter=true|x|<<<greeting=true|hi|<<<").expect("valid");
        engine.create(2, Silent, cfg, "banter=true|x|<<<greeting=true|hi|<<<").expect("valid");
        engine.ask(2, ScalarMap::new()).expect("valid");

        engine.advance(Duration::MAX);
        assert_eq!(engine.now(), Duration::MAX);
        // npc 1 ticks twice; npc 2 leaves cooldown at the last millisecond and ticks once.
        assert_eq!(engine.stats().banter_ticks, 3);
        assert!(!engine.is_cooling_down(2));
        assert_eq!(engine.pending_timers(), 0);

        engine.advance(ms(1));
        assert_eq!(engine.now(), Duration::MAX);
    }

    #[test]
    fn load_registers_declared_npcs() {
        let config = EngineConfig::from_toml(
            r#"
[defaults]
tolerance_ms = 1000

[[npc]]
id = "smith"
messages = "greeting=true|Hello!|<<<"

[[npc]]
id = "bard"
tolerance_ms = 0
messages = "greeting=true|Tra-la!|<<<"
"#,
        )
        .expect("valid toml");
        let log = Transcript::new();
        let mut engine = Engine::load(config, StdRandom::seeded(2), |_| log.clone()).expect("loads");
        assert_eq!(engine.len(), 2);

        engine.ask("smith", ScalarMap::new()).expect("valid");
        engine.ask("bard", ScalarMap::new()).expect("valid");
        assert!(engine.is_cooling_down("smith"));
        assert!(!engine.is_cooling_down("bard"));
        assert_eq!(engine.npc("smith").map(|n| n.config().tolerance_ms), Some(1000));
        assert_eq!(engine.defaults().tolerance_ms, 1000);
        assert_eq!(engine.driver_config().resolution_ms, 50);
    }

    #[test]
    fn destroy_all_clears_registry() {
        let mut engine = engine();
        let cfg = NpcConfig::default().with_banter(10, 100);
        for id in 0..5 {
            engine.create(id, Silent, cfg, RULES).expect("valid");
        }
        assert_eq!(engine.ids().count(), 5);
        engine.destroy_all();
        assert!(engine.is_empty());
        assert_eq!(engine.pending_timers(), 0);
    }
}
