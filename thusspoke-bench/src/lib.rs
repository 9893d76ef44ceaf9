//! Shared fixtures for the benchmark suite.

use thusspoke_core::speaker::Silent;
use thusspoke_core::{Engine, EngineConfig, NpcConfig, NpcMessage, Rewards, ScalarMap};

/// A rule set of `len` item rules followed by a greeting and two banter
/// lines. Asking for `item=item{len-1}` walks the whole list.
#[must_use]
pub fn rule_set(len: usize) -> Vec<NpcMessage> {
    let mut rules: Vec<NpcMessage> = (0..len)
        .filter_map(|i| {
            NpcMessage::new(
                ScalarMap::new().with("item", format!("item{i}")).with("quest", "main"),
                format!("You brought item {i}."),
                Rewards::new().with("gold", u32::try_from(i).unwrap_or(u32::MAX)),
            )
            .ok()
        })
        .collect();
    rules.extend(
        [("greeting", "Hello there."), ("banter", "Nice weather."), ("banter", "Busy day.")]
            .into_iter()
            .filter_map(|(key, text)| NpcMessage::new(ScalarMap::new().with(key, true), text, Rewards::new()).ok()),
    );
    rules
}

/// An engine with `npcs` silent NPCs, each with the given settings and a
/// rule set of `rules` item rules.
///
/// # Errors
/// Propagates registration errors; none occur for valid settings.
pub fn populated_engine(npcs: usize, rules: usize, config: NpcConfig) -> thusspoke_core::Result<Engine> {
    let mut engine = Engine::new(EngineConfig::default());
    let rule_set = rule_set(rules);
    for id in 0..npcs {
        engine.create(id, Silent, config, rule_set.clone())?;
    }
    Ok(engine)
}
