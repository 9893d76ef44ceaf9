//! Engine and per-NPC configuration, loadable from TOML.
//!
//! ```toml
//! [driver]
//! resolution_ms = 50
//!
//! [defaults]
//! tolerance_ms = 1000
//!
//! [[npc]]
//! id = "blacksmith"
//! range = 5.0
//! messages = "greeting=true|Hello!|<<<"
//! ```

use serde::{Deserialize, Serialize};

use crate::codec::RuleSource;
use crate::error::{EngineError, Result};
use crate::types::NpcId;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Real-time driver settings.
    #[serde(default)]
    pub driver: DriverConfig,
    /// Settings applied to NPC definitions that leave a field out.
    #[serde(default)]
    pub defaults: NpcConfig,
    /// NPCs to register when the engine is loaded from this config.
    #[serde(default, rename = "npc")]
    pub npcs: Vec<NpcDefinition>,
}

impl EngineConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `EngineError::Config` if the TOML is invalid or a setting is
    /// out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check the defaults and every definition.
    ///
    /// # Errors
    /// Returns `EngineError::Config` naming the first bad setting.
    pub fn validate(&self) -> Result<()> {
        self.driver.validate()?;
        self.defaults.validate()?;
        for def in &self.npcs {
            def.config(&self.defaults).validate()?;
        }
        Ok(())
    }
}

/// Settings for [`crate::driver::drive`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// How often the real-time driver advances the engine clock.
    #[serde(default = "default_resolution_ms")]
    pub resolution_ms: u64,
}

impl DriverConfig {
    fn validate(&self) -> Result<()> {
        if self.resolution_ms == 0 {
            return Err(EngineError::Config("driver.resolution_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            resolution_ms: default_resolution_ms(),
        }
    }
}

/// Timing and reach of a single NPC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NpcConfig {
    /// Quiet period after a successful answer. `0` disables the cooldown.
    #[serde(default)]
    pub tolerance_ms: u64,
    /// Maximum interaction distance. `0` is unlimited.
    #[serde(default)]
    pub range: f64,
    /// Chance, in percent, that a banter tick speaks.
    #[serde(default)]
    pub banter_chance_percent: u8,
    /// Banter tick period. `0` disables banter.
    #[serde(default)]
    pub banter_interval_ms: u64,
}

impl NpcConfig {
    /// Builder-style cooldown.
    #[must_use]
    pub fn with_tolerance_ms(mut self, tolerance_ms: u64) -> Self {
        self.tolerance_ms = tolerance_ms;
        self
    }

    /// Builder-style range limit.
    #[must_use]
    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    /// Builder-style banter settings.
    #[must_use]
    pub fn with_banter(mut self, chance_percent: u8, interval_ms: u64) -> Self {
        self.banter_chance_percent = chance_percent;
        self.banter_interval_ms = interval_ms;
        self
    }

    /// Whether this NPC ever banters on its own.
    #[must_use]
    pub fn banters(&self) -> bool {
        self.banter_interval_ms > 0
    }

    /// Reject out-of-range settings.
    ///
    /// # Errors
    /// Returns `EngineError::Config` describing the bad field.
    pub fn validate(&self) -> Result<()> {
        if self.banter_chance_percent > 100 {
            return Err(EngineError::Config(format!(
                "banter_chance_percent must be 0-100, got {}",
                self.banter_chance_percent
            )));
        }
        if !self.range.is_finite() || self.range < 0.0 {
            return Err(EngineError::Config(format!(
                "range must be a finite non-negative number, got {}",
                self.range
            )));
        }
        Ok(())
    }
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            tolerance_ms: 0,
            range: 0.0,
            banter_chance_percent: 0,
            banter_interval_ms: 0,
        }
    }
}

/// An NPC declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcDefinition {
    /// Registry key.
    pub id: NpcId,
    /// Overrides `defaults.tolerance_ms`.
    #[serde(default)]
    pub tolerance_ms: Option<u64>,
    /// Overrides `defaults.range`.
    #[serde(default)]
    pub range: Option<f64>,
    /// Overrides `defaults.banter_chance_percent`.
    #[serde(default)]
    pub banter_chance_percent: Option<u8>,
    /// Overrides `defaults.banter_interval_ms`.
    #[serde(default)]
    pub banter_interval_ms: Option<u64>,
    /// Rule set, encoded or structured.
    #[serde(default)]
    pub messages: RuleSource,
}

impl NpcDefinition {
    /// Definition with no overrides.
    #[must_use]
    pub fn new(id: impl Into<NpcId>, messages: impl Into<RuleSource>) -> Self {
        Self {
            id: id.into(),
            tolerance_ms: None,
            range: None,
            banter_chance_percent: None,
            banter_interval_ms: None,
            messages: messages.into(),
        }
    }

    /// Effective settings after applying overrides to `defaults`.
    #[must_use]
    pub fn config(&self, defaults: &NpcConfig) -> NpcConfig {
        NpcConfig {
            tolerance_ms: self.tolerance_ms.unwrap_or(defaults.tolerance_ms),
            range: self.range.unwrap_or(defaults.range),
            banter_chance_percent: self
                .banter_chance_percent
                .unwrap_or(defaults.banter_chance_percent),
            banter_interval_ms: self.banter_interval_ms.unwrap_or(defaults.banter_interval_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_resolution_ms() -> u64 { 50 }

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[driver]
resolution_ms = 20

[defaults]
tolerance_ms = 1000
banter_chance_percent = 25

[[npc]]
id = "blacksmith"
range = 5.0
messages = "greeting=true|Hello!|<<<item=ring|You found my ring!|gold=10<<<"

[[npc]]
id = "bard"
banter_interval_ms = 4000

[[npc.messages]]
conditions = { banter = true }
text = "Have you heard the tale of the lost ring?"

[[npc.messages]]
conditions = { greeting = true }
text = "Welcome, friend."
rewards = { inspiration = 1 }
"#;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_toml("").expect("empty toml is valid");
        assert_eq!(config.driver.resolution_ms, 50);
        assert_eq!(config.defaults, NpcConfig::default());
        assert!(config.npcs.is_empty());
    }

    #[test]
    fn parses_definitions_in_both_rule_forms() {
        let config = EngineConfig::from_toml(SAMPLE).expect("valid");
        assert_eq!(config.driver.resolution_ms, 20);
        assert_eq!(config.npcs.len(), 2);

        let smith = &config.npcs[0];
        assert!(matches!(smith.messages, RuleSource::Encoded(_)));
        let smith_cfg = smith.config(&config.defaults);
        assert_eq!(smith_cfg.tolerance_ms, 1000);
        assert!((smith_cfg.range - 5.0).abs() < f64::EPSILON);

        let bard = &config.npcs[1];
        let bard_cfg = bard.config(&config.defaults);
        assert_eq!(bard_cfg.banter_interval_ms, 4000);
        assert_eq!(bard_cfg.banter_chance_percent, 25);
        let messages = bard.messages.clone().resolve().expect("valid drafts");
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_banter());
    }

    #[test]
    fn rejects_out_of_range_chance() {
        let err = EngineConfig::from_toml("[defaults]\nbanter_chance_percent = 101\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn rejects_negative_range() {
        assert!(NpcConfig::default().with_range(-1.0).validate().is_err());
        assert!(NpcConfig::default().with_range(f64::NAN).validate().is_err());
        assert!(NpcConfig::default().with_range(3.0).validate().is_ok());
    }

    #[test]
    fn rejects_zero_resolution() {
        assert!(EngineConfig::from_toml("[driver]\nresolution_ms = 0\n").is_err());
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = EngineConfig::from_toml("[defaults\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write");
        let config = EngineConfig::from_file(file.path()).expect("loads");
        assert_eq!(config.npcs[0].id, NpcId::from("blacksmith"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = EngineConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
