//! Authored response rules.
//!
//! A [`MessageDraft`] is what authors write (every field optional so that
//! deserialisation can report *which* field is missing); an [`NpcMessage`]
//! is the validated form the engine stores and matches against.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::{Conditions, Rewards};

/// Condition key that marks a message as the greeting fallback.
pub const GREETING_KEY: &str = "greeting";

/// Condition key that marks a message as a banter candidate.
pub const BANTER_KEY: &str = "banter";

/// One validated response rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpcMessage {
    conditions: Conditions,
    text: String,
    rewards: Rewards,
}

impl NpcMessage {
    /// Build a message, rejecting empty conditions or empty text.
    ///
    /// # Errors
    /// Returns [`EngineError::Validation`] naming the offending field.
    pub fn new(conditions: Conditions, text: impl Into<String>, rewards: Rewards) -> Result<Self> {
        let text = text.into();
        if conditions.is_empty() {
            return Err(EngineError::empty("conditions"));
        }
        if text.is_empty() {
            return Err(EngineError::empty("text"));
        }
        Ok(Self {
            conditions,
            text,
            rewards,
        })
    }

    /// The conditions guarding this message.
    #[must_use]
    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    /// The utterance.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Rewards emitted with the utterance.
    #[must_use]
    pub fn rewards(&self) -> &Rewards {
        &self.rewards
    }

    /// Whether the conditions carry a `greeting` key (any value).
    #[must_use]
    pub fn is_greeting(&self) -> bool {
        self.conditions.contains_key(GREETING_KEY)
    }

    /// Whether the conditions carry a `banter` key (any value).
    #[must_use]
    pub fn is_banter(&self) -> bool {
        self.conditions.contains_key(BANTER_KEY)
    }
}

/// Unvalidated authoring form of a message, as found in JSON or TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    /// Conditions guarding the message. Required.
    #[serde(default)]
    pub conditions: Option<Conditions>,
    /// The utterance. Required.
    #[serde(default)]
    pub text: Option<String>,
    /// Rewards; absent means none.
    #[serde(default)]
    pub rewards: Option<Rewards>,
}

impl MessageDraft {
    /// Draft with conditions and text set and no rewards.
    #[must_use]
    pub fn new(conditions: Conditions, text: impl Into<String>) -> Self {
        Self {
            conditions: Some(conditions),
            text: Some(text.into()),
            rewards: None,
        }
    }

    /// Builder-style rewards.
    #[must_use]
    pub fn with_rewards(mut self, rewards: Rewards) -> Self {
        self.rewards = Some(rewards);
        self
    }
}

impl TryFrom<MessageDraft> for NpcMessage {
    type Error = EngineError;

    fn try_from(draft: MessageDraft) -> Result<Self> {
        let conditions = draft.conditions.ok_or_else(|| EngineError::missing("conditions"))?;
        let text = draft.text.ok_or_else(|| EngineError::missing("text"))?;
        Self::new(conditions, text, draft.rewards.unwrap_or_default())
    }
}

impl From<NpcMessage> for MessageDraft {
    fn from(message: NpcMessage) -> Self {
        Self {
            conditions: Some(message.conditions),
            text: Some(message.text),
            rewards: Some(message.rewards),
        }
    }
}
