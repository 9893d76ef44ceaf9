//! # thusspoke core
//!
//! Embeddable dialog engine for game NPCs.
//!
//! Authors give each NPC an ordered rule set: messages guarded by
//! conditions. The engine
//!
//! - picks the reply to a player's question (first fully matching rule, or
//!   the greeting fallback),
//! - enforces a per-NPC cooldown so a character cannot be badgered,
//! - lets idle NPCs banter on their own at a configured chance and cadence,
//! - reads and writes rule sets in a compact text form.
//!
//! ## Architecture
//!
//! ```text
//!  host ──create/ask/add/say/advance──▶ Engine (registry + clock)
//!                                         │
//!                ┌────────────────────────┼──────────────────────┐
//!                ▼                        ▼                      ▼
//!        InteractionState ◀── timer ── TimerQueue         matcher / codec
//!         (Idle/Cooldown)                 │
//!                                         ▼
//!                                      banter ──▶ Speaker (host sink)
//! ```
//!
//! Everything runs on the caller's thread. Time only moves when the host
//! calls [`Engine::advance`] (or runs [`driver::drive`]).

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod banter;
pub mod codec;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod matcher;
pub mod message;
pub mod metrics;
pub mod npc;
pub mod rng;
pub mod speaker;
pub mod timer;
pub mod types;

pub use codec::{ConditionSource, RuleSource};
pub use config::{DriverConfig, EngineConfig, NpcConfig, NpcDefinition};
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use message::{MessageDraft, NpcMessage};
pub use metrics::EngineStats;
pub use npc::AskOutcome;
pub use speaker::Speaker;
pub use types::*;
