//! Banter: lines an NPC speaks on its own while idle.
//!
//! Each tick rolls a uniform integer in `0..=100`; the tick speaks when the
//! roll is below `banter_chance_percent`. A chance of 100 always speaks and a
//! chance of 0 never rolls. A winning tick picks uniformly among the messages
//! carrying a `banter` condition key.

use crate::matcher;
use crate::message::NpcMessage;
use crate::rng::RandomSource;

/// Upper bound (inclusive) of the per-tick roll.
pub const ROLL_MAX: u32 = 100;

/// Result of one banter tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BanterTick<'a> {
    /// The probability roll failed.
    Quiet,
    /// The roll passed but no message is flagged for banter.
    NoCandidates,
    /// Speak this message.
    Speak(&'a NpcMessage),
}

/// Run one tick against `messages`.
pub fn tick<'a>(messages: &'a [NpcMessage], chance_percent: u8, rng: &mut dyn RandomSource) -> BanterTick<'a> {
    if !roll(chance_percent, rng) {
        return BanterTick::Quiet;
    }
    let candidates = matcher::banter_candidates(messages);
    let Some(last) = candidates.len().checked_sub(1) else {
        return BanterTick::NoCandidates;
    };
    let last = u32::try_from(last).unwrap_or(u32::MAX);
    let index = rng.int_inclusive(0, last) as usize;
    candidates
        .get(index)
        .copied()
        .map_or(BanterTick::NoCandidates, BanterTick::Speak)
}

fn roll(chance_percent: u8, rng: &mut dyn RandomSource) -> bool {
    match u32::from(chance_percent) {
        0 => false,
        chance if chance >= ROLL_MAX => true,
        chance => rng.int_inclusive(0, ROLL_MAX) < chance,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
