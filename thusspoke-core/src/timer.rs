//! Single-context timer queue driven by a virtual millisecond clock.
//!
//! The engine never sleeps. The host advances the clock and the queue hands
//! back every timer whose deadline has been reached, earliest first (ties in
//! scheduling order). Repeating timers keep their handle across periods.
//!
//! Cancelled entries stay in the heap and are skipped lazily when popped;
//! `live` is the source of truth.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use crate::types::NpcId;

/// Opaque handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Periodic banter roll.
    Banter,
    /// End of a post-answer quiet period.
    Cooldown,
}

/// A timer that reached its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer {
    /// Handle it was scheduled under.
    pub handle: TimerHandle,
    /// Owning NPC.
    pub npc: NpcId,
    /// Kind of timer.
    pub kind: TimerKind,
    /// Deadline in clock milliseconds.
    pub at_ms: u64,
}

#[derive(Debug)]
struct Timer {
    npc: NpcId,
    kind: TimerKind,
    deadline_ms: u64,
    period_ms: Option<u64>,
}

#[derive(Debug, PartialEq, Eq)]
struct Slot {
    deadline_ms: u64,
    seq: u64,
    handle: TimerHandle,
}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline_ms
            .cmp(&other.deadline_ms)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Timer queue plus the clock it is measured against.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: u64,
    next_handle: u64,
    next_seq: u64,
    heap: BinaryHeap<Reverse<Slot>>,
    live: HashMap<TimerHandle, Timer>,
}

impl TimerQueue {
    /// Empty queue at clock zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock reading in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of live (scheduled, not cancelled) timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no timers are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Whether `handle` refers to a live timer.
    #[must_use]
    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Deadline of a live timer.
    #[must_use]
    pub fn deadline_ms(&self, handle: TimerHandle) -> Option<u64> {
        self.live.get(&handle).map(|t| t.deadline_ms)
    }

    /// Fire once, `delay_ms` from now.
    pub fn schedule_once(&mut self, npc: NpcId, kind: TimerKind, delay_ms: u64) -> TimerHandle {
        self.schedule(npc, kind, delay_ms, None)
    }

    /// Fire every `period_ms`, first one period from now. A zero period is
    /// treated as one millisecond. The timer retires once its next deadline
    /// would reach `u64::MAX`.
    pub fn schedule_repeating(&mut self, npc: NpcId, kind: TimerKind, period_ms: u64) -> TimerHandle {
        let period_ms = period_ms.max(1);
        self.schedule(npc, kind, period_ms, Some(period_ms))
    }

    fn schedule(&mut self, npc: NpcId, kind: TimerKind, delay_ms: u64, period_ms: Option<u64>) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let deadline_ms = self.now_ms.saturating_add(delay_ms);
        self.push_slot(handle, deadline_ms);
        self.live.insert(
            handle,
            Timer {
                npc,
                kind,
                deadline_ms,
                period_ms,
            },
        );
        handle
    }

    fn push_slot(&mut self, handle: TimerHandle, deadline_ms: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Slot {
            deadline_ms,
            seq,
            handle,
        }));
    }

    /// Cancel a timer. Cancelling a fired, cancelled or unknown handle is a
    /// no-op. Returns whether a live timer was removed.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.live.remove(&handle).is_some()
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock
    /// to its deadline. Repeating timers are re-armed one period later.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<FiredTimer> {
        loop {
            let Reverse(top) = self.heap.peek()?;
            if top.deadline_ms > until_ms {
                return None;
            }
            let Reverse(slot) = self.heap.pop()?;

            let Some(timer) = self.live.get_mut(&slot.handle) else {
                continue;
            };
            if timer.deadline_ms != slot.deadline_ms {
                continue;
            }

            self.now_ms = self.now_ms.max(slot.deadline_ms);
            let fired = FiredTimer {
                handle: slot.handle,
                npc: timer.npc.clone(),
                kind: timer.kind,
                at_ms: slot.deadline_ms,
            };

            // A repeating timer whose next deadline would saturate the clock
            // fires this last time.
            let next = timer
                .period_ms
                .map(|period_ms| slot.deadline_ms.saturating_add(period_ms))
                .filter(|&next| next > slot.deadline_ms && next < u64::MAX);
            match next {
                Some(next) => {
                    timer.deadline_ms = next;
                    self.push_slot(slot.handle, next);
                }
                None => {
                    self.live.remove(&slot.handle);
                }
            }
            return Some(fired);
        }
    }

    /// Move the clock forward without firing anything. Never moves it back.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
