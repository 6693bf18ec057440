// Deadline-ordered timers for the arena task. Handlers schedule deferred effects here and the
// driver fires them once due; every fired timer re-validates room state before acting.

use crate::domain::{PlayerId, RoomId};
use std::collections::BTreeMap;

/// Identifies one scheduled timer; ordering is by deadline, then insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerKey {
    due_ms: u64,
    seq: u64,
}

impl TimerKey {
    pub fn due_ms(&self) -> u64 {
        self.due_ms
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timer {
    /// Starts the game if players have not all readied up in time.
    SelectionTimeout(RoomId),
    /// One simulation step; rescheduled while the room is playing.
    RoomTick(RoomId),
    Respawn {
        room_id: RoomId,
        player_id: PlayerId,
    },
    StealthExpiry {
        room_id: RoomId,
        player_id: PlayerId,
    },
    RoomTeardown(RoomId),
}

impl Timer {
    pub fn room_id(&self) -> &RoomId {
        match self {
            Timer::SelectionTimeout(room_id)
            | Timer::RoomTick(room_id)
            | Timer::RoomTeardown(room_id)
            | Timer::Respawn { room_id, .. }
            | Timer::StealthExpiry { room_id, .. } => room_id,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    timers: BTreeMap<TimerKey, Timer>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, timer: Timer) -> TimerKey {
        let key = TimerKey {
            due_ms,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.timers.insert(key, timer);
        key
    }

    /// Returns false if the timer already fired or was cancelled.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        self.timers.remove(&key).is_some()
    }

    /// Drops every pending timer that targets `room_id`.
    pub fn cancel_room(&mut self, room_id: &RoomId) -> usize {
        let before = self.timers.len();
        self.timers.retain(|_, timer| timer.room_id() != room_id);
        before - self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.keys().next().map(TimerKey::due_ms)
    }

    /// Removes and returns the earliest timer due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerKey, Timer)> {
        let (&key, _) = self.timers.iter().next()?;
        if key.due_ms > now_ms {
            return None;
        }
        self.timers.remove(&key).map(|timer| (key, timer))
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
