// Process-scoped stores: connected players and the FIFO waiting pool.

use crate::domain::{Player, PlayerId};
use std::collections::{HashMap, VecDeque};

/// Every connected player, keyed by connection identity. Rooms refer to players by id only.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, Player>,
}

impl PlayerRegistry {
    pub fn insert(&mut self, player: Player) -> bool {
        if self.players.contains_key(&player.id) {
            return false;
        }
        self.players.insert(player.id, player);
        true
    }

    pub fn remove(&mut self, player_id: PlayerId) -> Option<Player> {
        self.players.remove(&player_id)
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn get_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&player_id)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.players.contains_key(&player_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Mutable access to the listed players at once, in `members` order. Unknown ids are
    /// skipped.
    pub fn members_mut(&mut self, members: &[PlayerId]) -> Vec<&mut Player> {
        let mut found: Vec<&mut Player> = self
            .players
            .values_mut()
            .filter(|player| members.contains(&player.id))
            .collect();
        found.sort_by_key(|player| members.iter().position(|id| *id == player.id));
        found
    }
}

/// Connections waiting for a room, oldest first.
#[derive(Debug, Default)]
pub struct WaitingPool {
    queue: VecDeque<PlayerId>,
}

impl WaitingPool {
    pub fn push(&mut self, player_id: PlayerId) -> bool {
        if self.queue.contains(&player_id) {
            return false;
        }
        self.queue.push_back(player_id);
        true
    }

    pub fn remove(&mut self, player_id: PlayerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|id| *id != player_id);
        before != self.queue.len()
    }

    /// Pops up to `count` players from the front of the queue.
    pub fn take(&mut self, count: usize) -> Vec<PlayerId> {
        let count = count.min(self.queue.len());
        self.queue.drain(..count).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
