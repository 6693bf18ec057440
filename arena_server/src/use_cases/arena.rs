// Process-wide game state: the player registry, the waiting pool, live rooms and the timer
// queue. Owned by a single task; every command and timer runs to completion on it.

use crate::domain::{GameTuning, Player, PlayerId, RoomId, RoomStatus, Team};
use crate::use_cases::actions;
use crate::use_cases::registry::{PlayerRegistry, WaitingPool};
use crate::use_cases::room::{Room, RoomCtx};
use crate::use_cases::scheduler::{Scheduler, Timer, TimerKey};
use crate::use_cases::shop;
use crate::use_cases::tick;
use crate::use_cases::types::{
    ActionError, ArenaCommand, ClientAction, Outbox, RoomSummary, ServerEvent,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use tracing::{debug, info};

pub struct Arena {
    tuning: GameTuning,
    players: PlayerRegistry,
    waiting: WaitingPool,
    rooms: HashMap<RoomId, Room>,
    /// Which room a player sits in; a player is in at most one.
    memberships: HashMap<PlayerId, RoomId>,
    scheduler: Scheduler,
    rng: ChaCha8Rng,
    room_seq: u64,
}

impl Arena {
    /// `seed` makes names and shop draws reproducible.
    pub fn new(mut tuning: GameTuning, seed: Option<u64>) -> Self {
        tuning.matches.max_players = tuning.matches.max_players.clamp(1, Team::COUNT);
        tuning.matches.tick_interval_ms = tuning.matches.tick_interval_ms.max(1);
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            tuning,
            players: PlayerRegistry::default(),
            waiting: WaitingPool::default(),
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            scheduler: Scheduler::new(),
            rng,
            room_seq: 0,
        }
    }

    pub fn tuning(&self) -> &GameTuning {
        &self.tuning
    }

    pub fn handle_command(&mut self, command: ArenaCommand, now_ms: u64) -> Outbox {
        let mut outbox = Outbox::default();
        match command {
            ArenaCommand::Connect { player_id } => self.connect(player_id, now_ms, &mut outbox),
            ArenaCommand::Disconnect { player_id } => {
                self.disconnect(player_id, now_ms, &mut outbox)
            }
            ArenaCommand::Action { player_id, action } => {
                self.handle_action(player_id, action, now_ms, &mut outbox)
            }
            ArenaCommand::ListRooms { reply } => {
                // The requester may have given up; nothing to do then.
                let _ = reply.send(self.room_summaries());
            }
        }
        outbox
    }

    /// Earliest pending timer deadline, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// Runs every timer due at or before `now_ms`, in deadline order.
    pub fn fire_due(&mut self, now_ms: u64) -> Outbox {
        let mut outbox = Outbox::default();
        while let Some((key, timer)) = self.scheduler.pop_due(now_ms) {
            self.fire(key, timer, now_ms, &mut outbox);
        }
        outbox
    }

    fn connect(&mut self, player_id: PlayerId, now_ms: u64, outbox: &mut Outbox) {
        if self.players.contains(player_id) {
            debug!(player_id = %player_id, "duplicate connect ignored");
            return;
        }

        let name = format!("Player{}", self.rng.gen_range(0..1000));
        info!(player_id = %player_id, name = %name, "player connected");
        self.players
            .insert(Player::new(player_id, name, &self.tuning.player));
        self.waiting.push(player_id);
        self.fill_rooms(now_ms, outbox);
    }

    fn disconnect(&mut self, player_id: PlayerId, now_ms: u64, outbox: &mut Outbox) {
        self.waiting.remove(player_id);

        if let Some(room_id) = self.memberships.remove(&player_id) {
            let emptied = self.with_room(&room_id, now_ms, outbox, |room, ctx| {
                room.drop_cube(ctx.outbox, player_id);
                room.remove_member(player_id);
                ctx.outbox.broadcast(
                    &room.members,
                    ServerEvent::PlayerDisconnected { player_id },
                );
                if room.members.is_empty() {
                    return true;
                }
                // The leaver may have been the last one holding up selection.
                if room.status == RoomStatus::Selection
                    && room.all_ready(ctx.players)
                {
                    room.start_game(ctx);
                }
                false
            });
            if emptied == Some(true) {
                self.teardown_room(&room_id, now_ms, outbox);
            }
        }

        if self.players.remove(player_id).is_some() {
            info!(player_id = %player_id, "player disconnected");
        }
    }

    fn handle_action(
        &mut self,
        player_id: PlayerId,
        action: ClientAction,
        now_ms: u64,
        outbox: &mut Outbox,
    ) {
        let name = action.name();
        let result = match action {
            ClientAction::SelectClass { class, ability } => {
                self.in_room(player_id, now_ms, outbox, |room, ctx| {
                    actions::select_class(room, ctx, player_id, &class, &ability)
                })
            }
            ClientAction::Move { x, y } => self.in_room(player_id, now_ms, outbox, |room, ctx| {
                actions::move_player(room, ctx, player_id, x, y)
            }),
            ClientAction::Shoot { angle } => {
                self.in_room(player_id, now_ms, outbox, |room, ctx| {
                    actions::shoot(room, ctx, player_id, angle)
                })
            }
            ClientAction::UseAbility { target } => {
                self.in_room(player_id, now_ms, outbox, |room, ctx| {
                    actions::use_ability(room, ctx, player_id, target)
                })
            }
            ClientAction::InteractWithCube => {
                self.in_room(player_id, now_ms, outbox, |room, ctx| {
                    actions::interact_with_cube(room, ctx, player_id)
                })
            }
            ClientAction::BuyItem { item_id } => self.buy_item(player_id, &item_id, outbox),
            ClientAction::RequestShopData => match self.players.get(player_id) {
                Some(player) => {
                    outbox.send(player_id, shop::shop_data(player));
                    Ok(())
                }
                None => Err(ActionError::UnknownPlayer),
            },
            ClientAction::UpdateControls { controls } => {
                actions::update_controls(&mut self.players, player_id, controls)
            }
        };

        if let Err(err) = result {
            match err.client_message() {
                Some(message) => outbox.send(
                    player_id,
                    ServerEvent::Error {
                        message: message.to_string(),
                    },
                ),
                None => debug!(player_id = %player_id, action = name, ?err, "action rejected"),
            }
        }
    }

    fn buy_item(
        &mut self,
        player_id: PlayerId,
        item_id: &str,
        outbox: &mut Outbox,
    ) -> Result<(), ActionError> {
        let player = self
            .players
            .get_mut(player_id)
            .ok_or(ActionError::UnknownPlayer)?;
        let purchase = shop::buy_item(player, item_id, &mut self.rng)?;
        info!(player_id = %player_id, item_id, ?purchase, coins = player.coins, "item bought");
        outbox.send(player_id, shop::shop_data(player));
        Ok(())
    }

    fn fire(&mut self, key: TimerKey, timer: Timer, now_ms: u64, outbox: &mut Outbox) {
        match timer {
            Timer::SelectionTimeout(room_id) => {
                self.with_room(&room_id, now_ms, outbox, |room, ctx| {
                    tick::on_selection_timeout(room, ctx, key)
                });
            }
            Timer::RoomTick(room_id) => {
                self.with_room(&room_id, now_ms, outbox, |room, ctx| {
                    tick::on_room_tick(room, ctx, key)
                });
            }
            Timer::Respawn { room_id, player_id } => {
                self.with_room(&room_id, now_ms, outbox, |room, ctx| {
                    tick::respawn_player(room, ctx, player_id)
                });
            }
            Timer::StealthExpiry { room_id, player_id } => {
                self.with_room(&room_id, now_ms, outbox, |room, ctx| {
                    tick::expire_stealth(room, ctx, player_id)
                });
            }
            Timer::RoomTeardown(room_id) => {
                let current = self
                    .rooms
                    .get(&room_id)
                    .is_some_and(|room| room.teardown_timer == Some(key));
                if current {
                    self.teardown_room(&room_id, now_ms, outbox);
                }
            }
        }
    }

    /// Opens rooms from the front of the waiting pool while enough players are queued.
    fn fill_rooms(&mut self, now_ms: u64, outbox: &mut Outbox) {
        let max_players = self.tuning.matches.max_players;
        while self.waiting.len() >= max_players {
            let pooled = self.waiting.take(max_players);
            self.room_seq += 1;
            let room_id = RoomId::from(format!("room_{}", self.room_seq));
            let mut room = Room::new(room_id.clone(), &self.tuning);

            let mut ctx = RoomCtx {
                tuning: &self.tuning,
                players: &mut self.players,
                scheduler: &mut self.scheduler,
                outbox: &mut *outbox,
                now_ms,
            };
            room.admit(&mut ctx, pooled);

            for member in &room.members {
                self.memberships.insert(*member, room_id.clone());
            }
            self.rooms.insert(room_id, room);
        }
    }

    /// Removes a room with all its timers and sends its remaining players back to the pool.
    fn teardown_room(&mut self, room_id: &RoomId, now_ms: u64, outbox: &mut Outbox) {
        let Some(room) = self.rooms.remove(room_id) else {
            return;
        };
        let cancelled = self.scheduler.cancel_room(room_id);

        let mut requeued = 0;
        for member in room.members {
            self.memberships.remove(&member);
            if let Some(player) = self.players.get_mut(member) {
                player.reset_match_state(&self.tuning.player);
                self.waiting.push(member);
                requeued += 1;
            }
        }
        info!(room_id = %room_id, cancelled, requeued, "room torn down");

        self.fill_rooms(now_ms, outbox);
    }

    fn with_room<R>(
        &mut self,
        room_id: &RoomId,
        now_ms: u64,
        outbox: &mut Outbox,
        f: impl FnOnce(&mut Room, &mut RoomCtx<'_>) -> R,
    ) -> Option<R> {
        let room = self.rooms.get_mut(room_id)?;
        let mut ctx = RoomCtx {
            tuning: &self.tuning,
            players: &mut self.players,
            scheduler: &mut self.scheduler,
            outbox,
            now_ms,
        };
        Some(f(room, &mut ctx))
    }

    fn in_room(
        &mut self,
        player_id: PlayerId,
        now_ms: u64,
        outbox: &mut Outbox,
        f: impl FnOnce(&mut Room, &mut RoomCtx<'_>) -> Result<(), ActionError>,
    ) -> Result<(), ActionError> {
        if !self.players.contains(player_id) {
            return Err(ActionError::UnknownPlayer);
        }
        let room_id = self
            .memberships
            .get(&player_id)
            .cloned()
            .ok_or(ActionError::NotInRoom)?;
        self.with_room(&room_id, now_ms, outbox, f)
            .unwrap_or(Err(ActionError::NotInRoom))
    }

    pub fn room_summaries(&self) -> Vec<RoomSummary> {
        let mut summaries: Vec<RoomSummary> = self.rooms.values().map(Room::summary).collect();
        summaries.sort_by(|a, b| a.room_id.as_str().cmp(b.room_id.as_str()));
        summaries
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_of(&self, player_id: PlayerId) -> Option<&Room> {
        self.memberships
            .get(&player_id)
            .and_then(|room_id| self.rooms.get(room_id))
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
