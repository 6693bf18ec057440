// Shared builders for room-level unit tests.

use crate::domain::tuning::PlayerClass;
use crate::domain::{GameTuning, Player, PlayerId, RoomId};
use crate::use_cases::registry::PlayerRegistry;
use crate::use_cases::room::{Room, RoomCtx};
use crate::use_cases::scheduler::Scheduler;
use crate::use_cases::types::{Outbox, Outbound, ServerEvent};

pub struct Fixture {
    pub tuning: GameTuning,
    pub players: PlayerRegistry,
    pub scheduler: Scheduler,
    pub outbox: Outbox,
}

impl Fixture {
    /// Registers players `1..=count` with default state.
    pub fn new(count: u64) -> Self {
        let tuning = GameTuning::default();
        let mut players = PlayerRegistry::default();
        for id in 1..=count {
            players.insert(Player::new(
                PlayerId(id),
                format!("Player{id}"),
                &tuning.player,
            ));
        }
        Self {
            tuning,
            players,
            scheduler: Scheduler::new(),
            outbox: Outbox::default(),
        }
    }

    pub fn ctx(&mut self, now_ms: u64) -> RoomCtx<'_> {
        RoomCtx {
            tuning: &self.tuning,
            players: &mut self.players,
            scheduler: &mut self.scheduler,
            outbox: &mut self.outbox,
            now_ms,
        }
    }

    pub fn player(&self, id: u64) -> &Player {
        match self.players.get(PlayerId(id)) {
            Some(player) => player,
            None => panic!("player {id} missing"),
        }
    }

    pub fn player_mut(&mut self, id: u64) -> &mut Player {
        match self.players.get_mut(PlayerId(id)) {
            Some(player) => player,
            None => panic!("player {id} missing"),
        }
    }

    /// Drains everything emitted so far.
    pub fn take_events(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox).into_vec()
    }

    pub fn take_event_kinds(&mut self) -> Vec<&'static str> {
        self.take_events()
            .iter()
            .map(|outbound| event_kind(&outbound.event))
            .collect()
    }

    /// A room with every registered player seated, the given classes picked and the game
    /// running at `t = 0`.
    pub fn playing_room(&mut self, classes: &[PlayerClass]) -> Room {
        let mut room = Room::new(RoomId::from("room_1".to_string()), &self.tuning);
        let ids: Vec<PlayerId> = (1..=self.players.len() as u64).map(PlayerId).collect();
        room.admit(&mut self.ctx(0), ids.clone());
        for (id, class) in ids.iter().zip(classes) {
            let player = self.player_mut(id.0);
            player.class = Some(*class);
            player.ability = class.abilities().first().copied();
            player.health = class.stats().max_health;
            player.ready = true;
        }
        room.start_game(&mut self.ctx(0));
        self.take_events();
        room
    }
}

pub fn event_kind(event: &ServerEvent) -> &'static str {
    match event {
        ServerEvent::RoomCreated { .. } => "roomCreated",
        ServerEvent::GameStarted { .. } => "gameStarted",
        ServerEvent::GameUpdate(_) => "gameUpdate",
        ServerEvent::PlayerMoved { .. } => "playerMoved",
        ServerEvent::BulletFired(_) => "bulletFired",
        ServerEvent::WallHit { .. } => "wallHit",
        ServerEvent::WallRespawned { .. } => "wallRespawned",
        ServerEvent::AbilityUsed { .. } => "abilityUsed",
        ServerEvent::PlayerVisibilityChanged { .. } => "playerVisibilityChanged",
        ServerEvent::CubeGrabbed { .. } => "cubeGrabbed",
        ServerEvent::CubeDelivered { .. } => "cubeDelivered",
        ServerEvent::CubeDropped(_) => "cubeDropped",
        ServerEvent::PlayerHit { .. } => "playerHit",
        ServerEvent::PlayerRespawned { .. } => "playerRespawned",
        ServerEvent::PlayerDisconnected { .. } => "playerDisconnected",
        ServerEvent::GameOver { .. } => "gameOver",
        ServerEvent::ShopData { .. } => "shopData",
        ServerEvent::Error { .. } => "error",
    }
}
