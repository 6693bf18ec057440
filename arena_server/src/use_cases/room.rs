// Lifecycle of one room: admission, phase transitions, cube bookkeeping and snapshots.

use crate::domain::map::generate_map;
use crate::domain::tuning::MatchTuning;
use crate::domain::{
    Bullet, Cashout, Cube, DestroyedWall, GameTuning, Grid, Player, PlayerId, RoomId,
    RoomStatus, Scores, Team,
};
use crate::use_cases::registry::PlayerRegistry;
use crate::use_cases::scheduler::{Scheduler, Timer, TimerKey};
use crate::use_cases::types::{Outbox, PlayerView, RoomSnapshot, RoomSummary, ServerEvent};
use tracing::info;

/// Mutable process state a room handler may touch besides the room itself.
pub struct RoomCtx<'a> {
    pub tuning: &'a GameTuning,
    pub players: &'a mut PlayerRegistry,
    pub scheduler: &'a mut Scheduler,
    pub outbox: &'a mut Outbox,
    pub now_ms: u64,
}

#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    pub grid: Grid,
    /// Membership in admission order; never longer than the configured max.
    pub members: Vec<PlayerId>,
    pub cubes: Vec<Cube>,
    pub cashouts: Vec<Cashout>,
    pub bullets: Vec<Bullet>,
    pub destroyed_walls: Vec<DestroyedWall>,
    pub status: RoomStatus,
    pub selection_deadline_ms: Option<u64>,
    /// Ticks left in the game.
    pub game_time: u32,
    pub scores: Scores,
    next_bullet_id: u64,
    pub(crate) selection_timer: Option<TimerKey>,
    pub(crate) tick_timer: Option<TimerKey>,
    pub(crate) teardown_timer: Option<TimerKey>,
}

impl Room {
    pub fn new(id: RoomId, tuning: &GameTuning) -> Self {
        let (cx, cy) = tuning.arena.center();
        Self {
            id,
            grid: generate_map(&tuning.arena),
            members: Vec::new(),
            cubes: vec![Cube {
                id: "cube1".to_string(),
                x: cx,
                y: cy,
                carrier: None,
            }],
            cashouts: Cashout::for_grid(tuning.arena.grid_size),
            bullets: Vec::new(),
            destroyed_walls: Vec::new(),
            status: RoomStatus::Waiting,
            selection_deadline_ms: None,
            game_time: tuning.matches.game_ticks,
            scores: Scores::default(),
            next_bullet_id: 1,
            selection_timer: None,
            tick_timer: None,
            teardown_timer: None,
        }
    }

    /// Seats pooled players, one team each in fixed team order, and opens class selection.
    pub fn admit(&mut self, ctx: &mut RoomCtx<'_>, pooled: Vec<PlayerId>) {
        if self.status != RoomStatus::Waiting {
            return;
        }

        for player_id in pooled {
            if self.members.len() >= ctx.tuning.matches.max_players.min(Team::COUNT) {
                break;
            }
            let team = Team::ALL[self.members.len()];
            let Some(player) = ctx.players.get_mut(player_id) else {
                continue;
            };
            player.reset_match_state(&ctx.tuning.player);
            player.team = Some(team);
            let (x, y) = self.spawn_point(team, ctx.tuning.arena.cell_size);
            player.x = x;
            player.y = y;
            self.members.push(player_id);
        }

        self.status = RoomStatus::Selection;
        let deadline = ctx.now_ms + u64::from(ctx.tuning.matches.selection_secs) * 1_000;
        self.selection_deadline_ms = Some(deadline);
        self.selection_timer = Some(
            ctx.scheduler
                .schedule(deadline, Timer::SelectionTimeout(self.id.clone())),
        );

        for player_id in &self.members {
            let Some(player) = ctx.players.get(*player_id) else {
                continue;
            };
            ctx.outbox.send(
                *player_id,
                ServerEvent::RoomCreated {
                    room_id: self.id.clone(),
                    selection_secs: ctx.tuning.matches.selection_secs,
                    unlocked: player.unlocked.clone(),
                    tuning: *ctx.tuning,
                },
            );
        }

        info!(
            room_id = %self.id,
            members = self.members.len(),
            "room entered selection"
        );
    }

    pub fn cashout_for(&self, team: Team) -> Option<Cashout> {
        self.cashouts.iter().copied().find(|c| c.team == team)
    }

    /// World position of a team's cashout; falls back to the map origin cell.
    pub fn spawn_point(&self, team: Team, cell_size: f32) -> (f32, f32) {
        self.cashout_for(team)
            .map(|cashout| cashout.world_position(cell_size))
            .unwrap_or((cell_size, cell_size))
    }

    pub fn all_ready(&self, players: &PlayerRegistry) -> bool {
        !self.members.is_empty()
            && self
                .members
                .iter()
                .all(|id| players.get(*id).is_some_and(|p| p.ready))
    }

    /// Moves a room from selection into play. Returns false if the room was not in selection.
    pub fn start_game(&mut self, ctx: &mut RoomCtx<'_>) -> bool {
        if self.status != RoomStatus::Selection {
            return false;
        }

        if let Some(key) = self.selection_timer.take() {
            ctx.scheduler.cancel(key);
        }
        self.selection_deadline_ms = None;
        self.status = RoomStatus::Playing;
        self.game_time = ctx.tuning.matches.game_ticks;

        ctx.outbox.broadcast(
            &self.members,
            ServerEvent::GameStarted {
                room_id: self.id.clone(),
            },
        );
        self.tick_timer = Some(ctx.scheduler.schedule(
            ctx.now_ms + ctx.tuning.matches.tick_interval_ms,
            Timer::RoomTick(self.id.clone()),
        ));

        let unready = self
            .members
            .iter()
            .filter(|id| ctx.players.get(**id).is_some_and(|p| !p.ready))
            .count();
        info!(room_id = %self.id, unready, "game started");
        true
    }

    /// Ends the game once: stops the tick timer, pays out rewards and schedules teardown.
    pub fn end_game(&mut self, ctx: &mut RoomCtx<'_>, winner: Team) {
        if self.status == RoomStatus::Ended {
            return;
        }

        if let Some(key) = self.tick_timer.take() {
            ctx.scheduler.cancel(key);
        }
        if let Some(key) = self.selection_timer.take() {
            ctx.scheduler.cancel(key);
        }
        self.status = RoomStatus::Ended;

        let rewards: &MatchTuning = &ctx.tuning.matches;
        for player in ctx.players.members_mut(&self.members) {
            let Some(team) = player.team else {
                continue;
            };
            let reward = if team == winner {
                rewards.winner_coins
            } else {
                rewards.loser_coins
            };
            player.coins = player.coins.saturating_add(reward);
        }

        ctx.outbox
            .broadcast(&self.members, ServerEvent::GameOver { winner });
        self.teardown_timer = Some(ctx.scheduler.schedule(
            ctx.now_ms + ctx.tuning.matches.teardown_delay_ms,
            Timer::RoomTeardown(self.id.clone()),
        ));

        info!(
            room_id = %self.id,
            winner = winner.as_str(),
            game_time = self.game_time,
            "game over"
        );
    }

    pub fn carried_cube_index(&self, player_id: PlayerId) -> Option<usize> {
        self.cubes
            .iter()
            .position(|cube| cube.carrier == Some(player_id))
    }

    pub fn is_carrying(&self, player_id: PlayerId) -> bool {
        self.carried_cube_index(player_id).is_some()
    }

    /// Releases the player's cube where it currently is. Returns true if one was carried.
    pub fn drop_cube(&mut self, outbox: &mut Outbox, player_id: PlayerId) -> bool {
        let Some(index) = self.carried_cube_index(player_id) else {
            return false;
        };
        let cube = &mut self.cubes[index];
        cube.carrier = None;
        let dropped = cube.clone();
        outbox.broadcast(&self.members, ServerEvent::CubeDropped(dropped));
        true
    }

    /// Keeps a carried cube floating just above its carrier.
    pub fn pin_carried_cube(&mut self, player: &Player, matches: &MatchTuning) {
        let Some(stats) = player.stats() else {
            return;
        };
        let Some(index) = self.carried_cube_index(player.id) else {
            return;
        };
        let cube = &mut self.cubes[index];
        cube.x = player.x;
        cube.y = player.y - (stats.radius + matches.carry_offset);
    }

    pub fn remove_member(&mut self, player_id: PlayerId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| *id != player_id);
        before != self.members.len()
    }

    pub fn next_bullet_id(&mut self) -> u64 {
        let id = self.next_bullet_id;
        self.next_bullet_id += 1;
        id
    }

    pub fn snapshot(&self, players: &PlayerRegistry) -> RoomSnapshot {
        let players = self
            .members
            .iter()
            .filter_map(|id| players.get(*id))
            .map(|player| PlayerView {
                player: player.clone(),
                carrying_cube: self.is_carrying(player.id),
            })
            .collect();

        RoomSnapshot {
            players,
            bullets: self.bullets.clone(),
            cubes: self.cubes.clone(),
            scores: self.scores,
            game_time: self.game_time,
            map: self.grid.clone(),
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.id.clone(),
            status: self.status,
            members: self.members.len(),
            scores: self.scores,
            game_time: self.game_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::PlayerClass;
    use crate::use_cases::fixtures::Fixture;

    fn ids(count: u64) -> Vec<PlayerId> {
        (1..=count).map(PlayerId).collect()
    }

    #[test]
    fn when_admitting_then_each_player_gets_distinct_team_and_cashout_spawn() {
        let mut fx = Fixture::new(4);
        let mut room = Room::new(RoomId::from("room_1".to_string()), &fx.tuning);

        room.admit(&mut fx.ctx(0), ids(4));

        assert_eq!(room.status, RoomStatus::Selection);
        let placed: Vec<(Option<Team>, f32, f32)> = (1..=4)
            .map(|id| fx.player(id))
            .map(|p| (p.team, p.x, p.y))
            .collect();
        assert_eq!(
            placed,
            vec![
                (Some(Team::Red), 40.0, 40.0),
                (Some(Team::Blue), 720.0, 40.0),
                (Some(Team::Green), 40.0, 720.0),
                (Some(Team::Purple), 720.0, 720.0),
            ]
        );
        assert_eq!(room.selection_deadline_ms, Some(30_000));
        assert_eq!(fx.scheduler.len(), 1);
        assert_eq!(fx.take_event_kinds(), vec!["roomCreated"; 4]);
    }

    #[test]
    fn when_game_ends_twice_then_rewards_and_timers_apply_once() {
        let mut fx = Fixture::new(2);
        let mut room = Room::new(RoomId::from("room_1".to_string()), &fx.tuning);
        room.admit(&mut fx.ctx(0), ids(2));
        assert!(room.start_game(&mut fx.ctx(10)));
        assert_eq!(fx.scheduler.len(), 1);

        room.end_game(&mut fx.ctx(20), Team::Blue);
        room.end_game(&mut fx.ctx(30), Team::Red);

        assert_eq!(room.status, RoomStatus::Ended);
        assert!(room.tick_timer.is_none());
        // Only the teardown remains.
        assert_eq!(fx.scheduler.len(), 1);
        assert_eq!(fx.player(1).coins, 120);
        assert_eq!(fx.player(2).coins, 150);
    }

    #[test]
    fn when_start_requested_outside_selection_then_nothing_changes() {
        let mut fx = Fixture::new(1);
        let mut room = Room::new(RoomId::from("room_1".to_string()), &fx.tuning);
        assert!(!room.start_game(&mut fx.ctx(0)));
        assert_eq!(room.status, RoomStatus::Waiting);
        assert!(fx.scheduler.is_empty());
    }

    #[test]
    fn when_carrier_drops_cube_then_it_stays_put_without_carrier() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Medium]);

        let player = fx.player_mut(1);
        player.x = 300.0;
        player.y = 300.0;
        room.cubes[0].carrier = Some(PlayerId(1));
        let player = fx.player(1).clone();
        room.pin_carried_cube(&player, &fx.tuning.matches);
        assert_eq!((room.cubes[0].x, room.cubes[0].y), (300.0, 275.0));

        let mut outbox = Outbox::default();
        assert!(room.drop_cube(&mut outbox, PlayerId(1)));
        assert!(!room.drop_cube(&mut outbox, PlayerId(1)));
        assert_eq!(room.cubes[0].carrier, None);
        assert_eq!((room.cubes[0].x, room.cubes[0].y), (300.0, 275.0));
        assert_eq!(outbox.into_vec().len(), 1);
    }

    #[test]
    fn when_snapshotting_then_carrier_flag_follows_cube_ownership() {
        let mut fx = Fixture::new(2);
        let mut room = fx.playing_room(&[PlayerClass::Light, PlayerClass::Heavy]);
        room.cubes[0].carrier = Some(PlayerId(2));

        let snapshot = room.snapshot(&fx.players);

        let flags: Vec<(PlayerId, bool)> = snapshot
            .players
            .iter()
            .map(|view| (view.player.id, view.carrying_cube))
            .collect();
        assert_eq!(flags, vec![(PlayerId(1), false), (PlayerId(2), true)]);
        assert_eq!(snapshot.game_time, 300);
        assert_eq!(snapshot.map.size(), 20);
    }
}
