// Per-room tick engine plus the deferred effects it schedules. Timer handlers re-check the
// room before acting, since anything may have happened between scheduling and firing.

use crate::domain::systems::projectiles::{BulletOutcome, ProjectileConfig, tick_bullets};
use crate::domain::systems::walls::tick_wall_respawns;
use crate::domain::{PlayerId, RoomStatus};
use crate::use_cases::room::{Room, RoomCtx};
use crate::use_cases::scheduler::{Timer, TimerKey};
use crate::use_cases::types::ServerEvent;
use tracing::{debug, info, trace};

/// Fires the room's recurring tick and re-arms it while the game is running.
pub fn on_room_tick(room: &mut Room, ctx: &mut RoomCtx<'_>, key: TimerKey) {
    if room.tick_timer != Some(key) {
        return;
    }
    room.tick_timer = None;

    run_tick(room, ctx);

    if room.status == RoomStatus::Playing {
        // Anchor to the scheduled deadline so a late wakeup does not drift the cadence.
        let due = key.due_ms() + ctx.tuning.matches.tick_interval_ms;
        room.tick_timer = Some(
            ctx.scheduler
                .schedule(due, Timer::RoomTick(room.id.clone())),
        );
    }
}

/// One authoritative simulation step: clock, bullets, cooldowns, wall respawns, snapshot.
pub fn run_tick(room: &mut Room, ctx: &mut RoomCtx<'_>) {
    if room.status != RoomStatus::Playing {
        return;
    }

    room.game_time = room.game_time.saturating_sub(1);
    if room.game_time == 0 {
        let winner = room.scores.leader();
        room.end_game(ctx, winner);
        return;
    }

    let cfg = ProjectileConfig {
        radius: ctx.tuning.projectile.radius,
        damage: ctx.tuning.projectile.damage,
        cell_size: ctx.tuning.arena.cell_size,
        world_size: ctx.tuning.arena.world_size(),
        wall_respawn_ticks: ctx.tuning.arena.wall_respawn_ticks,
    };
    // Walls destroyed this tick join the respawn queue after this tick's countdown step.
    let mut newly_destroyed = Vec::new();
    let outcomes = {
        let mut targets = ctx.players.members_mut(&room.members);
        tick_bullets(
            &mut room.bullets,
            &mut room.grid,
            &mut newly_destroyed,
            &mut targets,
            ctx.now_ms,
            cfg,
        )
    };

    for outcome in outcomes {
        match outcome {
            BulletOutcome::OutOfBounds { bullet_id } => {
                trace!(room_id = %room.id, bullet_id, "bullet left the arena");
            }
            BulletOutcome::WallHit { x, y, destroyed, .. } => {
                if destroyed {
                    debug!(room_id = %room.id, x, y, "wall destroyed");
                }
                ctx.outbox
                    .broadcast(&room.members, ServerEvent::WallHit { x, y });
            }
            BulletOutcome::PlayerHit {
                bullet_id,
                shooter_id,
                victim_id,
                health,
                killed,
            } => {
                ctx.outbox.broadcast(
                    &room.members,
                    ServerEvent::PlayerHit {
                        player_id: victim_id,
                        health,
                        bullet_id,
                    },
                );
                if killed {
                    room.drop_cube(ctx.outbox, victim_id);
                    ctx.scheduler.schedule(
                        ctx.now_ms + ctx.tuning.player.respawn_delay_ms,
                        Timer::Respawn {
                            room_id: room.id.clone(),
                            player_id: victim_id,
                        },
                    );
                    info!(
                        room_id = %room.id,
                        victim_id = %victim_id,
                        shooter_id = %shooter_id,
                        "player killed"
                    );
                }
            }
        }
    }

    for player in ctx.players.members_mut(&room.members) {
        player.ability_cooldown = player.ability_cooldown.saturating_sub(1);
    }

    let rebuilt = tick_wall_respawns(
        &mut room.grid,
        &mut room.destroyed_walls,
        ctx.tuning.arena.wall_health,
    );
    for (x, y) in rebuilt {
        ctx.outbox
            .broadcast(&room.members, ServerEvent::WallRespawned { x, y });
    }
    room.destroyed_walls.extend(newly_destroyed);

    let snapshot = room.snapshot(ctx.players);
    ctx.outbox
        .broadcast(&room.members, ServerEvent::GameUpdate(Box::new(snapshot)));
}

/// Revives a dead member at their team cashout. Does nothing if the player already came back,
/// left, or the game is over.
pub fn respawn_player(room: &mut Room, ctx: &mut RoomCtx<'_>, player_id: PlayerId) {
    if room.status != RoomStatus::Playing || !room.members.contains(&player_id) {
        return;
    }
    let Some(team) = ctx.players.get(player_id).and_then(|p| p.team) else {
        return;
    };
    let (x, y) = room.spawn_point(team, ctx.tuning.arena.cell_size);
    let Some(player) = ctx.players.get_mut(player_id) else {
        return;
    };
    let Some(stats) = player.stats() else {
        return;
    };
    if player.is_alive() {
        return;
    }

    player.health = stats.max_health;
    player.x = x;
    player.y = y;
    ctx.outbox
        .broadcast(&room.members, ServerEvent::PlayerRespawned { player_id });
    debug!(room_id = %room.id, player_id = %player_id, "player respawned");
}

/// Ends stealth unless a newer activation pushed the deadline out.
pub fn expire_stealth(room: &mut Room, ctx: &mut RoomCtx<'_>, player_id: PlayerId) {
    if !room.members.contains(&player_id) {
        return;
    }
    let Some(player) = ctx.players.get_mut(player_id) else {
        return;
    };
    match player.stealth_until_ms {
        Some(until) if until <= ctx.now_ms => {}
        _ => return,
    }

    player.invisible = false;
    player.stealth_until_ms = None;
    ctx.outbox.broadcast(
        &room.members,
        ServerEvent::PlayerVisibilityChanged {
            player_id,
            visible: true,
        },
    );
}

/// Starts the game for whoever is ready when selection time runs out.
pub fn on_selection_timeout(room: &mut Room, ctx: &mut RoomCtx<'_>, key: TimerKey) {
    if room.selection_timer != Some(key) {
        return;
    }
    room.selection_timer = None;
    room.start_game(ctx);
}
