// Validated entry points for in-room client actions. Each handler checks its preconditions
// before touching state; a refused action leaves the room exactly as it was.

use crate::domain::map::{Cell, Wall};
use crate::domain::systems::collision::{can_occupy, circles_overlap};
use crate::domain::tuning::{Ability, ClassStats, PlayerClass};
use crate::domain::{Bullet, Player, PlayerId, RoomStatus, Team};
use crate::use_cases::registry::PlayerRegistry;
use crate::use_cases::room::{Room, RoomCtx};
use crate::use_cases::scheduler::Timer;
use crate::use_cases::types::{ActionError, ServerEvent, TargetPoint};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Looks up a member who may act in the simulation right now.
fn active_player<'p>(
    room: &Room,
    players: &'p mut PlayerRegistry,
    player_id: PlayerId,
) -> Result<(&'p mut Player, Team, ClassStats), ActionError> {
    if room.status != RoomStatus::Playing {
        return Err(ActionError::WrongPhase);
    }
    if !room.members.contains(&player_id) {
        return Err(ActionError::NotInRoom);
    }
    let player = players
        .get_mut(player_id)
        .ok_or(ActionError::UnknownPlayer)?;
    let team = player.team.ok_or(ActionError::NoTeam)?;
    let stats = player.stats().ok_or(ActionError::NoClass)?;
    if !player.is_alive() {
        return Err(ActionError::NotAlive);
    }
    Ok((player, team, stats))
}

pub fn select_class(
    room: &mut Room,
    ctx: &mut RoomCtx<'_>,
    player_id: PlayerId,
    class: &str,
    ability: &str,
) -> Result<(), ActionError> {
    let class: PlayerClass = class.parse().map_err(|_| ActionError::UnknownClass)?;
    let ability: Ability = ability
        .parse()
        .map_err(|_| ActionError::AbilityNotUnlocked)?;

    let player = ctx
        .players
        .get_mut(player_id)
        .ok_or(ActionError::UnknownPlayer)?;
    if player.team.is_none() {
        return Err(ActionError::NoTeam);
    }
    // Late pickers may still join a running game once.
    match room.status {
        RoomStatus::Selection => {}
        RoomStatus::Playing if !player.ready => {}
        _ => return Err(ActionError::WrongPhase),
    }
    if ability.class() != class || !player.unlocked.contains(class, ability) {
        return Err(ActionError::AbilityNotUnlocked);
    }

    player.class = Some(class);
    player.ability = Some(ability);
    player.health = class.stats().max_health;
    player.ready = true;

    debug!(
        room_id = %room.id,
        player_id = %player_id,
        class = class.as_str(),
        ability = ability.as_str(),
        "class selected"
    );

    if room.status == RoomStatus::Selection && room.all_ready(ctx.players) {
        room.start_game(ctx);
    }
    Ok(())
}

/// Steps the player one class-speed unit along the input direction. Blocked moves are
/// dropped without changing anything.
pub fn move_player(
    room: &mut Room,
    ctx: &mut RoomCtx<'_>,
    player_id: PlayerId,
    dx: f32,
    dy: f32,
) -> Result<(), ActionError> {
    if !dx.is_finite() || !dy.is_finite() {
        return Err(ActionError::InvalidInput);
    }
    let (player, _, stats) = active_player(room, ctx.players, player_id)?;

    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return Ok(());
    }
    let (nx, ny) = (dx / length, dy / length);
    let x = player.x + nx * stats.speed;
    let y = player.y + ny * stats.speed;

    if !can_occupy(&room.grid, &ctx.tuning.arena, x, y, stats.radius) {
        debug!(player_id = %player_id, x, y, "move blocked");
        return Ok(());
    }

    player.x = x;
    player.y = y;
    // Clockwise from "up": sin(rotation) = nx, -cos(rotation) = ny.
    player.rotation = nx.atan2(-ny);
    room.pin_carried_cube(player, &ctx.tuning.matches);

    ctx.outbox.broadcast(
        &room.members,
        ServerEvent::PlayerMoved {
            player_id,
            x,
            y,
            rotation: player.rotation,
        },
    );
    Ok(())
}

pub fn shoot(
    room: &mut Room,
    ctx: &mut RoomCtx<'_>,
    player_id: PlayerId,
    angle: f32,
) -> Result<(), ActionError> {
    if !angle.is_finite() {
        return Err(ActionError::InvalidInput);
    }
    let (player, team, _) = active_player(room, ctx.players, player_id)?;

    if let Some(last) = player.last_shot_ms {
        if ctx.now_ms.saturating_sub(last) < ctx.tuning.projectile.shot_interval_ms {
            return Err(ActionError::ShotTooSoon);
        }
    }
    player.last_shot_ms = Some(ctx.now_ms);

    let bullet = Bullet {
        id: room.next_bullet_id(),
        origin_x: player.x,
        origin_y: player.y,
        x: player.x,
        y: player.y,
        angle,
        speed: ctx.tuning.projectile.speed,
        owner: player_id,
        team,
        spawned_ms: ctx.now_ms,
    };
    room.bullets.push(bullet.clone());
    ctx.outbox
        .broadcast(&room.members, ServerEvent::BulletFired(bullet));
    Ok(())
}

/// Fires the player's selected ability. Abilities without an effect are refused before any
/// state changes, so they neither consume the cooldown nor announce themselves.
pub fn use_ability(
    room: &mut Room,
    ctx: &mut RoomCtx<'_>,
    player_id: PlayerId,
    target: Option<TargetPoint>,
) -> Result<(), ActionError> {
    let (player, _, stats) = active_player(room, ctx.players, player_id)?;
    let ability = player.ability.ok_or(ActionError::NoClass)?;
    if player.ability_cooldown > 0 {
        return Err(ActionError::CooldownActive);
    }

    let tuning = &ctx.tuning.abilities;
    let (forward_x, forward_y) = (player.rotation.sin(), -player.rotation.cos());

    match ability {
        Ability::Stealth => {
            let until = ctx.now_ms + tuning.stealth_ms;
            player.invisible = true;
            player.stealth_until_ms = Some(until);
            ctx.scheduler.schedule(
                until,
                Timer::StealthExpiry {
                    room_id: room.id.clone(),
                    player_id,
                },
            );
            ctx.outbox.broadcast(
                &room.members,
                ServerEvent::PlayerVisibilityChanged {
                    player_id,
                    visible: false,
                },
            );
        }
        Ability::Dash => {
            let x = player.x + forward_x * tuning.dash_distance;
            let y = player.y + forward_y * tuning.dash_distance;
            if can_occupy(&room.grid, &ctx.tuning.arena, x, y, stats.radius) {
                player.x = x;
                player.y = y;
                room.pin_carried_cube(player, &ctx.tuning.matches);
                ctx.outbox.broadcast(
                    &room.members,
                    ServerEvent::PlayerMoved {
                        player_id,
                        x,
                        y,
                        rotation: player.rotation,
                    },
                );
            } else {
                debug!(player_id = %player_id, "dash blocked");
            }
        }
        Ability::Wall => {
            let x = player.x + forward_x * tuning.wall_reach;
            let y = player.y + forward_y * tuning.wall_reach;
            let cell = room.grid.cell_at(x, y, ctx.tuning.arena.cell_size);
            match cell {
                Some((cx, cy)) if room.grid.get(cx, cy) == Some(&Cell::Empty) => {
                    room.grid.set(
                        cx,
                        cy,
                        Cell::Wall(Wall::temporary(tuning.temporary_wall_health)),
                    );
                }
                _ => debug!(player_id = %player_id, "no room for wall"),
            }
        }
        Ability::Heal => {
            player.health = (player.health + tuning.heal_amount).min(stats.max_health);
        }
        Ability::Shield => {
            player.shield_until_ms = Some(ctx.now_ms + tuning.shield_ms);
        }
        Ability::Phase
        | Ability::Teleport
        | Ability::Turret
        | Ability::Mine
        | Ability::Clone
        | Ability::Hammer
        | Ability::Stun => return Err(ActionError::AbilityUnavailable),
    }

    player.ability_cooldown = stats.cooldown_ticks;
    ctx.outbox.broadcast(
        &room.members,
        ServerEvent::AbilityUsed {
            player_id,
            ability,
            target,
        },
    );
    Ok(())
}

/// Banks a carried cube at the player's own cashout, or picks up a free cube in reach.
pub fn interact_with_cube(
    room: &mut Room,
    ctx: &mut RoomCtx<'_>,
    player_id: PlayerId,
) -> Result<(), ActionError> {
    let (player, team, stats) = active_player(room, ctx.players, player_id)?;
    let position = (player.x, player.y);

    if let Some(index) = room.carried_cube_index(player_id) {
        let Some(cashout) = room.cashout_for(team) else {
            return Ok(());
        };
        let target = cashout.world_position(ctx.tuning.arena.cell_size);
        if !circles_overlap(position, ctx.tuning.matches.capture_radius, target, 0.0) {
            debug!(player_id = %player_id, "not at own cashout");
            return Ok(());
        }

        player.score += 1;
        player.coins = player
            .coins
            .saturating_add(ctx.tuning.matches.delivery_coins);
        let team_score = room.scores.increment(team);

        room.cubes[index].carrier = None;
        info!(
            room_id = %room.id,
            player_id = %player_id,
            team = team.as_str(),
            team_score,
            "cube delivered"
        );

        // The winning delivery only ends the game; there is no next round for the cube.
        if team_score >= ctx.tuning.matches.cubes_to_win {
            room.end_game(ctx, team);
            return Ok(());
        }

        let (cx, cy) = ctx.tuning.arena.center();
        let cube = &mut room.cubes[index];
        cube.x = cx;
        cube.y = cy;
        let cube = cube.clone();
        ctx.outbox.broadcast(
            &room.members,
            ServerEvent::CubeDelivered {
                player_id,
                cube,
                scores: room.scores,
            },
        );
        return Ok(());
    }

    let reach = stats.radius + ctx.tuning.matches.pickup_margin;
    let free = room.cubes.iter().position(|cube| {
        cube.carrier.is_none() && circles_overlap(position, reach, (cube.x, cube.y), 0.0)
    });
    let Some(index) = free else {
        return Ok(());
    };

    room.cubes[index].carrier = Some(player_id);
    room.pin_carried_cube(player, &ctx.tuning.matches);
    ctx.outbox.broadcast(
        &room.members,
        ServerEvent::CubeGrabbed {
            cube_id: room.cubes[index].id.clone(),
            player_id,
        },
    );
    Ok(())
}

/// Stores the client's key bindings; allowed in and out of rooms.
pub fn update_controls(
    players: &mut PlayerRegistry,
    player_id: PlayerId,
    controls: BTreeMap<String, String>,
) -> Result<(), ActionError> {
    let player = players
        .get_mut(player_id)
        .ok_or(ActionError::UnknownPlayer)?;
    player.controls.0 = controls;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::fixtures::Fixture;

    #[test]
    fn when_shooting_inside_interval_then_shot_is_rejected() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Light]);

        assert_eq!(shoot(&mut room, &mut fx.ctx(1_000), PlayerId(1), 0.5), Ok(()));
        assert_eq!(
            shoot(&mut room, &mut fx.ctx(1_499), PlayerId(1), 0.5),
            Err(ActionError::ShotTooSoon)
        );
        assert_eq!(shoot(&mut room, &mut fx.ctx(1_500), PlayerId(1), 0.5), Ok(()));

        let ids: Vec<u64> = room.bullets.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(room.bullets[0].team, Team::Red);
        assert_eq!(fx.take_event_kinds(), vec!["bulletFired", "bulletFired"]);
    }

    #[test]
    fn when_moving_then_position_steps_by_class_speed_and_faces_direction() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Light]);

        move_player(&mut room, &mut fx.ctx(0), PlayerId(1), 3.0, 0.0).expect("move");

        let player = fx.player(1);
        assert_eq!((player.x, player.y), (45.0, 40.0));
        assert!((player.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(fx.take_event_kinds(), vec!["playerMoved"]);
    }

    #[test]
    fn when_move_ends_inside_wall_then_it_is_dropped_silently() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Light]);

        move_player(&mut room, &mut fx.ctx(0), PlayerId(1), 0.0, -1.0).expect("move");

        let player = fx.player(1);
        assert_eq!((player.x, player.y), (40.0, 40.0));
        assert!(fx.take_events().is_empty());
    }

    #[test]
    fn when_input_is_not_finite_then_move_is_invalid() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Light]);
        assert_eq!(
            move_player(&mut room, &mut fx.ctx(0), PlayerId(1), f32::NAN, 1.0),
            Err(ActionError::InvalidInput)
        );
    }

    #[test]
    fn when_ability_is_on_cooldown_then_second_use_is_rejected() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Light]);

        assert_eq!(use_ability(&mut room, &mut fx.ctx(0), PlayerId(1), None), Ok(()));
        assert_eq!(fx.player(1).ability_cooldown, 8);
        assert!(fx.player(1).invisible);
        assert_eq!(
            use_ability(&mut room, &mut fx.ctx(10), PlayerId(1), None),
            Err(ActionError::CooldownActive)
        );
        assert_eq!(
            fx.take_event_kinds(),
            vec!["playerVisibilityChanged", "abilityUsed"]
        );
    }

    #[test]
    fn when_ability_has_no_effect_then_it_fails_closed() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Medium]);
        assert_eq!(fx.player(1).ability, Some(Ability::Turret));

        assert_eq!(
            use_ability(&mut room, &mut fx.ctx(0), PlayerId(1), None),
            Err(ActionError::AbilityUnavailable)
        );
        assert_eq!(fx.player(1).ability_cooldown, 0);
        assert!(fx.take_events().is_empty());
    }

    #[test]
    fn when_heavy_raises_wall_then_cell_ahead_becomes_temporary_wall() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Heavy]);
        let player = fx.player_mut(1);
        player.x = 100.0;
        player.y = 140.0;
        player.rotation = 0.0;

        use_ability(&mut room, &mut fx.ctx(0), PlayerId(1), None).expect("wall");

        // 50 units up from (100, 140) lands in cell (2, 2).
        assert_eq!(
            room.grid.get(2, 2),
            Some(&Cell::Wall(Wall::temporary(2)))
        );
        assert_eq!(fx.player(1).ability_cooldown, 15);
    }

    #[test]
    fn when_dash_target_is_blocked_then_player_stays_but_cooldown_runs() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Light]);
        let player = fx.player_mut(1);
        player.unlocked.unlock(Ability::Dash);
        player.ability = Some(Ability::Dash);
        player.x = 100.0;

        // Facing up from the top row runs into the border.
        use_ability(&mut room, &mut fx.ctx(0), PlayerId(1), None).expect("dash");
        assert_eq!((fx.player(1).x, fx.player(1).y), (100.0, 40.0));
        assert_eq!(fx.player(1).ability_cooldown, 8);

        fx.player_mut(1).ability_cooldown = 0;
        fx.player_mut(1).rotation = std::f32::consts::PI;
        use_ability(&mut room, &mut fx.ctx(0), PlayerId(1), None).expect("dash");
        let player = fx.player(1);
        assert!((player.x - 100.0).abs() < 1e-3);
        assert!((player.y - 140.0).abs() < 1e-3);
    }

    #[test]
    fn when_selecting_locked_or_unknown_class_then_error_is_reported() {
        let mut fx = Fixture::new(2);
        let mut room = Room::new(crate::domain::RoomId::from("r".to_string()), &fx.tuning);
        room.admit(&mut fx.ctx(0), vec![PlayerId(1), PlayerId(2)]);

        assert_eq!(
            select_class(&mut room, &mut fx.ctx(0), PlayerId(1), "wizard", "stealth"),
            Err(ActionError::UnknownClass)
        );
        assert_eq!(
            select_class(&mut room, &mut fx.ctx(0), PlayerId(1), "light", "dash"),
            Err(ActionError::AbilityNotUnlocked)
        );
        assert_eq!(
            select_class(&mut room, &mut fx.ctx(0), PlayerId(1), "light", "wall"),
            Err(ActionError::AbilityNotUnlocked)
        );
        assert!(!fx.player(1).ready);
    }

    #[test]
    fn when_everyone_is_ready_then_game_starts_early() {
        let mut fx = Fixture::new(2);
        let mut room = Room::new(crate::domain::RoomId::from("r".to_string()), &fx.tuning);
        room.admit(&mut fx.ctx(0), vec![PlayerId(1), PlayerId(2)]);
        fx.take_events();

        select_class(&mut room, &mut fx.ctx(100), PlayerId(1), "light", "stealth")
            .expect("select");
        assert_eq!(room.status, RoomStatus::Selection);
        assert_eq!(fx.player(1).health, 80);

        select_class(&mut room, &mut fx.ctx(200), PlayerId(2), "heavy", "wall").expect("select");
        assert_eq!(room.status, RoomStatus::Playing);
        assert!(room.selection_timer.is_none());
        // Only the first tick is pending.
        assert_eq!(fx.scheduler.next_deadline(), Some(1_200));
        assert_eq!(fx.take_event_kinds(), vec!["gameStarted"]);
    }

    #[test]
    fn when_cube_is_in_reach_then_player_grabs_and_carries_it() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Light]);
        let player = fx.player_mut(1);
        player.x = 380.0;
        player.y = 395.0;

        interact_with_cube(&mut room, &mut fx.ctx(0), PlayerId(1)).expect("grab");

        assert_eq!(room.cubes[0].carrier, Some(PlayerId(1)));
        assert_eq!((room.cubes[0].x, room.cubes[0].y), (380.0, 373.0));
        assert_eq!(fx.take_event_kinds(), vec!["cubeGrabbed"]);

        move_player(&mut room, &mut fx.ctx(0), PlayerId(1), -1.0, 0.0).expect("move");
        assert_eq!((room.cubes[0].x, room.cubes[0].y), (375.0, 373.0));
    }

    #[test]
    fn when_delivering_at_other_team_cashout_then_score_is_unchanged() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Light]);
        room.cubes[0].carrier = Some(PlayerId(1));
        let player = fx.player_mut(1);
        player.x = 720.0;
        player.y = 40.0;

        interact_with_cube(&mut room, &mut fx.ctx(0), PlayerId(1)).expect("interact");

        assert_eq!(room.scores.get(Team::Red), 0);
        assert_eq!(room.cubes[0].carrier, Some(PlayerId(1)));
        assert!(fx.take_events().is_empty());
    }

    #[test]
    fn when_delivering_at_own_cashout_then_team_scores_and_cube_resets() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Light]);
        room.cubes[0].carrier = Some(PlayerId(1));

        interact_with_cube(&mut room, &mut fx.ctx(0), PlayerId(1)).expect("deliver");

        assert_eq!(room.scores.get(Team::Red), 1);
        assert_eq!(room.cubes[0].carrier, None);
        assert_eq!((room.cubes[0].x, room.cubes[0].y), (400.0, 400.0));
        let player = fx.player(1);
        assert_eq!((player.score, player.coins), (1, 110));
        assert_eq!(fx.take_event_kinds(), vec!["cubeDelivered"]);
    }

    #[test]
    fn when_third_delivery_lands_then_game_ends_and_scoring_stops() {
        let mut fx = Fixture::new(2);
        let mut room = fx.playing_room(&[PlayerClass::Light, PlayerClass::Light]);

        for _ in 0..3 {
            room.cubes[0].carrier = Some(PlayerId(1));
            interact_with_cube(&mut room, &mut fx.ctx(0), PlayerId(1)).expect("deliver");
        }
        assert_eq!(room.status, RoomStatus::Ended);

        room.cubes[0].carrier = Some(PlayerId(1));
        assert_eq!(
            interact_with_cube(&mut room, &mut fx.ctx(0), PlayerId(1)),
            Err(ActionError::WrongPhase)
        );
        assert_eq!(room.scores.get(Team::Red), 3);

        // The winning delivery is announced by gameOver alone.
        assert_eq!(
            fx.take_event_kinds(),
            vec!["cubeDelivered", "cubeDelivered", "gameOver"]
        );
        // 100 start + 3 deliveries + winner bonus.
        assert_eq!(fx.player(1).coins, 180);
        assert_eq!(fx.player(2).coins, 120);
    }

    #[test]
    fn when_player_has_no_class_then_simulation_actions_are_refused() {
        let mut fx = Fixture::new(2);
        let mut room = fx.playing_room(&[PlayerClass::Light]);

        assert_eq!(
            shoot(&mut room, &mut fx.ctx(0), PlayerId(2), 0.0),
            Err(ActionError::NoClass)
        );
        assert_eq!(
            select_class(&mut room, &mut fx.ctx(0), PlayerId(2), "heavy", "wall"),
            Ok(())
        );
        assert_eq!(fx.player(2).health, 160);
        assert_eq!(shoot(&mut room, &mut fx.ctx(0), PlayerId(2), 0.0), Ok(()));
        assert_eq!(
            select_class(&mut room, &mut fx.ctx(0), PlayerId(2), "light", "stealth"),
            Err(ActionError::WrongPhase)
        );
    }

    #[test]
    fn when_cube_is_carried_then_second_player_cannot_take_it() {
        let mut fx = Fixture::new(2);
        let mut room = fx.playing_room(&[PlayerClass::Light, PlayerClass::Light]);
        for (id, x) in [(1, 380.0), (2, 420.0)] {
            let player = fx.player_mut(id);
            player.x = x;
            player.y = 395.0;
        }

        interact_with_cube(&mut room, &mut fx.ctx(0), PlayerId(1)).expect("grab");
        interact_with_cube(&mut room, &mut fx.ctx(0), PlayerId(2)).expect("interact");

        assert_eq!(room.cubes[0].carrier, Some(PlayerId(1)));
        assert!(!room.is_carrying(PlayerId(2)));
        assert_eq!(fx.take_event_kinds(), vec!["cubeGrabbed"]);
    }

    #[test]
    fn when_healing_then_health_is_capped_at_class_max() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Medium]);
        let player = fx.player_mut(1);
        player.unlocked.unlock(Ability::Heal);
        player.ability = Some(Ability::Heal);
        player.health = 50;

        use_ability(&mut room, &mut fx.ctx(0), PlayerId(1), None).expect("heal");
        assert_eq!(fx.player(1).health, 90);
        assert_eq!(fx.player(1).ability_cooldown, 12);

        let player = fx.player_mut(1);
        player.ability_cooldown = 0;
        player.health = 100;
        use_ability(&mut room, &mut fx.ctx(0), PlayerId(1), None).expect("heal");
        assert_eq!(fx.player(1).health, 120);
        assert_eq!(fx.take_event_kinds(), vec!["abilityUsed", "abilityUsed"]);
    }

    #[test]
    fn when_shield_is_raised_then_it_lasts_three_seconds() {
        let mut fx = Fixture::new(1);
        let mut room = fx.playing_room(&[PlayerClass::Heavy]);
        let player = fx.player_mut(1);
        player.unlocked.unlock(Ability::Shield);
        player.ability = Some(Ability::Shield);

        use_ability(&mut room, &mut fx.ctx(1_000), PlayerId(1), None).expect("shield");

        let player = fx.player(1);
        assert_eq!(player.shield_until_ms, Some(4_000));
        assert!(player.is_shielded(3_999));
        assert!(!player.is_shielded(4_000));
        assert_eq!(player.ability_cooldown, 15);
    }
}
