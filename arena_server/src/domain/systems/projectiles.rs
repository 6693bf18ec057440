use crate::domain::map::{Cell, DestroyedWall, Grid};
use crate::domain::state::{Bullet, Player, PlayerId};
use crate::domain::systems::collision::circles_overlap;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct ProjectileConfig {
    pub radius: f32,
    pub damage: i32,
    pub cell_size: f32,
    pub world_size: f32,
    pub wall_respawn_ticks: u32,
}

/// How a bullet left play this tick. Each bullet resolves at most once.
#[derive(Debug, Clone, PartialEq)]
pub enum BulletOutcome {
    OutOfBounds {
        bullet_id: u64,
    },
    WallHit {
        bullet_id: u64,
        x: usize,
        y: usize,
        destroyed: bool,
    },
    PlayerHit {
        bullet_id: u64,
        shooter_id: PlayerId,
        victim_id: PlayerId,
        health: i32,
        killed: bool,
    },
}

/// Advances every bullet one step and resolves collisions in order: bounds, walls, players.
///
/// Survivors are collected into a fresh list, so removing a bullet never shifts the one that
/// follows it. Destructible walls brought to zero health are cleared from the grid and pushed
/// onto `destroyed` unless they were temporary.
pub fn tick_bullets(
    bullets: &mut Vec<Bullet>,
    grid: &mut Grid,
    destroyed: &mut Vec<DestroyedWall>,
    targets: &mut [&mut Player],
    now_ms: u64,
    cfg: ProjectileConfig,
) -> Vec<BulletOutcome> {
    let mut outcomes = Vec::new();
    let mut survivors = Vec::with_capacity(bullets.len());

    for mut bullet in bullets.drain(..) {
        // Angle is clockwise from "up" (-Y).
        bullet.x += bullet.angle.sin() * bullet.speed;
        bullet.y -= bullet.angle.cos() * bullet.speed;

        match resolve_bullet(&bullet, grid, destroyed, targets, now_ms, cfg) {
            Some(outcome) => outcomes.push(outcome),
            None => survivors.push(bullet),
        }
    }

    *bullets = survivors;
    outcomes
}

fn resolve_bullet(
    bullet: &Bullet,
    grid: &mut Grid,
    destroyed: &mut Vec<DestroyedWall>,
    targets: &mut [&mut Player],
    now_ms: u64,
    cfg: ProjectileConfig,
) -> Option<BulletOutcome> {
    if bullet.x < 0.0 || bullet.x > cfg.world_size || bullet.y < 0.0 || bullet.y > cfg.world_size
    {
        return Some(BulletOutcome::OutOfBounds {
            bullet_id: bullet.id,
        });
    }

    if let Some((cx, cy)) = grid.cell_at(bullet.x, bullet.y, cfg.cell_size) {
        if let Some(Cell::Wall(wall)) = grid.get_mut(cx, cy) {
            if !wall.indestructible {
                wall.health = wall.health.saturating_sub(1);
                let destroyed_now = wall.health == 0;
                let temporary = wall.temporary;
                if destroyed_now {
                    grid.set(cx, cy, Cell::Empty);
                    if !temporary {
                        destroyed.push(DestroyedWall {
                            x: cx,
                            y: cy,
                            respawn_in: cfg.wall_respawn_ticks,
                        });
                    }
                }
                return Some(BulletOutcome::WallHit {
                    bullet_id: bullet.id,
                    x: cx,
                    y: cy,
                    destroyed: destroyed_now,
                });
            }
        }
    }

    for target in targets.iter_mut() {
        if target.id == bullet.owner || target.team == Some(bullet.team) {
            continue;
        }
        if target.invisible || !target.is_alive() {
            continue;
        }
        let Some(stats) = target.stats() else {
            continue;
        };

        if !circles_overlap(
            (bullet.x, bullet.y),
            cfg.radius,
            (target.x, target.y),
            stats.radius,
        ) {
            continue;
        }

        let mut killed = false;
        if target.is_shielded(now_ms) {
            debug!(victim_id = %target.id, bullet_id = bullet.id, "bullet absorbed by shield");
        } else {
            target.health -= cfg.damage;
            if target.health <= 0 {
                target.health = 0;
                killed = true;
            }
        }

        return Some(BulletOutcome::PlayerHit {
            bullet_id: bullet.id,
            shooter_id: bullet.owner,
            victim_id: target.id,
            health: target.health,
            killed,
        });
    }

    None
}
