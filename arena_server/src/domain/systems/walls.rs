use crate::domain::map::{Cell, DestroyedWall, Grid, Wall};

/// Counts down destroyed walls and rebuilds those that reach zero at full health.
/// Returns the rebuilt cells in queue order.
pub fn tick_wall_respawns(
    grid: &mut Grid,
    destroyed: &mut Vec<DestroyedWall>,
    wall_health: u32,
) -> Vec<(usize, usize)> {
    let mut rebuilt = Vec::new();
    // retain_mut keeps queue order and never skips a neighbor of a removed entry.
    destroyed.retain_mut(|wall| {
        wall.respawn_in = wall.respawn_in.saturating_sub(1);
        if wall.respawn_in > 0 {
            return true;
        }
        grid.set(wall.x, wall.y, Cell::Wall(Wall::destructible(wall_health)));
        rebuilt.push((wall.x, wall.y));
        false
    });
    rebuilt
}
