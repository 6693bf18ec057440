// Spatial checks shared by movement, abilities, bullets and cube handling.
// Both functions are read-only and may be called any number of times per tick.

use crate::domain::map::{Cell, Grid};
use crate::domain::tuning::ArenaTuning;

/// Returns true if a circle of `radius` centered at `(x, y)` stays inside the playable area
/// and its center is not inside a wall cell.
pub fn can_occupy(grid: &Grid, arena: &ArenaTuning, x: f32, y: f32, radius: f32) -> bool {
    if !x.is_finite() || !y.is_finite() {
        return false;
    }

    let world = arena.world_size();
    if x < radius || x > world - radius || y < radius || y > world - radius {
        return false;
    }

    match grid.cell_at(x, y, arena.cell_size) {
        Some((cx, cy)) => !grid.get(cx, cy).is_some_and(Cell::is_wall),
        None => false,
    }
}

pub fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Strict overlap: circles that merely touch do not overlap.
pub fn circles_overlap(p1: (f32, f32), r1: f32, p2: (f32, f32), r2: f32) -> bool {
    distance(p1, p2) < r1 + r2
}
