// Pure per-tick systems operating on room state.

pub mod collision;
pub mod projectiles;
pub mod walls;
