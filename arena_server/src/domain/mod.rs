// Domain layer: core simulation types and rules.

pub mod map;
pub mod state;
pub mod systems;
pub mod tuning;

pub use map::{Cell, DestroyedWall, Grid, Wall};
pub use state::{
    Bullet, Cashout, Controls, Cube, Player, PlayerId, RoomId, RoomStatus, Scores, Team,
    UnlockedAbilities,
};
pub use tuning::GameTuning;
