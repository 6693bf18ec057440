//! Gameplay tuning, kept separate from runtime/server configuration (ports, channel sizes).
//!
//! A `GameTuning` is built once at startup and shared read-only by every room. It is also
//! sent verbatim to clients in `roomCreated` so both sides agree on geometry and stats.

pub mod abilities;
pub mod classes;
pub mod shop;

pub use abilities::{Ability, AbilityTuning};
pub use classes::{ClassStats, PlayerClass};
pub use shop::{SHOP_ITEMS, ShopItem, ShopItemKind};

#[derive(Debug, Clone, Copy)]
pub struct ArenaTuning {
    /// Cells per side of the square grid.
    pub grid_size: usize,

    /// World units per cell.
    pub cell_size: f32,

    /// Health of a freshly built destructible wall.
    pub wall_health: u32,

    /// Ticks a destroyed wall stays down before it is rebuilt.
    pub wall_respawn_ticks: u32,
}

impl ArenaTuning {
    /// Side length of the playable area in world units.
    pub fn world_size(&self) -> f32 {
        self.grid_size as f32 * self.cell_size
    }

    /// Center of the playable area in world units.
    pub fn center(&self) -> (f32, f32) {
        let half = self.world_size() / 2.0;
        (half, half)
    }
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            grid_size: 20,
            cell_size: 40.0,
            wall_health: 3,
            wall_respawn_ticks: 15,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatchTuning {
    /// Players pulled from the waiting pool to form one room.
    pub max_players: usize,

    /// Seconds players get to pick a class before the game starts anyway.
    pub selection_secs: u32,

    /// Game length in ticks.
    pub game_ticks: u32,

    /// Wall-clock length of one tick.
    pub tick_interval_ms: u64,

    /// Deliveries a team needs to win.
    pub cubes_to_win: u32,

    /// Radius around a team's cashout inside which a carried cube is banked.
    pub capture_radius: f32,

    /// Added to the carrier's radius for cube pickup checks.
    pub pickup_margin: f32,

    /// Added to the carrier's radius for the cube's vertical offset while carried.
    pub carry_offset: f32,

    pub winner_coins: u32,
    pub loser_coins: u32,
    pub delivery_coins: u32,

    /// How long an ended room lingers before teardown.
    pub teardown_delay_ms: u64,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            max_players: 4,
            selection_secs: 30,
            game_ticks: 300,
            tick_interval_ms: 1_000,
            cubes_to_win: 3,
            capture_radius: 50.0,
            pickup_margin: 15.0,
            carry_offset: 10.0,
            winner_coins: 50,
            loser_coins: 20,
            delivery_coins: 10,
            teardown_delay_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Distance a bullet travels per tick.
    pub speed: f32,

    /// Health removed per hit.
    pub damage: i32,

    /// Collision radius used against player circles.
    pub radius: f32,

    /// Minimum time between two shots of one player.
    pub shot_interval_ms: u64,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 7.0,
            damage: 20,
            radius: 5.0,
            shot_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Health given on room assignment, before a class is picked.
    pub spawn_health: i32,

    /// Delay between death and revival at the team cashout.
    pub respawn_delay_ms: u64,

    /// Coins granted to every new connection.
    pub starting_coins: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            spawn_health: 100,
            respawn_delay_ms: 5_000,
            starting_coins: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GameTuning {
    pub arena: ArenaTuning,
    pub matches: MatchTuning,
    pub projectile: ProjectileTuning,
    pub player: PlayerTuning,
    pub abilities: AbilityTuning,
}
