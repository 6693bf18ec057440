// Domain-level simulation entities shared by the room workflows.

use crate::domain::tuning::{Ability, ClassStats, PlayerClass, PlayerTuning};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(pub Arc<str>);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Team {
    Red,
    Blue,
    Green,
    Purple,
}

impl Team {
    /// Fixed team order: assignment order in a new room and tie-break order at game end.
    pub const ALL: [Team; Team::COUNT] = [Team::Red, Team::Blue, Team::Green, Team::Purple];
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Blue => 1,
            Self::Green => 2,
            Self::Purple => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Purple => "purple",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Waiting,
    Selection,
    Playing,
    Ended,
}

impl RoomStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Selection => "selection",
            Self::Playing => "playing",
            Self::Ended => "ended",
        }
    }
}

/// Per-team delivered cube counts. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores([u32; Team::COUNT]);

impl Scores {
    pub fn get(&self, team: Team) -> u32 {
        self.0[team.index()]
    }

    pub fn increment(&mut self, team: Team) -> u32 {
        let slot = &mut self.0[team.index()];
        *slot = slot.saturating_add(1);
        *slot
    }

    pub fn iter(&self) -> impl Iterator<Item = (Team, u32)> + '_ {
        Team::ALL.into_iter().map(|team| (team, self.get(team)))
    }

    /// Team with the highest score; ties go to the earliest team in `Team::ALL`.
    pub fn leader(&self) -> Team {
        let mut best = Team::ALL[0];
        for team in Team::ALL {
            if self.get(team) > self.get(best) {
                best = team;
            }
        }
        best
    }
}

/// Per-class unlocked abilities. Grows only through purchases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedAbilities(BTreeMap<PlayerClass, Vec<Ability>>);

impl Default for UnlockedAbilities {
    fn default() -> Self {
        Self(
            PlayerClass::ALL
                .into_iter()
                .map(|class| (class, class.abilities().iter().take(1).copied().collect()))
                .collect(),
        )
    }
}

impl UnlockedAbilities {
    pub fn contains(&self, class: PlayerClass, ability: Ability) -> bool {
        self.0
            .get(&class)
            .is_some_and(|abilities| abilities.contains(&ability))
    }

    pub fn for_class(&self, class: PlayerClass) -> &[Ability] {
        self.0.get(&class).map(Vec::as_slice).unwrap_or_default()
    }

    /// Declared abilities of `class` the player does not own yet, in catalog order.
    pub fn locked(&self, class: PlayerClass) -> Vec<Ability> {
        class
            .abilities()
            .iter()
            .copied()
            .filter(|ability| !self.contains(class, *ability))
            .collect()
    }

    pub fn unlock(&mut self, ability: Ability) -> bool {
        let class = ability.class();
        if self.contains(class, ability) {
            return false;
        }
        self.0.entry(class).or_default().push(ability);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerClass, &[Ability])> {
        self.0.iter().map(|(class, abilities)| (*class, abilities.as_slice()))
    }
}

/// Opaque action-to-key mapping; stored for the client, never read by the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls(pub BTreeMap<String, String>);

impl Default for Controls {
    fn default() -> Self {
        let bindings = [
            ("up", "w"),
            ("down", "s"),
            ("left", "a"),
            ("right", "d"),
            ("shoot", " "),
            ("ability", "Shift"),
        ];
        Self(
            bindings
                .into_iter()
                .map(|(action, key)| (action.to_string(), key.to_string()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team: Option<Team>,
    pub class: Option<PlayerClass>,
    pub ability: Option<Ability>,
    pub x: f32,
    pub y: f32,
    /// Facing, radians clockwise from "up".
    pub rotation: f32,
    pub health: i32,
    /// Cubes this player delivered.
    pub score: u32,
    pub coins: u32,
    pub skins: BTreeSet<String>,
    pub unlocked: UnlockedAbilities,
    pub ready: bool,
    pub last_shot_ms: Option<u64>,
    /// Ticks until the ability can be used again.
    pub ability_cooldown: u32,
    pub invisible: bool,
    pub stealth_until_ms: Option<u64>,
    pub shield_until_ms: Option<u64>,
    pub controls: Controls,
}

impl Player {
    pub fn new(id: PlayerId, name: String, tuning: &PlayerTuning) -> Self {
        Self {
            id,
            name,
            team: None,
            class: None,
            ability: None,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            health: tuning.spawn_health,
            score: 0,
            coins: tuning.starting_coins,
            skins: BTreeSet::new(),
            unlocked: UnlockedAbilities::default(),
            ready: false,
            last_shot_ms: None,
            ability_cooldown: 0,
            invisible: false,
            stealth_until_ms: None,
            shield_until_ms: None,
            controls: Controls::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Class stats, or `None` while the player has not picked a class. Players without a
    /// class are left out of the simulation.
    pub fn stats(&self) -> Option<ClassStats> {
        self.class.map(PlayerClass::stats)
    }

    pub fn is_shielded(&self, now_ms: u64) -> bool {
        self.shield_until_ms.is_some_and(|until| now_ms < until)
    }

    /// Clears everything tied to a room; purchases, coins and stats survive.
    pub fn reset_match_state(&mut self, tuning: &PlayerTuning) {
        self.team = None;
        self.class = None;
        self.ability = None;
        self.rotation = 0.0;
        self.health = tuning.spawn_health;
        self.ready = false;
        self.last_shot_ms = None;
        self.ability_cooldown = 0;
        self.invisible = false;
        self.stealth_until_ms = None;
        self.shield_until_ms = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    pub id: String,
    pub x: f32,
    pub y: f32,
    /// At most one carrier at a time.
    pub carrier: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub id: u64,
    pub origin_x: f32,
    pub origin_y: f32,
    pub x: f32,
    pub y: f32,
    /// Radians clockwise from "up".
    pub angle: f32,
    pub speed: f32,
    pub owner: PlayerId,
    pub team: Team,
    pub spawned_ms: u64,
}

/// A team's capture point, in cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cashout {
    pub team: Team,
    pub x: usize,
    pub y: usize,
}

impl Cashout {
    /// One cashout per team, placed in the four inner corners of the grid.
    pub fn for_grid(grid_size: usize) -> Vec<Cashout> {
        let far = grid_size.saturating_sub(2);
        Team::ALL
            .into_iter()
            .enumerate()
            .map(|(i, team)| Cashout {
                team,
                x: if i % 2 == 0 { 1 } else { far },
                y: if i < 2 { 1 } else { far },
            })
            .collect()
    }

    pub fn world_position(&self, cell_size: f32) -> (f32, f32) {
        (self.x as f32 * cell_size, self.y as f32 * cell_size)
    }
}
