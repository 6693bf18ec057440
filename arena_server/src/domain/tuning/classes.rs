/// Gameplay tuning for the selectable player classes.
///
/// Class stats are fixed at process start and shipped to clients inside `roomCreated`.
use super::abilities::Ability;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlayerClass {
    Light,
    Medium,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassStats {
    /// Distance covered by one full-length move command.
    pub speed: f32,

    /// Health restored on selection and respawn.
    pub max_health: i32,

    /// Collision radius for movement, bullet and cube checks.
    pub radius: f32,

    /// Ability cooldown in ticks.
    pub cooldown_ticks: u32,
}

impl PlayerClass {
    pub const ALL: [PlayerClass; 3] = [PlayerClass::Light, PlayerClass::Medium, PlayerClass::Heavy];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Heavy => "heavy",
        }
    }

    pub fn stats(self) -> ClassStats {
        match self {
            Self::Light => ClassStats {
                speed: 5.0,
                max_health: 80,
                radius: 12.0,
                cooldown_ticks: 8,
            },
            Self::Medium => ClassStats {
                speed: 3.0,
                max_health: 120,
                radius: 15.0,
                cooldown_ticks: 12,
            },
            Self::Heavy => ClassStats {
                speed: 2.0,
                max_health: 160,
                radius: 18.0,
                cooldown_ticks: 15,
            },
        }
    }

    /// Abilities declared for this class. The first entry is unlocked for every new player.
    pub fn abilities(self) -> &'static [Ability] {
        match self {
            Self::Light => &[
                Ability::Stealth,
                Ability::Dash,
                Ability::Phase,
                Ability::Teleport,
            ],
            Self::Medium => &[Ability::Turret, Ability::Mine, Ability::Heal, Ability::Clone],
            Self::Heavy => &[Ability::Wall, Ability::Hammer, Ability::Stun, Ability::Shield],
        }
    }
}

impl FromStr for PlayerClass {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.as_str() == value)
            .ok_or(())
    }
}
