/// Ability catalog. Each variant has exactly one effect handler; variants without one are
/// rejected instead of silently doing nothing.
use super::classes::PlayerClass;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ability {
    Stealth,
    Dash,
    Phase,
    Teleport,
    Turret,
    Mine,
    Heal,
    Clone,
    Wall,
    Hammer,
    Stun,
    Shield,
}

#[derive(Debug, Clone, Copy)]
pub struct AbilityTuning {
    /// How long stealth keeps a player invisible.
    pub stealth_ms: u64,

    /// Forward distance covered by a dash.
    pub dash_distance: f32,

    /// Distance ahead of the player where a wall is raised.
    pub wall_reach: f32,

    /// Health of an ability-placed wall.
    pub temporary_wall_health: u32,

    /// Health restored by a heal, capped at the class maximum.
    pub heal_amount: i32,

    /// How long a shield absorbs incoming bullets.
    pub shield_ms: u64,
}

impl Default for AbilityTuning {
    fn default() -> Self {
        Self {
            stealth_ms: 5_000,
            dash_distance: 100.0,
            wall_reach: 50.0,
            temporary_wall_health: 2,
            heal_amount: 40,
            shield_ms: 3_000,
        }
    }
}

impl Ability {
    pub const ALL: [Ability; 12] = [
        Ability::Stealth,
        Ability::Dash,
        Ability::Phase,
        Ability::Teleport,
        Ability::Turret,
        Ability::Mine,
        Ability::Heal,
        Ability::Clone,
        Ability::Wall,
        Ability::Hammer,
        Ability::Stun,
        Ability::Shield,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stealth => "stealth",
            Self::Dash => "dash",
            Self::Phase => "phase",
            Self::Teleport => "teleport",
            Self::Turret => "turret",
            Self::Mine => "mine",
            Self::Heal => "heal",
            Self::Clone => "clone",
            Self::Wall => "wall",
            Self::Hammer => "hammer",
            Self::Stun => "stun",
            Self::Shield => "shield",
        }
    }

    pub fn class(self) -> PlayerClass {
        match self {
            Self::Stealth | Self::Dash | Self::Phase | Self::Teleport => PlayerClass::Light,
            Self::Turret | Self::Mine | Self::Heal | Self::Clone => PlayerClass::Medium,
            Self::Wall | Self::Hammer | Self::Stun | Self::Shield => PlayerClass::Heavy,
        }
    }

    /// Whether the server has an effect for this ability.
    pub fn is_implemented(self) -> bool {
        matches!(
            self,
            Self::Stealth | Self::Dash | Self::Wall | Self::Heal | Self::Shield
        )
    }
}

impl FromStr for Ability {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ability| ability.as_str() == value)
            .ok_or(())
    }
}
