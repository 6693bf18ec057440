// Use-case level inputs/outputs for the arena task.

use crate::domain::tuning::Ability;
use crate::domain::{
    Bullet, Cube, GameTuning, Grid, Player, PlayerId, RoomId, RoomStatus, Scores, Team,
    UnlockedAbilities,
};
use std::collections::BTreeMap;
use tokio::sync::oneshot;

/// Optional aim point attached to an ability; echoed back in `AbilityUsed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPoint {
    pub x: f32,
    pub y: f32,
}

/// Validated-shape client commands. Semantic checks happen in the handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    SelectClass { class: String, ability: String },
    Move { x: f32, y: f32 },
    Shoot { angle: f32 },
    UseAbility { target: Option<TargetPoint> },
    InteractWithCube,
    BuyItem { item_id: String },
    RequestShopData,
    UpdateControls { controls: BTreeMap<String, String> },
}

impl ClientAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectClass { .. } => "selectClass",
            Self::Move { .. } => "move",
            Self::Shoot { .. } => "shoot",
            Self::UseAbility { .. } => "useAbility",
            Self::InteractWithCube => "interactWithCube",
            Self::BuyItem { .. } => "buyItem",
            Self::RequestShopData => "requestShopData",
            Self::UpdateControls { .. } => "updateControls",
        }
    }
}

#[derive(Debug)]
pub enum ArenaCommand {
    Connect {
        player_id: PlayerId,
    },
    Disconnect {
        player_id: PlayerId,
    },
    Action {
        player_id: PlayerId,
        action: ClientAction,
    },
    ListRooms {
        reply: oneshot::Sender<Vec<RoomSummary>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub members: usize,
    pub scores: Scores,
    pub game_time: u32,
}

/// One player row of a snapshot.
#[derive(Debug, Clone)]
pub struct PlayerView {
    pub player: Player,
    pub carrying_cube: bool,
}

/// Full authoritative room state, broadcast once per tick.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub players: Vec<PlayerView>,
    pub bullets: Vec<Bullet>,
    pub cubes: Vec<Cube>,
    pub scores: Scores,
    pub game_time: u32,
    pub map: Grid,
}

#[derive(Debug, Clone)]
pub enum ServerEvent {
    RoomCreated {
        room_id: RoomId,
        selection_secs: u32,
        unlocked: UnlockedAbilities,
        tuning: GameTuning,
    },
    GameStarted {
        room_id: RoomId,
    },
    GameUpdate(Box<RoomSnapshot>),
    PlayerMoved {
        player_id: PlayerId,
        x: f32,
        y: f32,
        rotation: f32,
    },
    BulletFired(Bullet),
    WallHit {
        x: usize,
        y: usize,
    },
    WallRespawned {
        x: usize,
        y: usize,
    },
    AbilityUsed {
        player_id: PlayerId,
        ability: Ability,
        target: Option<TargetPoint>,
    },
    PlayerVisibilityChanged {
        player_id: PlayerId,
        visible: bool,
    },
    CubeGrabbed {
        cube_id: String,
        player_id: PlayerId,
    },
    CubeDelivered {
        player_id: PlayerId,
        cube: Cube,
        scores: Scores,
    },
    CubeDropped(Cube),
    PlayerHit {
        player_id: PlayerId,
        health: i32,
        bullet_id: u64,
    },
    PlayerRespawned {
        player_id: PlayerId,
    },
    PlayerDisconnected {
        player_id: PlayerId,
    },
    GameOver {
        winner: Team,
    },
    ShopData {
        coins: u32,
        unlocked: UnlockedAbilities,
        skins: Vec<String>,
    },
    Error {
        message: String,
    },
}

/// An event and the players it is addressed to, resolved when the event was produced.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub recipients: Vec<PlayerId>,
    pub event: ServerEvent,
}

/// Events produced by one handler or timer, in emission order.
#[derive(Debug, Default)]
pub struct Outbox(Vec<Outbound>);

impl Outbox {
    /// Fans an event out to every member of a room.
    pub fn broadcast(&mut self, members: &[PlayerId], event: ServerEvent) {
        if members.is_empty() {
            return;
        }
        self.0.push(Outbound {
            recipients: members.to_vec(),
            event,
        });
    }

    pub fn send(&mut self, player_id: PlayerId, event: ServerEvent) {
        self.0.push(Outbound {
            recipients: vec![player_id],
            event,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Outbound> {
        self.0
    }
}

/// Delivery port for outbound events. The adapter owns connections and wire encoding;
/// delivery is fire-and-forget and must not block the arena task.
pub trait EventSink: Send + Sync {
    fn deliver(&self, batch: Vec<Outbound>);
}

/// Reasons an action was refused. None of them are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    UnknownPlayer,
    NotInRoom,
    NoTeam,
    WrongPhase,
    NotAlive,
    NoClass,
    UnknownClass,
    AbilityNotUnlocked,
    AbilityUnavailable,
    CooldownActive,
    ShotTooSoon,
    UnknownItem,
    InsufficientFunds,
    AlreadyOwned,
    NothingToUnlock,
    InvalidInput,
}

impl ActionError {
    /// Text for the `error` event, or `None` when the refusal stays silent.
    pub fn client_message(self) -> Option<&'static str> {
        match self {
            Self::UnknownClass => Some("Unknown class"),
            Self::AbilityNotUnlocked => Some("Ability not unlocked"),
            Self::AbilityUnavailable => Some("Ability not available"),
            Self::UnknownItem => Some("Unknown item"),
            Self::InsufficientFunds => Some("Not enough coins"),
            Self::AlreadyOwned => Some("Item already owned"),
            Self::NothingToUnlock => Some("All abilities already unlocked"),
            Self::UnknownPlayer
            | Self::NotInRoom
            | Self::NoTeam
            | Self::WrongPhase
            | Self::NotAlive
            | Self::NoClass
            | Self::CooldownActive
            | Self::ShotTooSoon
            | Self::InvalidInput => None,
        }
    }
}
