// Wire protocol DTOs and conversions for public arena server messages.
// Every message is `{"type": ..., "data": ...}` with camelCase names; player ids travel as
// strings so they survive JavaScript number precision.

use crate::domain::map::Cell;
use crate::domain::tuning::{Ability, PlayerClass, SHOP_ITEMS, ShopItem};
use crate::domain::{
    Bullet, Cube, GameTuning, Grid, PlayerId, RoomStatus, Scores, Team, UnlockedAbilities,
};
use crate::use_cases::types::{PlayerView, RoomSnapshot, RoomSummary, TargetPoint};
use crate::use_cases::{ClientAction, ServerEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    // Assigned identity for the connection, sent before anything else.
    Identity(PlayerRefDto),
    RoomCreated(RoomCreatedDto),
    GameStarted(GameStartedDto),
    // Full authoritative room state, once per tick.
    GameUpdate(GameUpdateDto),
    PlayerMoved(PlayerMovedDto),
    BulletFired(BulletDto),
    WallHit(CellPositionDto),
    WallRespawned(CellPositionDto),
    AbilityUsed(AbilityUsedDto),
    PlayerVisibilityChanged(VisibilityDto),
    CubeGrabbed(CubeGrabbedDto),
    CubeDelivered(CubeDeliveredDto),
    CubeDropped(CubeDto),
    PlayerHit(PlayerHitDto),
    PlayerRespawned(PlayerRefDto),
    PlayerDisconnected(PlayerRefDto),
    GameOver(GameOverDto),
    ShopData(ShopDataDto),
    Error(ErrorDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    SelectClass(SelectClassDto),
    // Direction, not an absolute position.
    Move(MoveDto),
    Shoot(ShootDto),
    UseAbility(Option<UseAbilityDto>),
    // Payload-free messages accept a missing, null or empty `data`.
    InteractWithCube(Option<EmptyDto>),
    BuyItem(BuyItemDto),
    RequestShopData(Option<EmptyDto>),
    UpdateControls(UpdateControlsDto),
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmptyDto {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectClassDto {
    pub player_class: String,
    pub ability: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveDto {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShootDto {
    pub angle: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UseAbilityDto {
    #[serde(default)]
    pub target: Option<PointDto>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointDto {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyItemDto {
    pub item_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateControlsDto {
    #[serde(default)]
    pub controls: BTreeMap<String, String>,
}

impl From<ClientMessage> for ClientAction {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::SelectClass(dto) => ClientAction::SelectClass {
                class: dto.player_class,
                ability: dto.ability,
            },
            ClientMessage::Move(dto) => ClientAction::Move { x: dto.x, y: dto.y },
            ClientMessage::Shoot(dto) => ClientAction::Shoot { angle: dto.angle },
            ClientMessage::UseAbility(dto) => ClientAction::UseAbility {
                target: dto
                    .and_then(|dto| dto.target)
                    .map(|p| TargetPoint { x: p.x, y: p.y }),
            },
            ClientMessage::InteractWithCube(_) => ClientAction::InteractWithCube,
            ClientMessage::BuyItem(dto) => ClientAction::BuyItem {
                item_id: dto.item_id,
            },
            ClientMessage::RequestShopData(_) => ClientAction::RequestShopData,
            ClientMessage::UpdateControls(dto) => ClientAction::UpdateControls {
                controls: dto.controls,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRefDto {
    pub player_id: String,
}

impl From<PlayerId> for PlayerRefDto {
    fn from(player_id: PlayerId) -> Self {
        Self {
            player_id: player_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreatedDto {
    pub room_id: String,
    /// Seconds of class selection.
    pub selection_time: u32,
    pub unlocked_abilities: BTreeMap<&'static str, Vec<&'static str>>,
    pub config: GameConfigDto,
}

/// Gameplay constants, shipped verbatim so clients render with the server's numbers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfigDto {
    pub grid_size: usize,
    pub cell_size: f32,
    pub max_players: usize,
    /// Game length in ticks.
    pub game_duration: u32,
    pub selection_time: u32,
    pub tick_interval_ms: u64,
    pub teams: Vec<&'static str>,
    pub classes: BTreeMap<&'static str, ClassDto>,
    pub abilities: BTreeMap<&'static str, Vec<&'static str>>,
    pub implemented_abilities: Vec<&'static str>,
    pub wall_health: u32,
    /// Ticks until a destroyed wall returns.
    pub wall_respawn_time: u32,
    pub cubes_to_win: u32,
    pub capture_radius: f32,
    pub bullet_speed: f32,
    pub bullet_damage: i32,
    pub bullet_radius: f32,
    pub shot_interval_ms: u64,
    pub respawn_delay_ms: u64,
    pub stealth_duration_ms: u64,
    pub shield_duration_ms: u64,
    pub shop_items: Vec<ShopItemDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDto {
    pub speed: f32,
    pub health: i32,
    pub radius: f32,
    pub cooldown: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopItemDto {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u32,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<&ShopItem> for ShopItemDto {
    fn from(item: &ShopItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            kind: item.kind.as_str(),
        }
    }
}

impl From<&GameTuning> for GameConfigDto {
    fn from(tuning: &GameTuning) -> Self {
        Self {
            grid_size: tuning.arena.grid_size,
            cell_size: tuning.arena.cell_size,
            max_players: tuning.matches.max_players,
            game_duration: tuning.matches.game_ticks,
            selection_time: tuning.matches.selection_secs,
            tick_interval_ms: tuning.matches.tick_interval_ms,
            teams: Team::ALL.iter().map(|team| team.as_str()).collect(),
            classes: PlayerClass::ALL
                .into_iter()
                .map(|class| {
                    let stats = class.stats();
                    (
                        class.as_str(),
                        ClassDto {
                            speed: stats.speed,
                            health: stats.max_health,
                            radius: stats.radius,
                            cooldown: stats.cooldown_ticks,
                        },
                    )
                })
                .collect(),
            abilities: PlayerClass::ALL
                .into_iter()
                .map(|class| (class.as_str(), ability_names(class.abilities())))
                .collect(),
            implemented_abilities: Ability::ALL
                .into_iter()
                .filter(|ability| ability.is_implemented())
                .map(Ability::as_str)
                .collect(),
            wall_health: tuning.arena.wall_health,
            wall_respawn_time: tuning.arena.wall_respawn_ticks,
            cubes_to_win: tuning.matches.cubes_to_win,
            capture_radius: tuning.matches.capture_radius,
            bullet_speed: tuning.projectile.speed,
            bullet_damage: tuning.projectile.damage,
            bullet_radius: tuning.projectile.radius,
            shot_interval_ms: tuning.projectile.shot_interval_ms,
            respawn_delay_ms: tuning.player.respawn_delay_ms,
            stealth_duration_ms: tuning.abilities.stealth_ms,
            shield_duration_ms: tuning.abilities.shield_ms,
            shop_items: SHOP_ITEMS.iter().map(ShopItemDto::from).collect(),
        }
    }
}

fn ability_names(abilities: &[Ability]) -> Vec<&'static str> {
    abilities.iter().map(|ability| ability.as_str()).collect()
}

fn unlocked_dto(unlocked: &UnlockedAbilities) -> BTreeMap<&'static str, Vec<&'static str>> {
    unlocked
        .iter()
        .map(|(class, abilities)| (class.as_str(), ability_names(abilities)))
        .collect()
}

fn scores_dto(scores: &Scores) -> BTreeMap<&'static str, u32> {
    scores
        .iter()
        .map(|(team, score)| (team.as_str(), score))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartedDto {
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdateDto {
    pub players: Vec<PlayerDto>,
    pub bullets: Vec<BulletDto>,
    pub cubes: Vec<CubeDto>,
    pub scores: BTreeMap<&'static str, u32>,
    /// Ticks left in the game.
    pub game_time: u32,
    pub map: Vec<Vec<CellDto>>,
}

impl From<&RoomSnapshot> for GameUpdateDto {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self {
            players: snapshot.players.iter().map(PlayerDto::from).collect(),
            bullets: snapshot.bullets.iter().map(BulletDto::from).collect(),
            cubes: snapshot.cubes.iter().map(CubeDto::from).collect(),
            scores: scores_dto(&snapshot.scores),
            game_time: snapshot.game_time,
            map: map_dto(&snapshot.map),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: String,
    pub name: String,
    pub team: Option<&'static str>,
    pub player_class: Option<&'static str>,
    pub ability: Option<&'static str>,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub health: i32,
    pub score: u32,
    pub coins: u32,
    pub ready: bool,
    pub ability_cooldown: u32,
    pub carrying_cube: bool,
    pub invisible: bool,
    pub skins: Vec<String>,
}

impl From<&PlayerView> for PlayerDto {
    fn from(view: &PlayerView) -> Self {
        let player = &view.player;
        Self {
            id: player.id.to_string(),
            name: player.name.clone(),
            team: player.team.map(Team::as_str),
            player_class: player.class.map(PlayerClass::as_str),
            ability: player.ability.map(Ability::as_str),
            x: player.x,
            y: player.y,
            rotation: player.rotation,
            health: player.health,
            score: player.score,
            coins: player.coins,
            ready: player.ready,
            ability_cooldown: player.ability_cooldown,
            carrying_cube: view.carrying_cube,
            invisible: player.invisible,
            skins: player.skins.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletDto {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub angle: f32,
    pub speed: f32,
    pub owner: String,
    pub team: &'static str,
}

impl From<&Bullet> for BulletDto {
    fn from(bullet: &Bullet) -> Self {
        Self {
            id: bullet.id,
            x: bullet.x,
            y: bullet.y,
            origin_x: bullet.origin_x,
            origin_y: bullet.origin_y,
            angle: bullet.angle,
            speed: bullet.speed,
            owner: bullet.owner.to_string(),
            team: bullet.team.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CubeDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub carrier: Option<String>,
}

impl From<&Cube> for CubeDto {
    fn from(cube: &Cube) -> Self {
        Self {
            id: cube.id.clone(),
            x: cube.x,
            y: cube.y,
            carrier: cube.carrier.map(|id| id.to_string()),
        }
    }
}

/// `0` for an empty cell, a wall object otherwise.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CellDto {
    Empty(u8),
    Wall(WallDto),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallDto {
    pub health: u32,
    pub indestructible: bool,
    pub temporary: bool,
}

fn map_dto(grid: &Grid) -> Vec<Vec<CellDto>> {
    grid.rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Cell::Empty => CellDto::Empty(0),
                    Cell::Wall(wall) => CellDto::Wall(WallDto {
                        health: wall.health,
                        indestructible: wall.indestructible,
                        temporary: wall.temporary,
                    }),
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMovedDto {
    pub player_id: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CellPositionDto {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityUsedDto {
    pub player_id: String,
    pub ability: &'static str,
    pub target: Option<PointDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityDto {
    pub player_id: String,
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeGrabbedDto {
    pub cube_id: String,
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeDeliveredDto {
    pub player_id: String,
    pub cube: CubeDto,
    pub scores: BTreeMap<&'static str, u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHitDto {
    pub player_id: String,
    pub health: i32,
    pub bullet_id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameOverDto {
    pub winner: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopDataDto {
    pub items: Vec<ShopItemDto>,
    pub coins: u32,
    pub unlocked_abilities: BTreeMap<&'static str, Vec<&'static str>>,
    pub skins: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDto {
    pub message: String,
}

impl From<ServerEvent> for ServerMessage {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::RoomCreated {
                room_id,
                selection_secs,
                unlocked,
                tuning,
            } => ServerMessage::RoomCreated(RoomCreatedDto {
                room_id: room_id.to_string(),
                selection_time: selection_secs,
                unlocked_abilities: unlocked_dto(&unlocked),
                config: GameConfigDto::from(&tuning),
            }),
            ServerEvent::GameStarted { room_id } => ServerMessage::GameStarted(GameStartedDto {
                room_id: room_id.to_string(),
            }),
            ServerEvent::GameUpdate(snapshot) => {
                ServerMessage::GameUpdate(GameUpdateDto::from(snapshot.as_ref()))
            }
            ServerEvent::PlayerMoved {
                player_id,
                x,
                y,
                rotation,
            } => ServerMessage::PlayerMoved(PlayerMovedDto {
                player_id: player_id.to_string(),
                x,
                y,
                rotation,
            }),
            ServerEvent::BulletFired(bullet) => ServerMessage::BulletFired(BulletDto::from(&bullet)),
            ServerEvent::WallHit { x, y } => ServerMessage::WallHit(CellPositionDto { x, y }),
            ServerEvent::WallRespawned { x, y } => {
                ServerMessage::WallRespawned(CellPositionDto { x, y })
            }
            ServerEvent::AbilityUsed {
                player_id,
                ability,
                target,
            } => ServerMessage::AbilityUsed(AbilityUsedDto {
                player_id: player_id.to_string(),
                ability: ability.as_str(),
                target: target.map(|t| PointDto { x: t.x, y: t.y }),
            }),
            ServerEvent::PlayerVisibilityChanged { player_id, visible } => {
                ServerMessage::PlayerVisibilityChanged(VisibilityDto {
                    player_id: player_id.to_string(),
                    visible,
                })
            }
            ServerEvent::CubeGrabbed { cube_id, player_id } => {
                ServerMessage::CubeGrabbed(CubeGrabbedDto {
                    cube_id,
                    player_id: player_id.to_string(),
                })
            }
            ServerEvent::CubeDelivered {
                player_id,
                cube,
                scores,
            } => ServerMessage::CubeDelivered(CubeDeliveredDto {
                player_id: player_id.to_string(),
                cube: CubeDto::from(&cube),
                scores: scores_dto(&scores),
            }),
            ServerEvent::CubeDropped(cube) => ServerMessage::CubeDropped(CubeDto::from(&cube)),
            ServerEvent::PlayerHit {
                player_id,
                health,
                bullet_id,
            } => ServerMessage::PlayerHit(PlayerHitDto {
                player_id: player_id.to_string(),
                health,
                bullet_id,
            }),
            ServerEvent::PlayerRespawned { player_id } => {
                ServerMessage::PlayerRespawned(player_id.into())
            }
            ServerEvent::PlayerDisconnected { player_id } => {
                ServerMessage::PlayerDisconnected(player_id.into())
            }
            ServerEvent::GameOver { winner } => ServerMessage::GameOver(GameOverDto {
                winner: winner.as_str(),
            }),
            ServerEvent::ShopData {
                coins,
                unlocked,
                skins,
            } => ServerMessage::ShopData(ShopDataDto {
                items: SHOP_ITEMS.iter().map(ShopItemDto::from).collect(),
                coins,
                unlocked_abilities: unlocked_dto(&unlocked),
                skins,
            }),
            ServerEvent::Error { message } => ServerMessage::Error(ErrorDto { message }),
        }
    }
}

/// Room listing row for `GET /rooms`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub status: &'static str,
    pub players: usize,
    pub scores: BTreeMap<&'static str, u32>,
    pub game_time: u32,
}

impl From<&RoomSummary> for RoomSummaryDto {
    fn from(summary: &RoomSummary) -> Self {
        Self {
            room_id: summary.room_id.to_string(),
            status: RoomStatus::as_str(summary.status),
            players: summary.members,
            scores: scores_dto(&summary.scores),
            game_time: summary.game_time,
        }
    }
}
