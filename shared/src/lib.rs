use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const DEFAULT_PORT: u16 = 3000;
pub const WS_PATH: &str = "/ws";
pub const NAME_PREFIX: &str = "Player";
pub const SHORT_ID_LEN: usize = 4;

/// Server-assigned identity of one connection. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First few hex digits, used for the default display name.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..SHORT_ID_LEN].to_string()
    }

    pub fn default_name(&self) -> String {
        format!("{} {}", NAME_PREFIX, self.short())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClientId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Placement request as sent by a client, before the server stamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRequest {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub color: String,
}

impl BlockRequest {
    pub fn new(x: f64, y: f64, z: f64, color: impl Into<String>) -> Self {
        Self {
            x,
            y,
            z,
            color: color.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A placed block. Immutable once the server has stamped it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub color: String,
    pub player_id: ClientId,
    pub timestamp: u64,
}

/// Public view of a connected player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: ClientId,
    pub color: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerSnapshot {
    pub blocks: Vec<Block>,
    pub max_height: i64,
}

/// Events pushed from the server to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    GameState {
        self_id: ClientId,
        tower: Vec<Block>,
        players: Vec<PlayerInfo>,
        max_height: i64,
    },
    BlockPlaced(Block),
    MaxHeightUpdated(i64),
    PlayerJoined(PlayerInfo),
    PlayerLeft(ClientId),
    PlayerNameChanged {
        id: ClientId,
        name: String,
    },
    PlayerMoved {
        id: ClientId,
        position: Position,
    },
    TowerReset,
}

impl ServerEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Events sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    PlaceBlock(BlockRequest),
    PlayerMove(Position),
    ChangeName(String),
}

impl ClientEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes an inbound frame. Anything that does not parse, or carries
    /// non-finite coordinates, yields `None` and is meant to be dropped.
    pub fn decode(text: &str) -> Option<Self> {
        let event: ClientEvent = serde_json::from_str(text).ok()?;
        let valid = match &event {
            ClientEvent::PlaceBlock(request) => request.is_valid(),
            ClientEvent::PlayerMove(position) => position.is_finite(),
            ClientEvent::ChangeName(_) => true,
        };
        valid.then_some(event)
    }
}
