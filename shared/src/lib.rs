use serde::{Deserialize, Serialize};

pub const WORLD_WIDTH: f64 = 2000.0;
pub const WORLD_HEIGHT: f64 = 2000.0;
pub const TARGET_FOOD_COUNT: usize = 100;
pub const BASE_PLAYER_RADIUS: f64 = 20.0;
pub const PLAYER_SPEED: f64 = 5.0;
pub const FOOD_VALUE: f64 = 1.0;
pub const FOOD_RADIUS: f64 = 5.0;
pub const TICK_RATE: u32 = 60;

/// Default number of concurrent sessions the UDP server accepts
pub const DEFAULT_MAX_CLIENTS: usize = 32;
/// Longest display name, in bytes, the transport forwards into the world
pub const MAX_NAME_LEN: usize = 32;
/// Largest UDP payload over IPv4
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Radius of a player carrying `score` mass on top of `base_radius`.
pub fn radius_for_score(base_radius: f64, score: f64) -> f64 {
    base_radius + score.sqrt()
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS style `#rrggbb` representation.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerState {
    pub id: u32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Color,
    pub score: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FoodState {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Color,
}

/// Point-in-time copy of the world handed to subscribers after each tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: f64,
    pub height: f64,
    pub players: Vec<PlayerState>,
    pub food: Vec<FoodState>,
}

impl WorldSnapshot {
    pub fn player(&self, id: u32) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Join { name: String },
    Move { dx: f64, dy: f64 },
    Leave,

    Joined { player: PlayerState },
    Snapshot(WorldSnapshot),
    Rejected { reason: String },
    /// The session's player was absorbed; a new `Join` is needed to play on.
    Absorbed,
}
