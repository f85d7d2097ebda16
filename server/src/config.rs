//! Tunable simulation parameters
//!
//! Defaults mirror the fixed world constants from the `shared` crate. The
//! server binary overrides a subset of them from command line arguments.

use shared::{
    BASE_PLAYER_RADIUS, FOOD_RADIUS, FOOD_VALUE, PLAYER_SPEED, TARGET_FOOD_COUNT, TICK_RATE,
    WORLD_HEIGHT, WORLD_WIDTH,
};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub world_width: f64,
    pub world_height: f64,
    /// Food population restored at the end of every tick
    pub target_food: usize,
    pub base_radius: f64,
    /// Distance covered per tick by a player with a unit direction
    pub player_speed: f64,
    pub food_value: f64,
    pub food_radius: f64,
    /// Ticks per second
    pub tick_rate: u32,
    /// Seed for spawn positions, food placement and colors. `None` draws from entropy.
    pub seed: Option<u64>,
    /// Snapshots buffered per subscriber before the slowest one starts lagging
    pub snapshot_buffer: usize,
    /// Inactivity window after which a transport session is dropped
    pub client_timeout: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            target_food: TARGET_FOOD_COUNT,
            base_radius: BASE_PLAYER_RADIUS,
            player_speed: PLAYER_SPEED,
            food_value: FOOD_VALUE,
            food_radius: FOOD_RADIUS,
            tick_rate: TICK_RATE,
            seed: None,
            snapshot_buffer: 16,
            client_timeout: Duration::from_secs(5),
        }
    }
}

impl GameConfig {
    /// Default configuration with a fixed generator seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Period between two scheduled ticks. A zero tick rate is treated as 1 Hz.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }
}
