//! Authoritative world state
//!
//! The [`World`] owns every player and food item and is the single source of
//! truth for the simulation. It is never shared behind a lock: the
//! [`Simulation`](crate::simulation::Simulation) owns it exclusively and applies
//! queued commands between ticks, so a tick sweep can never observe a
//! half-applied join or leave.

use crate::config::GameConfig;
use crate::movement;
use crate::physics::Vector2;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{radius_for_score, Color, FoodState, PlayerState, WorldSnapshot};
use std::collections::HashMap;

pub type PlayerId = u32;
pub type FoodId = u32;

/// A player avatar.
///
/// Score and radius are private so the radius law
/// `radius = base_radius + sqrt(score)` holds after every mutation: the only
/// way to change the score is [`Player::grow`].
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Vector2,
    /// Unit length or zero
    pub direction: Vector2,
    pub speed: f64,
    pub color: Color,
    base_radius: f64,
    radius: f64,
    score: f64,
}

impl Player {
    /// Creates a stationary player with zero score.
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        position: Vector2,
        color: Color,
        config: &GameConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            direction: Vector2::ZERO,
            speed: config.player_speed,
            color,
            base_radius: config.base_radius,
            radius: radius_for_score(config.base_radius, 0.0),
            score: 0.0,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Adds mass and recomputes the radius.
    pub fn grow(&mut self, amount: f64) {
        self.score += amount;
        self.radius = radius_for_score(self.base_radius, self.score);
    }

    pub fn to_state(&self) -> PlayerState {
        PlayerState {
            id: self.id,
            name: self.name.clone(),
            x: self.position.x,
            y: self.position.y,
            radius: self.radius,
            color: self.color,
            score: self.score,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Food {
    pub id: FoodId,
    pub position: Vector2,
    pub radius: f64,
    /// Mass granted to the consuming player
    pub value: f64,
    pub color: Color,
}

impl Food {
    pub fn to_state(&self) -> FoodState {
        FoodState {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            radius: self.radius,
            color: self.color,
        }
    }
}

pub struct World {
    pub config: GameConfig,
    /// Number of completed ticks
    pub tick: u64,
    pub players: HashMap<PlayerId, Player>,
    pub food: Vec<Food>,
    next_player_id: PlayerId,
    next_food_id: FoodId,
    rng: StdRng,
}

impl World {
    /// Creates a world seeded from `config.seed`, or from entropy when unset.
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Creates a world drawing all randomness from `rng`, filled to the target food count.
    pub fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        let mut world = Self {
            food: Vec::with_capacity(config.target_food),
            config,
            tick: 0,
            players: HashMap::new(),
            next_player_id: 1,
            next_food_id: 1,
            rng,
        };
        world.replenish_food();

        info!(
            "World created ({}x{}, {} food)",
            world.config.world_width,
            world.config.world_height,
            world.food.len()
        );
        world
    }

    pub fn width(&self) -> f64 {
        self.config.world_width
    }

    pub fn height(&self) -> f64 {
        self.config.world_height
    }

    /// Creates a player with a random spawn point and color, adds it and returns a copy.
    pub fn spawn_player(&mut self, name: impl Into<String>) -> Player {
        let id = self.next_player_id;
        let position = self.random_position();
        let color = self.random_color();
        let player = Player::new(id, name, position, color, &self.config);
        self.add_player(player.clone());
        player
    }

    /// Inserts a player, replacing any existing player with the same id.
    pub fn add_player(&mut self, player: Player) {
        self.next_player_id = self.next_player_id.max(player.id.wrapping_add(1));
        info!(
            "Added player {} ({:?}) at ({:.1}, {:.1})",
            player.id, player.name, player.position.x, player.position.y
        );
        self.players.insert(player.id, player);
    }

    /// Removes a player. Unknown ids are ignored.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let removed = self.players.remove(&id);
        if removed.is_some() {
            info!("Removed player {}", id);
        }
        removed
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Stores the normalized commanded direction. Returns false for unknown ids.
    pub fn set_direction(&mut self, id: PlayerId, dx: f64, dy: f64) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.direction = movement::direction_from_input(dx, dy);
                true
            }
            None => {
                debug!("Ignoring move for unknown player {}", id);
                false
            }
        }
    }

    /// Player ids in ascending order; the iteration order used by the resolvers.
    pub fn player_ids_sorted(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn total_score(&self) -> f64 {
        self.players.values().map(Player::score).sum()
    }

    /// Places one food item at a random position.
    pub fn spawn_food(&mut self) -> FoodId {
        let id = self.next_food_id;
        self.next_food_id = self.next_food_id.wrapping_add(1);

        let position = self.random_position();
        let color = self.random_color();
        self.food.push(Food {
            id,
            position,
            radius: self.config.food_radius,
            value: self.config.food_value,
            color,
        });
        id
    }

    /// Tops the food population up to the target. Never overshoots.
    pub fn replenish_food(&mut self) -> usize {
        let mut spawned = 0;
        while self.food.len() < self.config.target_food {
            self.spawn_food();
            spawned += 1;
        }
        spawned
    }

    /// Detached copy of the current players and food.
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut players: Vec<PlayerState> = self.players.values().map(Player::to_state).collect();
        players.sort_unstable_by_key(|p| p.id);

        WorldSnapshot {
            tick: self.tick,
            width: self.config.world_width,
            height: self.config.world_height,
            players,
            food: self.food.iter().map(Food::to_state).collect(),
        }
    }

    fn random_position(&mut self) -> Vector2 {
        Vector2 {
            x: self.rng.gen_range(0.0..=self.config.world_width),
            y: self.rng.gen_range(0.0..=self.config.world_height),
        }
    }

    fn random_color(&mut self) -> Color {
        Color::new(self.rng.gen(), self.rng.gen(), self.rng.gen())
    }
}
