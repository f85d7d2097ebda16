//! # Arena Server Library
//!
//! This library provides the authoritative simulation core for a real-time
//! multiplayer area-control game. Players steer circular avatars around a
//! bounded world, grow by eating food pellets and absorb smaller players on
//! contact. The server owns the canonical world state and hands a snapshot of
//! it to subscribers after every tick.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Every tick moves all players along their last commanded direction, resolves
//! food consumption, tops the food population back up to its target and
//! resolves player-vs-player absorption. The total score of colliding players
//! is conserved and no player is absorbed twice in one tick.
//!
//! ### Command Ingress
//! Join, move and leave commands arrive asynchronously from any number of
//! sessions. They are queued and applied between ticks by the simulation task,
//! which is the only writer of the world.
//!
//! ### Snapshot Fan-out
//! The post-tick snapshot is handed to a bounded broadcast channel. Slow
//! consumers lag and skip ahead; they never stall the tick.
//!
//! ## Module Organization
//!
//! - `config`: tunable constants, tick rate and RNG seed
//! - `physics`: 2D vector math and circle overlap
//! - `world`: players, food and the world store
//! - `movement`: direction normalization and per-tick integration
//! - `food`: consumption and replenishment
//! - `collision`: pairwise absorption
//! - `broadcast`: non-blocking snapshot handoff
//! - `simulation`: command queue and fixed-rate tick scheduler
//! - `client_manager` / `network`: UDP transport adapter
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::broadcast::SnapshotBroadcaster;
//! use server::config::GameConfig;
//! use server::simulation::Simulation;
//! use server::world::World;
//!
//! #[tokio::main]
//! async fn main() {
//!     let broadcaster = SnapshotBroadcaster::new(16);
//!     let mut snapshots = broadcaster.subscribe();
//!
//!     let world = World::new(GameConfig::seeded(42));
//!     let (simulation, commands) = Simulation::new(world, broadcaster);
//!     tokio::spawn(simulation.run());
//!
//!     let player = commands.join("blob").await.unwrap();
//!     commands.move_player(player.id, 1.0, 0.0);
//!
//!     while let Ok(snapshot) = snapshots.recv().await {
//!         println!("tick {}: {} players", snapshot.tick, snapshot.players.len());
//!     }
//! }
//! ```
//!
//! ## Scaling
//!
//! Per-tick cost is `O(players * food + players^2)`, fine for the small
//! populations a single instance serves. A spatial index could replace the
//! brute-force scans without changing consumption or absorption semantics.

pub mod broadcast;
pub mod client_manager;
pub mod collision;
pub mod config;
pub mod food;
pub mod movement;
pub mod network;
pub mod physics;
pub mod simulation;
pub mod world;
