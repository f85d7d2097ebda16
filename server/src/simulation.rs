//! Command ingress and the fixed-rate tick scheduler
//!
//! The [`Simulation`] is the only writer of the [`World`]. Sessions talk to it
//! through a cloneable [`CommandSender`]; queued commands are drained at the
//! start of every step, so joins, moves and leaves always land between ticks
//! and never in the middle of a sweep.
//!
//! Each step runs, in order:
//! 1. command drain
//! 2. movement integration
//! 3. food consumption and replenishment
//! 4. collision resolution
//! 5. snapshot handoff to the [`SnapshotBroadcaster`]
//!
//! [`Simulation::run`] drives steps from a `tokio` interval that skips missed
//! firings, so an overrunning tick delays the schedule instead of queuing a
//! burst of catch-up ticks. Steps take `&mut self` and run on a single task,
//! which rules out overlapping ticks.

use crate::broadcast::SnapshotBroadcaster;
use crate::collision::{self, Absorption};
use crate::food;
use crate::movement;
use crate::world::{Player, PlayerId, World};
use log::{debug, info, warn};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};

#[derive(Debug)]
pub enum Command {
    Join {
        name: String,
        reply: oneshot::Sender<Player>,
    },
    Move {
        id: PlayerId,
        dx: f64,
        dy: f64,
    },
    Leave {
        id: PlayerId,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("simulation is no longer running")]
    SimulationStopped,
}

/// Handle used by sessions to queue commands for the simulation.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandSender {
    /// Queues a join and waits for the step that applies it.
    pub async fn join(&self, name: impl Into<String>) -> Result<Player, CommandError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Command::Join {
                name: name.into(),
                reply,
            })
            .map_err(|_| CommandError::SimulationStopped)?;
        response.await.map_err(|_| CommandError::SimulationStopped)
    }

    /// Queues a direction change. Unknown ids are ignored when applied.
    pub fn move_player(&self, id: PlayerId, dx: f64, dy: f64) {
        self.send(Command::Move { id, dx, dy });
    }

    /// Queues a removal. Unknown ids are ignored when applied.
    pub fn leave(&self, id: PlayerId) {
        self.send(Command::Leave { id });
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.tx.send(command) {
            warn!("Simulation stopped, dropping {:?}", e.0);
        }
    }
}

/// Summary of one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    pub food_consumed: usize,
    pub food_spawned: usize,
    pub absorptions: Vec<Absorption>,
    pub elapsed: Duration,
}

pub struct Simulation {
    world: World,
    commands: mpsc::UnboundedReceiver<Command>,
    broadcaster: SnapshotBroadcaster,
    tick_duration: Duration,
}

impl Simulation {
    /// Takes ownership of `world` and returns the handle for queuing commands.
    pub fn new(world: World, broadcaster: SnapshotBroadcaster) -> (Self, CommandSender) {
        let (tx, commands) = mpsc::unbounded_channel();
        let tick_duration = world.config.tick_duration();

        let simulation = Self {
            world,
            commands,
            broadcaster,
            tick_duration,
        };
        (simulation, CommandSender { tx })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Join { name, reply } => {
                let player = self.world.spawn_player(name);
                if reply.send(player).is_err() {
                    debug!("Join requester went away before the reply");
                }
            }
            Command::Move { id, dx, dy } => {
                self.world.set_direction(id, dx, dy);
            }
            Command::Leave { id } => {
                self.world.remove_player(id);
            }
        }
    }

    /// Applies every queued command and returns how many there were.
    pub fn drain_commands(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
            applied += 1;
        }
        applied
    }

    /// Runs one simulation step without draining commands or publishing.
    pub fn tick(&mut self) -> TickReport {
        let started = Instant::now();

        movement::integrate(&mut self.world);
        let food = food::resolve_food(&mut self.world);
        let absorptions = collision::resolve_collisions(&mut self.world);
        self.world.tick += 1;

        TickReport {
            tick: self.world.tick,
            food_consumed: food.consumed,
            food_spawned: food.spawned,
            absorptions,
            elapsed: started.elapsed(),
        }
    }

    /// Drains commands, runs a tick and publishes the resulting snapshot.
    pub fn step(&mut self) -> TickReport {
        self.drain_commands();
        let report = self.tick();
        self.broadcaster.publish(self.world.snapshot());
        report
    }

    /// Steps forever at the configured tick rate.
    pub async fn run(mut self) {
        let mut timer = interval(self.tick_duration);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Simulation running at {} Hz ({:?} per tick)",
            self.world.config.tick_rate, self.tick_duration
        );

        loop {
            timer.tick().await;
            let report = self.step();

            if report.elapsed > self.tick_duration {
                warn!(
                    "Tick {} took {:?}, longer than the {:?} period; skipping missed firings",
                    report.tick, report.elapsed, self.tick_duration
                );
            }

            if report.tick % 60 == 0 {
                debug!(
                    "Tick {}: {} players, {} food, {} subscribers, {:?}",
                    report.tick,
                    self.world.players.len(),
                    self.world.food.len(),
                    self.broadcaster.subscriber_count(),
                    report.elapsed
                );
            }
        }
    }
}
