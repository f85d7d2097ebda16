//! Integration tests for the simulation core and its transport adapter
//!
//! These tests validate cross-module behavior: full ticks through the command
//! queue, world invariants over long runs, and real UDP sessions.

use bincode::{deserialize, serialize};
use server::broadcast::SnapshotBroadcaster;
use server::config::GameConfig;
use server::physics::Vector2;
use server::simulation::{CommandSender, Simulation};
use server::world::World;
use shared::Packet;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

fn seeded_simulation(seed: u64) -> (Simulation, CommandSender, SnapshotBroadcaster) {
    let broadcaster = SnapshotBroadcaster::new(16);
    let (simulation, commands) =
        Simulation::new(World::new(GameConfig::seeded(seed)), broadcaster.clone());
    (simulation, commands, broadcaster)
}

/// WORLD INVARIANT TESTS
mod invariant_tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Runs a crowded world with random steering and checks every invariant after each tick
    #[test]
    fn invariants_hold_over_many_ticks() {
        let (mut simulation, commands, _) = seeded_simulation(2024);
        let mut rng = StdRng::seed_from_u64(7);

        let ids: Vec<u32> = (0..40)
            .map(|i| simulation.world_mut().spawn_player(format!("p{}", i)).id)
            .collect();

        for tick in 0..600 {
            if tick % 10 == 0 {
                for id in &ids {
                    let dx = rng.gen_range(-1.0..1.0);
                    let dy = rng.gen_range(-1.0..1.0);
                    commands.move_player(*id, dx, dy);
                }
            }

            let world = simulation.world();
            let score_before = world.total_score();
            let food_before = world.food.len();

            let report = simulation.step();
            let world = simulation.world();

            assert_eq!(world.food.len(), 100, "food drifted at tick {}", tick);
            assert_eq!(report.food_consumed, report.food_spawned);
            assert_eq!(food_before, 100);

            // Food is the only source of new mass
            assert_approx_eq!(
                world.total_score(),
                score_before + report.food_consumed as f64,
                1e-6
            );

            for player in world.players.values() {
                assert!((0.0..=2000.0).contains(&player.position.x));
                assert!((0.0..=2000.0).contains(&player.position.y));
                assert_approx_eq!(player.radius(), 20.0 + player.score().sqrt(), 1e-9);
                assert!(!player.direction.x.is_nan() && !player.direction.y.is_nan());
            }

            let mut losers: Vec<u32> = report.absorptions.iter().map(|a| a.loser).collect();
            let absorbed = losers.len();
            losers.sort_unstable();
            losers.dedup();
            assert_eq!(losers.len(), absorbed, "double absorption at tick {}", tick);
        }
    }

    /// Two players on the same spot with scores 0 and 25
    #[test]
    fn smaller_player_is_absorbed_in_one_tick() {
        let (mut simulation, _commands, _) = seeded_simulation(5);
        let world = simulation.world_mut();
        for item in world.food.iter_mut() {
            item.position = Vector2::new(0.0, 0.0);
        }
        let small = world.spawn_player("small").id;
        let big = world.spawn_player("big").id;
        for id in [small, big] {
            world.players.get_mut(&id).unwrap().position = Vector2::new(1500.0, 1500.0);
        }
        world.players.get_mut(&big).unwrap().grow(25.0);

        let report = simulation.step();

        assert_eq!(report.absorptions.len(), 1);
        let world = simulation.world();
        assert!(world.get_player(small).is_none());
        assert_eq!(world.get_player(big).unwrap().score(), 25.0);
    }

    /// Ten pellets eaten in one tick are replaced before the tick ends
    #[test]
    fn consumed_food_is_replenished_within_the_tick() {
        let (mut simulation, _commands, broadcaster) = seeded_simulation(6);
        let mut snapshots = broadcaster.subscribe();
        let world = simulation.world_mut();
        let id = world.spawn_player("grazer").id;
        world.players.get_mut(&id).unwrap().position = Vector2::new(400.0, 400.0);
        for (i, item) in world.food.iter_mut().enumerate() {
            item.position = if i < 10 {
                Vector2::new(401.0, 399.0)
            } else {
                Vector2::new(2000.0, 0.0)
            };
        }

        let report = simulation.step();

        assert_eq!(report.food_consumed, 10);
        assert_eq!(simulation.world().food.len(), 100);
        assert_eq!(snapshots.try_recv().unwrap().food.len(), 100);
        assert_eq!(simulation.world().get_player(id).unwrap().score(), 10.0);
    }

    /// Same seed and same commands give the same world
    #[test]
    fn seeded_runs_are_reproducible() {
        let run = || {
            let (mut simulation, commands, _) = seeded_simulation(31);
            let ids: Vec<u32> = (0..10)
                .map(|_| simulation.world_mut().spawn_player("twin").id)
                .collect();
            for (i, id) in ids.iter().enumerate() {
                commands.move_player(*id, i as f64 - 5.0, 1.0);
            }
            for _ in 0..200 {
                simulation.step();
            }
            simulation.world().snapshot()
        };

        assert_eq!(run(), run());
    }
}

/// COMMAND INGRESS TESTS
mod command_tests {
    use super::*;

    /// Move for an unknown id returns normally and leaves the world untouched
    #[test]
    fn move_for_unknown_player_is_silent() {
        let (mut simulation, commands, _) = seeded_simulation(8);
        simulation.world_mut().spawn_player("only");
        let before = simulation.world().snapshot();

        commands.move_player(999_999, 3.0, 4.0);
        commands.leave(999_999);
        simulation.drain_commands();

        assert_eq!(simulation.world().snapshot(), before);
    }

    /// Many sessions issuing commands concurrently against a running simulation
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sessions_against_running_simulation() {
        let broadcaster = SnapshotBroadcaster::new(64);
        let mut snapshots = broadcaster.subscribe();
        let config = GameConfig {
            tick_rate: 120,
            ..GameConfig::seeded(12)
        };
        let (simulation, commands) = Simulation::new(World::new(config), broadcaster);
        let sim_handle = tokio::spawn(simulation.run());

        let mut sessions = Vec::new();
        for i in 0..16 {
            let commands = commands.clone();
            sessions.push(tokio::spawn(async move {
                let player = commands.join(format!("session-{}", i)).await.unwrap();
                for step in 0..20 {
                    commands.move_player(player.id, (step as f64).cos(), (step as f64).sin());
                    tokio::task::yield_now().await;
                }
                if i % 2 == 0 {
                    commands.leave(player.id);
                }
                player.id
            }));
        }

        let mut ids = Vec::new();
        for session in sessions {
            ids.push(session.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 16);

        // Every later snapshot stays within bounds and at the food target
        for _ in 0..10 {
            let snapshot = match timeout(Duration::from_secs(2), snapshots.recv()).await {
                Ok(Ok(snapshot)) => snapshot,
                Ok(Err(_)) => continue,
                Err(_) => panic!("no snapshot within timeout"),
            };
            assert_eq!(snapshot.food.len(), 100);
            assert!(snapshot.players.len() <= 16);
            for player in &snapshot.players {
                assert!((0.0..=2000.0).contains(&player.x));
                assert!((0.0..=2000.0).contains(&player.y));
            }
        }

        sim_handle.abort();
    }
}

/// UDP TRANSPORT TESTS
mod transport_tests {
    use super::*;
    use server::network::Server;

    async fn recv_packet(socket: &UdpSocket) -> Packet {
        let mut buf = vec![0u8; 65_536];
        let (len, _) = timeout(Duration::from_secs(3), socket.recv_from(&mut buf))
            .await
            .expect("no packet within timeout")
            .expect("socket error");
        deserialize(&buf[..len]).expect("undecodable packet")
    }

    /// A client joins over UDP, then sees itself in the snapshot stream
    #[tokio::test]
    async fn udp_join_then_snapshots() {
        let broadcaster = SnapshotBroadcaster::new(16);
        let (simulation, commands) =
            Simulation::new(World::new(GameConfig::seeded(99)), broadcaster.clone());
        let mut server = Server::new(
            "127.0.0.1:0",
            commands,
            broadcaster.subscribe(),
            8,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        let server_addr = server.local_addr().unwrap();

        let sim_handle = tokio::spawn(simulation.run());
        let server_handle = tokio::spawn(async move { server.run().await });

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let join = serialize(&Packet::Join {
            name: "udp-player".to_string(),
        })
        .unwrap();
        client.send_to(&join, server_addr).await.unwrap();

        let player = loop {
            match recv_packet(&client).await {
                Packet::Joined { player } => break player,
                Packet::Snapshot(_) => continue,
                other => panic!("Unexpected packet: {:?}", other),
            }
        };
        assert_eq!(player.name, "udp-player");
        assert_eq!(player.score, 0.0);
        assert_eq!(player.radius, 20.0);

        let movement = serialize(&Packet::Move { dx: 1.0, dy: 0.0 }).unwrap();
        client.send_to(&movement, server_addr).await.unwrap();

        let mut seen = false;
        for _ in 0..30 {
            if let Packet::Snapshot(snapshot) = recv_packet(&client).await {
                assert_eq!(snapshot.food.len(), 100);
                if snapshot.player(player.id).is_some() {
                    seen = true;
                    break;
                }
            }
        }
        assert!(seen, "joined player never appeared in a snapshot");

        let leave = serialize(&Packet::Leave).unwrap();
        client.send_to(&leave, server_addr).await.unwrap();

        server_handle.abort();
        sim_handle.abort();
    }
}
