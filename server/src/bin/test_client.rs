//! Headless bot that joins a running server, wanders around and reports what it sees.

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, timeout, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: SocketAddr,
    /// Display name
    #[arg(short, long, default_value = "bot")]
    name: String,
    /// Seconds to play before leaving
    #[arg(short, long, default_value = "10")]
    duration: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    info!("Client socket bound to {}", socket.local_addr()?);

    socket
        .send_to(&serialize(&Packet::Join { name: args.name })?, args.server)
        .await?;

    let mut buf = vec![0u8; 65_536];
    let player = loop {
        let (len, _) = timeout(Duration::from_secs(3), socket.recv_from(&mut buf)).await??;
        match deserialize::<Packet>(&buf[..len])? {
            Packet::Joined { player } => break player,
            Packet::Rejected { reason } => {
                warn!("Join rejected: {}", reason);
                return Ok(());
            }
            other => warn!("Ignoring {:?} while waiting to join", other),
        }
    };
    info!(
        "Joined as player {} ({}) at ({:.1}, {:.1})",
        player.id,
        player.color.to_hex(),
        player.x,
        player.y
    );

    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let mut steer = interval(Duration::from_secs(1));
    let mut heading = 0.0f64;

    while Instant::now() < deadline {
        tokio::select! {
            _ = steer.tick() => {
                heading += 0.7;
                let packet = Packet::Move { dx: heading.cos(), dy: heading.sin() };
                socket.send_to(&serialize(&packet)?, args.server).await?;
            }
            received = socket.recv_from(&mut buf) => {
                let (len, _) = received?;
                match deserialize::<Packet>(&buf[..len]) {
                    Ok(Packet::Snapshot(snapshot)) => {
                        if let Some(me) = snapshot.player(player.id) {
                            if snapshot.tick % 60 == 0 {
                                info!(
                                    "Tick {}: at ({:.1}, {:.1}) score {:.1}, {} players, {} food",
                                    snapshot.tick, me.x, me.y, me.score,
                                    snapshot.players.len(), snapshot.food.len()
                                );
                            }
                        }
                    }
                    Ok(Packet::Absorbed) => {
                        info!("Absorbed, leaving");
                        return Ok(());
                    }
                    Ok(other) => warn!("Ignoring {:?}", other),
                    Err(e) => warn!("Undecodable packet: {}", e),
                }
            }
        }
    }

    socket
        .send_to(&serialize(&Packet::Leave)?, args.server)
        .await?;
    info!("Test client finished");
    Ok(())
}
