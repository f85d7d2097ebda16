use clap::Parser;
use log::{error, info};
use server::broadcast::SnapshotBroadcaster;
use server::config::GameConfig;
use server::network::{NetResult, Server};
use server::simulation::Simulation;
use server::world::World;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,
    /// Tick rate (simulation steps per second)
    #[arg(short, long, default_value_t = shared::TICK_RATE)]
    tick_rate: u32,
    /// Seed for spawn positions, food placement and colors
    #[arg(short, long)]
    seed: Option<u64>,
    /// Maximum number of concurrent clients
    #[arg(short, long, default_value_t = shared::DEFAULT_MAX_CLIENTS)]
    max_clients: usize,
    /// Food population maintained after every tick
    #[arg(short, long, default_value_t = shared::TARGET_FOOD_COUNT)]
    food: usize,
}

/// Parses command-line arguments, then runs the simulation and the network server on separate tasks.
#[tokio::main]
async fn main() -> NetResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = GameConfig {
        tick_rate: args.tick_rate,
        seed: args.seed,
        target_food: args.food,
        ..GameConfig::default()
    };

    let broadcaster = SnapshotBroadcaster::new(config.snapshot_buffer);
    let client_timeout = config.client_timeout;
    let (simulation, commands) = Simulation::new(World::new(config), broadcaster.clone());

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(
        &address,
        commands,
        broadcaster.subscribe(),
        args.max_clients,
        client_timeout,
    )
    .await?;

    let simulation_handle = tokio::spawn(simulation.run());
    let server_handle = tokio::spawn(async move { server.run().await });

    tokio::select! {
        result = server_handle => {
            match result {
                Ok(Err(e)) => error!("Network server failed: {}", e),
                Err(e) => error!("Network task panicked: {}", e),
                Ok(Ok(())) => info!("Network server stopped"),
            }
        }
        result = simulation_handle => {
            if let Err(e) = result {
                error!("Simulation task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
