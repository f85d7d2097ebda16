//! UDP transport adapter translating packets into simulation commands and fanning out snapshots

use crate::broadcast::SharedSnapshot;
use crate::client_manager::ClientManager;
use crate::simulation::CommandSender;
use crate::world::PlayerId;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PlayerState, MAX_DATAGRAM_SIZE, MAX_NAME_LEN};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, RwLock};

pub type NetResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Largest inbound datagram accepted from clients
const RECV_BUFFER_SIZE: usize = 4096;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    /// The simulation applied a join queued for `addr`
    JoinCompleted {
        player: PlayerState,
        addr: SocketAddr,
    },
    ClientTimeout {
        player_id: PlayerId,
    },
}

/// Truncates a requested display name to at most `MAX_NAME_LEN` bytes.
///
/// Every snapshot carries every name, so unbounded names would push the
/// snapshot past a single datagram.
pub fn session_name(mut name: String) -> String {
    if name.len() > MAX_NAME_LEN {
        let mut end = MAX_NAME_LEN;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    name
}

/// Messages sent from the main loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
    BroadcastPacket { packet: Packet },
}

/// Transport front end for one simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    commands: CommandSender,
    snapshots: broadcast::Receiver<SharedSnapshot>,
    client_timeout: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        commands: CommandSender,
        snapshots: broadcast::Receiver<SharedSnapshot>,
        max_clients: usize,
        client_timeout: Duration,
    ) -> NetResult<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            commands,
            snapshots,
            client_timeout,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; RECV_BUFFER_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet } => {
                        let data = match serialize(&packet) {
                            Ok(data) => data,
                            Err(e) => {
                                error!("Failed to encode broadcast packet: {}", e);
                                continue;
                            }
                        };
                        if data.len() > MAX_DATAGRAM_SIZE {
                            error!(
                                "Broadcast of {} bytes exceeds a datagram, dropping it",
                                data.len()
                            );
                            continue;
                        }
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for addr in client_addrs {
                            if let Err(e) = socket.send_to(&data, addr).await {
                                error!("Failed to send to client {}: {}", addr, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let timeout = self.client_timeout;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts(timeout)
                };

                for player_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { player_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(socket: &UdpSocket, packet: &Packet, addr: SocketAddr) -> NetResult<()> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn reject(&self, reason: impl Into<String>, addr: SocketAddr) {
        let reason = reason.into();
        info!("Rejecting {}: {}", addr, reason);
        self.send_packet(Packet::Rejected { reason }, addr);
    }

    /// Waits for the simulation to apply a join off the main loop, then hands
    /// the new player back through `ServerMessage::JoinCompleted`.
    fn spawn_join(&self, name: String, addr: SocketAddr) {
        let commands = self.commands.clone();
        let server_tx = self.server_tx.clone();
        let game_tx = self.game_tx.clone();

        tokio::spawn(async move {
            match commands.join(name).await {
                Ok(player) => {
                    let player_id = player.id;
                    let player = player.to_state();
                    if server_tx
                        .send(ServerMessage::JoinCompleted { player, addr })
                        .is_err()
                    {
                        error!("Main loop gone, dropping join of player {}", player_id);
                        commands.leave(player_id);
                    }
                }
                Err(e) => {
                    error!("Join from {} failed: {}", addr, e);
                    let packet = Packet::Rejected {
                        reason: e.to_string(),
                    };
                    if let Err(e) = game_tx.send(GameMessage::SendPacket { packet, addr }) {
                        error!("Failed to queue packet for sending: {}", e);
                    }
                }
            }
        });
    }

    /// Registers the session for a freshly spawned player
    async fn finish_join(&self, player: PlayerState, addr: SocketAddr) {
        let registered = {
            let mut clients = self.clients.write().await;
            // A second join from this address may have completed first
            if let Some(old_player) = clients.remove_client(&addr) {
                info!("Replacing player {} for {}", old_player, addr);
                self.commands.leave(old_player);
            }
            clients.add_client(addr, player.id)
        };

        if registered {
            self.send_packet(Packet::Joined { player }, addr);
        } else {
            self.commands.leave(player.id);
            self.reject("Server full", addr);
        }
    }

    async fn handle_message(&self, message: ServerMessage) {
        match message {
            ServerMessage::PacketReceived { packet, addr } => {
                self.handle_packet(packet, addr).await;
            }
            ServerMessage::JoinCompleted { player, addr } => {
                self.finish_join(player, addr).await;
            }
            ServerMessage::ClientTimeout { player_id } => {
                info!("Player {} timed out", player_id);
                self.commands.leave(player_id);
            }
        }
    }

    /// Translates an inbound packet into simulation commands
    async fn handle_packet(&self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Join { name } => {
                // Joining again from a known address replaces the old player
                let previous = {
                    let mut clients = self.clients.write().await;
                    clients.remove_client(&addr)
                };
                if let Some(old_player) = previous {
                    info!("Replacing player {} for {}", old_player, addr);
                    self.commands.leave(old_player);
                }

                if self.clients.read().await.is_full() {
                    self.reject("Server full", addr);
                    return;
                }

                self.spawn_join(session_name(name), addr);
            }

            Packet::Move { dx, dy } => {
                let player_id = self.clients.write().await.touch(&addr);
                match player_id {
                    Some(player_id) => self.commands.move_player(player_id, dx, dy),
                    None => debug!("Move from unregistered address {}", addr),
                }
            }

            Packet::Leave => {
                let player_id = self.clients.write().await.remove_client(&addr);
                if let Some(player_id) = player_id {
                    self.commands.leave(player_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Drops sessions whose player is gone, then queues the snapshot for the rest
    async fn broadcast_snapshot(&self, snapshot: SharedSnapshot) {
        let (absorbed, idle) = {
            let mut clients = self.clients.write().await;
            let absorbed = clients.reap_missing(&snapshot);
            (absorbed, clients.is_empty())
        };

        for (addr, player_id) in absorbed {
            info!("Player {} for {} was absorbed", player_id, addr);
            self.send_packet(Packet::Absorbed, addr);
        }

        if idle {
            return;
        }

        let packet = Packet::Snapshot(snapshot.as_ref().clone());
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket { packet }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> NetResult<()> {
        // Initialize concurrent tasks
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!("Server started successfully");

        loop {
            tokio::select! {
                // Handle network events
                message = self.server_rx.recv() => {
                    match message {
                        Some(message) => self.handle_message(message).await,
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                // Fan out post-tick snapshots
                snapshot = self.snapshots.recv() => {
                    match snapshot {
                        Ok(snapshot) => self.broadcast_snapshot(snapshot).await,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Transport fell behind, skipped {} snapshots", skipped);
                        }
                        Err(RecvError::Closed) => {
                            info!("Snapshot stream closed, server shutting down");
                            break;
                        }
                    }
                },
            }
        }

        Ok(())
    }
}
