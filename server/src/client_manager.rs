//! Session tracking for the UDP transport
//!
//! This module maps network addresses to the players they control:
//! - Session lifecycle (join, leave, timeout, absorption)
//! - Capacity enforcement
//! - Address lookup for routing inbound packets and fanning out snapshots
//!
//! Sessions are purely a transport concern. The world only ever sees the
//! join/move/leave commands derived from them.

use crate::world::PlayerId;
use log::info;
use shared::WorldSnapshot;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected client and the player it controls
#[derive(Debug)]
pub struct Client {
    /// Player spawned for this session
    pub player_id: PlayerId,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
    /// Set once the player shows up in a snapshot
    pub in_world: bool,
}

impl Client {
    pub fn new(player_id: PlayerId, addr: SocketAddr) -> Self {
        Self {
            player_id,
            addr,
            last_seen: Instant::now(),
            in_world: false,
        }
    }

    /// Checks if the client has exceeded the connection timeout
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Manages all connected clients
///
/// Clients are keyed by address since every inbound datagram is routed by its
/// source address. A client joining again from the same address replaces its
/// previous session.
pub struct ClientManager {
    clients: HashMap<SocketAddr, Client>,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    /// True when a new address would be turned away.
    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    /// Registers a session. Returns false if the server is at capacity.
    pub fn add_client(&mut self, addr: SocketAddr, player_id: PlayerId) -> bool {
        if !self.clients.contains_key(&addr) && self.is_full() {
            return false;
        }

        info!("Client {} joined as player {}", addr, player_id);
        self.clients.insert(addr, Client::new(player_id, addr));
        true
    }

    /// Removes a session and returns the player it controlled.
    pub fn remove_client(&mut self, addr: &SocketAddr) -> Option<PlayerId> {
        let client = self.clients.remove(addr)?;
        info!("Client {} (player {}) left", addr, client.player_id);
        Some(client.player_id)
    }

    pub fn find_player_by_addr(&self, addr: &SocketAddr) -> Option<PlayerId> {
        self.clients.get(addr).map(|client| client.player_id)
    }

    /// Marks the session as active. Returns its player, if any.
    pub fn touch(&mut self, addr: &SocketAddr) -> Option<PlayerId> {
        let client = self.clients.get_mut(addr)?;
        client.last_seen = Instant::now();
        Some(client.player_id)
    }

    /// Removes sessions idle for longer than `timeout` and returns their players.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<PlayerId> {
        let timed_out: Vec<SocketAddr> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(addr, _)| *addr)
            .collect();

        timed_out
            .iter()
            .filter_map(|addr| self.remove_client(addr))
            .collect()
    }

    /// Removes sessions whose player has left the world and returns them.
    ///
    /// A session only counts as gone once its player has appeared in an earlier
    /// snapshot, since snapshots taken before the join may still be in flight.
    pub fn reap_missing(&mut self, snapshot: &WorldSnapshot) -> Vec<(SocketAddr, PlayerId)> {
        let present: HashSet<PlayerId> = snapshot.players.iter().map(|p| p.id).collect();
        let mut missing = Vec::new();

        for client in self.clients.values_mut() {
            if present.contains(&client.player_id) {
                client.in_world = true;
            } else if client.in_world {
                missing.push(client.addr);
            }
        }

        missing
            .into_iter()
            .filter_map(|addr| self.remove_client(&addr).map(|id| (addr, id)))
            .collect()
    }

    pub fn get_client_addrs(&self) -> Vec<SocketAddr> {
        self.clients.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
