//! Peer connection management for the multiplayer server
//!
//! Tracks which peer lives at which address, enforces the capacity limit
//! and detects peers that went silent. Entities are created and destroyed
//! by the caller alongside these connection changes, keeping the entity
//! registry consistent with the set of connected peers.

use log::info;
use shared::PeerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Represents a connected peer
#[derive(Debug)]
pub struct Client {
    /// Unique peer identifier assigned by the server
    pub id: PeerId,
    /// Network address for sending snapshots
    pub addr: SocketAddr,
    /// Last time we received any packet from this peer
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: PeerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    /// Returns true if nothing has been received within `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Manages all connected peers
///
/// Peer ids start at 1 and are never reused, so a stale datagram from an
/// old session can never be attributed to a newer peer.
pub struct ClientManager {
    clients: HashMap<PeerId, Client>,
    next_client_id: PeerId,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to add a new peer
    ///
    /// Returns Some(peer_id) if successful, None if the server is at capacity.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<PeerId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Peer {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Removes a peer. Returns false if it was already gone.
    pub fn remove_client(&mut self, client_id: &PeerId) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Peer {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    /// Finds a peer id by network address
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<PeerId> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Marks the peer as alive. Returns false if the id is unknown.
    pub fn touch(&mut self, client_id: PeerId) -> bool {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.last_seen = Instant::now();
            true
        } else {
            false
        }
    }

    /// Lists every peer silent for longer than `timeout`. Removal is left to
    /// the simulation loop so the entity goes away in the same step.
    pub fn timed_out_clients(&self, timeout: Duration) -> Vec<PeerId> {
        self.clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Returns false for unknown peers.
    pub fn is_timed_out(&self, client_id: &PeerId, timeout: Duration) -> bool {
        self.clients
            .get(client_id)
            .map_or(false, |client| client.is_timed_out(timeout))
    }

    pub fn client_addr(&self, client_id: &PeerId) -> Option<SocketAddr> {
        self.clients.get(client_id).map(|client| client.addr)
    }

    /// Gets all peer ids and their addresses, used for broadcasting
    pub fn get_client_addrs(&self) -> Vec<(PeerId, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_client_creation() {
        let addr = test_addr();
        let client = Client::new(1, addr);

        assert_eq!(client.id, 1);
        assert_eq!(client.addr, addr);
        assert!(!client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_client_timeout() {
        let mut client = Client::new(1, test_addr());
        client.last_seen = Instant::now() - Duration::from_secs(2);

        assert!(client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_add_multiple_clients() {
        let mut manager = ClientManager::new(3);

        assert_eq!(manager.add_client(test_addr()), Some(1));
        assert_eq!(manager.add_client(test_addr2()), Some(2));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_add_client_max_capacity() {
        let mut manager = ClientManager::new(1);

        assert!(manager.add_client(test_addr()).is_some());
        assert!(manager.add_client(test_addr2()).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut manager = ClientManager::new(1);

        let first = manager.add_client(test_addr()).unwrap();
        manager.remove_client(&first);
        let second = manager.add_client(test_addr()).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_remove_client() {
        let mut manager = ClientManager::new(2);
        let client_id = manager.add_client(test_addr()).unwrap();

        assert!(manager.remove_client(&client_id));
        assert!(!manager.remove_client(&client_id));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_find_client_by_addr() {
        let mut manager = ClientManager::new(2);
        let client_id1 = manager.add_client(test_addr()).unwrap();
        manager.add_client(test_addr2()).unwrap();

        assert_eq!(manager.find_client_by_addr(test_addr()), Some(client_id1));

        let unknown_addr: SocketAddr = "192.168.1.1:9999".parse().unwrap();
        assert_eq!(manager.find_client_by_addr(unknown_addr), None);
    }

    #[test]
    fn test_timed_out_clients_lists_only_silent_clients() {
        let mut manager = ClientManager::new(2);
        let silent = manager.add_client(test_addr()).unwrap();
        let active = manager.add_client(test_addr2()).unwrap();

        if let Some(client) = manager.clients.get_mut(&silent) {
            client.last_seen = Instant::now() - Duration::from_secs(10);
        }

        let timeout = Duration::from_secs(5);
        assert_eq!(manager.timed_out_clients(timeout), vec![silent]);
        assert!(manager.is_timed_out(&silent, timeout));
        assert!(!manager.is_timed_out(&active, timeout));
        assert!(!manager.is_timed_out(&99, timeout));

        // Detection alone keeps the client registered
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.client_addr(&silent), Some(test_addr()));
    }

    #[test]
    fn test_touch_refreshes_last_seen() {
        let mut manager = ClientManager::new(1);
        let client_id = manager.add_client(test_addr()).unwrap();
        if let Some(client) = manager.clients.get_mut(&client_id) {
            client.last_seen = Instant::now() - Duration::from_secs(10);
        }

        assert!(manager.touch(client_id));
        assert!(!manager.touch(99));
        assert!(manager.timed_out_clients(Duration::from_secs(5)).is_empty());
    }
}
