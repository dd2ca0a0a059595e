//! Client registry
//!
//! Tracks connected clients so the server can enforce its client limit.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

/// Registry for tracking active clients
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<SocketAddr, Instant>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `addr` unless `max_clients` are already connected.
    pub fn try_insert(&mut self, addr: SocketAddr, max_clients: usize) -> bool {
        if self.clients.len() >= max_clients && !self.clients.contains_key(&addr) {
            return false;
        }
        self.clients.insert(addr, Instant::now());
        true
    }

    /// Removes `addr`, returning when it connected.
    pub fn remove(&mut self, addr: &SocketAddr) -> Option<Instant> {
        self.clients.remove(addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
