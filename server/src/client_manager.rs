//! Connection registry for the room server
//!
//! This module tracks every live WebSocket connection:
//! - Connection lifecycle (register, unregister, capacity limit)
//! - The outbound event channel of each connection
//! - Which room, if any, the connection currently belongs to
//!
//! The registry is owned by the server's event loop, so it needs no locking.

use log::{debug, info};
use shared::ServerEvent;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Server-assigned identifier of one connection
pub type ConnectionId = u32;

/// Represents a connected client
#[derive(Debug)]
pub struct Client {
    /// Unique client identifier assigned by the server
    pub id: ConnectionId,
    /// Peer address, for logging
    pub addr: SocketAddr,
    /// Code of the room this client is in
    pub room: Option<String>,
    /// Outbound queue drained by the connection's writer task
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl Client {
    pub fn new(id: ConnectionId, addr: SocketAddr, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            id,
            addr,
            room: None,
            sender,
        }
    }

    /// Queues an event for delivery. Returns false if the connection's
    /// writer has already gone away.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Manages all connected clients
///
/// Enforces the connection limit and routes outbound events by connection id.
pub struct ClientManager {
    /// Connected clients indexed by their unique ID
    clients: HashMap<ConnectionId, Client>,
    /// Next available client ID for new connections
    next_client_id: ConnectionId,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    /// Creates a new client manager with the specified capacity limit
    ///
    /// Client IDs start from 1 and increment for each new connection.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers a new connection
    ///
    /// Returns Some(client_id) if successful, None if the server is at capacity.
    pub fn add_client(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Option<ConnectionId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients
            .insert(client_id, Client::new(client_id, addr, sender));

        Some(client_id)
    }

    /// Removes a client, returning it so the caller can clean up its room
    pub fn remove_client(&mut self, client_id: &ConnectionId) -> Option<Client> {
        let client = self.clients.remove(client_id)?;
        info!("Client {} ({}) disconnected", client.id, client.addr);
        Some(client)
    }

    pub fn room_of(&self, client_id: ConnectionId) -> Option<&str> {
        self.clients.get(&client_id)?.room.as_deref()
    }

    pub fn set_room(&mut self, client_id: ConnectionId, room: Option<String>) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.room = room;
        }
    }

    /// Queues `event` for one client. Unknown ids are ignored.
    pub fn send_to(&self, client_id: ConnectionId, event: ServerEvent) -> bool {
        match self.clients.get(&client_id) {
            Some(client) => {
                let sent = client.send(event);
                if !sent {
                    debug!("Client {} outbound channel closed", client_id);
                }
                sent
            }
            None => false,
        }
    }

    /// Queues `event` for each of `targets`
    pub fn send_all(&self, targets: &[ConnectionId], event: &ServerEvent) {
        for client_id in targets {
            self.send_to(*client_id, event.clone());
        }
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
