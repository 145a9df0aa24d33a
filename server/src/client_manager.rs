//! Connected player roster for the tower server
//!
//! This module tracks every live connection and its ephemeral metadata:
//! - Identity assignment on admission (fresh, never reused)
//! - Random color and default display name
//! - Mutable name and last reported position
//! - The bounded outbound event queue used to reach the connection
//!
//! Every operation that names an identity tolerates that identity being
//! gone. Disconnects race with in-flight events, so a missing client is a
//! no-op rather than an error.

use log::{info, warn};
use shared::{ClientId, PlayerInfo, Position, ServerEvent};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::utils::generate_color;

/// Events a single connection may have queued before new ones are dropped
pub const OUTBOX_CAPACITY: usize = 1024;

/// Outbound FIFO queue feeding one connection's socket writer
pub type Outbox = mpsc::Sender<ServerEvent>;
/// Receiving end of an [`Outbox`], drained by the socket writer
pub type Inbox = mpsc::Receiver<ServerEvent>;

/// Creates the queue pair for one connection
pub fn outbox() -> (Outbox, Inbox) {
    mpsc::channel(OUTBOX_CAPACITY)
}

/// Represents a connected client and its outbound queue
#[derive(Debug)]
pub struct Client {
    /// Unique client identifier assigned by the server
    pub id: ClientId,
    /// Display name, changeable by the client
    pub name: String,
    /// Color assigned on admission, `#rrggbb`
    pub color: String,
    /// Last position the client reported, if any
    pub position: Option<Position>,
    /// Admission order, used to enumerate clients stably
    joined_seq: u64,
    outbox: Outbox,
}

impl Client {
    /// Creates a new client with its default name derived from the identity
    pub fn new(id: ClientId, color: String, joined_seq: u64, outbox: Outbox) -> Self {
        Self {
            id,
            name: id.default_name(),
            color,
            position: None,
            joined_seq,
            outbox,
        }
    }

    /// Public view of this client as sent over the wire
    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            color: self.color.clone(),
            name: self.name.clone(),
            position: self.position,
        }
    }

    /// Queues an event for this client without waiting
    ///
    /// Returns false when the connection's writer has already gone away or
    /// its queue is full because the peer stopped reading. The event is
    /// dropped in both cases; delivery is best effort.
    pub fn send(&self, event: ServerEvent) -> bool {
        match self.outbox.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue full for {}, dropping event", self.id);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Manages all connected clients
///
/// The ClientManager is owned by the router and only ever mutated from the
/// server's single event loop, which is what keeps admission, removal and
/// metadata updates atomic with respect to each other.
#[derive(Debug, Default)]
pub struct ClientManager {
    /// Connected clients indexed by their identity
    clients: HashMap<ClientId, Client>,
    /// Admission counter for stable enumeration
    next_seq: u64,
}

impl ClientManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a new connection
    ///
    /// Assigns a fresh identity, a uniformly random color and the default
    /// name, then makes the client visible to every other query. Returns the
    /// public view of the new client.
    pub fn admit(&mut self, outbox: Outbox) -> PlayerInfo {
        let mut rng = rand::thread_rng();
        let color = generate_color(&mut rng);
        self.admit_with_color(color, outbox)
    }

    /// Admits a new connection with a caller-chosen color
    pub fn admit_with_color(&mut self, color: String, outbox: Outbox) -> PlayerInfo {
        let mut id = ClientId::new();
        while self.clients.contains_key(&id) {
            id = ClientId::new();
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        let client = Client::new(id, color, seq, outbox);
        let info = client.info();
        info!("Client {} connected as '{}'", id, info.name);
        self.clients.insert(id, client);

        info
    }

    /// Removes a client from the roster
    ///
    /// Returns the removed client's last public view, or None if it was
    /// already gone. Duplicate disconnect signals land here harmlessly.
    pub fn remove(&mut self, client_id: &ClientId) -> Option<PlayerInfo> {
        let client = self.clients.remove(client_id)?;
        info!("Client {} disconnected", client.id);
        Some(client.info())
    }

    pub fn get(&self, client_id: &ClientId) -> Option<PlayerInfo> {
        self.clients.get(client_id).map(Client::info)
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.clients.contains_key(client_id)
    }

    /// Gets every connected client in admission order
    pub fn all(&self) -> Vec<PlayerInfo> {
        let mut clients: Vec<&Client> = self.clients.values().collect();
        clients.sort_by_key(|client| client.joined_seq);
        clients.into_iter().map(Client::info).collect()
    }

    /// Changes a client's display name. Returns false if the client is gone.
    pub fn rename(&mut self, client_id: &ClientId, name: String) -> bool {
        match self.clients.get_mut(client_id) {
            Some(client) => {
                client.name = name;
                true
            }
            None => false,
        }
    }

    /// Records a client's reported position. Returns false if the client is gone.
    pub fn set_position(&mut self, client_id: &ClientId, position: Position) -> bool {
        match self.clients.get_mut(client_id) {
            Some(client) => {
                client.position = Some(position);
                true
            }
            None => false,
        }
    }

    /// Iterates over connected clients in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    /// Looks up a single client for direct delivery
    pub fn client(&self, client_id: &ClientId) -> Option<&Client> {
        self.clients.get(client_id)
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

#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn test_client_creation() {
        let (tx, _rx) = outbox();
        let id = ClientId::new();
        let client = Client::new(id, "#00ff00".to_string(), 0, tx);

        assert_eq!(client.id, id);
        assert_eq!(client.name, id.default_name());
        assert_eq!(client.color, "#00ff00");
        assert!(client.position.is_none());
    }

    #[test]
    fn test_client_send_after_receiver_dropped() {
        let (tx, rx) = outbox();
        let client = Client::new(ClientId::new(), "#000000".to_string(), 0, tx);

        assert!(client.send(ServerEvent::TowerReset));
        drop(rx);
        assert!(!client.send(ServerEvent::TowerReset));
    }

    #[test]
    fn test_client_send_to_full_queue_drops() {
        let (tx, mut rx) = outbox();
        let client = Client::new(ClientId::new(), "#000000".to_string(), 0, tx);

        for height in 0..OUTBOX_CAPACITY as i64 {
            assert!(client.send(ServerEvent::MaxHeightUpdated(height)));
        }
        assert!(!client.send(ServerEvent::TowerReset));

        // Draining makes room again and earlier events keep their order
        assert_eq!(rx.try_recv().ok(), Some(ServerEvent::MaxHeightUpdated(0)));
        assert!(client.send(ServerEvent::TowerReset));
    }

    #[test]
    fn test_client_manager_creation() {
        let manager = ClientManager::new();
        assert!(manager.is_empty());
        assert_eq!(manager.len(), 0);
        assert!(manager.all().is_empty());
    }

    #[test]
    fn test_admit_client() {
        let mut manager = ClientManager::new();
        let (tx, _rx) = outbox();

        let info = manager.admit(tx);

        assert_eq!(manager.len(), 1);
        assert!(manager.contains(&info.id));
        assert_eq!(info.name, info.id.default_name());
        assert_eq!(info.color.len(), 7);
        assert!(info.color.starts_with('#'));
        assert_eq!(manager.get(&info.id), Some(info));
    }

    #[test]
    fn test_admitted_identities_are_unique() {
        let mut manager = ClientManager::new();
        let mut receivers = Vec::new();
        let mut ids = std::collections::HashSet::new();

        for _ in 0..100 {
            let (tx, rx) = outbox();
            receivers.push(rx);
            assert!(ids.insert(manager.admit(tx).id));
        }

        assert_eq!(manager.len(), 100);
    }

    #[test]
    fn test_all_in_admission_order() {
        let mut manager = ClientManager::new();
        let (tx1, _rx1) = outbox();
        let (tx2, _rx2) = outbox();
        let (tx3, _rx3) = outbox();

        let a = manager.admit_with_color("#111111".to_string(), tx1).id;
        let b = manager.admit_with_color("#222222".to_string(), tx2).id;
        let c = manager.admit_with_color("#333333".to_string(), tx3).id;
        manager.remove(&b);

        let ids: Vec<ClientId> = manager.all().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn test_remove_client() {
        let mut manager = ClientManager::new();
        let (tx, _rx) = outbox();
        let id = manager.admit(tx).id;

        let removed = manager.remove(&id);
        assert_eq!(removed.map(|p| p.id), Some(id));
        assert!(manager.is_empty());
        assert!(manager.get(&id).is_none());
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let mut manager = ClientManager::new();
        let (tx, _rx) = outbox();
        let id = manager.admit(tx).id;

        assert!(manager.remove(&id).is_some());
        assert!(manager.remove(&id).is_none());
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_remove_nonexistent_client() {
        let mut manager = ClientManager::new();
        assert!(manager.remove(&ClientId::new()).is_none());
    }

    #[test]
    fn test_rename() {
        let mut manager = ClientManager::new();
        let (tx, _rx) = outbox();
        let id = manager.admit(tx).id;

        assert!(manager.rename(&id, "Zed".to_string()));
        assert_eq!(manager.get(&id).unwrap().name, "Zed");
    }

    #[test]
    fn test_rename_absent_client() {
        let mut manager = ClientManager::new();
        assert!(!manager.rename(&ClientId::new(), "Ghost".to_string()));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_set_position() {
        let mut manager = ClientManager::new();
        let (tx, _rx) = outbox();
        let id = manager.admit(tx).id;
        let position = Position::new(1.0, 2.5, -3.0);

        assert!(manager.set_position(&id, position));
        assert_eq!(manager.get(&id).unwrap().position, Some(position));
        assert!(!manager.set_position(&ClientId::new(), position));
    }

    #[test]
    fn test_color_is_immutable_across_updates() {
        let mut manager = ClientManager::new();
        let (tx, _rx) = outbox();
        let info = manager.admit_with_color("#abcdef".to_string(), tx);

        manager.rename(&info.id, "New".to_string());
        manager.set_position(&info.id, Position::new(0.0, 0.0, 0.0));

        assert_eq!(manager.get(&info.id).unwrap().color, "#abcdef");
    }
}
