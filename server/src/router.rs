//! Authoritative event handling
//!
//! The [`Router`] owns the tower and the player roster and is the only code
//! that mutates them. It is driven by the server's event loop one message at
//! a time, and every method runs to completion without awaiting, so each
//! event is applied atomically and in dequeue order.
//!
//! Per-connection lifecycle:
//!
//! ```text
//! connecting --connect()--> active --disconnect()--> disconnected
//! ```
//!
//! Events for an identity that is not active are ignored. A second
//! disconnect for the same identity does nothing.

use log::{debug, info};
use serde::Serialize;
use shared::{BlockRequest, ClientEvent, ClientId, Position, ServerEvent, TowerSnapshot};

use crate::broadcast::{emit, Scope};
use crate::client_manager::{ClientManager, Outbox};
use crate::tower::Tower;

/// Live counters reported by the health endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub players: usize,
    pub blocks: usize,
    pub max_height: i64,
}

#[derive(Debug, Default)]
pub struct Router {
    clients: ClientManager,
    tower: Tower,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a connection and returns its identity
    ///
    /// The new client receives the full state first, then everyone else is
    /// told about it. Because both sends happen before the next event is
    /// processed, the snapshot reflects exactly the state at admission.
    pub fn connect(&mut self, outbox: Outbox) -> ClientId {
        let player = self.clients.admit(outbox);
        let id = player.id;

        let TowerSnapshot { blocks, max_height } = self.tower.snapshot();
        let sync = ServerEvent::GameState {
            self_id: id,
            tower: blocks,
            players: self.clients.all(),
            max_height,
        };
        emit(&self.clients, sync, Scope::Only(id));
        emit(
            &self.clients,
            ServerEvent::PlayerJoined(player),
            Scope::AllExcept(id),
        );

        id
    }

    /// Applies one inbound event from an active connection
    pub fn handle_event(&mut self, client_id: ClientId, event: ClientEvent) {
        if !self.clients.contains(&client_id) {
            debug!("Ignoring event from inactive client {}", client_id);
            return;
        }

        match event {
            ClientEvent::PlaceBlock(request) => self.place_block(client_id, request),
            ClientEvent::PlayerMove(position) => self.move_player(client_id, position),
            ClientEvent::ChangeName(name) => self.rename_player(client_id, name),
        }
    }

    fn place_block(&mut self, client_id: ClientId, request: BlockRequest) {
        if !request.is_valid() {
            debug!("Dropping invalid block from {}", client_id);
            return;
        }

        let block = self.tower.place(request, client_id);
        // The placer gets its own block back; clients treat it as authoritative.
        emit(&self.clients, ServerEvent::BlockPlaced(block), Scope::All);
        emit(
            &self.clients,
            ServerEvent::MaxHeightUpdated(self.tower.max_height()),
            Scope::All,
        );
    }

    fn move_player(&mut self, client_id: ClientId, position: Position) {
        if !position.is_finite() {
            debug!("Dropping invalid position from {}", client_id);
            return;
        }

        if self.clients.set_position(&client_id, position) {
            emit(
                &self.clients,
                ServerEvent::PlayerMoved {
                    id: client_id,
                    position,
                },
                Scope::AllExcept(client_id),
            );
        }
    }

    fn rename_player(&mut self, client_id: ClientId, name: String) {
        if self.clients.rename(&client_id, name.clone()) {
            info!("Client {} is now '{}'", client_id, name);
            emit(
                &self.clients,
                ServerEvent::PlayerNameChanged {
                    id: client_id,
                    name,
                },
                Scope::All,
            );
        }
    }

    /// Removes a connection. Returns false if it was already gone.
    pub fn disconnect(&mut self, client_id: ClientId) -> bool {
        if self.clients.remove(&client_id).is_none() {
            return false;
        }

        emit(&self.clients, ServerEvent::PlayerLeft(client_id), Scope::All);
        true
    }

    /// Clears the tower and tells everyone
    pub fn reset(&mut self) {
        self.tower.reset();
        emit(&self.clients, ServerEvent::TowerReset, Scope::All);
    }

    pub fn status(&self) -> ServerStatus {
        ServerStatus {
            players: self.clients.len(),
            blocks: self.tower.len(),
            max_height: self.tower.max_height(),
        }
    }

    pub fn snapshot(&self) -> TowerSnapshot {
        self.tower.snapshot()
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }
}
