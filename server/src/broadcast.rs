//! Event fan-out to connected clients
//!
//! Every client owns one bounded FIFO queue drained by its socket writer.
//! `emit` pushes an event into the queues selected by a [`Scope`], in the
//! order the router calls it, so every receiver observes server emission
//! order. Queues whose writer is gone, or which are full, swallow the event.

use log::debug;
use shared::{ClientId, ServerEvent};

use crate::client_manager::ClientManager;

/// Fan-out target set for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every connected client, including the one that caused the event
    All,
    /// Every connected client except the given one
    AllExcept(ClientId),
    /// Only the given client
    Only(ClientId),
}

impl Scope {
    pub fn includes(&self, client_id: &ClientId) -> bool {
        match self {
            Scope::All => true,
            Scope::AllExcept(excluded) => excluded != client_id,
            Scope::Only(target) => target == client_id,
        }
    }
}

/// Queues `event` for every client in `scope`
///
/// Returns how many clients accepted the event. Clients that have already
/// disconnected are skipped without error.
pub fn emit(clients: &ClientManager, event: ServerEvent, scope: Scope) -> usize {
    if let Scope::Only(target) = scope {
        return match clients.client(&target) {
            Some(client) if client.send(event) => 1,
            _ => 0,
        };
    }

    let mut delivered = 0;
    for client in clients.iter().filter(|client| scope.includes(&client.id)) {
        if client.send(event.clone()) {
            delivered += 1;
        } else {
            debug!("Event not delivered to {}", client.id);
        }
    }
    delivered
}
