//! # Tower Builder Server Library
//!
//! This library provides the authoritative server for the shared tower game.
//! Players connect over WebSockets, place colored blocks into one global
//! tower, move around and rename themselves. The server owns the only real
//! copy of the tower and the roster and rebroadcasts every change.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The tower (blocks in placement order plus the maximum height) and the
//! player roster live only here. Client-side copies are caches that are
//! overwritten wholesale by the full-state sync sent on admission.
//!
//! ### Client Management
//! Handles the complete lifecycle of client connections:
//! - Admission with a fresh identity, random color and default name
//! - Name and position updates
//! - Disconnection and cleanup, tolerant of duplicate signals
//!
//! ### State Broadcasting
//! Every mutation is fanned out to the affected clients immediately, either
//! to everyone, to everyone but the sender, or to the sender alone.
//!
//! ## Architecture Design
//!
//! ### Single Event Loop
//! All mutations go through one task that owns the [`router::Router`] and
//! applies messages strictly in the order it dequeues them. Connection tasks
//! and HTTP handlers only send messages. No locks are needed, and placements
//! and resets are atomic with respect to each other.
//!
//! ### Per-Connection Queues
//! Each connection has an unbounded FIFO queue of outbound events drained by
//! its own writer task. Pushing into the queues from the event loop fixes the
//! delivery order for every receiver.
//!
//! ### Best-Effort Delivery
//! Malformed frames are dropped, events for departed clients are no-ops, and
//! sends to closed connections are discarded. Nothing is ever rejected back
//! to a client with an error.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! The roster of connected clients and their outbound queues.
//!
//! ### Tower Module (`tower`)
//! The ordered block collection and maximum height.
//!
//! ### Broadcast Module (`broadcast`)
//! Fan-out scopes and the single dispatch function.
//!
//! ### Router Module (`router`)
//! Validates inbound events, mutates state, decides fan-out.
//!
//! ### Network Module (`network`)
//! axum WebSocket endpoint, admin HTTP endpoints and the event loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("127.0.0.1:3000").await?;
//!
//!     // Serves /ws, /health and POST /reset until shut down
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client_manager;
pub mod config;
pub mod error;
pub mod network;
pub mod router;
pub mod tower;
pub mod utils;
