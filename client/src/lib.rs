//! # Tower Builder Client Library
//!
//! A headless client for the shared tower server. It speaks the JSON event
//! protocol over a WebSocket and keeps a local mirror of the tower and the
//! player roster.
//!
//! ## Architecture Overview
//!
//! ### Mirror
//! The client never predicts. Every `blockPlaced` is appended when the server
//! echoes it, including our own, and a `gameState` sync replaces the mirror
//! wholesale.
//!
//! ### Builder
//! [`network::Client::run`] stacks blocks one level above the current
//! maximum height at a fixed interval, which is enough to exercise the
//! server from the command line or from tests.
//!
//! ## Module Organization
//!
//! - [`game`]: Local mirror of server state
//! - [`network`]: WebSocket connection and build loop

pub mod game;
pub mod network;
