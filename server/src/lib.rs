//! # Position Relay Server Library
//!
//! This library implements the server side of a browser-based multiplayer
//! game: a real-time relay that tracks every connected player's last
//! reported position and facing, and propagates each change to all other
//! connected players. The server holds no persistent state and performs
//! no simulation of its own; clients render, the server relays.
//!
//! ## Core Responsibilities
//!
//! ### Session Registry
//! The single authoritative table of connected players. It pairs each
//! player record with the connection handle used to reach that client and
//! keeps the two mappings consistent at every observation point.
//!
//! ### Connection Broadcasting
//! Each connection's lifecycle is translated into registry operations and
//! fan-out: joining sends the newcomer a roster snapshot and announces
//! them to everyone else, movement reports are relayed to all other
//! connections, and disconnects are announced exactly once.
//!
//! ## Architecture Design
//!
//! One tokio task per connection reads frames from its WebSocket and
//! drives a per-connection state machine; a companion task per connection
//! drains a bounded outbound queue into the socket. The registry sits
//! behind a single `RwLock`, and every compound operation (register +
//! roster + announce, update + relay, unregister + farewell) holds one
//! write guard end to end, so no connection ever observes a half-applied
//! mutation. Delivery to each client is non-blocking: a full or dead
//! outbound queue closes that one connection's handle and never stalls
//! the rest of the broadcast.
//!
//! ## Module Organization
//!
//! - [`registry`] — the session registry, connection handles and the
//!   broadcast primitive
//! - [`connection`] — the per-connection Connecting/Open/Closed state
//!   machine and protocol handling
//! - [`network`] — the WebSocket accept loop binding the two together
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::RelayServer;
//! use server::registry::{SessionRegistry, DEFAULT_QUEUE_CAPACITY};
//! use std::sync::Arc;
//! use tokio::sync::RwLock;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Exactly one registry per process, owned here and handed to the
//!     // accept loop.
//!     let registry = Arc::new(RwLock::new(SessionRegistry::new()));
//!
//!     let server =
//!         RelayServer::bind("127.0.0.1:8080", registry, DEFAULT_QUEUE_CAPACITY).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod network;
pub mod registry;
