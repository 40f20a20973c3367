//! Per-connection state machine bridging one transport connection to the
//! session registry
//!
//! Each accepted WebSocket gets one `Connection`. It walks a three-state
//! lifecycle — Connecting, Open, Closed — and translates transport events
//! into registry operations plus fan-out:
//!
//! - opening registers the player, sends them the current roster and
//!   announces them to everyone else;
//! - each well-formed `playerMove` frame updates the registry and is
//!   relayed to all other connections;
//! - closing unregisters the player and announces their departure, at
//!   most once no matter how many close signals the transport delivers.

use crate::registry::{ConnectionHandle, RegistryError, SessionRegistry};
use log::{debug, warn};
use shared::{ClientMessage, PlayerId, ServerMessage};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// One client's session, driven by that connection's reader task.
pub struct Connection {
    id: PlayerId,
    registry: Arc<RwLock<SessionRegistry>>,
    state: ConnectionState,
}

impl Connection {
    /// Creates a session in the Connecting state with a fresh id.
    pub fn new(registry: Arc<RwLock<SessionRegistry>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            registry,
            state: ConnectionState::Connecting,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// Connecting → Open: registers the player, sends them the roster
    /// snapshot and announces the join to everyone else
    ///
    /// The whole sequence runs under a single registry write guard so no
    /// other connection can observe the roster between registration and
    /// the announcement. A `DuplicateId` error leaves the session in
    /// Connecting; the caller aborts the connection.
    pub async fn open(&mut self, handle: ConnectionHandle) -> Result<(), RegistryError> {
        let mut registry = self.registry.write().await;
        let player = registry.register(self.id, handle)?;

        let roster = registry.snapshot(self.id);
        registry.send_to(self.id, &ServerMessage::PlayerList { players: roster });
        registry.broadcast(self.id, &ServerMessage::NewPlayer { player });

        self.state = ConnectionState::Open;
        Ok(())
    }

    /// Open → Open: handles one inbound text frame
    ///
    /// Well-formed `playerMove` frames update the registry and are relayed
    /// to every other connection. Malformed or unrecognized payloads are
    /// logged and dropped without terminating the connection, as is a move
    /// that raced the player's own removal.
    pub async fn handle_text(&mut self, text: &str) {
        if self.state != ConnectionState::Open {
            debug!("Ignoring frame for player {} in {:?} state", self.id, self.state);
            return;
        }

        match ClientMessage::decode(text) {
            Ok(ClientMessage::PlayerMove {
                position,
                direction,
            }) => {
                let mut registry = self.registry.write().await;
                match registry.update_position(self.id, position, direction) {
                    Ok(()) => {
                        registry.broadcast(
                            self.id,
                            &ServerMessage::PlayerMove {
                                player_id: self.id,
                                position,
                                direction,
                            },
                        );
                    }
                    Err(e) => {
                        debug!("Dropping stale move from player {}: {}", self.id, e);
                    }
                }
            }
            Err(e) => {
                warn!("Dropping malformed frame from player {}: {}", self.id, e);
            }
        }
    }

    /// Open → Closed: unregisters the player and announces the departure
    ///
    /// Idempotent: only the first call has any observable effect. A close
    /// before the session ever opened just marks it Closed.
    pub async fn close(&mut self) {
        let was_open = self.state == ConnectionState::Open;
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closed;
        if !was_open {
            return;
        }

        let mut registry = self.registry.write().await;
        match registry.unregister(self.id) {
            Ok(()) => {
                registry.broadcast(self.id, &ServerMessage::PlayerLeft { player_id: self.id });
            }
            Err(e) => {
                warn!("Close for player {} found no registration: {}", self.id, e);
            }
        }
    }
}
