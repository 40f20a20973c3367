//! Session registry: the authoritative table of connected players
//!
//! This module is the single source of truth for "who is connected and
//! where they are". It owns two mappings keyed by player id — the player
//! records and the connection handles used to push frames to each client —
//! and guarantees the two always have identical key sets: registration and
//! removal mutate both under the same `&mut self`.
//!
//! The registry performs no I/O of its own beyond handing frames to each
//! connection's bounded outbound queue. Delivery is best-effort and
//! non-blocking, so one slow or dead client can never stall delivery to
//! the others.

use log::{info, warn};
use shared::{Direction, Player, PlayerId, Position, ServerMessage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Default capacity of each connection's outbound frame queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Registry mutation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The id is already registered. Ids are random v4 UUIDs, so this
    /// signals a programming error rather than a recoverable condition.
    #[error("player {0} is already registered")]
    DuplicateId(PlayerId),

    /// The id is not registered. Expected for messages that arrive after
    /// a disconnect; callers drop the message and move on.
    #[error("player {0} is not registered")]
    UnknownPlayer(PlayerId),
}

/// A failed best-effort send to one connection. Treated as an implicit
/// close of that connection only; never propagated to other targets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendFailure {
    #[error("outbound queue is full")]
    Backpressured,

    #[error("writer task is gone")]
    Disconnected,
}

/// Handle for pushing encoded frames to exactly one client
///
/// Wraps the sending side of a bounded channel drained by that
/// connection's writer task, plus a liveness flag. Once a send fails the
/// handle flips to closed and every later broadcast skips it; the
/// connection's own reader will notice the dead transport and tear the
/// session down through the normal close path.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    tx: mpsc::Sender<String>,
    open: Arc<AtomicBool>,
}

impl ConnectionHandle {
    /// Creates a handle and the receiving end of its outbound queue.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                open: Arc::new(AtomicBool::new(true)),
            },
            rx,
        )
    }

    /// Whether frames can still be queued for this connection.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    /// Marks the connection closed. Later sends are skipped.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Queues one frame without blocking. A full queue means the client
    /// is too far behind to be worth keeping; both failure modes close
    /// the handle.
    pub fn send(&self, frame: String) -> Result<(), SendFailure> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.close();
                Err(SendFailure::Backpressured)
            }
            Err(TrySendError::Closed(_)) => {
                self.close();
                Err(SendFailure::Disconnected)
            }
        }
    }
}

/// Authoritative mapping of connected players and their connections
///
/// Exactly one registry exists per running process. It is constructed by
/// the entry point and handed to the accept loop; there is no global
/// instance. All operations run under the caller's lock (the server wraps
/// the registry in one `RwLock`), so every observation sees both mappings
/// in a consistent state.
pub struct SessionRegistry {
    /// Player records indexed by id.
    players: HashMap<PlayerId, Player>,
    /// Connection handles indexed by id. Key set always equals `players`'.
    connections: HashMap<PlayerId, ConnectionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            connections: HashMap::new(),
        }
    }

    /// Registers a new player and their connection atomically
    ///
    /// Constructs the player record at the default spawn point and inserts
    /// both mapping entries. Returns a copy of the new record for the
    /// caller to announce. Fails with `DuplicateId` if the id is already
    /// present, which must not happen with freshly generated v4 ids.
    pub fn register(
        &mut self,
        id: PlayerId,
        handle: ConnectionHandle,
    ) -> Result<Player, RegistryError> {
        if self.players.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }

        let player = Player::new(id);
        self.players.insert(id, player.clone());
        self.connections.insert(id, handle);

        info!(
            "Player {} registered at ({}, {})",
            id, player.position.x, player.position.y
        );
        Ok(player)
    }

    /// Removes both mapping entries for a player
    ///
    /// The removed handle is marked closed so any clone still held by an
    /// in-flight broadcast is skipped. Fails with `UnknownPlayer` if the
    /// id is absent; the close path guards against calling this twice.
    pub fn unregister(&mut self, id: PlayerId) -> Result<(), RegistryError> {
        match (self.players.remove(&id), self.connections.remove(&id)) {
            (Some(_), Some(handle)) => {
                handle.close();
                info!("Player {} unregistered", id);
                Ok(())
            }
            _ => Err(RegistryError::UnknownPlayer(id)),
        }
    }

    /// Overwrites a player's last-known position and facing
    ///
    /// Fails with `UnknownPlayer` when the message raced a disconnect;
    /// callers treat that as non-fatal and drop the update.
    pub fn update_position(
        &mut self,
        id: PlayerId,
        position: Position,
        direction: Direction,
    ) -> Result<(), RegistryError> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(RegistryError::UnknownPlayer(id))?;

        player.position = position;
        player.direction = direction;
        Ok(())
    }

    /// Returns every player record except the given id, in no particular
    /// order. Used to populate a newly joined client's initial roster.
    pub fn snapshot(&self, excluding: PlayerId) -> Vec<Player> {
        self.players
            .values()
            .filter(|player| player.id != excluding)
            .cloned()
            .collect()
    }

    /// Looks up one player record.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Delivers a message to a single connection, if it is still open.
    pub fn send_to(&self, id: PlayerId, message: &ServerMessage) {
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode message for player {}: {}", id, e);
                return;
            }
        };

        if let Some(handle) = self.connections.get(&id) {
            if !handle.is_open() {
                return;
            }
            if let Err(e) = handle.send(frame) {
                warn!("Dropping frame for player {}: {}", id, e);
            }
        }
    }

    /// Delivers a message to every open connection except the sender's
    ///
    /// The message is encoded once; each target gets at most one copy and
    /// the sender never gets one. Closed handles are skipped silently and
    /// a send failure only affects that one target.
    pub fn broadcast(&self, sender_id: PlayerId, message: &ServerMessage) {
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode broadcast from {}: {}", sender_id, e);
                return;
            }
        };

        for (id, handle) in &self.connections {
            if *id == sender_id || !handle.is_open() {
                continue;
            }
            if let Err(e) = handle.send(frame.clone()) {
                warn!("Dropping broadcast frame for player {}: {}", id, e);
            }
        }
    }

    /// Returns the number of currently connected players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Returns true if no players are currently connected.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
