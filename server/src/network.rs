//! WebSocket accept loop and per-connection transport plumbing
//!
//! One task per accepted connection reads frames and drives that
//! connection's [`Connection`](crate::connection::Connection) state
//! machine; a second task per connection drains the bounded outbound
//! queue into the WebSocket sink. The shared [`SessionRegistry`] is the
//! only state the tasks touch in common.

use crate::connection::Connection;
use crate::registry::{ConnectionHandle, SessionRegistry};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// The relay's listening socket plus the registry it feeds
///
/// The registry is constructed by the process entry point and injected
/// here; the server never creates its own.
pub struct RelayServer {
    listener: TcpListener,
    registry: Arc<RwLock<SessionRegistry>>,
    queue_capacity: usize,
}

impl RelayServer {
    /// Binds the listening socket. Pass port 0 to let the OS pick one.
    pub async fn bind(
        addr: &str,
        registry: Arc<RwLock<SessionRegistry>>,
        queue_capacity: usize,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Relay server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            registry,
            queue_capacity,
        })
    }

    /// The address the server actually bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever, one spawned task per connection.
    pub async fn run(self) -> std::io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let registry = Arc::clone(&self.registry);
            let queue_capacity = self.queue_capacity;

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer, registry, queue_capacity).await {
                    debug!("Connection from {} ended with error: {}", peer, e);
                }
            });
        }
    }
}

/// Runs one client's session from handshake to teardown.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<RwLock<SessionRegistry>>,
    queue_capacity: usize,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let ws_stream = accept_async(stream).await?;
    debug!("WebSocket handshake completed with {}", peer);

    let (mut sink, mut ws_rx) = ws_stream.split();
    let (handle, mut outbound) = ConnectionHandle::new(queue_capacity);

    // Writer task: drains the outbound queue into the socket. Ends when
    // the registry drops the last sender at unregister time.
    tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut connection = Connection::new(registry);
    if let Err(e) = connection.open(handle).await {
        // DuplicateId here means id generation is broken; give up on the
        // connection but keep the process alive.
        error!("Failed to register player {}: {}", connection.id(), e);
        connection.close().await;
        return Ok(());
    }
    info!("Player {} connected from {}", connection.id(), peer);

    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => connection.handle_text(&text).await,
            Ok(Message::Binary(_)) => {
                warn!(
                    "Dropping binary frame from player {}; protocol is text-only",
                    connection.id()
                );
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
            Err(e) => {
                debug!("Transport error for player {}: {}", connection.id(), e);
                break;
            }
        }
    }

    connection.close().await;
    info!("Player {} disconnected", connection.id());
    Ok(())
}
