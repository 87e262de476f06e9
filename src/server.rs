//! Command server (component E, §4.E): accepts TCP clients and spawns one
//! connection task each, tracking the live set in a `slab`-backed arena
//! (§9 "Design Notes — Shared ownership of connections") rather than a
//! `Vec` of `Arc<Connection>` handles that would need manual pruning.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use slab::Slab;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::connection;
use crate::frame::Frame;
use crate::gateway::Gateway;
use crate::router::{LiveConnections, RouterHandle};

/// Accepts client connections and keeps the router's live set up to date.
pub struct CommandServer<G: ?Sized> {
    gateway: Arc<G>,
    connections: LiveConnections,
    reply_timeout: Duration,
}

impl<G: Gateway + ?Sized + 'static> CommandServer<G> {
    pub fn new(gateway: Arc<G>, reply_timeout: Duration) -> CommandServer<G> {
        CommandServer { gateway, connections: Arc::new(Mutex::new(Slab::new())), reply_timeout }
    }

    /// A handle the gateway-pump loop uses to route inbound PC-directed
    /// frames to every connection this server is holding open.
    pub fn router_handle(&self) -> RouterHandle {
        RouterHandle::new(self.connections.clone())
    }

    /// Accept connections on an already-bound listener until it errors.
    ///
    /// Takes an owned `TcpListener` rather than a `SocketAddr` so that
    /// binding and serving are separate steps — tests can bind an
    /// ephemeral port and learn its address before anything starts
    /// accepting on it.
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "command server listening");
        loop {
            let (socket, peer) = listener.accept().await?;
            self.spawn_connection(socket, peer);
        }
    }

    fn spawn_connection(&self, socket: TcpStream, peer: SocketAddr) {
        let (tx, rx) = mpsc::unbounded_channel::<Frame>();
        let id = self.connections.lock().unwrap().insert(tx);
        let connections = self.connections.clone();
        let gateway = self.gateway.clone();
        let reply_timeout = self.reply_timeout;
        tracing::debug!(%peer, id, "command connection accepted");
        tokio::spawn(async move {
            connection::run(gateway, socket, rx, reply_timeout).await;
            connections.lock().unwrap().remove(id);
            tracing::debug!(%peer, id, "command connection closed");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::test_support::RecordingGateway;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn accepts_a_connection_and_answers_a_write_command() {
        let gateway = Arc::new(RecordingGateway::new());
        let server = Arc::new(CommandServer::new(gateway.clone(), Duration::from_millis(200)));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept_server = server.clone();
        tokio::spawn(async move {
            let _ = accept_server.serve(listener).await;
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"ww temp set 55\n").await.unwrap();
        let mut buf = [0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"OK\n");
    }
}
