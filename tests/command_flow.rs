//! End-to-end exercises of the command server against a fake bus gateway
//! (§8 testable properties: command timeout, cross-connection reply
//! correlation).

use std::sync::Arc;
use std::time::Duration;

use emsbus::address::{PC, RC};
use emsbus::error::GatewayError;
use emsbus::{CommandServer, Decoder, Frame, Gateway};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A `Gateway` that accepts every send and goes nowhere — these tests only
/// care about the command server's client-facing behaviour, not what ends
/// up on the wire.
struct NullGateway;

impl Gateway for NullGateway {
    fn send(&self, _frame: &[u8]) -> Result<(), GatewayError> {
        Ok(())
    }
}

async fn read_line(stream: &mut TcpStream) -> String {
    let mut buf = [0u8; 256];
    let n = stream.read(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf[..n]).trim_end().to_string()
}

async fn spawn_server(reply_timeout: Duration) -> (std::net::SocketAddr, Arc<CommandServer<NullGateway>>) {
    let gateway = Arc::new(NullGateway);
    let server = Arc::new(CommandServer::new(gateway, reply_timeout));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = server.clone();
    tokio::spawn(async move {
        let _ = serving.serve(listener).await;
    });
    (addr, server)
}

#[tokio::test]
async fn query_without_a_bus_reply_times_out() {
    let (addr, _server) = spawn_server(Duration::from_millis(50)).await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"hk1 daytemp get\n").await.unwrap();
    assert_eq!(read_line(&mut client).await, "ERR:TIMEOUT");
}

#[tokio::test]
async fn reply_is_routed_to_the_connection_awaiting_it_and_not_decoded_elsewhere() {
    let (addr, server) = spawn_server(Duration::from_secs(2)).await;
    let router = server.router_handle();

    let mut client_a = TcpStream::connect(addr).await.unwrap();
    let mut client_b = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    client_a.write_all(b"hk1 daytemp get\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut decoder = Decoder::new();
    let reply = Frame::parse(vec![RC, PC, 0x3E, 1, 42]).unwrap();
    emsbus::router::dispatch(reply, &mut decoder, &router);

    assert_eq!(read_line(&mut client_a).await, "OK 21");

    // client_b never issued a command, so the broadcast frame landed in
    // its inbound channel and was simply ignored; it still answers its own
    // unrelated write command normally.
    client_b.write_all(b"ww temp set 10\n").await.unwrap();
    assert_eq!(read_line(&mut client_b).await, "OK");
}
