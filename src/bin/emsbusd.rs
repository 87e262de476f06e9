//! Binary entry point: wires the bus gateway, decoder and command server
//! together and runs them on a single-threaded reactor (§5 concurrency
//! model — there is no worker pool to hand frames off to).

use std::sync::Arc;

use clap::Parser;
use emsbus::{Args, CommandServer, Decoder, TcpGateway, Value};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
    let gateway = TcpGateway::connect(args.gateway.bridge_addr, inbound_tx)
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    let gateway = Arc::new(gateway);

    let mut decoder = Decoder::new();
    decoder.set_handler(log_value);

    let server = Arc::new(CommandServer::new(gateway, args.command_server.reply_timeout()));
    let router = server.router_handle();

    let listener = tokio::net::TcpListener::bind(args.command_server.listen_addr).await?;
    let serve_server = server.clone();
    tokio::spawn(async move {
        if let Err(err) = serve_server.serve(listener).await {
            tracing::error!(%err, "command server stopped");
        }
    });

    while let Some(frame) = inbound_rx.recv().await {
        emsbus::router::dispatch(frame, &mut decoder, &router);
    }

    Ok(())
}

/// Stand-in value sink: every decoded reading is logged at debug level.
/// A real deployment would forward these to a time-series store instead.
fn log_value(value: Value) {
    tracing::debug!(?value, "decoded value");
}
