//! Bus gateway (component D, §4.D): the abstract physical-link contract the
//! core consumes, plus one concrete implementation for the common
//! deployment of this controller family — a serial-to-TCP bridge (e.g.
//! ser2net) sitting between this process and the actual bus.
//!
//! The abstraction itself is what spec.md covers; `TcpGateway` is ambient
//! plumbing needed to make the crate runnable (§10 of the design doc), not
//! part of the protocol specification.

use bytes::{Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::GatewayError;
use crate::frame::Frame;

/// What the core needs from a physical bus link: a thread-safe way to send
/// a frame, and — out of band, via whatever channel the implementation was
/// constructed with — delivery of inbound frames in receive order.
pub trait Gateway: Send + Sync {
    /// Enqueue one frame for transmission on the bus.
    fn send(&self, frame: &[u8]) -> Result<(), GatewayError>;
}

/// A `Gateway` backed by a TCP connection to a serial bridge that frames
/// each bus telegram as one length-delimited TCP segment.
pub struct TcpGateway {
    outbound: mpsc::UnboundedSender<Bytes>,
}

impl TcpGateway {
    /// Connect to `addr` and start forwarding. Every frame the bridge
    /// delivers is decoded and pushed onto `inbound`, in order; the caller
    /// is expected to drain `inbound` on the same reactor that drives the
    /// rest of the core (§5).
    pub async fn connect(
        addr: SocketAddr,
        inbound: mpsc::UnboundedSender<Frame>,
    ) -> Result<TcpGateway, GatewayError> {
        let stream = TcpStream::connect(addr).await?;
        let framed = Framed::new(stream, LengthDelimitedCodec::new());
        let (mut sink, mut source) = framed.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                if sink.send(bytes).await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(item) = source.next().await {
                match item {
                    Ok(bytes) => {
                        if let Some(frame) = Frame::parse(bytes.freeze()) {
                            if inbound.send(frame).is_err() {
                                break;
                            }
                        } else {
                            tracing::debug!("discarding undersized frame from bridge");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%err, "bridge connection read error");
                        break;
                    }
                }
            }
        });

        Ok(TcpGateway { outbound: tx })
    }
}

impl Gateway for TcpGateway {
    fn send(&self, frame: &[u8]) -> Result<(), GatewayError> {
        let mut buf = BytesMut::with_capacity(frame.len());
        buf.extend_from_slice(frame);
        self.outbound.send(buf.freeze()).map_err(|_| GatewayError::Closed)
    }
}

#[cfg(test)]
pub mod test_support {
    //! A trivial in-process `Gateway` for exercising the command layer
    //! without a real bus.
    use super::*;
    use std::sync::Mutex;

    pub struct RecordingGateway {
        pub sent: Mutex<Vec<Vec<u8>>>,
    }

    impl RecordingGateway {
        pub fn new() -> RecordingGateway {
            RecordingGateway { sent: Mutex::new(Vec::new()) }
        }
    }

    impl Gateway for RecordingGateway {
        fn send(&self, frame: &[u8]) -> Result<(), GatewayError> {
            self.sent.lock().unwrap().push(frame.to_vec());
            Ok(())
        }
    }

    pub struct FailingGateway;

    impl Gateway for FailingGateway {
        fn send(&self, _frame: &[u8]) -> Result<(), GatewayError> {
            Err(GatewayError::Closed)
        }
    }
}
