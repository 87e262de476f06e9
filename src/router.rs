//! Response router (component G, §4.G).
//!
//! The gateway's inbound callback is single-threaded (§5), so routing is
//! just a synchronous branch: a PC-directed frame goes to every live
//! connection, which each decide for themselves whether it's the reply
//! they're waiting on (§4.F); every other frame goes to the decoder's
//! value-handler instead. The two paths are mutually exclusive — ordinary
//! data frames never reach a connection, and PC-directed frames are never
//! decoded into sink values.

use std::sync::{Arc, Mutex};

use slab::Slab;
use tokio::sync::mpsc;

use crate::address;
use crate::decoder::Decoder;
use crate::frame::Frame;

/// The live connection set (§9 "Design Notes — Shared ownership of
/// connections"): an arena of integer-keyed handles rather than a
/// `Rc`/`Arc`-cyclic graph. A closed connection's slot is removed by its
/// own task; a stale id simply isn't in the slab any more, so routing to it
/// is a silent no-op.
pub type LiveConnections = Arc<Mutex<Slab<mpsc::UnboundedSender<Frame>>>>;

/// Handle used by the gateway-pump loop to route inbound frames, and by the
/// command server to register/deregister connections.
#[derive(Clone)]
pub struct RouterHandle {
    connections: LiveConnections,
}

impl RouterHandle {
    pub fn new(connections: LiveConnections) -> RouterHandle {
        RouterHandle { connections }
    }

    /// Broadcast a PC-directed frame to every live connection.
    fn broadcast(&self, frame: &Frame) {
        let connections = self.connections.lock().unwrap();
        for (_, tx) in connections.iter() {
            // A full or closed receiver just means that connection is
            // already gone or isn't interested; never fatal here.
            let _ = tx.send(frame.clone());
        }
    }
}

/// Decide where one inbound frame goes: the router (PC-directed replies) or
/// the decoder (everything else).
///
/// A PC-directed frame is routed to connections whether or not the
/// pending-reply high bit is set on `dest` (§4.G: `dest == addressPC` or
/// with that bit set toward PC are both valid router input) — a device's
/// reply to us is still a reply even if it's flagged as awaiting
/// acknowledgement. `Frame::is_polling`/the decoder's own discard of it
/// only matters for frames directed at some *other* device, which aren't
/// ours to answer and carry no value for a sink either.
pub fn dispatch(frame: Frame, decoder: &mut Decoder, router: &RouterHandle) {
    if address::bare(frame.dest) == address::PC {
        router.broadcast(&frame);
    } else {
        decoder.handle(&frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn pc_frame(source: u8, type_id: u8) -> Frame {
        Frame::parse(vec![source, address::PC, type_id, 0x00]).unwrap()
    }

    #[test]
    fn pc_directed_frame_is_not_decoded() {
        let connections: LiveConnections = Arc::new(Mutex::new(Slab::new()));
        let router = RouterHandle::new(connections);
        let mut decoder = Decoder::new();
        let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
        let sink = seen.clone();
        decoder.set_handler(move |v| sink.lock().unwrap().push(v));

        dispatch(pc_frame(address::UBA, 0x18), &mut decoder, &router);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn pc_directed_frame_reaches_every_live_connection() {
        let connections: LiveConnections = Arc::new(Mutex::new(Slab::new()));
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        connections.lock().unwrap().insert(tx1);
        connections.lock().unwrap().insert(tx2);
        let router = RouterHandle::new(connections);
        let mut decoder = Decoder::new();

        dispatch(pc_frame(address::UBA, 0x3E), &mut decoder, &router);

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn pc_directed_frame_with_pending_reply_bit_still_routes_to_connections() {
        let connections: LiveConnections = Arc::new(Mutex::new(Slab::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        connections.lock().unwrap().insert(tx);
        let router = RouterHandle::new(connections);
        let mut decoder = Decoder::new();

        let frame = Frame::parse(vec![address::UBA, address::PC | address::POLL_OR_RESPONSE_BIT, 0x3E, 0x00]).unwrap();
        dispatch(frame, &mut decoder, &router);

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn broadcast_frame_is_not_decoded() {
        let connections: LiveConnections = Arc::new(Mutex::new(Slab::new()));
        let router = RouterHandle::new(connections);
        let mut decoder = Decoder::new();
        let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
        let sink = seen.clone();
        decoder.set_handler(move |v| sink.lock().unwrap().push(v));

        let frame = Frame::parse(vec![address::UBA, address::RC, 0x18, 0x00]).unwrap();
        dispatch(frame, &mut decoder, &router);
        assert!(!seen.lock().unwrap().is_empty());
    }
}
