//! Command connection (component F, §4.F): the per-client state machine
//! that turns one line of text into a bus request, waits for the matching
//! reply, and writes back a response line.
//!
//! A connection's task reads one line, dispatches it, and does not read the
//! next line until that dispatch has produced a reply or timed out. That
//! read ordering is what enforces "at most one command in flight per
//! connection" (§4.F `Idle` / `AwaitingReply`) — there's no separate queue
//! or busy flag to get out of sync with the socket.

use std::sync::Arc;
use std::time::Duration;

use byteorder::{BigEndian, ByteOrder};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::address::{RC, UBA};
use crate::command::{self, Command, GetOrSet, HkCircuit, ThermDesinfectAction, ZirkPumpAction};
use crate::decoder;
use crate::descriptors;
use crate::encoder;
use crate::error::CommandError;
use crate::frame::Frame;
use crate::gateway::Gateway;
use crate::value::{ErrorRecord, Value};

/// What one command boils down to on the wire: either a read request that
/// needs a matching reply, or a fire-and-forget write.
enum Dispatch {
    Query { dest: u8, type_id: u8, offset: u8 },
    Write { dest: u8, type_id: u8, offset: u8, payload: Vec<u8> },
}

fn hk_type(circuit: HkCircuit) -> u8 {
    match circuit {
        HkCircuit::Hk1 => 0x3E,
        HkCircuit::Hk2 => 0x48,
    }
}

fn scale(value: f32, divider: u32) -> u8 {
    (value * divider as f32).round() as u8
}

fn build_dispatch(cmd: &Command) -> Dispatch {
    match *cmd {
        Command::GetErrors { offset } => Dispatch::Query { dest: UBA, type_id: 0x10, offset: offset as u8 },
        Command::HkDayTemp { circuit, ref action } => match action {
            GetOrSet::Get => Dispatch::Query { dest: RC, type_id: hk_type(circuit), offset: 1 },
            GetOrSet::Set(v) => {
                Dispatch::Write { dest: RC, type_id: hk_type(circuit), offset: 1, payload: vec![scale(*v, 2)] }
            }
        },
        Command::HkNightTemp { circuit, ref action } => match action {
            GetOrSet::Get => Dispatch::Query { dest: RC, type_id: hk_type(circuit), offset: 4 },
            GetOrSet::Set(v) => {
                Dispatch::Write { dest: RC, type_id: hk_type(circuit), offset: 4, payload: vec![scale(*v, 2)] }
            }
        },
        Command::HkKennlinie { circuit, ref action } => match action {
            GetOrSet::Get => Dispatch::Query { dest: RC, type_id: hk_type(circuit), offset: 7 },
            GetOrSet::Set((low, medium, high)) => {
                Dispatch::Write { dest: RC, type_id: hk_type(circuit), offset: 7, payload: vec![*low, *medium, *high] }
            }
        },
        Command::WwTemp { ref action } => match action {
            GetOrSet::Get => Dispatch::Query { dest: UBA, type_id: 0x33, offset: 1 },
            GetOrSet::Set(v) => Dispatch::Write { dest: UBA, type_id: 0x33, offset: 1, payload: vec![scale(*v, 1)] },
        },
        Command::ThermDesinfect(action) => match action {
            ThermDesinfectAction::Get => Dispatch::Query { dest: UBA, type_id: 0x33, offset: 0 },
            ThermDesinfectAction::Enable => {
                Dispatch::Write { dest: UBA, type_id: 0x33, offset: 0, payload: vec![0x02] }
            }
            ThermDesinfectAction::Disable => {
                Dispatch::Write { dest: UBA, type_id: 0x33, offset: 0, payload: vec![0x00] }
            }
        },
        Command::ZirkPump(ref action) => match action {
            ZirkPumpAction::Get => Dispatch::Query { dest: UBA, type_id: 0x33, offset: 2 },
            ZirkPumpAction::Set(byte) => Dispatch::Write { dest: UBA, type_id: 0x33, offset: 2, payload: vec![*byte] },
        },
    }
}

/// Drop any frames already sitting in `inbound` before dispatching a new
/// query (§4.F `response_counter`: a reply to a command this connection
/// already gave up on — because it timed out — must not be mistaken for
/// the next command's reply just because the bus address happens to
/// match). Since at most one command is ever in flight per connection,
/// anything buffered here predates the request we're about to send.
fn drain_stale(inbound: &mut mpsc::UnboundedReceiver<Frame>) {
    while inbound.try_recv().is_ok() {}
}

/// Wait for the next reply addressed back to us and matching `(source,
/// type, offset)`, giving up once `deadline` passes (§4.F reply-timeout).
///
/// The offset check matters as much as source/type: two connections can
/// have the same (source, type) request outstanding at once (e.g. HK1
/// day-temp at offset 1 and HK1 night-temp at offset 4 are both `(RC,
/// 0x3E, _)`), and the router broadcasts every PC-directed reply to every
/// connection (§4.G). Without it, one connection could accept the other's
/// reply and either mis-decode it or silently fall back to a bare "OK".
/// Frames that don't match are discarded: they're either a reply to a
/// different offset on this same connection's (source, type), or another
/// connection's reply.
async fn await_reply(
    inbound: &mut mpsc::UnboundedReceiver<Frame>,
    expect_source: u8,
    expect_type: u8,
    expect_offset: u8,
    timeout: Duration,
) -> Result<Frame, CommandError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, inbound.recv()).await {
            Ok(Some(frame)) => {
                if frame.source == expect_source && frame.type_id == expect_type && frame.offset == expect_offset {
                    return Ok(frame);
                }
            }
            Ok(None) => return Err(CommandError::Bus(crate::error::GatewayError::Closed)),
            Err(_) => return Err(CommandError::Timeout),
        }
    }
}

fn format_numeric(frame: &Frame, offset: usize, width: usize, divider: u32) -> String {
    match frame.logical_bytes(offset, width) {
        Some(bytes) => {
            let signed = BigEndian::read_int(bytes, bytes.len());
            format!("OK {}", signed as f64 / divider as f64)
        }
        None => "OK".to_string(),
    }
}

fn format_kennlinie(frame: &Frame) -> String {
    match frame.logical_bytes(7, 3) {
        Some(b) => format!("OK {} {} {}", b[0], b[1], b[2]),
        None => "OK".to_string(),
    }
}

fn format_bool(frame: &Frame, offset: usize, bit: u8) -> String {
    match frame.logical_bytes(offset, 1) {
        Some(b) => format!("OK {}", b[0] & (1 << bit) != 0),
        None => "OK".to_string(),
    }
}

fn format_raw_byte(frame: &Frame, offset: usize) -> String {
    match frame.logical_bytes(offset, 1) {
        Some(b) => format!("OK {}", b[0]),
        None => "OK".to_string(),
    }
}

fn format_reply(cmd: &Command, frame: &Frame) -> String {
    match cmd {
        Command::HkDayTemp { .. } => format_numeric(frame, 1, 1, 2),
        Command::HkNightTemp { .. } => format_numeric(frame, 4, 1, 2),
        Command::HkKennlinie { .. } => format_kennlinie(frame),
        Command::WwTemp { .. } => format_numeric(frame, 1, 1, 1),
        Command::ThermDesinfect(ThermDesinfectAction::Get) => format_bool(frame, 0, 1),
        Command::ZirkPump(ZirkPumpAction::Get) => format_raw_byte(frame, 2),
        _ => "OK".to_string(),
    }
}

fn format_errors(records: &[ErrorRecord]) -> String {
    let body: Vec<String> = records
        .iter()
        .map(|r| {
            let hex: String = r.record.iter().map(|b| format!("{:02x}", b)).collect();
            format!("{}:{}", r.index, hex)
        })
        .collect();
    format!("OK {}", body.join(","))
}

/// Drive the `geterrors` request/accumulate loop: keep asking for the next
/// record-aligned offset until a reply adds no record this connection
/// hasn't already seen (§4.F `response_counter`).
async fn execute_geterrors(
    dest: u8,
    type_id: u8,
    mut offset: u8,
    gateway: &dyn Gateway,
    inbound: &mut mpsc::UnboundedReceiver<Frame>,
    timeout: Duration,
) -> Result<String, CommandError> {
    let mut records: Vec<ErrorRecord> = Vec::new();
    loop {
        drain_stale(inbound);
        let wire = encoder::read_request(dest, type_id, offset);
        gateway.send(&wire)?;
        let frame = await_reply(inbound, dest, type_id, offset, timeout).await?;

        let mut batch = Vec::new();
        decoder::error_records(&frame, type_id, &mut |v| {
            if let Value::Error(e) = v {
                batch.push(e);
            }
        });
        if batch.is_empty() {
            break;
        }
        let new_count = batch.iter().filter(|e| !records.iter().any(|r| r.index == e.index)).count();
        records.extend(batch);
        if new_count == 0 {
            break;
        }
        offset = offset.saturating_add(descriptors::ERROR_RECORD_WIDTH as u8);
    }
    Ok(format_errors(&records))
}

async fn execute(
    cmd: Command,
    gateway: &dyn Gateway,
    inbound: &mut mpsc::UnboundedReceiver<Frame>,
    timeout: Duration,
) -> Result<String, CommandError> {
    if let Command::GetErrors { offset } = cmd {
        return execute_geterrors(UBA, 0x10, offset as u8, gateway, inbound, timeout).await;
    }
    match build_dispatch(&cmd) {
        Dispatch::Write { dest, type_id, offset, payload } => {
            let wire = encoder::build(dest, type_id, offset, &payload, false);
            gateway.send(&wire)?;
            Ok("OK".to_string())
        }
        Dispatch::Query { dest, type_id, offset } => {
            drain_stale(inbound);
            let wire = encoder::read_request(dest, type_id, offset);
            gateway.send(&wire)?;
            let frame = await_reply(inbound, dest, type_id, offset, timeout).await?;
            Ok(format_reply(&cmd, &frame))
        }
    }
}

/// Drive one client connection end to end: read a line, dispatch it,
/// write back the outcome, repeat until the client disconnects.
///
/// `inbound` receives this connection's share of PC-directed frames,
/// broadcast by the response router (§4.G); frames belonging to another
/// connection's in-flight command are simply ignored by `await_reply`.
pub async fn run<G, S>(gateway: Arc<G>, socket: S, mut inbound: mpsc::UnboundedReceiver<Frame>, reply_timeout: Duration)
where
    G: Gateway + ?Sized,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(socket);
    let mut lines = BufReader::new(read_half).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(%err, "command connection read error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match command::parse(&line) {
            Ok(cmd) => match execute(cmd, gateway.as_ref(), &mut inbound, reply_timeout).await {
                Ok(ok) => ok,
                Err(err) => err.marker().to_string(),
            },
            Err(err) => err.marker().to_string(),
        };

        if write_half.write_all(reply.as_bytes()).await.is_err() {
            break;
        }
        if write_half.write_all(b"\n").await.is_err() {
            break;
        }
    }
}
