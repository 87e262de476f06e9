//! Telegram decoder (component B, §4.B): turns one inbound [`Frame`] into
//! zero or more [`Value`]s.

use tracing::{debug, trace};

use crate::address::{BC10, MM10, RC, UBA, WM10};
use crate::descriptors::{self, apply, ERROR_RECORD_WIDTH};
use crate::frame::Frame;
use crate::value::{SubType, SystemTime, Type, Value};

/// Callback invoked once per decoded value, in the order it was decoded.
/// Must not block (§5): it runs on the reactor thread.
pub type ValueHandler = Box<dyn FnMut(Value) + Send>;

/// Parses inbound frames into typed readings and hands them to a
/// value-handler callback (§4.B).
pub struct Decoder {
    handler: Option<ValueHandler>,
}

impl Decoder {
    pub fn new() -> Decoder {
        Decoder { handler: None }
    }

    /// Wire the callback that receives every decoded value. Must be called
    /// before the first [`Decoder::handle`] call; the decoder does nothing
    /// until it is.
    pub fn set_handler(&mut self, handler: impl FnMut(Value) + Send + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Decode one frame, emitting any values it yields to the handler.
    ///
    /// Precondition checks happen in order and are silent: an invalid
    /// header or a polling request never reaches dispatch, and if no
    /// handler is wired nothing is parsed at all.
    pub fn handle(&mut self, frame: &Frame) {
        if frame.is_invalid_header() {
            return;
        }
        if frame.is_polling() {
            return;
        }
        let Some(handler) = self.handler.as_mut() else {
            return;
        };
        let mut emit = |v: Value| handler(v);
        dispatch(frame, &mut emit);
    }
}

impl Default for Decoder {
    fn default() -> Decoder {
        Decoder::new()
    }
}

fn dispatch(frame: &Frame, emit: &mut impl FnMut(Value)) {
    match frame.source {
        UBA => dispatch_uba(frame, emit),
        BC10 => dispatch_bc10(frame, emit),
        RC => dispatch_rc(frame, emit),
        WM10 => apply_by_type(
            frame,
            emit,
            &[(0x9C, descriptors::wm_temp1() as &[_]), (0x1E, descriptors::wm_temp2())],
        ),
        MM10 => apply_by_type(frame, emit, &[(0xAB, descriptors::mm_temperatures())]),
        other => debug!(source = other, type_id = frame.type_id, "unhandled source"),
    }
}

fn apply_by_type(frame: &Frame, emit: &mut impl FnMut(Value), table: &[(u8, &[descriptors::Descriptor])]) {
    match table.iter().find(|(t, _)| *t == frame.type_id) {
        Some((_, descs)) => apply(descs, frame, emit),
        None => debug!(source = frame.source, type_id = frame.type_id, "unhandled type for source"),
    }
}

fn dispatch_uba(frame: &Frame, emit: &mut impl FnMut(Value)) {
    match frame.type_id {
        0x10 | 0x11 => error_records(frame, frame.type_id, emit),
        0x16 => apply(descriptors::uba_parameters(), frame, emit),
        0x18 => {
            apply(descriptors::uba_monitor_fast(), frame, emit);
            uba_monitor_fast_formatted(frame, emit);
        }
        0x19 => apply(descriptors::uba_monitor_slow(), frame, emit),
        0x33 => apply(descriptors::ww_parameters(), frame, emit),
        0x34 => apply(descriptors::ww_monitor(), frame, emit),
        0x07 | 0x1C => trace!("UBA ack, no-op"),
        other => debug!(type_id = other, "unhandled UBA type"),
    }
}

fn dispatch_bc10(frame: &Frame, _emit: &mut impl FnMut(Value)) {
    match frame.type_id {
        0x29 => trace!("BC10 ack, no-op"),
        other => debug!(type_id = other, "unhandled BC10 type"),
    }
}

fn dispatch_rc(frame: &Frame, emit: &mut impl FnMut(Value)) {
    match frame.type_id {
        0x06 => system_time(frame, emit),
        0x3E => hk_monitor(frame, SubType::HK1, emit),
        0x48 => hk_monitor(frame, SubType::HK2, emit),
        0xA3 => apply(descriptors::outdoor_temperature(), frame, emit),
        0x1A | 0x35 | 0x9D | 0xA2 | 0xAC => trace!("RC ack, no-op"),
        other => debug!(type_id = other, "unhandled RC type"),
    }
}

/// §4.B error-record parser: iterate record-width-aligned windows from the
/// first one at-or-above `frame.offset`, emitting one `Error` value per
/// full record.
pub(crate) fn error_records(frame: &Frame, source_type_id: u8, emit: &mut impl FnMut(Value)) {
    let w = ERROR_RECORD_WIDTH;
    let start = frame.offset as usize;
    let mut aligned = ((start + w - 1) / w) * w;
    while frame.can_access(aligned, w) {
        let record = frame.logical_bytes(aligned, w).unwrap().to_vec();
        let index = (aligned / w) as u32;
        emit(Value::error(source_type_id, index, record));
        aligned += w;
    }
}

fn system_time(frame: &Frame, emit: &mut impl FnMut(Value)) {
    if let Some(b) = frame.logical_bytes(0, 8) {
        emit(Value::system_time(SystemTime {
            year: b[0],
            month: b[1],
            day: b[2],
            hour: b[3],
            minute: b[4],
            second: b[5],
            day_of_week: b[6],
            dst: b[7] & 0x01 != 0,
        }));
    }
}

/// HK1/HK2 monitor (§4.B): plain descriptors, plus the kennlinie triple and
/// the conditional temperature-change field, which aren't simple
/// always-fire descriptors.
fn hk_monitor(frame: &Frame, subtype: SubType, emit: &mut impl FnMut(Value)) {
    apply(&descriptors::hk_monitor(subtype), frame, emit);

    if let Some(b) = frame.logical_bytes(7, 3) {
        emit(Value::kennlinie(subtype, b[0], b[1], b[2]));
    }

    if let Some(flag) = frame.logical_bytes(15, 1) {
        if flag[0] & 0x01 == 0 {
            if let Some(b) = frame.logical_bytes(10, 2) {
                emit(Value::numeric(Type::TempAenderung, subtype, b, 100));
            }
        }
    }
}

/// UBA monitor fast's two `Formatted` values (§4.B).
fn uba_monitor_fast_formatted(frame: &Frame, emit: &mut impl FnMut(Value)) {
    if let Some(b) = frame.logical_bytes(18, 2) {
        let text: String = b.iter().map(|&c| c as char).collect();
        emit(Value::formatted(Type::ServiceCode, SubType::Kessel, text));
    }
    if let Some(b) = frame.logical_bytes(20, 2) {
        let code = u16::from_be_bytes([b[0], b[1]]);
        emit(Value::formatted(Type::FehlerCode, SubType::Kessel, code.to_string()));
    }
}
