//! Descriptor tables for the telegram decoder (§4.B, §9 "Descriptor-driven
//! parsing").
//!
//! Each `(source, type)` combination the decoder understands maps to a
//! static list of [`Descriptor`]s. One generic applier (`apply`) walks the
//! list and fires a descriptor only when the frame's payload fully covers
//! the bytes it needs — this is what makes the `canAccess` bounds check
//! uniform across every parser instead of being hand-rolled per message.

use crate::frame::Frame;
use crate::value::{SubType, Type, Value};

/// One static extraction rule: where to look in the frame's logical address
/// space, and what kind of [`Value`] to build from what's there.
#[derive(Debug, Clone, Copy)]
pub enum Descriptor {
    Numeric {
        offset: usize,
        width: usize,
        divider: u32,
        ty: Type,
        subtype: SubType,
    },
    Boolean {
        offset: usize,
        bit: u8,
        ty: Type,
        subtype: SubType,
    },
    Enumeration {
        offset: usize,
        ty: Type,
        subtype: SubType,
    },
}

/// Apply every descriptor in `table` to `frame`, calling `emit` for each one
/// whose bytes are fully present. Descriptors whose window falls outside
/// the payload simply don't fire — no error, no partial read.
pub fn apply(table: &[Descriptor], frame: &Frame, emit: &mut impl FnMut(Value)) {
    for d in table {
        match *d {
            Descriptor::Numeric {
                offset,
                width,
                divider,
                ty,
                subtype,
            } => {
                if let Some(bytes) = frame.logical_bytes(offset, width) {
                    emit(Value::numeric(ty, subtype, bytes, divider));
                }
            }
            Descriptor::Boolean {
                offset,
                bit,
                ty,
                subtype,
            } => {
                if let Some(bytes) = frame.logical_bytes(offset, 1) {
                    emit(Value::boolean(ty, subtype, bytes[0], bit));
                }
            }
            Descriptor::Enumeration { offset, ty, subtype } => {
                if let Some(bytes) = frame.logical_bytes(offset, 1) {
                    emit(Value::enumeration(ty, subtype, bytes[0]));
                }
            }
        }
    }
}

/// Width, in bytes, of one error-log record (§4.B error-record parser).
pub const ERROR_RECORD_WIDTH: usize = 13;

pub fn uba_monitor_fast() -> &'static [Descriptor] {
    use Descriptor::*;
    &[
        Numeric { offset: 0, width: 1, divider: 1, ty: Type::SollTemp, subtype: SubType::Kessel },
        Numeric { offset: 1, width: 2, divider: 10, ty: Type::IstTemp, subtype: SubType::Kessel },
        Boolean { offset: 11, bit: 0, ty: Type::BrennerAktiv, subtype: SubType::Kessel },
        Boolean { offset: 11, bit: 1, ty: Type::FlammeAktiv, subtype: SubType::Kessel },
        Boolean { offset: 11, bit: 2, ty: Type::PumpeAktiv, subtype: SubType::Kessel },
        Numeric { offset: 14, width: 2, divider: 10, ty: Type::Flammenstrom, subtype: SubType::Kessel },
    ]
}

pub fn uba_monitor_slow() -> &'static [Descriptor] {
    use Descriptor::*;
    &[
        Numeric { offset: 0, width: 2, divider: 10, ty: Type::IstTemp, subtype: SubType::Abgas },
        Numeric { offset: 11, width: 3, divider: 1, ty: Type::BrennerStarts, subtype: SubType::Kessel },
        Numeric { offset: 14, width: 3, divider: 1, ty: Type::BrennerLaufzeit, subtype: SubType::Kessel },
    ]
}

pub fn uba_parameters() -> &'static [Descriptor] {
    use Descriptor::*;
    &[
        Numeric { offset: 1, width: 1, divider: 1, ty: Type::SollTemp, subtype: SubType::Kessel },
        Boolean { offset: 0, bit: 0, ty: Type::Freigegeben, subtype: SubType::Kessel },
    ]
}

pub fn ww_parameters() -> &'static [Descriptor] {
    use Descriptor::*;
    &[
        Numeric { offset: 1, width: 1, divider: 1, ty: Type::SollTemp, subtype: SubType::WW },
        // bit 0: warm-water heating enabled; bit 1: thermal disinfection enabled.
        Boolean { offset: 0, bit: 0, ty: Type::Aktivierung, subtype: SubType::WW },
        Boolean { offset: 0, bit: 1, ty: Type::Aktivierung, subtype: SubType::Zirkulation },
        Enumeration { offset: 2, ty: Type::Schaltpunkte, subtype: SubType::Zirkulation },
    ]
}

pub fn ww_monitor() -> &'static [Descriptor] {
    use Descriptor::*;
    &[
        Numeric { offset: 1, width: 2, divider: 10, ty: Type::IstTemp, subtype: SubType::WW },
        Boolean { offset: 3, bit: 0, ty: Type::PumpeAktiv, subtype: SubType::WW },
        Boolean { offset: 3, bit: 1, ty: Type::ZirkPumpeAktiv, subtype: SubType::Zirkulation },
    ]
}

pub fn outdoor_temperature() -> &'static [Descriptor] {
    use Descriptor::*;
    &[Numeric { offset: 0, width: 2, divider: 10, ty: Type::IstTemp, subtype: SubType::Aussen }]
}

/// HK1/HK2 monitor numeric/boolean fields, excluding the kennlinie triple
/// and the conditional temperature-change field (§4.B handles those
/// separately since they're not simple always-fire descriptors).
pub fn hk_monitor(subtype: SubType) -> Vec<Descriptor> {
    use Descriptor::*;
    vec![
        Boolean { offset: 0, bit: 0, ty: Type::Freigegeben, subtype },
        Numeric { offset: 1, width: 1, divider: 2, ty: Type::Tagsoll, subtype },
        Numeric { offset: 2, width: 2, divider: 10, ty: Type::IstTemp, subtype },
        Numeric { offset: 4, width: 1, divider: 2, ty: Type::Nachtsoll, subtype },
    ]
}

pub fn wm_temp1() -> &'static [Descriptor] {
    use Descriptor::*;
    &[Numeric { offset: 0, width: 2, divider: 10, ty: Type::IstTemp, subtype: SubType::Ruecklauf }]
}

pub fn wm_temp2() -> &'static [Descriptor] {
    use Descriptor::*;
    &[Numeric { offset: 0, width: 2, divider: 10, ty: Type::IstTemp, subtype: SubType::HK1 }]
}

pub fn mm_temperatures() -> &'static [Descriptor] {
    use Descriptor::*;
    &[
        Numeric { offset: 0, width: 2, divider: 10, ty: Type::IstTemp, subtype: SubType::HK2 },
        Numeric { offset: 2, width: 2, divider: 10, ty: Type::IstTemp, subtype: SubType::Ruecklauf },
    ]
}
