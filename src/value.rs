//! The tagged value union emitted by the decoder (component A, §3/§4.A).
//!
//! `Value` is construct-only: every variant is built once by the decoder and
//! handed to the value-handler callback (§5) unmodified. There is
//! deliberately no public mutator.

use byteorder::{BigEndian, ByteOrder};

/// The measured quantity a [`Value`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    SollTemp,
    IstTemp,
    SollLeistung,
    IstLeistung,
    Flammenstrom,
    FlammeAktiv,
    BrennerAktiv,
    BrennerStarts,
    BrennerLaufzeit,
    PumpeAktiv,
    ZirkPumpeAktiv,
    Stoerung,
    Freigegeben,
    Tagsoll,
    Nachtsoll,
    HKKennlinie,
    SystemTime,
    ServiceCode,
    FehlerCode,
    ErrorRecord,
    Schaltpunkte,
    Aktivierung,
    /// Rate of setpoint change used by the heating-curve monitor's optional
    /// temperature-change field (§4.B "Conditional numeric").
    TempAenderung,
}

/// The logical subject a [`Value`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubType {
    Kessel,
    WW,
    HK1,
    HK2,
    Raum,
    Aussen,
    Ruecklauf,
    Abgas,
    Zirkulation,
    None,
}

/// A controller clock reading (§3 SystemTime), fixed byte layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemTime {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub day_of_week: u8,
    pub dst: bool,
}

/// One decoded error-log entry (§3 Error, §4.B error-record parser).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// 0x10 (active) or 0x11 (stored), distinguishing the originating type.
    pub source_type_id: u8,
    /// `aligned_offset / record_width`.
    pub index: u32,
    /// The controller's encoded record, verbatim.
    pub record: Vec<u8>,
}

/// A single decoded reading.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Numeric {
        ty: Type,
        subtype: SubType,
        value: f64,
    },
    Boolean {
        ty: Type,
        subtype: SubType,
        value: bool,
    },
    Enumeration {
        ty: Type,
        subtype: SubType,
        raw: u8,
    },
    Kennlinie {
        subtype: SubType,
        low: u8,
        medium: u8,
        high: u8,
    },
    SystemTime(SystemTime),
    Error(ErrorRecord),
    Formatted {
        ty: Type,
        subtype: SubType,
        text: String,
    },
}

impl Value {
    /// Build a scaled numeric reading from a big-endian byte slice.
    ///
    /// `bytes` is sign-extended from its own width (1-4 bytes) the way the
    /// controller packs negative temperatures, then divided by `divider`.
    pub fn numeric(ty: Type, subtype: SubType, bytes: &[u8], divider: u32) -> Value {
        debug_assert!(!bytes.is_empty() && bytes.len() <= 4);
        let signed = byteorder::BigEndian::read_int(bytes, bytes.len());
        Value::Numeric {
            ty,
            subtype,
            value: signed as f64 / divider as f64,
        }
    }

    /// Extract bit `bit` of `byte` as a boolean reading.
    pub fn boolean(ty: Type, subtype: SubType, byte: u8, bit: u8) -> Value {
        Value::Boolean {
            ty,
            subtype,
            value: byte & (1 << bit) != 0,
        }
    }

    pub fn enumeration(ty: Type, subtype: SubType, raw: u8) -> Value {
        Value::Enumeration { ty, subtype, raw }
    }

    pub fn kennlinie(subtype: SubType, low: u8, medium: u8, high: u8) -> Value {
        Value::Kennlinie {
            subtype,
            low,
            medium,
            high,
        }
    }

    pub fn system_time(time: SystemTime) -> Value {
        Value::SystemTime(time)
    }

    pub fn error(source_type_id: u8, index: u32, record: Vec<u8>) -> Value {
        Value::Error(ErrorRecord {
            source_type_id,
            index,
            record,
        })
    }

    pub fn formatted(ty: Type, subtype: SubType, text: String) -> Value {
        Value::Formatted { ty, subtype, text }
    }

    /// The (type, subtype) pair, where this variant carries one. Error and
    /// SystemTime readings don't, since they aren't tagged by quantity/subject.
    pub fn classifier(&self) -> Option<(Type, SubType)> {
        match self {
            Value::Numeric { ty, subtype, .. }
            | Value::Boolean { ty, subtype, .. }
            | Value::Enumeration { ty, subtype, .. }
            | Value::Formatted { ty, subtype, .. } => Some((*ty, *subtype)),
            Value::Kennlinie { subtype, .. } => Some((Type::HKKennlinie, *subtype)),
            Value::SystemTime(_) => Some((Type::SystemTime, SubType::None)),
            Value::Error(_) => Some((Type::ErrorRecord, SubType::None)),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numeric { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean { value, .. } => Some(*value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_positive_single_byte() {
        let v = Value::numeric(Type::SollTemp, SubType::Kessel, &[0x00], 1);
        assert_eq!(v.as_f64(), Some(0.0));
    }

    #[test]
    fn numeric_two_byte_divider_ten() {
        // 0x01, 0x9A = 410 / 10 = 41.0
        let v = Value::numeric(Type::IstTemp, SubType::Kessel, &[0x01, 0x9A], 10);
        assert_eq!(v.as_f64(), Some(41.0));
    }

    #[test]
    fn numeric_negative_two_byte() {
        // top bit set => two's complement of 16 bits
        let v = Value::numeric(Type::IstTemp, SubType::Aussen, &[0xFF, 0xF6], 1);
        assert_eq!(v.as_f64(), Some(-10.0));
    }

    #[test]
    fn boolean_extracts_single_bit() {
        let v = Value::boolean(Type::FlammeAktiv, SubType::Kessel, 0b0000_0010, 1);
        assert_eq!(v.as_bool(), Some(true));
        let v = Value::boolean(Type::FlammeAktiv, SubType::Kessel, 0b0000_0010, 0);
        assert_eq!(v.as_bool(), Some(false));
    }

    #[test]
    fn classifier_round_trips_variant_tags() {
        let v = Value::numeric(Type::SollTemp, SubType::HK1, &[0x2D], 1);
        assert_eq!(v.classifier(), Some((Type::SollTemp, SubType::HK1)));
    }
}
