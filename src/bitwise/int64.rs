// 64-bit integer handling policy
//
// A double holds integers of at most 53 significant bits. Each 64-bit field
// picks a strategy for values that may not fit:
//
// strict: decode to a number; fail with PrecisionLoss if bits would be lost
// lossy:  decode to a number; +/- infinity if it does not fit
// copy:   an independent 8-byte copy
// slice:  the 8 bytes of the source buffer itself, aliased
// skip:   not decoded at all

use super::elements::{self, check_bounds, load, region, store, ElementError, Result};
use super::types::{Endianness, FieldType, Value};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Bits 52..63 of the 64-bit value, seen from the high half
const LOST_BITS_MASK: u32 = 0xFFF0_0000;
const SIGN_BIT: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Int64Mode {
    #[default]
    Strict,
    Lossy,
    Copy,
    Slice,
    Skip,
}

impl Int64Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Int64Mode::Strict => "strict",
            Int64Mode::Lossy => "lossy",
            Int64Mode::Copy => "copy",
            Int64Mode::Slice => "slice",
            Int64Mode::Skip => "skip",
        }
    }

    /// Modes that decode to a number rather than bytes
    pub fn is_numeric(&self) -> bool {
        matches!(self, Int64Mode::Strict | Int64Mode::Lossy)
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Int64Mode::Lossy,
            2 => Int64Mode::Copy,
            3 => Int64Mode::Slice,
            4 => Int64Mode::Skip,
            _ => Int64Mode::Strict,
        }
    }
}

impl fmt::Display for Int64Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Int64Mode {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" | "strict number" => Ok(Int64Mode::Strict),
            "lossy" | "lossy number" => Ok(Int64Mode::Lossy),
            "copy" | "copy buffer" => Ok(Int64Mode::Copy),
            "slice" | "slice buffer" => Ok(Int64Mode::Slice),
            "skip" => Ok(Int64Mode::Skip),
            other => Err(ElementError::UnsupportedMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for Int64Mode {
    type Error = ElementError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

static GLOBAL_MODE: AtomicU8 = AtomicU8::new(Int64Mode::Strict as u8);

/// Process-wide fallback mode for fields and structs that set none
pub fn global_mode() -> Int64Mode {
    Int64Mode::from_u8(GLOBAL_MODE.load(Ordering::Relaxed))
}

pub fn set_global_mode(mode: Int64Mode) {
    GLOBAL_MODE.store(mode as u8, Ordering::Relaxed);
}

/// Field override, then struct default, then the global default
pub fn resolve_mode(field: Option<Int64Mode>, def: Option<Int64Mode>) -> Int64Mode {
    field.or(def).unwrap_or_else(global_mode)
}

/// Split 8 bytes into (hi, lo) halves; hi always holds the top 32 bits
pub fn split_halves(bytes: [u8; 8], endianness: Endianness) -> (u32, u32) {
    let [a0, a1, a2, a3, b0, b1, b2, b3] = bytes;
    match endianness {
        Endianness::Big => (
            u32::from_be_bytes([a0, a1, a2, a3]),
            u32::from_be_bytes([b0, b1, b2, b3]),
        ),
        Endianness::Little => (
            u32::from_le_bytes([b0, b1, b2, b3]),
            u32::from_le_bytes([a0, a1, a2, a3]),
        ),
    }
}

/// Compose a number from the halves if it survives the trip through a double
pub fn compose_exact(hi: u32, lo: u32, signed: bool) -> Option<Value<'static>> {
    let lost_bits = hi & LOST_BITS_MASK;
    if signed && (lost_bits == 0 || lost_bits == LOST_BITS_MASK) {
        // Sign-extending the high half keeps negative magnitudes intact
        Some(Value::Int(((hi as i32 as i64) << 32) | lo as i64))
    } else if !signed && lost_bits == 0 {
        Some(Value::UInt(((hi as u64) << 32) | lo as u64))
    } else {
        None
    }
}

/// Decode a 64-bit integer field according to `mode`.
/// Returns `None` for skipped fields.
pub fn decode<'a>(
    buf: &'a [Cell<u8>],
    offset: usize,
    signed: bool,
    endianness: Endianness,
    mode: Int64Mode,
    no_assert: bool,
) -> Result<Option<Value<'a>>> {
    check_bounds(buf.len(), offset, 8, no_assert)?;
    match mode {
        Int64Mode::Strict | Int64Mode::Lossy => {
            let bytes = load::<8>(buf, offset, no_assert)?;
            let (hi, lo) = split_halves(bytes, endianness);
            if let Some(value) = compose_exact(hi, lo, signed) {
                return Ok(Some(value));
            }
            if mode == Int64Mode::Strict {
                return Err(ElementError::PrecisionLoss {
                    bytes: elements::hex(&bytes),
                    endianness,
                });
            }
            let negative = signed && hi & SIGN_BIT != 0;
            tracing::debug!(
                "Substituting {}infinity for 64-bit value {} at offset {}",
                if negative { "-" } else { "+" },
                elements::hex(&bytes),
                offset
            );
            Ok(Some(Value::Float(if negative {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            })))
        }
        Int64Mode::Copy => Ok(Some(Value::Bytes(load::<8>(buf, offset, no_assert)?.to_vec()))),
        Int64Mode::Slice => Ok(Some(Value::Slice(region(buf, offset, 8)))),
        Int64Mode::Skip => Ok(None),
    }
}

/// Encode a 64-bit integer field. Numbers are written as two 32-bit halves,
/// byte values are copied verbatim and must be exactly 8 bytes.
pub fn encode(
    buf: &[Cell<u8>],
    offset: usize,
    value: &Value<'_>,
    signed: bool,
    endianness: Endianness,
    no_assert: bool,
) -> Result<()> {
    if let Some(bytes) = value.to_bytes() {
        if bytes.len() != 8 {
            return Err(ElementError::InvalidLength {
                expected: 8,
                actual: bytes.len(),
            });
        }
        return store(buf, offset, &bytes, no_assert);
    }

    let bits = if signed {
        elements::to_signed(value, FieldType::I64, i64::MIN, i64::MAX, !no_assert)? as u64
    } else {
        elements::to_unsigned(value, FieldType::U64, u64::MAX, !no_assert)?
    };
    let hi = (bits >> 32) as u32;
    let lo = bits as u32;

    check_bounds(buf.len(), offset, 8, no_assert)?;
    match endianness {
        Endianness::Big => {
            store(buf, offset, &hi.to_be_bytes(), no_assert)?;
            store(buf, offset.saturating_add(4), &lo.to_be_bytes(), no_assert)
        }
        Endianness::Little => {
            store(buf, offset.saturating_add(4), &hi.to_le_bytes(), no_assert)?;
            store(buf, offset, &lo.to_le_bytes(), no_assert)
        }
    }
}
