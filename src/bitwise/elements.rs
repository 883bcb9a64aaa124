// Bounded element access over shared byte buffers
// Loads and stores fixed-width byte groups and coerces values to field types

use super::types::{Endianness, FieldType, Value};
use std::cell::Cell;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElementError {
    #[error("Field runs beyond the length of the buffer: {size} bytes at offset {offset}, buffer is {len} bytes")]
    BoundsViolation {
        offset: usize,
        size: usize,
        len: usize,
    },

    #[error("Buffer used as int64 field must be {expected} bytes long, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("64-bit number too large for a double; bytes: {bytes} ({endianness})")]
    PrecisionLoss {
        bytes: String,
        endianness: Endianness,
    },

    #[error("Unsupported int64 mode: {0}")]
    UnsupportedMode(String),

    #[error("Value {value} is out of range for {field_type}")]
    ValueOutOfRange { field_type: FieldType, value: String },

    #[error("Cannot decode {field_type}: {reason}")]
    Decode {
        field_type: FieldType,
        reason: String,
    },

    #[error("Cannot write a {found} into a {field_type} field")]
    TypeMismatch {
        field_type: FieldType,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ElementError>;

/// Verify that `size` bytes at `offset` fit in a buffer of `len` bytes
pub fn check_bounds(len: usize, offset: usize, size: usize, no_assert: bool) -> Result<()> {
    if no_assert {
        return Ok(());
    }
    match offset.checked_add(size) {
        Some(end) if end <= len => Ok(()),
        _ => Err(ElementError::BoundsViolation { offset, size, len }),
    }
}

/// The in-range part of `buf[offset..offset + size]`
pub fn region(buf: &[Cell<u8>], offset: usize, size: usize) -> &[Cell<u8>] {
    let start = offset.min(buf.len());
    let end = offset.saturating_add(size).min(buf.len());
    &buf[start..end]
}

/// Copy `N` bytes out of the buffer at `offset`.
/// With `no_assert`, bytes past the end of the buffer read as zero.
pub fn load<const N: usize>(buf: &[Cell<u8>], offset: usize, no_assert: bool) -> Result<[u8; N]> {
    check_bounds(buf.len(), offset, N, no_assert)?;
    let mut out = [0u8; N];
    for (dst, src) in out.iter_mut().zip(region(buf, offset, N)) {
        *dst = src.get();
    }
    Ok(out)
}

/// Copy `bytes` into the buffer at `offset`.
/// With `no_assert`, bytes that would land past the end are dropped.
pub fn store(buf: &[Cell<u8>], offset: usize, bytes: &[u8], no_assert: bool) -> Result<()> {
    check_bounds(buf.len(), offset, bytes.len(), no_assert)?;
    for (dst, src) in region(buf, offset, bytes.len()).iter().zip(bytes) {
        dst.set(*src);
    }
    Ok(())
}

fn out_of_range(field_type: FieldType, value: &Value<'_>) -> ElementError {
    ElementError::ValueOutOfRange {
        field_type,
        value: value.to_string(),
    }
}

fn not_numeric(field_type: FieldType, value: &Value<'_>) -> ElementError {
    ElementError::TypeMismatch {
        field_type,
        found: value.kind(),
    }
}

/// Coerce a value for an unsigned field of at most `max`.
/// Unchecked coercion returns the two's complement bits; the caller truncates.
pub fn to_unsigned(value: &Value<'_>, field_type: FieldType, max: u64, checked: bool) -> Result<u64> {
    if !value.is_number() {
        return Err(not_numeric(field_type, value));
    }
    match value.as_u64() {
        Some(v) if v <= max => Ok(v),
        _ if checked => Err(out_of_range(field_type, value)),
        _ => Ok(match *value {
            Value::Int(v) => v as u64,
            Value::UInt(v) => v,
            Value::Float(v) => v as i64 as u64,
            Value::Float32(v) => v as i64 as u64,
            _ => 0,
        }),
    }
}

/// Coerce a value for a signed field spanning `min..=max`
pub fn to_signed(
    value: &Value<'_>,
    field_type: FieldType,
    min: i64,
    max: i64,
    checked: bool,
) -> Result<i64> {
    if !value.is_number() {
        return Err(not_numeric(field_type, value));
    }
    match value.as_i64() {
        Some(v) if (min..=max).contains(&v) => Ok(v),
        _ if checked => Err(out_of_range(field_type, value)),
        _ => Ok(match *value {
            Value::Int(v) => v,
            Value::UInt(v) => v as i64,
            Value::Float(v) => v as i64,
            Value::Float32(v) => v as i64,
            _ => 0,
        }),
    }
}

/// Coerce a value for a float64 field
pub fn to_f64(value: &Value<'_>, field_type: FieldType) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| not_numeric(field_type, value))
}

/// Coerce a value for a float32 field. A float32 value is stored bit for bit.
pub fn to_f32(value: &Value<'_>, field_type: FieldType, checked: bool) -> Result<f32> {
    if let Value::Float32(v) = *value {
        return Ok(v);
    }
    let v = to_f64(value, field_type)?;
    if checked && v.is_finite() && v.abs() > f64::from(f32::MAX) {
        return Err(out_of_range(field_type, value));
    }
    Ok(v as f32)
}

/// Lowercase hex of a byte run, used in diagnostics
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitwise::types::cells;

    #[test]
    fn test_load_store() {
        let mut raw = [0x12, 0x34, 0x56, 0x78];
        let buf = cells(&mut raw);
        assert_eq!(load::<2>(buf, 1, false).unwrap(), [0x34, 0x56]);

        store(buf, 2, &[0xAA, 0xBB], false).unwrap();
        assert_eq!(raw, [0x12, 0x34, 0xAA, 0xBB]);
    }

    #[test]
    fn test_bounds_checking() {
        let mut raw = [1u8, 2, 3];
        let buf = cells(&mut raw);
        assert_eq!(
            load::<4>(buf, 0, false),
            Err(ElementError::BoundsViolation {
                offset: 0,
                size: 4,
                len: 3
            })
        );
        assert!(store(buf, 2, &[0, 0], false).is_err());
        assert!(load::<1>(buf, usize::MAX, false).is_err());
    }

    #[test]
    fn test_no_assert_clips() {
        let mut raw = [1u8, 2, 3];
        let buf = cells(&mut raw);
        assert_eq!(load::<4>(buf, 1, true).unwrap(), [2, 3, 0, 0]);
        assert_eq!(load::<2>(buf, 10, true).unwrap(), [0, 0]);

        store(buf, 2, &[9, 9, 9], true).unwrap();
        assert_eq!(raw, [1, 2, 9]);
    }

    #[test]
    fn test_unsigned_coercion() {
        let ty = FieldType::U8;
        assert_eq!(to_unsigned(&Value::Int(200), ty, 0xFF, true).unwrap(), 200);
        assert!(to_unsigned(&Value::Int(256), ty, 0xFF, true).is_err());
        assert!(to_unsigned(&Value::Int(-1), ty, 0xFF, true).is_err());
        assert_eq!(to_unsigned(&Value::Int(-1), ty, 0xFF, false).unwrap() as u8, 0xFF);
        assert!(to_unsigned(&Value::Float(1.5), ty, 0xFF, true).is_err());
        assert!(matches!(
            to_unsigned(&Value::Bytes(vec![1]), ty, 0xFF, false),
            Err(ElementError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_signed_coercion() {
        let ty = FieldType::I16;
        let (min, max) = (i16::MIN as i64, i16::MAX as i64);
        assert_eq!(to_signed(&Value::Int(-256), ty, min, max, true).unwrap(), -256);
        assert_eq!(to_signed(&Value::UInt(0xFF00), ty, min, max, false).unwrap() as i16, -256);
        assert!(to_signed(&Value::UInt(0xFF00), ty, min, max, true).is_err());
    }

    #[test]
    fn test_float_coercion() {
        assert_eq!(to_f64(&Value::Int(-3), FieldType::F64).unwrap(), -3.0);
        assert!(to_f32(&Value::Float(1e39), FieldType::F32, true).is_err());
        assert_eq!(to_f32(&Value::Float(1e39), FieldType::F32, false).unwrap(), f32::INFINITY);
        assert!(to_f32(&Value::Float(f64::INFINITY), FieldType::F32, true).is_ok());
        assert!(to_f64(&Value::Bytes(vec![0; 8]), FieldType::F64).is_err());

        let snan = f32::from_bits(0x7fa0_0001);
        assert_eq!(
            to_f32(&Value::Float32(snan), FieldType::F32, true).unwrap().to_bits(),
            0x7fa0_0001
        );
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[0x00, 0x0f, 0xff]), "000fff");
    }
}
