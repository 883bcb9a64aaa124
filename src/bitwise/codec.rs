// Field codec registry
// One read/write strategy pair per (type, endianness), built once on first use

use super::elements::{self, load, store, ElementError, Result};
use super::int64::{self, Int64Mode};
use super::types::{Endianness, FieldType, Value};
use nom::{number::complete as number, IResult};
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;

/// Per-access settings handed to a read strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub no_assert: bool,
    pub int64_mode: Int64Mode,
}

impl Access {
    pub fn new(no_assert: bool, int64_mode: Int64Mode) -> Self {
        Self {
            no_assert,
            int64_mode,
        }
    }
}

/// Read strategy. `None` means the field yields no value (skip mode).
pub type ReadFn = for<'a> fn(&'a [Cell<u8>], usize, Access) -> Result<Option<Value<'a>>>;

/// Write strategy; the flag disables bounds and range checks
pub type WriteFn = fn(&[Cell<u8>], usize, &Value<'_>, bool) -> Result<()>;

#[derive(Clone, Copy)]
pub struct Codec {
    pub field_type: FieldType,
    pub endianness: Endianness,
    pub read: ReadFn,
    pub write: WriteFn,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("field_type", &self.field_type)
            .field("endianness", &self.endianness)
            .finish()
    }
}

/// Run a nom number parser over a loaded byte group
fn parse_number<'b, O>(
    input: &'b [u8],
    field_type: FieldType,
    mut parser: impl FnMut(&'b [u8]) -> IResult<&'b [u8], O>,
) -> Result<O> {
    parser(input)
        .map(|(_, value)| value)
        .map_err(|err| ElementError::Decode {
            field_type,
            reason: err.to_string(),
        })
}

macro_rules! primitive_codec {
    (@coerce unsigned, $value:expr, $field_type:expr, $prim:ty, $checked:expr) => {
        elements::to_unsigned($value, $field_type, <$prim>::MAX as u64, $checked).map(|v| v as $prim)
    };
    (@coerce signed, $value:expr, $field_type:expr, $prim:ty, $checked:expr) => {
        elements::to_signed(
            $value,
            $field_type,
            <$prim>::MIN as i64,
            <$prim>::MAX as i64,
            $checked,
        )
        .map(|v| v as $prim)
    };
    (@coerce float32, $value:expr, $field_type:expr, $prim:ty, $checked:expr) => {
        elements::to_f32($value, $field_type, $checked)
    };
    (@coerce float64, $value:expr, $field_type:expr, $prim:ty, $checked:expr) => {
        elements::to_f64($value, $field_type)
    };
    ($read:ident, $write:ident, $kind:ident, $field_type:expr, $prim:ty, $parse:path, $to_bytes:ident) => {
        fn $read<'a>(buf: &'a [Cell<u8>], offset: usize, access: Access) -> Result<Option<Value<'a>>> {
            let bytes = load::<{ std::mem::size_of::<$prim>() }>(buf, offset, access.no_assert)?;
            let value: $prim = parse_number(&bytes, $field_type, $parse)?;
            Ok(Some(Value::from(value)))
        }

        fn $write(buf: &[Cell<u8>], offset: usize, value: &Value<'_>, no_assert: bool) -> Result<()> {
            let value = primitive_codec!(@coerce $kind, value, $field_type, $prim, !no_assert)?;
            store(buf, offset, &value.$to_bytes(), no_assert)
        }
    };
}

macro_rules! int64_codec {
    ($read:ident, $write:ident, $signed:expr, $endianness:expr) => {
        fn $read<'a>(buf: &'a [Cell<u8>], offset: usize, access: Access) -> Result<Option<Value<'a>>> {
            int64::decode(buf, offset, $signed, $endianness, access.int64_mode, access.no_assert)
        }

        fn $write(buf: &[Cell<u8>], offset: usize, value: &Value<'_>, no_assert: bool) -> Result<()> {
            int64::encode(buf, offset, value, $signed, $endianness, no_assert)
        }
    };
}

primitive_codec!(read_u8, write_u8, unsigned, FieldType::U8, u8, number::be_u8, to_be_bytes);
primitive_codec!(read_i8, write_i8, signed, FieldType::I8, i8, number::be_i8, to_be_bytes);
primitive_codec!(read_u16_le, write_u16_le, unsigned, FieldType::U16, u16, number::le_u16, to_le_bytes);
primitive_codec!(read_u16_be, write_u16_be, unsigned, FieldType::U16, u16, number::be_u16, to_be_bytes);
primitive_codec!(read_i16_le, write_i16_le, signed, FieldType::I16, i16, number::le_i16, to_le_bytes);
primitive_codec!(read_i16_be, write_i16_be, signed, FieldType::I16, i16, number::be_i16, to_be_bytes);
primitive_codec!(read_u32_le, write_u32_le, unsigned, FieldType::U32, u32, number::le_u32, to_le_bytes);
primitive_codec!(read_u32_be, write_u32_be, unsigned, FieldType::U32, u32, number::be_u32, to_be_bytes);
primitive_codec!(read_i32_le, write_i32_le, signed, FieldType::I32, i32, number::le_i32, to_le_bytes);
primitive_codec!(read_i32_be, write_i32_be, signed, FieldType::I32, i32, number::be_i32, to_be_bytes);
primitive_codec!(read_f32_le, write_f32_le, float32, FieldType::F32, f32, number::le_f32, to_le_bytes);
primitive_codec!(read_f32_be, write_f32_be, float32, FieldType::F32, f32, number::be_f32, to_be_bytes);
primitive_codec!(read_f64_le, write_f64_le, float64, FieldType::F64, f64, number::le_f64, to_le_bytes);
primitive_codec!(read_f64_be, write_f64_be, float64, FieldType::F64, f64, number::be_f64, to_be_bytes);
int64_codec!(read_u64_le, write_u64_le, false, Endianness::Little);
int64_codec!(read_u64_be, write_u64_be, false, Endianness::Big);
int64_codec!(read_i64_le, write_i64_le, true, Endianness::Little);
int64_codec!(read_i64_be, write_i64_be, true, Endianness::Big);

macro_rules! codec_table {
    ($(($field_type:ident, $endianness:ident, $read:ident, $write:ident)),+ $(,)?) => {
        [$(
            Codec {
                field_type: FieldType::$field_type,
                endianness: Endianness::$endianness,
                read: $read,
                write: $write,
            }
        ),+]
    };
}

lazy_static::lazy_static! {
    static ref CODECS: HashMap<(FieldType, Endianness), Codec> = {
        let table = codec_table![
            (U8, Big, read_u8, write_u8),
            (I8, Big, read_i8, write_i8),
            (U16, Little, read_u16_le, write_u16_le),
            (U16, Big, read_u16_be, write_u16_be),
            (I16, Little, read_i16_le, write_i16_le),
            (I16, Big, read_i16_be, write_i16_be),
            (U32, Little, read_u32_le, write_u32_le),
            (U32, Big, read_u32_be, write_u32_be),
            (I32, Little, read_i32_le, write_i32_le),
            (I32, Big, read_i32_be, write_i32_be),
            (U64, Little, read_u64_le, write_u64_le),
            (U64, Big, read_u64_be, write_u64_be),
            (I64, Little, read_i64_le, write_i64_le),
            (I64, Big, read_i64_be, write_i64_be),
            (F32, Little, read_f32_le, write_f32_le),
            (F32, Big, read_f32_be, write_f32_be),
            (F64, Little, read_f64_le, write_f64_le),
            (F64, Big, read_f64_be, write_f64_be),
        ];
        table
            .into_iter()
            .map(|codec| ((codec.field_type, codec.endianness), codec))
            .collect()
    };
}

/// Find the codec for a type and byte order.
/// Single-byte types share one codec regardless of the requested order.
pub fn lookup(field_type: FieldType, endianness: Endianness) -> Option<&'static Codec> {
    let endianness = if field_type.has_endianness() {
        endianness
    } else {
        Endianness::Big
    };
    CODECS.get(&(field_type, endianness))
}

/// Number of registered codecs
pub fn registered() -> usize {
    CODECS.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitwise::types::cells;

    const CHECKED: Access = Access {
        no_assert: false,
        int64_mode: Int64Mode::Strict,
    };

    fn read_one(field_type: FieldType, endianness: Endianness, raw: &mut [u8]) -> Value<'static> {
        let codec = lookup(field_type, endianness).unwrap();
        (codec.read)(cells(raw), 0, CHECKED)
            .unwrap()
            .unwrap()
            .into_owned()
    }

    fn write_one(field_type: FieldType, endianness: Endianness, value: Value<'_>, size: usize) -> Vec<u8> {
        let codec = lookup(field_type, endianness).unwrap();
        let mut raw = vec![0u8; size];
        (codec.write)(cells(&mut raw), 0, &value, false).unwrap();
        raw
    }

    #[test]
    fn test_registry_complete() {
        assert_eq!(registered(), 18);
        for field_type in FieldType::ALL {
            for endianness in [Endianness::Big, Endianness::Little] {
                let codec = lookup(field_type, endianness).unwrap();
                assert_eq!(codec.field_type, field_type);
            }
        }
        assert_eq!(lookup(FieldType::U8, Endianness::Little).unwrap().endianness, Endianness::Big);
    }

    #[test]
    fn test_signed_reads() {
        assert_eq!(read_one(FieldType::I8, Endianness::Big, &mut [0xF3]), Value::Int(-13));
        assert_eq!(read_one(FieldType::I16, Endianness::Little, &mut [0x00, 0xFF]), Value::Int(-256));
        assert_eq!(read_one(FieldType::I16, Endianness::Big, &mut [0x00, 0xFF]), Value::Int(255));
        assert_eq!(
            read_one(FieldType::I32, Endianness::Little, &mut [0, 0, 0, 0xFF]),
            Value::Int(-16777216)
        );
        assert_eq!(read_one(FieldType::I32, Endianness::Big, &mut [0, 0, 0, 0xFF]), Value::Int(255));
    }

    #[test]
    fn test_unsigned_reads() {
        assert_eq!(read_one(FieldType::U8, Endianness::Little, &mut [0xF3]), Value::UInt(243));
        assert_eq!(read_one(FieldType::U16, Endianness::Little, &mut [0x00, 0xFF]), Value::UInt(0xFF00));
        assert_eq!(read_one(FieldType::U16, Endianness::Big, &mut [0xFF, 0x00]), Value::UInt(0xFF00));
        assert_eq!(
            read_one(FieldType::U32, Endianness::Little, &mut [4, 5, 6, 7]),
            Value::UInt(0x07060504)
        );
    }

    #[test]
    fn test_float_reads() {
        let pi = read_one(FieldType::F64, Endianness::Little, &mut [0x97, 0xd1, 0x7e, 0x5a, 0xfb, 0x21, 0x09, 0x40]);
        assert!((pi.as_f64().unwrap() - 3.1415927).abs() < 1e-6);

        let neg = read_one(FieldType::F32, Endianness::Big, &mut [0xc1, 0x45, 0x70, 0xa4]);
        assert!((neg.as_f64().unwrap() + 12.34).abs() < 1e-5);
    }

    #[test]
    fn test_writes() {
        assert_eq!(write_one(FieldType::U32, Endianness::Big, Value::UInt(0x01020304), 4), vec![1, 2, 3, 4]);
        assert_eq!(write_one(FieldType::U32, Endianness::Little, Value::UInt(0x01020304), 4), vec![4, 3, 2, 1]);
        assert_eq!(write_one(FieldType::I16, Endianness::Big, Value::Int(-2), 2), vec![0xFF, 0xFE]);
        assert_eq!(
            write_one(FieldType::F32, Endianness::Little, Value::Float(3.14), 4),
            vec![0xc3, 0xf5, 0x48, 0x40]
        );
        assert_eq!(
            write_one(FieldType::U64, Endianness::Little, Value::UInt(1), 8),
            vec![1, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_float32_nan_payload_survives() {
        let codec = lookup(FieldType::F32, Endianness::Big).unwrap();
        let mut raw = [0x7f, 0x80, 0x00, 0x01];
        let value = (codec.read)(cells(&mut raw), 0, CHECKED)
            .unwrap()
            .unwrap()
            .into_owned();
        let mut out = [0u8; 4];
        (codec.write)(cells(&mut out), 0, &value, false).unwrap();
        assert_eq!(out, [0x7f, 0x80, 0x00, 0x01]);
    }

    #[test]
    fn test_short_input_is_decode_error() {
        let err = parse_number(&[1u8], FieldType::U16, number::be_u16).unwrap_err();
        assert!(matches!(err, ElementError::Decode { field_type: FieldType::U16, .. }));
    }

    #[test]
    fn test_write_range_checks() {
        let codec = lookup(FieldType::U8, Endianness::Big).unwrap();
        let mut raw = [0u8; 1];
        assert!(matches!(
            (codec.write)(cells(&mut raw), 0, &Value::Int(300), false),
            Err(ElementError::ValueOutOfRange { .. })
        ));
        (codec.write)(cells(&mut raw), 0, &Value::Int(300), true).unwrap();
        assert_eq!(raw, [44]);
    }

    #[test]
    fn test_bounds() {
        let codec = lookup(FieldType::U32, Endianness::Big).unwrap();
        let mut raw = [1u8, 2];
        assert!(matches!(
            (codec.read)(cells(&mut raw), 0, CHECKED),
            Err(ElementError::BoundsViolation { .. })
        ));
        let loose = Access::new(true, Int64Mode::Strict);
        assert_eq!(
            (codec.read)(cells(&mut raw), 0, loose).unwrap(),
            Some(Value::UInt(0x01020000))
        );
    }
}
