// Common type definitions for binary struct fields

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;

/// Endianness for multi-byte values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    pub fn is_big(&self) -> bool {
        matches!(self, Endianness::Big)
    }

    pub fn is_little(&self) -> bool {
        matches!(self, Endianness::Little)
    }

    pub fn from_little(little_endian: bool) -> Self {
        if little_endian {
            Endianness::Little
        } else {
            Endianness::Big
        }
    }
}

impl Default for Endianness {
    fn default() -> Self {
        Endianness::Big
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Big => write!(f, "big endian"),
            Endianness::Little => write!(f, "little endian"),
        }
    }
}

/// Primitive numeric type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl FieldType {
    pub const ALL: [FieldType; 10] = [
        FieldType::U8,
        FieldType::I8,
        FieldType::U16,
        FieldType::I16,
        FieldType::U32,
        FieldType::I32,
        FieldType::U64,
        FieldType::I64,
        FieldType::F32,
        FieldType::F64,
    ];

    /// Size of the field in bytes
    pub fn size(&self) -> usize {
        match self {
            FieldType::U8 | FieldType::I8 => 1,
            FieldType::U16 | FieldType::I16 => 2,
            FieldType::U32 | FieldType::I32 | FieldType::F32 => 4,
            FieldType::U64 | FieldType::I64 | FieldType::F64 => 8,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            FieldType::I8
                | FieldType::I16
                | FieldType::I32
                | FieldType::I64
                | FieldType::F32
                | FieldType::F64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, FieldType::F32 | FieldType::F64)
    }

    /// 64-bit integers are subject to the int64 handling mode
    pub fn is_int64(&self) -> bool {
        matches!(self, FieldType::U64 | FieldType::I64)
    }

    /// Single bytes have no byte order
    pub fn has_endianness(&self) -> bool {
        self.size() > 1
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::U8 => "uint8",
            FieldType::I8 => "int8",
            FieldType::U16 => "uint16",
            FieldType::I16 => "int16",
            FieldType::U32 => "uint32",
            FieldType::I32 => "int32",
            FieldType::U64 => "uint64",
            FieldType::I64 => "int64",
            FieldType::F32 => "float",
            FieldType::F64 => "double",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded field value, or the data source for an encode.
///
/// `Float32` keeps a float32 field's exact bits, so NaN payloads survive a
/// read followed by a write. `Slice` borrows the 8 bytes of a slice-mode 64-bit field straight out of
/// the source buffer, so writes through it land in that buffer.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value<'a> {
    Int(i64),
    UInt(u64),
    Float(f64),
    Float32(f32),
    Bytes(Vec<u8>),
    Slice(&'a [Cell<u8>]),
}

impl<'a> Value<'a> {
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::UInt(_) | Value::Float(_) | Value::Float32(_)
        )
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_) | Value::Slice(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            Value::Float(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => {
                Some(v as i64)
            }
            Value::Float32(v) => Value::Float(v.into()).as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(v) => u64::try_from(v).ok(),
            Value::UInt(v) => Some(v),
            Value::Float(v) if v.fract() == 0.0 && v >= 0.0 && v < u64::MAX as f64 => {
                Some(v as u64)
            }
            Value::Float32(v) => Value::Float(v.into()).as_u64(),
            _ => None,
        }
    }

    /// The value as a double, the way a 53-bit number type would see it
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(v) => Some(v as f64),
            Value::UInt(v) => Some(v as f64),
            Value::Float(v) => Some(v),
            Value::Float32(v) => Some(v.into()),
            _ => None,
        }
    }

    /// Snapshot of the bytes; for `Slice` this reads the aliased buffer now
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Value::Bytes(b) => Some(b.clone()),
            Value::Slice(cells) => Some(cells.iter().map(Cell::get).collect()),
            _ => None,
        }
    }

    /// Detach from the source buffer
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Int(v) => Value::Int(v),
            Value::UInt(v) => Value::UInt(v),
            Value::Float(v) => Value::Float(v),
            Value::Float32(v) => Value::Float32(v),
            Value::Bytes(b) => Value::Bytes(b),
            Value::Slice(cells) => Value::Bytes(cells.iter().map(Cell::get).collect()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "double",
            Value::Float32(_) => "float",
            Value::Bytes(_) => "byte buffer",
            Value::Slice(_) => "buffer slice",
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Int(a), UInt(b)) | (UInt(b), Int(a)) => i128::from(*a) == i128::from(*b),
            (Float(a), Float(b)) => a == b,
            (Float32(a), Float32(b)) => a == b,
            (Float32(f), n) | (n, Float32(f)) if n.is_number() => n.as_f64() == Some(f64::from(*f)),
            (Float(f), n) | (n, Float(f)) if n.is_number() => n.as_f64() == Some(*f),
            (a, b) if a.is_bytes() && b.is_bytes() => a.to_bytes() == b.to_bytes(),
            _ => false,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Bytes(_) | Value::Slice(_) => {
                for byte in self.to_bytes().unwrap_or_default() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

macro_rules! value_from {
    ($variant:ident: $($t:ty),+) => {
        $(
            impl From<$t> for Value<'_> {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )+
    };
}

value_from!(Int: i8, i16, i32, i64);
value_from!(UInt: u8, u16, u32, u64);
value_from!(Float: f64);
value_from!(Float32: f32);

impl From<Vec<u8>> for Value<'_> {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<[u8; 8]> for Value<'_> {
    fn from(v: [u8; 8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<'a> From<&'a [Cell<u8>]> for Value<'a> {
    fn from(v: &'a [Cell<u8>]) -> Self {
        Value::Slice(v)
    }
}

/// View a mutable byte slice as a shareable cell buffer, without copying
pub fn cells(bytes: &mut [u8]) -> &[Cell<u8>] {
    Cell::from_mut(bytes).as_slice_of_cells()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endianness() {
        assert!(Endianness::default().is_big());
        assert!(Endianness::from_little(true).is_little());
        assert_eq!(Endianness::Little.to_string(), "little endian");
    }

    #[test]
    fn test_field_type_sizes() {
        let sizes: Vec<usize> = FieldType::ALL.iter().map(|t| t.size()).collect();
        assert_eq!(sizes, vec![1, 1, 2, 2, 4, 4, 8, 8, 4, 8]);
        assert!(!FieldType::U8.has_endianness());
        assert!(FieldType::F32.has_endianness());
        assert!(FieldType::I64.is_int64());
        assert!(!FieldType::F64.is_int64());
    }

    #[test]
    fn test_numeric_equality() {
        assert_eq!(Value::Int(258), Value::UInt(258));
        assert_eq!(Value::UInt(3), Value::Float(3.0));
        assert_ne!(Value::Int(-1), Value::UInt(u64::MAX));
        assert_ne!(Value::Int(1), Value::Bytes(vec![1]));
    }

    #[test]
    fn test_float32_keeps_bits() {
        let snan = f32::from_bits(0x7f80_0001);
        match Value::from(snan).into_owned() {
            Value::Float32(v) => assert_eq!(v.to_bits(), 0x7f80_0001),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(Value::from(1.5f32), Value::Float(1.5));
        assert_eq!(Value::from(2.0f32), Value::UInt(2));
        assert_eq!(Value::from(2.0f32).as_i64(), Some(2));
    }

    #[test]
    fn test_slice_aliases_buffer() {
        let mut raw = [1u8, 2, 3, 4];
        let buf = cells(&mut raw);
        let slice = Value::Slice(&buf[1..3]);
        buf[2].set(9);
        assert_eq!(slice.to_bytes(), Some(vec![2, 9]));
        assert_eq!(slice, Value::Bytes(vec![2, 9]));

        let owned = slice.into_owned();
        buf[1].set(0);
        assert_eq!(owned.to_bytes(), Some(vec![2, 9]));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::UInt(5).as_i64(), Some(5));
        assert_eq!(Value::Int(-5).as_u64(), None);
        assert_eq!(Value::Float(2.5).as_i64(), None);
        assert_eq!(Value::from(7u16).as_f64(), Some(7.0));
        assert_eq!(Value::from([0u8; 8]).to_string(), "0000000000000000");
    }
}
