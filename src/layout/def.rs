// Struct definitions and the declaration phase that lays them out
//
// Fields are appended in declaration order; each one starts where the
// previous one ended. There is no padding and no reordering.

use super::error::{Result, StructError};
use super::field::{Field, FieldSpec};
use super::options::StructOptions;
use crate::bitwise::{self, int64, Access, Endianness, FieldType, Int64Mode};
use crate::memmap::MemoryMap;
use std::collections::HashMap;

/// An immutable binary struct layout
#[derive(Debug, Clone)]
pub struct StructDef {
    name: Option<String>,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    size: usize,
    endianness: Endianness,
    no_assert: bool,
    int64_mode: Option<Int64Mode>,
}

impl StructDef {
    /// Start declaring a big-endian struct with default options
    pub fn builder() -> StructBuilder {
        StructBuilder::new(StructOptions::default())
    }

    pub fn with_options(options: StructOptions) -> StructBuilder {
        StructBuilder::new(options)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Total size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Default byte order for fields declared without one
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn no_assert(&self) -> bool {
        self.no_assert
    }

    /// The struct-level int64 mode, if one was configured
    pub fn int64_mode(&self) -> Option<Int64Mode> {
        self.int64_mode
    }

    /// Fail unless the layout adds up to `expected` bytes
    pub fn check_size(&self, expected: usize) -> Result<&Self> {
        if self.size != expected {
            return Err(StructError::SizeMismatch {
                expected,
                actual: self.size,
            });
        }
        Ok(self)
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<&Field> {
        self.field(name)
            .ok_or_else(|| StructError::UnknownField(name.to_string()))
    }

    /// Access settings for one field, resolving its int64 mode now
    pub(crate) fn access(&self, field: &Field, no_assert: bool) -> Access {
        Access::new(
            no_assert,
            int64::resolve_mode(field.int64_mode, self.int64_mode),
        )
    }
}

/// Declaration phase of a [`StructDef`].
///
/// Every declaration method consumes and returns the builder so calls chain.
/// The first invalid declaration is remembered and reported by [`build`].
///
/// [`build`]: StructBuilder::build
#[derive(Debug)]
pub struct StructBuilder {
    def: StructDef,
    error: Option<StructError>,
}

impl StructBuilder {
    pub fn new(options: StructOptions) -> Self {
        Self {
            def: StructDef {
                endianness: options.endianness(),
                name: options.name,
                fields: Vec::new(),
                index: HashMap::new(),
                size: 0,
                no_assert: options.no_assert,
                int64_mode: options.int64_mode,
            },
            error: None,
        }
    }

    /// Bytes laid out so far
    pub fn size(&self) -> usize {
        self.def.size
    }

    /// Append a field of `field_type` at the current end of the struct
    pub fn field(
        mut self,
        field_type: FieldType,
        endianness: Endianness,
        spec: impl Into<FieldSpec>,
    ) -> Self {
        if self.error.is_none() {
            if let Err(err) = self.push(field_type, endianness, spec.into()) {
                self.error = Some(err);
            }
        }
        self
    }

    fn push(&mut self, field_type: FieldType, endianness: Endianness, spec: FieldSpec) -> Result<()> {
        let name = spec
            .name
            .unwrap_or_else(|| self.def.fields.len().to_string());
        if self.def.index.contains_key(&name) {
            return Err(StructError::DuplicateField(name));
        }
        let invalid = |reason: String| StructError::InvalidArgument {
            field: name.clone(),
            reason,
        };
        let codec = bitwise::lookup(field_type, endianness)
            .ok_or_else(|| invalid(format!("no codec for {} ({})", field_type, endianness)))?;
        if spec.options.int64_mode.is_some() && !field_type.is_int64() {
            return Err(invalid(format!("int64 mode given for a {} field", field_type)));
        }
        if let Some(default) = &spec.default {
            // The default has to encode cleanly into the field
            let scratch = MemoryMap::new_with_size(field_type.size());
            (codec.write)(scratch.cells(), 0, default, false)
                .map_err(|err| invalid(format!("default value {}: {}", default, err)))?;
        }

        let offset = self.def.size;
        tracing::trace!(
            "Field {} ({}, {}) at offset {}",
            name,
            field_type,
            codec.endianness,
            offset
        );
        self.def.size += field_type.size();
        self.def.index.insert(name.clone(), self.def.fields.len());
        self.def.fields.push(Field {
            name,
            offset,
            default: spec.default,
            int64_mode: spec.options.int64_mode,
            codec,
        });
        Ok(())
    }

    pub fn u8(self, spec: impl Into<FieldSpec>) -> Self {
        self.field(FieldType::U8, Endianness::Big, spec)
    }

    /// Alias for [`u8`](StructBuilder::u8)
    pub fn byte(self, spec: impl Into<FieldSpec>) -> Self {
        self.u8(spec)
    }

    pub fn i8(self, spec: impl Into<FieldSpec>) -> Self {
        self.field(FieldType::I8, Endianness::Big, spec)
    }

    /// Finish the declaration phase
    pub fn build(self) -> Result<StructDef> {
        if let Some(err) = self.error {
            return Err(err);
        }
        tracing::debug!(
            "Struct {} laid out: {} fields, {} bytes",
            self.def.name.as_deref().unwrap_or("<anonymous>"),
            self.def.fields.len(),
            self.def.size
        );
        Ok(self.def)
    }
}

macro_rules! endian_declarations {
    ($($field_type:ident => $default:ident, $le:ident, $be:ident;)+) => {
        impl StructBuilder {
            $(
                #[doc = concat!("Declare a ", stringify!($default), " field in the struct's default byte order")]
                pub fn $default(self, spec: impl Into<FieldSpec>) -> Self {
                    let endianness = self.def.endianness;
                    self.field(FieldType::$field_type, endianness, spec)
                }

                #[doc = concat!("Declare a little-endian ", stringify!($default), " field")]
                pub fn $le(self, spec: impl Into<FieldSpec>) -> Self {
                    self.field(FieldType::$field_type, Endianness::Little, spec)
                }

                #[doc = concat!("Declare a big-endian ", stringify!($default), " field")]
                pub fn $be(self, spec: impl Into<FieldSpec>) -> Self {
                    self.field(FieldType::$field_type, Endianness::Big, spec)
                }
            )+
        }
    };
}

endian_declarations! {
    U16 => u16, u16_le, u16_be;
    I16 => i16, i16_le, i16_be;
    U32 => u32, u32_le, u32_be;
    I32 => i32, i32_le, i32_be;
    U64 => u64, u64_le, u64_be;
    I64 => i64, i64_le, i64_be;
    F32 => f32, f32_le, f32_be;
    F64 => f64, f64_le, f64_be;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_offsets() {
        let def = StructDef::builder()
            .u8("a")
            .u16_le("b")
            .u32_be("c")
            .u64_le("d")
            .build()
            .unwrap();

        let offsets: Vec<usize> = def.fields().iter().map(|f| f.offset()).collect();
        assert_eq!(offsets, vec![0, 1, 3, 7]);
        assert_eq!(def.size(), 15);
        assert!(def.check_size(15).is_ok());
    }

    #[test]
    fn test_check_size() {
        let def = StructDef::builder().u16(0x0102u16).build().unwrap();
        assert!(def.check_size(2).is_ok());
        assert!(matches!(
            def.check_size(7),
            Err(StructError::SizeMismatch {
                expected: 7,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_positional_names() {
        let def = StructDef::builder().byte(1u8).byte(()).byte("x").build().unwrap();
        let names: Vec<&str> = def.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["0", "1", "x"]);
    }

    #[test]
    fn test_default_endianness_fixed_at_declaration() {
        let def = StructDef::with_options(StructOptions::new().little_endian(true))
            .u32("le")
            .f64_be("be")
            .u8("byte")
            .build()
            .unwrap();
        assert_eq!(def.field("le").unwrap().endianness(), Endianness::Little);
        assert_eq!(def.field("be").unwrap().endianness(), Endianness::Big);
        assert_eq!(def.endianness(), Endianness::Little);

        let def = StructDef::builder().i16("x").build().unwrap();
        assert_eq!(def.field("x").unwrap().endianness(), Endianness::Big);
    }

    #[test]
    fn test_field_metadata() {
        let def = StructDef::builder()
            .u64_be(("ts", Int64Mode::Copy))
            .build()
            .unwrap();
        let field = def.field("ts").unwrap();
        assert_eq!(field.field_type(), FieldType::U64);
        assert_eq!(field.size(), 8);
        assert_eq!(field.int64_mode(), Some(Int64Mode::Copy));
        assert_eq!(field.default_value(), None);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = StructDef::builder().u8("a").u16("a").build().unwrap_err();
        assert!(matches!(err, StructError::DuplicateField(name) if name == "a"));
    }

    #[test]
    fn test_invalid_defaults() {
        let err = StructDef::builder().u16(("x", vec![1u8, 2])).build().unwrap_err();
        assert!(matches!(err, StructError::InvalidArgument { ref field, .. } if field == "x"));

        let err = StructDef::builder().u8(300u16).build().unwrap_err();
        assert!(matches!(err, StructError::InvalidArgument { .. }));

        let err = StructDef::builder().i64(vec![1u8, 2, 3]).build().unwrap_err();
        assert!(err.to_string().contains("8 bytes long"));

        assert!(StructDef::builder().u64([1u8; 8]).build().is_ok());
        assert!(StructDef::builder().i64(-1i64).build().is_ok());
    }

    #[test]
    fn test_int64_mode_on_narrow_field() {
        let err = StructDef::builder()
            .u32(("n", Int64Mode::Lossy))
            .build()
            .unwrap_err();
        assert!(matches!(err, StructError::InvalidArgument { .. }));
    }

    #[test]
    fn test_first_error_wins() {
        let err = StructDef::builder()
            .u8("a")
            .u8("a")
            .u8(1000u32)
            .build()
            .unwrap_err();
        assert!(matches!(err, StructError::DuplicateField(_)));
    }

    #[test]
    fn test_mode_resolution() {
        let def = StructDef::with_options(StructOptions::new().int64_mode(Int64Mode::Lossy))
            .u64("inherits")
            .u64(("own", Int64Mode::Slice))
            .build()
            .unwrap();
        let inherits = def.field("inherits").unwrap();
        let own = def.field("own").unwrap();
        assert_eq!(def.access(inherits, false).int64_mode, Int64Mode::Lossy);
        assert_eq!(def.access(own, true), Access::new(true, Int64Mode::Slice));
    }

    #[test]
    fn test_lookup() {
        let def = StructDef::builder().u8("a").build().unwrap();
        assert!(def.lookup("a").is_ok());
        assert!(matches!(def.lookup("b"), Err(StructError::UnknownField(_))));
    }
}
