// Field descriptors and declaration arguments

use super::options::FieldOptions;
use crate::bitwise::elements::Result as ElementResult;
use crate::bitwise::{Access, Codec, Endianness, FieldType, Int64Mode, Value};
use std::cell::Cell;

/// One declaration argument: a default value, a name, or options
#[derive(Debug, Clone, PartialEq)]
pub enum FieldArg {
    Default(Value<'static>),
    Name(String),
    Options(FieldOptions),
}

impl From<&str> for FieldArg {
    fn from(name: &str) -> Self {
        FieldArg::Name(name.to_string())
    }
}

impl From<String> for FieldArg {
    fn from(name: String) -> Self {
        FieldArg::Name(name)
    }
}

impl From<Value<'static>> for FieldArg {
    fn from(value: Value<'static>) -> Self {
        FieldArg::Default(value)
    }
}

impl From<FieldOptions> for FieldArg {
    fn from(options: FieldOptions) -> Self {
        FieldArg::Options(options)
    }
}

impl From<Int64Mode> for FieldArg {
    fn from(mode: Int64Mode) -> Self {
        FieldArg::Options(mode.into())
    }
}

macro_rules! default_arg_from {
    ($($t:ty),+) => {
        $(
            impl From<$t> for FieldArg {
                fn from(value: $t) -> Self {
                    FieldArg::Default(Value::from(value))
                }
            }

            impl From<$t> for FieldSpec {
                fn from(value: $t) -> Self {
                    FieldSpec::from(FieldArg::from(value))
                }
            }
        )+
    };
}

default_arg_from!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64, Vec<u8>, [u8; 8]);

/// Everything a declaration call says about its field.
/// Later arguments override earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSpec {
    pub name: Option<String>,
    pub default: Option<Value<'static>>,
    pub options: FieldOptions,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<Value<'static>>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_mode(mut self, mode: Int64Mode) -> Self {
        self.options.int64_mode = Some(mode);
        self
    }

    pub fn apply(&mut self, arg: FieldArg) {
        match arg {
            FieldArg::Default(value) => self.default = Some(value),
            FieldArg::Name(name) => self.name = Some(name),
            FieldArg::Options(options) => self.options.merge(options),
        }
    }
}

impl From<()> for FieldSpec {
    fn from(_: ()) -> Self {
        FieldSpec::default()
    }
}

impl From<FieldArg> for FieldSpec {
    fn from(arg: FieldArg) -> Self {
        let mut spec = FieldSpec::default();
        spec.apply(arg);
        spec
    }
}

impl From<&str> for FieldSpec {
    fn from(name: &str) -> Self {
        FieldSpec::named(name)
    }
}

impl From<String> for FieldSpec {
    fn from(name: String) -> Self {
        FieldSpec::named(name)
    }
}

impl From<Value<'static>> for FieldSpec {
    fn from(value: Value<'static>) -> Self {
        FieldSpec::default().with_default(value)
    }
}

impl From<Int64Mode> for FieldSpec {
    fn from(mode: Int64Mode) -> Self {
        FieldSpec::default().with_mode(mode)
    }
}

impl From<FieldOptions> for FieldSpec {
    fn from(options: FieldOptions) -> Self {
        FieldSpec::from(FieldArg::Options(options))
    }
}

impl From<Vec<FieldArg>> for FieldSpec {
    fn from(args: Vec<FieldArg>) -> Self {
        let mut spec = FieldSpec::default();
        for arg in args {
            spec.apply(arg);
        }
        spec
    }
}

impl<A, B> From<(A, B)> for FieldSpec
where
    A: Into<FieldArg>,
    B: Into<FieldArg>,
{
    fn from((a, b): (A, B)) -> Self {
        FieldSpec::from(vec![a.into(), b.into()])
    }
}

impl<A, B, C> From<(A, B, C)> for FieldSpec
where
    A: Into<FieldArg>,
    B: Into<FieldArg>,
    C: Into<FieldArg>,
{
    fn from((a, b, c): (A, B, C)) -> Self {
        FieldSpec::from(vec![a.into(), b.into(), c.into()])
    }
}

/// A declared field: fixed type, byte order and offset within its struct
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) offset: usize,
    pub(crate) default: Option<Value<'static>>,
    pub(crate) int64_mode: Option<Int64Mode>,
    pub(crate) codec: &'static Codec,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.codec.field_type
    }

    pub fn endianness(&self) -> Endianness {
        self.codec.endianness
    }

    pub fn size(&self) -> usize {
        self.codec.field_type.size()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn default_value(&self) -> Option<&Value<'static>> {
        self.default.as_ref()
    }

    /// The field-level int64 override, if any
    pub fn int64_mode(&self) -> Option<Int64Mode> {
        self.int64_mode
    }

    /// Decode this field from a struct starting at `base`
    pub fn read<'a>(
        &self,
        buf: &'a [Cell<u8>],
        base: usize,
        access: Access,
    ) -> ElementResult<Option<Value<'a>>> {
        (self.codec.read)(buf, base.saturating_add(self.offset), access)
    }

    /// Encode `value` into a struct starting at `base`
    pub fn write(
        &self,
        buf: &[Cell<u8>],
        base: usize,
        value: &Value<'_>,
        no_assert: bool,
    ) -> ElementResult<()> {
        (self.codec.write)(buf, base.saturating_add(self.offset), value, no_assert)
    }
}
