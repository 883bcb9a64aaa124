// Struct and field configuration
// Accepts the same keys as the JSON form: name, littleEndian, noAssert, int64mode

use super::error::Result;
use crate::bitwise::{Endianness, Int64Mode};
use serde::{Deserialize, Serialize};

/// Options recognized when a struct is created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructOptions {
    /// Struct name, used in diagnostics only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Byte order for fields declared without an explicit one
    pub little_endian: bool,

    /// Disable bounds and range checks by default
    pub no_assert: bool,

    /// Struct-wide 64-bit handling mode
    #[serde(rename = "int64mode", skip_serializing_if = "Option::is_none")]
    pub int64_mode: Option<Int64Mode>,
}

impl StructOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn little_endian(mut self, little_endian: bool) -> Self {
        self.little_endian = little_endian;
        self
    }

    pub fn no_assert(mut self, no_assert: bool) -> Self {
        self.no_assert = no_assert;
        self
    }

    pub fn int64_mode(mut self, mode: Int64Mode) -> Self {
        self.int64_mode = Some(mode);
        self
    }

    pub fn endianness(&self) -> Endianness {
        Endianness::from_little(self.little_endian)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Per-field options, merged into the field as it is declared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOptions {
    #[serde(rename = "int64mode", skip_serializing_if = "Option::is_none")]
    pub int64_mode: Option<Int64Mode>,
}

impl FieldOptions {
    pub fn int64_mode(mode: Int64Mode) -> Self {
        Self {
            int64_mode: Some(mode),
        }
    }

    /// Keys set in `other` win
    pub fn merge(&mut self, other: FieldOptions) {
        if other.int64_mode.is_some() {
            self.int64_mode = other.int64_mode;
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<Int64Mode> for FieldOptions {
    fn from(mode: Int64Mode) -> Self {
        Self::int64_mode(mode)
    }
}
