// Errors raised while declaring layouts and accessing structs

use crate::bitwise::ElementError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructError {
    #[error("Wrong size: struct is {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Field {field} holds {actual}, expected {expected}")]
    ValueMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid argument for field {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    #[error("No such field: {0}")]
    UnknownField(String),

    #[error("Field {0} is not readable in its int64 mode")]
    Unreadable(String),

    #[error("Failed to parse struct options: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Element(#[from] ElementError),
}

pub type Result<T> = std::result::Result<T, StructError>;
