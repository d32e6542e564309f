use std::io;
use thiserror::Error;

use crate::types::VarType;

/// Errors raised outside of candidate decoding: live access, value
/// conversion, region selection and image I/O.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Variable '{name}' is read-only")]
    ReadOnly { name: String },

    #[error("Type mismatch: variable is {expected}, value is {actual}")]
    TypeMismatch { expected: VarType, actual: VarType },

    #[error("Value {value} does not fit in {var_type}")]
    ValueOutOfRange { value: f64, var_type: VarType },

    #[error("Address 0x{address:08X} (+{width} bytes) is outside 0x{base:08X}..0x{end:08X}")]
    AddressOutOfRange {
        address: u32,
        width: usize,
        base: u32,
        end: u64,
    },

    #[error("Short read at 0x{address:08X}: expected {expected} bytes, got {actual}")]
    ShortRead {
        address: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Region {start}..{end} exceeds image size {size}")]
    InvalidRegion { start: usize, end: usize, size: usize },

    #[error("Transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, LinkError>;
