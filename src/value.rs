//! Typed live values read from or written to a variable's address.

use std::fmt;

use crate::error::{LinkError, Result};
use crate::types::VarType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    Float32(f32),
}

impl Value {
    /// Decodes a little-endian value of `var_type` from the start of `bytes`.
    ///
    /// `address` is only used for error reporting.
    pub fn decode(var_type: VarType, address: u32, bytes: &[u8]) -> Result<Self> {
        let width = var_type.width();
        if bytes.len() < width {
            return Err(LinkError::ShortRead {
                address,
                expected: width,
                actual: bytes.len(),
            });
        }

        let value = match var_type {
            VarType::UInt8 => Self::UInt8(bytes[0]),
            VarType::Int8 => Self::Int8(bytes[0] as i8),
            VarType::UInt16 => Self::UInt16(u16::from_le_bytes([bytes[0], bytes[1]])),
            VarType::Int16 => Self::Int16(i16::from_le_bytes([bytes[0], bytes[1]])),
            VarType::UInt32 => {
                Self::UInt32(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            VarType::Int32 => {
                Self::Int32(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            VarType::Float32 => {
                Self::Float32(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
        };
        Ok(value)
    }

    /// Converts a UI number into a value of `var_type`.
    ///
    /// Integer types round to the nearest integer. Values outside the
    /// representable range of the type, and non-finite input, are rejected
    /// rather than saturated.
    pub fn from_f64(var_type: VarType, value: f64) -> Result<Self> {
        let out_of_range = || LinkError::ValueOutOfRange { value, var_type };

        if !value.is_finite() {
            return Err(out_of_range());
        }

        if var_type.is_float() {
            if value.abs() > f64::from(f32::MAX) {
                return Err(out_of_range());
            }
            return Ok(Self::Float32(value as f32));
        }

        let rounded = value.round();
        let (min, max) = integer_range(var_type);
        if rounded < min || rounded > max {
            return Err(out_of_range());
        }

        let converted = match var_type {
            VarType::UInt8 => Self::UInt8(rounded as u8),
            VarType::Int8 => Self::Int8(rounded as i8),
            VarType::UInt16 => Self::UInt16(rounded as u16),
            VarType::Int16 => Self::Int16(rounded as i16),
            VarType::UInt32 => Self::UInt32(rounded as u32),
            VarType::Int32 => Self::Int32(rounded as i32),
            VarType::Float32 => Self::Float32(rounded as f32),
        };
        Ok(converted)
    }

    pub fn var_type(&self) -> VarType {
        match self {
            Self::UInt8(_) => VarType::UInt8,
            Self::Int8(_) => VarType::Int8,
            Self::UInt16(_) => VarType::UInt16,
            Self::Int16(_) => VarType::Int16,
            Self::UInt32(_) => VarType::UInt32,
            Self::Int32(_) => VarType::Int32,
            Self::Float32(_) => VarType::Float32,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::UInt8(v) => f64::from(v),
            Self::Int8(v) => f64::from(v),
            Self::UInt16(v) => f64::from(v),
            Self::Int16(v) => f64::from(v),
            Self::UInt32(v) => f64::from(v),
            Self::Int32(v) => f64::from(v),
            Self::Float32(v) => f64::from(v),
        }
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        match *self {
            Self::UInt8(v) => vec![v],
            Self::Int8(v) => v.to_le_bytes().to_vec(),
            Self::UInt16(v) => v.to_le_bytes().to_vec(),
            Self::Int16(v) => v.to_le_bytes().to_vec(),
            Self::UInt32(v) => v.to_le_bytes().to_vec(),
            Self::Int32(v) => v.to_le_bytes().to_vec(),
            Self::Float32(v) => v.to_le_bytes().to_vec(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt8(v) => write!(f, "{}", v),
            Self::Int8(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::Float32(v) => write!(f, "{:.3}", v),
        }
    }
}

fn integer_range(var_type: VarType) -> (f64, f64) {
    match var_type {
        VarType::UInt8 => (0.0, f64::from(u8::MAX)),
        VarType::Int8 => (f64::from(i8::MIN), f64::from(i8::MAX)),
        VarType::UInt16 => (0.0, f64::from(u16::MAX)),
        VarType::Int16 => (f64::from(i16::MIN), f64::from(i16::MAX)),
        VarType::UInt32 => (0.0, f64::from(u32::MAX)),
        VarType::Int32 => (f64::from(i32::MIN), f64::from(i32::MAX)),
        VarType::Float32 => (f64::from(f32::MIN), f64::from(f32::MAX)),
    }
}
