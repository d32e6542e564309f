use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarType {
    #[serde(rename = "UINT8")]
    UInt8 = 0,
    #[serde(rename = "INT8")]
    Int8 = 1,
    #[serde(rename = "UINT16")]
    UInt16 = 2,
    #[serde(rename = "INT16")]
    Int16 = 3,
    #[serde(rename = "UINT32")]
    UInt32 = 4,
    #[serde(rename = "INT32")]
    Int32 = 5,
    #[serde(rename = "FLOAT")]
    Float32 = 6,
}

impl VarType {
    pub const ALL: [VarType; 7] = [
        Self::UInt8,
        Self::Int8,
        Self::UInt16,
        Self::Int16,
        Self::UInt32,
        Self::Int32,
        Self::Float32,
    ];

    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::UInt8),
            1 => Some(Self::Int8),
            2 => Some(Self::UInt16),
            3 => Some(Self::Int16),
            4 => Some(Self::UInt32),
            5 => Some(Self::Int32),
            6 => Some(Self::Float32),
            _ => None,
        }
    }

    #[must_use]
    pub const fn tag(&self) -> u8 {
        *self as u8
    }

    /// Number of bytes read or written at the variable's address.
    #[must_use]
    pub const fn width(&self) -> usize {
        match self {
            Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
        }
    }

    #[must_use]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Float32)
    }

    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UInt8 => "UINT8",
            Self::Int8 => "INT8",
            Self::UInt16 => "UINT16",
            Self::Int16 => "INT16",
            Self::UInt32 => "UINT32",
            Self::Int32 => "INT32",
            Self::Float32 => "FLOAT",
        }
    }
}

impl TryFrom<u8> for VarType {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_tag(tag).ok_or(tag)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for VarType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UINT8" | "U8" => Ok(Self::UInt8),
            "INT8" | "I8" => Ok(Self::Int8),
            "UINT16" | "U16" => Ok(Self::UInt16),
            "INT16" | "I16" => Ok(Self::Int16),
            "UINT32" | "U32" => Ok(Self::UInt32),
            "INT32" | "I32" => Ok(Self::Int32),
            "FLOAT" | "FLOAT32" | "F32" => Ok(Self::Float32),
            _ => Err(format!("Unknown variable type: {}", s)),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    #[serde(rename = "RO")]
    ReadOnly = 0,
    #[serde(rename = "RW")]
    ReadWrite = 1,
}

impl Access {
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::ReadOnly),
            1 => Some(Self::ReadWrite),
            _ => None,
        }
    }

    #[must_use]
    pub const fn tag(&self) -> u8 {
        *self as u8
    }

    #[must_use]
    pub const fn is_writable(&self) -> bool {
        matches!(self, Self::ReadWrite)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReadOnly => "RO",
            Self::ReadWrite => "RW",
        }
    }
}

impl TryFrom<u8> for Access {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_tag(tag).ok_or(tag)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Access {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RO" | "READONLY" => Ok(Self::ReadOnly),
            "RW" | "READWRITE" => Ok(Self::ReadWrite),
            _ => Err(format!("Unknown access mode: {}", s)),
        }
    }
}
