//! Fixed-size variable descriptor records.
//!
//! Every exposed variable is described by one 84-byte little-endian record:
//!
//! ```text
//! 0   magic        u32  0x4D434C4B ("MCLK")
//! 4   address      u32
//! 8   type tag     u8
//! 9   access tag   u8
//! 10  reserved     [u8; 2]   ignored
//! 12  min_value    f32
//! 16  max_value    f32
//! 20  name         [u8; 32]  NUL padded
//! 52  category     [u8; 32]  NUL padded
//! ```
//!
//! Decoding never reads past the fixed record length, so whether a record
//! starts at a given offset is answered without looking at anything else in
//! the image.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::types::{Access, VarType};

pub const MAGIC: u32 = 0x4D43_4C4B;
pub const MAGIC_BYTES: [u8; 4] = MAGIC.to_le_bytes();
pub const RECORD_SIZE: usize = 84;
pub const TEXT_CAPACITY: usize = 32;
/// Longest string the encoder writes; one byte is kept for the terminator.
pub const MAX_TEXT_LEN: usize = TEXT_CAPACITY - 1;

const ADDRESS_OFFSET: usize = 4;
const TYPE_OFFSET: usize = 8;
const ACCESS_OFFSET: usize = 9;
const MIN_OFFSET: usize = 12;
const MAX_OFFSET: usize = 16;
const NAME_OFFSET: usize = 20;
const CATEGORY_OFFSET: usize = NAME_OFFSET + TEXT_CAPACITY;

/// Why a candidate offset did not yield a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RejectReason {
    #[error("not enough bytes for a full record")]
    OutOfBounds,

    #[error("magic marker not present")]
    BadMagic,

    #[error("variable address is zero")]
    ZeroAddress,

    #[error("unknown type tag")]
    BadType,

    #[error("unknown access tag")]
    BadAccess,

    #[error("name or category is not valid UTF-8")]
    InvalidText,

    #[error("name is empty")]
    EmptyName,

    #[error("min_value is greater than max_value")]
    InvertedBounds,
}

impl RejectReason {
    pub const ALL: [RejectReason; 8] = [
        Self::OutOfBounds,
        Self::BadMagic,
        Self::ZeroAddress,
        Self::BadType,
        Self::BadAccess,
        Self::InvalidText,
        Self::EmptyName,
        Self::InvertedBounds,
    ];
}

/// One exposed variable as described in flash.
///
/// Records are snapshots of the image at scan time. `address` is only a
/// handle; the live value has to be fetched through a
/// [`MemoryAccess`](crate::live::MemoryAccess) implementation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableRecord {
    name: String,
    address: u32,
    var_type: VarType,
    access: Access,
    category: String,
    min_value: f32,
    max_value: f32,
}

impl VariableRecord {
    pub fn new(name: impl Into<String>, address: u32, var_type: VarType, access: Access) -> Self {
        Self {
            name: name.into(),
            address,
            var_type,
            access,
            category: String::new(),
            min_value: 0.0,
            max_value: 0.0,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_bounds(mut self, min_value: f32, max_value: f32) -> Self {
        self.min_value = min_value;
        self.max_value = max_value;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category.is_empty()
    }

    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    pub fn max_value(&self) -> f32 {
        self.max_value
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.min_value, self.max_value)
    }

    pub fn is_writable(&self) -> bool {
        self.access.is_writable()
    }

    /// Matches the shape emitted for boolean toggles: a writable byte bounded to `[0, 1]`.
    pub fn is_toggle(&self) -> bool {
        self.var_type == VarType::UInt8
            && self.access == Access::ReadWrite
            && self.min_value == 0.0
            && self.max_value == 1.0
    }

    /// Position of `value` within the advisory bounds, clamped to `0.0..=1.0`.
    ///
    /// Returns `None` when the bounds do not describe a usable range.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        let min = f64::from(self.min_value);
        let max = f64::from(self.max_value);
        if !min.is_finite() || !max.is_finite() || max <= min || value.is_nan() {
            return None;
        }
        Some(((value - min) / (max - min)).clamp(0.0, 1.0))
    }

    /// Serializes the record into its on-flash layout.
    ///
    /// Strings longer than [`MAX_TEXT_LEN`] bytes are cut at the last
    /// character boundary that fits. Field values are written as-is, so
    /// records that fail validation can still be produced.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[..ADDRESS_OFFSET].copy_from_slice(&MAGIC_BYTES);
        out[ADDRESS_OFFSET..TYPE_OFFSET].copy_from_slice(&self.address.to_le_bytes());
        out[TYPE_OFFSET] = self.var_type.tag();
        out[ACCESS_OFFSET] = self.access.tag();
        out[MIN_OFFSET..MAX_OFFSET].copy_from_slice(&self.min_value.to_le_bytes());
        out[MAX_OFFSET..NAME_OFFSET].copy_from_slice(&self.max_value.to_le_bytes());
        write_text(&mut out[NAME_OFFSET..CATEGORY_OFFSET], &self.name);
        write_text(&mut out[CATEGORY_OFFSET..RECORD_SIZE], &self.category);
        out
    }
}

impl fmt::Display for VariableRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = if self.is_uncategorized() {
            "-"
        } else {
            self.category.as_str()
        };
        write!(
            f,
            "{} [{}] {} {} @ 0x{:08X} ({}..{})",
            self.name,
            category,
            self.var_type,
            self.access,
            self.address,
            self.min_value,
            self.max_value
        )
    }
}

/// Cheap check used before committing to a full decode.
#[inline]
pub fn has_magic_at(buffer: &[u8], offset: usize) -> bool {
    buffer
        .get(offset..)
        .and_then(|rest| rest.first_chunk::<4>())
        .is_some_and(|head| *head == MAGIC_BYTES)
}

/// Attempts to decode a record starting at `offset`.
///
/// On success returns the record together with the number of bytes it
/// occupies, which is always [`RECORD_SIZE`].
pub fn decode_at(buffer: &[u8], offset: usize) -> Result<(VariableRecord, usize), RejectReason> {
    let rest = buffer.get(offset..).ok_or(RejectReason::OutOfBounds)?;
    let head = rest.first_chunk::<4>().ok_or(RejectReason::OutOfBounds)?;
    if *head != MAGIC_BYTES {
        return Err(RejectReason::BadMagic);
    }

    let raw = rest
        .first_chunk::<RECORD_SIZE>()
        .ok_or(RejectReason::OutOfBounds)?;

    let address = read_u32(raw, ADDRESS_OFFSET);
    if address == 0 {
        return Err(RejectReason::ZeroAddress);
    }

    let var_type = VarType::from_tag(raw[TYPE_OFFSET]).ok_or(RejectReason::BadType)?;
    let access = Access::from_tag(raw[ACCESS_OFFSET]).ok_or(RejectReason::BadAccess)?;

    let name = read_text(&raw[NAME_OFFSET..CATEGORY_OFFSET])?;
    if name.is_empty() {
        return Err(RejectReason::EmptyName);
    }
    let category = read_text(&raw[CATEGORY_OFFSET..RECORD_SIZE])?;

    let min_value = f32::from_bits(read_u32(raw, MIN_OFFSET));
    let max_value = f32::from_bits(read_u32(raw, MAX_OFFSET));
    if min_value.is_finite() && max_value.is_finite() && min_value > max_value {
        return Err(RejectReason::InvertedBounds);
    }

    let record = VariableRecord {
        name,
        address,
        var_type,
        access,
        category,
        min_value,
        max_value,
    };

    Ok((record, RECORD_SIZE))
}

/// Decodes a record that starts at the first byte of `bytes`.
pub fn decode(bytes: &[u8]) -> Result<VariableRecord, RejectReason> {
    decode_at(bytes, 0).map(|(record, _)| record)
}

#[inline]
fn read_u32(raw: &[u8; RECORD_SIZE], offset: usize) -> u32 {
    u32::from_le_bytes([raw[offset], raw[offset + 1], raw[offset + 2], raw[offset + 3]])
}

fn read_text(field: &[u8]) -> Result<String, RejectReason> {
    let end = memchr::memchr(0, field).unwrap_or(field.len());
    std::str::from_utf8(&field[..end])
        .map(str::to_owned)
        .map_err(|_| RejectReason::InvalidText)
}

fn write_text(field: &mut [u8], text: &str) {
    let mut len = text.len().min(MAX_TEXT_LEN);
    while !text.is_char_boundary(len) {
        len -= 1;
    }
    field[..len].copy_from_slice(&text.as_bytes()[..len]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VariableRecord {
        VariableRecord::new("motor_speed", 0x2000_0010, VarType::UInt16, Access::ReadWrite)
            .with_category("Controls")
            .with_bounds(0.0, 3000.0)
    }

    #[test]
    fn test_layout_offsets() {
        let bytes = sample().encode();
        assert_eq!(&bytes[0..4], &[0x4B, 0x4C, 0x43, 0x4D]);
        assert_eq!(&bytes[4..8], &[0x10, 0x00, 0x00, 0x20]);
        assert_eq!(bytes[8], 2);
        assert_eq!(bytes[9], 1);
        assert_eq!(&bytes[10..12], &[0, 0]);
        assert_eq!(&bytes[12..16], &0.0f32.to_le_bytes());
        assert_eq!(&bytes[16..20], &3000.0f32.to_le_bytes());
        assert_eq!(&bytes[20..31], b"motor_speed");
        assert_eq!(bytes[31], 0);
        assert_eq!(&bytes[52..60], b"Controls");
        assert_eq!(bytes[60], 0);
    }

    #[test]
    fn test_decode_round_trip() {
        let record = sample();
        let (decoded, len) = decode_at(&record.encode(), 0).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(len, RECORD_SIZE);
    }

    #[test]
    fn test_reserved_bytes_ignored() {
        let mut bytes = sample().encode();
        bytes[10] = 0xAB;
        bytes[11] = 0xCD;
        assert_eq!(decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample().encode();
        bytes[3] ^= 0xFF;
        assert_eq!(decode(&bytes), Err(RejectReason::BadMagic));
    }

    #[test]
    fn test_truncated_record() {
        let bytes = sample().encode();
        assert_eq!(decode(&bytes[..RECORD_SIZE - 1]), Err(RejectReason::OutOfBounds));
        assert_eq!(decode(&bytes[..2]), Err(RejectReason::OutOfBounds));
        assert_eq!(decode_at(&bytes, RECORD_SIZE + 5), Err(RejectReason::OutOfBounds));
    }

    #[test]
    fn test_unknown_tags() {
        let mut bytes = sample().encode();
        bytes[TYPE_OFFSET] = 7;
        assert_eq!(decode(&bytes), Err(RejectReason::BadType));

        let mut bytes = sample().encode();
        bytes[ACCESS_OFFSET] = 2;
        assert_eq!(decode(&bytes), Err(RejectReason::BadAccess));
    }

    #[test]
    fn test_empty_name() {
        let record = VariableRecord::new("", 0x2000_0000, VarType::UInt8, Access::ReadOnly);
        assert_eq!(decode(&record.encode()), Err(RejectReason::EmptyName));
    }

    #[test]
    fn test_zero_address() {
        let record = VariableRecord::new("x", 0, VarType::UInt8, Access::ReadOnly);
        assert_eq!(decode(&record.encode()), Err(RejectReason::ZeroAddress));
    }

    #[test]
    fn test_inverted_bounds() {
        let record = sample().with_bounds(10.0, -5.0);
        assert_eq!(decode(&record.encode()), Err(RejectReason::InvertedBounds));
    }

    #[test]
    fn test_non_finite_bounds_accepted() {
        let record = sample().with_bounds(f32::NAN, -5.0);
        let decoded = decode(&record.encode()).unwrap();
        assert!(decoded.min_value().is_nan());
        assert_eq!(decoded.max_value(), -5.0);
    }

    #[test]
    fn test_invalid_utf8_name() {
        let mut bytes = sample().encode();
        bytes[NAME_OFFSET] = 0xFF;
        assert_eq!(decode(&bytes), Err(RejectReason::InvalidText));
    }

    #[test]
    fn test_full_capacity_name_without_terminator() {
        let mut bytes = sample().encode();
        bytes[NAME_OFFSET..CATEGORY_OFFSET].copy_from_slice(&[b'a'; TEXT_CAPACITY]);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.name().len(), TEXT_CAPACITY);
    }

    #[test]
    fn test_bytes_after_terminator_ignored() {
        let mut bytes = sample().encode();
        bytes[CATEGORY_OFFSET + 20] = b'z';
        assert_eq!(decode(&bytes).unwrap().category(), "Controls");
    }

    #[test]
    fn test_long_strings_truncated() {
        let long = "x".repeat(40);
        let record = VariableRecord::new(long.clone(), 1, VarType::Int8, Access::ReadOnly)
            .with_category(long);
        let decoded = decode(&record.encode()).unwrap();
        assert_eq!(decoded.name(), "x".repeat(MAX_TEXT_LEN));
        assert_eq!(decoded.category(), "x".repeat(MAX_TEXT_LEN));
    }

    #[test]
    fn test_truncation_respects_char_boundary() {
        let name = format!("{}é", "a".repeat(30));
        let record = VariableRecord::new(name, 1, VarType::Int8, Access::ReadOnly);
        let decoded = decode(&record.encode()).unwrap();
        assert_eq!(decoded.name(), "a".repeat(30));
    }

    #[test]
    fn test_has_magic_at() {
        let bytes = sample().encode();
        assert!(has_magic_at(&bytes, 0));
        assert!(!has_magic_at(&bytes, 1));
        assert!(!has_magic_at(&bytes[..3], 0));
        assert!(!has_magic_at(&bytes, 1000));
    }

    #[test]
    fn test_normalize() {
        let record = sample();
        assert_eq!(record.normalize(1500.0), Some(0.5));
        assert_eq!(record.normalize(-10.0), Some(0.0));
        assert_eq!(record.normalize(5000.0), Some(1.0));
        assert_eq!(sample().with_bounds(1.0, 1.0).normalize(1.0), None);
    }

    #[test]
    fn test_toggle_shape() {
        let toggle = VariableRecord::new("led_state", 4, VarType::UInt8, Access::ReadWrite)
            .with_bounds(0.0, 1.0);
        assert!(toggle.is_toggle());
        assert!(!sample().is_toggle());
    }

    #[test]
    fn test_display() {
        let line = sample().to_string();
        assert_eq!(line, "motor_speed [Controls] UINT16 RW @ 0x20000010 (0..3000)");
        let plain = VariableRecord::new("t", 0x10, VarType::Float32, Access::ReadOnly);
        assert!(plain.to_string().contains("[-]"));
    }
}
