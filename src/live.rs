//! Live access to discovered variables.
//!
//! Reading or writing a variable goes through a [`MemoryAccess`]
//! implementation, typically a debug probe or a RAM dump. Each access is
//! independent of scanning and may race with firmware execution: a
//! multi-byte read is not atomic with respect to concurrent writes by the
//! target.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{LinkError, Result};
use crate::record::VariableRecord;
use crate::scanner::ScanResult;
use crate::value::Value;

/// Raw byte access to target memory.
///
/// Implementations own any retry policy for their transport.
///
/// # Example
///
/// ```ignore
/// struct Probe { /* ... */ }
///
/// impl MemoryAccess for Probe {
///     fn read(&mut self, address: u32, width: usize) -> Result<Vec<u8>> {
///         // Read `width` bytes at `address` over SWD
///     }
///
///     fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
///         // Write `data` at `address` over SWD
///     }
/// }
/// ```
pub trait MemoryAccess {
    /// Reads `width` bytes starting at `address`.
    fn read(&mut self, address: u32, width: usize) -> Result<Vec<u8>>;

    /// Writes `data` starting at `address`.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()>;
}

impl<M: MemoryAccess + ?Sized> MemoryAccess for &mut M {
    fn read(&mut self, address: u32, width: usize) -> Result<Vec<u8>> {
        (**self).read(address, width)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        (**self).write(address, data)
    }
}

/// Reads the current value of `record` using its type's access width.
pub fn read_value<M: MemoryAccess + ?Sized>(mem: &mut M, record: &VariableRecord) -> Result<Value> {
    let width = record.var_type().width();
    let bytes = mem.read(record.address(), width)?;
    Value::decode(record.var_type(), record.address(), &bytes)
}

/// Writes `value` to `record`'s address.
///
/// Read-only records and values of a different type are refused before the
/// transport is touched.
pub fn write_value<M: MemoryAccess + ?Sized>(
    mem: &mut M,
    record: &VariableRecord,
    value: Value,
) -> Result<()> {
    if !record.is_writable() {
        return Err(LinkError::ReadOnly {
            name: record.name().to_string(),
        });
    }
    if value.var_type() != record.var_type() {
        return Err(LinkError::TypeMismatch {
            expected: record.var_type(),
            actual: value.var_type(),
        });
    }

    debug!(name = record.name(), address = record.address(), %value, "writing variable");
    mem.write(record.address(), &value.to_le_bytes())
}

/// Converts a UI number for `record`'s type and writes it.
pub fn write_f64<M: MemoryAccess + ?Sized>(
    mem: &mut M,
    record: &VariableRecord,
    value: f64,
) -> Result<()> {
    if !record.is_writable() {
        return Err(LinkError::ReadOnly {
            name: record.name().to_string(),
        });
    }
    let value = Value::from_f64(record.var_type(), value)?;
    write_value(mem, record, value)
}

/// Outcome of reading one catalog entry.
#[derive(Debug)]
pub struct LiveReading<'a> {
    pub record: &'a VariableRecord,
    pub value: Result<Value>,
}

impl LiveReading<'_> {
    pub fn is_ok(&self) -> bool {
        self.value.is_ok()
    }
}

/// Reads every variable in `catalog`.
///
/// Failures are reported per entry and never stop the remaining reads.
pub fn read_all<'a, M: MemoryAccess + ?Sized>(
    mem: &mut M,
    catalog: &'a ScanResult,
) -> Vec<LiveReading<'a>> {
    catalog
        .records()
        .map(|record| {
            let value = read_value(&mut *mem, record);
            if let Err(e) = &value {
                warn!(name = record.name(), error = %e, "live read failed");
            }
            LiveReading { record, value }
        })
        .collect()
}

/// A copy of target RAM starting at `base`.
#[derive(Debug, Clone)]
pub struct RamImage {
    base: u32,
    bytes: Vec<u8>,
}

impl RamImage {
    pub fn new(base: u32, bytes: Vec<u8>) -> Self {
        Self { base, bytes }
    }

    pub fn load(path: impl AsRef<Path>, base: u32) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        Ok(Self::new(base, bytes))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), &self.bytes)?;
        Ok(())
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// One past the last mapped address.
    pub fn end(&self) -> u64 {
        u64::from(self.base) + self.bytes.len() as u64
    }

    fn range(&self, address: u32, width: usize) -> Result<std::ops::Range<usize>> {
        let out_of_range = || LinkError::AddressOutOfRange {
            address,
            width,
            base: self.base,
            end: self.end(),
        };

        let start = address.checked_sub(self.base).ok_or_else(out_of_range)? as usize;
        let end = start.checked_add(width).ok_or_else(out_of_range)?;
        if end > self.bytes.len() {
            return Err(out_of_range());
        }
        Ok(start..end)
    }
}

impl MemoryAccess for RamImage {
    fn read(&mut self, address: u32, width: usize) -> Result<Vec<u8>> {
        let range = self.range(address, width)?;
        Ok(self.bytes[range].to_vec())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        let range = self.range(address, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Access, VarType};

    struct FailingProbe;

    impl MemoryAccess for FailingProbe {
        fn read(&mut self, _address: u32, _width: usize) -> Result<Vec<u8>> {
            Err(LinkError::Transport("probe detached".to_string()))
        }

        fn write(&mut self, _address: u32, _data: &[u8]) -> Result<()> {
            panic!("write must not reach the transport");
        }
    }

    fn ram() -> RamImage {
        RamImage::new(0x2000_0000, vec![0; 64])
    }

    #[test]
    fn test_ram_image_bounds() {
        let mut ram = ram();
        assert!(ram.read(0x2000_0000, 64).is_ok());
        assert!(ram.read(0x2000_003D, 4).is_err());
        assert!(ram.read(0x1FFF_FFFF, 1).is_err());
        assert!(ram.write(0x2000_0040, &[1]).is_err());
        assert_eq!(ram.end(), 0x2000_0040);
    }

    #[test]
    fn test_write_then_read() {
        let mut ram = ram();
        let record = VariableRecord::new("speed", 0x2000_0010, VarType::UInt16, Access::ReadWrite);
        write_value(&mut ram, &record, Value::UInt16(1200)).unwrap();
        assert_eq!(&ram.as_bytes()[0x10..0x12], &1200u16.to_le_bytes());
        assert_eq!(read_value(&mut ram, &record).unwrap(), Value::UInt16(1200));
    }

    #[test]
    fn test_read_only_never_reaches_transport() {
        let record = VariableRecord::new("temp", 0x2000_0000, VarType::Float32, Access::ReadOnly);
        let err = write_value(&mut FailingProbe, &record, Value::Float32(1.0)).unwrap_err();
        assert!(matches!(err, LinkError::ReadOnly { .. }));
        let err = write_f64(&mut FailingProbe, &record, 1.0).unwrap_err();
        assert!(matches!(err, LinkError::ReadOnly { .. }));
    }

    #[test]
    fn test_type_mismatch_refused() {
        let record = VariableRecord::new("x", 0x2000_0000, VarType::UInt8, Access::ReadWrite);
        let err = write_value(&mut FailingProbe, &record, Value::Int32(1)).unwrap_err();
        assert!(matches!(err, LinkError::TypeMismatch { .. }));
    }

    #[test]
    fn test_write_f64_converts() {
        let mut ram = ram();
        let record = VariableRecord::new("level", 0x2000_0004, VarType::Int8, Access::ReadWrite);
        write_f64(&mut ram, &record, -3.0).unwrap();
        assert_eq!(read_value(&mut ram, &record).unwrap(), Value::Int8(-3));
        assert!(write_f64(&mut ram, &record, 500.0).is_err());
    }
}
