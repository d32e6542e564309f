//! Discovery of exposed MCU variables in firmware images.
//!
//! Firmware embeds one fixed-size [`VariableRecord`] per exposed variable in
//! flash. [`scan`] finds every well-formed record in a flash dump and
//! returns them in image order; [`live`] reads and writes the variables
//! through any [`MemoryAccess`] implementation.

mod error;
pub mod io;
pub mod live;
pub mod logging;
pub mod options;
pub mod record;
pub mod report;
pub mod scanner;
pub mod types;
pub mod value;

pub use error::{LinkError, Result};
pub use live::{read_all, read_value, write_f64, write_value, LiveReading, MemoryAccess, RamImage};
pub use options::{scan_with, ScanOptions};
pub use record::{decode_at, RejectReason, VariableRecord, MAGIC, RECORD_SIZE};
pub use scanner::{scan, CatalogEntry, RejectStats, ScanResult};
pub use types::{Access, VarType};
pub use value::Value;
