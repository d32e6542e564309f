//! Catalog reports for the command line.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

use crate::live::LiveReading;
use crate::record::VariableRecord;
use crate::scanner::{RejectStats, ScanResult};

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry<'a> {
    pub offset: usize,
    pub flash_address: u64,
    #[serde(flatten)]
    pub record: &'a VariableRecord,
}

/// Serializable summary of one scanned image.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogReport<'a> {
    pub image: String,
    pub size: usize,
    pub sha256: String,
    pub flash_base: u32,
    pub variables: Vec<ReportEntry<'a>>,
    pub rejected: usize,
    pub reject_stats: RejectStats,
}

impl<'a> CatalogReport<'a> {
    pub fn new(image: impl Into<String>, bytes: &[u8], result: &'a ScanResult) -> Self {
        let variables = result
            .entries()
            .iter()
            .map(|entry| ReportEntry {
                offset: entry.offset,
                flash_address: result.flash_address(entry),
                record: &entry.record,
            })
            .collect();

        Self {
            image: image.into(),
            size: bytes.len(),
            sha256: hex::encode(Sha256::digest(bytes)),
            flash_base: result.flash_base(),
            variables,
            rejected: result.rejected(),
            reject_stats: *result.reject_stats(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} ({} bytes, sha256 {})", self.image, self.size, self.sha256);
        let _ = writeln!(
            out,
            "{:<10} {:<24} {:<12} {:<6} {:<3} {:<10} {}",
            "FLASH", "NAME", "CATEGORY", "TYPE", "ACC", "ADDRESS", "BOUNDS"
        );
        let _ = writeln!(out, "{}", "-".repeat(80));

        for entry in &self.variables {
            let record = entry.record;
            let category = if record.is_uncategorized() {
                "-"
            } else {
                record.category()
            };
            let _ = writeln!(
                out,
                "0x{:08X} {:<24} {:<12} {:<6} {:<3} 0x{:08X} {}..{}",
                entry.flash_address,
                record.name(),
                category,
                record.var_type(),
                record.access(),
                record.address(),
                record.min_value(),
                record.max_value()
            );
        }

        let _ = writeln!(
            out,
            "{} variables, {} rejected candidates",
            self.variables.len(),
            self.rejected
        );
        out
    }
}

/// Renders one line per reading; failures are shown in place of the value.
pub fn render_readings(readings: &[LiveReading<'_>]) -> String {
    let mut out = String::new();
    for reading in readings {
        let record = reading.record;
        match &reading.value {
            Ok(value) => {
                let gauge = record
                    .normalize(value.as_f64())
                    .map(|f| format!(" [{:>3.0}%]", f * 100.0))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "{:<24} {:<3} {:>14}{}",
                    record.name(),
                    record.access(),
                    value,
                    gauge
                );
            }
            Err(e) => {
                let _ = writeln!(out, "{:<24} {:<3} error: {}", record.name(), record.access(), e);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;
    use crate::scanner::scan;
    use crate::types::{Access, VarType};
    use crate::value::Value;

    fn image() -> Vec<u8> {
        VariableRecord::new("led_state", 0x2000_0100, VarType::UInt8, Access::ReadWrite)
            .with_category("Controls")
            .with_bounds(0.0, 1.0)
            .encode()
            .to_vec()
    }

    #[test]
    fn test_json_report() {
        let bytes = image();
        let result = scan(&bytes);
        let report = CatalogReport::new("fw.bin", &bytes, &result);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["size"], 84);
        assert_eq!(json["sha256"].as_str().unwrap().len(), 64);
        assert_eq!(json["variables"][0]["name"], "led_state");
        assert_eq!(json["variables"][0]["var_type"], "UINT8");
        assert_eq!(json["variables"][0]["access"], "RW");
        assert_eq!(json["variables"][0]["address"], 0x2000_0100u32);
        assert_eq!(json["rejected"], 0);
    }

    #[test]
    fn test_table_report() {
        let bytes = image();
        let result = scan(&bytes);
        let table = CatalogReport::new("fw.bin", &bytes, &result).to_table();
        assert!(table.contains("led_state"));
        assert!(table.contains("0x20000100"));
        assert!(table.contains("1 variables, 0 rejected candidates"));
    }

    #[test]
    fn test_render_readings_shows_errors_in_place() {
        let ok =
            VariableRecord::new("a", 1, VarType::UInt8, Access::ReadOnly).with_bounds(0.0, 10.0);
        let bad = VariableRecord::new("b", 2, VarType::UInt8, Access::ReadOnly);
        let readings = vec![
            LiveReading {
                record: &ok,
                value: Ok(Value::UInt8(5)),
            },
            LiveReading {
                record: &bad,
                value: Err(LinkError::Transport("timeout".to_string())),
            },
        ];
        let text = render_readings(&readings);
        assert!(text.contains("[ 50%]"));
        assert!(text.contains("error: Transport error: timeout"));
    }
}
