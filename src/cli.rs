use clap::{Parser, Subcommand};
use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;

use mculink::ScanOptions;

#[derive(Parser)]
#[command(name = "mculink")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Discover and inspect exposed variables in MCU firmware images",
    long_about = None
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RegionArgs {
    /// Flash address of the first byte of the image
    #[arg(long, default_value = "0", value_parser = parse_u32)]
    pub base: u32,

    /// Offset of the region to scan
    #[arg(long, default_value = "0", value_parser = parse_usize)]
    pub start: usize,

    /// Length of the region to scan (default: to end of image)
    #[arg(long, value_parser = parse_usize)]
    pub length: Option<usize>,
}

impl RegionArgs {
    pub fn options(&self) -> ScanOptions {
        let options = ScanOptions::new()
            .with_flash_base(self.base)
            .with_start(self.start);
        match self.length {
            Some(len) => options.with_length(len),
            None => options,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the variables exposed by one or more firmware images
    Scan {
        /// Flash dumps or raw firmware binaries
        #[arg(required = true)]
        images: Vec<PathBuf>,

        #[command(flatten)]
        region: RegionArgs,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read every exposed variable from a RAM dump
    Inspect {
        image: PathBuf,

        #[command(flatten)]
        region: RegionArgs,

        /// RAM dump to read values from
        #[arg(long)]
        ram: PathBuf,

        /// Address of the first byte of the RAM dump
        #[arg(long, default_value = "0x20000000", value_parser = parse_u32)]
        ram_base: u32,
    },

    /// Write a value into a RAM dump for a read-write variable
    Poke {
        image: PathBuf,

        #[command(flatten)]
        region: RegionArgs,

        #[arg(long)]
        ram: PathBuf,

        #[arg(long, default_value = "0x20000000", value_parser = parse_u32)]
        ram_base: u32,

        /// Variable name (first match wins for duplicates)
        #[arg(short, long)]
        name: String,

        #[arg(long, allow_hyphen_values = true)]
        value: f64,
    },
}

fn parse_number<T>(
    s: &str,
    from_hex: fn(&str, u32) -> Result<T, ParseIntError>,
) -> Result<T, String>
where
    T: FromStr<Err = ParseIntError>,
{
    let s = s.trim().replace('_', "");
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => from_hex(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}

/// Accepts decimal or `0x`-prefixed hexadecimal.
pub fn parse_u32(s: &str) -> Result<u32, String> {
    parse_number(s, u32::from_str_radix)
}

/// Like [`parse_u32`], for image offsets and lengths.
pub fn parse_usize(s: &str) -> Result<usize, String> {
    parse_number(s, usize::from_str_radix)
}
