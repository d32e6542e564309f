//! Scan options

use crate::error::{LinkError, Result};
use crate::scanner::{scan, ScanResult};

/// Where in an image to look, and how to map offsets to flash addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Flash address of the first byte of the image
    pub flash_base: u32,
    /// Region start, as an offset into the image
    pub start: usize,
    /// Region length (None = to the end of the image)
    pub length: Option<usize>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flash_base(mut self, base: u32) -> Self {
        self.flash_base = base;
        self
    }

    pub fn with_start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Returns the selected region of `image`.
    pub fn region<'a>(&self, image: &'a [u8]) -> Result<&'a [u8]> {
        let invalid = |end: usize| LinkError::InvalidRegion {
            start: self.start,
            end,
            size: image.len(),
        };

        let end = match self.length {
            Some(len) => self
                .start
                .checked_add(len)
                .ok_or_else(|| invalid(usize::MAX))?,
            None => image.len(),
        };

        if self.start > end || end > image.len() {
            return Err(invalid(end));
        }
        Ok(&image[self.start..end])
    }
}

/// Scans the region of `image` selected by `options`.
///
/// Entry offsets in the result are relative to the whole image.
pub fn scan_with(image: &[u8], options: &ScanOptions) -> Result<ScanResult> {
    let region = options.region(image)?;
    Ok(scan(region).rebase(options.start, options.flash_base))
}
