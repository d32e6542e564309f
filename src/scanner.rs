//! Linear discovery of variable records in a byte buffer.
//!
//! The scan is equivalent to calling [`decode_at`] at every offset in
//! ascending order, advancing by the record length after a hit and by one
//! byte after a miss. Offsets that cannot start with the magic marker are
//! skipped with a `memchr` substring search instead of being decoded one by
//! one; the visited candidates and the resulting catalog are identical.

use memchr::memmem::Finder;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, trace, warn};

use crate::record::{decode_at, RejectReason, VariableRecord, MAGIC_BYTES};

/// A decoded record together with the image offset it was found at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub offset: usize,
    pub record: VariableRecord,
}

/// Per-reason counts of rejected magic-prefixed candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectStats {
    pub out_of_bounds: usize,
    pub zero_address: usize,
    pub bad_type: usize,
    pub bad_access: usize,
    pub invalid_text: usize,
    pub empty_name: usize,
    pub inverted_bounds: usize,
}

impl RejectStats {
    fn record(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::BadMagic => {}
            RejectReason::OutOfBounds => self.out_of_bounds += 1,
            RejectReason::ZeroAddress => self.zero_address += 1,
            RejectReason::BadType => self.bad_type += 1,
            RejectReason::BadAccess => self.bad_access += 1,
            RejectReason::InvalidText => self.invalid_text += 1,
            RejectReason::EmptyName => self.empty_name += 1,
            RejectReason::InvertedBounds => self.inverted_bounds += 1,
        }
    }

    pub fn get(&self, reason: RejectReason) -> usize {
        match reason {
            RejectReason::BadMagic => 0,
            RejectReason::OutOfBounds => self.out_of_bounds,
            RejectReason::ZeroAddress => self.zero_address,
            RejectReason::BadType => self.bad_type,
            RejectReason::BadAccess => self.bad_access,
            RejectReason::InvalidText => self.invalid_text,
            RejectReason::EmptyName => self.empty_name,
            RejectReason::InvertedBounds => self.inverted_bounds,
        }
    }

    pub fn total(&self) -> usize {
        RejectReason::ALL.iter().map(|&r| self.get(r)).sum()
    }

    /// Non-zero counts in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (RejectReason, usize)> + '_ {
        RejectReason::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|&(_, n)| n > 0)
    }
}

/// Ordered catalog produced by one scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanResult {
    entries: Vec<CatalogEntry>,
    stats: RejectStats,
    bytes_scanned: usize,
    flash_base: u32,
}

impl ScanResult {
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<CatalogEntry> {
        self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &VariableRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of magic-prefixed candidates that failed validation.
    pub fn rejected(&self) -> usize {
        self.stats.total()
    }

    pub fn reject_stats(&self) -> &RejectStats {
        &self.stats
    }

    pub fn bytes_scanned(&self) -> usize {
        self.bytes_scanned
    }

    pub fn flash_base(&self) -> u32 {
        self.flash_base
    }

    /// Absolute flash address of an entry's record.
    pub fn flash_address(&self, entry: &CatalogEntry) -> u64 {
        u64::from(self.flash_base) + entry.offset as u64
    }

    /// First entry with the given name.
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.record.name() == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CatalogEntry> {
        self.entries.iter().filter(move |e| e.record.name() == name)
    }

    /// Names that appear more than once, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();

        for record in self.records() {
            let name = record.name();
            if !seen.insert(name) && reported.insert(name) {
                duplicates.push(name);
            }
        }
        duplicates
    }

    /// Distinct categories in first-seen order. The empty string stands for
    /// uncategorized records.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records()
            .map(VariableRecord::category)
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Entries grouped by category, groups and members in first-seen order.
    pub fn by_category(&self) -> Vec<(&str, Vec<&CatalogEntry>)> {
        self.categories()
            .into_iter()
            .map(|category| {
                let members = self
                    .entries
                    .iter()
                    .filter(|e| e.record.category() == category)
                    .collect();
                (category, members)
            })
            .collect()
    }

    /// Shifts entry offsets by `start` and tags the result with a flash base.
    pub(crate) fn rebase(mut self, start: usize, flash_base: u32) -> Self {
        for entry in &mut self.entries {
            entry.offset += start;
        }
        self.flash_base = flash_base;
        self
    }
}

/// Scans `buffer` for variable records.
///
/// Total over any input: malformed candidates are counted and skipped, and
/// an empty or non-matching buffer yields an empty catalog.
pub fn scan(buffer: &[u8]) -> ScanResult {
    let finder = Finder::new(&MAGIC_BYTES);
    let mut result = ScanResult {
        bytes_scanned: buffer.len(),
        ..ScanResult::default()
    };
    let mut pos = 0usize;

    while let Some(found) = finder.find(&buffer[pos..]) {
        let offset = pos + found;

        match decode_at(buffer, offset) {
            Ok((record, len)) => {
                debug!(offset, name = record.name(), address = record.address(), "record accepted");
                result.entries.push(CatalogEntry { offset, record });
                pos = offset + len;
            }
            Err(RejectReason::BadMagic) => {
                pos = offset + 1;
            }
            Err(reason) => {
                trace!(offset, ?reason, "candidate rejected");
                result.stats.record(reason);
                pos = offset + 1;
            }
        }
    }

    for name in result.duplicate_names() {
        warn!(name, "variable name exposed more than once");
    }

    info!(
        bytes = buffer.len(),
        records = result.entries.len(),
        rejected = result.stats.total(),
        "scan complete"
    );

    result
}
