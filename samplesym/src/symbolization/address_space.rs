//! Per-process table of loaded module mappings
//!
//! Mappings arrive from mmap records and are never removed: a later mmap at the
//! same start shadows the earlier one, which models a region being remapped
//! without an intervening munmap.

use samplesym_common::MmapRecord;

use super::range_table::{RangeTable, Span};

/// One loaded region of a process's address space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub start: u64,
    pub len: u64,
    /// Offset of `start` within the backing file
    pub file_offset: u64,
    pub module: String,
}

impl Mapping {
    /// Offset of `addr` from the mapping start
    ///
    /// Caller must have checked `contains(addr)`.
    #[must_use]
    pub fn relative(&self, addr: u64) -> u64 {
        addr - self.start
    }
}

impl Span for Mapping {
    fn start(&self) -> u64 {
        self.start
    }

    fn size(&self) -> u64 {
        self.len
    }
}

impl From<&MmapRecord> for Mapping {
    fn from(record: &MmapRecord) -> Self {
        Self {
            start: record.start,
            len: record.len,
            file_offset: record.pgoff,
            module: record.filename.clone(),
        }
    }
}

/// Mappings of a single process, sorted by start address
///
/// `Clone` is a deep copy; a forked child never aliases its parent's table.
#[derive(Debug, Clone, Default)]
pub struct AddressSpace {
    mappings: RangeTable<Mapping>,
}

impl AddressSpace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mapping(&mut self, start: u64, len: u64, file_offset: u64, module: impl Into<String>) {
        self.mappings.insert(Mapping { start, len, file_offset, module: module.into() });
    }

    /// Mapping covering `addr`, or `None` when the address is unmapped
    #[must_use]
    pub fn find(&self, addr: u64) -> Option<&Mapping> {
        self.mappings.find(addr)
    }

    /// Independent copy for a forked child
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl Extend<Mapping> for AddressSpace {
    fn extend<I: IntoIterator<Item = Mapping>>(&mut self, iter: I) {
        for mapping in iter {
            self.mappings.insert(mapping);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_contains() {
        let mapping =
            Mapping { start: 0x1000, len: 0x1000, file_offset: 0, module: "libc.so".to_string() };

        assert!(mapping.contains(0x1000));
        assert!(mapping.contains(0x1500));
        assert!(mapping.contains(0x1FFF));
        assert!(!mapping.contains(0x0FFF));
        assert!(!mapping.contains(0x2000));
        assert!(!mapping.contains(0x2001));
        assert_eq!(mapping.relative(0x1234), 0x234);
    }

    #[test]
    fn test_find_non_overlapping() {
        let mut space = AddressSpace::new();
        space.add_mapping(0x7000, 0x1000, 0, "libc.so");
        space.add_mapping(0x1000, 0x500, 0, "app");
        space.add_mapping(0x4000, 0x800, 0x2000, "libm.so");

        assert_eq!(space.find(0x1200).map(|m| m.module.as_str()), Some("app"));
        assert_eq!(space.find(0x47ff).map(|m| m.file_offset), Some(0x2000));
        assert_eq!(space.find(0x7fff).map(|m| m.module.as_str()), Some("libc.so"));
        assert!(space.find(0x1500).is_none());
        assert!(space.find(0x0).is_none());
        assert!(space.find(0x8000).is_none());
    }

    #[test]
    fn test_remap_same_start_shadows() {
        let mut space = AddressSpace::new();
        space.add_mapping(0x1000, 0x100, 0, "first.so");
        space.add_mapping(0x1000, 0x100, 0, "second.so");
        assert_eq!(space.find(0x1010).map(|m| m.module.as_str()), Some("second.so"));
    }

    #[test]
    fn test_copy_is_independent() {
        let mut parent = AddressSpace::new();
        parent.add_mapping(0x2000, 0x100, 0, "libbar.so");

        let mut child = parent.copy();
        child.add_mapping(0x5000, 0x100, 0, "libbaz.so");
        parent.add_mapping(0x9000, 0x100, 0, "libqux.so");

        assert!(child.find(0x2000).is_some());
        assert!(child.find(0x9000).is_none());
        assert!(parent.find(0x5000).is_none());
        assert_eq!(parent.len(), 2);
        assert_eq!(child.len(), 2);
    }

    #[test]
    fn test_from_mmap_record() {
        let record = MmapRecord {
            pid: 5,
            tid: 5,
            start: 0x1000,
            len: 0x500,
            pgoff: 0x3000,
            filename: "libfoo.so".to_string(),
        };
        let mut space = AddressSpace::new();
        space.extend([Mapping::from(&record)]);
        let found = space.find(0x14ff).expect("mapping covers address");
        assert_eq!(found.file_offset, 0x3000);
        assert_eq!(found.module, "libfoo.so");
    }
}
