//! Sorted start-address table with nearest-start lookup
//!
//! Shared by process address spaces and on-device symbol indexes. Entries are
//! kept sorted by start; equal starts are kept in insertion order so that the
//! latest insert shadows earlier ones.

/// Anything occupying `[start, start + len)`
pub trait Span {
    fn start(&self) -> u64;
    fn size(&self) -> u64;

    /// Check if an address falls within this span
    fn contains(&self, addr: u64) -> bool {
        addr >= self.start() && addr - self.start() < self.size()
    }
}

#[derive(Debug, Clone)]
pub struct RangeTable<T> {
    entries: Vec<T>,
}

impl<T> Default for RangeTable<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: Span> RangeTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert after every entry whose start is `<=` the new start
    pub fn insert(&mut self, entry: T) {
        let idx = self.entries.partition_point(|e| e.start() <= entry.start());
        self.entries.insert(idx, entry);
    }

    /// Rightmost entry with `start <= addr`, only if it also covers `addr`
    #[must_use]
    pub fn find(&self, addr: u64) -> Option<&T> {
        let idx = self.entries.partition_point(|e| e.start() <= addr);
        let candidate = self.entries.get(idx.checked_sub(1)?)?;
        candidate.contains(addr).then_some(candidate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Span> FromIterator<T> for RangeTable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}
