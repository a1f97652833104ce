//! On-device symbol tables
//!
//! Some traces ship a minimized `(addr, len, name)` table for modules known
//! ahead of time. When a module has such a table it always wins over host
//! resolution.

use serde::Deserialize;
use std::collections::HashMap;

use super::range_table::{RangeTable, Span};

/// One entry of an on-device symbol table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OnDeviceSymbol {
    pub addr: u64,
    pub len: u64,
    pub name: String,
}

impl Span for OnDeviceSymbol {
    fn start(&self) -> u64 {
        self.addr
    }

    fn size(&self) -> u64 {
        self.len
    }
}

/// Immutable symbol index for one module
#[derive(Debug, Clone, Default)]
pub struct ModuleSymbolIndex {
    min_vaddr: u64,
    symbols: RangeTable<OnDeviceSymbol>,
}

impl ModuleSymbolIndex {
    #[must_use]
    pub fn new(min_vaddr: u64) -> Self {
        Self { min_vaddr, symbols: RangeTable::new() }
    }

    pub fn add_symbol(&mut self, addr: u64, len: u64, name: impl Into<String>) {
        self.symbols.insert(OnDeviceSymbol { addr, len, name: name.into() });
    }

    #[must_use]
    pub fn find(&self, offset: u64) -> Option<&OnDeviceSymbol> {
        self.symbols.find(offset)
    }

    /// Declared load baseline of the module
    #[must_use]
    pub fn min_vaddr(&self) -> u64 {
        self.min_vaddr
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Serialized form of one module's table
#[derive(Debug, Deserialize)]
pub struct ModuleSymbolTable {
    #[serde(default)]
    pub min_vaddr: u64,
    pub symbols: Vec<OnDeviceSymbol>,
}

impl From<ModuleSymbolTable> for ModuleSymbolIndex {
    fn from(table: ModuleSymbolTable) -> Self {
        Self { min_vaddr: table.min_vaddr, symbols: table.symbols.into_iter().collect() }
    }
}

/// Looks up the on-device index for a module path
pub trait ModuleIndexProvider {
    fn module_index(&self, module: &str) -> Option<&ModuleSymbolIndex>;
}

/// Provider for traces that carry no on-device tables
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOnDeviceSymbols;

impl ModuleIndexProvider for NoOnDeviceSymbols {
    fn module_index(&self, _module: &str) -> Option<&ModuleSymbolIndex> {
        None
    }
}

/// All on-device tables extracted from one trace, keyed by module path
#[derive(Debug, Clone, Default)]
pub struct OnDeviceSymbols {
    modules: HashMap<String, ModuleSymbolIndex>,
}

impl OnDeviceSymbols {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: impl Into<String>, index: ModuleSymbolIndex) {
        self.modules.insert(module.into(), index);
    }

    #[must_use]
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

impl FromIterator<(String, ModuleSymbolTable)> for OnDeviceSymbols {
    fn from_iter<I: IntoIterator<Item = (String, ModuleSymbolTable)>>(iter: I) -> Self {
        Self { modules: iter.into_iter().map(|(name, table)| (name, table.into())).collect() }
    }
}

impl ModuleIndexProvider for OnDeviceSymbols {
    fn module_index(&self, module: &str) -> Option<&ModuleSymbolIndex> {
        self.modules.get(module)
    }
}

impl ModuleIndexProvider for HashMap<String, ModuleSymbolIndex> {
    fn module_index(&self, module: &str) -> Option<&ModuleSymbolIndex> {
        self.get(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn libfoo_index() -> ModuleSymbolIndex {
        let mut index = ModuleSymbolIndex::new(0x1000);
        index.add_symbol(0x80, 0x80, "second");
        index.add_symbol(0x0, 0x80, "first");
        index
    }

    #[test]
    fn test_index_lookup() {
        let index = libfoo_index();
        assert_eq!(index.min_vaddr(), 0x1000);
        assert_eq!(index.find(0x0).map(|s| s.name.as_str()), Some("first"));
        assert_eq!(index.find(0x7f).map(|s| s.name.as_str()), Some("first"));
        assert_eq!(index.find(0x80).map(|s| s.name.as_str()), Some("second"));
        assert!(index.find(0x100).is_none());
        assert!(index.find(0x150).is_none());
    }

    #[test]
    fn test_provider_lookup() {
        let mut symbols = OnDeviceSymbols::new();
        symbols.insert("libfoo.so", libfoo_index());
        assert!(symbols.module_index("libfoo.so").is_some());
        assert!(symbols.module_index("libbar.so").is_none());
        assert!(NoOnDeviceSymbols.module_index("libfoo.so").is_none());
    }

    #[test]
    fn test_table_conversion() {
        let table = ModuleSymbolTable {
            min_vaddr: 0,
            symbols: vec![OnDeviceSymbol { addr: 0x10, len: 0x10, name: "f".to_string() }],
        };
        let symbols: OnDeviceSymbols = [("libf.so".to_string(), table)].into_iter().collect();
        assert_eq!(symbols.module_count(), 1);
        let index = symbols.module_index("libf.so").expect("module present");
        assert_eq!(index.len(), 1);
        assert_eq!(index.find(0x1f).map(|s| s.name.as_str()), Some("f"));
    }
}
