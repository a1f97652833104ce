//! ELF symbol-table lookup (Strategy B)
//!
//! Cheaper and coarser than DWARF: one frame per address, no inlining, but it
//! works on stripped-of-debug-info binaries that still carry `.symtab` or
//! `.dynsym`.

use object::{Object, ObjectSymbol, SymbolKind};
use std::sync::Arc;

use super::strategy::{HostStrategy, LoadFailure, ModuleCache, ModuleLocator};
use super::symbolizer::demangle_symbol;
use crate::domain::{ResolvedFrame, SymbolizationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfSymbol {
    pub address: u64,
    /// 0 when the symbol table does not record a size
    pub size: u64,
    pub name: String,
}

/// Function symbols of one module sorted by address
#[derive(Debug, Clone, Default)]
pub struct ElfSymbols {
    symbols: Vec<ElfSymbol>,
}

impl ElfSymbols {
    /// Collect defined text symbols, `.symtab` entries taking precedence over
    /// `.dynsym` ones at the same address
    #[must_use]
    pub fn from_object(obj: &object::File<'_>) -> Self {
        let symbols = obj
            .symbols()
            .chain(obj.dynamic_symbols())
            .filter(|sym| sym.kind() == SymbolKind::Text && sym.is_definition())
            .filter_map(|sym| {
                let name = sym.name().ok().filter(|name| !name.is_empty())?;
                Some(ElfSymbol { address: sym.address(), size: sym.size(), name: name.to_string() })
            })
            .collect();
        Self::from_symbols(symbols)
    }

    #[must_use]
    pub fn from_symbols(mut symbols: Vec<ElfSymbol>) -> Self {
        // Stable sort keeps the first-seen name for duplicate addresses
        symbols.sort_by_key(|sym| sym.address);
        symbols.dedup_by_key(|sym| sym.address);
        Self { symbols }
    }

    /// Closest symbol at or before `addr`, bounded by its size when known
    #[must_use]
    pub fn find(&self, addr: u64) -> Option<&ElfSymbol> {
        let idx = self.symbols.partition_point(|sym| sym.address <= addr);
        let sym = self.symbols.get(idx.checked_sub(1)?)?;
        if sym.size > 0 && addr - sym.address >= sym.size {
            return None;
        }
        Some(sym)
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

/// Strategy B: nearest ELF symbol
pub struct SymbolTableStrategy {
    locator: ModuleLocator,
    demangle: bool,
    modules: ModuleCache<ElfSymbols>,
}

impl SymbolTableStrategy {
    pub const NAME: &'static str = "symtab";

    #[must_use]
    pub fn new(locator: ModuleLocator, demangle: bool) -> Self {
        Self { locator, demangle, modules: ModuleCache::default() }
    }

    fn load(&self, module: &str) -> Result<Arc<ElfSymbols>, LoadFailure> {
        self.modules.get_or_load(module, || {
            let data = self.locator.read(module)?;
            let obj = object::File::parse(&*data)
                .map_err(|e| LoadFailure::Malformed(format!("Failed to parse object file: {e}")))?;
            Ok(ElfSymbols::from_object(&obj))
        })
    }
}

impl HostStrategy for SymbolTableStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn resolve(&self, module: &str, offset: u64) -> Result<Vec<ResolvedFrame>, SymbolizationError> {
        let symbols = self.load(module).map_err(|f| f.into_error(Self::NAME, module, offset))?;

        Ok(symbols
            .find(offset)
            .map(|sym| {
                let name =
                    if self.demangle { demangle_symbol(&sym.name) } else { sym.name.clone() };
                ResolvedFrame::new(name, offset - sym.address, Some(module.to_string()))
            })
            .into_iter()
            .collect())
    }
}
