//! DWARF line-table lookup (Strategy A)
//!
//! Resolves through addr2line, so one address can come back as several
//! inlined frames.

use addr2line::Context;
use gimli::{EndianArcSlice, RunTimeEndian};
use object::{Object, ObjectSection};
use parking_lot::Mutex;
use rustc_demangle::demangle;
use std::borrow::Cow;
use std::sync::Arc;

use super::strategy::{HostStrategy, LoadFailure, ModuleCache, ModuleLocator};
use super::symbol_table::ElfSymbols;
use crate::domain::{ResolvedFrame, SymbolizationError};

type DwarfContext = Context<EndianArcSlice<RunTimeEndian>>;

/// Debug info of one module, ready for lookups
struct DwarfModule {
    ctx: Mutex<DwarfContext>,
    /// Used to compute the offset of the physical (outermost) frame
    symbols: ElfSymbols,
}

impl DwarfModule {
    fn parse(binary_data: &[u8]) -> Result<Self, LoadFailure> {
        let obj_file = object::File::parse(binary_data)
            .map_err(|e| LoadFailure::Malformed(format!("Failed to parse object file: {e}")))?;

        let endian =
            if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

        let load_section = |id: gimli::SectionId| -> Result<EndianArcSlice<RunTimeEndian>, gimli::Error> {
            let data = obj_file
                .section_by_name(id.name())
                .and_then(|section| section.uncompressed_data().ok())
                .unwrap_or(Cow::Borrowed(&[][..]));
            Ok(EndianArcSlice::new(Arc::from(&*data), endian))
        };

        let dwarf = gimli::Dwarf::load(&load_section)
            .map_err(|e| LoadFailure::Malformed(format!("Failed to load DWARF sections: {e}")))?;
        let ctx = Context::from_dwarf(dwarf).map_err(|e| {
            LoadFailure::Malformed(format!("Failed to load DWARF debug information: {e}"))
        })?;

        Ok(Self { ctx: Mutex::new(ctx), symbols: ElfSymbols::from_object(&obj_file) })
    }
}

/// Strategy A: resolves offsets through DWARF line tables and inline info
///
/// Yields every inlined frame for an address, innermost first. Inlined frames
/// carry offset 0; the outermost frame gets its offset from the enclosing ELF
/// symbol when the module has one.
pub struct DwarfStrategy {
    locator: ModuleLocator,
    demangle: bool,
    modules: ModuleCache<DwarfModule>,
}

impl DwarfStrategy {
    pub const NAME: &'static str = "dwarf";

    #[must_use]
    pub fn new(locator: ModuleLocator, demangle: bool) -> Self {
        Self { locator, demangle, modules: ModuleCache::default() }
    }

    fn load(&self, module: &str) -> Result<Arc<DwarfModule>, LoadFailure> {
        self.modules.get_or_load(module, || DwarfModule::parse(&self.locator.read(module)?))
    }
}

impl HostStrategy for DwarfStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn resolve(&self, module: &str, offset: u64) -> Result<Vec<ResolvedFrame>, SymbolizationError> {
        let loaded = self.load(module).map_err(|f| f.into_error(Self::NAME, module, offset))?;
        let failed = |e: gimli::Error| SymbolizationError::HostToolFailed {
            tool: Self::NAME,
            module: module.to_string(),
            offset,
            reason: e.to_string(),
        };

        let mut result = Vec::new();
        {
            let ctx = loaded.ctx.lock();
            let mut frame_iter = ctx.find_frames(offset).skip_all_loads().map_err(failed)?;
            while let Some(frame) = frame_iter.next().map_err(failed)? {
                let function = frame
                    .function
                    .and_then(|f| {
                        let name = if self.demangle { f.demangle() } else { f.raw_name() };
                        name.ok().map(Cow::into_owned)
                    })
                    .unwrap_or_else(|| "<unknown>".to_string());

                result.push(ResolvedFrame::new(function, 0, Some(module.to_string())));
            }
        }

        if let (Some(outermost), Some(symbol)) = (result.last_mut(), loaded.symbols.find(offset)) {
            outermost.offset = offset - symbol.address;
        }

        Ok(result)
    }
}

/// Demangle a Rust symbol name
///
/// Names that are not Rust-mangled come back unchanged.
#[must_use]
pub fn demangle_symbol(symbol: &str) -> String {
    format!("{:#}", demangle(symbol))
}
