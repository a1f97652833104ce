//! Address resolution decision tree
//!
//! Turns one sampled address into frames, trying in order:
//!
//! ```text
//! addr >= KERNEL_ADDRESS_THRESHOLD ─► [kernel]
//! no covering mapping              ─► "<addr> (no mapped segment)"
//! module has on-device table       ─► table hit / "(missing on-device symbol)"
//! host strategies (memoized)       ─► strategy frames / module+offset
//! ```
//!
//! Resolution never fails: every miss degrades to a placeholder frame.

use log::debug;

use super::address_space::{AddressSpace, Mapping};
use super::context::{LookupKey, ResolverContext};
use super::module_index::ModuleIndexProvider;
use crate::domain::{ResolvedFrame, SymbolizationError};

/// Lowest address treated as kernel text
///
/// Bottom of the upper (kernel) half of a 64-bit address space with 48-bit
/// virtual addresses. arm64 kernels start at `0xffff_0000_0000_0000`, x86-64
/// kernels at `0xffff_8000_0000_0000`; both are covered.
pub const KERNEL_ADDRESS_THRESHOLD: u64 = 0xffff_0000_0000_0000;

/// Symbol and module name of kernel frames
pub const KERNEL_SYMBOL: &str = "[kernel]";

/// Symbol of frames in modules whose on-device table has a gap
pub const MISSING_ON_DEVICE_SYMBOL: &str = "(missing on-device symbol)";

#[must_use]
pub fn is_kernel_address(addr: u64) -> bool {
    addr >= KERNEL_ADDRESS_THRESHOLD
}

#[must_use]
pub fn kernel_frame() -> ResolvedFrame {
    ResolvedFrame::new(KERNEL_SYMBOL, 0, Some(KERNEL_SYMBOL.to_string()))
}

#[must_use]
pub fn is_kernel_frame(frame: &ResolvedFrame) -> bool {
    frame.symbol == KERNEL_SYMBOL
}

/// Resolves addresses against one process's mappings
///
/// Holds the on-device tables and the run's [`ResolverContext`]; the address
/// space is passed per call since it changes as events replay.
pub struct AddressResolver<'a, P: ModuleIndexProvider + ?Sized> {
    modules: &'a P,
    ctx: &'a ResolverContext,
}

impl<P: ModuleIndexProvider + ?Sized> Clone for AddressResolver<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ModuleIndexProvider + ?Sized> Copy for AddressResolver<'_, P> {}

/// Where a mapped, non-kernel address is resolved
enum Route<'m> {
    OnDevice { mapping: &'m Mapping, offset: u64 },
    Host { key: LookupKey },
}

impl<'a, P: ModuleIndexProvider + ?Sized> AddressResolver<'a, P> {
    pub fn new(modules: &'a P, ctx: &'a ResolverContext) -> Self {
        Self { modules, ctx }
    }

    /// Resolve `addr` to one or more frames, innermost first
    #[must_use]
    pub fn decode(&self, addr: u64, space: &AddressSpace) -> Vec<ResolvedFrame> {
        if is_kernel_address(addr) {
            return vec![kernel_frame()];
        }

        let Some(mapping) = space.find(addr) else {
            self.ctx.stats().record_unmapped();
            debug!("{}", SymbolizationError::UnmappedAddress(addr));
            return vec![ResolvedFrame::new(format!("0x{addr:x} (no mapped segment)"), 0, None)];
        };

        match self.route(addr, mapping) {
            Route::OnDevice { mapping, offset } => self.decode_on_device(mapping, offset),
            Route::Host { key } => match self.ctx.host_resolve(&key) {
                Some(frames) => frames,
                None => {
                    self.ctx.stats().record_degraded();
                    vec![ResolvedFrame::new(key.module.clone(), key.offset, Some(key.module))]
                }
            },
        }
    }

    /// The host lookup `decode` would perform for `addr`, without performing it
    ///
    /// `None` for kernel, unmapped and on-device addresses.
    #[must_use]
    pub fn host_lookup_key(&self, addr: u64, space: &AddressSpace) -> Option<LookupKey> {
        if is_kernel_address(addr) {
            return None;
        }
        match self.route(addr, space.find(addr)?) {
            Route::Host { key } => Some(key),
            Route::OnDevice { .. } => None,
        }
    }

    fn route<'m>(&self, addr: u64, mapping: &'m Mapping) -> Route<'m> {
        let relative = mapping.relative(addr);
        if self.modules.module_index(&mapping.module).is_some() {
            let offset = relative.wrapping_add(mapping.file_offset);
            return Route::OnDevice { mapping, offset };
        }
        let offset = relative.wrapping_add(self.ctx.min_vaddr(&mapping.module));
        Route::Host { key: LookupKey::new(mapping.module.clone(), offset) }
    }

    fn decode_on_device(&self, mapping: &Mapping, offset: u64) -> Vec<ResolvedFrame> {
        let module = Some(mapping.module.clone());
        let hit = self
            .modules
            .module_index(&mapping.module)
            .and_then(|index| index.find(offset))
            .map(|symbol| symbol.name.clone());
        self.ctx.stats().record_on_device(hit.is_some());

        match hit {
            Some(name) => vec![ResolvedFrame::new(name, 0, module)],
            None => {
                let missing = SymbolizationError::MissingOnDeviceSymbol {
                    module: mapping.module.clone(),
                    offset,
                };
                debug!("{missing}");
                vec![ResolvedFrame::new(MISSING_ON_DEVICE_SYMBOL, offset, module)]
            }
        }
    }
}
