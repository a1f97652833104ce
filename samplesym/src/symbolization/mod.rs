//! # Symbol Resolution and Address Translation
//!
//! This module converts sampled instruction pointers into human-readable
//! frames: function name, offset within the function, owning module.
//!
//! ## The Symbolization Problem
//!
//! A sample records a raw runtime address like `0x7f3a2b4c780`. To name it we
//! need to know, *at the time of the sample*:
//! - **Which module** was mapped there (from the replayed mmap history)
//! - **Where in the module** the address falls (relative offset)
//! - **What symbol** covers that offset (on-device table or host files)
//!
//! ## Address Translation Flow
//!
//! ```text
//! 1. Find the mapping covering the address
//!    libfoo.so mapped at 0x1000..0x1500, file offset 0
//!
//! 2. Make it module-relative
//!    relative = 0x1200 - 0x1000 = 0x200
//!
//! 3a. On-device table present: add the mapping's file offset, look it up
//!
//! 3b. Otherwise add the module's min vaddr (lowest R+X PT_LOAD vaddr)
//!     and ask the host strategies, in order:
//!       DWARF (addr2line, inlined frames) → ELF symbol table
//! ```
//!
//! ## Key Concepts
//!
//! ### Min vaddr
//!
//! Host files are addressed by link-time virtual addresses, while a sample only
//! gives an offset from where the executable segment was mapped. Adding the
//! vaddr of that segment bridges the two. It is read from the ELF program
//! headers once per module; any failure counts as 0.
//!
//! ### Inlining
//!
//! One address can belong to several logical functions when calls were inlined.
//! The DWARF strategy returns all of them innermost first, and that order is
//! kept verbatim.
//!
//! ## Caching
//!
//! [`ResolverContext`] memoizes per run:
//! - resolved frames per `(module, offset)`
//! - min vaddr per module
//! - a skip-set of lookups every strategy failed on, so failures cost one
//!   attempt and one log line
//!
//! ## Module Structure
//!
//! - **`range_table`**: sorted start-address table shared by the two lookups below
//! - **`address_space`**: per-process mappings, copy-on-fork
//! - **`module_index`**: on-device `(addr, len, name)` tables
//! - **`strategy`**: host strategy trait, module locator, min-vaddr provider trait
//! - **`symbolizer`**: DWARF strategy (addr2line)
//! - **`symbol_table`**: ELF symbol-table strategy (object)
//! - **`min_vaddr`**: ELF program header scan
//! - **`context`**: per-run caches and strategy dispatch
//! - **`resolver`**: the decision tree tying it together
//!
//! ## References
//!
//! - [DWARF Debugging Format](http://dwarfstd.org/)
//! - [ELF program headers](https://man7.org/linux/man-pages/man5/elf.5.html)

pub mod address_space;
pub mod context;
pub mod min_vaddr;
pub mod module_index;
pub mod range_table;
pub mod resolver;
pub mod strategy;
pub mod symbol_table;
pub mod symbolizer;

pub use address_space::{AddressSpace, Mapping};
pub use context::{LookupKey, ResolverContext, ResolverStats, StatsSnapshot};
pub use min_vaddr::ElfMinVaddr;
pub use module_index::{
    ModuleIndexProvider, ModuleSymbolIndex, ModuleSymbolTable, NoOnDeviceSymbols, OnDeviceSymbol,
    OnDeviceSymbols,
};
pub use resolver::{
    is_kernel_address, kernel_frame, AddressResolver, KERNEL_ADDRESS_THRESHOLD, KERNEL_SYMBOL,
    MISSING_ON_DEVICE_SYMBOL,
};
pub use strategy::{HostStrategy, MinVaddrProvider, ModuleLocator};
pub use symbol_table::{ElfSymbols, SymbolTableStrategy};
pub use symbolizer::DwarfStrategy;
