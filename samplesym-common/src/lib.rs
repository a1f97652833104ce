//! # Shared Event Records (Trace Decoder ↔ Symbolizer)
//!
//! Defines the records a trace-container decoder hands to the symbolization
//! engine. The decoder owns parsing and validation; by the time a record reaches
//! the engine it is well-formed and in chronological order.
//!
//! ## Key Types
//!
//! - [`EventRecord`] - One lifecycle, memory-map or sample record
//! - [`MmapRecord`] - A loaded region of a process's address space
//! - [`SampleRecord`] - A leaf instruction pointer plus an already-unwound call chain
//!
//! With the `serde` feature enabled, records deserialize from the tagged JSON form
//! used by the `samplesym` driver:
//!
//! ```text
//! {"type":"mmap","pid":5,"tid":5,"start":4096,"len":1280,"pgoff":0,"filename":"libfoo.so"}
//! ```

// ============================================================================
// Constants
// ============================================================================

/// Thread id the kernel reports for its own mappings
///
/// Mmap records carrying this tid describe kernel/module text, never a
/// userspace address space.
pub const KERNEL_TID: u32 = 0;

/// Process id of the idle/swapper task
pub const IDLE_PID: u32 = 0;

// ============================================================================
// Records
// ============================================================================

/// Thread was (re)named
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CommRecord {
    pub tid: u32,
    pub name: String,
}

/// Process or thread creation
///
/// `pid == ppid` means a new thread inside an existing process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ForkRecord {
    pub pid: u32,
    pub ppid: u32,
}

/// A module mapped into a process
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MmapRecord {
    pub pid: u32,
    pub tid: u32,
    /// Runtime start address of the mapping
    pub start: u64,
    pub len: u64,
    /// Offset of the mapping within the backing file
    pub pgoff: u64,
    /// Module path as seen on the profiled device
    pub filename: String,
}

impl MmapRecord {
    /// Kernel mappings are reported with tid 0
    #[must_use]
    pub fn is_kernel(&self) -> bool {
        self.tid == KERNEL_TID
    }
}

/// A sampled instruction pointer with its call chain
///
/// The call chain is ordered caller-ward: `callchain[0]` is the leaf's caller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SampleRecord {
    pub pid: u32,
    pub tid: u32,
    pub ip: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub callchain: Vec<u64>,
}

/// One decoded trace record, consumed in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum EventRecord {
    Comm(CommRecord),
    Fork(ForkRecord),
    Mmap(MmapRecord),
    Sample(SampleRecord),
}
