//! Trace processing
//!
//! This module drives symbolization over a recorded trace:
//! - Event replay (per-process address spaces, fork copies, thread names)
//! - Sample symbolization (leaf and call chain to frames)
//! - Batched host lookups ahead of the sequential pass

pub mod prefetch;
pub mod replay;
pub mod sample_symbolizer;

pub use prefetch::PrefetchPlan;
pub use replay::EventReplayer;
pub use sample_symbolizer::{
    strip_leading_kernel, symbolize_trace, SampleSymbolizer, SymbolizedSample, UNKNOWN_PROCESS,
};
