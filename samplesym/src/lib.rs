//! # samplesym - Profiling Sample Symbolization
//!
//! Turns the raw instruction pointers in a recorded CPU profile into
//! human-readable frames: function name, offset within the function, and
//! owning module.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │               Trace decoder (outside this crate)                │
//! │         comm / fork / mmap / sample records, in order           │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ EventRecord stream
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      samplesym (this crate)                     │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │    Event     │──▶│   Sample     │──▶│   Address    │         │
//! │  │   Replayer   │   │ Symbolizer   │   │   Resolver   │         │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘         │
//! │                                               │                 │
//! │                         ┌─────────────────────┼──────────┐      │
//! │                         ▼                     ▼          ▼      │
//! │                  ┌────────────┐   ┌────────────┐  ┌──────────┐  │
//! │                  │ On-device  │   │   DWARF    │  │   ELF    │  │
//! │                  │  tables    │   │ (addr2line)│  │  symtab  │  │
//! │                  └────────────┘   └────────────┘  └──────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`profiling`]: record replay, per-sample symbolization, batched prefetch
//! - [`symbolization`]: address spaces, on-device tables, host strategies and
//!   the per-run [`ResolverContext`](symbolization::ResolverContext)
//! - [`domain`]: core types (`Pid`, `Tid`, `ResolvedFrame`) and errors
//! - [`config`]: [`ResolverConfig`](config::ResolverConfig)
//! - [`trace_data`]: driver input/output files
//! - [`cli`]: command-line arguments
//!
//! ## Typical Usage
//!
//! ```bash
//! # Resolve against host files found at their device paths
//! samplesym events.json
//!
//! # Prefer tables recorded on the device, mirror dir for the rest
//! samplesym events.json --symbols device_syms.json --symfs ./symbols
//! ```
//!
//! ## Key Concepts
//!
//! - **Address space**: the set of mappings a process had at a point in time
//! - **Min vaddr**: link-time vaddr of a module's executable segment
//! - **Inlining**: one address may yield several frames, innermost first
//! - **Degradation**: nothing fails; unknown addresses become placeholder frames

pub mod cli;
pub mod config;
pub mod domain;
pub mod profiling;
pub mod symbolization;
pub mod trace_data;
