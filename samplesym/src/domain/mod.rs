//! Domain model for samplesym
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - A named frame record shared by every resolution strategy
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{Pid, ResolvedFrame, Tid};

pub use errors::SymbolizationError;
