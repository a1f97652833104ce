//! Structured error types for samplesym
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! None of these abort a replay run: the resolver turns each one into a
//! placeholder frame and a log line.

use super::types::Pid;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SymbolizationError {
    #[error("Address 0x{0:x} is not covered by any mapping")]
    UnmappedAddress(u64),

    #[error("No on-device symbol covers {module}+0x{offset:x}")]
    MissingOnDeviceSymbol { module: String, offset: u64 },

    #[error("{tool} cannot open {module}: {reason}")]
    HostToolUnavailable { tool: &'static str, module: String, reason: String },

    #[error("{tool} failed on {module}+0x{offset:x}: {reason}")]
    HostToolFailed { tool: &'static str, module: String, offset: u64, reason: String },

    #[error("Fork of {child} from unknown parent {parent}")]
    ForkWithoutKnownParent { child: Pid, parent: Pid },
}
