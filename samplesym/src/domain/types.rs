//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent passing a TID where a PID is expected, and
//! `ResolvedFrame` keeps frame lists from different strategies from being
//! mixed up positionally.

use std::fmt;

/// Process ID
///
/// Represents a process (thread group) ID in the profiled system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(pub u32);

impl Pid {
    /// The idle/swapper task; never owns a userspace address space
    pub const IDLE: Pid = Pid(samplesym_common::IDLE_PID);

    #[must_use]
    pub fn is_idle(self) -> bool {
        self == Self::IDLE
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

impl From<u32> for Pid {
    fn from(pid: u32) -> Self {
        Pid(pid)
    }
}

/// Thread ID
///
/// Represents a thread ID in the profiled system. Comm records name threads,
/// so the naming table is keyed by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tid(pub u32);

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}

impl From<u32> for Tid {
    fn from(tid: u32) -> Self {
        Tid(tid)
    }
}

/// One logical frame an address resolved to
///
/// A single address yields several of these when the compiler inlined calls;
/// they are ordered innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedFrame {
    pub symbol: String,
    /// Offset of the address from the start of `symbol`
    pub offset: u64,
    /// Owning module, `None` when the address could not be attributed
    pub module: Option<String>,
}

impl ResolvedFrame {
    pub fn new(symbol: impl Into<String>, offset: u64, module: Option<String>) -> Self {
        Self { symbol: symbol.into(), offset, module }
    }

    /// Format the frame for display
    #[must_use]
    pub fn format(&self) -> String {
        let mut out = if self.offset == 0 {
            self.symbol.clone()
        } else {
            format!("{}+0x{:x}", self.symbol, self.offset)
        };
        if let Some(ref module) = self.module {
            out.push_str(" (");
            out.push_str(module);
            out.push(')');
        }
        out
    }
}

impl fmt::Display for ResolvedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_display() {
        assert_eq!(Pid(1234).to_string(), "PID:1234");
        assert_eq!(Tid(7).to_string(), "TID:7");
    }

    #[test]
    fn test_idle_pid() {
        assert!(Pid::from(0).is_idle());
        assert!(!Pid(1).is_idle());
    }

    #[test]
    fn test_frame_format() {
        let frame = ResolvedFrame::new("foo_func", 0x10, Some("libfoo.so".to_string()));
        assert_eq!(frame.format(), "foo_func+0x10 (libfoo.so)");

        let bare = ResolvedFrame::new("0x1234 (no mapped segment)", 0, None);
        assert_eq!(bare.to_string(), "0x1234 (no mapped segment)");
    }
}
