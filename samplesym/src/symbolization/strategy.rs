//! Host-side resolution strategies and the pieces they share
//!
//! A strategy turns `(module, offset)` into frames using files available on the
//! host. Strategies are tried in a fixed priority order; the first one with a
//! usable answer wins.

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::{ResolvedFrame, SymbolizationError};

/// Function names the strategies emit when they know an address but not its name
pub const PLACEHOLDER_NAMES: &[&str] = &["", "??", "<unknown>"];

/// One way of resolving a module-relative offset on the host
///
/// `Ok` with an empty list means the strategy ran but has no answer. Frames are
/// returned innermost first and are never reordered by the caller.
pub trait HostStrategy: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Resolve `offset` (already adjusted by the module's min vaddr)
    ///
    /// # Errors
    /// `HostToolUnavailable` if the module cannot be read on the host,
    /// `HostToolFailed` if it was read but the lookup itself failed.
    fn resolve(&self, module: &str, offset: u64) -> Result<Vec<ResolvedFrame>, SymbolizationError>;
}

/// True if at least one frame carries a real function name
#[must_use]
pub fn is_usable(frames: &[ResolvedFrame]) -> bool {
    frames.iter().any(|frame| !PLACEHOLDER_NAMES.contains(&frame.symbol.as_str()))
}

/// Supplies the lowest read+execute load address of a module
///
/// Must return 0 on any failure.
pub trait MinVaddrProvider: Send + Sync {
    fn min_vaddr(&self, module: &str) -> u64;
}

impl<F> MinVaddrProvider for F
where
    F: Fn(&str) -> u64 + Send + Sync,
{
    fn min_vaddr(&self, module: &str) -> u64 {
        self(module)
    }
}

/// Maps module paths as seen on the device to files on the host
///
/// With a symfs root, `/system/lib64/libc.so` is looked up as
/// `<symfs>/system/lib64/libc.so` first and the raw path second.
#[derive(Debug, Clone, Default)]
pub struct ModuleLocator {
    symfs: Option<PathBuf>,
}

impl ModuleLocator {
    #[must_use]
    pub fn new(symfs: Option<PathBuf>) -> Self {
        Self { symfs }
    }

    #[must_use]
    pub fn locate(&self, module: &str) -> PathBuf {
        if let Some(ref root) = self.symfs {
            let candidate = root.join(module.trim_start_matches('/'));
            if candidate.is_file() {
                return candidate;
            }
        }
        PathBuf::from(module)
    }

    /// Read the host copy of `module`
    pub(crate) fn read(&self, module: &str) -> Result<Vec<u8>, LoadFailure> {
        let path = self.locate(module);
        fs::read(&path).map_err(|e| LoadFailure::Missing(format!("{}: {e}", path.display())))
    }
}

/// Why a module could not be prepared for lookups
#[derive(Debug, Clone)]
pub(crate) enum LoadFailure {
    /// File missing or unreadable
    Missing(String),
    /// File read but not usable (not ELF, no debug info, ...)
    Malformed(String),
}

impl LoadFailure {
    pub(crate) fn into_error(
        self,
        tool: &'static str,
        module: &str,
        offset: u64,
    ) -> SymbolizationError {
        match self {
            LoadFailure::Missing(reason) => {
                SymbolizationError::HostToolUnavailable { tool, module: module.to_string(), reason }
            }
            LoadFailure::Malformed(reason) => SymbolizationError::HostToolFailed {
                tool,
                module: module.to_string(),
                offset,
                reason,
            },
        }
    }
}

/// Per-module load results, including failures, computed at most once
///
/// The lock is not held while loading, so different modules load in parallel.
pub(crate) struct ModuleCache<T> {
    entries: Mutex<HashMap<String, Result<Arc<T>, LoadFailure>>>,
}

impl<T> Default for ModuleCache<T> {
    fn default() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }
}

impl<T> ModuleCache<T> {
    pub(crate) fn get_or_load(
        &self,
        module: &str,
        load: impl FnOnce() -> Result<T, LoadFailure>,
    ) -> Result<Arc<T>, LoadFailure> {
        if let Some(entry) = self.entries.lock().get(module) {
            return entry.clone();
        }

        let loaded = load().map(Arc::new);
        if let Err(ref failure) = loaded {
            debug!("Cannot load {module}: {failure:?}");
        }
        self.entries.lock().entry(module.to_string()).or_insert(loaded).clone()
    }
}

/// Path helper for log messages
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
