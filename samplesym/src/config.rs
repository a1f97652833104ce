//! Run configuration shared by the library and the driver

use std::path::PathBuf;

/// Knobs for one symbolization run
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Host directory mirroring device paths (`<symfs>/system/lib64/libc.so`)
    pub symfs: Option<PathBuf>,
    /// Demangle names produced by host strategies
    pub demangle: bool,
    /// Drop the leading run of `[kernel]` frames from every sample
    pub skip_kernel: bool,
    /// Prefetch pool size; 0 or 1 resolves strictly sequentially
    pub workers: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { symfs: None, demangle: true, skip_kernel: false, workers: 1 }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn uses_prefetch(&self) -> bool {
        self.workers > 1
    }
}
