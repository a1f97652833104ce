//! Per-run resolution state
//!
//! A `ResolverContext` owns every memo a replay run builds up: resolved
//! frames, module min vaddrs and the skip-set of lookups no strategy could
//! answer. One context is built per run; nothing is process-global, so
//! concurrent runs never share state. All maps sit behind their own mutex so
//! the prefetch pool can fill them from several threads.

use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::min_vaddr::ElfMinVaddr;
use super::strategy::{is_usable, HostStrategy, MinVaddrProvider, ModuleLocator};
use super::symbol_table::SymbolTableStrategy;
use super::symbolizer::DwarfStrategy;
use crate::config::ResolverConfig;
use crate::domain::ResolvedFrame;

/// A host lookup: module path plus offset adjusted by its min vaddr
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupKey {
    pub module: String,
    pub offset: u64,
}

impl LookupKey {
    pub fn new(module: impl Into<String>, offset: u64) -> Self {
        Self { module: module.into(), offset }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+0x{:x}", self.module, self.offset)
    }
}

/// Counters for the end-of-run summary
#[derive(Debug, Default)]
pub struct ResolverStats {
    cache_hits: AtomicU64,
    strategy_invocations: AtomicU64,
    skipped: AtomicU64,
    degraded: AtomicU64,
    on_device_hits: AtomicU64,
    on_device_misses: AtomicU64,
    unmapped: AtomicU64,
}

/// Point-in-time copy of [`ResolverStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub strategy_invocations: u64,
    pub skipped: u64,
    pub degraded: u64,
    pub on_device_hits: u64,
    pub on_device_misses: u64,
    pub unmapped: u64,
}

impl ResolverStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_on_device(&self, hit: bool) {
        Self::bump(if hit { &self.on_device_hits } else { &self.on_device_misses });
    }

    pub(crate) fn record_unmapped(&self) {
        Self::bump(&self.unmapped);
    }

    pub(crate) fn record_degraded(&self) {
        Self::bump(&self.degraded);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            strategy_invocations: self.strategy_invocations.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            on_device_hits: self.on_device_hits.load(Ordering::Relaxed),
            on_device_misses: self.on_device_misses.load(Ordering::Relaxed),
            unmapped: self.unmapped.load(Ordering::Relaxed),
        }
    }
}

pub struct ResolverContext {
    strategies: Vec<Box<dyn HostStrategy>>,
    min_vaddr_provider: Box<dyn MinVaddrProvider>,
    /// `None` remembers a lookup every strategy failed on
    frames: Mutex<HashMap<LookupKey, Option<Vec<ResolvedFrame>>>>,
    /// 0 means unknown or failed
    min_vaddrs: Mutex<HashMap<String, u64>>,
    skip_set: Mutex<HashSet<LookupKey>>,
    stats: ResolverStats,
}

impl ResolverContext {
    /// Context with an explicit strategy list, tried in order
    #[must_use]
    pub fn new(
        strategies: Vec<Box<dyn HostStrategy>>,
        min_vaddr_provider: Box<dyn MinVaddrProvider>,
    ) -> Self {
        Self {
            strategies,
            min_vaddr_provider,
            frames: Mutex::new(HashMap::new()),
            min_vaddrs: Mutex::new(HashMap::new()),
            skip_set: Mutex::new(HashSet::new()),
            stats: ResolverStats::default(),
        }
    }

    /// Context backed by the host's DWARF and symbol-table readers
    #[must_use]
    pub fn with_host_tools(config: &ResolverConfig) -> Self {
        let locator = ModuleLocator::new(config.symfs.clone());
        Self::new(
            vec![
                Box::new(DwarfStrategy::new(locator.clone(), config.demangle)),
                Box::new(SymbolTableStrategy::new(locator.clone(), config.demangle)),
            ],
            Box::new(ElfMinVaddr::new(locator)),
        )
    }

    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Min vaddr of `module`, computed once per run
    pub fn min_vaddr(&self, module: &str) -> u64 {
        if let Some(&vaddr) = self.min_vaddrs.lock().get(module) {
            return vaddr;
        }
        let vaddr = self.min_vaddr_provider.min_vaddr(module);
        debug!("min vaddr of {module} = 0x{vaddr:x}");
        *self.min_vaddrs.lock().entry(module.to_string()).or_insert(vaddr)
    }

    #[must_use]
    pub fn is_skipped(&self, key: &LookupKey) -> bool {
        self.skip_set.lock().contains(key)
    }

    /// True if the lookup needs no further strategy calls
    #[must_use]
    pub fn is_settled(&self, key: &LookupKey) -> bool {
        self.frames.lock().contains_key(key) || self.is_skipped(key)
    }

    /// Resolve through the host strategies, memoizing the outcome
    ///
    /// Returns `None` when every strategy failed; the key then lands in the
    /// skip-set and is never retried during this run.
    pub fn host_resolve(&self, key: &LookupKey) -> Option<Vec<ResolvedFrame>> {
        if self.is_skipped(key) {
            ResolverStats::bump(&self.stats.skipped);
            return None;
        }
        if let Some(cached) = self.frames.lock().get(key) {
            ResolverStats::bump(&self.stats.cache_hits);
            return cached.clone();
        }

        let mut last_error = None;
        let mut resolved = None;
        for strategy in &self.strategies {
            ResolverStats::bump(&self.stats.strategy_invocations);
            match strategy.resolve(&key.module, key.offset) {
                Ok(mut frames) if is_usable(&frames) => {
                    // Strategies may leave the module implicit
                    for frame in frames.iter_mut().filter(|f| f.module.is_none()) {
                        frame.module = Some(key.module.clone());
                    }
                    resolved = Some(frames);
                    break;
                }
                Ok(_) => debug!("{}: no answer for {key}", strategy.name()),
                Err(e) => {
                    debug!("{}: {e}", strategy.name());
                    last_error = Some(e);
                }
            }
        }

        if resolved.is_none() && self.skip_set.lock().insert(key.clone()) {
            match last_error {
                Some(e) => warn!("Cannot symbolize {key}: {e}"),
                None => warn!("No symbol found for {key}"),
            }
        }

        self.frames.lock().entry(key.clone()).or_insert(resolved).clone()
    }

    #[must_use]
    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    /// Number of memoized lookups, failures included
    #[must_use]
    pub fn cached_lookups(&self) -> usize {
        self.frames.lock().len()
    }
}

impl fmt::Debug for ResolverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverContext")
            .field("strategies", &self.strategy_names())
            .field("cached_lookups", &self.cached_lookups())
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SymbolizationError;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    /// Answers from a fixed table and counts its calls
    struct TableStrategy {
        name: &'static str,
        answers: HashMap<u64, Vec<ResolvedFrame>>,
        calls: Arc<AtomicUsize>,
    }

    impl HostStrategy for TableStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn resolve(
            &self,
            module: &str,
            offset: u64,
        ) -> Result<Vec<ResolvedFrame>, SymbolizationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers.get(&offset).cloned().ok_or_else(|| SymbolizationError::HostToolFailed {
                tool: self.name,
                module: module.to_string(),
                offset,
                reason: "no entry".to_string(),
            })
        }
    }

    fn frame(name: &str, offset: u64) -> ResolvedFrame {
        ResolvedFrame::new(name, offset, Some("libfoo.so".to_string()))
    }

    fn context(
        a: HashMap<u64, Vec<ResolvedFrame>>,
        b: HashMap<u64, Vec<ResolvedFrame>>,
    ) -> (ResolverContext, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let a_calls = Arc::new(AtomicUsize::new(0));
        let b_calls = Arc::new(AtomicUsize::new(0));
        let ctx = ResolverContext::new(
            vec![
                Box::new(TableStrategy { name: "a", answers: a, calls: a_calls.clone() }),
                Box::new(TableStrategy { name: "b", answers: b, calls: b_calls.clone() }),
            ],
            Box::new(|_: &str| 0_u64),
        );
        (ctx, a_calls, b_calls)
    }

    #[test]
    fn test_first_usable_strategy_wins() {
        let (ctx, a_calls, b_calls) = context(
            HashMap::from([(0x200, vec![frame("foo_func", 0x10)])]),
            HashMap::from([(0x200, vec![frame("never_used", 0)])]),
        );
        let frames = ctx.host_resolve(&LookupKey::new("libfoo.so", 0x200));
        assert_eq!(frames, Some(vec![frame("foo_func", 0x10)]));
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_placeholder_falls_through() {
        let (ctx, _, b_calls) = context(
            HashMap::from([(0x40, vec![frame("<unknown>", 0)])]),
            HashMap::from([(0x40, vec![frame("from_symtab", 0x8)])]),
        );
        let frames = ctx.host_resolve(&LookupKey::new("libfoo.so", 0x40));
        assert_eq!(frames, Some(vec![frame("from_symtab", 0x8)]));
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_module_attached_to_bare_frames() {
        let bare = |name: &str, offset| ResolvedFrame::new(name, offset, None);
        let (ctx, _, _) = context(
            HashMap::from([(
                0x200,
                vec![bare("inlined", 0), ResolvedFrame::new("outer", 0x10, Some("other.so".into()))],
            )]),
            HashMap::new(),
        );

        let frames = ctx.host_resolve(&LookupKey::new("libfoo.so", 0x200));
        assert_eq!(
            frames,
            Some(vec![frame("inlined", 0), ResolvedFrame::new("outer", 0x10, Some("other.so".into()))])
        );
    }

    #[test]
    fn test_repeat_lookup_is_memoized() {
        let (ctx, a_calls, b_calls) =
            context(HashMap::from([(0x200, vec![frame("foo_func", 0x10)])]), HashMap::new());
        let key = LookupKey::new("libfoo.so", 0x200);

        let first = ctx.host_resolve(&key);
        let second = ctx.host_resolve(&key);
        assert_eq!(first, second);
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.stats().snapshot().cache_hits, 1);
    }

    #[test]
    fn test_total_failure_enters_skip_set() {
        let (ctx, a_calls, b_calls) = context(HashMap::new(), HashMap::new());
        let key = LookupKey::new("libfoo.so", 0x999);

        assert_eq!(ctx.host_resolve(&key), None);
        assert!(ctx.is_skipped(&key));
        assert!(ctx.is_settled(&key));
        assert_eq!(ctx.host_resolve(&key), None);

        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        let stats = ctx.stats().snapshot();
        assert_eq!(stats.strategy_invocations, 2);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_min_vaddr_computed_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let ctx = ResolverContext::new(
            Vec::new(),
            Box::new(move |module: &str| {
                counter.fetch_add(1, Ordering::SeqCst);
                if module == "libfoo.so" {
                    0x1000_u64
                } else {
                    0
                }
            }),
        );
        assert_eq!(ctx.min_vaddr("libfoo.so"), 0x1000);
        assert_eq!(ctx.min_vaddr("libfoo.so"), 0x1000);
        assert_eq!(ctx.min_vaddr("libbar.so"), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lookup_key_display() {
        assert_eq!(LookupKey::new("libfoo.so", 0x200).to_string(), "libfoo.so+0x200");
    }
}
