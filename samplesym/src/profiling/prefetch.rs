//! Batched host lookups
//!
//! Host strategies dominate run time, and lookups in different modules are
//! independent. A planning pass replays the trace to learn every host lookup
//! the real pass will need; a bounded pool then resolves them per module into
//! the shared [`ResolverContext`]. The sequential pass afterwards only hits
//! the cache.

use crossbeam_channel::bounded;
use log::{debug, info};
use samplesym_common::EventRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::thread;

use super::replay::EventReplayer;
use crate::domain::Pid;
use crate::symbolization::{AddressResolver, LookupKey, ModuleIndexProvider, ResolverContext};

/// Pending host lookups grouped by module
pub type PrefetchPlan = BTreeMap<String, BTreeSet<u64>>;

/// Collect the host lookups a symbolization pass over `events` would perform
///
/// Lookups already settled in `ctx` are left out. Min vaddrs are computed
/// here, so workers never race on them.
#[must_use]
pub fn plan<P: ModuleIndexProvider + ?Sized>(
    events: &[EventRecord],
    modules: &P,
    ctx: &ResolverContext,
) -> PrefetchPlan {
    let resolver = AddressResolver::new(modules, ctx);
    let mut replayer = EventReplayer::new();
    let mut plan = PrefetchPlan::new();

    for event in events {
        let EventRecord::Sample(sample) = event else {
            replayer.apply(event);
            continue;
        };
        let Some(space) = replayer.address_space(Pid(sample.pid)) else {
            continue;
        };
        for addr in std::iter::once(sample.ip).chain(sample.callchain.iter().copied()) {
            if let Some(key) = resolver.host_lookup_key(addr, space) {
                if !ctx.is_settled(&key) {
                    plan.entry(key.module).or_default().insert(key.offset);
                }
            }
        }
    }

    debug!(
        "Prefetch plan: {} lookups in {} modules",
        plan.values().map(BTreeSet::len).sum::<usize>(),
        plan.len()
    );
    plan
}

/// Resolve every planned lookup using at most `workers` threads
///
/// Each module is handled by a single worker, so no two threads ever work
/// on the same cache key.
pub fn prefetch(ctx: &ResolverContext, plan: PrefetchPlan, workers: usize) {
    if plan.is_empty() {
        return;
    }
    let workers = workers.clamp(1, plan.len());
    info!("Prefetching {} modules with {workers} workers", plan.len());

    let (tx, rx) = bounded::<(String, BTreeSet<u64>)>(workers);
    thread::scope(|scope| {
        for _ in 0..workers {
            let rx = rx.clone();
            scope.spawn(move || {
                for (module, offsets) in rx {
                    for offset in offsets {
                        ctx.host_resolve(&LookupKey { module: module.clone(), offset });
                    }
                }
            });
        }
        drop(rx);

        for job in plan {
            if tx.send(job).is_err() {
                break;
            }
        }
        drop(tx);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolization::module_index::{ModuleSymbolIndex, OnDeviceSymbols};
    use samplesym_common::{MmapRecord, SampleRecord};

    fn events() -> Vec<EventRecord> {
        let mmap = |pid, start, filename: &str| {
            EventRecord::Mmap(MmapRecord {
                pid,
                tid: pid,
                start,
                len: 0x1000,
                pgoff: 0,
                filename: filename.into(),
            })
        };
        vec![
            mmap(1, 0x1000, "liba.so"),
            mmap(1, 0x4000, "libb.so"),
            mmap(1, 0x8000, "libdevice.so"),
            EventRecord::Sample(SampleRecord {
                pid: 1,
                tid: 1,
                ip: 0x1010,
                callchain: vec![0x4020, 0x1010, 0x8000, 0xffff_ffff_8000_0000, 0x3000],
            }),
            // No address space: never planned
            EventRecord::Sample(SampleRecord { pid: 2, tid: 2, ip: 0x1010, callchain: vec![] }),
        ]
    }

    #[test]
    fn test_plan_collects_host_lookups() {
        let ctx = ResolverContext::new(Vec::new(), Box::new(|_: &str| 0_u64));
        let mut modules = OnDeviceSymbols::new();
        modules.insert("libdevice.so", ModuleSymbolIndex::new(0));

        let plan = plan(&events(), &modules, &ctx);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan["liba.so"], BTreeSet::from([0x10]));
        assert_eq!(plan["libb.so"], BTreeSet::from([0x20]));
    }

    #[test]
    fn test_prefetch_fills_skip_set_and_cache() {
        let ctx = ResolverContext::new(Vec::new(), Box::new(|_: &str| 0_u64));
        let plan = plan(&events(), &crate::symbolization::NoOnDeviceSymbols, &ctx);
        prefetch(&ctx, plan, 4);

        assert!(ctx.is_settled(&LookupKey::new("liba.so", 0x10)));
        assert!(ctx.is_settled(&LookupKey::new("libb.so", 0x20)));
        assert!(ctx.is_settled(&LookupKey::new("libdevice.so", 0x0)));

        // Already settled lookups are not planned again
        let replan = super::plan(&events(), &crate::symbolization::NoOnDeviceSymbols, &ctx);
        assert!(replan.is_empty());
    }
}
