//! Sample symbolization driver
//!
//! Walks the record stream once, replaying state records and resolving each
//! sample against the state current at that point. A sample's frames are the
//! leaf's frames followed by each call-chain entry's frames, in order.

use log::{debug, info};
use samplesym_common::{EventRecord, SampleRecord};

use super::prefetch;
use super::replay::EventReplayer;
use crate::config::ResolverConfig;
use crate::domain::{Pid, ResolvedFrame, Tid};
use crate::symbolization::resolver::is_kernel_frame;
use crate::symbolization::{
    is_kernel_address, kernel_frame, AddressResolver, ModuleIndexProvider, ResolverContext,
};

/// Label of samples from processes nothing is known about
pub const UNKNOWN_PROCESS: &str = "[unknown]";

/// The resolved form of one sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolizedSample {
    pub pid: Pid,
    pub tid: Tid,
    /// Leaf first, outermost caller last
    pub frames: Vec<ResolvedFrame>,
}

pub struct SampleSymbolizer<'a, P: ModuleIndexProvider + ?Sized> {
    replayer: EventReplayer,
    resolver: AddressResolver<'a, P>,
    skip_kernel: bool,
    pub sample_count: usize,
    pub frame_count: usize,
    /// Samples whose process had no address space
    pub unmapped_process_count: usize,
}

impl<'a, P: ModuleIndexProvider + ?Sized> SampleSymbolizer<'a, P> {
    pub fn new(modules: &'a P, ctx: &'a ResolverContext) -> Self {
        Self {
            replayer: EventReplayer::new(),
            resolver: AddressResolver::new(modules, ctx),
            skip_kernel: false,
            sample_count: 0,
            frame_count: 0,
            unmapped_process_count: 0,
        }
    }

    /// Drop the leading run of `[kernel]` frames from every sample
    #[must_use]
    pub fn with_skip_kernel(mut self, skip_kernel: bool) -> Self {
        self.skip_kernel = skip_kernel;
        self
    }

    /// Feed one record; samples come back resolved
    pub fn process(&mut self, event: &EventRecord) -> Option<SymbolizedSample> {
        match event {
            EventRecord::Sample(sample) => Some(self.symbolize(sample)),
            other => {
                self.replayer.apply(other);
                None
            }
        }
    }

    /// Resolve every sample in `events`, in order
    pub fn run<'e, I>(&mut self, events: I) -> Vec<SymbolizedSample>
    where
        I: IntoIterator<Item = &'e EventRecord>,
    {
        events.into_iter().filter_map(|event| self.process(event)).collect()
    }

    pub fn symbolize(&mut self, sample: &SampleRecord) -> SymbolizedSample {
        self.sample_count += 1;
        let (pid, tid) = (Pid(sample.pid), Tid(sample.tid));

        let mut frames = match self.replayer.address_space(pid) {
            Some(space) => std::iter::once(sample.ip)
                .chain(sample.callchain.iter().copied())
                .flat_map(|addr| self.resolver.decode(addr, space))
                .collect(),
            None => {
                self.unmapped_process_count += 1;
                vec![self.process_label(pid, tid, sample.ip)]
            }
        };

        if self.skip_kernel {
            strip_leading_kernel(&mut frames);
        }
        self.frame_count += frames.len();
        SymbolizedSample { pid, tid, frames }
    }

    /// Best-effort frame for a process without mappings
    fn process_label(&self, pid: Pid, tid: Tid, ip: u64) -> ResolvedFrame {
        if pid.is_idle() || is_kernel_address(ip) {
            return kernel_frame();
        }
        match self.replayer.thread_name(tid).or_else(|| self.replayer.thread_name(Tid(pid.0))) {
            Some(name) => ResolvedFrame::new(format!("[{name}]"), 0, None),
            None => {
                debug!("No mappings or name for {pid}/{tid}");
                ResolvedFrame::new(UNKNOWN_PROCESS, 0, None)
            }
        }
    }

    #[must_use]
    pub fn replayer(&self) -> &EventReplayer {
        &self.replayer
    }
}

/// Remove the contiguous `[kernel]` frames at the leaf end
pub fn strip_leading_kernel(frames: &mut Vec<ResolvedFrame>) {
    let kernel_frames = frames.iter().take_while(|f| is_kernel_frame(f)).count();
    frames.drain(..kernel_frames);
}

/// Symbolize a whole trace with the given configuration
///
/// With more than one worker, host lookups are prefetched in parallel first;
/// the result is identical to a sequential run.
pub fn symbolize_trace<P: ModuleIndexProvider + ?Sized>(
    events: &[EventRecord],
    modules: &P,
    ctx: &ResolverContext,
    config: &ResolverConfig,
) -> Vec<SymbolizedSample> {
    if config.uses_prefetch() {
        let plan = prefetch::plan(events, modules, ctx);
        prefetch::prefetch(ctx, plan, config.workers);
    }

    let mut symbolizer = SampleSymbolizer::new(modules, ctx).with_skip_kernel(config.skip_kernel);
    let samples = symbolizer.run(events);

    let replayer = symbolizer.replayer();
    info!(
        "Replayed {} mmaps ({} kernel), {} forks across {} processes",
        replayer.mmap_count,
        replayer.kernel_mmap_count,
        replayer.fork_count,
        replayer.process_count()
    );
    info!(
        "Symbolized {} samples into {} frames ({} without mappings)",
        symbolizer.sample_count, symbolizer.frame_count, symbolizer.unmapped_process_count
    );
    samples
}
