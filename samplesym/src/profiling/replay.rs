//! # Event Replay
//!
//! Rebuilds per-process address spaces from the chronological record stream.
//!
//! ## Event Routing
//!
//! - `Comm` → naming table (labels samples of processes with no mappings)
//! - `Mmap` → `AddressSpace[pid]`, created on first use; kernel mmaps ignored
//! - `Fork` → child gets an independent copy of the parent's space; thread
//!   creation (`pid == ppid`) ignored
//! - `Sample` → not consumed here
//!
//! Records are trusted to arrive in causal order: no buffering or reordering.

use log::{debug, warn};
use samplesym_common::{CommRecord, EventRecord, ForkRecord, MmapRecord};
use std::collections::{HashMap, HashSet};

use crate::domain::{Pid, SymbolizationError, Tid};
use crate::symbolization::{AddressSpace, Mapping};

/// Replay state for one trace
#[derive(Debug, Default)]
pub struct EventReplayer {
    spaces: HashMap<Pid, AddressSpace>,
    thread_names: HashMap<Tid, String>,
    /// Parents already reported as unknown
    unknown_parents: HashSet<Pid>,
    pub mmap_count: usize,
    pub kernel_mmap_count: usize,
    pub fork_count: usize,
}

impl EventReplayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a state-changing record
    ///
    /// Returns `false` for samples, which leave replay state untouched.
    pub fn apply(&mut self, event: &EventRecord) -> bool {
        match event {
            EventRecord::Comm(comm) => self.on_comm(comm),
            EventRecord::Mmap(mmap) => self.on_mmap(mmap),
            EventRecord::Fork(fork) => self.on_fork(*fork),
            EventRecord::Sample(_) => return false,
        }
        true
    }

    fn on_comm(&mut self, comm: &CommRecord) {
        self.thread_names.insert(Tid(comm.tid), comm.name.clone());
    }

    fn on_mmap(&mut self, mmap: &MmapRecord) {
        if mmap.is_kernel() {
            self.kernel_mmap_count += 1;
            return;
        }
        self.mmap_count += 1;
        self.spaces.entry(Pid(mmap.pid)).or_default().extend([Mapping::from(mmap)]);
    }

    fn on_fork(&mut self, fork: ForkRecord) {
        if fork.pid == fork.ppid {
            return;
        }
        self.fork_count += 1;

        let (child, parent) = (Pid(fork.pid), Pid(fork.ppid));
        match self.spaces.get(&parent) {
            Some(space) => {
                let copy = space.copy();
                debug!("{child} inherits {} mappings from {parent}", copy.len());
                self.spaces.insert(child, copy);
            }
            None => {
                if self.unknown_parents.insert(parent) {
                    warn!("{}", SymbolizationError::ForkWithoutKnownParent { child, parent });
                }
            }
        }
    }

    #[must_use]
    pub fn address_space(&self, pid: Pid) -> Option<&AddressSpace> {
        self.spaces.get(&pid)
    }

    #[must_use]
    pub fn thread_name(&self, tid: Tid) -> Option<&str> {
        self.thread_names.get(&tid).map(String::as_str)
    }

    #[must_use]
    pub fn process_count(&self) -> usize {
        self.spaces.len()
    }

    /// Forget everything, ready for the next trace
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
