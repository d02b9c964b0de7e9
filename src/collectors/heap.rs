//! Point-in-time heap-space snapshot collector.

use crate::collector::Collector;
use crate::sink::StatsSink;

/// Statistics for one heap space, captured at poll time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapSpaceStats {
    /// Name of the space, e.g. `new_space` or `old_space`.
    pub name: String,
    /// Reserved size of the space in bytes.
    pub size: u64,
    /// Bytes currently in use.
    pub used_size: u64,
    /// Bytes still available before the space must grow.
    pub available_size: u64,
    /// Bytes of physical memory committed for the space.
    pub physical_size: u64,
}

/// Host-side access to the runtime's heap spaces.
///
/// Mirrors the indexed statistics API managed runtimes expose: a space count
/// and a per-index query that can fail for an individual space.
pub trait HeapSpaceSource {
    /// Number of heap spaces the runtime currently exposes.
    fn space_count(&self) -> usize;

    /// Statistics for the space at `index`, or `None` when they cannot be
    /// obtained right now.
    fn space(&self, index: usize) -> Option<HeapSpaceStats>;
}

/// Polls heap-space utilization from the host runtime.
///
/// Stateless: nothing accumulates between snapshots and `inject` has no reset
/// side effect. A space whose statistics cannot be obtained is omitted from
/// the snapshot rather than failing it.
pub struct HeapSnapshotCollector {
    source: Box<dyn HeapSpaceSource>,
}

impl HeapSnapshotCollector {
    /// Creates the collector around the host's heap statistics source.
    pub fn new(source: Box<dyn HeapSpaceSource>) -> Self {
        Self { source }
    }
}

impl Collector for HeapSnapshotCollector {
    fn inject(&mut self, sink: &mut StatsSink) {
        let mut spaces = Vec::with_capacity(self.source.space_count());
        for index in 0..self.source.space_count() {
            if let Some(stats) = self.source.space(index) {
                let mut space = StatsSink::new();
                space.set("spaceName", stats.name);
                space.set("size", stats.size);
                space.set("usedSize", stats.used_size);
                space.set("availableSize", stats.available_size);
                space.set("physicalSize", stats.physical_size);
                spaces.push(space);
            }
        }
        let mut heap = StatsSink::new();
        heap.set("spaces", spaces);
        sink.set("heap", heap);
    }

    fn name(&self) -> &'static str {
        "heap"
    }
}
