//! Garbage-collection pause collector.

use std::collections::BTreeMap;

use log::debug;

use crate::collector::Collector;
use crate::histogram::StreamingHistogram;
use crate::sink::StatsSink;

/// Collection types reported by the host runtime.
///
/// The host identifies a collection by a bit-flag code; [`All`](GcKind::All)
/// is the reserved wildcard and doubles as the aggregate bucket every pause
/// is counted into, named or not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum GcKind {
    /// Young-generation collection.
    Scavenge,
    /// Full mark-sweep-compact collection.
    MarkSweepCompact,
    /// One increment of a concurrent marking cycle.
    IncrementalMarking,
    /// Weak-callback processing phase.
    ProcessWeakCallbacks,
    /// Aggregate over every collection type.
    All,
}

impl GcKind {
    /// Maps the host's numeric collection code. Returns `None` for codes the
    /// taxonomy has no name for; such pauses still count into the aggregate.
    pub fn from_code(code: u32) -> Option<GcKind> {
        match code {
            1 => Some(GcKind::Scavenge),
            2 => Some(GcKind::MarkSweepCompact),
            4 => Some(GcKind::IncrementalMarking),
            8 => Some(GcKind::ProcessWeakCallbacks),
            15 => Some(GcKind::All),
            _ => None,
        }
    }

    /// Human-readable name used as the output key.
    pub fn name(self) -> &'static str {
        match self {
            GcKind::Scavenge => "scavenge",
            GcKind::MarkSweepCompact => "markSweepCompact",
            GcKind::IncrementalMarking => "incrementalMarking",
            GcKind::ProcessWeakCallbacks => "processWeakCallbacks",
            GcKind::All => "all",
        }
    }
}

/// Accumulates pause durations per collection type, plus an aggregate.
///
/// The host brackets every collection with [`before`](Self::before) and
/// [`after`](Self::after). The bracket is synchronous and non-reentrant: no
/// other instrumented code runs between the two calls.
pub struct GcPauseCollector {
    enabled: bool,
    pause_start: u64,
    by_kind: BTreeMap<GcKind, StreamingHistogram>,
    all: StreamingHistogram,
}

impl GcPauseCollector {
    /// Creates the collector with no per-type buckets yet; buckets appear as
    /// collection types are first observed.
    pub fn new() -> Self {
        Self {
            enabled: false,
            pause_start: 0,
            by_kind: BTreeMap::new(),
            all: StreamingHistogram::new(),
        }
    }

    /// Starts accepting collection brackets. Idempotent.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stops accepting collection brackets and discards any accumulation not
    /// yet reported. Idempotent.
    pub fn disable(&mut self) {
        self.enabled = false;
        for hist in self.by_kind.values_mut() {
            hist.reset();
        }
        self.all.reset();
    }

    /// True while collection brackets are being recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A collection is starting. The code is part of the host hook signature
    /// but only matters on the closing bracket.
    pub fn before(&mut self, _code: u32, now: u64) {
        if !self.enabled {
            return;
        }
        self.pause_start = now;
    }

    /// The collection of type `code` just finished.
    pub fn after(&mut self, code: u32, now: u64) {
        if !self.enabled {
            return;
        }
        let duration = now.saturating_sub(self.pause_start);
        match GcKind::from_code(code) {
            // The wildcard code and unmapped codes get no named bucket; the
            // aggregate below still counts them.
            Some(kind) if kind != GcKind::All => {
                self.by_kind.entry(kind).or_default().add(duration);
            }
            _ => {}
        }
        self.all.add(duration);
    }
}

impl Default for GcPauseCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for GcPauseCollector {
    fn inject(&mut self, sink: &mut StatsSink) {
        debug!("injecting gc stats ({} pauses)", self.all.count());
        let mut gc = StatsSink::new();
        for (kind, hist) in &mut self.by_kind {
            if hist.count() > 0 {
                gc.set(kind.name(), hist.summary());
                hist.reset();
            }
        }
        if self.all.count() > 0 {
            gc.set(GcKind::All.name(), self.all.summary());
            self.all.reset();
        }
        sink.set("gc", gc);
    }

    fn name(&self) -> &'static str {
        "gc"
    }
}
