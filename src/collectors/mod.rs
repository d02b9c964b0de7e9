//! Built-in collectors.
//!
//! One collector per telemetry stream:
//! - event-loop scheduling lag
//! - garbage-collection pause durations
//! - heap-space utilization

mod event_loop;
mod gc;
mod heap;

pub use event_loop::EventLoopLagCollector;
pub use gc::{GcKind, GcPauseCollector};
pub use heap::{HeapSnapshotCollector, HeapSpaceSource, HeapSpaceStats};
