//! Runtime performance telemetry for embedded managed runtimes.
//!
//! This crate accumulates runtime health statistics a host bridge can
//! snapshot periodically:
//! - event-loop scheduling lag per loop iteration
//! - garbage-collection pause durations, per collection type and aggregate
//! - heap-space utilization
//!
//! Duration streams feed a [`StreamingHistogram`]: exact running
//! min/max/sum/count plus approximate median and p95 from a bounded-memory
//! quantile digest, so memory stays flat no matter how long the process runs.
//!
//! The host runtime is an external collaborator. It drives the collectors
//! through four notification contracts (loop prepare/check, GC before/after)
//! and a heap statistics source; all timestamps cross that boundary already
//! converted to the crate's canonical unit, microseconds. Everything runs on
//! the single thread driving the host loop.
//!
//! # Usage
//!
//! ```
//! use runtime_telemetry::collectors::{HeapSpaceSource, HeapSpaceStats};
//! use runtime_telemetry::{RuntimeTelemetry, TelemetryConfig};
//!
//! struct HostHeap;
//!
//! impl HeapSpaceSource for HostHeap {
//!     fn space_count(&self) -> usize {
//!         1
//!     }
//!
//!     fn space(&self, _index: usize) -> Option<HeapSpaceStats> {
//!         Some(HeapSpaceStats {
//!             name: "old_space".to_owned(),
//!             size: 8192,
//!             used_size: 1024,
//!             available_size: 7168,
//!             physical_size: 8192,
//!         })
//!     }
//! }
//!
//! let mut telemetry = RuntimeTelemetry::new(TelemetryConfig::default(), Box::new(HostHeap), 0);
//! telemetry.start();
//!
//! // The host loop's hooks feed the collectors...
//! telemetry.event_loop_mut().prepare(1_000, 5_000);
//! telemetry.event_loop_mut().check(2_000);
//!
//! // ...and the bridge snapshots on its own schedule.
//! let snapshot = telemetry.stats();
//! assert_eq!(
//!     snapshot.get_nested("eventLoop").and_then(|s| s.get_uint("count")),
//!     Some(1)
//! );
//! ```

#![warn(missing_docs)]

mod collector;
mod config;
mod histogram;
mod registry;
mod sink;

pub mod collectors;

pub use collector::{timeval_to_micros, Collector};
pub use config::TelemetryConfig;
pub use histogram::StreamingHistogram;
pub use registry::RuntimeTelemetry;
pub use sink::{StatsSink, StatsValue};
