//! The shared collector capability and time conversion helpers.

use crate::sink::StatsSink;

/// Capability shared by all collectors: flush current statistics into a sink.
///
/// `inject` is consume-and-reset: after it returns, the collector's interval
/// accumulation is empty, so repeated snapshots report only activity since
/// the previous one. Calling it with zero accumulated samples is fine and
/// yields zero-valued stats.
///
/// # Example
///
/// ```
/// use runtime_telemetry::{Collector, StatsSink};
///
/// struct UptimeCollector {
///     micros: u64,
/// }
///
/// impl Collector for UptimeCollector {
///     fn inject(&mut self, sink: &mut StatsSink) {
///         sink.set("uptime", self.micros);
///         self.micros = 0;
///     }
///
///     fn name(&self) -> &'static str {
///         "uptime"
///     }
/// }
/// ```
pub trait Collector {
    /// Writes current stats into `sink` and resets interval accumulation.
    fn inject(&mut self, sink: &mut StatsSink);

    /// Name of this collector for debugging and logging.
    fn name(&self) -> &'static str;
}

/// Converts a host two-field `(seconds, microseconds)` timestamp into one
/// scalar duration in the crate's canonical unit, microseconds.
///
/// Several host APIs expose time split this way; collectors only ever see the
/// converted scalar.
pub fn timeval_to_micros(seconds: u64, microseconds: u64) -> u64 {
    seconds * 1_000_000 + microseconds
}
