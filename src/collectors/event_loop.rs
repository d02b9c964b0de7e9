//! Event-loop scheduling lag collector.

use log::debug;

use crate::collector::Collector;
use crate::histogram::StreamingHistogram;
use crate::sink::StatsSink;

/// Measures how late the host's event loop is running its scheduled work.
///
/// The host loop notifies the collector twice per iteration, with timestamps
/// already converted to microseconds:
///
/// - [`prepare`](Self::prepare) just before the loop blocks waiting for I/O,
///   carrying the loop's own estimate of how long it intends to block;
/// - [`check`](Self::check) just after the blocking wait returns.
///
/// Each iteration contributes one latency sample: the time spent running
/// ready callbacks since the loop last woke, plus any overrun of the blocking
/// wait past its own estimate (which indicates external contention keeping
/// the process off-CPU).
pub struct EventLoopLagCollector {
    enabled: bool,
    histogram: StreamingHistogram,
    /// Timestamp of the current iteration's prepare phase.
    poll_start: u64,
    /// Timestamp of the previous iteration's check phase.
    poll_end: u64,
    /// How long the loop intended to block in the current iteration.
    expected_timeout: u64,
}

impl EventLoopLagCollector {
    /// Creates the collector. `now` is the construction timestamp; the first
    /// latency sample after enabling is measured against it rather than a
    /// real previous wake-up, so that sample carries a known startup bias.
    pub fn new(now: u64) -> Self {
        Self {
            enabled: false,
            histogram: StreamingHistogram::new(),
            poll_start: now,
            poll_end: now,
            expected_timeout: 0,
        }
    }

    /// Starts accepting phase notifications. Idempotent. The subscription is
    /// purely observational: it must not keep an otherwise idle host process
    /// alive, which is the host's side of the contract.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stops accepting phase notifications and discards any accumulation not
    /// yet reported. Idempotent.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.histogram.reset();
    }

    /// True while phase notifications are being recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Prepare-phase notification: the loop is about to block for I/O and
    /// expects to sleep for `expected_timeout`.
    pub fn prepare(&mut self, now: u64, expected_timeout: u64) {
        if !self.enabled {
            return;
        }
        self.poll_start = now;
        self.expected_timeout = expected_timeout;
    }

    /// Check-phase notification: the blocking wait just returned.
    pub fn check(&mut self, now: u64) {
        if !self.enabled {
            return;
        }
        let poll_time = now.saturating_sub(self.poll_start);
        // Time spent running ready callbacks since the loop last woke.
        let mut latency = self.poll_start.saturating_sub(self.poll_end);
        if poll_time > self.expected_timeout {
            // The block itself overran its schedule.
            latency += poll_time - self.expected_timeout;
        }
        self.histogram.add(latency);
        self.poll_end = now;
    }
}

impl Collector for EventLoopLagCollector {
    fn inject(&mut self, sink: &mut StatsSink) {
        debug!("injecting event loop stats ({} samples)", self.histogram.count());
        sink.set("eventLoop", self.histogram.summary());
        self.histogram.reset();
    }

    fn name(&self) -> &'static str {
        "event-loop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_of(collector: &mut EventLoopLagCollector) -> StatsSink {
        let mut sink = StatsSink::new();
        collector.inject(&mut sink);
        sink.get_nested("eventLoop").cloned().unwrap()
    }

    #[test]
    fn test_latency_without_overrun() {
        let mut collector = EventLoopLagCollector::new(0);
        collector.enable();

        // Callback work ran from construction (t=0) until prepare at t=1000;
        // the 1000us block stayed within its 5000us estimate.
        collector.prepare(1_000, 5_000);
        collector.check(2_000);

        let stats = summary_of(&mut collector);
        assert_eq!(stats.get_uint("count"), Some(1));
        assert_eq!(stats.get_uint("sum"), Some(1_000));
    }

    #[test]
    fn test_latency_with_overrun() {
        let mut collector = EventLoopLagCollector::new(0);
        collector.enable();
        collector.prepare(1_000, 5_000);
        collector.check(2_000);

        // Blocked for 5000us against a 1000us estimate: the 4000us overrun
        // counts toward latency on top of the 18000us of callback work.
        collector.prepare(20_000, 1_000);
        collector.check(25_000);

        let stats = summary_of(&mut collector);
        assert_eq!(stats.get_uint("count"), Some(2));
        assert_eq!(stats.get_uint("min"), Some(1_000));
        assert_eq!(stats.get_uint("max"), Some(22_000));
        assert_eq!(stats.get_uint("sum"), Some(23_000));
    }

    #[test]
    fn test_first_sample_measured_against_construction_time() {
        let mut collector = EventLoopLagCollector::new(500);
        collector.enable();
        collector.prepare(1_500, 10_000);
        collector.check(2_000);

        let stats = summary_of(&mut collector);
        assert_eq!(stats.get_uint("sum"), Some(1_000));
    }

    #[test]
    fn test_disabled_collector_ignores_notifications() {
        let mut collector = EventLoopLagCollector::new(0);
        collector.prepare(1_000, 0);
        collector.check(2_000);

        let stats = summary_of(&mut collector);
        assert_eq!(stats.get_uint("count"), Some(0));
    }

    #[test]
    fn test_disable_discards_accumulation() {
        let mut collector = EventLoopLagCollector::new(0);
        collector.enable();
        collector.prepare(1_000, 5_000);
        collector.check(2_000);

        collector.disable();
        collector.enable();

        let stats = summary_of(&mut collector);
        assert_eq!(stats.get_uint("count"), Some(0));
    }

    #[test]
    fn test_inject_resets_interval_state() {
        let mut collector = EventLoopLagCollector::new(0);
        collector.enable();
        collector.prepare(1_000, 5_000);
        collector.check(2_000);

        let first = summary_of(&mut collector);
        assert_eq!(first.get_uint("count"), Some(1));

        let second = summary_of(&mut collector);
        assert_eq!(second.get_uint("count"), Some(0));
        assert_eq!(second.get_uint("sum"), Some(0));
        assert_eq!(second.get_uint("min"), Some(0));
        assert_eq!(second.get_uint("max"), Some(0));
        assert_eq!(second.get_uint("avg"), Some(0));
        assert_eq!(second.get_uint("median"), Some(0));
        assert_eq!(second.get_uint("p95"), Some(0));
    }

    #[test]
    fn test_zero_timeout_counts_whole_poll_as_overrun() {
        let mut collector = EventLoopLagCollector::new(0);
        collector.enable();

        // An expected timeout of zero means the loop intended not to block at
        // all, so the entire 700us poll is overrun.
        collector.prepare(100, 0);
        collector.check(800);

        let stats = summary_of(&mut collector);
        assert_eq!(stats.get_uint("sum"), Some(800));
    }
}
