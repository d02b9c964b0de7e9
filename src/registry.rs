//! The collector registry and its orchestrator-facing entry points.

use log::debug;

use crate::collector::Collector;
use crate::collectors::{
    EventLoopLagCollector, GcPauseCollector, HeapSnapshotCollector, HeapSpaceSource,
};
use crate::config::TelemetryConfig;
use crate::sink::StatsSink;

/// Owns one instance of each collector and composes snapshots.
///
/// The bridge embedding this crate constructs the registry once at process
/// start, wires the host's instrumentation hooks to the collectors exposed by
/// [`event_loop_mut`](Self::event_loop_mut) and [`gc_mut`](Self::gc_mut), and
/// then drives three verbs: [`start`](Self::start), [`stop`](Self::stop) and
/// [`stats`](Self::stats).
///
/// All collector callbacks and snapshot calls run on the thread driving the
/// host loop, so the registry is a plain `&mut self` state machine with no
/// internal locking.
pub struct RuntimeTelemetry {
    config: TelemetryConfig,
    event_loop: EventLoopLagCollector,
    gc: GcPauseCollector,
    heap: HeapSnapshotCollector,
}

impl RuntimeTelemetry {
    /// Creates the registry. `now` is the current host timestamp in
    /// microseconds; it seeds the event-loop collector's construction-time
    /// reference.
    pub fn new(config: TelemetryConfig, heap_source: Box<dyn HeapSpaceSource>, now: u64) -> Self {
        Self {
            config,
            event_loop: EventLoopLagCollector::new(now),
            gc: GcPauseCollector::new(),
            heap: HeapSnapshotCollector::new(heap_source),
        }
    }

    /// Enables the event-loop and GC collectors, honoring the config
    /// toggles. The heap collector is poll-on-demand and needs no enabling.
    /// Idempotent.
    pub fn start(&mut self) {
        if self.config.collect_event_loop {
            self.event_loop.enable();
        }
        if self.config.collect_gc {
            self.gc.enable();
        }
        debug!("runtime telemetry started");
    }

    /// Disables the event-loop and GC collectors, discarding unreported
    /// accumulation. Idempotent.
    pub fn stop(&mut self) {
        self.event_loop.disable();
        self.gc.disable();
        debug!("runtime telemetry stopped");
    }

    /// Builds one snapshot by injecting the event-loop, GC and heap
    /// collectors, in that fixed order.
    ///
    /// Injection consumes: after this returns, every collector's interval
    /// accumulation is empty, so the next snapshot reports only activity
    /// since this one.
    pub fn stats(&mut self) -> StatsSink {
        let mut sink = StatsSink::new();
        self.event_loop.inject(&mut sink);
        self.gc.inject(&mut sink);
        if self.config.collect_heap {
            self.heap.inject(&mut sink);
        }
        sink
    }

    /// Like [`stats`](Self::stats), marshalled to a JSON value for bridges
    /// that hand the snapshot straight to a host object.
    pub fn stats_json(&mut self) -> serde_json::Value {
        serde_json::to_value(self.stats()).unwrap_or(serde_json::Value::Null)
    }

    /// The event-loop collector, for wiring the host loop's prepare/check
    /// notifications.
    pub fn event_loop_mut(&mut self) -> &mut EventLoopLagCollector {
        &mut self.event_loop
    }

    /// The GC collector, for wiring the host runtime's collection brackets.
    pub fn gc_mut(&mut self) -> &mut GcPauseCollector {
        &mut self.gc
    }
}

impl std::fmt::Debug for RuntimeTelemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeTelemetry")
            .field("config", &self.config)
            .field("event_loop_enabled", &self.event_loop.is_enabled())
            .field("gc_enabled", &self.gc.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::HeapSpaceStats;

    struct OneSpace;

    impl HeapSpaceSource for OneSpace {
        fn space_count(&self) -> usize {
            1
        }

        fn space(&self, _index: usize) -> Option<HeapSpaceStats> {
            Some(HeapSpaceStats {
                name: "old_space".to_owned(),
                size: 8192,
                used_size: 1024,
                available_size: 7168,
                physical_size: 8192,
            })
        }
    }

    fn registry(config: TelemetryConfig) -> RuntimeTelemetry {
        RuntimeTelemetry::new(config, Box::new(OneSpace), 0)
    }

    fn feed_one_iteration(telemetry: &mut RuntimeTelemetry) {
        telemetry.event_loop_mut().prepare(1_000, 5_000);
        telemetry.event_loop_mut().check(2_000);
        telemetry.gc_mut().before(1, 2_000);
        telemetry.gc_mut().after(1, 2_500);
    }

    #[test]
    fn test_snapshot_contains_all_sections() {
        let mut telemetry = registry(TelemetryConfig::default());
        telemetry.start();
        feed_one_iteration(&mut telemetry);

        let snapshot = telemetry.stats();
        let event_loop = snapshot.get_nested("eventLoop").unwrap();
        assert_eq!(event_loop.get_uint("count"), Some(1));
        assert_eq!(event_loop.get_uint("sum"), Some(1_000));

        let gc = snapshot.get_nested("gc").unwrap();
        assert_eq!(
            gc.get_nested("scavenge").and_then(|s| s.get_uint("sum")),
            Some(500)
        );
        assert_eq!(
            gc.get_nested("all").and_then(|s| s.get_uint("count")),
            Some(1)
        );

        let spaces = snapshot
            .get_nested("heap")
            .unwrap()
            .get_list("spaces")
            .unwrap();
        assert_eq!(spaces[0].get_text("spaceName"), Some("old_space"));
    }

    #[test]
    fn test_second_snapshot_reports_nothing() {
        let mut telemetry = registry(TelemetryConfig::default());
        telemetry.start();
        feed_one_iteration(&mut telemetry);
        let _ = telemetry.stats();

        let snapshot = telemetry.stats();
        let event_loop = snapshot.get_nested("eventLoop").unwrap();
        assert_eq!(event_loop.get_uint("count"), Some(0));
        assert_eq!(event_loop.get_uint("p95"), Some(0));
        assert!(snapshot.get_nested("gc").unwrap().is_empty());
        // The heap poll is stateless and still reports.
        assert!(snapshot.get_nested("heap").is_some());
    }

    #[test]
    fn test_stop_disables_event_intake() {
        let mut telemetry = registry(TelemetryConfig::default());
        telemetry.start();
        telemetry.stop();
        feed_one_iteration(&mut telemetry);

        let snapshot = telemetry.stats();
        assert_eq!(
            snapshot.get_nested("eventLoop").and_then(|s| s.get_uint("count")),
            Some(0)
        );
        assert!(snapshot.get_nested("gc").unwrap().is_empty());
    }

    #[test]
    fn test_config_toggles_are_honored() {
        let config = TelemetryConfig::new()
            .with_event_loop(false)
            .with_heap(false);
        let mut telemetry = registry(config);
        telemetry.start();
        feed_one_iteration(&mut telemetry);

        let snapshot = telemetry.stats();
        // Disabled event-loop stream still reports its zero-valued section.
        assert_eq!(
            snapshot.get_nested("eventLoop").and_then(|s| s.get_uint("count")),
            Some(0)
        );
        // GC stayed enabled.
        assert!(!snapshot.get_nested("gc").unwrap().is_empty());
        // The heap poll was skipped entirely.
        assert!(snapshot.get_nested("heap").is_none());
    }

    #[test]
    fn test_stats_json_shape() {
        let mut telemetry = registry(TelemetryConfig::default());
        telemetry.start();
        feed_one_iteration(&mut telemetry);

        let json = telemetry.stats_json();
        assert_eq!(json["gc"]["scavenge"]["sum"], serde_json::json!(500));
        assert_eq!(
            json["heap"]["spaces"][0]["spaceName"],
            serde_json::json!("old_space")
        );
    }
}
