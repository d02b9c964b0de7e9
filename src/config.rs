//! Configuration for the telemetry registry.

/// Selects which telemetry streams the registry collects.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Enable event-loop lag collection on [`start`].
    ///
    /// Default: true
    ///
    /// [`start`]: crate::RuntimeTelemetry::start
    pub collect_event_loop: bool,

    /// Enable garbage-collection pause collection on [`start`].
    ///
    /// Default: true
    ///
    /// [`start`]: crate::RuntimeTelemetry::start
    pub collect_gc: bool,

    /// Poll heap-space statistics during snapshots. The heap collector needs
    /// no enabling; this toggle skips the poll entirely.
    ///
    /// Default: true
    pub collect_heap: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            collect_event_loop: true,
            collect_gc: true,
            collect_heap: true,
        }
    }
}

impl TelemetryConfig {
    /// Creates a configuration with all streams enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables event-loop lag collection.
    #[must_use]
    pub fn with_event_loop(mut self, enabled: bool) -> Self {
        self.collect_event_loop = enabled;
        self
    }

    /// Enables or disables garbage-collection pause collection.
    #[must_use]
    pub fn with_gc(mut self, enabled: bool) -> Self {
        self.collect_gc = enabled;
        self
    }

    /// Enables or disables the heap-space poll.
    #[must_use]
    pub fn with_heap(mut self, enabled: bool) -> Self {
        self.collect_heap = enabled;
        self
    }
}
