//! Bounded-memory running statistics with approximate percentile queries.

use crate::sink::StatsSink;

/// Compression factor of the quantile digest. The merged centroid count stays
/// in the order of this value no matter how many samples are added, and the
/// relative rank error shrinks as the factor grows, tightest at the tails.
const COMPRESSION: f64 = 1000.0;

/// Samples buffered before they are folded into the centroid list. Folding is
/// O((centroids + buffer) log n), so buffering keeps `add` amortized cheap.
const BUFFER_CAPACITY: usize = 512;

/// One cluster of nearby samples: their mean and how many they represent.
#[derive(Clone, Copy, Debug)]
struct Centroid {
    mean: f64,
    weight: f64,
}

/// Merging quantile digest over an unbounded stream of samples.
///
/// Incoming values are buffered and periodically merged into a sorted list of
/// centroids. A cluster may only span one unit of the arcsine scale function
/// below, which keeps clusters small near the distribution tails (where rank
/// resolution matters for p95) and coarse in the middle, and caps the merged
/// centroid count near the compression factor.
#[derive(Clone, Debug)]
struct Digest {
    centroids: Vec<Centroid>,
    buffer: Vec<f64>,
    /// Total weight held by `centroids`, excluding the buffer.
    weight: f64,
    /// Smallest and largest samples seen, used to anchor tail interpolation.
    lo: f64,
    hi: f64,
}

impl Digest {
    fn new() -> Self {
        Digest {
            centroids: Vec::new(),
            buffer: Vec::with_capacity(BUFFER_CAPACITY),
            weight: 0.0,
            lo: f64::MAX,
            hi: f64::MIN,
        }
    }

    fn add(&mut self, value: f64) {
        if value < self.lo {
            self.lo = value;
        }
        if value > self.hi {
            self.hi = value;
        }
        self.buffer.push(value);
        if self.buffer.len() >= BUFFER_CAPACITY {
            self.compress();
        }
    }

    /// Rank scale function. One unit of `k` is the most a single cluster may
    /// span, so the fully merged centroid count tracks the compression
    /// factor.
    fn scale(q: f64) -> f64 {
        COMPRESSION / (2.0 * std::f64::consts::PI) * (2.0 * q - 1.0).asin()
    }

    /// Folds buffered samples into the centroid list and re-compresses it.
    fn compress(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let mut incoming = std::mem::take(&mut self.centroids);
        incoming.extend(self.buffer.drain(..).map(|v| Centroid {
            mean: v,
            weight: 1.0,
        }));
        incoming.sort_by(|a, b| a.mean.total_cmp(&b.mean));

        let total: f64 = incoming.iter().map(|c| c.weight).sum();
        let mut merged: Vec<Centroid> = Vec::new();
        // Weight of clusters already closed, and the scale value at the open
        // cluster's left rank edge.
        let mut emitted = 0.0;
        let mut k_left = Self::scale(0.0);
        let mut current: Option<Centroid> = None;
        for next in incoming {
            match current.as_mut() {
                None => current = Some(next),
                Some(cur) => {
                    let proposed = cur.weight + next.weight;
                    let q_right = (emitted + proposed) / total;
                    if Self::scale(q_right) - k_left <= 1.0 {
                        cur.mean += (next.mean - cur.mean) * next.weight / proposed;
                        cur.weight = proposed;
                    } else {
                        emitted += cur.weight;
                        k_left = Self::scale(emitted / total);
                        merged.push(*cur);
                        current = Some(next);
                    }
                }
            }
        }
        if let Some(cur) = current {
            merged.push(cur);
        }
        self.centroids = merged;
        self.weight = total;
    }

    /// Interpolated sample value at rank `q`, clamped to `[0, 1]`.
    ///
    /// Pending buffered samples are folded in first. Returns 0 for an empty
    /// digest; the histogram wrapping it checks emptiness before asking.
    fn quantile(&mut self, q: f64) -> f64 {
        self.compress();
        if self.centroids.is_empty() {
            return 0.0;
        }
        if self.centroids.len() == 1 {
            return self.centroids[0].mean;
        }
        let target = q.clamp(0.0, 1.0) * self.weight;

        // Each centroid's mass is centered on its midpoint rank; interpolate
        // linearly between neighboring midpoints, anchored on the observed
        // extremes below the first and above the last.
        let mut cumulative = 0.0;
        let mut prev_rank = 0.0;
        let mut prev_value = self.lo;
        for centroid in &self.centroids {
            let mid_rank = cumulative + centroid.weight / 2.0;
            if target < mid_rank {
                let span = mid_rank - prev_rank;
                let frac = if span > 0.0 {
                    (target - prev_rank) / span
                } else {
                    0.0
                };
                return prev_value + (centroid.mean - prev_value) * frac;
            }
            cumulative += centroid.weight;
            prev_rank = mid_rank;
            prev_value = centroid.mean;
        }
        let span = self.weight - prev_rank;
        let frac = if span > 0.0 {
            (target - prev_rank) / span
        } else {
            1.0
        };
        prev_value + (self.hi - prev_value) * frac
    }
}

/// Running statistics plus an approximate quantile summary over an unbounded
/// stream of unsigned duration samples.
///
/// Memory stays bounded no matter how many samples are added: exact
/// `count`/`sum`/`min`/`max` cost O(1) and quantiles are answered from the
/// compressed digest. All durations are in the crate's canonical unit,
/// microseconds.
///
/// # Example
///
/// ```
/// use runtime_telemetry::StreamingHistogram;
///
/// let mut hist = StreamingHistogram::new();
/// hist.add(10);
/// hist.add(20);
/// hist.add(30);
///
/// assert_eq!(hist.count(), 3);
/// assert_eq!(hist.sum(), 60);
/// assert_eq!(hist.avg(), 20);
/// ```
#[derive(Clone, Debug)]
pub struct StreamingHistogram {
    count: u64,
    sum: u64,
    min: u64,
    max: u64,
    digest: Digest,
}

impl StreamingHistogram {
    /// Creates an empty histogram.
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: 0,
            min: 0,
            max: 0,
            digest: Digest::new(),
        }
    }

    /// Records one duration sample.
    pub fn add(&mut self, value: u64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
        self.digest.add(value as f64);
    }

    /// Returns the histogram to its just-constructed state, including a fresh
    /// digest at the same compression factor.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Number of samples recorded since construction or the last reset.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of all recorded samples, 0 while empty.
    pub fn sum(&self) -> u64 {
        self.sum
    }

    /// Smallest recorded sample, 0 while empty.
    pub fn min(&self) -> u64 {
        self.min
    }

    /// Largest recorded sample, 0 while empty.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Mean of the recorded samples using integer division, 0 while empty.
    pub fn avg(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.sum / self.count
        }
    }

    /// Nearest-integer estimate of the quantile at rank `q` in `[0, 1]`,
    /// 0 while empty.
    ///
    /// Takes `&mut self` because pending samples are folded into the digest
    /// before the query; callers only ask at snapshot time.
    pub fn percentile(&mut self, q: f64) -> u64 {
        if self.count == 0 {
            return 0;
        }
        self.digest.quantile(q).round() as u64
    }

    /// Full stats summary in the wire shape shared by the duration-based
    /// collectors: `{min, max, sum, avg, count, median, p95}`.
    pub fn summary(&mut self) -> StatsSink {
        let mut out = StatsSink::new();
        out.set("min", self.min());
        out.set("max", self.max());
        out.set("sum", self.sum());
        out.set("avg", self.avg());
        out.set("count", self.count());
        out.set("median", self.percentile(0.5));
        out.set("p95", self.percentile(0.95));
        out
    }
}

impl Default for StreamingHistogram {
    fn default() -> Self {
        Self::new()
    }
}
