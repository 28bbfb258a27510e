use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for tracking backend activity driven by the query layer.
///
/// Implementations observe transaction lifecycle and read traffic. The
/// in-memory backend reports every read transaction, adjacency scan, index
/// lookup and label resolution here, which lets tests check how often
/// snapshots were renewed without reaching into session internals.
pub trait BackendMetrics: Send + Sync {
    /// Records the start of a read transaction.
    fn read_begun(&self);

    /// Records a committed read transaction.
    fn read_committed(&self);

    /// Records a discarded read transaction.
    fn read_discarded(&self);

    /// Records an outgoing adjacency scan.
    ///
    /// # Parameters
    /// * `filtered` - Whether the scan was restricted to a single edge label.
    fn adjacency_scan(&self, filtered: bool);

    /// Records an attribute index lookup.
    fn index_lookup(&self);

    /// Records an edge label resolution.
    ///
    /// # Parameters
    /// * `hit` - Whether the label existed.
    fn label_resolved(&self, hit: bool);
}

/// A no-op implementation of [`BackendMetrics`].
#[derive(Default)]
pub struct NoopMetrics;

impl BackendMetrics for NoopMetrics {
    fn read_begun(&self) {}
    fn read_committed(&self) {}
    fn read_discarded(&self) {}
    fn adjacency_scan(&self, _filtered: bool) {}
    fn index_lookup(&self) {}
    fn label_resolved(&self, _hit: bool) {}
}

/// A thread-safe counter-based implementation of [`BackendMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of read transactions started.
    pub reads_begun: AtomicU64,

    /// Number of read transactions committed.
    pub reads_committed: AtomicU64,

    /// Number of read transactions discarded.
    pub reads_discarded: AtomicU64,

    /// Number of unfiltered outgoing adjacency scans.
    pub adjacency_scans_all: AtomicU64,

    /// Number of label-filtered outgoing adjacency scans.
    pub adjacency_scans_typed: AtomicU64,

    /// Number of attribute index lookups.
    pub index_lookups: AtomicU64,

    /// Number of label resolutions that found a label.
    pub label_hits: AtomicU64,

    /// Number of label resolutions that found nothing.
    pub label_misses: AtomicU64,
}

/// Point-in-time copy of [`CounterMetrics`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MetricsSnapshot {
    /// Read transactions started.
    pub reads_begun: u64,
    /// Read transactions committed.
    pub reads_committed: u64,
    /// Read transactions discarded.
    pub reads_discarded: u64,
    /// Unfiltered adjacency scans.
    pub adjacency_scans_all: u64,
    /// Label-filtered adjacency scans.
    pub adjacency_scans_typed: u64,
    /// Attribute index lookups.
    pub index_lookups: u64,
    /// Successful label resolutions.
    pub label_hits: u64,
    /// Failed label resolutions.
    pub label_misses: u64,
}

impl MetricsSnapshot {
    /// Read transactions that are neither committed nor discarded.
    pub fn open_reads(&self) -> u64 {
        self.reads_begun
            .saturating_sub(self.reads_committed + self.reads_discarded)
    }
}

impl CounterMetrics {
    /// Creates a shared counter set.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Copies the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads_begun: self.reads_begun.load(Ordering::Relaxed),
            reads_committed: self.reads_committed.load(Ordering::Relaxed),
            reads_discarded: self.reads_discarded.load(Ordering::Relaxed),
            adjacency_scans_all: self.adjacency_scans_all.load(Ordering::Relaxed),
            adjacency_scans_typed: self.adjacency_scans_typed.load(Ordering::Relaxed),
            index_lookups: self.index_lookups.load(Ordering::Relaxed),
            label_hits: self.label_hits.load(Ordering::Relaxed),
            label_misses: self.label_misses.load(Ordering::Relaxed),
        }
    }
}

impl BackendMetrics for CounterMetrics {
    fn read_begun(&self) {
        self.reads_begun.fetch_add(1, Ordering::Relaxed);
    }

    fn read_committed(&self) {
        self.reads_committed.fetch_add(1, Ordering::Relaxed);
    }

    fn read_discarded(&self) {
        self.reads_discarded.fetch_add(1, Ordering::Relaxed);
    }

    fn adjacency_scan(&self, filtered: bool) {
        if filtered {
            self.adjacency_scans_typed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.adjacency_scans_all.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn index_lookup(&self) {
        self.index_lookups.fetch_add(1, Ordering::Relaxed);
    }

    fn label_resolved(&self, hit: bool) {
        if hit {
            self.label_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.label_misses.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Returns the default metrics implementation, [`NoopMetrics`].
pub fn default_metrics() -> Arc<dyn BackendMetrics> {
    Arc::new(NoopMetrics)
}
