//! Metric group
//!
//! A `MetricsGroup` bundles related metrics that share a lifetime: the
//! counters, gauges and histograms of one subsystem. Descriptors are added
//! while the group is being built; registering the group with the farm seals
//! it, fixing the per-thread block shape. From then on writers record values
//! through cheap per-operation handles and the collector gathers.
//!
//! # Lifecycle
//!
//! ```text
//! MetricsGroup::new()            building: register_* allowed
//!        │ farm().register(&g)
//!        ▼
//!      sealed                    counter()/gauge()/histogram() + gather()
//!        │ farm().deregister(&g) / drop
//!        ▼
//!     torn down
//! ```
//!
//! Adding a descriptor after sealing and recording before sealing are
//! programming errors and panic.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::block::{BlockShape, MetricsBlock};
use crate::registry::ThreadRegistry;
use crate::report::{MetricMeta, PublishKind, ReportCounter, ReportGauge, ReportHistogram};
use crate::snapshot::{CounterValue, GaugeValue, HistogramValue, Snapshot};
use crate::value::Gauge;

/// Index of a counter within its group.
///
/// Returned by registration, dense from 0, permanent for the group's
/// lifetime. Designed to be `Copy` and stored in a `static` or a struct
/// field next to the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterId(usize);

/// Index of a gauge within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GaugeId(usize);

/// Index of a histogram within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistogramId(usize);

/// Descriptor lists, mutated while building and by the collector when
/// gathering. One lock covers both because the two phases never overlap a
/// hot-path writer.
#[derive(Debug, Default)]
struct Descriptors {
    counters: Vec<ReportCounter>,
    gauges: Vec<ReportGauge>,
    histograms: Vec<ReportHistogram>,
}

impl Descriptors {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            counters: self
                .counters
                .iter()
                .map(|c| CounterValue {
                    meta: c.meta.clone(),
                    kind: c.kind,
                    value: c.get(),
                })
                .collect(),
            gauges: self
                .gauges
                .iter()
                .map(|g| GaugeValue {
                    meta: g.meta.clone(),
                    value: g.get(),
                })
                .collect(),
            histograms: self
                .histograms
                .iter()
                .map(|h| HistogramValue {
                    meta: h.meta.clone(),
                    freqs: h.totals().freqs(),
                    sum: h.totals().sum(),
                })
                .collect(),
        }
    }
}

/// A bundle of related metrics sharing creation and teardown lifetime.
#[derive(Debug)]
pub struct MetricsGroup {
    descriptors: Mutex<Descriptors>,
    registry: OnceLock<ThreadRegistry>,
    gauge_cells: OnceLock<Box<[Arc<Gauge>]>>,
}

impl MetricsGroup {
    /// Create an empty group in the building state
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            descriptors: Mutex::new(Descriptors::default()),
            registry: OnceLock::new(),
            gauge_cells: OnceLock::new(),
        })
    }

    /// Add a counter descriptor; building state only.
    ///
    /// `kind` controls how the counter is exported through the sink: as a
    /// counter, or re-cast as a gauge.
    pub fn register_counter(
        &self,
        name: impl Into<String>,
        desc: impl Into<String>,
        sub_type: impl Into<String>,
        kind: PublishKind,
    ) -> CounterId {
        self.assert_building("counter");
        let mut descriptors = self.descriptors.lock();
        descriptors
            .counters
            .push(ReportCounter::new(MetricMeta::new(name, desc, sub_type), kind));
        CounterId(descriptors.counters.len() - 1)
    }

    /// Add a gauge descriptor; building state only
    pub fn register_gauge(
        &self,
        name: impl Into<String>,
        desc: impl Into<String>,
        sub_type: impl Into<String>,
    ) -> GaugeId {
        self.assert_building("gauge");
        let mut descriptors = self.descriptors.lock();
        descriptors
            .gauges
            .push(ReportGauge::new(MetricMeta::new(name, desc, sub_type)));
        GaugeId(descriptors.gauges.len() - 1)
    }

    /// Add a histogram descriptor; building state only
    pub fn register_histogram(
        &self,
        name: impl Into<String>,
        desc: impl Into<String>,
        sub_type: impl Into<String>,
    ) -> HistogramId {
        self.assert_building("histogram");
        let mut descriptors = self.descriptors.lock();
        descriptors
            .histograms
            .push(ReportHistogram::new(MetricMeta::new(name, desc, sub_type)));
        HistogramId(descriptors.histograms.len() - 1)
    }

    /// Handle to the calling thread's cell for this counter.
    ///
    /// The handle is cheap; obtain one per operation rather than caching it,
    /// so recording always targets the current generation.
    #[inline]
    pub fn counter(&self, id: CounterId) -> CounterRef {
        CounterRef {
            block: self.local_block(),
            index: id.0,
        }
    }

    /// Handle to the calling thread's cell for this histogram
    #[inline]
    pub fn histogram(&self, id: HistogramId) -> HistogramRef {
        HistogramRef {
            block: self.local_block(),
            index: id.0,
        }
    }

    /// The shared gauge cell; lock-free after sealing
    #[inline]
    pub fn gauge(&self, id: GaugeId) -> &Gauge {
        let cells = self
            .gauge_cells
            .get()
            .expect("metrics group is not registered with the farm");
        &cells[id.0]
    }

    /// Merge every live thread buffer into the cumulative descriptors,
    /// rotate the buffers, and return the cumulative snapshot.
    ///
    /// Values accumulate across gathers; rotating only resets the per-thread
    /// buffers, so a gather with no intervening writes reports the same
    /// totals as the previous one.
    pub fn gather(&self) -> Snapshot {
        let registry = self
            .registry
            .get()
            .expect("metrics group is not registered with the farm");
        let mut descriptors = self.descriptors.lock();

        registry.for_each_thread(|cell| {
            let block = cell.current();
            for (index, counter) in descriptors.counters.iter_mut().enumerate() {
                counter.merge(block.counter(index));
            }
            for (index, histogram) in descriptors.histograms.iter_mut().enumerate() {
                histogram.merge(block.histogram(index));
            }
            cell.rotate();
        });

        descriptors.snapshot()
    }

    /// Seal the group: fix the block shape from the descriptor counts and
    /// allocate the per-thread registry. Called by the farm on registration.
    pub(crate) fn seal(&self) {
        let descriptors = self.descriptors.lock();
        let shape = BlockShape {
            counters: descriptors.counters.len(),
            histograms: descriptors.histograms.len(),
        };
        let gauge_cells: Box<[Arc<Gauge>]> = descriptors
            .gauges
            .iter()
            .map(|g| Arc::clone(g.cell()))
            .collect();

        self.registry
            .set(ThreadRegistry::new(shape))
            .expect("metrics group registered twice");
        self.gauge_cells
            .set(gauge_cells)
            .expect("metrics group registered twice");

        tracing::debug!(
            counters = shape.counters,
            gauges = descriptors.gauges.len(),
            histograms = shape.histograms,
            "metrics group sealed"
        );
    }

    #[inline]
    fn local_block(&self) -> arc_swap::Guard<Arc<MetricsBlock>> {
        self.registry
            .get()
            .expect("metrics group is not registered with the farm")
            .local_cell()
            .current()
    }

    fn assert_building(&self, what: &str) {
        assert!(
            self.registry.get().is_none(),
            "cannot register a {what} on a group already registered with the farm"
        );
    }
}

/// Handle to one counter cell in the calling thread's current block.
pub struct CounterRef {
    block: arc_swap::Guard<Arc<MetricsBlock>>,
    index: usize,
}

impl CounterRef {
    /// Add `delta` to the counter
    #[inline]
    pub fn increment(&self, delta: i64) {
        self.block.counter(self.index).increment(delta);
    }

    /// Subtract `delta` from the counter
    #[inline]
    pub fn decrement(&self, delta: i64) {
        self.block.counter(self.index).decrement(delta);
    }
}

/// Handle to one histogram cell in the calling thread's current block.
pub struct HistogramRef {
    block: arc_swap::Guard<Arc<MetricsBlock>>,
    index: usize,
}

impl HistogramRef {
    /// Record one observation
    #[inline]
    pub fn observe(&self, value: i64) {
        self.block.histogram(self.index).observe(value);
    }
}

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;
