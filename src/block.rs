//! Per-thread metric blocks with atomic rotation
//!
//! A `MetricsBlock` is one thread's accumulation buffer for one group: a
//! fixed-shape array of counter cells and histogram cells, zeroed at
//! construction. Each writer thread owns one block per group, held in a
//! `RotatingCell`.
//!
//! Rotation is how gathering resets a thread's buffer without stopping the
//! writer: the collector merges the current block into the cumulative
//! descriptors, then swaps in a fresh zeroed block. The swap is a lock-free
//! `ArcSwap` pointer exchange; a writer mid-record keeps the generation it
//! loaded, and the displaced generation is freed once the last handle to it
//! drops.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::histogram::Histogram;
use crate::value::Counter;

/// Cell counts for a block: fixed when the owning group is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockShape {
    /// Number of counter cells
    pub counters: usize,
    /// Number of histogram cells
    pub histograms: usize,
}

/// One thread's accumulation buffer: counters and histograms, contiguous,
/// zero-initialized, mutated only by the owning thread.
#[derive(Debug)]
pub(crate) struct MetricsBlock {
    counters: Box<[Counter]>,
    histograms: Box<[Histogram]>,
}

impl MetricsBlock {
    pub fn new(shape: BlockShape) -> Self {
        Self {
            counters: (0..shape.counters).map(|_| Counter::new()).collect(),
            histograms: (0..shape.histograms).map(|_| Histogram::new()).collect(),
        }
    }

    /// Counter cell at `index`; panics when out of range
    #[inline]
    pub fn counter(&self, index: usize) -> &Counter {
        &self.counters[index]
    }

    /// Histogram cell at `index`; panics when out of range
    #[inline]
    pub fn histogram(&self, index: usize) -> &Histogram {
        &self.histograms[index]
    }

    pub fn shape(&self) -> BlockShape {
        BlockShape {
            counters: self.counters.len(),
            histograms: self.histograms.len(),
        }
    }
}

/// Holder for a thread's current block generation.
///
/// Writers call [`current`](Self::current) and record into the returned
/// generation; the collector calls `current` to merge and then
/// [`rotate`](Self::rotate) to start a fresh accumulation interval. Old
/// generations drain naturally via the Arc refcount.
#[derive(Debug)]
pub(crate) struct RotatingCell {
    active: ArcSwap<MetricsBlock>,
    shape: BlockShape,
}

impl RotatingCell {
    pub fn new(shape: BlockShape) -> Self {
        Self {
            active: ArcSwap::from_pointee(MetricsBlock::new(shape)),
            shape,
        }
    }

    /// Load the current generation (lock-free).
    ///
    /// The guard pins the loaded generation: a concurrent rotate does not
    /// invalidate it, and the generation is reclaimed only after every guard
    /// on it is gone.
    #[inline]
    pub fn current(&self) -> arc_swap::Guard<Arc<MetricsBlock>> {
        self.active.load()
    }

    /// Swap in a fresh zeroed block of the same shape, returning the
    /// displaced generation.
    pub fn rotate(&self) -> Arc<MetricsBlock> {
        self.active.swap(Arc::new(MetricsBlock::new(self.shape)))
    }
}
