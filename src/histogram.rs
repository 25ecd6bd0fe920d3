//! Bucketed latency histogram
//!
//! Fixed-boundary bucket counts plus a running sum. The boundaries are the
//! wire-compatible microsecond ladder every consumer of the JSON dump and the
//! sink protocol expects, so they are compile-time constants rather than
//! per-histogram configuration.
//!
//! A `Histogram` is a cell: observation happens on the owning thread's copy,
//! merging happens on the descriptor's cumulative copy. Percentiles are
//! reconstructed from the merged bucket counts.

use std::sync::atomic::{AtomicI64, Ordering};

/// Bucket upper bounds in microseconds, ascending.
pub const BUCKET_BOUNDS: [i64; 27] = [
    300, 450, 750, 1000, 3000, 5000, 7000, 9000, 11000, 13000, 15000, 17000, 19000, 21000, 32000,
    45000, 75000, 110000, 160000, 240000, 360000, 540000, 800000, 1200000, 1800000, 2700000,
    4000000,
];

/// Number of bucket slots: one per bound plus the overflow slot.
pub const BUCKET_SLOTS: usize = BUCKET_BOUNDS.len() + 1;

/// Slot index for a value: the first bucket whose bound is >= the value,
/// or the overflow slot when the value exceeds every bound.
#[inline]
fn slot_for(value: i64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < value)
}

/// Bucketed histogram cell: per-slot frequencies plus the sum of observations.
#[derive(Debug)]
pub struct Histogram {
    freqs: [AtomicI64; BUCKET_SLOTS],
    sum: AtomicI64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    /// Create an empty histogram
    pub fn new() -> Self {
        Self {
            freqs: std::array::from_fn(|_| AtomicI64::new(0)),
            sum: AtomicI64::new(0),
        }
    }

    /// Record one observation
    #[inline]
    pub fn observe(&self, value: i64) {
        self.freqs[slot_for(value)].fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(value, Ordering::Relaxed);
    }

    /// Fold another histogram into this one, slot by slot
    pub fn merge(&self, other: &Histogram) {
        for (slot, freq) in self.freqs.iter().zip(other.freqs.iter()) {
            slot.fetch_add(freq.load(Ordering::Relaxed), Ordering::Relaxed);
        }
        self.sum.fetch_add(other.sum(), Ordering::Relaxed);
    }

    /// Copy out the per-slot frequencies
    pub fn freqs(&self) -> [i64; BUCKET_SLOTS] {
        std::array::from_fn(|i| self.freqs[i].load(Ordering::Relaxed))
    }

    /// Sum of all observed values
    pub fn sum(&self) -> i64 {
        self.sum.load(Ordering::Relaxed)
    }

    /// Total number of observations
    pub fn count(&self) -> i64 {
        count_of(&self.freqs())
    }

    /// Mean observation, truncated to an integer; 0 when empty
    pub fn average(&self) -> i64 {
        average_of(&self.freqs(), self.sum())
    }

    /// Reconstruct the given percentile (0 < pct <= 100) from the buckets
    pub fn percentile(&self, pct: f64) -> i64 {
        percentile_of(&self.freqs(), pct)
    }
}

/// Total observation count for a frequency array.
pub(crate) fn count_of(freqs: &[i64; BUCKET_SLOTS]) -> i64 {
    freqs.iter().sum()
}

/// Truncated mean for a frequency array; 0 when empty.
pub(crate) fn average_of(freqs: &[i64; BUCKET_SLOTS], sum: i64) -> i64 {
    let count = count_of(freqs);
    if count == 0 { 0 } else { sum / count }
}

/// Percentile reconstruction from bucket frequencies.
///
/// Interpolates within the matched bucket as
/// `lower_bound + (target - cum_below) * index / freq[index]`, scaling by the
/// bucket *index*. That factor is kept for wire compatibility with existing
/// consumers of the dump; common formulas scale by bucket width instead.
pub(crate) fn percentile_of(freqs: &[i64; BUCKET_SLOTS], pct: f64) -> i64 {
    let mut cum = [0i64; BUCKET_SLOTS];
    let mut total = 0i64;
    for (i, freq) in freqs.iter().enumerate() {
        total += freq;
        cum[i] = total;
    }
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * pct / 100.0) as i64;
    let index = cum.partition_point(|&c| c < target);
    if index >= BUCKET_SLOTS || freqs[index] == 0 {
        return 0;
    }

    let lower = if index == 0 { 0 } else { BUCKET_BOUNDS[index - 1] };
    let below = if index == 0 { 0 } else { cum[index - 1] };
    lower + (target - below) * index as i64 / freqs[index]
}
