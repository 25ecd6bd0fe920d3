//! Scalar metric primitives
//!
//! `Counter` and `Gauge` are the two scalar cell types. A counter cell lives
//! inside one thread's metrics block and is only ever written by that thread;
//! a gauge cell lives in its descriptor and is shared by all writers. Both
//! use relaxed atomics so the collector can read them while writers are
//! active.

use std::sync::atomic::{AtomicI64, Ordering};

/// Signed 64-bit counter cell.
///
/// Each counter cell is owned by exactly one writer thread, so updates never
/// contend. Relaxed ordering keeps the increment a plain add on mainstream
/// targets.
#[derive(Debug, Default)]
pub struct Counter(AtomicI64);

impl Counter {
    /// Create a new counter at zero
    #[inline]
    pub const fn new() -> Self {
        Self(AtomicI64::new(0))
    }

    /// Add `delta` to the counter
    #[inline]
    pub fn increment(&self, delta: i64) {
        self.0.fetch_add(delta, Ordering::Relaxed);
    }

    /// Subtract `delta` from the counter
    #[inline]
    pub fn decrement(&self, delta: i64) {
        self.0.fetch_sub(delta, Ordering::Relaxed);
    }

    /// Current value (may be negative)
    #[inline]
    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Last-write-wins gauge cell.
///
/// Gauges are shared: one cell per descriptor, written by any thread, read by
/// the collector. Readers may observe a stale-but-valid prior value; no
/// ordering is guaranteed between concurrent writers.
#[derive(Debug, Default)]
pub struct Gauge(AtomicI64);

impl Gauge {
    /// Create a new gauge at zero
    #[inline]
    pub const fn new() -> Self {
        Self(AtomicI64::new(0))
    }

    /// Replace the gauge value
    #[inline]
    pub fn update(&self, value: i64) {
        self.0.store(value, Ordering::Relaxed);
    }

    /// Current value
    #[inline]
    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_increment_decrement() {
        let counter = Counter::new();
        counter.increment(1);
        counter.increment(41);
        assert_eq!(counter.get(), 42);

        counter.decrement(2);
        assert_eq!(counter.get(), 40);
    }

    #[test]
    fn test_counter_goes_negative() {
        let counter = Counter::new();
        counter.decrement(7);
        assert_eq!(counter.get(), -7);

        counter.increment(-3);
        assert_eq!(counter.get(), -10);
    }

    #[test]
    fn test_gauge_last_write_wins() {
        let gauge = Gauge::new();
        assert_eq!(gauge.get(), 0);

        gauge.update(7);
        gauge.update(9);
        assert_eq!(gauge.get(), 9);

        gauge.update(-1);
        assert_eq!(gauge.get(), -1);
    }
}
