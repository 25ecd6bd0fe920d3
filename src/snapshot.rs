//! Gather output
//!
//! A `Snapshot` is the point-in-time result of gathering one group: the
//! cumulative value of every descriptor, detached from the group's locks so
//! it can be rendered, inspected, or forwarded without holding anything.
//!
//! Dropping a snapshot is the quiescent point of the gather that produced
//! it: once every handle from that gather is gone, displaced block
//! generations have no remaining readers and are reclaimed.

use crate::error::SinkError;
use crate::histogram::{self, BUCKET_SLOTS};
use crate::report::{MetricMeta, PublishKind};
use crate::sink::MetricsSink;

/// Cumulative counter value at gather time.
#[derive(Debug, Clone)]
pub struct CounterValue {
    pub meta: MetricMeta,
    pub kind: PublishKind,
    pub value: i64,
}

/// Gauge value at gather time.
#[derive(Debug, Clone)]
pub struct GaugeValue {
    pub meta: MetricMeta,
    pub value: i64,
}

/// Cumulative histogram state at gather time.
#[derive(Debug, Clone)]
pub struct HistogramValue {
    pub meta: MetricMeta,
    pub freqs: [i64; BUCKET_SLOTS],
    pub sum: i64,
}

impl HistogramValue {
    /// Total number of observations
    pub fn count(&self) -> i64 {
        histogram::count_of(&self.freqs)
    }

    /// Truncated mean; 0 when empty
    pub fn average(&self) -> i64 {
        histogram::average_of(&self.freqs, self.sum)
    }

    /// Reconstructed percentile (0 < pct <= 100)
    pub fn percentile(&self, pct: f64) -> i64 {
        histogram::percentile_of(&self.freqs, pct)
    }

    /// Dump rendering: `"<avg> / <p50> / <p95> / <p99>"`
    pub fn render(&self) -> String {
        format!(
            "{} / {} / {} / {}",
            self.average(),
            self.percentile(50.0),
            self.percentile(95.0),
            self.percentile(99.0)
        )
    }
}

/// Point-in-time result of gathering one group.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Cumulative counters, in registration order
    pub counters: Vec<CounterValue>,
    /// Gauges, in registration order
    pub gauges: Vec<GaugeValue>,
    /// Cumulative histograms, in registration order
    pub histograms: Vec<HistogramValue>,
}

impl Snapshot {
    /// Forward every published metric to the sink.
    ///
    /// Metrics named with the unpublished sentinel are skipped. Sink
    /// failures are logged and do not stop the remaining metrics from being
    /// forwarded; aggregation state is unaffected either way.
    pub fn publish(&self, sink: &dyn MetricsSink) {
        for counter in &self.counters {
            if !counter.meta.is_published() {
                continue;
            }
            log_publish_failure(sink.publish_counter(&counter.meta, counter.kind, counter.value));
        }
        for gauge in &self.gauges {
            if !gauge.meta.is_published() {
                continue;
            }
            log_publish_failure(sink.publish_gauge(&gauge.meta, gauge.value));
        }
        for hist in &self.histograms {
            if !hist.meta.is_published() {
                continue;
            }
            log_publish_failure(sink.publish_histogram(&hist.meta, &hist.freqs, hist.sum));
        }
    }
}

fn log_publish_failure(result: Result<(), SinkError>) {
    if let Err(error) = result {
        tracing::warn!(%error, "sink publish failed");
    }
}
