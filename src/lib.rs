//! metrics-farm
//!
//! Per-thread buffered metrics aggregation for high-throughput servers.
//!
//! # Overview
//!
//! Application threads record counters, gauges and histograms on hot paths
//! with no cross-thread synchronization on the write side: every writer
//! thread accumulates into its own buffer. A collector periodically
//! *gathers*: it merges all thread buffers into cumulative per-metric
//! descriptors, atomically rotates each buffer to a fresh zeroed one, and
//! then renders a JSON dump and/or forwards values to a pluggable sink.
//!
//! # Design Principles
//!
//! - **Lock-free writes**: recording is a thread-local lookup plus a relaxed
//!   atomic add; writers never block on the collector
//! - **Rotate, don't reset**: gathering swaps buffer generations with an
//!   atomic pointer exchange; displaced generations drain via refcount, so a
//!   writer mid-record is never invalidated
//! - **Cumulative descriptors**: gathered values accumulate since group
//!   creation; repeated gathers without writes are stable
//! - **Pluggable export**: the [`MetricsSink`] trait is the only boundary to
//!   the outside; sink failures never disturb aggregation
//!
//! # Example
//!
//! ```
//! use metrics_farm::{MetricsGroup, PublishKind, farm};
//!
//! // Startup: describe the metrics, then register the group
//! let group = MetricsGroup::new();
//! let requests = group.register_counter("req_total", "requests", "", PublishKind::Counter);
//! let latency = group.register_histogram("req_latency", "request latency", "");
//! let in_flight = group.register_gauge("req_in_flight", "in-flight requests", "");
//! farm().register(&group);
//!
//! // Hot path: record from any thread
//! group.counter(requests).increment(1);
//! group.histogram(latency).observe(850);
//! group.gauge(in_flight).update(3);
//!
//! // Collector: one JSON document across all registered groups
//! let dump = farm().gather();
//! assert!(dump.contains("req_totalrequests"));
//! ```

mod block;
mod error;
mod farm;
mod group;
mod histogram;
mod registry;
mod report;
mod reporter;
mod sink;
mod snapshot;
mod value;

pub use error::{Result, SinkError};
pub use farm::{MetricsFarm, farm};
pub use group::{CounterId, CounterRef, GaugeId, HistogramId, HistogramRef, MetricsGroup};
pub use histogram::{BUCKET_BOUNDS, BUCKET_SLOTS, Histogram};
pub use report::{MetricMeta, PublishKind, UNPUBLISHED_NAME};
pub use reporter::{Reporter, ReporterConfig};
pub use sink::{LogSink, MetricsSink};
pub use snapshot::{CounterValue, GaugeValue, HistogramValue, Snapshot};
pub use value::{Counter, Gauge};
