//! External sink interface
//!
//! The farm forwards gathered values to a pluggable sink (a time-series
//! exporter, a Prometheus registry adapter, a test recorder). The trait is
//! the boundary: the core pushes current cumulative values through it and
//! knows nothing about the transport behind it.
//!
//! # Design
//!
//! - One method per metric kind; implementations convert to their own wire
//!   model. Counters carry their [`PublishKind`] so an adapter can re-cast a
//!   counter as an externally-visible gauge.
//! - Methods return [`SinkError`] on failure; the collector logs failures
//!   and continues, so a broken sink never disturbs aggregation.

use crate::error::Result;
use crate::report::{MetricMeta, PublishKind};

/// Adapter that receives gathered metric values.
pub trait MetricsSink: Send + Sync {
    /// Forward a counter's cumulative value
    fn publish_counter(&self, meta: &MetricMeta, kind: PublishKind, value: i64) -> Result<()>;

    /// Forward a gauge's current value
    fn publish_gauge(&self, meta: &MetricMeta, value: i64) -> Result<()>;

    /// Forward a histogram's cumulative bucket counts and sum
    fn publish_histogram(&self, meta: &MetricMeta, freqs: &[i64], sum: i64) -> Result<()>;
}

/// Sink that writes every published value to the tracing log.
///
/// Useful as a default wiring and in development; production deployments
/// plug in a real exporter instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MetricsSink for LogSink {
    fn publish_counter(&self, meta: &MetricMeta, kind: PublishKind, value: i64) -> Result<()> {
        tracing::info!(name = %meta.name, sub_type = %meta.sub_type, ?kind, value, "counter");
        Ok(())
    }

    fn publish_gauge(&self, meta: &MetricMeta, value: i64) -> Result<()> {
        tracing::info!(name = %meta.name, sub_type = %meta.sub_type, value, "gauge");
        Ok(())
    }

    fn publish_histogram(&self, meta: &MetricMeta, freqs: &[i64], sum: i64) -> Result<()> {
        let count: i64 = freqs.iter().sum();
        tracing::info!(name = %meta.name, sub_type = %meta.sub_type, count, sum, "histogram");
        Ok(())
    }
}
