//! Metric descriptors
//!
//! A descriptor pairs a metric's metadata (name, description, optional
//! sub-type tag, publish kind) with its cumulative value merged across all
//! thread buffers since the group was created. Descriptors are only mutated
//! by the collector, under the owning group's lock; gauge descriptors also
//! carry the live shared cell that writers update directly.

use std::sync::Arc;

use crate::histogram::Histogram;
use crate::value::{Counter, Gauge};

/// Reserved metric name: aggregated and rendered in the JSON dump, but never
/// forwarded to the external sink.
pub const UNPUBLISHED_NAME: &str = "none";

/// How a metric is exported to the external sink.
///
/// A counter may be re-cast as a gauge externally; aggregation treats both
/// identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishKind {
    /// Export as a monotonic counter
    Counter,
    /// Export as a gauge
    Gauge,
    /// Export as a histogram
    Histogram,
}

/// Metadata shared by every descriptor kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricMeta {
    /// Public metric name; [`UNPUBLISHED_NAME`] suppresses sink export
    pub name: String,
    /// Human-readable description
    pub desc: String,
    /// Optional sub-type tag; empty when unused
    pub sub_type: String,
}

impl MetricMeta {
    pub fn new(
        name: impl Into<String>,
        desc: impl Into<String>,
        sub_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            sub_type: sub_type.into(),
        }
    }

    /// Entry key used in the JSON dump: `name + desc`, with
    /// `" - " + sub_type` appended when the tag is non-empty.
    pub fn key(&self) -> String {
        if self.sub_type.is_empty() {
            format!("{}{}", self.name, self.desc)
        } else {
            format!("{}{} - {}", self.name, self.desc, self.sub_type)
        }
    }

    /// Whether this metric is forwarded to the external sink
    pub fn is_published(&self) -> bool {
        self.name != UNPUBLISHED_NAME
    }
}

/// Counter descriptor: metadata plus the cumulative total.
#[derive(Debug)]
pub(crate) struct ReportCounter {
    pub meta: MetricMeta,
    pub kind: PublishKind,
    total: i64,
}

impl ReportCounter {
    pub fn new(meta: MetricMeta, kind: PublishKind) -> Self {
        Self {
            meta,
            kind,
            total: 0,
        }
    }

    /// Fold one thread cell into the cumulative total
    pub fn merge(&mut self, cell: &Counter) {
        self.total += cell.get();
    }

    pub fn get(&self) -> i64 {
        self.total
    }
}

/// Gauge descriptor: metadata plus the shared live cell.
#[derive(Debug)]
pub(crate) struct ReportGauge {
    pub meta: MetricMeta,
    cell: Arc<Gauge>,
}

impl ReportGauge {
    pub fn new(meta: MetricMeta) -> Self {
        Self {
            meta,
            cell: Arc::new(Gauge::new()),
        }
    }

    /// The shared cell writers update
    pub fn cell(&self) -> &Arc<Gauge> {
        &self.cell
    }

    pub fn get(&self) -> i64 {
        self.cell.get()
    }
}

/// Histogram descriptor: metadata plus cumulative bucket counts.
#[derive(Debug)]
pub(crate) struct ReportHistogram {
    pub meta: MetricMeta,
    totals: Histogram,
}

impl ReportHistogram {
    pub fn new(meta: MetricMeta) -> Self {
        Self {
            meta,
            totals: Histogram::new(),
        }
    }

    /// Fold one thread cell into the cumulative buckets
    pub fn merge(&mut self, cell: &Histogram) {
        self.totals.merge(cell);
    }

    pub fn totals(&self) -> &Histogram {
        &self.totals
    }
}
