//! Metrics farm
//!
//! The farm is the process-wide registry of metric groups and the entry
//! point for collection: [`gather`](MetricsFarm::gather) walks every
//! registered group, merges per-thread buffers into the cumulative
//! descriptors, rotates the buffers, and renders one JSON document;
//! [`publish`](MetricsFarm::publish) forwards the same cumulative values to
//! the registered sink.
//!
//! Libraries register their groups independently through the [`farm()`]
//! singleton. The farm lock serializes registration and gathering; writers
//! never touch it.
//!
//! # Dump format
//!
//! ```json
//! {
//!   "Counters": { "req_totalrequests": 1000000 },
//!   "Gauges": { "depthqueue depth": 4 },
//!   "Histograms percentiles (usecs) avg/50/95/99": {
//!     "latlatency - ssd": "16285 / 451 / 9008 / 9008"
//!   }
//! }
//! ```
//!
//! Entry keys are `name + desc` (+ `" - " + sub_type` when tagged); keys are
//! sorted, so repeated gathers without writes produce byte-equal documents.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::Serialize;

use crate::group::MetricsGroup;
use crate::sink::MetricsSink;
use crate::snapshot::Snapshot;

static FARM: Lazy<MetricsFarm> = Lazy::new(MetricsFarm::new);

/// The process-wide farm singleton, initialized on first access
pub fn farm() -> &'static MetricsFarm {
    &FARM
}

/// JSON structure of the metrics dump
#[derive(Debug, Default, Serialize)]
struct FarmDump {
    #[serde(rename = "Counters")]
    counters: BTreeMap<String, i64>,
    #[serde(rename = "Gauges")]
    gauges: BTreeMap<String, i64>,
    #[serde(rename = "Histograms percentiles (usecs) avg/50/95/99")]
    histograms: BTreeMap<String, String>,
}

impl FarmDump {
    fn fold(&mut self, snapshot: Snapshot) {
        for counter in snapshot.counters {
            self.counters.insert(counter.meta.key(), counter.value);
        }
        for gauge in snapshot.gauges {
            self.gauges.insert(gauge.meta.key(), gauge.value);
        }
        for hist in snapshot.histograms {
            let rendered = hist.render();
            self.histograms.insert(hist.meta.key(), rendered);
        }
    }
}

/// Registry of metric groups with a pluggable external sink.
///
/// Most callers use the [`farm()`] singleton; independent instances are
/// useful in tests and embedded sub-registries.
pub struct MetricsFarm {
    groups: Mutex<Vec<Arc<MetricsGroup>>>,
    sink: Mutex<Option<Arc<dyn MetricsSink>>>,
}

impl Default for MetricsFarm {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsFarm {
    /// Create an empty farm
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(Vec::new()),
            sink: Mutex::new(None),
        }
    }

    /// Seal `group` and add it to the registry.
    ///
    /// Panics if the same group is registered twice.
    pub fn register(&self, group: &Arc<MetricsGroup>) {
        let mut groups = self.groups.lock();
        assert!(
            !groups.iter().any(|held| Arc::ptr_eq(held, group)),
            "metrics group is already registered with the farm"
        );
        group.seal();
        groups.push(Arc::clone(group));
        tracing::debug!(groups = groups.len(), "metrics group registered");
    }

    /// Remove `group` from the registry.
    ///
    /// The caller must guarantee no writer is still recording into the
    /// group. Deregistering a group the farm does not hold is a logged
    /// no-op.
    pub fn deregister(&self, group: &Arc<MetricsGroup>) {
        let mut groups = self.groups.lock();
        let before = groups.len();
        groups.retain(|held| !Arc::ptr_eq(held, group));
        if groups.len() == before {
            tracing::warn!("deregistered a metrics group the farm does not hold");
        }
    }

    /// Install the external sink used by [`publish`](Self::publish)
    pub fn set_sink(&self, sink: Arc<dyn MetricsSink>) {
        *self.sink.lock() = Some(sink);
    }

    /// Gather every group and return the cumulative snapshots
    pub fn snapshots(&self) -> Vec<Snapshot> {
        let groups = self.groups.lock();
        groups.iter().map(|group| group.gather()).collect()
    }

    /// Gather every group and render the JSON dump
    pub fn gather(&self) -> String {
        let groups = self.groups.lock();
        let mut dump = FarmDump::default();
        for group in groups.iter() {
            dump.fold(group.gather());
        }
        serde_json::to_string(&dump).unwrap_or_else(|_| "{}".to_string())
    }

    /// Gather every group and forward the values to the registered sink.
    ///
    /// Without a sink this is a logged no-op; sink failures are logged per
    /// metric and never affect the aggregated state.
    pub fn publish(&self) {
        let sink = self.sink.lock().clone();
        let Some(sink) = sink else {
            tracing::debug!("no sink registered, skipping publish");
            return;
        };
        for snapshot in self.snapshots() {
            snapshot.publish(sink.as_ref());
        }
    }
}
