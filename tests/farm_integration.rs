//! End-to-end farm tests
//!
//! Exercises the public API the way an embedding server would: groups
//! registered at startup, writer threads hammering the hot path, a collector
//! gathering JSON dumps and publishing to a sink.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use metrics_farm::{
    MetricMeta, MetricsFarm, MetricsGroup, MetricsSink, PublishKind, SinkError, UNPUBLISHED_NAME,
};

#[test]
fn test_single_thread_counter_to_json() {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    let requests = group.register_counter("req_total", "requests", "", PublishKind::Counter);
    farm.register(&group);

    for _ in 0..1_000_000 {
        group.counter(requests).increment(1);
    }

    let parsed: serde_json::Value = serde_json::from_str(&farm.gather()).unwrap();
    assert_eq!(parsed["Counters"]["req_totalrequests"], 1_000_000);
}

#[test]
fn test_multi_thread_counter_consistency() {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    let requests = group.register_counter("c", "total", "", PublishKind::Counter);
    farm.register(&group);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let group = Arc::clone(&group);
            thread::spawn(move || {
                for _ in 0..100_000 {
                    group.counter(requests).increment(1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let parsed: serde_json::Value = serde_json::from_str(&farm.gather()).unwrap();
    assert_eq!(parsed["Counters"]["ctotal"], 800_000);
}

#[test]
fn test_histogram_percentiles_in_dump() {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    let latency = group.register_histogram("h", "latency", "");
    farm.register(&group);

    for value in [500, 500, 500, 500, 2000, 10000, 100000] {
        group.histogram(latency).observe(value);
    }

    let parsed: serde_json::Value = serde_json::from_str(&farm.gather()).unwrap();
    assert_eq!(
        parsed["Histograms percentiles (usecs) avg/50/95/99"]["hlatency"],
        "16285 / 451 / 9008 / 9008"
    );
}

#[test]
fn test_rotation_keeps_descriptors_cumulative() {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    let counter = group.register_counter("c", "ops", "", PublishKind::Counter);
    farm.register(&group);

    group.counter(counter).increment(5);
    let first: serde_json::Value = serde_json::from_str(&farm.gather()).unwrap();
    assert_eq!(first["Counters"]["cops"], 5);

    // No writes in between: cumulative value is unchanged, and the rotated
    // per-thread buffer contributes nothing extra
    let second: serde_json::Value = serde_json::from_str(&farm.gather()).unwrap();
    assert_eq!(second["Counters"]["cops"], 5);

    // A single new increment lands exactly once
    group.counter(counter).increment(1);
    let third: serde_json::Value = serde_json::from_str(&farm.gather()).unwrap();
    assert_eq!(third["Counters"]["cops"], 6);
}

#[test]
fn test_gather_with_no_writes_is_byte_equal() {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    let counter = group.register_counter("c", "ops", "", PublishKind::Counter);
    group.register_gauge("g", "level", "");
    let latency = group.register_histogram("h", "latency", "");
    farm.register(&group);

    group.counter(counter).increment(41);
    group.histogram(latency).observe(750);

    assert_eq!(farm.gather(), farm.gather());
}

#[test]
fn test_gauge_last_writer_wins() {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    let gauge = group.register_gauge("g", "level", "");
    farm.register(&group);

    let writers: Vec<_> = [7i64, 9i64]
        .into_iter()
        .map(|value| {
            let group = Arc::clone(&group);
            thread::spawn(move || group.gauge(gauge).update(value))
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let parsed: serde_json::Value = serde_json::from_str(&farm.gather()).unwrap();
    let value = parsed["Gauges"]["glevel"].as_i64().unwrap();
    assert!(value == 7 || value == 9, "unexpected gauge value {value}");
}

/// Sink that records the keys it receives
#[derive(Default)]
struct RecordingSink {
    keys: Mutex<Vec<String>>,
}

impl MetricsSink for RecordingSink {
    fn publish_counter(
        &self,
        meta: &MetricMeta,
        _kind: PublishKind,
        _value: i64,
    ) -> Result<(), SinkError> {
        self.keys.lock().push(meta.key());
        Ok(())
    }

    fn publish_gauge(&self, meta: &MetricMeta, _value: i64) -> Result<(), SinkError> {
        self.keys.lock().push(meta.key());
        Ok(())
    }

    fn publish_histogram(
        &self,
        meta: &MetricMeta,
        _freqs: &[i64],
        _sum: i64,
    ) -> Result<(), SinkError> {
        self.keys.lock().push(meta.key());
        Ok(())
    }
}

#[test]
fn test_unpublished_metric_stays_in_dump_but_not_in_sink() {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    let internal =
        group.register_counter(UNPUBLISHED_NAME, "internal retries", "", PublishKind::Counter);
    group.register_counter("visible", "requests", "", PublishKind::Counter);
    farm.register(&group);

    group.counter(internal).increment(12);

    let sink = Arc::new(RecordingSink::default());
    farm.set_sink(Arc::clone(&sink) as Arc<dyn MetricsSink>);
    farm.publish();

    let keys = sink.keys.lock().clone();
    assert_eq!(keys, vec!["visiblerequests"]);

    let parsed: serde_json::Value = serde_json::from_str(&farm.gather()).unwrap();
    assert_eq!(parsed["Counters"]["noneinternal retries"], 12);
}

#[test]
fn test_dump_has_exactly_three_sections() {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    group.register_counter("c", "ops", "sub", PublishKind::Counter);
    farm.register(&group);

    let parsed: serde_json::Value = serde_json::from_str(&farm.gather()).unwrap();
    let object = parsed.as_object().unwrap();
    assert_eq!(object.len(), 3);
    assert!(object.contains_key("Counters"));
    assert!(object.contains_key("Gauges"));
    assert!(object.contains_key("Histograms percentiles (usecs) avg/50/95/99"));

    // Sub-typed metrics render with the tag suffix
    assert_eq!(parsed["Counters"]["cops - sub"], 0);
}

#[test]
fn test_writers_record_while_collector_gathers() {
    let farm = Arc::new(MetricsFarm::new());
    let group = MetricsGroup::new();
    let counter = group.register_counter("c", "ops", "", PublishKind::Counter);
    let latency = group.register_histogram("h", "latency", "");
    farm.register(&group);

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let group = Arc::clone(&group);
            thread::spawn(move || {
                for i in 0..50_000 {
                    group.counter(counter).increment(1);
                    if i % 100 == 0 {
                        group.histogram(latency).observe(500);
                    }
                }
            })
        })
        .collect();

    // Gather concurrently with the writers; totals must never exceed what
    // has been written and must be monotone
    let collector = {
        let farm = Arc::clone(&farm);
        thread::spawn(move || {
            let mut previous = 0;
            for _ in 0..20 {
                let parsed: serde_json::Value = serde_json::from_str(&farm.gather()).unwrap();
                let seen = parsed["Counters"]["cops"].as_i64().unwrap();
                assert!(seen >= previous, "cumulative total went backwards");
                assert!(seen <= 200_000);
                previous = seen;
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    collector.join().unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&farm.gather()).unwrap();
    let final_count = parsed["Counters"]["cops"].as_i64().unwrap();
    assert!(final_count <= 200_000);
    assert!(final_count >= 100_000, "implausibly low total {final_count}");
}
