//! Hot path benchmark suite
//!
//! Run with: `cargo bench --bench hot_path`
//!
//! # What we measure
//!
//! - Counter increment (hot path: TLS lookup + relaxed add)
//! - Histogram observe (hot path: bucket search + two relaxed adds)
//! - Gauge update (relaxed store on the shared cell)
//! - Full gather across a populated group (collector path)

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use metrics_farm::{MetricsFarm, MetricsGroup, PublishKind};

fn bench_counter_increment(c: &mut Criterion) {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    let counter = group.register_counter("ops", "operations", "", PublishKind::Counter);
    farm.register(&group);

    let mut bench_group = c.benchmark_group("counter");
    bench_group.throughput(Throughput::Elements(1));
    bench_group.bench_function("increment", |b| {
        b.iter(|| group.counter(black_box(counter)).increment(1));
    });
    bench_group.finish();
}

fn bench_histogram_observe(c: &mut Criterion) {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    let latency = group.register_histogram("lat", "latency", "");
    farm.register(&group);

    let mut bench_group = c.benchmark_group("histogram");
    bench_group.throughput(Throughput::Elements(1));
    bench_group.bench_function("observe", |b| {
        let mut value = 0i64;
        b.iter(|| {
            value = (value + 997) % 5_000_000;
            group.histogram(black_box(latency)).observe(value);
        });
    });
    bench_group.finish();
}

fn bench_gauge_update(c: &mut Criterion) {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    let depth = group.register_gauge("depth", "queue depth", "");
    farm.register(&group);

    let mut bench_group = c.benchmark_group("gauge");
    bench_group.throughput(Throughput::Elements(1));
    bench_group.bench_function("update", |b| {
        b.iter(|| group.gauge(black_box(depth)).update(42));
    });
    bench_group.finish();
}

fn bench_gather(c: &mut Criterion) {
    let farm = MetricsFarm::new();
    let group = MetricsGroup::new();
    let counters: Vec<_> = (0..16)
        .map(|i| group.register_counter(format!("c{i}"), "count", "", PublishKind::Counter))
        .collect();
    let histograms: Vec<_> = (0..4)
        .map(|i| group.register_histogram(format!("h{i}"), "latency", ""))
        .collect();
    farm.register(&group);

    c.bench_function("gather_json", |b| {
        b.iter(|| {
            for &counter in &counters {
                group.counter(counter).increment(1);
            }
            for &histogram in &histograms {
                group.histogram(histogram).observe(750);
            }
            black_box(farm.gather())
        });
    });
}

criterion_group!(
    benches,
    bench_counter_increment,
    bench_histogram_observe,
    bench_gauge_update,
    bench_gather
);
criterion_main!(benches);
