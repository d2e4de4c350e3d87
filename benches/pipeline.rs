//! Benchmarks for the FieldScope analysis pipeline

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fieldscope::{process_dataset, DatasetSpec, EngineConfig};
use fieldscope_testdata::{write_dataset, GeneratorConfig, ScenarioKind};

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    // Setup: one generated DDoS dataset, 200 snapshots per phase
    let dir = tempfile::tempdir().expect("tempdir");
    let generator = GeneratorConfig::new()
        .with_snapshots_per_phase(200)
        .with_sensor_count(4)
        .with_seed(42);
    let paths = write_dataset(dir.path(), ScenarioKind::Ddos, &generator).expect("dataset");

    let spec = DatasetSpec::new("ddos", &paths.baseline, &paths.event)
        .with_recovery(&paths.recovery);
    let config = EngineConfig::default();

    group.throughput(Throughput::Elements(600));

    group.bench_function("process_600_snapshots", |b| {
        b.iter(|| {
            let report = process_dataset(&spec, &config).expect("report");
            black_box(report);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
