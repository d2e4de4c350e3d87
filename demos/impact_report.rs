// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Process one generated attack dataset and print its impact report.
//!
//! ```bash
//! cargo run --example impact_report
//! ```

use fieldscope::{process_dataset, DatasetSpec, EngineConfig};
use fieldscope_testdata::{write_dataset, GeneratorConfig, ScenarioKind};

fn main() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scenario = ScenarioKind::ResourceExhaustion;

    let generator = GeneratorConfig::new()
        .with_snapshots_per_phase(60)
        .with_sensor_count(3)
        .with_seed(42);
    let paths = write_dataset(dir.path(), scenario, &generator).expect("dataset generation");

    let spec = DatasetSpec::new(scenario.label(), &paths.baseline, &paths.event)
        .with_recovery(&paths.recovery);
    let report = process_dataset(&spec, &EngineConfig::default()).expect("pipeline");

    println!("=== Phase summaries for {} ===", report.label);
    for summary in &report.summaries {
        println!(
            "{:<9} cpu {:6.2}%  mem {:7.2} MB  latency {:8.2} ms  interval {:5.2} s  ({} rows)",
            summary.phase,
            summary.avg_cpu,
            summary.avg_memory,
            summary.avg_latency_ms,
            summary.avg_reporting_interval,
            summary.measurements,
        );
    }

    println!();
    println!("=== Impact ===");
    for impact in &report.impacts {
        println!(
            "{}: cpu {:+.1}%  memory {:+.1}%  latency {:+.1}%",
            impact.label,
            impact.cpu_increase_percent,
            impact.memory_increase_percent,
            impact.latency_increase_percent,
        );
        if let Some(ratio) = impact.recovery_cpu_ratio {
            println!("recovery cpu ratio: {ratio:.2} (1.0 = fully recovered)");
        }
    }
}
