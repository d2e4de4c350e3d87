// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Process every attack scenario in parallel, one pipeline per label.
//!
//! ```bash
//! cargo run --example batch_fanout
//! ```

use fieldscope::{process_batch, DatasetSpec, EngineConfig};
use fieldscope_testdata::{write_dataset, GeneratorConfig, ScenarioKind};

fn main() {
    let dir = tempfile::tempdir().expect("tempdir");
    let generator = GeneratorConfig::new()
        .with_snapshots_per_phase(40)
        .with_seed(7);

    let scenarios = [
        ScenarioKind::Bola,
        ScenarioKind::Ddos,
        ScenarioKind::CommandInjection,
        ScenarioKind::ResourceExhaustion,
        ScenarioKind::SensorFault,
    ];

    let specs: Vec<DatasetSpec> = scenarios
        .iter()
        .map(|&scenario| {
            let paths = write_dataset(dir.path(), scenario, &generator).expect("dataset");
            DatasetSpec::new(scenario.label(), &paths.baseline, &paths.event)
                .with_recovery(&paths.recovery)
        })
        .collect();

    let reports = process_batch(&specs, &EngineConfig::default()).expect("batch");

    println!("{:<20} {:>10} {:>12} {:>12}", "label", "cpu %", "latency %", "egress %");
    for report in &reports {
        for impact in &report.impacts {
            println!(
                "{:<20} {:>10.1} {:>12.1} {:>12.1}",
                impact.label,
                impact.cpu_increase_percent,
                impact.latency_increase_percent,
                impact.network_rate_increase_percent,
            );
        }
    }
}
