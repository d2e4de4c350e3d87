// FieldScope Testdata - Core generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Collector-format dataset generation.
//!
//! Emits the snapshot collector's JSON-Lines wire format: one metadata
//! line, then metrics snapshots whose values arrive as Prometheus-style
//! `[timestamp, "value"]` pairs.

use crate::scenario::{ScenarioKind, ScenarioProfile};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde_json::{json, Value};
use std::f64::consts::TAU;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Latency histogram bucket bounds in seconds.
const BUCKET_BOUNDS: &[(f64, &str)] = &[
    (0.05, "0.05"),
    (0.1, "0.1"),
    (0.25, "0.25"),
    (0.5, "0.5"),
    (1.0, "1"),
];

/// Requests each sensor issues per snapshot interval.
const REQUESTS_PER_SNAPSHOT: u64 = 5;

/// Generator errors.
#[derive(Debug, Error)]
pub enum TestdataError {
    #[error("Invalid generator configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Generator configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// First snapshot timestamp, seconds since epoch.
    pub start_timestamp: f64,
    /// Seconds between snapshots.
    pub interval_secs: f64,
    /// Snapshots per phase file.
    pub snapshots_per_phase: usize,
    /// Number of simulated sensors.
    pub sensor_count: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            start_timestamp: 1_735_000_000.0, // 2024-12-24 01:06:40 UTC
            interval_secs: 5.0,
            snapshots_per_phase: 40,
            sensor_count: 2,
            seed: 7,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_timestamp(mut self, timestamp: f64) -> Self {
        self.start_timestamp = timestamp;
        self
    }

    pub fn with_interval_secs(mut self, secs: f64) -> Self {
        self.interval_secs = secs;
        self
    }

    pub fn with_snapshots_per_phase(mut self, count: usize) -> Self {
        self.snapshots_per_phase = count;
        self
    }

    pub fn with_sensor_count(mut self, count: usize) -> Self {
        self.sensor_count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<(), TestdataError> {
        if self.sensor_count == 0 {
            return Err(TestdataError::InvalidConfig(
                "sensor_count must be at least 1".to_string(),
            ));
        }
        if self.snapshots_per_phase < 2 {
            return Err(TestdataError::InvalidConfig(
                "snapshots_per_phase must be at least 2".to_string(),
            ));
        }
        if !(self.interval_secs > 0.0) {
            return Err(TestdataError::InvalidConfig(
                "interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Collection phase of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Baseline,
    Event,
    Recovery,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Baseline, Phase::Event, Phase::Recovery];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Baseline => "baseline",
            Phase::Event => "event",
            Phase::Recovery => "recovery",
        }
    }

    fn index(&self) -> usize {
        match self {
            Phase::Baseline => 0,
            Phase::Event => 1,
            Phase::Recovery => 2,
        }
    }

    /// Scenario distortion applied during this phase. Recovery keeps a
    /// small residual: systems rarely snap back to baseline instantly.
    fn intensity(&self) -> f64 {
        match self {
            Phase::Baseline => 0.0,
            Phase::Event => 1.0,
            Phase::Recovery => 0.15,
        }
    }
}

/// Files of one generated dataset.
#[derive(Debug, Clone)]
pub struct DatasetPaths {
    pub baseline: PathBuf,
    pub event: PathBuf,
    pub recovery: PathBuf,
}

/// Generate one phase file as JSON lines.
pub fn generate_phase(
    config: &GeneratorConfig,
    scenario: ScenarioKind,
    phase: Phase,
) -> Result<Vec<String>, TestdataError> {
    config.validate()?;

    let profile = scenario.profile();
    let intensity = phase.intensity();
    let mut rng = StdRng::seed_from_u64(config.seed ^ ((phase.index() as u64 + 1) * 0x9E37_79B9));
    let noise = Normal::new(0.0, 1.0)
        .map_err(|e| TestdataError::InvalidConfig(e.to_string()))?;
    let draw = move |std: f64, rng: &mut StdRng| noise.sample(rng) * std;

    // Phase files are collected back to back with a short gap between them.
    let phase_span = (config.snapshots_per_phase as f64 + 4.0) * config.interval_secs;
    let phase_start = config.start_timestamp + phase.index() as f64 * phase_span;

    let mut lines = Vec::with_capacity(config.snapshots_per_phase + 1);
    lines.push(metadata_line(config, scenario, phase, phase_start));

    // Cumulative per-sensor state
    let mut sent_totals = vec![0.0f64; config.sensor_count];
    let mut received_totals = vec![0.0f64; config.sensor_count];
    let mut request_totals = vec![0u64; config.sensor_count];
    let mut stuck_values: Vec<Option<f64>> = vec![None; config.sensor_count];

    for snapshot_index in 0..config.snapshots_per_phase {
        let ts = phase_start + snapshot_index as f64 * config.interval_secs;

        let mut sensor_temp = Vec::new();
        let mut gateway_temp = Vec::new();
        let mut true_temp = Vec::new();
        let mut cpu = Vec::new();
        let mut memory = Vec::new();
        let mut fault_code = Vec::new();
        let mut latency_buckets = Vec::new();
        let mut failed = Vec::new();
        let mut network_sent = Vec::new();
        let mut network_received = Vec::new();

        for sensor in 0..config.sensor_count {
            let sensor_id = format!("TEMP{:03}", sensor + 1);

            // Ground truth follows a diurnal curve; the sensor adds noise,
            // the gateway adds the scenario's tampering bias.
            let day_angle = TAU * (ts % 86_400.0) / 86_400.0;
            let truth = 21.0 + 4.0 * day_angle.sin() + draw(0.05, &mut rng);
            let mut reading = truth + draw(0.3, &mut rng);
            if profile.stuck_readings && intensity > 0.5 {
                reading = *stuck_values[sensor].get_or_insert(reading);
            }
            let gateway = reading + profile.gateway_bias * intensity + draw(0.05, &mut rng);

            let cpu_value = ((10.0 + sensor as f64 + draw(0.8, &mut rng))
                * lerp(1.0, profile.cpu_multiplier, intensity))
            .clamp(0.0, 100.0);
            let memory_value = 58.0
                + 2.0 * sensor as f64
                + draw(0.5, &mut rng)
                + profile.memory_drift_mb * intensity * snapshot_index as f64;
            let fault_value = if intensity > 0.5 { profile.fault_code } else { 0.0 };

            sensor_temp.push(entry(&sensor_id, ts, reading));
            gateway_temp.push(entry(&sensor_id, ts, gateway));
            true_temp.push(entry(&sensor_id, ts, truth));
            cpu.push(entry(&sensor_id, ts, cpu_value));
            memory.push(entry(&sensor_id, ts, memory_value));
            fault_code.push(entry(&sensor_id, ts, fault_value));

            // Cumulative latency histogram: the scenario's latency shift
            // stretches the response-time distribution rightward.
            request_totals[sensor] += REQUESTS_PER_SNAPSHOT;
            let total = request_totals[sensor] as f64;
            let scale = 0.04 * (1.0 + 12.0 * profile.latency_shift * intensity);
            for &(bound, le) in BUCKET_BOUNDS {
                let below = (total * (1.0 - (-bound / scale).exp())).round();
                latency_buckets.push(bucket_entry(&sensor_id, le, ts, below));
            }
            latency_buckets.push(bucket_entry(&sensor_id, "+Inf", ts, total));

            let failures = (profile.failures_per_snapshot * intensity + draw(0.3, &mut rng))
                .max(0.0)
                .round();
            failed.push(endpoint_entry(&sensor_id, "temperature", ts, failures));

            sent_totals[sensor] += 850.0
                * lerp(1.0, profile.egress_multiplier, intensity)
                * (1.0 + draw(0.05, &mut rng));
            received_totals[sensor] += 320.0 * (1.0 + draw(0.02, &mut rng));
            network_sent.push(entry(&sensor_id, ts, sent_totals[sensor].round()));
            network_received.push(entry(&sensor_id, ts, received_totals[sensor].round()));
        }

        let datetime = chrono::DateTime::from_timestamp(ts as i64, 0)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_default();

        lines.push(
            json!({
                "timestamp": ts,
                "datetime": datetime,
                "data_type": "metrics",
                "metrics": {
                    "sensor_temperature": sensor_temp,
                    "gateway_temperature": gateway_temp,
                    "dataserver_temperature": true_temp,
                    "sensor_cpu_usage_percent": cpu,
                    "sensor_memory_usage_mb": memory,
                    "sensor_fault_mode": fault_code,
                    "sensor_request_latency_seconds_bucket": latency_buckets,
                    "sensor_failed_requests": failed,
                    "sensor_network_sent_bytes": network_sent,
                    "sensor_network_received_bytes": network_received,
                }
            })
            .to_string(),
        );
    }

    Ok(lines)
}

/// Write one phase file.
pub fn write_phase(
    path: &Path,
    config: &GeneratorConfig,
    scenario: ScenarioKind,
    phase: Phase,
) -> Result<(), TestdataError> {
    let lines = generate_phase(config, scenario, phase)?;
    let mut file = fs::File::create(path)?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    Ok(())
}

/// Write a complete baseline/event/recovery dataset into `dir`.
pub fn write_dataset(
    dir: impl AsRef<Path>,
    scenario: ScenarioKind,
    config: &GeneratorConfig,
) -> Result<DatasetPaths, TestdataError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut paths = Vec::with_capacity(Phase::ALL.len());
    for phase in Phase::ALL {
        let path = dir.join(format!("{}_{}.jsonl", scenario.label(), phase.name()));
        write_phase(&path, config, scenario, phase)?;
        paths.push(path);
    }

    let mut iter = paths.into_iter();
    Ok(DatasetPaths {
        baseline: iter.next().unwrap_or_default(),
        event: iter.next().unwrap_or_default(),
        recovery: iter.next().unwrap_or_default(),
    })
}

fn metadata_line(
    config: &GeneratorConfig,
    scenario: ScenarioKind,
    phase: Phase,
    phase_start: f64,
) -> String {
    let collection_start = chrono::DateTime::from_timestamp(phase_start as i64, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default();
    json!({
        "event_type": format!("{}_{}", scenario.label(), phase.name()),
        "collection_start": collection_start,
        "planned_duration": config.snapshots_per_phase as f64 * config.interval_secs,
        "interval": config.interval_secs,
        "data_type": "metadata",
    })
    .to_string()
}

/// Prometheus query results carry values as `[timestamp, "value"]` pairs.
fn pair(ts: f64, value: f64) -> Value {
    json!([ts, format!("{value:.6}")])
}

fn entry(sensor_id: &str, ts: f64, value: f64) -> Value {
    json!({"metric": {"sensor_id": sensor_id}, "value": pair(ts, value)})
}

fn endpoint_entry(sensor_id: &str, endpoint: &str, ts: f64, value: f64) -> Value {
    json!({"metric": {"sensor_id": sensor_id, "endpoint": endpoint}, "value": pair(ts, value)})
}

fn bucket_entry(sensor_id: &str, le: &str, ts: f64, count: f64) -> Value {
    json!({
        "metric": {"sensor_id": sensor_id, "endpoint": "temperature", "le": le},
        "value": pair(ts, count)
    })
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
