// FieldScope Testdata - Scenario profiles
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Attack and fault scenario profiles.
//!
//! A profile describes how the event phase distorts the testbed telemetry
//! relative to baseline. The generator scales each distortion by the phase
//! intensity (0 at baseline, 1 during the event, residual in recovery).

/// Injected condition simulated in the event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Clean run, no injected condition.
    Normal,
    /// Broken object level authorization against the data server; the
    /// tampered gateway path diverges from the sensor reading.
    Bola,
    /// Request flood: latency buckets shift right, requests fail, CPU spikes.
    Ddos,
    /// Post-exploitation exfiltration: network egress surges.
    CommandInjection,
    /// Malicious firmware burning CPU and leaking memory.
    ResourceExhaustion,
    /// Stuck sensor reporting a frozen reading with a fault code.
    SensorFault,
}

impl ScenarioKind {
    /// Experiment label used in dataset file names and reports.
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKind::Normal => "normal",
            ScenarioKind::Bola => "bola",
            ScenarioKind::Ddos => "ddos",
            ScenarioKind::CommandInjection => "command_injection",
            ScenarioKind::ResourceExhaustion => "resource_exhaustion",
            ScenarioKind::SensorFault => "sensor_fault",
        }
    }

    /// Event-phase telemetry signature.
    pub fn profile(&self) -> ScenarioProfile {
        match self {
            ScenarioKind::Normal => ScenarioProfile::default(),
            ScenarioKind::Bola => ScenarioProfile {
                cpu_multiplier: 1.3,
                gateway_bias: 2.5,
                egress_multiplier: 1.2,
                ..Default::default()
            },
            ScenarioKind::Ddos => ScenarioProfile {
                cpu_multiplier: 3.5,
                latency_shift: 0.8,
                failures_per_snapshot: 4.0,
                egress_multiplier: 1.5,
                ..Default::default()
            },
            ScenarioKind::CommandInjection => ScenarioProfile {
                cpu_multiplier: 1.8,
                egress_multiplier: 6.0,
                failures_per_snapshot: 0.5,
                ..Default::default()
            },
            ScenarioKind::ResourceExhaustion => ScenarioProfile {
                cpu_multiplier: 6.0,
                memory_drift_mb: 4.0,
                latency_shift: 0.4,
                ..Default::default()
            },
            ScenarioKind::SensorFault => ScenarioProfile {
                stuck_readings: true,
                fault_code: 4.0,
                failures_per_snapshot: 1.0,
                ..Default::default()
            },
        }
    }
}

/// How a scenario distorts event-phase telemetry.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioProfile {
    /// CPU usage multiplier at full intensity.
    pub cpu_multiplier: f64,
    /// Memory climb per snapshot, in MB.
    pub memory_drift_mb: f64,
    /// Shift of latency-bucket mass toward higher bounds (0..1).
    pub latency_shift: f64,
    /// Mean failed requests added per snapshot.
    pub failures_per_snapshot: f64,
    /// Network egress multiplier at full intensity.
    pub egress_multiplier: f64,
    /// Gateway temperature divergence from the sensor reading, in °C.
    pub gateway_bias: f64,
    /// Freeze sensor readings at their event-start value.
    pub stuck_readings: bool,
    /// Fault code reported while the condition is active.
    pub fault_code: f64,
}

impl Default for ScenarioProfile {
    fn default() -> Self {
        Self {
            cpu_multiplier: 1.0,
            memory_drift_mb: 0.0,
            latency_shift: 0.0,
            failures_per_snapshot: 0.0,
            egress_multiplier: 1.0,
            gateway_bias: 0.0,
            stuck_readings: false,
            fault_code: 0.0,
        }
    }
}
