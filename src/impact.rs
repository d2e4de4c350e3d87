// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Baseline-to-event impact analysis.
//!
//! Undefined comparisons (zero or NaN baselines) yield NaN, never a
//! divide-by-zero and never a silent zero: a fabricated 0% change would
//! read as "no impact".

use crate::pipeline::{PHASE_BASELINE, PHASE_EVENT, PHASE_RECOVERY};
use crate::summary::PhaseSummary;
use log::debug;
use serde::Serialize;

/// Relative change from a baseline to an event value, in percent.
///
/// NaN when the baseline is zero or either value is NaN.
pub fn percent_change(baseline: f64, event: f64) -> f64 {
    if baseline == 0.0 || baseline.is_nan() || event.is_nan() {
        return f64::NAN;
    }
    (event / baseline - 1.0) * 100.0
}

/// Recovery-to-baseline ratio under the same undefined guard.
///
/// A ratio near 1 signals full recovery; how far from 1 still counts as
/// recovered is the consumer's call.
pub fn recovery_ratio(recovery: f64, baseline: f64) -> f64 {
    if baseline == 0.0 || baseline.is_nan() || recovery.is_nan() {
        return f64::NAN;
    }
    recovery / baseline
}

/// Impact of one experiment's event phase relative to its baseline.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactRecord {
    pub label: String,
    pub cpu_increase_percent: f64,
    pub memory_increase_percent: f64,
    pub temp_deviation_increase_percent: f64,
    pub latency_increase_percent: f64,
    pub reporting_interval_change_percent: f64,
    pub interval_stability_change_percent: f64,
    pub network_rate_increase_percent: f64,
    /// Recovery ratios are present only when a recovery phase was observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_cpu_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_memory_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_latency_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_interval_ratio: Option<f64>,
}

/// Compare baseline vs. event (and, if present, recovery) summaries per
/// experiment label.
///
/// Labels missing a baseline or event summary are skipped; an empty result
/// means "insufficient data", not failure.
pub fn analyze_impact(summaries: &[PhaseSummary]) -> Vec<ImpactRecord> {
    let mut impacts = Vec::new();

    let mut labels: Vec<&str> = Vec::new();
    for summary in summaries {
        if !labels.contains(&summary.label.as_str()) {
            labels.push(&summary.label);
        }
    }

    for label in labels {
        let find = |phase: &str| {
            summaries
                .iter()
                .find(|summary| summary.label == label && summary.phase == phase)
        };

        let (Some(baseline), Some(event)) = (find(PHASE_BASELINE), find(PHASE_EVENT)) else {
            debug!("Skipping impact metrics for {label}: missing baseline or event phase");
            continue;
        };
        let recovery = find(PHASE_RECOVERY);

        impacts.push(ImpactRecord {
            label: label.to_string(),
            cpu_increase_percent: percent_change(baseline.avg_cpu, event.avg_cpu),
            memory_increase_percent: percent_change(baseline.avg_memory, event.avg_memory),
            temp_deviation_increase_percent: percent_change(
                baseline.avg_temp_deviation,
                event.avg_temp_deviation,
            ),
            latency_increase_percent: percent_change(baseline.avg_latency_ms, event.avg_latency_ms),
            reporting_interval_change_percent: percent_change(
                baseline.avg_reporting_interval,
                event.avg_reporting_interval,
            ),
            interval_stability_change_percent: percent_change(
                baseline.interval_stability,
                event.interval_stability,
            ),
            network_rate_increase_percent: percent_change(
                baseline.network_egress_rate,
                event.network_egress_rate,
            ),
            recovery_cpu_ratio: recovery.map(|r| recovery_ratio(r.avg_cpu, baseline.avg_cpu)),
            recovery_memory_ratio: recovery
                .map(|r| recovery_ratio(r.avg_memory, baseline.avg_memory)),
            recovery_latency_ratio: recovery
                .map(|r| recovery_ratio(r.avg_latency_ms, baseline.avg_latency_ms)),
            recovery_interval_ratio: recovery.map(|r| {
                recovery_ratio(r.avg_reporting_interval, baseline.avg_reporting_interval)
            }),
        });
    }

    impacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn summary(label: &str, phase: &str, avg_cpu: f64) -> PhaseSummary {
        PhaseSummary {
            label: label.to_string(),
            phase: phase.to_string(),
            avg_cpu,
            max_cpu: avg_cpu,
            avg_memory: 64.0,
            max_memory: 64.0,
            avg_temp_deviation: f64::NAN,
            max_temp_deviation: f64::NAN,
            avg_latency_ms: 50.0,
            max_latency_ms: 60.0,
            avg_reporting_interval: 5.0,
            interval_stability: 0.2,
            network_egress_rate: 100.0,
            estimated_latency_fraction: 0.0,
            measurements: 10,
        }
    }

    #[test]
    fn test_percent_change() {
        assert_relative_eq!(percent_change(100.0, 150.0), 50.0);
        assert_relative_eq!(percent_change(10.0, 40.0), 300.0);
        assert_relative_eq!(percent_change(40.0, 10.0), -75.0);
    }

    #[test]
    fn test_percent_change_undefined_baselines() {
        assert!(percent_change(0.0, 10.0).is_nan());
        assert!(percent_change(f64::NAN, 10.0).is_nan());
        assert!(percent_change(10.0, f64::NAN).is_nan());
    }

    #[test]
    fn test_recovery_ratio_guards() {
        assert_relative_eq!(recovery_ratio(11.0, 10.0), 1.1);
        assert!(recovery_ratio(11.0, 0.0).is_nan());
        assert!(recovery_ratio(f64::NAN, 10.0).is_nan());
    }

    #[test]
    fn test_impact_per_label() {
        let summaries = vec![
            summary("fault_a", "baseline", 10.0),
            summary("fault_a", "event", 40.0),
            summary("fault_b", "baseline", 20.0),
            summary("fault_b", "event", 30.0),
        ];
        let impacts = analyze_impact(&summaries);

        assert_eq!(impacts.len(), 2);
        assert_eq!(impacts[0].label, "fault_a");
        assert_relative_eq!(impacts[0].cpu_increase_percent, 300.0);
        assert_relative_eq!(impacts[1].cpu_increase_percent, 50.0);
        assert!(impacts[0].recovery_cpu_ratio.is_none());
    }

    #[test]
    fn test_missing_phase_skips_label() {
        let summaries = vec![
            summary("fault_a", "baseline", 10.0),
            summary("fault_b", "baseline", 20.0),
            summary("fault_b", "event", 30.0),
        ];
        let impacts = analyze_impact(&summaries);

        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].label, "fault_b");
    }

    #[test]
    fn test_recovery_ratios_present_with_recovery_phase() {
        let summaries = vec![
            summary("fault_a", "baseline", 10.0),
            summary("fault_a", "event", 40.0),
            summary("fault_a", "recovery", 11.0),
        ];
        let impacts = analyze_impact(&summaries);

        let ratio = impacts[0].recovery_cpu_ratio.unwrap();
        assert_relative_eq!(ratio, 1.1);
    }

    #[test]
    fn test_nan_baseline_propagates_not_zero() {
        let mut baseline = summary("fault_a", "baseline", 10.0);
        baseline.network_egress_rate = f64::NAN;
        let summaries = vec![baseline, summary("fault_a", "event", 40.0)];

        let impacts = analyze_impact(&summaries);
        assert!(impacts[0].network_rate_increase_percent.is_nan());
        assert!(impacts[0].temp_deviation_increase_percent.is_nan());
    }
}
