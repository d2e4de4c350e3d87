// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-phase aggregation of the derived table.

use crate::config::EngineConfig;
use crate::record::{DerivedTable, FlatRecord};
use serde::Serialize;

/// Summary statistics for one (experiment label, phase) group.
///
/// Cross-sensor statistics average each column over its populated rows
/// first, then average the per-column results. NaN marks a statistic with
/// no usable input; it is never coerced to zero.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseSummary {
    pub label: String,
    pub phase: String,
    pub avg_cpu: f64,
    pub max_cpu: f64,
    pub avg_memory: f64,
    pub max_memory: f64,
    pub avg_temp_deviation: f64,
    pub max_temp_deviation: f64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: f64,
    pub avg_reporting_interval: f64,
    pub interval_stability: f64,
    pub network_egress_rate: f64,
    /// Share of latency samples in this group produced by a fallback
    /// estimation path rather than genuine bucket interpolation. NaN when
    /// the group carries no latency estimates at all.
    pub estimated_latency_fraction: f64,
    /// Rows aggregated into this summary.
    pub measurements: usize,
}

/// Summarize the table into one row per (label, phase) pair, in
/// first-appearance order.
pub fn summarize_phases(table: &DerivedTable, config: &EngineConfig) -> Vec<PhaseSummary> {
    let mut summaries = Vec::new();
    if table.is_empty() {
        return summaries;
    }

    let cpu_cols = table.columns_with_prefix("cpu_");
    let memory_cols = table.columns_with_prefix("memory_");
    let temp_dev_cols: Vec<String> = table
        .columns()
        .into_iter()
        .filter(|column| column.contains("true_dev_"))
        .collect();
    let latency_cols = table.columns_with_prefix("latency_ms_");
    let interval_cols = table.columns_with_prefix("reporting_interval_");
    let stability_cols = table.columns_with_prefix("interval_stability_");
    let egress_cols = table.columns_with_prefix("network_sent_rate_");

    for label in table.labels() {
        for phase in table.phases() {
            let rows: Vec<&FlatRecord> = table
                .rows()
                .iter()
                .filter(|row| row.label == label && row.phase == phase)
                .collect();
            if rows.is_empty() {
                continue;
            }

            let (avg_cpu, max_cpu) = column_stats(&rows, &cpu_cols, |_| true);
            let (avg_memory, max_memory) = column_stats(&rows, &memory_cols, |_| true);
            let (avg_temp_deviation, max_temp_deviation) =
                column_stats(&rows, &temp_dev_cols, |_| true);

            // Fall back to the row-wise accumulator when no per-endpoint
            // latency column exists.
            let (avg_latency_ms, max_latency_ms) = if latency_cols.is_empty() {
                column_stats(&rows, &["response_time_ms".to_string()], |_| true)
            } else {
                column_stats(&rows, &latency_cols, |_| true)
            };

            // Non-positive intervals and offline gaps are collection
            // artifacts, not genuine reporting cadence.
            let (avg_reporting_interval, _) = column_stats(&rows, &interval_cols, |value| {
                value > 0.0 && value < config.offline_gap_secs
            });
            let (interval_stability, _) = column_stats(&rows, &stability_cols, |_| true);
            let (network_egress_rate, _) = column_stats(&rows, &egress_cols, |value| value > 0.0);

            summaries.push(PhaseSummary {
                label: label.clone(),
                phase: phase.clone(),
                avg_cpu,
                max_cpu,
                avg_memory,
                max_memory,
                avg_temp_deviation,
                max_temp_deviation,
                avg_latency_ms,
                max_latency_ms,
                avg_reporting_interval,
                interval_stability,
                network_egress_rate,
                estimated_latency_fraction: estimated_fraction(&rows),
                measurements: rows.len(),
            });
        }
    }

    summaries
}

/// Mean-of-means and max-of-maxes over a column family.
///
/// Each column aggregates over its populated, filter-passing values;
/// columns with nothing usable in the group are skipped rather than
/// poisoning the result.
fn column_stats<F>(rows: &[&FlatRecord], columns: &[String], filter: F) -> (f64, f64)
where
    F: Fn(f64) -> bool,
{
    let mut column_means = Vec::new();
    let mut column_maxes = Vec::new();

    for column in columns {
        let values: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|value| !value.is_nan() && filter(*value))
            .collect();
        if values.is_empty() {
            continue;
        }
        column_means.push(values.iter().sum::<f64>() / values.len() as f64);
        column_maxes.push(values.iter().copied().fold(f64::NEG_INFINITY, f64::max));
    }

    let avg = if column_means.is_empty() {
        f64::NAN
    } else {
        column_means.iter().sum::<f64>() / column_means.len() as f64
    };
    let max = column_maxes
        .into_iter()
        .fold(f64::NAN, |acc, value| if acc.is_nan() { value } else { acc.max(value) });

    (avg, max)
}

fn estimated_fraction(rows: &[&FlatRecord]) -> f64 {
    let mut total = 0usize;
    let mut estimated = 0usize;
    for row in rows {
        for estimate in row.estimates.values() {
            total += 1;
            if estimate.is_estimated {
                estimated += 1;
            }
        }
    }
    if total == 0 {
        f64::NAN
    } else {
        estimated as f64 / total as f64
    }
}
