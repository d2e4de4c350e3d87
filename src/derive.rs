// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Derived metric computation over the flat table.
//!
//! Every derivation reads only already-materialized inputs, so the column
//! passes may run in any order. Computations that need temporal ordering
//! (intervals, rolling statistics) sort a phase-local index by timestamp
//! and write results back to the originating rows; global row order is
//! never mutated.

use crate::config::EngineConfig;
use crate::record::DerivedTable;
use log::warn;

/// Augment the table with deviation, interval, rate, latency, anomaly and
/// failure columns.
pub fn compute_derived(mut table: DerivedTable, config: &EngineConfig) -> DerivedTable {
    if table.is_empty() {
        warn!("Empty table, skipping derived metrics calculation");
        return table;
    }

    add_temperature_deviations(&mut table);
    add_reporting_intervals(&mut table);
    add_network_rates(&mut table);
    normalize_latency_columns(&mut table);
    add_rolling_scores(&mut table, config);
    add_interval_stability(&mut table, config);
    add_cumulative_failures(&mut table);

    table
}

fn sensor_ids_from(columns: &[String], prefix: &str) -> Vec<String> {
    columns
        .iter()
        .filter_map(|column| column.strip_prefix(prefix))
        .map(str::to_string)
        .collect()
}

/// Cross-entity absolute deviations between the sensor reading, the
/// gateway-reported reading and the data-server ground truth.
fn add_temperature_deviations(table: &mut DerivedTable) {
    let sensor_ids = sensor_ids_from(&table.columns_with_prefix("temperature_"), "temperature_");

    for sensor_id in &sensor_ids {
        let sensor_col = format!("temperature_{sensor_id}");
        let gateway_col = format!("gateway_temp_{sensor_id}");
        let true_col = format!("true_temp_{sensor_id}");

        for row in table.rows_mut() {
            let sensor = row.get(&sensor_col);
            let gateway = row.get(&gateway_col);
            let truth = row.get(&true_col);

            if let (Some(s), Some(g)) = (sensor, gateway) {
                row.set(&format!("sensor_gateway_dev_{sensor_id}"), (s - g).abs());
            }
            if let (Some(s), Some(t)) = (sensor, truth) {
                row.set(&format!("sensor_true_dev_{sensor_id}"), (s - t).abs());
            }
            if let (Some(g), Some(t)) = (gateway, truth) {
                row.set(&format!("gateway_true_dev_{sensor_id}"), (g - t).abs());
            }
        }
    }
}

/// Time between consecutive readings, per sensor, per phase.
///
/// Rows are ordered by timestamp within the phase; the first reading of a
/// phase has no predecessor and gets NaN. Values land on the originating
/// rows, so the table keeps its insertion order.
fn add_reporting_intervals(table: &mut DerivedTable) {
    let sensor_ids = sensor_ids_from(&table.columns_with_prefix("temperature_"), "temperature_");
    if sensor_ids.is_empty() {
        return;
    }

    for phase in table.phases() {
        let mut ordered: Vec<(usize, f64)> = table
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| row.phase == phase)
            .map(|(index, row)| (index, row.timestamp))
            .collect();
        if ordered.len() < 2 {
            continue;
        }
        ordered.sort_by(|a, b| a.1.total_cmp(&b.1));

        let rows = table.rows_mut();
        for (position, &(row_index, timestamp)) in ordered.iter().enumerate() {
            let interval = if position == 0 {
                f64::NAN
            } else {
                timestamp - ordered[position - 1].1
            };
            for sensor_id in &sensor_ids {
                rows[row_index].set(&format!("reporting_interval_{sensor_id}"), interval);
            }
        }
    }
}

/// Byte-counter rates between consecutive rows of the whole sequence.
///
/// Counters are cumulative, so the rate is Δvalue / Δtimestamp. Rates span
/// phase boundaries on purpose: the counters do too.
fn add_network_rates(table: &mut DerivedTable) {
    for direction in ["sent", "received"] {
        let prefix = format!("network_{direction}_");
        let columns: Vec<String> = table
            .columns_with_prefix(&prefix)
            .into_iter()
            .filter(|column| !column.contains("_rate_"))
            .collect();

        for column in columns {
            let sensor_id = column.strip_prefix(&prefix).unwrap_or_default().to_string();
            let rate_col = format!("network_{direction}_rate_{sensor_id}");

            let series: Vec<(Option<f64>, f64)> = table
                .rows()
                .iter()
                .map(|row| (row.get(&column), row.timestamp))
                .collect();

            let rows = table.rows_mut();
            for index in 1..series.len() {
                let (Some(current), current_ts) = series[index] else {
                    continue;
                };
                let (Some(previous), previous_ts) = series[index - 1] else {
                    continue;
                };
                let delta_ts = current_ts - previous_ts;
                if delta_ts > 0.0 {
                    rows[index].set(&rate_col, (current - previous) / delta_ts);
                }
            }
        }
    }
}

/// Seconds-to-milliseconds normalization plus the row-wise
/// `response_time_ms` accumulator.
///
/// Histogram estimation creates `latency_ms_*` columns first; this pass
/// never overwrites an existing one.
fn normalize_latency_columns(table: &mut DerivedTable) {
    let latency_cols: Vec<String> = table
        .columns()
        .into_iter()
        .filter(|column| column.starts_with("latency_") && !column.starts_with("latency_ms_"))
        .collect();
    if latency_cols.is_empty() {
        return;
    }

    let existing_ms = table.columns_with_prefix("latency_ms_");

    for row in table.rows_mut() {
        row.set("response_time_ms", 0.0);
    }

    for column in &latency_cols {
        let Some(rest) = column.strip_prefix("latency_") else {
            continue;
        };
        let Some((endpoint, sensor_id)) = rest.split_once('_') else {
            continue;
        };
        let ms_col = format!("latency_ms_{endpoint}_{sensor_id}");
        let convert = !existing_ms.contains(&ms_col);

        for row in table.rows_mut() {
            let Some(seconds) = row.get(column) else {
                continue;
            };
            if seconds.is_nan() {
                continue;
            }
            if convert {
                row.set(&ms_col, seconds * 1000.0);
            }
            let total = row.get("response_time_ms").unwrap_or(0.0);
            row.set("response_time_ms", total + seconds * 1000.0);
        }
    }
}

/// Rolling mean/std and absolute z-score per primary reading column.
///
/// A zero rolling std makes the z-score undefined (NaN), never a
/// divide-by-zero.
fn add_rolling_scores(table: &mut DerivedTable, config: &EngineConfig) {
    if table.len() < config.min_rows_for_rolling {
        return;
    }
    let window = config.rolling_window.max(1);

    for column in table.columns_with_prefix("temperature_") {
        let series: Vec<Option<f64>> = table.rows().iter().map(|row| row.get(&column)).collect();

        let mean_col = format!("{column}_roll_mean");
        let std_col = format!("{column}_roll_std");
        let zscore_col = format!("{column}_zscore");

        let rows = table.rows_mut();
        for index in 0..series.len() {
            let start = index.saturating_sub(window - 1);
            let window_values: Vec<f64> = series[start..=index]
                .iter()
                .flatten()
                .copied()
                .filter(|value| !value.is_nan())
                .collect();
            if window_values.is_empty() {
                continue;
            }

            let rolling_mean = mean(&window_values);
            let rolling_std = sample_std(&window_values);
            rows[index].set(&mean_col, rolling_mean);
            rows[index].set(&std_col, rolling_std);

            let zscore = match series[index] {
                Some(value) if !value.is_nan() && rolling_std > 0.0 => {
                    (value - rolling_mean).abs() / rolling_std
                }
                _ => f64::NAN,
            };
            rows[index].set(&zscore_col, zscore);
        }
    }
}

/// Rolling std of the reporting interval, per sensor, per phase.
fn add_interval_stability(table: &mut DerivedTable, config: &EngineConfig) {
    let sensor_ids = sensor_ids_from(&table.columns_with_prefix("temperature_"), "temperature_");
    let window = config.rolling_window.max(1);
    let columns = table.columns();

    for sensor_id in &sensor_ids {
        let interval_col = format!("reporting_interval_{sensor_id}");
        if !columns.contains(&interval_col) {
            continue;
        }
        let stability_col = format!("interval_stability_{sensor_id}");

        for phase in table.phases() {
            let indices: Vec<usize> = table
                .rows()
                .iter()
                .enumerate()
                .filter(|(_, row)| row.phase == phase)
                .map(|(index, _)| index)
                .collect();
            if indices.len() <= config.min_rows_for_rolling {
                continue;
            }

            let series: Vec<Option<f64>> = indices
                .iter()
                .map(|&index| table.rows()[index].get(&interval_col))
                .collect();

            let rows = table.rows_mut();
            for position in 0..series.len() {
                let start = position.saturating_sub(window - 1);
                let window_values: Vec<f64> = series[start..=position]
                    .iter()
                    .flatten()
                    .copied()
                    .filter(|value| !value.is_nan())
                    .collect();
                if window_values.len() >= config.stability_min_periods {
                    rows[indices[position]].set(&stability_col, sample_std(&window_values));
                }
            }
        }
    }
}

/// Running sum of every failed-request counter column.
fn add_cumulative_failures(table: &mut DerivedTable) {
    for column in table.columns_with_prefix("failed_") {
        let Some(rest) = column.strip_prefix("failed_") else {
            continue;
        };
        let Some((endpoint, sensor_id)) = rest.split_once('_') else {
            continue;
        };
        let cumulative_col = format!("cumulative_failures_{endpoint}_{sensor_id}");

        let mut total = 0.0;
        for row in table.rows_mut() {
            let Some(value) = row.get(&column) else {
                continue;
            };
            if value.is_nan() {
                continue;
            }
            total += value;
            row.set(&cumulative_col, total);
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1); NaN below two samples.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|value| (value - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FlatRecord;
    use approx::assert_relative_eq;

    fn row(timestamp: f64, phase: &str, columns: &[(&str, f64)]) -> FlatRecord {
        let mut record = FlatRecord::new(timestamp, phase, "fault_a");
        for (column, value) in columns {
            record.set(column, *value);
        }
        record
    }

    fn table_from(rows: Vec<FlatRecord>) -> DerivedTable {
        let mut table = DerivedTable::new();
        for r in rows {
            table.push(r);
        }
        table
    }

    #[test]
    fn test_empty_table_passthrough() {
        let table = compute_derived(DerivedTable::new(), &EngineConfig::default());
        assert!(table.is_empty());
    }

    #[test]
    fn test_temperature_deviations() {
        let table = table_from(vec![row(
            1.0,
            "baseline",
            &[
                ("temperature_S1", 22.5),
                ("gateway_temp_S1", 22.0),
                ("true_temp_S1", 21.0),
            ],
        )]);
        let table = compute_derived(table, &EngineConfig::default());

        let first = &table.rows()[0];
        assert_relative_eq!(first.get("sensor_gateway_dev_S1").unwrap(), 0.5);
        assert_relative_eq!(first.get("sensor_true_dev_S1").unwrap(), 1.5);
        assert_relative_eq!(first.get("gateway_true_dev_S1").unwrap(), 1.0);
    }

    #[test]
    fn test_deviation_omitted_without_comparison_column() {
        let table = table_from(vec![row(1.0, "baseline", &[("temperature_S1", 22.5)])]);
        let table = compute_derived(table, &EngineConfig::default());

        let first = &table.rows()[0];
        assert!(first.get("sensor_gateway_dev_S1").is_none());
        assert!(first.get("sensor_true_dev_S1").is_none());
    }

    #[test]
    fn test_reporting_intervals_in_timestamp_order() {
        // Rows arrive shuffled; intervals follow timestamp order [0,5,10,17].
        let table = table_from(vec![
            row(10.0, "baseline", &[("temperature_S1", 1.0)]),
            row(0.0, "baseline", &[("temperature_S1", 1.0)]),
            row(17.0, "baseline", &[("temperature_S1", 1.0)]),
            row(5.0, "baseline", &[("temperature_S1", 1.0)]),
        ]);
        let table = compute_derived(table, &EngineConfig::default());

        let by_timestamp = |ts: f64| {
            table
                .rows()
                .iter()
                .find(|row| row.timestamp == ts)
                .unwrap()
                .get("reporting_interval_S1")
                .unwrap()
        };
        assert!(by_timestamp(0.0).is_nan());
        assert_relative_eq!(by_timestamp(5.0), 5.0);
        assert_relative_eq!(by_timestamp(10.0), 5.0);
        assert_relative_eq!(by_timestamp(17.0), 7.0);
    }

    #[test]
    fn test_intervals_are_phase_scoped() {
        let table = table_from(vec![
            row(0.0, "baseline", &[("temperature_S1", 1.0)]),
            row(5.0, "baseline", &[("temperature_S1", 1.0)]),
            row(100.0, "event", &[("temperature_S1", 1.0)]),
            row(104.0, "event", &[("temperature_S1", 1.0)]),
        ]);
        let table = compute_derived(table, &EngineConfig::default());

        // First event row starts its own phase; no 95-second cross-phase gap.
        let event_first = &table.rows()[2];
        assert!(event_first.get("reporting_interval_S1").unwrap().is_nan());
        assert_relative_eq!(table.rows()[3].get("reporting_interval_S1").unwrap(), 4.0);
    }

    #[test]
    fn test_network_rates() {
        let table = table_from(vec![
            row(0.0, "baseline", &[("network_sent_S1", 1000.0)]),
            row(10.0, "baseline", &[("network_sent_S1", 2000.0)]),
            row(20.0, "baseline", &[("network_sent_S1", 2500.0)]),
        ]);
        let table = compute_derived(table, &EngineConfig::default());

        assert!(table.rows()[0].get("network_sent_rate_S1").is_none());
        assert_relative_eq!(table.rows()[1].get("network_sent_rate_S1").unwrap(), 100.0);
        assert_relative_eq!(table.rows()[2].get("network_sent_rate_S1").unwrap(), 50.0);
    }

    #[test]
    fn test_network_rate_zero_dt_omitted() {
        let table = table_from(vec![
            row(5.0, "baseline", &[("network_sent_S1", 1000.0)]),
            row(5.0, "baseline", &[("network_sent_S1", 2000.0)]),
        ]);
        let table = compute_derived(table, &EngineConfig::default());
        assert!(table.rows()[1].get("network_sent_rate_S1").is_none());
    }

    #[test]
    fn test_latency_ms_and_response_time() {
        let table = table_from(vec![
            row(0.0, "baseline", &[("latency_temperature_S1", 0.05)]),
            row(5.0, "baseline", &[("latency_temperature_S1", 0.07)]),
        ]);
        let table = compute_derived(table, &EngineConfig::default());

        assert_relative_eq!(
            table.rows()[0].get("latency_ms_temperature_S1").unwrap(),
            50.0
        );
        assert_relative_eq!(table.rows()[1].get("response_time_ms").unwrap(), 70.0);
    }

    #[test]
    fn test_latency_ms_not_overwritten() {
        // An estimator-produced column wins over the raw conversion.
        let mut first = row(0.0, "baseline", &[("latency_temperature_S1", 0.05)]);
        first.set("latency_ms_temperature_S1", 300.0);
        let table = compute_derived(table_from(vec![first]), &EngineConfig::default());

        assert_relative_eq!(
            table.rows()[0].get("latency_ms_temperature_S1").unwrap(),
            300.0
        );
    }

    #[test]
    fn test_rolling_zscore_constant_input_is_nan() {
        let rows: Vec<FlatRecord> = (0..8)
            .map(|i| row(i as f64, "baseline", &[("temperature_S1", 20.0)]))
            .collect();
        let table = compute_derived(table_from(rows), &EngineConfig::default());

        for record in table.rows() {
            let zscore = record.get("temperature_S1_zscore").unwrap();
            assert!(zscore.is_nan(), "expected NaN, got {zscore}");
        }
    }

    #[test]
    fn test_rolling_zscore_flags_spike() {
        let mut rows: Vec<FlatRecord> = (0..7)
            .map(|i| row(i as f64, "baseline", &[("temperature_S1", 20.0 + 0.1 * i as f64)]))
            .collect();
        rows.push(row(7.0, "baseline", &[("temperature_S1", 35.0)]));
        let table = compute_derived(table_from(rows), &EngineConfig::default());

        let spike = table.rows()[7].get("temperature_S1_zscore").unwrap();
        assert!(spike > 1.0, "spike z-score too small: {spike}");
    }

    #[test]
    fn test_rolling_skipped_below_min_rows() {
        let rows: Vec<FlatRecord> = (0..3)
            .map(|i| row(i as f64, "baseline", &[("temperature_S1", 20.0)]))
            .collect();
        let table = compute_derived(table_from(rows), &EngineConfig::default());

        assert!(table.rows()[2].get("temperature_S1_zscore").is_none());
    }

    #[test]
    fn test_interval_stability_needs_enough_rows() {
        let constant: Vec<FlatRecord> = (0..10)
            .map(|i| row(i as f64 * 5.0, "baseline", &[("temperature_S1", 20.0)]))
            .collect();
        let table = compute_derived(table_from(constant), &EngineConfig::default());

        // Constant cadence: stability settles at zero once the window fills.
        let last = table.rows()[9].get("interval_stability_S1").unwrap();
        assert_relative_eq!(last, 0.0);

        let short: Vec<FlatRecord> = (0..4)
            .map(|i| row(i as f64 * 5.0, "baseline", &[("temperature_S1", 20.0)]))
            .collect();
        let table = compute_derived(table_from(short), &EngineConfig::default());
        assert!(table.rows()[3].get("interval_stability_S1").is_none());
    }

    #[test]
    fn test_cumulative_failures() {
        let table = table_from(vec![
            row(0.0, "baseline", &[("failed_temperature_S1", 1.0)]),
            row(5.0, "baseline", &[("failed_temperature_S1", 2.0)]),
            row(10.0, "baseline", &[("failed_temperature_S1", 0.0)]),
        ]);
        let table = compute_derived(table, &EngineConfig::default());

        assert_relative_eq!(
            table.rows()[1].get("cumulative_failures_temperature_S1").unwrap(),
            3.0
        );
        assert_relative_eq!(
            table.rows()[2].get("cumulative_failures_temperature_S1").unwrap(),
            3.0
        );
    }

    #[test]
    fn test_sample_std() {
        assert_relative_eq!(sample_std(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5f64.sqrt());
        assert!(sample_std(&[1.0]).is_nan());
    }
}
