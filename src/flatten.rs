// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Snapshot flattening into synthesized columns.
//!
//! Each metrics snapshot becomes at most one flat row. Column names are
//! synthesized from a fixed metric-kind table plus the entry's entity
//! labels; the table is read-only for the lifetime of a run.

use crate::histogram::{parse_le, HistogramBuckets};
use crate::record::FlatRecord;
use crate::snapshot::{DataKind, MetricEntry, RawSnapshot};
use log::debug;
use std::collections::BTreeMap;

/// How a metric kind maps onto synthesized columns.
#[derive(Debug, Clone, Copy)]
enum ColumnRule {
    /// `{prefix}_{sensor_id}`
    Sensor(&'static str),
    /// `{prefix}_{endpoint}_{sensor_id}`
    EndpointSensor(&'static str),
    /// Raw `latency_{endpoint}_{sensor_id}` column plus cumulative bucket
    /// accumulation for quantile estimation.
    LatencyHistogram,
}

/// Fixed metric-kind table for exact kind names.
static METRIC_COLUMNS: &[(&str, ColumnRule)] = &[
    ("sensor_temperature", ColumnRule::Sensor("temperature")),
    ("gateway_temperature", ColumnRule::Sensor("gateway_temp")),
    ("dataserver_temperature", ColumnRule::Sensor("true_temp")),
    ("sensor_cpu_usage_percent", ColumnRule::Sensor("cpu")),
    ("sensor_memory_usage_mb", ColumnRule::Sensor("memory")),
    ("sensor_fault_mode", ColumnRule::Sensor("fault_code")),
    (
        "sensor_request_latency_seconds_bucket",
        ColumnRule::LatencyHistogram,
    ),
    ("sensor_failed_requests", ColumnRule::EndpointSensor("failed")),
];

/// Kinds matched by substring: network counters are emitted per component
/// (`sensor_network_sent_bytes`, `gateway_network_sent_bytes`, ...), and
/// some sensor builds export process totals.
static METRIC_COLUMN_PATTERNS: &[(&str, ColumnRule)] = &[
    ("network_sent_bytes", ColumnRule::Sensor("network_sent")),
    ("network_received_bytes", ColumnRule::Sensor("network_received")),
    ("cpu_seconds_total", ColumnRule::Sensor("cpu_total")),
    ("memory_bytes_total", ColumnRule::Sensor("memory_total")),
];

fn column_rule(metric_kind: &str) -> Option<ColumnRule> {
    if let Some((_, rule)) = METRIC_COLUMNS.iter().find(|(kind, _)| *kind == metric_kind) {
        return Some(*rule);
    }
    METRIC_COLUMN_PATTERNS
        .iter()
        .find(|(pattern, _)| metric_kind.contains(pattern))
        .map(|(_, rule)| *rule)
}

fn label_or(entry: &MetricEntry, key: &str, default: &str) -> String {
    entry
        .labels
        .get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// A flattened snapshot with its pending histogram buckets.
///
/// The bucket side structure is consumed by quantile estimation and does
/// not survive into the working table.
#[derive(Debug)]
pub struct FlattenedSnapshot {
    pub record: FlatRecord,
    /// (endpoint, sensor_id) -> cumulative buckets.
    pub buckets: BTreeMap<(String, String), HistogramBuckets>,
}

/// Flatten one snapshot under the given phase and experiment label.
///
/// The file-to-phase association is established upstream; this function
/// never infers a phase from content. Returns `None` for non-metrics
/// snapshots and for rows that carry no synthesized column at all.
pub fn flatten_snapshot(snapshot: &RawSnapshot, phase: &str, label: &str) -> Option<FlattenedSnapshot> {
    if snapshot.kind != DataKind::Metrics {
        return None;
    }

    let mut record = FlatRecord::new(snapshot.timestamp.unwrap_or(f64::NAN), phase, label);
    let mut buckets: BTreeMap<(String, String), HistogramBuckets> = BTreeMap::new();

    for (metric_kind, entries) in &snapshot.metrics {
        let Some(rule) = column_rule(metric_kind) else {
            continue;
        };

        for entry in entries {
            let sensor_id = label_or(entry, "sensor_id", "unknown");
            match rule {
                ColumnRule::Sensor(prefix) => {
                    record.set(&format!("{prefix}_{sensor_id}"), entry.value);
                }
                ColumnRule::EndpointSensor(prefix) => {
                    let endpoint = label_or(entry, "endpoint", "unknown");
                    record.set(&format!("{prefix}_{endpoint}_{sensor_id}"), entry.value);
                }
                ColumnRule::LatencyHistogram => {
                    let endpoint = label_or(entry, "endpoint", "unknown");
                    record.set(&format!("latency_{endpoint}_{sensor_id}"), entry.value);

                    let le = entry.labels.get("le").map(String::as_str).unwrap_or("inf");
                    match parse_le(le) {
                        Some(bound) => buckets
                            .entry((endpoint, sensor_id))
                            .or_default()
                            .insert(bound, entry.value),
                        None => debug!(
                            "Unparsable bucket bound {:?} for {} in {}",
                            le, sensor_id, metric_kind
                        ),
                    }
                }
            }
        }
    }

    // Rows with no synthesized column carry no signal.
    if record.values.is_empty() {
        return None;
    }

    Some(FlattenedSnapshot { record, buckets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot_from(value: serde_json::Value) -> RawSnapshot {
        RawSnapshot::from_value(&value).unwrap()
    }

    #[test]
    fn test_sensor_keyed_columns() {
        let snapshot = snapshot_from(json!({
            "data_type": "metrics",
            "timestamp": 100.0,
            "metrics": {
                "sensor_temperature": [
                    {"metric": {"sensor_id": "TEMP001"}, "value": 22.5}
                ],
                "gateway_temperature": [
                    {"metric": {"sensor_id": "TEMP001"}, "value": 22.4}
                ],
                "dataserver_temperature": [
                    {"metric": {"sensor_id": "TEMP001"}, "value": 22.0}
                ],
                "sensor_cpu_usage_percent": [
                    {"metric": {"sensor_id": "TEMP001"}, "value": 12.0}
                ],
                "sensor_memory_usage_mb": [
                    {"metric": {"sensor_id": "TEMP001"}, "value": 64.0}
                ],
                "sensor_fault_mode": [
                    {"metric": {"sensor_id": "TEMP001"}, "value": 0.0}
                ]
            }
        }));

        let flat = flatten_snapshot(&snapshot, "baseline", "fault_a").unwrap();
        let record = flat.record;
        assert_eq!(record.get("temperature_TEMP001"), Some(22.5));
        assert_eq!(record.get("gateway_temp_TEMP001"), Some(22.4));
        assert_eq!(record.get("true_temp_TEMP001"), Some(22.0));
        assert_eq!(record.get("cpu_TEMP001"), Some(12.0));
        assert_eq!(record.get("memory_TEMP001"), Some(64.0));
        assert_eq!(record.get("fault_code_TEMP001"), Some(0.0));
        assert_eq!(record.phase, "baseline");
        assert_eq!(record.label, "fault_a");
    }

    #[test]
    fn test_missing_sensor_id_defaults_to_unknown() {
        let snapshot = snapshot_from(json!({
            "data_type": "metrics",
            "timestamp": 100.0,
            "metrics": {
                "sensor_temperature": [{"metric": {}, "value": 1.0}]
            }
        }));

        let flat = flatten_snapshot(&snapshot, "baseline", "fault_a").unwrap();
        assert_eq!(flat.record.get("temperature_unknown"), Some(1.0));
    }

    #[test]
    fn test_histogram_entries_accumulate_buckets() {
        let snapshot = snapshot_from(json!({
            "data_type": "metrics",
            "timestamp": 100.0,
            "metrics": {
                "sensor_request_latency_seconds_bucket": [
                    {"metric": {"sensor_id": "S1", "endpoint": "temperature", "le": "0.1"}, "value": 40},
                    {"metric": {"sensor_id": "S1", "endpoint": "temperature", "le": "0.5"}, "value": 95},
                    {"metric": {"sensor_id": "S1", "endpoint": "temperature", "le": "+Inf"}, "value": 100}
                ]
            }
        }));

        let flat = flatten_snapshot(&snapshot, "event", "ddos").unwrap();
        assert!(flat.record.get("latency_temperature_S1").is_some());

        let key = ("temperature".to_string(), "S1".to_string());
        assert_eq!(flat.buckets[&key].len(), 3);
    }

    #[test]
    fn test_network_kinds_match_by_substring() {
        let snapshot = snapshot_from(json!({
            "data_type": "metrics",
            "timestamp": 100.0,
            "metrics": {
                "sensor_network_sent_bytes": [
                    {"metric": {"sensor_id": "S1"}, "value": 1024}
                ],
                "gateway_network_received_bytes": [
                    {"metric": {"sensor_id": "GW1"}, "value": 2048}
                ]
            }
        }));

        let flat = flatten_snapshot(&snapshot, "baseline", "fault_a").unwrap();
        assert_eq!(flat.record.get("network_sent_S1"), Some(1024.0));
        assert_eq!(flat.record.get("network_received_GW1"), Some(2048.0));
    }

    #[test]
    fn test_empty_record_dropped() {
        let snapshot = snapshot_from(json!({
            "data_type": "metrics",
            "timestamp": 100.0,
            "metrics": {
                "unrecognized_metric_kind": [
                    {"metric": {"sensor_id": "S1"}, "value": 7.0}
                ]
            }
        }));

        assert!(flatten_snapshot(&snapshot, "baseline", "fault_a").is_none());
    }

    #[test]
    fn test_non_metrics_snapshots_skipped() {
        let snapshot = snapshot_from(json!({"data_type": "metadata"}));
        assert!(flatten_snapshot(&snapshot, "baseline", "fault_a").is_none());
    }

    #[test]
    fn test_failed_requests_keyed_by_endpoint() {
        let snapshot = snapshot_from(json!({
            "data_type": "metrics",
            "timestamp": 100.0,
            "metrics": {
                "sensor_failed_requests": [
                    {"metric": {"sensor_id": "S1", "endpoint": "temperature"}, "value": 3}
                ]
            }
        }));

        let flat = flatten_snapshot(&snapshot, "event", "ddos").unwrap();
        assert_eq!(flat.record.get("failed_temperature_S1"), Some(3.0));
    }
}
