// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Raw snapshot model for collector JSON-Lines.
//!
//! The collector feed is loosely structured: values arrive as bare numbers,
//! `[timestamp, value]` pairs, or numeric strings, and several formats
//! legitimately send non-numeric placeholders. Coercion is therefore
//! tolerant by contract: anything unusable collapses to `0.0` rather than
//! an error.

use serde_json::Value;
use std::collections::BTreeMap;

/// Kind of a collector line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Collection metadata (first line of a dataset file).
    Metadata,
    /// A metrics snapshot.
    Metrics,
    /// An event marker (e.g. attack start).
    EventMarker,
}

impl DataKind {
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "metadata" => Some(DataKind::Metadata),
            "metrics" => Some(DataKind::Metrics),
            "event_start" => Some(DataKind::EventMarker),
            _ => None,
        }
    }
}

/// One observation within a snapshot: a label set and a coerced value.
#[derive(Debug, Clone)]
pub struct MetricEntry {
    /// Label set, e.g. `sensor_id`, `endpoint`, `le`.
    pub labels: BTreeMap<String, String>,
    /// Observation value after tolerant coercion.
    pub value: f64,
}

/// One parsed collector line.
#[derive(Debug, Clone)]
pub struct RawSnapshot {
    /// Line kind.
    pub kind: DataKind,
    /// Seconds since epoch. Metadata lines carry no sample timestamp.
    pub timestamp: Option<f64>,
    /// Metric kind -> entries. Populated on metrics lines.
    pub metrics: BTreeMap<String, Vec<MetricEntry>>,
}

impl RawSnapshot {
    /// Build a snapshot from one parsed JSON line.
    ///
    /// Returns `None` when the line has no recognizable `data_type`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let kind = value
            .get("data_type")
            .and_then(Value::as_str)
            .and_then(DataKind::from_wire)?;

        let timestamp = value.get("timestamp").and_then(Value::as_f64);

        let mut metrics = BTreeMap::new();
        if let Some(map) = value.get("metrics").and_then(Value::as_object) {
            for (metric_kind, entries) in map {
                let Some(entries) = entries.as_array() else {
                    continue;
                };
                let parsed: Vec<MetricEntry> = entries.iter().map(parse_entry).collect();
                if !parsed.is_empty() {
                    metrics.insert(metric_kind.clone(), parsed);
                }
            }
        }

        Some(Self {
            kind,
            timestamp,
            metrics,
        })
    }
}

fn parse_entry(entry: &Value) -> MetricEntry {
    let mut labels = BTreeMap::new();
    if let Some(map) = entry.get("metric").and_then(Value::as_object) {
        for (key, value) in map {
            let text = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            labels.insert(key.clone(), text);
        }
    }

    MetricEntry {
        labels,
        value: coerce_value(entry.get("value")),
    }
}

/// Tolerant scalar coercion used by the collector feed.
///
/// `[ts, value]` pairs use the value element, single-element arrays use
/// their element, numeric strings parse; everything else is `0.0`.
pub(crate) fn coerce_value(raw: Option<&Value>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    match raw {
        Value::Array(items) if items.len() > 1 => coerce_scalar(&items[1]),
        Value::Array(items) if items.len() == 1 => coerce_scalar(&items[0]),
        other => coerce_scalar(other),
    }
}

fn coerce_scalar(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}
