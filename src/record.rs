// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Flat working table for normalized metrics.
//!
//! Column sets are dynamic: a column exists only where the source data
//! carried it. Rows therefore pair a fixed set of scalar fields with a
//! sparse, string-keyed extension instead of a rigid schema. BTree keying
//! makes iteration deterministic, which keeps full pipeline reruns
//! byte-identical.

use crate::histogram::LatencyEstimate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One row of the working table.
#[derive(Debug, Clone, Serialize)]
pub struct FlatRecord {
    /// Snapshot timestamp, seconds since epoch.
    pub timestamp: f64,
    /// Human-readable timestamp, informational only.
    pub human_time: String,
    /// Phase this row was collected under (caller-supplied).
    pub phase: String,
    /// Experiment label: the fault or attack under test.
    pub label: String,
    /// Sparse synthesized columns.
    pub values: BTreeMap<String, f64>,
    /// Estimation metadata for latency columns, keyed by column name.
    pub estimates: BTreeMap<String, LatencyEstimate>,
}

impl FlatRecord {
    pub fn new(timestamp: f64, phase: &str, label: &str) -> Self {
        Self {
            timestamp,
            human_time: format_human_time(timestamp),
            phase: phase.to_string(),
            label: label.to_string(),
            values: BTreeMap::new(),
            estimates: BTreeMap::new(),
        }
    }

    /// Get a column value if the row carries it.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }

    /// Set a column value.
    pub fn set(&mut self, column: &str, value: f64) {
        self.values.insert(column.to_string(), value);
    }
}

/// Render a timestamp for humans; out-of-range timestamps become "".
fn format_human_time(timestamp: f64) -> String {
    if !timestamp.is_finite() {
        return String::new();
    }
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    match chrono::DateTime::from_timestamp(secs as i64, nanos) {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// Insertion-ordered table of flat records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivedTable {
    rows: Vec<FlatRecord>,
}

impl DerivedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: FlatRecord) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[FlatRecord] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [FlatRecord] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of synthesized column names across all rows.
    pub fn columns(&self) -> BTreeSet<String> {
        let mut columns = BTreeSet::new();
        for row in &self.rows {
            columns.extend(row.values.keys().cloned());
        }
        columns
    }

    /// Sorted column names starting with `prefix`.
    pub fn columns_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.columns()
            .into_iter()
            .filter(|column| column.starts_with(prefix))
            .collect()
    }

    /// Phases in first-appearance order.
    pub fn phases(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut phases = Vec::new();
        for row in &self.rows {
            if seen.insert(row.phase.clone()) {
                phases.push(row.phase.clone());
            }
        }
        phases
    }

    /// Experiment labels in first-appearance order.
    pub fn labels(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut labels = Vec::new();
        for row in &self.rows {
            if seen.insert(row.label.clone()) {
                labels.push(row.label.clone());
            }
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(timestamp: f64, phase: &str, columns: &[(&str, f64)]) -> FlatRecord {
        let mut record = FlatRecord::new(timestamp, phase, "fault_a");
        for (column, value) in columns {
            record.set(column, *value);
        }
        record
    }

    #[test]
    fn test_human_time_format() {
        let record = FlatRecord::new(0.0, "baseline", "fault_a");
        assert_eq!(record.human_time, "1970-01-01 00:00:00");
    }

    #[test]
    fn test_human_time_invalid_is_empty() {
        let record = FlatRecord::new(f64::NAN, "baseline", "fault_a");
        assert!(record.human_time.is_empty());
    }

    #[test]
    fn test_columns_union() {
        let mut table = DerivedTable::new();
        table.push(row(1.0, "baseline", &[("cpu_S1", 10.0)]));
        table.push(row(2.0, "baseline", &[("cpu_S2", 20.0), ("memory_S1", 5.0)]));

        let columns = table.columns();
        assert_eq!(columns.len(), 3);
        assert!(columns.contains("cpu_S1"));
        assert!(columns.contains("memory_S1"));
    }

    #[test]
    fn test_columns_with_prefix() {
        let mut table = DerivedTable::new();
        table.push(row(1.0, "baseline", &[("cpu_S1", 1.0), ("memory_S1", 2.0)]));
        table.push(row(2.0, "event", &[("cpu_S2", 3.0)]));

        assert_eq!(table.columns_with_prefix("cpu_"), vec!["cpu_S1", "cpu_S2"]);
        assert_eq!(table.columns_with_prefix("latency_"), Vec::<String>::new());
    }

    #[test]
    fn test_phase_order_is_first_appearance() {
        let mut table = DerivedTable::new();
        table.push(row(1.0, "baseline", &[("cpu_S1", 1.0)]));
        table.push(row(2.0, "event", &[("cpu_S1", 2.0)]));
        table.push(row(3.0, "baseline", &[("cpu_S1", 3.0)]));

        assert_eq!(table.phases(), vec!["baseline", "event"]);
    }
}
