// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dataset orchestration: one pipeline per experiment label.
//!
//! A dataset is one experiment's set of collector files (baseline, event,
//! optional recovery). Each dataset is processed end-to-end independently,
//! so batches fan out across worker threads with no shared mutable state
//! and join before any cross-label reporting.

use crate::config::EngineConfig;
use crate::derive::compute_derived;
use crate::error::{EngineError, Result};
use crate::flatten::{flatten_snapshot, FlattenedSnapshot};
use crate::impact::{analyze_impact, ImpactRecord};
use crate::loader::load_snapshots;
use crate::record::{DerivedTable, FlatRecord};
use crate::summary::{summarize_phases, PhaseSummary};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Canonical phase names used for cross-experiment comparison.
pub const PHASE_BASELINE: &str = "baseline";
pub const PHASE_EVENT: &str = "event";
pub const PHASE_RECOVERY: &str = "recovery";

/// Map attack-specific phase labels onto the canonical set.
///
/// The engine accepts arbitrary phase strings and performs no implicit
/// renaming; callers apply this before impact analysis when experiments
/// must be comparable.
pub fn canonical_phase(raw: &str) -> &str {
    match raw {
        "attack" | "bola_attack" | "install" | "shell" => PHASE_EVENT,
        other => other,
    }
}

/// Input files for one experiment.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    /// Experiment label: the fault or attack under test.
    pub label: String,
    /// Baseline-phase collector file.
    pub baseline: PathBuf,
    /// Event-phase collector file.
    pub event: PathBuf,
    /// Optional recovery-phase collector file.
    pub recovery: Option<PathBuf>,
}

impl DatasetSpec {
    pub fn new(
        label: impl Into<String>,
        baseline: impl Into<PathBuf>,
        event: impl Into<PathBuf>,
    ) -> Self {
        Self {
            label: label.into(),
            baseline: baseline.into(),
            event: event.into(),
            recovery: None,
        }
    }

    pub fn with_recovery(mut self, recovery: impl Into<PathBuf>) -> Self {
        self.recovery = Some(recovery.into());
        self
    }
}

/// The three tabular artifacts produced for one dataset.
///
/// Persistence format is the caller's concern; everything here is an
/// in-memory structure.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub label: String,
    /// Row-per-snapshot table with derived columns.
    pub table: DerivedTable,
    /// Row per (label, phase).
    pub summaries: Vec<PhaseSummary>,
    /// Row per label with a usable baseline/event pair.
    pub impacts: Vec<ImpactRecord>,
}

/// Run the full pipeline for one dataset.
///
/// Data-level problems (unreadable files, malformed lines, missing
/// columns) degrade to partial or empty tables; only caller mistakes
/// (empty label, unusable configuration) produce an error.
pub fn process_dataset(spec: &DatasetSpec, config: &EngineConfig) -> Result<DatasetReport> {
    config.validate()?;
    if spec.label.trim().is_empty() {
        return Err(EngineError::EmptyLabel);
    }

    let mut phase_files: Vec<(&Path, &str)> = vec![
        (spec.baseline.as_path(), PHASE_BASELINE),
        (spec.event.as_path(), PHASE_EVENT),
    ];
    if let Some(recovery) = &spec.recovery {
        phase_files.push((recovery.as_path(), PHASE_RECOVERY));
    }

    let mut table = DerivedTable::new();
    for (path, phase) in phase_files {
        info!(
            "Loading {} data for {} from {}",
            phase,
            spec.label,
            path.display()
        );
        let snapshots = load_snapshots(path);
        let mut extracted = 0usize;
        for snapshot in &snapshots {
            if let Some(flat) = flatten_snapshot(snapshot, phase, &spec.label) {
                table.push(finalize_latency(flat, config));
                extracted += 1;
            }
        }
        debug!(
            "Extracted {} valid metric snapshots for {} phase",
            extracted, phase
        );
    }

    if table.is_empty() {
        warn!("No usable snapshots for {}", spec.label);
    }

    let table = compute_derived(table, config);
    let summaries = summarize_phases(&table, config);
    let impacts = analyze_impact(&summaries);

    Ok(DatasetReport {
        label: spec.label.clone(),
        table,
        summaries,
        impacts,
    })
}

/// Process a batch of datasets in parallel, one worker per dataset.
///
/// Reports come back in input order.
pub fn process_batch(specs: &[DatasetSpec], config: &EngineConfig) -> Result<Vec<DatasetReport>> {
    config.validate()?;
    specs
        .par_iter()
        .map(|spec| process_dataset(spec, config))
        .collect()
}

/// Fold histogram estimates into the flattened record and drop the bucket
/// side structure.
fn finalize_latency(flat: FlattenedSnapshot, config: &EngineConfig) -> FlatRecord {
    let FlattenedSnapshot {
        mut record,
        buckets,
    } = flat;
    for ((endpoint, sensor_id), bucket_set) in buckets {
        let estimate = bucket_set.estimate(config.latency_quantile);
        let column = format!("latency_ms_{endpoint}_{sensor_id}");
        record.set(&column, estimate.latency_ms);
        record.estimates.insert(column, estimate);
    }
    record
}
