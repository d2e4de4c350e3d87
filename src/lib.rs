// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # FieldScope - IoT security testbed impact analysis
//!
//! FieldScope quantifies how injected faults and attacks (BOLA, DDoS,
//! command injection, firmware resource exhaustion) move the telemetry of
//! a staged sensor/gateway/data-server testbed. It turns raw collector
//! snapshots into a comparable flat table, estimates latency quantiles
//! from cumulative histogram buckets, derives time-series features, and
//! reports per-experiment impact by comparing a baseline window against an
//! event window and an optional recovery window.
//!
//! ## Overview
//!
//! The engine is a deterministic batch transform over already-collected
//! snapshot files. It performs no polling, no scheduling and no rendering;
//! the live testbed services, the snapshot collector and all visualization
//! live elsewhere and only meet this crate through the JSON-Lines wire
//! format and the in-memory output tables.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fieldscope::{process_dataset, DatasetSpec, EngineConfig};
//!
//! let spec = DatasetSpec::new(
//!     "resource_exhaustion",
//!     "datasets/baseline_20250311.jsonl",
//!     "datasets/resource_exhaustion_20250311.jsonl",
//! )
//! .with_recovery("datasets/recovery_20250311.jsonl");
//!
//! let report = process_dataset(&spec, &EngineConfig::default()).unwrap();
//!
//! for impact in &report.impacts {
//!     println!(
//!         "{}: cpu {:+.1}%, latency {:+.1}%",
//!         impact.label, impact.cpu_increase_percent, impact.latency_increase_percent
//!     );
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  FieldScope pipeline (one instance per experiment label)     │
//! │                                                              │
//! │  collector .jsonl files                                      │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  ┌──────────┐   ┌───────────┐   ┌────────────────────────┐   │
//! │  │  Loader  │ → │ Flattener │ → │ Derived Metrics        │   │
//! │  └──────────┘   │ + quantile│   │ (deviations, intervals,│   │
//! │                 │ estimator │   │  rates, z-scores)      │   │
//! │                 └───────────┘   └───────────┬────────────┘   │
//! │                                             ▼                │
//! │                    ┌──────────────┐   ┌────────────┐         │
//! │                    │    Phase     │ → │   Impact   │         │
//! │                    │  Aggregator  │   │  Analyzer  │         │
//! │                    └──────────────┘   └────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage is a pure function over immutable input producing a new
//! table, so batches of experiments fan out across worker threads with no
//! locking (see [`process_batch`]).
//!
//! ## Tolerance by contract
//!
//! The upstream feed is tolerant by design: unreadable values coerce to
//! `0.0`, malformed lines are skipped with a warning, and undefined
//! arithmetic (zero or NaN baselines) propagates NaN. The worst outcome of
//! bad input is an empty or partially-populated table, never a crash.

mod config;
mod derive;
mod error;
mod flatten;
mod histogram;
mod impact;
mod loader;
mod pipeline;
mod record;
mod snapshot;
mod summary;

// Public API
pub use config::EngineConfig;
pub use derive::compute_derived;
pub use error::{EngineError, Result};
pub use flatten::{flatten_snapshot, FlattenedSnapshot};
pub use histogram::{EstimationMethod, HistogramBuckets, LatencyEstimate};
pub use impact::{analyze_impact, percent_change, recovery_ratio, ImpactRecord};
pub use loader::load_snapshots;
pub use pipeline::{
    canonical_phase, process_batch, process_dataset, DatasetReport, DatasetSpec, PHASE_BASELINE,
    PHASE_EVENT, PHASE_RECOVERY,
};
pub use record::{DerivedTable, FlatRecord};
pub use snapshot::{DataKind, MetricEntry, RawSnapshot};
pub use summary::{summarize_phases, PhaseSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
