// FieldScope Testdata - Synthetic collector dataset generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # FieldScope Testdata
//!
//! Synthetic collector datasets for the FieldScope analysis engine.
//!
//! The generator emits JSON-Lines files in the snapshot collector's wire
//! format: a metadata line followed by metrics snapshots carrying
//! temperatures from three vantage points (sensor, gateway, data server),
//! CPU and memory usage, fault codes, cumulative latency histogram
//! buckets, failed-request counters and network byte counters.
//!
//! Each [`ScenarioKind`] shifts the event-phase telemetry the way the live
//! testbed does: CPU and memory inflation under firmware resource
//! exhaustion, latency-bucket shift and request failures under DDoS, an
//! egress surge under command injection, gateway divergence under BOLA,
//! and stuck readings under a sensor fault.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fieldscope_testdata::{write_dataset, GeneratorConfig, ScenarioKind};
//!
//! let config = GeneratorConfig::new()
//!     .with_snapshots_per_phase(60)
//!     .with_seed(42);
//!
//! let paths = write_dataset("datasets", ScenarioKind::Ddos, &config).unwrap();
//! println!("baseline file: {}", paths.baseline.display());
//! ```
//!
//! Output is deterministic for a fixed seed.

mod generator;
mod scenario;

// Re-exports for convenience
pub use generator::{
    generate_phase, write_dataset, write_phase, DatasetPaths, GeneratorConfig, Phase,
    TestdataError,
};
pub use scenario::{ScenarioKind, ScenarioProfile};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
