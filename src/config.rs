// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Engine configuration.
//!
//! Defaults match the conventions of the testbed's snapshot collector;
//! every value is read-only for the lifetime of a run.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Tunables for the analysis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Target quantile for latency histogram estimation.
    pub latency_quantile: f64,

    /// Window length (in samples) for rolling mean/std anomaly scoring and
    /// interval stability.
    pub rolling_window: usize,

    /// Minimum number of table rows before rolling anomaly scores are
    /// computed at all.
    pub min_rows_for_rolling: usize,

    /// Reporting gaps at or above this many seconds are treated as
    /// sensor-offline artifacts, not genuine intervals, and excluded from
    /// interval averages.
    pub offline_gap_secs: f64,

    /// Minimum populated samples in a rolling window before an interval
    /// stability value is emitted.
    pub stability_min_periods: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            latency_quantile: 0.95,
            rolling_window: 5,
            min_rows_for_rolling: 5,
            offline_gap_secs: 30.0,
            stability_min_periods: 2,
        }
    }
}

impl EngineConfig {
    /// Check the configuration for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.latency_quantile > 0.0 && self.latency_quantile < 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "latency_quantile must be in (0, 1), got {}",
                self.latency_quantile
            )));
        }
        if self.rolling_window < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "rolling_window must be at least 2, got {}",
                self.rolling_window
            )));
        }
        if self.stability_min_periods < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "stability_min_periods must be at least 2, got {}",
                self.stability_min_periods
            )));
        }
        if !(self.offline_gap_secs > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "offline_gap_secs must be positive, got {}",
                self.offline_gap_secs
            )));
        }
        Ok(())
    }
}
