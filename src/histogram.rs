// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Latency quantile estimation from cumulative histogram buckets.
//!
//! The collector exports request latency as Prometheus-style cumulative
//! buckets. A genuine measurement only exists when the target quantile can
//! be interpolated between two finite bucket bounds; every other path is a
//! degraded estimate and is flagged as such so downstream consumers never
//! blend the two as equally trustworthy.

use serde::{Deserialize, Serialize};

/// How a latency estimate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    /// Linear interpolation between two finite bucket bounds.
    Interpolation,
    /// Quantile above all finite buckets; the highest finite bound is used.
    HighestBucket,
    /// A single finite bucket; its bound is used.
    SingleBucket,
    /// Only an +Inf bucket, which carries no usable bound.
    OnlyInfBucket,
    /// Buckets present but no observations counted.
    ZeroCounts,
    /// Too few finite buckets for any estimate.
    InsufficientBuckets,
    /// No bucket data at all.
    NoData,
}

impl EstimationMethod {
    /// Wire name, matching the collector's reporting convention.
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimationMethod::Interpolation => "interpolation",
            EstimationMethod::HighestBucket => "highest_bucket",
            EstimationMethod::SingleBucket => "single_bucket",
            EstimationMethod::OnlyInfBucket => "only_inf_bucket",
            EstimationMethod::ZeroCounts => "zero_counts",
            EstimationMethod::InsufficientBuckets => "insufficient_buckets",
            EstimationMethod::NoData => "no_data",
        }
    }
}

/// A quantile estimate derived from one bucket set.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LatencyEstimate {
    /// Estimated latency in milliseconds. NaN when the buckets carry no
    /// usable signal.
    pub latency_ms: f64,
    /// False only for genuine bucket interpolation.
    pub is_estimated: bool,
    /// The path that produced this value.
    pub method: EstimationMethod,
}

impl LatencyEstimate {
    fn fallback(latency_ms: f64, method: EstimationMethod) -> Self {
        Self {
            latency_ms,
            is_estimated: true,
            method,
        }
    }
}

/// Cumulative histogram buckets for one (endpoint, sensor) pair.
///
/// Buckets are kept sorted by ascending upper bound; the +Inf bucket sorts
/// last. Bounds are in seconds, estimates in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct HistogramBuckets {
    buckets: Vec<(f64, f64)>,
}

impl HistogramBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the cumulative count for an upper bound.
    pub fn insert(&mut self, upper_bound: f64, count: f64) {
        match self
            .buckets
            .binary_search_by(|(bound, _)| bound.total_cmp(&upper_bound))
        {
            Ok(index) => self.buckets[index].1 = count,
            Err(index) => self.buckets.insert(index, (upper_bound, count)),
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Estimate the target quantile from the bucket set.
    ///
    /// The +Inf bucket's count is the observation total; when it is absent
    /// the last finite bucket's count stands in. The estimate is marked
    /// reliable (`is_estimated == false`) only when the target count falls
    /// between two finite bucket counts and can be interpolated.
    pub fn estimate(&self, quantile: f64) -> LatencyEstimate {
        if self.buckets.is_empty() {
            return LatencyEstimate::fallback(f64::NAN, EstimationMethod::NoData);
        }

        let finite: Vec<(f64, f64)> = self
            .buckets
            .iter()
            .copied()
            .filter(|(bound, _)| bound.is_finite())
            .collect();
        let inf_count = self
            .buckets
            .iter()
            .find(|(bound, _)| bound.is_infinite())
            .map(|(_, count)| *count);

        if finite.len() < 2 {
            return match finite.first() {
                Some(&(bound, _)) => {
                    // A lone bound is likely a large overestimate, hence the flag.
                    LatencyEstimate::fallback(bound * 1000.0, EstimationMethod::SingleBucket)
                }
                None => LatencyEstimate::fallback(f64::NAN, EstimationMethod::OnlyInfBucket),
            };
        }

        let total = inf_count.unwrap_or(finite[finite.len() - 1].1);
        if !(total > 0.0) {
            return LatencyEstimate::fallback(f64::NAN, EstimationMethod::ZeroCounts);
        }

        let target = total * quantile;
        for pair in finite.windows(2) {
            let (lower_bound, lower_count) = pair[0];
            let (upper_bound, upper_count) = pair[1];
            if lower_count <= target && target <= upper_count {
                let span = upper_count - lower_count;
                let fraction = if span > 0.0 {
                    (target - lower_count) / span
                } else {
                    0.0
                };
                let seconds = lower_bound + fraction * (upper_bound - lower_bound);
                return LatencyEstimate {
                    latency_ms: seconds * 1000.0,
                    is_estimated: false,
                    method: EstimationMethod::Interpolation,
                };
            }
        }

        let (highest_bound, _) = finite[finite.len() - 1];
        LatencyEstimate::fallback(highest_bound * 1000.0, EstimationMethod::HighestBucket)
    }
}

/// Parse a Prometheus `le` label into an upper bound in seconds.
pub(crate) fn parse_le(le: &str) -> Option<f64> {
    let trimmed = le.trim();
    if trimmed.eq_ignore_ascii_case("inf") || trimmed.eq_ignore_ascii_case("+inf") {
        return Some(f64::INFINITY);
    }
    trimmed.parse::<f64>().ok().filter(|bound| !bound.is_nan())
}
