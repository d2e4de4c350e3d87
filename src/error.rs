// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for FieldScope

use thiserror::Error;

/// Main error type for engine operations.
///
/// Data-level problems (malformed lines, unreadable files, missing columns)
/// never surface here; they are logged and skipped so one corrupt input
/// cannot block a batch run. These variants cover caller mistakes only.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset label is empty
    #[error("Dataset label must not be empty")]
    EmptyLabel,
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
