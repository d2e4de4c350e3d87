// FieldScope - IoT security testbed impact analysis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Snapshot loading from line-delimited JSON collector files.

use crate::snapshot::RawSnapshot;
use log::{debug, error, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Load every parsable snapshot line from a collector file.
///
/// Malformed lines are skipped with a warning and an unreadable path yields
/// an empty sequence with a logged error. One corrupt file must not block
/// analysis of sibling files in a batch run, so this never hard-fails.
pub fn load_snapshots(path: &Path) -> Vec<RawSnapshot> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            error!("Error loading file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut snapshots = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Error reading {} at line {}: {}", path.display(), index + 1, e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(value) => match RawSnapshot::from_value(&value) {
                Some(snapshot) => snapshots.push(snapshot),
                None => debug!(
                    "Skipping line {} in {}: no recognizable data_type",
                    index + 1,
                    path.display()
                ),
            },
            Err(e) => warn!(
                "Error parsing line {} in {}: {}",
                index + 1,
                path.display(),
                e
            ),
        }
    }

    snapshots
}
