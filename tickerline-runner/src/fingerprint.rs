//! Content hash of a reconciliation batch.
//!
//! Outputs are regenerated wholesale whenever any input changes. The
//! fingerprint covers the configuration, the sorted bars, the reverse mapping
//! and the splits, so two batches with the same fingerprint produce the same
//! output. Frame runs also fold in the columns carried through untouched.

use std::fmt;

use polars::prelude::{Column, DataFrame, PolarsResult};
use serde::{Deserialize, Serialize};
use tickerline_core::{Bar, ReverseMapping, SplitEvent};

use crate::config::ReconcileConfig;

/// BLAKE3 hex digest over canonical JSON of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchFingerprint(String);

impl BatchFingerprint {
    /// Hash a batch. `bars` should already be in `(ticker, date)` order.
    pub fn compute(
        config: &ReconcileConfig,
        bars: &[Bar],
        mapping: &ReverseMapping,
        splits: &[SplitEvent],
    ) -> Result<Self, serde_json::Error> {
        let mut hasher = blake3::Hasher::new();

        // Each section is tagged and length-prefixed.
        for (tag, json) in [
            ("config", serde_json::to_vec(config)?),
            ("bars", serde_json::to_vec(bars)?),
            ("mapping", serde_json::to_vec(mapping)?),
            ("splits", serde_json::to_vec(splits)?),
        ] {
            hasher.update(tag.as_bytes());
            hasher.update(&(json.len() as u64).to_le_bytes());
            hasher.update(&json);
        }

        Ok(Self(hasher.finalize().to_hex().to_string()))
    }

    /// Extend the fingerprint with every column of `frame` not named in `skip`.
    ///
    /// Columns are hashed in name order, each as its name, dtype and values.
    pub fn with_frame_columns(self, frame: &DataFrame, skip: &[&str]) -> PolarsResult<Self> {
        let mut columns: Vec<&Column> = frame
            .get_columns()
            .iter()
            .filter(|c| !skip.contains(&c.name().as_str()))
            .collect();
        columns.sort_by(|a, b| a.name().as_str().cmp(b.name().as_str()));

        let mut hasher = blake3::Hasher::new();
        hasher.update(self.0.as_bytes());
        for column in columns {
            let mut section = format!("{}\0{:?}\0", column.name(), column.dtype()).into_bytes();
            for i in 0..column.len() {
                section.extend_from_slice(format!("{:?}\n", column.get(i)?).as_bytes());
            }
            hasher.update(b"column");
            hasher.update(&(section.len() as u64).to_le_bytes());
            hasher.update(&section);
        }

        Ok(Self(hasher.finalize().to_hex().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
