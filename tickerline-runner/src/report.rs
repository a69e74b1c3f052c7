//! Summary of one reconciliation batch.

use serde::{Deserialize, Serialize};
use tickerline_core::{AnomalyReport, ReuseDiagnostics};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub bar_count: usize,
    pub ticker_count: usize,
    /// Rows in the ticker-history index after the cutoff.
    pub index_entries: usize,
    /// Rows whose `adjusted_ticker` differs from the raw ticker.
    pub remapped_rows: usize,
    /// Rows with no index match, kept under their raw ticker.
    pub identity_rows: usize,
    pub split_count: usize,
    /// Rows with at least one later split applied.
    pub adjusted_rows: usize,
    pub reuse: ReuseDiagnostics,
    pub anomalies: Vec<AnomalyReport>,
}

impl ReconcileReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn has_warnings(&self) -> bool {
        self.reuse.has_ties() || !self.anomalies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_without_schema_version_defaults() {
        let json = r#"{
            "bar_count": 3, "ticker_count": 1, "index_entries": 2,
            "remapped_rows": 1, "identity_rows": 1, "split_count": 0,
            "adjusted_rows": 0,
            "reuse": {"reused_tickers": 0, "tied_keys": 0, "tied_rows": 0, "tied_examples": []},
            "anomalies": []
        }"#;
        let report = ReconcileReport::from_json(json).unwrap();
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.remapped_rows, 1);
        assert!(!report.has_warnings());
    }
}
