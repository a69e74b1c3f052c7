//! Data-quality diagnostics surfaced alongside reconciliation results.
//!
//! Ticker reuse is expected and resolved by the backward join. What the join
//! cannot settle on principle is two owners claiming the same ticker from the
//! same date: the last ingested wins, and the rows affected are counted here.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::Bar;
use crate::index::TickerIndex;

/// Maximum number of example tickers kept in a report.
const MAX_EXAMPLES: usize = 10;

/// Ambiguity counts for one resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReuseDiagnostics {
    /// Historical tickers claimed by more than one owner.
    pub reused_tickers: usize,
    /// `(historical_ticker, effective_date)` keys claimed by more than one distinct owner.
    pub tied_keys: usize,
    /// Bars whose match landed on a tied key.
    pub tied_rows: usize,
    /// A few of the tied tickers, for the log.
    pub tied_examples: Vec<String>,
}

impl ReuseDiagnostics {
    /// Inspect the index and the matches produced by the resolver.
    pub fn collect(index: &TickerIndex, matches: &[Option<usize>]) -> Self {
        let entries = index.entries();
        let mut diagnostics = Self::default();
        let mut tied = vec![false; entries.len()];

        for block in entries.chunk_by(|a, b| a.historical_ticker == b.historical_ticker) {
            let owners: HashSet<&str> = block.iter().map(|e| e.owner.as_str()).collect();
            if owners.len() > 1 {
                diagnostics.reused_tickers += 1;
            }
        }

        let mut start = 0;
        for group in entries.chunk_by(|a, b| {
            a.historical_ticker == b.historical_ticker && a.effective_date == b.effective_date
        }) {
            let owners: HashSet<&str> = group.iter().map(|e| e.owner.as_str()).collect();
            if owners.len() > 1 {
                diagnostics.tied_keys += 1;
                tied[start..start + group.len()].fill(true);
                if diagnostics.tied_examples.len() < MAX_EXAMPLES {
                    diagnostics
                        .tied_examples
                        .push(format!("{}@{}", group[0].historical_ticker, group[0].effective_date));
                }
            }
            start += group.len();
        }

        diagnostics.tied_rows = matches.iter().flatten().filter(|&&i| tied[i]).count();
        diagnostics
    }

    pub fn has_ties(&self) -> bool {
        self.tied_keys > 0
    }

    /// Ties as an anomaly entry, counted in affected rows.
    pub fn as_anomaly(&self) -> Option<AnomalyReport> {
        self.has_ties().then(|| AnomalyReport {
            anomaly_type: AnomalyType::AmbiguousOwner,
            count: self.tied_rows,
            severity: Severity::Warning,
        })
    }

    /// Emit a warning when the run hit genuine ambiguity.
    pub fn log(&self) {
        if self.has_ties() {
            tracing::warn!(
                tied_keys = self.tied_keys,
                tied_rows = self.tied_rows,
                examples = ?self.tied_examples,
                "ambiguous ticker reuse: same ticker claimed by several owners on the same date; \
                 last ingested owner used"
            );
        }
        if self.reused_tickers > 0 {
            tracing::debug!(reused_tickers = self.reused_tickers, "tickers reused across owners");
        }
    }
}

/// Kind of anomaly found in a bar batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyType {
    /// More than one bar for the same (ticker, date).
    DuplicateBar,
    /// A bar with a NaN price.
    VoidBar,
    /// A ticker tied between several owners on the same date.
    AmbiguousOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub anomaly_type: AnomalyType,
    pub count: usize,
    pub severity: Severity,
}

/// Scan sorted bars for duplicates and void rows.
pub fn detect_bar_anomalies(bars: &[Bar]) -> Vec<AnomalyReport> {
    let mut anomalies = Vec::new();

    let duplicates = bars
        .windows(2)
        .filter(|w| w[0].sort_key() == w[1].sort_key())
        .count();
    if duplicates > 0 {
        anomalies.push(AnomalyReport {
            anomaly_type: AnomalyType::DuplicateBar,
            count: duplicates,
            severity: Severity::Warning,
        });
    }

    let void = bars.iter().filter(|b| b.is_void()).count();
    if void > 0 {
        anomalies.push(AnomalyReport {
            anomaly_type: AnomalyType::VoidBar,
            count: void,
            severity: Severity::Info,
        });
    }

    anomalies
}
