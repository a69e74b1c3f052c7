//! Precondition errors for the backward join.

use chrono::NaiveDate;
use thiserror::Error;

/// Raised instead of silently mis-joining out-of-order input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error(
        "bars not sorted by (ticker, date) at row {position}: \
         ({prev_ticker}, {prev_date}) precedes ({ticker}, {date})"
    )]
    UnsortedBars {
        position: usize,
        prev_ticker: String,
        prev_date: NaiveDate,
        ticker: String,
        date: NaiveDate,
    },

    #[error("ticker index not sorted by (historical_ticker, effective_date) at entry {position}")]
    UnsortedIndex { position: usize },
}
