//! Tickerline Core: point-in-time symbol history for daily bars.
//!
//! This crate turns raw vendor bars into a continuous, survivorship-free
//! series:
//! - Domain records (bars, ticker-change and split events, resolved bars)
//! - Ticker-history index built from a reverse mapping, with optional cutoff
//! - Backward (as-of) resolver assigning each row its owner on that date
//! - Split adjuster and cumulative-factor adjuster producing `adj_*` columns
//! - Reuse/tie diagnostics and bar anomaly checks
//! - A polars frame adapter with the same column contract
//!
//! Everything here is a pure function over borrowed inputs.

pub mod cumfactor;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod frame;
pub mod index;
pub mod resolve;
pub mod splits;

pub use cumfactor::{adjust_with_cumulative_factor, FactorError};
pub use diagnostics::{detect_bar_anomalies, AnomalyReport, AnomalyType, ReuseDiagnostics};
pub use domain::{
    AdjustedPrices, Bar, FactorAdjustedBar, FactorBar, ResolvedBar, ReverseMapping, SplitEvent,
    TickerChange, TickerHistory, VendorTickerEvents,
};
pub use error::ReconcileError;
pub use index::{build_index, IndexEntry, TickerIndex};
pub use resolve::{
    backward_match, check_sorted, resolve, resolve_from_matches, resolve_with_matches, sort_bars,
};
pub use splits::{adjust_resolved, adjust_splits, cumulative_split_ratio, SplitError, SplitTable};
