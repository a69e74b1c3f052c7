//! Bar: one vendor row per (security, trading day), plus its reconciled form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::index::IndexEntry;

/// Raw daily OHLCV bar as reported by a vendor.
///
/// `ticker` is the symbol the vendor used on `date`, which is not necessarily
/// the symbol the company trades under today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<u64>,
}

impl Bar {
    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Sort key required by the backward join: raw ticker, then date.
    pub fn sort_key(&self) -> (&str, NaiveDate) {
        (self.ticker.as_str(), self.date)
    }
}

/// Price and volume columns after corporate-action adjustment.
///
/// Volume is fractional once adjusted: a 1-for-15 reverse split turns
/// 1000 shares into 66.67.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedPrices {
    pub adj_open: f64,
    pub adj_high: f64,
    pub adj_low: f64,
    pub adj_close: f64,
    pub adj_volume: f64,
}

impl AdjustedPrices {
    /// The raw bar values, untouched.
    pub fn unadjusted(bar: &Bar) -> Self {
        Self::scaled(bar, 1.0, 1.0)
    }

    /// Prices multiplied by `price_factor`, volume by `volume_factor`.
    pub fn scaled(bar: &Bar, price_factor: f64, volume_factor: f64) -> Self {
        Self {
            adj_open: bar.open * price_factor,
            adj_high: bar.high * price_factor,
            adj_low: bar.low * price_factor,
            adj_close: bar.close * price_factor,
            adj_volume: bar.volume as f64 * volume_factor,
        }
    }
}

/// A bar with its point-in-time owner and adjusted columns appended.
///
/// The raw bar is kept as-is for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub adjusted_ticker: String,
    #[serde(flatten)]
    pub prices: AdjustedPrices,
}

impl ResolvedBar {
    /// Build from a backward-join match. No match falls back to the raw ticker.
    pub fn from_match(bar: &Bar, entry: Option<&IndexEntry>) -> Self {
        let adjusted_ticker = match entry {
            Some(entry) => entry.owner.clone(),
            None => bar.ticker.clone(),
        };
        Self {
            bar: bar.clone(),
            adjusted_ticker,
            prices: AdjustedPrices::unadjusted(bar),
        }
    }

    /// True when the resolver mapped this row to a different ticker.
    pub fn is_remapped(&self) -> bool {
        self.adjusted_ticker != self.bar.ticker
    }
}
