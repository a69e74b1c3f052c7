//! Rows from feeds that ship a cumulative adjustment factor instead of split events.

use serde::{Deserialize, Serialize};

use super::bar::{AdjustedPrices, Bar};

/// A bar carrying the vendor's cumulative share-adjustment factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorBar {
    #[serde(flatten)]
    pub bar: Bar,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
    /// Missing means "no adjustment" and is treated as 1.0.
    #[serde(default)]
    pub cum_factor: Option<f64>,
}

/// Output of the cumulative-factor adjuster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorAdjustedBar {
    #[serde(flatten)]
    pub bar: Bar,
    /// Factor actually applied (1.0 when the input was missing).
    pub factor: f64,
    #[serde(flatten)]
    pub prices: AdjustedPrices,
    pub adj_shares_outstanding: Option<f64>,
}
