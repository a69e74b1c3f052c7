//! Adjustment for feeds that already carry a cumulative share factor per row.
//!
//! No join is needed: prices are divided by the factor, volume and shares
//! outstanding multiplied by it. A missing factor means 1.0.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{AdjustedPrices, FactorAdjustedBar, FactorBar};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FactorError {
    #[error("malformed cumulative factor {factor} for {ticker} on {date} (must be finite and > 0)")]
    Malformed {
        ticker: String,
        date: NaiveDate,
        factor: f64,
    },
}

/// Factor to apply to a row: the vendor value, or 1.0 when absent.
pub fn effective_factor(row: &FactorBar) -> Result<f64, FactorError> {
    let factor = row.cum_factor.unwrap_or(1.0);
    if factor.is_finite() && factor > 0.0 {
        Ok(factor)
    } else {
        Err(FactorError::Malformed {
            ticker: row.bar.ticker.clone(),
            date: row.bar.date,
            factor,
        })
    }
}

/// Adjust every row by its own cumulative factor.
pub fn adjust_with_cumulative_factor(
    rows: &[FactorBar],
) -> Result<Vec<FactorAdjustedBar>, FactorError> {
    rows.iter()
        .map(|row| {
            let factor = effective_factor(row)?;
            Ok(FactorAdjustedBar {
                bar: row.bar.clone(),
                factor,
                prices: AdjustedPrices::scaled(&row.bar, 1.0 / factor, factor),
                adj_shares_outstanding: row.shares_outstanding.map(|s| s * factor),
            })
        })
        .collect()
}
