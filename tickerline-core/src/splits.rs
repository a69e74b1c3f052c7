//! Split adjustment.
//!
//! Each split scales every earlier bar of its ticker: prices by
//! `split_from / split_to`, volume by the reciprocal. Bars dated on or after
//! the split are untouched by it. Splits compose multiplicatively, so the
//! order in which they are supplied does not matter.
//!
//! Rather than masking the whole table once per split, splits are grouped per
//! ticker and turned into suffix products over their dates; each bar then
//! needs one binary search.

use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::{AdjustedPrices, Bar, ResolvedBar, SplitEvent};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    #[error(
        "malformed split for {ticker} on {date}: split_from={split_from}, split_to={split_to} \
         (both must be finite and > 0)"
    )]
    Malformed {
        ticker: String,
        date: NaiveDate,
        split_from: f64,
        split_to: f64,
    },
}

/// Splits for one ticker, sorted by date, with cumulative factors.
#[derive(Debug, Clone)]
struct TickerSplits {
    dates: Vec<NaiveDate>,
    /// `price_suffix[i]` = product of price factors of splits `i..`.
    /// One longer than `dates`; the last element is 1.0.
    price_suffix: Vec<f64>,
    volume_suffix: Vec<f64>,
}

impl TickerSplits {
    fn new(mut splits: Vec<&SplitEvent>) -> Self {
        splits.sort_by_key(|s| s.date);
        let n = splits.len();
        let mut price_suffix = vec![1.0; n + 1];
        let mut volume_suffix = vec![1.0; n + 1];
        for i in (0..n).rev() {
            price_suffix[i] = price_suffix[i + 1] * splits[i].price_factor();
            volume_suffix[i] = volume_suffix[i + 1] * splits[i].volume_factor();
        }
        Self {
            dates: splits.iter().map(|s| s.date).collect(),
            price_suffix,
            volume_suffix,
        }
    }

    /// Factors from all splits strictly after `date`, or `None` if there are none.
    fn factors_after(&self, date: NaiveDate) -> Option<(f64, f64)> {
        let first_later = self.dates.partition_point(|d| *d <= date);
        (first_later < self.dates.len())
            .then(|| (self.price_suffix[first_later], self.volume_suffix[first_later]))
    }
}

/// Validated splits, ready to apply to any number of bars.
///
/// Building the table is the only fallible step; applying it is pure.
#[derive(Debug, Clone, Default)]
pub struct SplitTable {
    by_ticker: HashMap<String, TickerSplits>,
    split_count: usize,
}

impl SplitTable {
    /// Validate every split and group them by ticker.
    ///
    /// One malformed record rejects the whole batch.
    pub fn new(splits: &[SplitEvent]) -> Result<Self, SplitError> {
        for split in splits {
            split.validate()?;
        }

        let mut grouped: HashMap<&str, Vec<&SplitEvent>> = HashMap::new();
        for split in splits {
            grouped.entry(split.ticker.as_str()).or_default().push(split);
        }

        let by_ticker = grouped
            .into_iter()
            .map(|(ticker, events)| (ticker.to_string(), TickerSplits::new(events)))
            .collect();

        Ok(Self {
            by_ticker,
            split_count: splits.len(),
        })
    }

    pub fn split_count(&self) -> usize {
        self.split_count
    }

    pub fn ticker_count(&self) -> usize {
        self.by_ticker.len()
    }

    /// Cumulative (price, volume) factors for a bar of `ticker` on `date`.
    ///
    /// `None` when no split of that ticker falls after `date`.
    pub fn factors(&self, ticker: &str, date: NaiveDate) -> Option<(f64, f64)> {
        self.by_ticker.get(ticker)?.factors_after(date)
    }

    /// Adjusted columns for one bar.
    pub fn adjust_bar(&self, bar: &Bar) -> AdjustedPrices {
        match self.factors(&bar.ticker, bar.date) {
            Some((price, volume)) => AdjustedPrices::scaled(bar, price, volume),
            None => AdjustedPrices::unadjusted(bar),
        }
    }

    /// Adjusted columns for every bar, in input order.
    pub fn apply(&self, bars: &[Bar]) -> Vec<AdjustedPrices> {
        bars.iter().map(|bar| self.adjust_bar(bar)).collect()
    }
}

/// Adjust raw bars for all known splits. Bars need not be sorted.
pub fn adjust_splits(bars: &[Bar], splits: &[SplitEvent]) -> Result<Vec<AdjustedPrices>, SplitError> {
    Ok(SplitTable::new(splits)?.apply(bars))
}

/// Recompute the adjusted columns of resolver output.
///
/// Splits are matched on the raw vendor ticker of each row, which is the
/// symbol the split was announced under.
pub fn adjust_resolved(
    resolved: Vec<ResolvedBar>,
    splits: &[SplitEvent],
) -> Result<Vec<ResolvedBar>, SplitError> {
    let table = SplitTable::new(splits)?;
    Ok(resolved
        .into_iter()
        .map(|mut row| {
            row.prices = table.adjust_bar(&row.bar);
            row
        })
        .collect())
}

/// Shares after all splits of `ticker` later than `date`, per share on `date`.
///
/// Computed directly from the events, independently of [`SplitTable`]:
/// `adj_close * ratio` recovers the raw close.
pub fn cumulative_split_ratio(splits: &[SplitEvent], ticker: &str, date: NaiveDate) -> f64 {
    splits
        .iter()
        .filter(|s| s.ticker == ticker && date < s.date)
        .map(|s| s.split_to / s.split_from)
        .product()
}
