//! Corporate-action event records: ticker changes and splits.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::splits::SplitError;

/// One historical ticker string and the date it took effect for an owner.
///
/// Vendors report these as timestamps; only the calendar date matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerChange {
    pub ticker: String,
    pub effective: NaiveDateTime,
}

impl TickerChange {
    pub fn new(ticker: impl Into<String>, effective: NaiveDateTime) -> Self {
        Self {
            ticker: ticker.into(),
            effective,
        }
    }

    /// Change effective at midnight on `date`.
    pub fn on(ticker: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(ticker, date.and_time(NaiveTime::MIN))
    }

    /// Effective date with time-of-day discarded.
    pub fn effective_date(&self) -> NaiveDate {
        self.effective.date()
    }
}

/// Every ticker a present-day company has traded under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerHistory {
    pub owner: String,
    pub changes: Vec<TickerChange>,
}

/// Owner ticker → list of (historical ticker, effective date), in ingestion order.
///
/// Ingestion order is kept because it decides ties in the index: of two
/// owners claiming the same ticker on the same date, the later one wins.
/// Serialized as the plain list of histories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TickerHistory>", into = "Vec<TickerHistory>")]
pub struct ReverseMapping {
    histories: Vec<TickerHistory>,
    /// Owner → position in `histories`.
    positions: HashMap<String, usize>,
}

impl ReverseMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the history for `owner`.
    ///
    /// An owner that is already present has its changes replaced in place and
    /// keeps its original ingestion position.
    pub fn insert(&mut self, owner: impl Into<String>, changes: Vec<TickerChange>) {
        let owner = owner.into();
        match self.positions.get(&owner) {
            Some(&i) => self.histories[i].changes = changes,
            None => {
                self.positions.insert(owner.clone(), self.histories.len());
                self.histories.push(TickerHistory { owner, changes });
            }
        }
    }

    pub fn histories(&self) -> &[TickerHistory] {
        &self.histories
    }

    pub fn get(&self, owner: &str) -> Option<&TickerHistory> {
        self.positions.get(owner).map(|&i| &self.histories[i])
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Total number of (historical ticker, date) pairs across all owners.
    pub fn change_count(&self) -> usize {
        self.histories.iter().map(|h| h.changes.len()).sum()
    }

    /// Build the reverse mapping from per-ticker vendor event feeds.
    ///
    /// A ticker whose feed holds a single event has never been renamed; that
    /// event is dated `today` so the ticker maps to itself over its whole
    /// observed history. Events without a ticker-change payload, or with an
    /// empty ticker, are skipped.
    pub fn from_vendor_events(feeds: &[VendorTickerEvents], today: NaiveDate) -> Self {
        let mut mapping = Self::new();
        for feed in feeds {
            let single = feed.events.len() <= 1;
            let changes = feed
                .events
                .iter()
                .filter_map(|event| {
                    let ticker = event.ticker_change.as_ref()?.ticker.clone();
                    if ticker.is_empty() {
                        return None;
                    }
                    let date = if single { today } else { event.date };
                    Some(TickerChange::on(ticker, date))
                })
                .collect();
            mapping.insert(feed.ticker.clone(), changes);
        }
        mapping
    }
}

impl From<Vec<TickerHistory>> for ReverseMapping {
    fn from(histories: Vec<TickerHistory>) -> Self {
        histories.into_iter().collect()
    }
}

impl From<ReverseMapping> for Vec<TickerHistory> {
    fn from(mapping: ReverseMapping) -> Self {
        mapping.histories
    }
}

impl FromIterator<TickerHistory> for ReverseMapping {
    fn from_iter<I: IntoIterator<Item = TickerHistory>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for history in iter {
            mapping.insert(history.owner, history.changes);
        }
        mapping
    }
}

/// Per-ticker event feed as returned by a reference-data vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorTickerEvents {
    /// The ticker that was queried (today's symbol).
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub composite_figi: Option<String>,
    #[serde(default)]
    pub cik: Option<String>,
    #[serde(default)]
    pub events: Vec<VendorEvent>,
}

/// A single event inside a vendor feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorEvent {
    pub date: NaiveDate,
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub ticker_change: Option<TickerChangePayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerChangePayload {
    pub ticker: String,
}

/// One split action for a security.
///
/// `split_from = 1, split_to = 5` is a 5-for-1 forward split;
/// `split_from = 15, split_to = 1` is a 1-for-15 reverse split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitEvent {
    pub ticker: String,
    pub date: NaiveDate,
    pub split_from: f64,
    pub split_to: f64,
}

impl SplitEvent {
    pub fn new(ticker: impl Into<String>, date: NaiveDate, split_from: f64, split_to: f64) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            split_from,
            split_to,
        }
    }

    /// Both sides must be finite and strictly positive.
    pub fn validate(&self) -> Result<(), SplitError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(self.split_from) && valid(self.split_to) {
            Ok(())
        } else {
            Err(SplitError::Malformed {
                ticker: self.ticker.clone(),
                date: self.date,
                split_from: self.split_from,
                split_to: self.split_to,
            })
        }
    }

    /// Multiplier for pre-split prices.
    pub fn price_factor(&self) -> f64 {
        self.split_from / self.split_to
    }

    /// Multiplier for pre-split volume; the reciprocal of `price_factor`.
    pub fn volume_factor(&self) -> f64 {
        self.split_to / self.split_from
    }
}
