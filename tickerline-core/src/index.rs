//! Ticker-history index: the reverse mapping flattened into a join-ready table.
//!
//! Entries are stably sorted by `(historical_ticker, effective_date)`, so
//! entries equal on both keys stay in ingestion order. The resolver relies on
//! that order for its tie-break.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::domain::ReverseMapping;
use crate::error::ReconcileError;

/// One (owner, historical ticker, effective date) row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub owner: String,
    pub historical_ticker: String,
    pub effective_date: NaiveDate,
}

impl IndexEntry {
    fn key(&self) -> (&str, NaiveDate) {
        (self.historical_ticker.as_str(), self.effective_date)
    }
}

/// Sorted, flat ticker-history table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerIndex {
    entries: Vec<IndexEntry>,
}

impl TickerIndex {
    /// Accept a table that is already sorted; reject it otherwise.
    pub fn from_sorted_entries(entries: Vec<IndexEntry>) -> Result<Self, ReconcileError> {
        if let Some(position) = entries
            .windows(2)
            .position(|w| w[0].key() > w[1].key())
        {
            return Err(ReconcileError::UnsortedIndex {
                position: position + 1,
            });
        }
        Ok(Self { entries })
    }

    /// Sort arbitrary entries (stable) into an index.
    pub fn from_entries(mut entries: Vec<IndexEntry>) -> Self {
        entries.sort_by(|a, b| a.key().cmp(&b.key()));
        Self { entries }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Positions of all entries whose historical ticker is `ticker`.
    pub fn block(&self, ticker: &str) -> Range<usize> {
        let start = self
            .entries
            .partition_point(|e| e.historical_ticker.as_str() < ticker);
        let len = self.entries[start..].partition_point(|e| e.historical_ticker == ticker);
        start..start + len
    }

    /// Entry that owns `ticker` as of `date`, if any.
    ///
    /// Point lookup; batch resolution goes through [`crate::resolve`].
    pub fn lookup(&self, ticker: &str, date: NaiveDate) -> Option<&IndexEntry> {
        let block = &self.entries[self.block(ticker)];
        let n = block.partition_point(|e| e.effective_date <= date);
        n.checked_sub(1).map(|i| &block[i])
    }
}

/// Flatten a reverse mapping into a sorted index.
///
/// Dates are normalized to calendar dates. With a `cutoff`, pairs dated
/// strictly before it are dropped: the bars being resolved start at the
/// cutoff, so earlier renames cannot affect them.
pub fn build_index(mapping: &ReverseMapping, cutoff: Option<NaiveDate>) -> TickerIndex {
    let mut entries = Vec::with_capacity(mapping.change_count());
    let mut dropped = 0usize;

    for history in mapping.histories() {
        for change in &history.changes {
            let effective_date = change.effective_date();
            if cutoff.is_some_and(|c| effective_date < c) {
                dropped += 1;
                continue;
            }
            entries.push(IndexEntry {
                owner: history.owner.clone(),
                historical_ticker: change.ticker.clone(),
                effective_date,
            });
        }
    }

    tracing::debug!(
        owners = mapping.len(),
        entries = entries.len(),
        dropped,
        "built ticker index"
    );

    TickerIndex::from_entries(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TickerChange;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_mapping() -> ReverseMapping {
        let mut mapping = ReverseMapping::new();
        mapping.insert(
            "DRD",
            vec![
                TickerChange::on("DRD", d("2012-01-03")),
                TickerChange::on("DROOY", d("2007-08-20")),
                TickerChange::on("DROOD", d("2007-07-23")),
            ],
        );
        mapping.insert(
            "PWRD",
            vec![
                TickerChange::on("PWRD", d("2025-02-03")),
                TickerChange::on("NETZ", d("2022-02-03")),
            ],
        );
        mapping
    }

    #[test]
    fn flattens_one_row_per_pair() {
        let index = build_index(&sample_mapping(), None);
        assert_eq!(index.len(), 5);
        let tickers: Vec<&str> = index
            .entries()
            .iter()
            .map(|e| e.historical_ticker.as_str())
            .collect();
        assert_eq!(tickers, ["DRD", "DROOD", "DROOY", "NETZ", "PWRD"]);
    }

    #[test]
    fn cutoff_drops_strictly_earlier_pairs() {
        let index = build_index(&sample_mapping(), Some(d("2007-08-20")));
        assert_eq!(index.len(), 4);
        assert!(index.entries().iter().all(|e| e.historical_ticker != "DROOD"));
        // On the cutoff itself the pair is kept.
        assert!(index.entries().iter().any(|e| e.historical_ticker == "DROOY"));
    }

    #[test]
    fn time_of_day_is_discarded() {
        let mut mapping = ReverseMapping::new();
        mapping.insert(
            "META",
            vec![TickerChange::new(
                "FB",
                d("2012-05-18").and_hms_opt(23, 59, 59).unwrap(),
            )],
        );
        let index = build_index(&mapping, Some(d("2012-05-18")));
        assert_eq!(index.entries()[0].effective_date, d("2012-05-18"));
    }

    #[test]
    fn equal_keys_keep_ingestion_order() {
        let mut mapping = ReverseMapping::new();
        mapping.insert("FIRST", vec![TickerChange::on("ABC", d("2015-01-01"))]);
        mapping.insert("SECOND", vec![TickerChange::on("ABC", d("2015-01-01"))]);
        let index = build_index(&mapping, None);
        assert_eq!(index.entries()[0].owner, "FIRST");
        assert_eq!(index.entries()[1].owner, "SECOND");
    }

    #[test]
    fn block_and_lookup() {
        let index = build_index(&sample_mapping(), None);
        assert_eq!(index.block("DROOY"), 2..3);
        assert_eq!(index.block("ZZZ").len(), 0);
        assert_eq!(index.lookup("NETZ", d("2023-01-01")).unwrap().owner, "PWRD");
        assert!(index.lookup("NETZ", d("2021-01-01")).is_none());
    }

    #[test]
    fn from_sorted_entries_rejects_unsorted() {
        let entries = vec![
            IndexEntry {
                owner: "B".into(),
                historical_ticker: "B".into(),
                effective_date: d("2020-01-01"),
            },
            IndexEntry {
                owner: "A".into(),
                historical_ticker: "A".into(),
                effective_date: d("2020-01-01"),
            },
        ];
        let err = TickerIndex::from_sorted_entries(entries.clone()).unwrap_err();
        assert_eq!(err, ReconcileError::UnsortedIndex { position: 1 });

        let sorted = TickerIndex::from_entries(entries);
        assert!(TickerIndex::from_sorted_entries(sorted.entries().to_vec()).is_ok());
    }
}
