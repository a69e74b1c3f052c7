//! Point-in-time ticker resolution.
//!
//! For each bar `(T, D)` the resolver finds the index entry with
//! `historical_ticker == T` and the greatest `effective_date <= D`, and takes
//! its owner as `adjusted_ticker`. No match falls back to `T`.
//!
//! This is a backward (as-of) join done as one sorted merge: bars are walked
//! in `(ticker, date)` order, each ticker's index block is located once, and a
//! cursor only ever moves forward through it.

use crate::domain::{Bar, ResolvedBar};
use crate::error::ReconcileError;
use crate::index::{IndexEntry, TickerIndex};

/// Stable sort by `(ticker, date)`, as the join requires.
pub fn sort_bars(bars: &mut [Bar]) {
    bars.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// Check that bars are sorted by `(ticker, date)` ascending.
pub fn check_sorted(bars: &[Bar]) -> Result<(), ReconcileError> {
    match bars
        .windows(2)
        .position(|w| w[0].sort_key() > w[1].sort_key())
    {
        None => Ok(()),
        Some(i) => {
            let (prev, next) = (&bars[i], &bars[i + 1]);
            Err(ReconcileError::UnsortedBars {
                position: i + 1,
                prev_ticker: prev.ticker.clone(),
                prev_date: prev.date,
                ticker: next.ticker.clone(),
                date: next.date,
            })
        }
    }
}

/// Backward join: for each bar, the position in `index.entries()` of its match.
///
/// Among entries with equal `(historical_ticker, effective_date)` the last
/// one in the index (the most recently ingested) wins.
pub fn backward_match(
    bars: &[Bar],
    index: &TickerIndex,
) -> Result<Vec<Option<usize>>, ReconcileError> {
    check_sorted(bars)?;

    let entries = index.entries();
    let mut matches = Vec::with_capacity(bars.len());

    for group in bars.chunk_by(|a, b| a.ticker == b.ticker) {
        let block = index.block(&group[0].ticker);
        let mut cursor = block.start;
        let mut current = None;

        for bar in group {
            while cursor < block.end && entries[cursor].effective_date <= bar.date {
                current = Some(cursor);
                cursor += 1;
            }
            matches.push(current);
        }
    }

    Ok(matches)
}

/// Assign `adjusted_ticker` to every bar.
///
/// Output order equals input order. Adjusted price columns start out equal to
/// the raw values; splits are applied separately.
pub fn resolve(bars: &[Bar], index: &TickerIndex) -> Result<Vec<ResolvedBar>, ReconcileError> {
    let matches = backward_match(bars, index)?;
    Ok(resolve_from_matches(bars, index, &matches))
}

/// Like [`resolve`], also returning the index entry each row matched.
pub fn resolve_with_matches<'a>(
    bars: &[Bar],
    index: &'a TickerIndex,
) -> Result<Vec<(ResolvedBar, Option<&'a IndexEntry>)>, ReconcileError> {
    let matches = backward_match(bars, index)?;
    let entries = index.entries();
    Ok(bars
        .iter()
        .zip(matches)
        .map(|(bar, m)| {
            let entry = m.map(|i| &entries[i]);
            (ResolvedBar::from_match(bar, entry), entry)
        })
        .collect())
}

/// Build resolved rows from precomputed matches.
pub fn resolve_from_matches(
    bars: &[Bar],
    index: &TickerIndex,
    matches: &[Option<usize>],
) -> Vec<ResolvedBar> {
    let entries = index.entries();
    bars.iter()
        .zip(matches)
        .map(|(bar, m)| ResolvedBar::from_match(bar, m.map(|i| &entries[i])))
        .collect()
}
