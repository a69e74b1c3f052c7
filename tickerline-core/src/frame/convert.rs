//! Conversions between polars frames and typed records.

use chrono::NaiveDate;
use polars::prelude::*;

use super::schema::{BarFrameSchema, FrameError, SplitFrameSchema};
use crate::domain::{Bar, ResolvedBar, SplitEvent};

/// Output column names appended by reconciliation.
pub const ADJUSTED_COLUMNS: [&str; 6] = [
    "adjusted_ticker",
    "adj_open",
    "adj_high",
    "adj_low",
    "adj_close",
    "adj_volume",
];

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn date_from_days(days: i32) -> NaiveDate {
    epoch() + chrono::Duration::days(days as i64)
}

fn days_from_date(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

fn required<T>(value: Option<T>, column: &str, row: usize) -> Result<T, FrameError> {
    value.ok_or_else(|| FrameError::NullValue {
        column: column.to_string(),
        row,
    })
}

/// Sort a bar frame by `(ticker, date)`, keeping the order of equal rows.
pub fn sort_bar_frame(df: &DataFrame) -> Result<DataFrame, FrameError> {
    Ok(df
        .clone()
        .lazy()
        .sort(
            ["ticker", "date"],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, false])
                .with_maintain_order(true),
        )
        .collect()?)
}

/// Read typed bars from a frame, in frame order.
///
/// Extra columns are ignored. A null `ticker`, `date` or `volume` is an error.
/// A null price reads as NaN, which leaves the bar void and reported as a
/// `VoidBar` anomaly by [`crate::detect_bar_anomalies`].
pub fn bars_from_frame(df: &DataFrame) -> Result<Vec<Bar>, FrameError> {
    BarFrameSchema::validate(df)?;

    let date_ca = df.column("date")?.date()?;
    let ticker_ca = df.column("ticker")?.str()?;
    let open_ca = df.column("open")?.f64()?;
    let high_ca = df.column("high")?.f64()?;
    let low_ca = df.column("low")?.f64()?;
    let close_ca = df.column("close")?.f64()?;
    let vol_ca = df.column("volume")?.u64()?;

    let transactions = df
        .column(BarFrameSchema::TRANSACTIONS)
        .ok()
        .map(|c| c.cast(&DataType::UInt64))
        .transpose()?;
    let txn_ca = transactions.as_ref().map(|c| c.u64()).transpose()?;

    let n = df.height();
    let mut bars = Vec::with_capacity(n);

    for i in 0..n {
        bars.push(Bar {
            ticker: required(ticker_ca.get(i), "ticker", i)?.to_string(),
            date: date_from_days(required(date_ca.get(i), "date", i)?),
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            volume: required(vol_ca.get(i), "volume", i)?,
            transactions: txn_ca.and_then(|ca| ca.get(i)),
        });
    }

    Ok(bars)
}

/// Read split events from a frame.
pub fn splits_from_frame(df: &DataFrame) -> Result<Vec<SplitEvent>, FrameError> {
    SplitFrameSchema::validate(df)?;

    let ticker_ca = df.column("ticker")?.str()?;
    let date_ca = df.column("date")?.date()?;
    let from_ca = df.column("split_from")?.f64()?;
    let to_ca = df.column("split_to")?.f64()?;

    (0..df.height())
        .map(|i| {
            Ok(SplitEvent {
                ticker: required(ticker_ca.get(i), "ticker", i)?.to_string(),
                date: date_from_days(required(date_ca.get(i), "date", i)?),
                split_from: required(from_ca.get(i), "split_from", i)?,
                split_to: required(to_ca.get(i), "split_to", i)?,
            })
        })
        .collect()
}

/// Build a frame holding the raw and reconciled columns of `rows`.
pub fn resolved_to_frame(rows: &[ResolvedBar]) -> Result<DataFrame, FrameError> {
    let dates: Vec<i32> = rows.iter().map(|r| days_from_date(r.bar.date)).collect();
    let tickers: Vec<&str> = rows.iter().map(|r| r.bar.ticker.as_str()).collect();
    let opens: Vec<f64> = rows.iter().map(|r| r.bar.open).collect();
    let highs: Vec<f64> = rows.iter().map(|r| r.bar.high).collect();
    let lows: Vec<f64> = rows.iter().map(|r| r.bar.low).collect();
    let closes: Vec<f64> = rows.iter().map(|r| r.bar.close).collect();
    let volumes: Vec<u64> = rows.iter().map(|r| r.bar.volume).collect();
    let transactions: Vec<Option<u64>> = rows.iter().map(|r| r.bar.transactions).collect();

    let base = DataFrame::new(vec![
        Column::new("date".into(), dates).cast(&DataType::Date)?,
        Column::new("ticker".into(), tickers),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
        Column::new(BarFrameSchema::TRANSACTIONS.into(), transactions),
    ])?;

    append_resolved_columns(&base, rows)
}

/// Append `adjusted_ticker` and `adj_*` columns to `df`.
///
/// `rows` must line up with the frame row for row; all existing columns are kept.
pub fn append_resolved_columns(
    df: &DataFrame,
    rows: &[ResolvedBar],
) -> Result<DataFrame, FrameError> {
    if df.height() != rows.len() {
        return Err(FrameError::LengthMismatch {
            frame: df.height(),
            records: rows.len(),
        });
    }

    let [ticker_col, open_col, high_col, low_col, close_col, volume_col] = ADJUSTED_COLUMNS;
    let adjusted: Vec<&str> = rows.iter().map(|r| r.adjusted_ticker.as_str()).collect();
    let price = |f: fn(&ResolvedBar) -> f64| rows.iter().map(f).collect::<Vec<f64>>();

    let mut out = df.clone();
    out.with_column(Column::new(ticker_col.into(), adjusted))?;
    out.with_column(Column::new(open_col.into(), price(|r| r.prices.adj_open)))?;
    out.with_column(Column::new(high_col.into(), price(|r| r.prices.adj_high)))?;
    out.with_column(Column::new(low_col.into(), price(|r| r.prices.adj_low)))?;
    out.with_column(Column::new(close_col.into(), price(|r| r.prices.adj_close)))?;
    out.with_column(Column::new(volume_col.into(), price(|r| r.prices.adj_volume)))?;
    Ok(out)
}
