//! Concrete reconciliation scenarios, end to end through the core API.

use chrono::NaiveDate;
use tickerline_core::{
    adjust_resolved, adjust_splits, adjust_with_cumulative_factor, build_index,
    cumulative_split_ratio, resolve, sort_bars, Bar, FactorBar, ReverseMapping, SplitEvent,
    TickerChange, TickerIndex, VendorTickerEvents,
};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn bar(ticker: &str, date: &str, close: f64, volume: u64) -> Bar {
    Bar {
        ticker: ticker.into(),
        date: d(date),
        open: close,
        high: close,
        low: close,
        close,
        volume,
        transactions: None,
    }
}

const META_FEED: &str = r#"[
  {
    "ticker": "META",
    "name": "Meta Platforms, Inc. Class A Common Stock",
    "composite_figi": "BBG000MM2P62",
    "cik": "0001326801",
    "events": [
      {"ticker_change": {"ticker": "META"}, "type": "ticker_change", "date": "2022-06-09"},
      {"ticker_change": {"ticker": "FB"}, "type": "ticker_change", "date": "2012-05-18"}
    ]
  },
  {
    "ticker": "AAPL",
    "name": "Apple Inc.",
    "events": [
      {"ticker_change": {"ticker": "AAPL"}, "type": "ticker_change", "date": "2003-09-10"}
    ]
  }
]"#;

#[test]
fn vendor_feed_to_resolved_history() {
    let feeds: Vec<VendorTickerEvents> = serde_json::from_str(META_FEED).unwrap();
    let mapping = ReverseMapping::from_vendor_events(&feeds, d("2024-06-28"));
    assert_eq!(mapping.len(), 2);

    let index = build_index(&mapping, None);
    let mut bars = vec![
        bar("META", "2022-06-10", 175.57, 27_000_000),
        bar("FB", "2021-06-01", 329.13, 13_652_000),
        bar("AAPL", "2024-06-28", 210.62, 82_542_700),
        bar("FB", "2012-05-18", 38.23, 573_576_400),
    ];
    sort_bars(&mut bars);

    let resolved = resolve(&bars, &index).unwrap();
    let owners: Vec<(&str, &str)> = resolved
        .iter()
        .map(|r| (r.bar.ticker.as_str(), r.adjusted_ticker.as_str()))
        .collect();
    assert_eq!(
        owners,
        vec![("AAPL", "AAPL"), ("FB", "META"), ("FB", "META"), ("META", "META")]
    );
}

#[test]
fn fb_before_rename_follows_meta() {
    let mut mapping = ReverseMapping::new();
    mapping.insert(
        "META",
        vec![
            TickerChange::on("META", d("2022-06-09")),
            TickerChange::on("FB", d("2012-05-18")),
        ],
    );
    let index = build_index(&mapping, None);
    let bars = vec![bar("FB", "2021-06-01", 329.13, 13_652_000)];
    let resolved = resolve(&bars, &index).unwrap();
    assert_eq!(resolved[0].adjusted_ticker, "META");
    assert!(resolved[0].is_remapped());
}

#[test]
fn ticker_reuse_by_two_companies() {
    // "SQ" was Square until its rename to XYZ; an unrelated issuer later picks it up.
    let mut mapping = ReverseMapping::new();
    mapping.insert(
        "XYZ",
        vec![
            TickerChange::on("SQ", d("2015-11-19")),
            TickerChange::on("XYZ", d("2025-01-21")),
        ],
    );
    mapping.insert("NEWSQ", vec![TickerChange::on("SQ", d("2025-06-02"))]);

    let index = build_index(&mapping, None);
    let bars = vec![
        bar("SQ", "2024-12-31", 84.99, 1),
        bar("SQ", "2025-06-01", 60.00, 1),
        bar("SQ", "2025-06-02", 12.00, 1),
    ];
    let resolved = resolve(&bars, &index).unwrap();
    let owners: Vec<&str> = resolved.iter().map(|r| r.adjusted_ticker.as_str()).collect();
    assert_eq!(owners, vec!["XYZ", "XYZ", "NEWSQ"]);
}

#[test]
fn tsla_five_for_one() {
    let splits = vec![SplitEvent::new("TSLA", d("2020-08-31"), 1.0, 5.0)];
    let bars = vec![
        bar("TSLA", "2020-08-28", 2213.40, 20_081_200),
        bar("TSLA", "2020-08-31", 498.32, 118_374_400),
    ];
    let adjusted = adjust_splits(&bars, &splits).unwrap();

    assert!((adjusted[0].adj_close - 442.68).abs() < 1e-9);
    assert!((adjusted[0].adj_volume - 100_406_000.0).abs() < 1e-6);
    assert_eq!(adjusted[1].adj_close, 498.32);
    assert_eq!(adjusted[1].adj_volume, 118_374_400.0);
}

#[test]
fn one_for_fifteen_reverse_split_volume() {
    let splits = vec![SplitEvent::new("GE", d("2021-08-02"), 15.0, 1.0)];
    let bars = vec![bar("GE", "2021-07-30", 6.91, 1_000)];
    let adjusted = adjust_splits(&bars, &splits).unwrap();

    assert!((adjusted[0].adj_close - 103.65).abs() < 1e-9);
    assert!((adjusted[0].adj_volume - 66.666_666_666).abs() < 1e-6);
    assert_eq!(format!("{:.2}", adjusted[0].adj_volume), "66.67");
}

#[test]
fn two_split_round_trip() {
    let splits = vec![
        SplitEvent::new("NVDA", d("2021-07-20"), 1.0, 4.0),
        SplitEvent::new("NVDA", d("2024-06-10"), 1.0, 10.0),
    ];
    let bars = vec![
        bar("NVDA", "2021-07-19", 187.80, 50_000_000),
        bar("NVDA", "2023-01-03", 143.15, 40_000_000),
        bar("NVDA", "2024-06-10", 121.79, 314_000_000),
    ];
    let adjusted = adjust_splits(&bars, &splits).unwrap();

    for (adj, b) in adjusted.iter().zip(&bars) {
        let ratio = cumulative_split_ratio(&splits, &b.ticker, b.date);
        assert!((adj.adj_close * ratio - b.close).abs() < 1e-9);
    }
    assert_eq!(cumulative_split_ratio(&splits, "NVDA", d("2021-07-19")), 40.0);
    assert!((adjusted[0].adj_close - 4.695).abs() < 1e-9);
}

#[test]
fn splits_follow_raw_ticker_after_resolution() {
    let mut mapping = ReverseMapping::new();
    mapping.insert("META", vec![TickerChange::on("FB", d("2012-05-18"))]);
    let index = build_index(&mapping, None);

    // Split announced under the symbol the bars were traded under.
    let splits = vec![SplitEvent::new("FB", d("2021-06-02"), 1.0, 2.0)];
    let bars = vec![
        bar("FB", "2021-06-01", 330.0, 100),
        bar("FB", "2021-06-02", 165.0, 200),
    ];
    let resolved = adjust_resolved(resolve(&bars, &index).unwrap(), &splits).unwrap();

    assert_eq!(resolved[0].adjusted_ticker, "META");
    assert_eq!(resolved[0].prices.adj_close, 165.0);
    assert_eq!(resolved[0].prices.adj_volume, 200.0);
    assert_eq!(resolved[1].prices.adj_close, 165.0);
    assert_eq!(resolved[0].bar.close, 330.0);
}

#[test]
fn cumulative_factor_feed() {
    let rows = vec![
        FactorBar {
            bar: bar("AAPL", "2020-08-28", 499.23, 46_907_500),
            shares_outstanding: Some(4_275_634.0),
            cum_factor: Some(4.0),
        },
        FactorBar {
            bar: bar("AAPL", "2020-08-31", 129.04, 225_702_700),
            shares_outstanding: None,
            cum_factor: None,
        },
    ];
    let adjusted = adjust_with_cumulative_factor(&rows).unwrap();

    assert!((adjusted[0].prices.adj_close - 124.8075).abs() < 1e-9);
    assert_eq!(adjusted[0].prices.adj_volume, 187_630_000.0);
    assert_eq!(adjusted[0].adj_shares_outstanding, Some(17_102_536.0));
    assert_eq!(adjusted[1].factor, 1.0);
    assert_eq!(adjusted[1].prices.adj_close, 129.04);
    assert_eq!(adjusted[1].adj_shares_outstanding, None);
}

#[test]
fn resolved_rows_serialize_flat() {
    let rows = resolve(&[bar("FB", "2021-06-01", 329.13, 10)], &TickerIndex::default()).unwrap();
    let json = serde_json::to_value(&rows[0]).unwrap();
    for key in ["ticker", "date", "close", "adjusted_ticker", "adj_close", "adj_volume"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(json.get("transactions").is_none());
}
