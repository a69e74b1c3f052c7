//! Reconciliation pipeline: sort → index → resolve → adjust → report.
//!
//! Entry points:
//! - `Reconciler::run()`: typed bars plus either a reverse mapping or raw
//!   vendor event feeds.
//! - `Reconciler::run_frame()`: the same over polars frames; the returned frame
//!   keeps every input column and gains the reconciled ones. Its fingerprint
//!   also covers the columns that pass through untouched.
//!
//! With `parallel` set, the sorted batch is split into one partition per raw
//! ticker and partitions run on the rayon pool. Each ticker's resolution and
//! split adjustment is independent, so the output is identical to the serial
//! path.

use polars::prelude::DataFrame;
use rayon::prelude::*;
use thiserror::Error;
use tracing::info;

use tickerline_core::frame::{
    append_resolved_columns, bars_from_frame, sort_bar_frame, splits_from_frame, BarFrameSchema,
    FrameError,
};
use tickerline_core::{
    backward_match, build_index, detect_bar_anomalies, resolve_from_matches, sort_bars, Bar,
    ReconcileError, ResolvedBar, ReuseDiagnostics, ReverseMapping, SplitError, SplitEvent,
    SplitTable, TickerIndex, VendorTickerEvents,
};

use crate::config::ReconcileConfig;
use crate::fingerprint::BatchFingerprint;
use crate::report::{ReconcileReport, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),
    #[error("split error: {0}")]
    Split(#[from] SplitError),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("fingerprint serialization failed: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Where the ticker histories of a batch come from.
#[derive(Debug, Clone, Copy)]
pub enum MappingSource<'a> {
    /// An already built reverse mapping.
    Mapping(&'a ReverseMapping),
    /// Raw vendor feeds; single-event feeds are dated with the config's "today".
    VendorEvents(&'a [VendorTickerEvents]),
}

impl<'a> From<&'a ReverseMapping> for MappingSource<'a> {
    fn from(mapping: &'a ReverseMapping) -> Self {
        MappingSource::Mapping(mapping)
    }
}

impl<'a> From<&'a [VendorTickerEvents]> for MappingSource<'a> {
    fn from(feeds: &'a [VendorTickerEvents]) -> Self {
        MappingSource::VendorEvents(feeds)
    }
}

impl<'a> From<&'a Vec<VendorTickerEvents>> for MappingSource<'a> {
    fn from(feeds: &'a Vec<VendorTickerEvents>) -> Self {
        MappingSource::VendorEvents(feeds.as_slice())
    }
}

/// Everything one batch produces.
#[derive(Debug, Clone)]
pub struct ReconcileOutput {
    /// Resolved and adjusted rows in `(ticker, date)` order.
    pub bars: Vec<ResolvedBar>,
    pub report: ReconcileReport,
    pub fingerprint: BatchFingerprint,
}

impl ReconcileOutput {
    /// True when this output was generated from inputs with `fingerprint`.
    pub fn is_current_for(&self, fingerprint: &BatchFingerprint) -> bool {
        &self.fingerprint == fingerprint
    }
}

/// Frame variant of [`ReconcileOutput`].
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Input frame sorted by `(ticker, date)` with the reconciled columns appended.
    pub frame: DataFrame,
    pub report: ReconcileReport,
    /// Covers the typed batch plus every other input column, so a change to a
    /// carried-through column such as `vwap` also marks the frame stale.
    pub fingerprint: BatchFingerprint,
}

impl FrameOutput {
    pub fn is_current_for(&self, fingerprint: &BatchFingerprint) -> bool {
        &self.fingerprint == fingerprint
    }
}

/// Bar columns already hashed through the typed bars.
fn typed_bar_columns() -> Vec<String> {
    let mut names: Vec<String> = BarFrameSchema::schema()
        .iter_names()
        .map(|name| name.to_string())
        .collect();
    names.push(BarFrameSchema::TRANSACTIONS.to_string());
    names
}

/// Fold the passthrough columns of a sorted bar frame into `fingerprint`.
fn with_passthrough_columns(
    fingerprint: BatchFingerprint,
    sorted: &DataFrame,
) -> Result<BatchFingerprint, RunnerError> {
    let typed = typed_bar_columns();
    let skip: Vec<&str> = typed.iter().map(String::as_str).collect();
    fingerprint
        .with_frame_columns(sorted, &skip)
        .map_err(|e| RunnerError::Frame(e.into()))
}

/// Result of one partition.
struct Partition {
    matches: Vec<Option<usize>>,
    rows: Vec<ResolvedBar>,
}

fn reconcile_partition(
    bars: &[Bar],
    index: &TickerIndex,
    splits: &SplitTable,
) -> Result<Partition, ReconcileError> {
    let matches = backward_match(bars, index)?;
    let mut rows = resolve_from_matches(bars, index, &matches);
    for row in &mut rows {
        row.prices = splits.adjust_bar(&row.bar);
    }
    Ok(Partition { matches, rows })
}

/// Sorted bar frame, its typed bars and the split events of a frame run.
fn frame_inputs(
    bars: &DataFrame,
    splits: Option<&DataFrame>,
) -> Result<(DataFrame, Vec<Bar>, Vec<SplitEvent>), FrameError> {
    let sorted = sort_bar_frame(bars)?;
    let typed = bars_from_frame(&sorted)?;
    let split_events = match splits {
        Some(df) => splits_from_frame(df)?,
        None => Vec::new(),
    };
    Ok((sorted, typed, split_events))
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile a batch of bars.
    ///
    /// Bars may arrive in any order; they are stably sorted by
    /// `(ticker, date)` first and the output follows that order.
    pub fn run<'a>(
        &self,
        mut bars: Vec<Bar>,
        source: impl Into<MappingSource<'a>>,
        splits: &[SplitEvent],
    ) -> Result<ReconcileOutput, RunnerError> {
        sort_bars(&mut bars);
        let mapping = self.mapping_for(source.into());
        self.run_sorted(bars, &mapping, splits)
    }

    /// Reconcile a bar frame, reading splits from an optional split frame.
    pub fn run_frame<'a>(
        &self,
        bars: &DataFrame,
        source: impl Into<MappingSource<'a>>,
        splits: Option<&DataFrame>,
    ) -> Result<FrameOutput, RunnerError> {
        let (sorted, typed, split_events) = frame_inputs(bars, splits)?;
        let mapping = self.mapping_for(source.into());
        let output = self.run_sorted(typed, &mapping, &split_events)?;
        let frame = append_resolved_columns(&sorted, &output.bars)?;
        let fingerprint = with_passthrough_columns(output.fingerprint, &sorted)?;

        Ok(FrameOutput {
            frame,
            report: output.report,
            fingerprint,
        })
    }

    /// Fingerprint of the inputs `run_frame` would see, without running it.
    pub fn fingerprint_frame<'a>(
        &self,
        bars: &DataFrame,
        source: impl Into<MappingSource<'a>>,
        splits: Option<&DataFrame>,
    ) -> Result<BatchFingerprint, RunnerError> {
        let (sorted, typed, split_events) = frame_inputs(bars, splits)?;
        let mapping = self.mapping_for(source.into());
        let fingerprint = BatchFingerprint::compute(&self.config, &typed, &mapping, &split_events)?;
        with_passthrough_columns(fingerprint, &sorted)
    }

    /// Fingerprint of the inputs `run` would see, without running it.
    pub fn fingerprint<'a>(
        &self,
        mut bars: Vec<Bar>,
        source: impl Into<MappingSource<'a>>,
        splits: &[SplitEvent],
    ) -> Result<BatchFingerprint, RunnerError> {
        sort_bars(&mut bars);
        let mapping = self.mapping_for(source.into());
        Ok(BatchFingerprint::compute(&self.config, &bars, &mapping, splits)?)
    }

    fn mapping_for(&self, source: MappingSource<'_>) -> ReverseMapping {
        match source {
            MappingSource::Mapping(mapping) => mapping.clone(),
            MappingSource::VendorEvents(feeds) => {
                ReverseMapping::from_vendor_events(feeds, self.config.today())
            }
        }
    }

    #[tracing::instrument(
        skip_all,
        fields(bars = bars.len(), owners = mapping.len(), splits = splits.len(), parallel = self.config.parallel)
    )]
    fn run_sorted(
        &self,
        bars: Vec<Bar>,
        mapping: &ReverseMapping,
        splits: &[SplitEvent],
    ) -> Result<ReconcileOutput, RunnerError> {
        let fingerprint = BatchFingerprint::compute(&self.config, &bars, mapping, splits)?;
        let index = build_index(mapping, self.config.cutoff_date);
        let table = SplitTable::new(splits)?;

        let groups: Vec<&[Bar]> = bars.chunk_by(|a, b| a.ticker == b.ticker).collect();
        let partitions: Vec<Partition> = if self.config.parallel {
            groups
                .par_iter()
                .map(|group| reconcile_partition(group, &index, &table))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            groups
                .iter()
                .map(|group| reconcile_partition(group, &index, &table))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut matches = Vec::with_capacity(bars.len());
        let mut rows = Vec::with_capacity(bars.len());
        for partition in partitions {
            matches.extend(partition.matches);
            rows.extend(partition.rows);
        }

        let reuse = ReuseDiagnostics::collect(&index, &matches);
        reuse.log();

        let mut anomalies = detect_bar_anomalies(&bars);
        anomalies.extend(reuse.as_anomaly());

        let report = ReconcileReport {
            schema_version: SCHEMA_VERSION,
            bar_count: bars.len(),
            ticker_count: groups.len(),
            index_entries: index.len(),
            remapped_rows: rows.iter().filter(|r| r.is_remapped()).count(),
            identity_rows: matches.iter().filter(|m| m.is_none()).count(),
            split_count: table.split_count(),
            adjusted_rows: bars
                .iter()
                .filter(|b| table.factors(&b.ticker, b.date).is_some())
                .count(),
            reuse,
            anomalies,
        };

        info!(
            bars = report.bar_count,
            remapped = report.remapped_rows,
            adjusted = report.adjusted_rows,
            fingerprint = %fingerprint,
            "reconciled batch"
        );

        Ok(ReconcileOutput {
            bars: rows,
            report,
            fingerprint,
        })
    }
}
