//! Columnar adapter: the reconciliation operations over polars frames.
//!
//! Column contract: input bars carry `date`, `ticker`, `open`, `high`, `low`,
//! `close`, `volume` (and optionally `transactions`); output frames keep every
//! input column and append `adjusted_ticker` and `adj_*`.

pub mod convert;
pub mod factor;
pub mod schema;

pub use convert::{
    append_resolved_columns, bars_from_frame, resolved_to_frame, sort_bar_frame,
    splits_from_frame, ADJUSTED_COLUMNS,
};
pub use factor::adjust_frame_with_factor;
pub use schema::{BarFrameSchema, FrameError, SplitFrameSchema};
