//! Domain records for symbol-history reconciliation

pub mod bar;
pub mod events;
pub mod factor;

pub use bar::{AdjustedPrices, Bar, ResolvedBar};
pub use events::{
    ReverseMapping, SplitEvent, TickerChange, TickerChangePayload, TickerHistory, VendorEvent,
    VendorTickerEvents,
};
pub use factor::{FactorAdjustedBar, FactorBar};
