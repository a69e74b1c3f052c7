//! Tickerline Runner: batch orchestration over `tickerline-core`.
//!
//! This crate provides:
//! - TOML-backed run configuration (cutoff, pinned "today", parallelism)
//! - The reconciliation pipeline over typed records or polars frames
//! - Per-ticker parallel execution on rayon
//! - BLAKE3 batch fingerprints for regeneration checks
//! - A serializable run report

pub mod config;
pub mod fingerprint;
pub mod pipeline;
pub mod report;

pub use config::{ConfigError, ReconcileConfig};
pub use fingerprint::BatchFingerprint;
pub use pipeline::{FrameOutput, MappingSource, ReconcileOutput, Reconciler, RunnerError};
pub use report::ReconcileReport;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn reconciler_is_send_sync() {
        assert_send::<Reconciler>();
        assert_sync::<Reconciler>();
    }

    #[test]
    fn output_types_are_send_sync() {
        assert_send::<ReconcileOutput>();
        assert_sync::<ReconcileOutput>();
        assert_send::<ReconcileReport>();
        assert_sync::<ReconcileReport>();
        assert_send::<BatchFingerprint>();
        assert_sync::<BatchFingerprint>();
    }
}
