//! Batch job wiring for revquant: configuration and the load/compute/export
//! pipeline, generic over any [`PurchaseSource`] + [`RevenueSink`].
//!
//! [`PurchaseSource`]: revquant_core::store::PurchaseSource
//! [`RevenueSink`]: revquant_core::store::RevenueSink

pub mod config;
pub mod pipeline;

pub use crate::config::{Overrides, PipelineConfig};
pub use crate::pipeline::{ExportOutcome, RunSummary, run};
