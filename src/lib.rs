//! Case Trends - time-series case dashboard core
//!
//! Loads wide case-count CSV snapshots, reshapes them into tidy per-entity
//! series and derives rolling daily metrics. Everything here is plain data;
//! rendering lives in the binary.

pub mod config;
pub mod data;
pub mod metrics;

pub use config::DashboardConfig;
pub use data::{Dataset, PipelineError, SnapshotCache, SourceSchema, WideTable};
pub use metrics::{EnrichedTable, Metric, MetricRow};
