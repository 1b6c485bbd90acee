//! Metrics module - grouped daily change and rolling-average derivation

mod deriver;
mod metric;
mod rolling;

pub use deriver::{derive_metrics, pct_change, EnrichedTable, MetricRow, THRESHOLD};
pub use metric::{collect_series, Metric, Series};
pub use rolling::{round_half_even, trailing_mean, ROLLING_WINDOW};
