//! Data module - CSV loading, reshaping and snapshot caching

mod cache;
mod loader;
mod map;
mod pipeline;
mod reshaper;

pub use cache::{load_stamped, source_modified, SnapshotCache};
pub use loader::{load_wide_table, LoaderError, SourceSchema, WideRow, WideTable};
pub use map::{load_map_snapshot, MapPoint, MapSchema, MapSnapshot};
pub use pipeline::{run_pipeline, Dataset, PipelineError};
pub use reshaper::{parse_date_label, reshape, ReshapeError, TidyRow, TidyTable};
