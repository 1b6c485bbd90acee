//! Load → reshape → derive for one configured source.

use crate::data::loader::{load_wide_table, LoaderError, SourceSchema, WideTable};
use crate::data::reshaper::{reshape, ReshapeError};
use crate::metrics::{derive_metrics, EnrichedTable};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Reshape(#[from] ReshapeError),
}

/// Everything the presentation layer consumes for one source.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: PathBuf,
    pub schema: SourceSchema,
    /// Aggregated wide table, for raw display.
    pub wide: WideTable,
    /// Thresholded, enriched tidy rows.
    pub enriched: EnrichedTable,
}

impl Dataset {
    /// Selectable entity names: every entity of the snapshot, sorted.
    pub fn entities(&self) -> Vec<String> {
        self.wide.entities()
    }

    /// Grouping field name (e.g. `Country/Region`).
    pub fn group(&self) -> &str {
        self.enriched.group()
    }
}

/// Run the full pipeline for `path`.
pub fn run_pipeline(path: &Path, schema: &SourceSchema) -> Result<Dataset, PipelineError> {
    let started = Instant::now();

    let wide = load_wide_table(path, schema)?;
    let tidy = reshape(&wide)?;
    let enriched = derive_metrics(&tidy);

    info!(
        path = %path.display(),
        group = schema.entity_column,
        tidy_rows = tidy.len(),
        enriched_rows = enriched.len(),
        elapsed = ?started.elapsed(),
        "pipeline complete"
    );

    Ok(Dataset {
        source: path.to_path_buf(),
        schema: *schema,
        wide,
        enriched,
    })
}
