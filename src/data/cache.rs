//! Snapshot Cache Module
//! Process-owned memoization of pipeline results, keyed by source path and
//! validated against the file's modification time.

use crate::data::loader::{ensure_readable, LoaderError, SourceSchema};
use crate::data::pipeline::{run_pipeline, Dataset, PipelineError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

/// Modification time of a readable source file.
pub fn source_modified(path: &Path) -> Result<SystemTime, LoaderError> {
    ensure_readable(path)?;
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| LoaderError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Run the pipeline for `path`, stamped with the modification time read
/// before loading so a concurrent rewrite shows up as stale.
pub fn load_stamped(
    path: &Path,
    schema: &SourceSchema,
) -> Result<(Dataset, SystemTime), PipelineError> {
    let modified = source_modified(path)?;
    let dataset = run_pipeline(path, schema)?;
    Ok((dataset, modified))
}

struct CacheEntry {
    schema: SourceSchema,
    modified: SystemTime,
    dataset: Arc<Dataset>,
}

/// Derived datasets by source path.
///
/// An entry is served only while its file's modification time and schema
/// are unchanged; anything else is a miss.
#[derive(Default)]
pub struct SnapshotCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh cached dataset for `path`, if any.
    pub fn get(&self, path: &Path, schema: &SourceSchema) -> Option<Arc<Dataset>> {
        let entry = self.entries.get(path)?;
        let modified = source_modified(path).ok()?;
        if entry.schema == *schema && entry.modified == modified {
            debug!(path = %path.display(), "snapshot cache hit");
            Some(Arc::clone(&entry.dataset))
        } else {
            debug!(path = %path.display(), "snapshot cache stale");
            None
        }
    }

    /// Store a dataset computed from the file version stamped `modified`.
    pub fn insert(&mut self, dataset: Dataset, modified: SystemTime) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        self.entries.insert(
            dataset.source.clone(),
            CacheEntry {
                schema: dataset.schema,
                modified,
                dataset: Arc::clone(&dataset),
            },
        );
        dataset
    }

    /// Cached dataset, or run the pipeline and remember the result.
    pub fn get_or_load(
        &mut self,
        path: &Path,
        schema: &SourceSchema,
    ) -> Result<Arc<Dataset>, PipelineError> {
        if let Some(dataset) = self.get(path, schema) {
            return Ok(dataset);
        }
        let (dataset, modified) = load_stamped(path, schema)?;
        Ok(self.insert(dataset, modified))
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
