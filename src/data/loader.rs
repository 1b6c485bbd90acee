//! CSV Source Loader Module
//! Reads wide case-count tables with Polars and aggregates rows per entity.

use polars::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Source unavailable: {}: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Schema error in {}: missing column '{column}'", .path.display())]
    Schema { path: PathBuf, column: String },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Fixed layout of a wide source file.
///
/// Every column that is neither the entity column nor listed in
/// `non_metric_columns` is treated as a date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSchema {
    pub entity_column: &'static str,
    pub non_metric_columns: &'static [&'static str],
}

impl SourceSchema {
    /// Country-level series (`time_series_covid19_*_global.csv`).
    pub const GLOBAL: SourceSchema = SourceSchema {
        entity_column: "Country/Region",
        non_metric_columns: &["Province/State", "Lat", "Long"],
    };

    /// Province/state series (`time_series_covid19_*_UK.csv` and similar).
    pub const REGIONAL: SourceSchema = SourceSchema {
        entity_column: "Province_State",
        non_metric_columns: &[
            "Country_Region",
            "UID",
            "iso2",
            "iso3",
            "code3",
            "Combined_Key",
            "FIPS",
            "Admin2",
            "Lat",
            "Long_",
            "Population",
        ],
    };

    /// Columns that must be present in the source header.
    pub fn required_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.entity_column).chain(self.non_metric_columns.iter().copied())
    }

    pub fn is_metric_column(&self, name: &str) -> bool {
        name != self.entity_column && !self.non_metric_columns.contains(&name)
    }

    /// Fail with `Schema` on the first required column missing from `columns`.
    pub fn validate(&self, path: &Path, columns: &[String]) -> Result<(), LoaderError> {
        match self
            .required_columns()
            .find(|required| !columns.iter().any(|c| c == required))
        {
            Some(missing) => Err(LoaderError::Schema {
                path: path.to_path_buf(),
                column: missing.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// One aggregated entity row of a wide table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideRow {
    pub entity: String,
    pub values: Vec<i64>,
}

/// Entity x date table of cumulative counts.
///
/// Rows are unique per entity and sorted by entity; `values` follow
/// `date_labels` in source column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    entity_column: String,
    date_labels: Vec<String>,
    rows: Vec<WideRow>,
}

impl WideTable {
    pub fn new(entity_column: impl Into<String>, date_labels: Vec<String>, rows: Vec<WideRow>) -> Self {
        Self {
            entity_column: entity_column.into(),
            date_labels,
            rows,
        }
    }

    /// Name of the grouping field (e.g. `Country/Region`).
    pub fn entity_column(&self) -> &str {
        &self.entity_column
    }

    pub fn date_labels(&self) -> &[String] {
        &self.date_labels
    }

    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    pub fn entities(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.entity.clone()).collect()
    }

    pub fn values_for(&self, entity: &str) -> Option<&[i64]> {
        self.rows
            .iter()
            .find(|row| row.entity == entity)
            .map(|row| row.values.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rebuild the table as a DataFrame: the entity column, then one Int64
    /// column per date label.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let entities: Vec<&str> = self.rows.iter().map(|row| row.entity.as_str()).collect();
        let mut columns = Vec::with_capacity(self.date_labels.len() + 1);
        columns.push(Column::new(self.entity_column.as_str().into(), entities));

        for (idx, label) in self.date_labels.iter().enumerate() {
            let values: Vec<i64> = self
                .rows
                .iter()
                .map(|row| row.values.get(idx).copied().unwrap_or(0))
                .collect();
            columns.push(Column::new(label.as_str().into(), values));
        }
        DataFrame::new(columns)
    }

    /// Entity column plus the `latest` most recent date columns, for raw
    /// display.
    pub fn preview(&self, latest: usize) -> PolarsResult<DataFrame> {
        let first = self.date_labels.len().saturating_sub(latest);
        let mut names = vec![self.entity_column.as_str()];
        names.extend(self.date_labels[first..].iter().map(String::as_str));
        self.to_dataframe()?.select(names)
    }
}

/// Load a wide CSV source, drop non-metric columns and sum rows that share
/// an entity label.
pub fn load_wide_table(path: &Path, schema: &SourceSchema) -> Result<WideTable, LoaderError> {
    let started = Instant::now();
    ensure_readable(path)?;

    let path_str = path.to_string_lossy().to_string();
    let df = LazyCsvReader::new(&path_str)
        .with_infer_schema_length(Some(10000))
        .finish()?
        .collect()?;

    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    schema.validate(path, &columns)?;

    let date_labels: Vec<String> = columns
        .into_iter()
        .filter(|c| schema.is_metric_column(c))
        .collect();
    debug!(
        path = %path.display(),
        raw_rows = df.height(),
        date_columns = date_labels.len(),
        "read wide source"
    );

    let inexact = non_integer_columns(&df, &date_labels);
    if !inexact.is_empty() {
        warn!(
            path = %path.display(),
            columns = ?inexact,
            "date columns not inferred as integers; fractions are truncated and text counts as zero"
        );
    }

    // Missing cells count as zero, matching a plain column sum.
    let sums: Vec<Expr> = date_labels
        .iter()
        .map(|label| {
            col(label.as_str())
                .cast(DataType::Int64)
                .fill_null(lit(0i64))
                .sum()
        })
        .collect();

    let summed = df
        .lazy()
        .filter(col(schema.entity_column).is_not_null())
        .group_by([col(schema.entity_column)])
        .agg(sums)
        .collect()?;

    let entity_col = summed
        .column(schema.entity_column)?
        .cast(&DataType::String)?;
    let entity_ca = entity_col.str()?;

    let value_cols = date_labels
        .iter()
        .map(|label| {
            summed
                .column(label.as_str())
                .and_then(|c| c.cast(&DataType::Int64))
        })
        .collect::<PolarsResult<Vec<Column>>>()?;
    let value_cas = value_cols
        .iter()
        .map(|c| c.i64())
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut rows: Vec<WideRow> = (0..summed.height())
        .filter_map(|i| {
            let entity = entity_ca.get(i)?;
            let values = value_cas.iter().map(|ca| ca.get(i).unwrap_or(0)).collect();
            Some(WideRow {
                entity: entity.to_string(),
                values,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.entity.cmp(&b.entity));

    info!(
        path = %path.display(),
        entities = rows.len(),
        dates = date_labels.len(),
        elapsed = ?started.elapsed(),
        "loaded wide table"
    );

    Ok(WideTable::new(schema.entity_column, date_labels, rows))
}

/// Date columns whose inferred type is not an integer type.
fn non_integer_columns(df: &DataFrame, date_labels: &[String]) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| date_labels.iter().any(|label| label == c.name().as_str()))
        .filter(|c| !c.dtype().is_integer())
        .map(|c| c.name().to_string())
        .collect()
}

/// Fail with `SourceUnavailable` unless `path` is a readable regular file.
pub(crate) fn ensure_readable(path: &Path) -> Result<(), LoaderError> {
    let unavailable = |source: io::Error| LoaderError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(unavailable)?;
    if !metadata.is_file() {
        return Err(unavailable(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    std::fs::File::open(path).map_err(unavailable)?;
    Ok(())
}
