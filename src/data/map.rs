//! Map Snapshot Module
//! Per-row coordinates and date values of a regional source for the column map.

use crate::data::loader::{ensure_readable, LoaderError, SourceSchema};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Columns the map reads on top of the source's date columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSchema {
    pub source: SourceSchema,
    pub label_column: &'static str,
    pub lat_column: &'static str,
    pub lon_column: &'static str,
}

impl MapSchema {
    pub const REGIONAL: MapSchema = MapSchema {
        source: SourceSchema::REGIONAL,
        label_column: "Combined_Key",
        lat_column: "Lat",
        lon_column: "Long_",
    };
}

/// One mapped source row (not aggregated).
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    pub values: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapSnapshot {
    pub date_labels: Vec<String>,
    pub points: Vec<MapPoint>,
}

impl MapSnapshot {
    /// Number of selectable days.
    pub fn day_count(&self) -> usize {
        self.date_labels.len()
    }

    pub fn date_label(&self, day: usize) -> Option<&str> {
        self.date_labels.get(day).map(String::as_str)
    }

    /// Every point with its value on `day`.
    pub fn values_on(&self, day: usize) -> impl Iterator<Item = (&MapPoint, i64)> + '_ {
        self.points
            .iter()
            .filter_map(move |point| point.values.get(day).map(|&v| (point, v)))
    }

    /// Largest value on any day; scales column heights across the slider.
    pub fn max_value(&self) -> i64 {
        self.points
            .iter()
            .flat_map(|point| point.values.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Load map rows: rows without coordinates (`Lat == 0`) or with any empty
/// label, coordinate or date cell are dropped.
pub fn load_map_snapshot(path: &Path, schema: &MapSchema) -> Result<MapSnapshot, LoaderError> {
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
    schema.source.validate(path, &columns)?;
    let date_labels: Vec<String> = columns
        .into_iter()
        .filter(|c| schema.source.is_metric_column(c))
        .collect();

    let label_col = df.column(schema.label_column)?.cast(&DataType::String)?;
    let lat_col = df.column(schema.lat_column)?.cast(&DataType::Float64)?;
    let lon_col = df.column(schema.lon_column)?.cast(&DataType::Float64)?;
    let labels = label_col.str()?;
    let lats = lat_col.f64()?;
    let lons = lon_col.f64()?;

    let value_cols = date_labels
        .iter()
        .map(|label| {
            df.column(label.as_str())
                .and_then(|c| c.cast(&DataType::Int64))
        })
        .collect::<PolarsResult<Vec<Column>>>()?;
    let value_cas = value_cols
        .iter()
        .map(|c| c.i64())
        .collect::<PolarsResult<Vec<_>>>()?;

    let points: Vec<MapPoint> = (0..df.height())
        .filter_map(|i| {
            let (label, lat, lon) = (labels.get(i)?, lats.get(i)?, lons.get(i)?);
            if lat == 0.0 {
                return None;
            }
            let values = value_cas
                .iter()
                .map(|ca| ca.get(i))
                .collect::<Option<Vec<i64>>>()?;
            Some(MapPoint {
                label: label.to_string(),
                lat,
                lon,
                values,
            })
        })
        .collect();

    info!(
        path = %path.display(),
        raw_rows = df.height(),
        points = points.len(),
        dates = date_labels.len(),
        "loaded map snapshot"
    );

    Ok(MapSnapshot {
        date_labels,
        points,
    })
}
