//! Chart Viewer Widget
//! Central panel for the Global and Regional pages: raw data preview plus
//! the interactive trend chart.

use crate::charts::ChartPlotter;
use crate::gui::Page;
use case_trends::metrics::{collect_series, Series};
use case_trends::{Dataset, Metric};
use egui::{Color32, RichText, ScrollArea};
use polars::prelude::{AnyValue, DataFrame};
use std::sync::Arc;
use tracing::warn;

/// Date columns shown in the raw data preview.
const PREVIEW_DATES: usize = 14;

/// Key of the series currently extracted from the dataset.
#[derive(Clone, PartialEq)]
struct SeriesKey {
    entities: Vec<String>,
    metric: Metric,
}

#[derive(Default)]
pub struct ChartViewer {
    dataset: Option<Arc<Dataset>>,
    /// Raw data preview of the current dataset.
    preview: Option<DataFrame>,
    series_key: Option<SeriesKey>,
    series: Vec<Series>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        self.dataset.as_ref()
    }

    /// Show `dataset`; cached series are dropped when it changes.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        let unchanged = self
            .dataset
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &dataset));
        if !unchanged {
            self.series_key = None;
            self.series.clear();
            self.preview = match dataset.wide.preview(PREVIEW_DATES) {
                Ok(df) => Some(df),
                Err(e) => {
                    warn!(error = %e, "raw data preview unavailable");
                    None
                }
            };
        }
        self.dataset = Some(dataset);
    }

    pub fn clear(&mut self) {
        self.dataset = None;
        self.preview = None;
        self.series_key = None;
        self.series.clear();
    }

    /// Series for the current selection, re-extracted only when the
    /// selection, metric or dataset changed.
    pub fn series(&mut self, entities: &[String], metric: Metric) -> &[Series] {
        let key = SeriesKey {
            entities: entities.to_vec(),
            metric,
        };
        if self.series_key.as_ref() != Some(&key) {
            self.series = match &self.dataset {
                Some(dataset) => collect_series(&dataset.enriched, entities, metric),
                None => Vec::new(),
            };
            self.series_key = Some(key);
        }
        &self.series
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        page: Page,
        entities: &[String],
        metric: Metric,
    ) {
        let Some(dataset) = self.dataset.clone() else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(RichText::new(page.title()).size(22.0).strong());
                ui.label(RichText::new(page.subtitle()).size(14.0));
                ui.label(
                    RichText::new(format!("Source: {}", dataset.source.display()))
                        .size(11.0)
                        .color(Color32::GRAY),
                );
                ui.add_space(8.0);

                egui::CollapsingHeader::new("Raw data")
                    .default_open(false)
                    .show(ui, |ui| match &self.preview {
                        Some(df) => Self::draw_raw_preview(ui, df),
                        None => {
                            ui.label(RichText::new("Preview unavailable").color(Color32::GRAY));
                        }
                    });

                ui.add_space(10.0);
                ui.label(RichText::new(metric.title()).size(16.0).strong());

                let series = self.series(entities, metric);
                if series.is_empty() {
                    ui.label(
                        RichText::new("Select at least one entity that reached 10 deaths")
                            .color(Color32::GRAY),
                    );
                } else {
                    ChartPlotter::draw_trend_chart(ui, series, metric);
                }
            });
    }

    /// Aggregated wide table restricted to its latest date columns.
    fn draw_raw_preview(ui: &mut egui::Ui, df: &DataFrame) {
        ScrollArea::both().max_height(300.0).show(ui, |ui| {
            egui::Grid::new("raw_preview")
                .striped(true)
                .spacing([12.0, 4.0])
                .show(ui, |ui| {
                    for name in df.get_column_names() {
                        ui.label(RichText::new(name.as_str()).strong());
                    }
                    ui.end_row();

                    for row in 0..df.height() {
                        for column in df.get_columns() {
                            ui.label(Self::cell_text(column.get(row).ok()));
                        }
                        ui.end_row();
                    }
                });
        });
    }

    fn cell_text(value: Option<AnyValue<'_>>) -> String {
        match value {
            Some(AnyValue::String(s)) => s.to_string(),
            Some(AnyValue::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use case_trends::data::{TidyRow, TidyTable, WideRow};
    use case_trends::metrics::derive_metrics;
    use case_trends::{SourceSchema, WideTable};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn dataset(values: &[i64]) -> Arc<Dataset> {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let labels: Vec<String> = (1..=values.len()).map(|d| format!("3/{d}/20")).collect();
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, &value)| TidyRow {
                entity: "Italy".to_string(),
                date: start + chrono::Duration::days(i as i64),
                value,
            })
            .collect();
        let wide = WideTable::new(
            "Country/Region",
            labels,
            vec![WideRow {
                entity: "Italy".to_string(),
                values: values.to_vec(),
            }],
        );

        Arc::new(Dataset {
            source: PathBuf::from("global.csv"),
            schema: SourceSchema::GLOBAL,
            wide,
            enriched: derive_metrics(&TidyTable::new("Country/Region", rows)),
        })
    }

    #[test]
    fn series_follow_metric_and_dataset() {
        let selected = vec!["Italy".to_string()];
        let mut viewer = ChartViewer::new();
        assert!(viewer.series(&selected, Metric::Total).is_empty());

        viewer.set_dataset(dataset(&[10, 20, 40]));
        assert_eq!(viewer.series(&selected, Metric::Total)[0].points[2], (2.0, 40.0));
        assert_eq!(viewer.series(&selected, Metric::GrowthRate)[0].points[1], (1.0, 100.0));

        viewer.set_dataset(dataset(&[11, 12]));
        assert_eq!(viewer.series(&selected, Metric::GrowthRate)[0].points.len(), 2);

        let preview = viewer.preview.as_ref().unwrap();
        assert_eq!(preview.width(), 3);
        assert_eq!(ChartViewer::cell_text(preview.column("3/2/20").unwrap().get(0).ok()), "12");
        assert_eq!(ChartViewer::cell_text(preview.column("Country/Region").unwrap().get(0).ok()), "Italy");

        viewer.clear();
        assert!(viewer.dataset().is_none());
        assert!(viewer.preview.is_none());
        assert!(viewer.series(&selected, Metric::Total).is_empty());
    }
}
