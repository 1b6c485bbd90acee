//! Case Trends Main Application
//! Main window with control panel and the page viewers.

use crate::charts::StaticChartRenderer;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, MapViewer, Page, SourceKind};
use case_trends::data::{load_map_snapshot, load_stamped, MapSchema, MapSnapshot};
use case_trends::metrics::collect_series;
use case_trends::{DashboardConfig, Dataset, SnapshotCache};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::SystemTime;
use tracing::{info, warn};

const EXPORT_WIDTH: u32 = 1400;
const EXPORT_HEIGHT: u32 = 800;

/// Result of a background load.
enum LoadResult {
    Dataset {
        kind: SourceKind,
        modified: SystemTime,
        dataset: Dataset,
    },
    Map {
        path: PathBuf,
        snapshot: MapSnapshot,
    },
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    cache: SnapshotCache,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    map_viewer: MapViewer,
    /// Source the current map snapshot was read from.
    map_source: Option<PathBuf>,

    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
    /// Page data was requested while a load was running.
    refresh_pending: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self {
            cache: SnapshotCache::new(),
            control_panel: ControlPanel::new(&config),
            chart_viewer: ChartViewer::new(),
            map_viewer: MapViewer::new(),
            map_source: None,
            load_rx: None,
            is_loading: false,
            refresh_pending: false,
        };
        app.ensure_page_data();
        app
    }

    /// Make sure the current page has its data, from the cache or a
    /// background load.
    fn ensure_page_data(&mut self) {
        if self.is_loading {
            self.refresh_pending = true;
            return;
        }

        let page = self.control_panel.settings.page;
        let kind = page.source();
        let path = self.control_panel.source_path(kind).to_path_buf();

        if page.is_chart() {
            let schema = kind.schema();
            if let Some(dataset) = self.cache.get(&path, &schema) {
                self.show_dataset(kind, dataset);
                return;
            }
            self.chart_viewer.clear();
            self.control_panel
                .set_progress(10.0, &format!("Loading {}...", path.display()));
            self.spawn_load(move || {
                let (dataset, modified) =
                    load_stamped(&path, &schema).map_err(|e| e.to_string())?;
                Ok(LoadResult::Dataset {
                    kind,
                    modified,
                    dataset,
                })
            });
        } else {
            if self.map_viewer.has_snapshot() && self.map_source.as_ref() == Some(&path) {
                return;
            }
            self.control_panel
                .set_progress(10.0, &format!("Loading {}...", path.display()));
            self.spawn_load(move || {
                let snapshot =
                    load_map_snapshot(&path, &MapSchema::REGIONAL).map_err(|e| e.to_string())?;
                Ok(LoadResult::Map { path, snapshot })
            });
        }
    }

    /// Run `job` on a background thread and deliver its result over a channel.
    fn spawn_load<F>(&mut self, job: F)
    where
        F: FnOnce() -> Result<LoadResult, String> + Send + 'static,
    {
        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.is_loading = true;

        thread::spawn(move || {
            let result = job().unwrap_or_else(LoadResult::Error);
            let _ = tx.send(result);
        });
    }

    /// Check for background load results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Dataset {
                kind,
                modified,
                dataset,
            }) => {
                let dataset = self.cache.insert(dataset, modified);
                // A source picked mid-load has its own load queued.
                if self.control_panel.settings.page.is_chart()
                    && self.control_panel.is_current_source(kind, &dataset.source)
                {
                    self.show_dataset(kind, dataset);
                }
                self.finish_loading();
            }
            Ok(LoadResult::Map { path, snapshot }) => {
                if !self.control_panel.settings.page.is_chart()
                    && self.control_panel.is_current_source(SourceKind::Regional, &path)
                {
                    self.control_panel.set_progress(
                        100.0,
                        &format!(
                            "Loaded {} map rows, {} days",
                            snapshot.points.len(),
                            snapshot.day_count()
                        ),
                    );
                    self.map_viewer.set_snapshot(snapshot);
                    self.map_source = Some(path);
                }
                self.finish_loading();
            }
            Ok(LoadResult::Error(error)) => {
                warn!(%error, "load failed");
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", error));
                self.finish_loading();
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.control_panel
                    .set_progress(0.0, "Error: loader thread exited");
                self.finish_loading();
            }
        }
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        if std::mem::take(&mut self.refresh_pending) {
            self.ensure_page_data();
        }
    }

    fn show_dataset(&mut self, kind: SourceKind, dataset: Arc<Dataset>) {
        self.control_panel.set_progress(
            100.0,
            &format!(
                "Loaded {} entities, {} rows at or above threshold",
                dataset.wide.len(),
                dataset.enriched.len()
            ),
        );
        self.control_panel.update_entities(kind, dataset.entities());
        self.chart_viewer.set_dataset(dataset);
    }

    /// Pick a new file for `kind` and load it if the current page uses it.
    fn handle_browse_source(&mut self, kind: SourceKind) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        else {
            return;
        };

        info!(source = kind.label(), path = %path.display(), "source selected");
        self.control_panel.set_source_path(kind, path);
        if self.control_panel.settings.page.source() == kind {
            self.chart_viewer.clear();
            self.map_viewer.clear();
            self.map_source = None;
            self.ensure_page_data();
        }
    }

    /// Forget cached results for both sources and reload the current page.
    fn handle_reload(&mut self) {
        for kind in [SourceKind::Global, SourceKind::Regional] {
            let path = self.control_panel.source_path(kind).to_path_buf();
            if self.cache.invalidate(&path) {
                info!(path = %path.display(), "cache entry invalidated");
            }
        }
        self.chart_viewer.clear();
        self.map_viewer.clear();
        self.map_source = None;
        self.ensure_page_data();
    }

    /// Render the current trend chart to PNG and save it.
    fn handle_export_png(&mut self) {
        let Some(dataset) = self.chart_viewer.dataset().cloned() else {
            self.control_panel.set_progress(0.0, "No chart to export");
            return;
        };
        let metric = self.control_panel.settings.metric;
        let series = collect_series(
            &dataset.enriched,
            &self.control_panel.get_selected_entities(),
            metric,
        );

        let Some(output_path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(format!("{}.png", metric.column()))
            .save_file()
        else {
            return;
        };

        self.control_panel.set_progress(50.0, "Rendering chart...");
        let written = StaticChartRenderer::render_trend_png(
            &series,
            metric,
            EXPORT_WIDTH,
            EXPORT_HEIGHT,
        )
        .map_err(|e| e.to_string())
        .and_then(|bytes| std::fs::write(&output_path, bytes).map_err(|e| e.to_string()));

        match written {
            Ok(()) => {
                info!(path = %output_path.display(), "chart exported");
                self.control_panel.set_progress(
                    100.0,
                    &format!("Chart exported: {}", output_path.display()),
                );
                if let Err(e) = open::that(&output_path) {
                    warn!(error = %e, "could not open exported chart");
                }
            }
            Err(e) => {
                self.control_panel
                    .set_progress(0.0, &format!("Export Error: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::PageChanged => self.ensure_page_data(),
                        ControlPanelAction::BrowseSource(kind) => self.handle_browse_source(kind),
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - page viewer
        let page = self.control_panel.settings.page;
        egui::CentralPanel::default().show(ctx, |ui| match page {
            Page::Global | Page::Regional => {
                let entities = self.control_panel.get_selected_entities();
                let metric = self.control_panel.settings.metric;
                self.chart_viewer.show(ui, page, &entities, metric);
            }
            Page::RegionalMap => self.map_viewer.show(ui, page),
        });
    }
}
