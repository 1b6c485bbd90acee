//! Control Panel Widget
//! Left side panel with page, source, entity and metric selection.

use case_trends::{DashboardConfig, Metric, SourceSchema};
use egui::{Color32, ComboBox, RichText, ScrollArea};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Dashboard pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Global,
    Regional,
    RegionalMap,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Global, Page::Regional, Page::RegionalMap];

    pub fn label(self) -> &'static str {
        match self {
            Page::Global => "Global",
            Page::Regional => "Regional",
            Page::RegionalMap => "Regional Map",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Global => "Global COVID-19 Deaths",
            Page::Regional => "Regional COVID-19 Deaths",
            Page::RegionalMap => "Regional Map",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            Page::Global => "Daily COVID-19 deaths by country from Jan 22, 2020 - Present.",
            Page::Regional => "Daily COVID-19 deaths by province or state.",
            Page::RegionalMap => "Deaths by territory",
        }
    }

    pub fn source(self) -> SourceKind {
        match self {
            Page::Global => SourceKind::Global,
            Page::Regional | Page::RegionalMap => SourceKind::Regional,
        }
    }

    pub fn is_chart(self) -> bool {
        !matches!(self, Page::RegionalMap)
    }
}

/// Which configured CSV a page reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Global,
    Regional,
}

impl SourceKind {
    pub fn schema(self) -> SourceSchema {
        match self {
            SourceKind::Global => SourceSchema::GLOBAL,
            SourceKind::Regional => SourceSchema::REGIONAL,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Global => "Global CSV",
            SourceKind::Regional => "Regional CSV",
        }
    }
}

/// User settings for the dashboard
#[derive(Clone)]
pub struct UserSettings {
    pub page: Page,
    pub metric: Metric,
    pub global_source: PathBuf,
    pub regional_source: PathBuf,
}

/// Left side control panel with source selection and chart controls.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub entities: Vec<String>,
    pub selected_entities: Vec<bool>,
    pub entity_filter: String,
    pub progress: f32,
    pub status: String,
    default_entities: Vec<String>,
    entities_source: Option<SourceKind>,
    remembered: HashMap<SourceKind, Vec<String>>,
}

impl ControlPanel {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            settings: UserSettings {
                page: Page::default(),
                metric: Metric::default(),
                global_source: config.global_source.clone(),
                regional_source: config.regional_source.clone(),
            },
            entities: Vec::new(),
            selected_entities: Vec::new(),
            entity_filter: String::new(),
            progress: 0.0,
            status: "Ready".to_string(),
            default_entities: config.default_entities.clone(),
            entities_source: None,
            remembered: HashMap::new(),
        }
    }

    pub fn source_path(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::Global => &self.settings.global_source,
            SourceKind::Regional => &self.settings.regional_source,
        }
    }

    pub fn set_source_path(&mut self, kind: SourceKind, path: PathBuf) {
        match kind {
            SourceKind::Global => self.settings.global_source = path,
            SourceKind::Regional => self.settings.regional_source = path,
        }
    }

    /// Whether data loaded from `path` as `kind` belongs on the current page.
    pub fn is_current_source(&self, kind: SourceKind, path: &Path) -> bool {
        self.settings.page.source() == kind && self.source_path(kind) == path
    }

    /// Swap in the entity list of `kind`, restoring that source's previous
    /// selection or falling back to the configured defaults.
    pub fn update_entities(&mut self, kind: SourceKind, entities: Vec<String>) {
        if let Some(previous) = self.entities_source {
            let selected = self.get_selected_entities();
            self.remembered.insert(previous, selected);
        }

        let wanted = self
            .remembered
            .get(&kind)
            .unwrap_or(&self.default_entities);
        self.selected_entities = entities.iter().map(|e| wanted.contains(e)).collect();
        self.entities = entities;
        self.entities_source = Some(kind);
    }

    /// Get selected entities in list order
    pub fn get_selected_entities(&self) -> Vec<String> {
        self.entities
            .iter()
            .zip(self.selected_entities.iter())
            .filter(|(_, &selected)| selected)
            .map(|(entity, _)| entity.clone())
            .collect()
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📈 Case Trends")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Page Section =====
        ui.label(RichText::new("Choose a dataset").size(14.0).strong());
        ui.add_space(5.0);
        ComboBox::from_id_salt("page")
            .width(200.0)
            .selected_text(self.settings.page.label())
            .show_ui(ui, |ui| {
                for page in Page::ALL {
                    if ui
                        .selectable_label(self.settings.page == page, page.label())
                        .clicked()
                        && self.settings.page != page
                    {
                        self.settings.page = page;
                        action = ControlPanelAction::PageChanged;
                    }
                }
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Sources").size(14.0).strong());
        ui.add_space(5.0);

        for kind in [SourceKind::Global, SourceKind::Regional] {
            egui::Frame::none()
                .fill(ui.visuals().widgets.noninteractive.bg_fill)
                .rounding(5.0)
                .inner_margin(8.0)
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let file_name = self
                            .source_path(kind)
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_else(|| "No file selected".to_string());

                        ui.vertical(|ui| {
                            ui.label(RichText::new(kind.label()).size(11.0).color(Color32::GRAY));
                            ui.label(RichText::new(&file_name).size(12.0));
                        });

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("📂 Browse").clicked() {
                                action = ControlPanelAction::BrowseSource(kind);
                            }
                        });
                    });
                });
            ui.add_space(4.0);
        }

        ui.vertical_centered(|ui| {
            if ui.button("⟳ Reload Sources").clicked() {
                action = ControlPanelAction::Reload;
            }
        });

        if self.settings.page.is_chart() {
            ui.add_space(15.0);
            ui.separator();
            ui.add_space(10.0);
            self.show_chart_controls(ui, &mut action);
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Loaded") || self.status.contains("exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    fn show_chart_controls(&mut self, ui: &mut egui::Ui, action: &mut ControlPanelAction) {
        // ===== Entity Section =====
        ui.label(RichText::new("Select entities to display").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.label("Filter:");
            ui.text_edit_singleline(&mut self.entity_filter);
        });

        let filter = self.entity_filter.to_lowercase();
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                    for (i, entity) in self.entities.iter().enumerate() {
                        if !filter.is_empty() && !entity.to_lowercase().contains(&filter) {
                            continue;
                        }
                        if i < self.selected_entities.len() {
                            ui.checkbox(&mut self.selected_entities[i], entity);
                        }
                    }
                });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.selected_entities.iter_mut().for_each(|v| *v = true);
            }
            if ui.small_button("Clear All").clicked() {
                self.selected_entities.iter_mut().for_each(|v| *v = false);
            }
        });

        ui.add_space(10.0);

        // ===== Metric Section =====
        ui.label(RichText::new("Select variable to display").size(14.0).strong());
        ui.add_space(5.0);
        ComboBox::from_id_salt("metric")
            .width(200.0)
            .selected_text(self.settings.metric.label())
            .show_ui(ui, |ui| {
                for metric in Metric::ALL {
                    if ui
                        .selectable_label(self.settings.metric == metric, metric.label())
                        .clicked()
                    {
                        self.settings.metric = metric;
                    }
                }
            });

        ui.add_space(10.0);
        ui.vertical_centered(|ui| {
            let has_selection = self.selected_entities.iter().any(|&s| s);
            ui.add_enabled_ui(has_selection, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    *action = ControlPanelAction::ExportPng;
                }
            });
        });
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    PageChanged,
    BrowseSource(SourceKind),
    Reload,
    ExportPng,
}
