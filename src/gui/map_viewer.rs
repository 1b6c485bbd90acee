//! Map Viewer Widget
//! Regional column map with a day slider.

use crate::charts::ChartPlotter;
use crate::gui::Page;
use case_trends::data::MapSnapshot;
use egui::{Color32, RichText};

#[derive(Default)]
pub struct MapViewer {
    snapshot: Option<MapSnapshot>,
    day: usize,
}

impl MapViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Replace the snapshot; the slider moves to its latest day.
    pub fn set_snapshot(&mut self, snapshot: MapSnapshot) {
        self.day = snapshot.day_count().saturating_sub(1);
        self.snapshot = Some(snapshot);
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
        self.day = 0;
    }

    pub fn show(&mut self, ui: &mut egui::Ui, page: Page) {
        let Some(snapshot) = &self.snapshot else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ui.label(RichText::new(page.title()).size(22.0).strong());
        if snapshot.day_count() == 0 || snapshot.points.is_empty() {
            ui.label(RichText::new("No located rows to map").color(Color32::GRAY));
            return;
        }

        let last_day = snapshot.day_count() - 1;
        ui.horizontal(|ui| {
            ui.label("Day:");
            ui.add(egui::Slider::new(&mut self.day, 0..=last_day).show_value(false));
            if let Some(label) = snapshot.date_label(self.day) {
                ui.label(RichText::new(label).strong());
            }
        });
        if let Some(label) = snapshot.date_label(self.day) {
            ui.label(RichText::new(format!("{} as of {label}", page.subtitle())).size(16.0));
        }
        ui.label(
            RichText::new(format!("{} located rows", snapshot.points.len()))
                .size(11.0)
                .color(Color32::GRAY),
        );
        ui.add_space(8.0);

        ChartPlotter::draw_column_map(ui, snapshot, self.day);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use case_trends::data::MapPoint;

    #[test]
    fn new_snapshot_starts_on_latest_day() {
        let mut viewer = MapViewer::new();
        viewer.set_snapshot(MapSnapshot {
            date_labels: vec!["3/1/20".into(), "3/2/20".into(), "3/3/20".into()],
            points: vec![MapPoint {
                label: "Wales, United Kingdom".into(),
                lat: 52.13,
                lon: -3.78,
                values: vec![1, 4, 9],
            }],
        });
        assert_eq!(viewer.day, 2);

        viewer.set_snapshot(MapSnapshot::default());
        assert_eq!(viewer.day, 0);
        assert!(viewer.has_snapshot());

        viewer.clear();
        assert!(!viewer.has_snapshot());
    }
}
