//! Chart Plotter Module
//! Interactive trend lines and the regional column map using egui_plot.

use case_trends::data::MapSnapshot;
use case_trends::metrics::Series;
use case_trends::Metric;
use egui::Color32;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(52, 152, 219), // Blue
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(121, 85, 72),  // Brown
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

/// Wistia ramp stops at 0, 0.25, 0.5, 0.75 and 1.
const WISTIA: [(u8, u8, u8); 5] = [
    (228, 255, 122),
    (255, 232, 26),
    (255, 189, 0),
    (255, 160, 0),
    (252, 127, 0),
];

/// Value at which the map colour ramp saturates.
pub const RAMP_SATURATION: f64 = 2000.0;

/// Tallest map column, in degrees of latitude.
const MAX_COLUMN_HEIGHT: f64 = 4.0;

/// Creates the dashboard's interactive charts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Get color for the n-th plotted series.
    pub fn get_series_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Map colour for a cumulative count.
    pub fn color_ramp(value: f64) -> Color32 {
        let t = if value.is_finite() {
            (value / RAMP_SATURATION).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let scaled = t * (WISTIA.len() - 1) as f64;
        let lower = (scaled.floor() as usize).min(WISTIA.len() - 2);
        let frac = scaled - lower as f64;

        let (r0, g0, b0) = WISTIA[lower];
        let (r1, g1, b1) = WISTIA[lower + 1];
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        Color32::from_rgb(mix(r0, r1), mix(g0, g1), mix(b0, b1))
    }

    /// Position of a metric value on the chart's y axis.
    ///
    /// Log-scaled metrics plot `log10(v)`; values that cannot be drawn
    /// (non-positive on a log axis, non-finite) yield `None`.
    pub fn axis_value(metric: Metric, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        if metric.log_scale() {
            (value > 0.0).then(|| value.log10())
        } else {
            Some(value)
        }
    }

    /// Tick label for an axis position.
    pub fn axis_label(log_scale: bool, axis_value: f64) -> String {
        if log_scale {
            format!("{:.0}", 10f64.powf(axis_value))
        } else {
            format!("{:.0}", axis_value)
        }
    }

    /// Draw one line per selected entity: days since threshold vs metric.
    pub fn draw_trend_chart(ui: &mut egui::Ui, series: &[Series], metric: Metric) {
        let log_scale = metric.log_scale();

        Plot::new(format!("trend_{}", metric.column()))
            .height(520.0)
            .legend(Legend::default())
            .x_axis_label(metric.x_axis_label())
            .y_axis_label(metric.y_axis_label())
            .y_axis_formatter(move |mark, _range| Self::axis_label(log_scale, mark.value))
            .label_formatter(move |name, value| {
                if name.is_empty() {
                    String::new()
                } else {
                    format!(
                        "{}\nday {:.0}: {}",
                        name,
                        value.x,
                        Self::axis_label(log_scale, value.y)
                    )
                }
            })
            .show(ui, |plot_ui| {
                for (idx, s) in series.iter().enumerate() {
                    let points: PlotPoints = s
                        .points
                        .iter()
                        .filter_map(|&(x, y)| Self::axis_value(metric, y).map(|y| [x, y]))
                        .collect();

                    plot_ui.line(
                        Line::new(points)
                            .color(Self::get_series_color(idx))
                            .width(2.0)
                            .name(&s.entity),
                    );
                }
            });
    }

    /// Draw the regional map: one vertical column per located row, height
    /// and colour following its value on `day`.
    pub fn draw_column_map(ui: &mut egui::Ui, snapshot: &MapSnapshot, day: usize) {
        let max_value = snapshot.max_value().max(1) as f64;

        Plot::new("column_map")
            .height(620.0)
            .data_aspect(1.0)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .label_formatter(|name, value| {
                if name.is_empty() {
                    format!("{:.2}, {:.2}", value.y, value.x)
                } else {
                    name.to_string()
                }
            })
            .show(ui, |plot_ui| {
                for (point, value) in snapshot.values_on(day) {
                    let color = Self::color_ramp(value as f64);
                    let height = value.max(0) as f64 / max_value * MAX_COLUMN_HEIGHT;

                    plot_ui.line(
                        Line::new(PlotPoints::from(vec![
                            [point.lon, point.lat],
                            [point.lon, point.lat + height],
                        ]))
                        .color(color)
                        .width(6.0)
                        .name(format!("{}\nDeaths: {}", point.label, value)),
                    );
                    plot_ui.points(
                        Points::new(vec![[point.lon, point.lat]])
                            .radius(3.0)
                            .color(color),
                    );
                }
            });
    }
}
