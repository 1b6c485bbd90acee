//! Static Chart Renderer
//! Renders the trend chart to PNG bytes for export.
//!
//! Layout matches the interactive chart: metric title, one coloured line per
//! entity (same palette order), legend in the upper left, log y-axis ticks
//! labelled with counts.

use crate::charts::ChartPlotter;
use case_trends::metrics::Series;
use case_trends::Metric;
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No drawable series to render")]
    Empty,
    #[error("Chart drawing failed: {0}")]
    Draw(String),
    #[error("Bitmap buffer does not match {0}x{1}")]
    Buffer(u32, u32),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Series already mapped onto axis coordinates.
type AxisSeries = (String, Vec<(f64, f64)>);

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the trend chart for `series` into an in-memory PNG.
    pub fn render_trend_png(
        series: &[Series],
        metric: Metric,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let plotted: Vec<AxisSeries> = series
            .iter()
            .map(|s| {
                let points = s
                    .points
                    .iter()
                    .filter_map(|&(x, y)| ChartPlotter::axis_value(metric, y).map(|y| (x, y)))
                    .collect();
                (s.entity.clone(), points)
            })
            .filter(|(_, points): &AxisSeries| !points.is_empty())
            .collect();
        if plotted.is_empty() {
            return Err(RenderError::Empty);
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        Self::draw(&mut buffer, width, height, &plotted, metric)
            .map_err(|e| RenderError::Draw(e.to_string()))?;

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or(RenderError::Buffer(width, height))?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Axis bounds `(x_max, y_min, y_max)` with a little headroom.
    fn bounds(plotted: &[AxisSeries]) -> (f64, f64, f64) {
        let mut x_max = 1.0f64;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for (_, points) in plotted {
            for &(x, y) in points {
                x_max = x_max.max(x);
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
        }
        let pad = ((y_max - y_min) * 0.05).max(0.5);
        (x_max, (y_min - pad).floor(), (y_max + pad).ceil())
    }

    fn draw(
        buffer: &mut [u8],
        width: u32,
        height: u32,
        plotted: &[AxisSeries],
        metric: Metric,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::with_buffer(buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let log_scale = metric.log_scale();
        let (x_max, y_min, y_max) = Self::bounds(plotted);

        let mut chart = ChartBuilder::on(&root)
            .caption(metric.title(), ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc(metric.x_axis_label())
            .y_desc(metric.y_axis_label())
            .y_label_formatter(&|v| ChartPlotter::axis_label(log_scale, *v))
            .draw()?;

        for (idx, (name, points)) in plotted.iter().enumerate() {
            let c = ChartPlotter::get_series_color(idx);
            let color = RGBColor(c.r(), c.g(), c.b());
            chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
                .label(name.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}
