//! Selectable chart metrics and per-entity series extraction.

use crate::metrics::deriver::{EnrichedTable, MetricRow};

/// Metric shown on the trend chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    /// Cumulative count (`value`).
    #[default]
    Total,
    /// 7-day rolling average of the daily change (`daily_roll_avg`).
    DailyAverage,
    /// 7-day rolling average of the daily percentage change
    /// (`daily_pctchange_roll_avg`).
    GrowthRate,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Total, Metric::DailyAverage, Metric::GrowthRate];

    /// Selector label.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Total => "Total Confirmed Deaths",
            Metric::DailyAverage => "Deaths per Day",
            Metric::GrowthRate => "Daily Percentage Change",
        }
    }

    /// Enriched-table field the metric reads.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Total => "value",
            Metric::DailyAverage => "daily_roll_avg",
            Metric::GrowthRate => "daily_pctchange_roll_avg",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::Total => "COVID-19 Deaths - Total",
            Metric::DailyAverage => "Daily Confirmed Deaths (7 day rolling average)",
            Metric::GrowthRate => "Daily Confirmed Deaths Growth (%)",
        }
    }

    pub fn x_axis_label(self) -> &'static str {
        "Number of days since 10th death"
    }

    pub fn y_axis_label(self) -> &'static str {
        match self {
            Metric::Total => "Confirmed Deaths",
            Metric::DailyAverage => "Confirmed Daily Deaths",
            Metric::GrowthRate => "Rate Change (%)",
        }
    }

    /// Growth is plotted on a linear axis, the counts on a log axis.
    pub fn log_scale(self) -> bool {
        !matches!(self, Metric::GrowthRate)
    }

    pub fn value(self, row: &MetricRow) -> f64 {
        match self {
            Metric::Total => row.value as f64,
            Metric::DailyAverage => row.daily_roll_avg,
            Metric::GrowthRate => row.daily_pctchange_roll_avg,
        }
    }
}

/// One entity's `(days, metric value)` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub entity: String,
    pub points: Vec<(f64, f64)>,
}

/// Extract chart series for the selected entities, in selection order.
///
/// Entities without surviving rows are skipped.
pub fn collect_series(table: &EnrichedTable, entities: &[String], metric: Metric) -> Vec<Series> {
    entities
        .iter()
        .filter_map(|entity| {
            let points: Vec<(f64, f64)> = table
                .rows_for(entity)
                .map(|row| (row.days as f64, metric.value(row)))
                .collect();
            (!points.is_empty()).then(|| Series {
                entity: entity.clone(),
                points,
            })
        })
        .collect()
}
