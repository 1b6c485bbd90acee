//! Metric Deriver Module
//! Thresholding, per-entity day offsets, daily changes and rolling averages.

use crate::data::{TidyRow, TidyTable};
use crate::metrics::rolling::{round_half_even, trailing_mean, ROLLING_WINDOW};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

/// Rows below this cumulative count are dropped before any derivation.
pub const THRESHOLD: i64 = 10;

/// Enriched tidy row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub entity: String,
    pub date: NaiveDate,
    pub value: i64,
    /// Days since the entity's first row at or above [`THRESHOLD`].
    pub days: i64,
    pub daily_change: i64,
    pub daily_pct_change: f64,
    pub daily_roll_avg: f64,
    pub daily_pctchange_roll_avg: f64,
}

/// Output of [`derive_metrics`]: entity groups in first-appearance order,
/// each sorted by date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnrichedTable {
    group: String,
    rows: Vec<MetricRow>,
}

impl EnrichedTable {
    /// Name of the grouping field the rows were derived over.
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    /// Entities with at least one surviving row, in table order.
    pub fn entities(&self) -> Vec<&str> {
        let mut entities: Vec<&str> = Vec::new();
        for row in &self.rows {
            if entities.last() != Some(&row.entity.as_str()) {
                entities.push(&row.entity);
            }
        }
        entities
    }

    pub fn rows_for<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a MetricRow> + 'a {
        self.rows.iter().filter(move |row| row.entity == entity)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Percentage change from `previous` to `current`.
///
/// Never fails: a zero denominator gives ±infinity, or `None` when the
/// result is NaN (no change from zero).
pub fn pct_change(previous: i64, current: i64) -> Option<f64> {
    let pct = (current - previous) as f64 / previous as f64 * 100.0;
    if pct.is_nan() {
        None
    } else {
        Some(pct)
    }
}

/// Derive daily metrics for every entity in a tidy table.
pub fn derive_metrics(tidy: &TidyTable) -> EnrichedTable {
    let mut groups: Vec<(&str, Vec<&TidyRow>)> = Vec::new();
    let mut group_index: HashMap<&str, usize> = HashMap::new();

    for row in tidy.rows().iter().filter(|row| row.value >= THRESHOLD) {
        let idx = *group_index.entry(row.entity.as_str()).or_insert_with(|| {
            groups.push((row.entity.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(row);
    }

    let mut rows = Vec::with_capacity(groups.iter().map(|(_, g)| g.len()).sum());
    for (entity, mut group_rows) in groups {
        group_rows.sort_by_key(|row| row.date);
        rows.extend(derive_group(entity, &group_rows));
    }

    debug!(
        group = %tidy.group,
        input_rows = tidy.len(),
        output_rows = rows.len(),
        "derived metrics"
    );

    EnrichedTable {
        group: tidy.group.clone(),
        rows,
    }
}

/// Metrics for one entity's date-sorted, already thresholded rows.
fn derive_group(entity: &str, rows: &[&TidyRow]) -> Vec<MetricRow> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    let changes: Vec<Option<i64>> = (0..rows.len())
        .map(|i| (i > 0).then(|| rows[i].value - rows[i - 1].value))
        .collect();
    let pct_changes: Vec<Option<f64>> = (0..rows.len())
        .map(|i| {
            if i == 0 {
                None
            } else {
                pct_change(rows[i - 1].value, rows[i].value)
            }
        })
        .collect();

    let change_inputs: Vec<Option<f64>> = changes.iter().map(|c| c.map(|v| v as f64)).collect();
    let change_avgs = trailing_mean(&change_inputs, ROLLING_WINDOW);
    let pct_avgs = trailing_mean(&pct_changes, ROLLING_WINDOW);

    // Fill runs last: leading gaps become 0, missing averages fall back to
    // the row's own filled value.
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let daily_change = changes[i].unwrap_or(0);
            let daily_pct_change = pct_changes[i].unwrap_or(0.0);
            MetricRow {
                entity: entity.to_string(),
                date: row.date,
                value: row.value,
                days: (row.date - first.date).num_days(),
                daily_change,
                daily_pct_change,
                daily_roll_avg: change_avgs[i]
                    .map(round_half_even)
                    .unwrap_or(daily_change as f64),
                daily_pctchange_roll_avg: pct_avgs[i]
                    .map(round_half_even)
                    .unwrap_or(daily_pct_change),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 1).unwrap() + chrono::Duration::days(offset)
    }

    fn tidy(series: &[(&str, Vec<i64>)]) -> TidyTable {
        let rows = series
            .iter()
            .flat_map(|(entity, values)| {
                values.iter().enumerate().map(move |(i, &value)| TidyRow {
                    entity: entity.to_string(),
                    date: day(i as i64),
                    value,
                })
            })
            .collect();
        TidyTable::new("Country/Region", rows)
    }

    #[test]
    fn drops_rows_below_threshold_before_counting_days() {
        let table = derive_metrics(&tidy(&[("A", vec![0, 3, 9, 10, 14, 20])]));

        assert_eq!(table.len(), 3);
        assert!(table.rows().iter().all(|r| r.value >= THRESHOLD));
        let first = &table.rows()[0];
        assert_eq!(first.date, day(3));
        assert_eq!(first.days, 0);
        assert_eq!(table.rows()[2].days, 2);
    }

    #[test]
    fn first_row_is_filled_with_zero() {
        let table = derive_metrics(&tidy(&[("A", vec![10, 15])]));
        let first = &table.rows()[0];

        assert_eq!(first.daily_change, 0);
        assert_eq!(first.daily_pct_change, 0.0);
        assert_eq!(first.daily_roll_avg, 0.0);
        assert_eq!(first.daily_pctchange_roll_avg, 0.0);
    }

    #[test]
    fn pct_change_of_ten_to_fifteen_is_fifty() {
        let table = derive_metrics(&tidy(&[("A", vec![10, 15])]));
        let second = &table.rows()[1];

        assert_eq!(second.daily_change, 5);
        assert_eq!(second.daily_pct_change, 50.0);
        assert_eq!(second.daily_pctchange_roll_avg, 50.0);
    }

    #[test]
    fn rolling_average_needs_seven_real_changes() {
        let values = [10, 12, 15, 20, 28, 40, 55, 75, 100, 130];
        let table = derive_metrics(&tidy(&[("A", values.to_vec())]));
        let rows = table.rows();

        // Index 6 still covers the undefined first change.
        assert_eq!(rows[6].daily_change, 15);
        assert_eq!(rows[6].daily_roll_avg, 15.0);
        assert_eq!(rows[6].daily_pctchange_roll_avg, rows[6].daily_pct_change);
        // mean(2, 3, 5, 8, 12, 15, 20) = 9.29
        assert_eq!(rows[7].daily_roll_avg, 9.0);
        // mean(3, 5, 8, 12, 15, 20, 25) = 12.57
        assert_eq!(rows[8].daily_roll_avg, 13.0);
        // mean(5, 8, 12, 15, 20, 25, 30) = 16.43
        assert_eq!(rows[9].daily_roll_avg, 16.0);
        // pct: 20, 25, 33.3, 40, 42.9, 37.5, 36.4 -> 33.6
        assert_eq!(rows[7].daily_pctchange_roll_avg, 34.0);
    }

    #[test]
    fn groups_do_not_leak_into_each_other() {
        let table = derive_metrics(&tidy(&[("A", vec![10, 20, 40]), ("B", vec![5, 50, 60])]));

        assert_eq!(table.entities(), vec!["A", "B"]);
        let b: Vec<&MetricRow> = table.rows_for("B").collect();
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].days, 0);
        assert_eq!(b[0].daily_change, 0);
        assert_eq!(b[1].daily_change, 10);
        assert_eq!(b[1].daily_pct_change, 20.0);
    }

    #[test]
    fn entities_never_reaching_threshold_are_absent() {
        let table = derive_metrics(&tidy(&[("A", vec![1, 2, 3]), ("B", vec![10])]));
        assert_eq!(table.entities(), vec!["B"]);
        assert_eq!(table.group(), "Country/Region");
    }

    #[test]
    fn rows_are_sorted_by_date_within_each_entity() {
        let mut input = tidy(&[("A", vec![10, 20, 30])]);
        input.rows.reverse();
        let table = derive_metrics(&input);

        let dates: Vec<NaiveDate> = table.rows().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(0), day(1), day(2)]);
        assert_eq!(table.rows()[2].daily_change, 10);
    }

    #[test]
    fn calendar_gaps_are_not_reinserted() {
        // A dip below threshold removes the middle row; day counts keep the gap.
        let table = derive_metrics(&tidy(&[("A", vec![10, 8, 12])]));
        let rows = table.rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].days, 2);
        assert_eq!(rows[1].daily_change, 2);
    }

    #[test]
    fn zero_denominator_does_not_panic() {
        assert_eq!(pct_change(0, 5), Some(f64::INFINITY));
        assert_eq!(pct_change(0, 0), None);
        assert_eq!(pct_change(20, 10), Some(-50.0));
    }
}
