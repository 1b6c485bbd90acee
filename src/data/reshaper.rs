//! Data Reshaper Module
//! Transposes wide entity x date tables into tidy (entity, date, value) rows.

use crate::data::loader::WideTable;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReshapeError {
    #[error("Unparseable date column label '{label}'")]
    DateParse { label: String },
}

/// Accepted date-column label formats, tried in order.
///
/// `%y` must precede `%Y`: "1/22/20" would otherwise parse as year 20.
const DATE_FORMATS: [&str; 3] = ["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d"];

/// One observation in long form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TidyRow {
    pub entity: String,
    pub date: NaiveDate,
    pub value: i64,
}

/// Long-form table grouped by `group` (the entity field name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TidyTable {
    pub group: String,
    pub rows: Vec<TidyRow>,
}

impl TidyTable {
    pub fn new(group: impl Into<String>, rows: Vec<TidyRow>) -> Self {
        Self {
            group: group.into(),
            rows,
        }
    }

    pub fn rows(&self) -> &[TidyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse a wide-table column label such as `3/14/20` into a calendar date.
pub fn parse_date_label(label: &str) -> Result<NaiveDate, ReshapeError> {
    let trimmed = label.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ReshapeError::DateParse {
            label: label.to_string(),
        })
}

/// Transform a wide table to long format (melt operation).
///
/// Rows are emitted entity by entity, each in date-column order.
pub fn reshape(wide: &WideTable) -> Result<TidyTable, ReshapeError> {
    let dates = wide
        .date_labels()
        .iter()
        .map(|label| parse_date_label(label))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
        warn!(
            previous = %pair[0],
            next = %pair[1],
            "date columns are not in chronological order; rows will be re-sorted by date"
        );
    }

    let mut rows: Vec<TidyRow> = Vec::with_capacity(wide.len() * dates.len());
    for wide_row in wide.rows() {
        for (date, &value) in dates.iter().zip(&wide_row.values) {
            rows.push(TidyRow {
                entity: wide_row.entity.clone(),
                date: *date,
                value,
            });
        }
    }

    debug!(
        group = wide.entity_column(),
        entities = wide.len(),
        rows = rows.len(),
        "reshaped to long form"
    );

    Ok(TidyTable::new(wide.entity_column(), rows))
}
