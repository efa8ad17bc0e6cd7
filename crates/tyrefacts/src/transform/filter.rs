//! Row filters keyed by column name.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::input::DataTable;
use crate::schema::Value;

/// Condition a column's cells must satisfy.
///
/// In YAML a bare scalar is an equality test; a mapping takes any of `min`,
/// `max` and `values`, all of which must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterCondition {
    Criteria(FilterCriteria),
    Equals(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterCriteria {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub values: Option<Vec<Value>>,
}

impl FilterCondition {
    /// Missing cells never match; bounds only match numbers.
    pub fn matches(&self, cell: &Value) -> bool {
        if cell.is_missing() {
            return false;
        }
        match self {
            FilterCondition::Equals(expected) => same_value(cell, expected),
            FilterCondition::Criteria(criteria) => {
                let number = cell.to_number().and_then(|n| n.as_f64());
                if let Some(min) = criteria.min {
                    if !number.is_some_and(|n| n >= min) {
                        return false;
                    }
                }
                if let Some(max) = criteria.max {
                    if !number.is_some_and(|n| n <= max) {
                        return false;
                    }
                }
                match &criteria.values {
                    Some(allowed) => allowed.iter().any(|v| same_value(cell, v)),
                    None => true,
                }
            }
        }
    }
}

/// Equality that lets `2` match `2.0` and a date match its ISO text.
fn same_value(cell: &Value, expected: &Value) -> bool {
    if cell == expected {
        return true;
    }
    match (cell.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => cell.to_string() == expected.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub rows_before: usize,
    pub rows_after: usize,
    /// Configured columns the table does not have; their filters were ignored.
    pub missing_columns: Vec<String>,
}

/// Keep the rows that satisfy every filter whose column exists.
pub fn filter_rows(
    table: &DataTable,
    filters: &IndexMap<String, FilterCondition>,
) -> (DataTable, FilterStats) {
    let mut stats = FilterStats {
        rows_before: table.row_count(),
        ..FilterStats::default()
    };

    let mut active: Vec<(usize, &FilterCondition)> = Vec::new();
    for (column, condition) in filters {
        match table.column_index(column) {
            Some(idx) => active.push((idx, condition)),
            None => {
                warn!(column = %column, "filter column not found");
                stats.missing_columns.push(column.clone());
            }
        }
    }

    let rows: Vec<Vec<Value>> = table
        .rows
        .iter()
        .filter(|row| active.iter().all(|(idx, cond)| cond.matches(&row[*idx])))
        .cloned()
        .collect();
    stats.rows_after = rows.len();

    if stats.rows_after < stats.rows_before {
        info!(before = stats.rows_before, after = stats.rows_after, "rows filtered");
    }
    (DataTable::new(table.headers.clone(), rows), stats)
}
