//! Missing-value handling and outlier detection on a cleaned table.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::input::DataTable;
use crate::schema::{ColumnType, Value};

/// Text written into non-numeric cells by [`MissingStrategy::Fill`].
pub const FILL_TEXT: &str = "Unknown";

/// What to do with missing cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Count them and leave the table as it is.
    #[default]
    Report,
    /// Remove every row holding at least one missing cell.
    Drop,
    /// Zero in numeric columns, [`FILL_TEXT`] elsewhere.
    Fill,
}

impl fmt::Display for MissingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingStrategy::Report => "report",
            MissingStrategy::Drop => "drop",
            MissingStrategy::Fill => "fill",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingStats {
    pub total_missing: usize,
    /// Columns with at least one missing cell, in table order.
    pub missing_by_column: IndexMap<String, usize>,
    pub rows_dropped: usize,
    pub cells_filled: usize,
}

/// Apply `strategy` to every missing cell of `table`.
pub fn handle_missing_values(
    table: &DataTable,
    strategy: MissingStrategy,
) -> (DataTable, MissingStats) {
    let mut stats = MissingStats::default();
    for (idx, header) in table.headers.iter().enumerate() {
        let count = table.column_values(idx).filter(|v| v.is_missing()).count();
        if count > 0 {
            stats.missing_by_column.insert(header.clone(), count);
            stats.total_missing += count;
        }
    }

    if stats.total_missing == 0 {
        return (table.clone(), stats);
    }
    info!(
        strategy = %strategy,
        missing = stats.total_missing,
        columns = stats.missing_by_column.len(),
        "missing values found"
    );

    let out = match strategy {
        MissingStrategy::Report => table.clone(),
        MissingStrategy::Drop => {
            let rows: Vec<Vec<Value>> = table
                .rows
                .iter()
                .filter(|row| !row.iter().any(Value::is_missing))
                .cloned()
                .collect();
            stats.rows_dropped = table.row_count() - rows.len();
            DataTable::new(table.headers.clone(), rows)
        }
        MissingStrategy::Fill => {
            let fills: Vec<Value> = (0..table.column_count())
                .map(|idx| match table.column_type(idx) {
                    ColumnType::Integer => Value::Integer(0),
                    ColumnType::Decimal => Value::Decimal(0.0),
                    _ => Value::Text(FILL_TEXT.to_string()),
                })
                .collect();
            let mut filled = table.clone();
            for row in &mut filled.rows {
                for (cell, fill) in row.iter_mut().zip(&fills) {
                    if cell.is_missing() {
                        *cell = fill.clone();
                        stats.cells_filled += 1;
                    }
                }
            }
            filled
        }
    };

    (out, stats)
}

/// Interquartile-range outlier statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierInfo {
    pub count: usize,
    /// Share of all rows, missing cells included.
    pub percentage: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub min_outlier: Option<f64>,
    pub max_outlier: Option<f64>,
}

/// Flag values outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`.
///
/// With `columns` unset every numeric column is checked. Named columns that
/// are absent, non-numeric or fully missing are left out of the result.
pub fn detect_outliers(
    table: &DataTable,
    columns: Option<&[String]>,
) -> IndexMap<String, OutlierInfo> {
    let selected: Vec<usize> = match columns {
        Some(names) => names.iter().filter_map(|c| table.column_index(c)).collect(),
        None => (0..table.column_count()).collect(),
    };

    let mut result = IndexMap::new();
    for idx in selected {
        if !table.column_type(idx).is_numeric() {
            continue;
        }
        let mut values: Vec<f64> = table.column_values(idx).filter_map(Value::as_f64).collect();
        if values.is_empty() {
            continue;
        }
        values.sort_by(f64::total_cmp);

        let q1 = quantile(&values, 0.25);
        let q3 = quantile(&values, 0.75);
        let iqr = q3 - q1;
        let lower_bound = q1 - 1.5 * iqr;
        let upper_bound = q3 + 1.5 * iqr;

        let outliers: Vec<f64> = values
            .iter()
            .copied()
            .filter(|&v| v < lower_bound || v > upper_bound)
            .collect();

        let info = OutlierInfo {
            count: outliers.len(),
            percentage: outliers.len() as f64 / table.row_count() as f64 * 100.0,
            lower_bound,
            upper_bound,
            min_outlier: outliers.first().copied(),
            max_outlier: outliers.last().copied(),
        };
        if info.count > 0 {
            info!(column = %table.headers[idx], count = info.count, "outliers detected");
        }
        result.insert(table.headers[idx].clone(), info);
    }
    result
}

/// Linear-interpolated quantile of sorted, non-empty values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
