//! Column-level helpers: the derived sales value and date normalization.

use chrono::{NaiveDate, NaiveDateTime};

use super::operations::{Outcome, SkipReason};
use crate::input::DataTable;
use crate::schema::{DATE_FORMAT, Value};

/// Column holding `price × units`.
pub const CALCULATED_VALUE_COLUMN: &str = "Calculated_Value";

/// Date layouts accepted besides the canonical one.
const DATE_LAYOUTS: &[&str] = &["%Y/%m/%d", "%d.%m.%Y", "%Y%m%d"];
const DATETIME_LAYOUTS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Append (or overwrite) [`CALCULATED_VALUE_COLUMN`] with `price × units`.
///
/// Rows where either factor is missing or not a number get a missing cell.
/// The stats are the number of rows that received a product.
pub fn add_calculated_value(
    table: &DataTable,
    price_column: &str,
    units_column: &str,
) -> Outcome<usize> {
    let Some(price) = table.column_index(price_column) else {
        return Outcome::skipped(table, SkipReason::MissingColumn(price_column.to_string()));
    };
    let Some(units) = table.column_index(units_column) else {
        return Outcome::skipped(table, SkipReason::MissingColumn(units_column.to_string()));
    };

    let products: Vec<Value> = table
        .rows
        .iter()
        .map(|row| product(&row[price], &row[units]))
        .collect();
    let computed = products.iter().filter(|v| !v.is_missing()).count();

    let mut out = table.clone();
    let target = match out.column_index(CALCULATED_VALUE_COLUMN) {
        Some(idx) => idx,
        None => {
            out.headers.push(CALCULATED_VALUE_COLUMN.to_string());
            for row in &mut out.rows {
                row.push(Value::Missing);
            }
            out.headers.len() - 1
        }
    };
    for (row, value) in out.rows.iter_mut().zip(products) {
        row[target] = value;
    }

    Outcome::Transformed {
        table: out,
        stats: computed,
    }
}

fn product(a: &Value, b: &Value) -> Value {
    match (a.to_number(), b.to_number()) {
        (Some(Value::Integer(x)), Some(Value::Integer(y))) => match x.checked_mul(y) {
            Some(p) => Value::Integer(p),
            None => Value::Decimal(x as f64 * y as f64),
        },
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => Value::Decimal(x * y),
            _ => Value::Missing,
        },
        _ => Value::Missing,
    }
}

/// Convert every cell of `column` into a date.
///
/// Canonical `YYYY-MM-DD` text, a few common layouts and timestamps (time
/// dropped) are accepted. One cell that does not parse leaves the whole
/// table unchanged. The stats are the number of cells converted.
pub fn standardize_date_format(table: &DataTable, column: &str) -> Outcome<usize> {
    let Some(idx) = table.column_index(column) else {
        return Outcome::skipped(table, SkipReason::MissingColumn(column.to_string()));
    };

    let mut out = table.clone();
    let mut converted = 0;
    for (row_idx, row) in out.rows.iter_mut().enumerate() {
        let cell = &mut row[idx];
        match cell {
            Value::Missing | Value::Date(_) => {}
            other => match parse_date(&other.to_string()) {
                Some(date) => {
                    *other = Value::Date(date);
                    converted += 1;
                }
                None => {
                    return Outcome::skipped(
                        table,
                        SkipReason::Failed(format!(
                            "'{}' in column '{}' at row {} is not a date",
                            other, column, row_idx
                        )),
                    );
                }
            },
        }
    }

    Outcome::Transformed {
        table: out,
        stats: converted,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    std::iter::once(DATE_FORMAT)
        .chain(DATE_LAYOUTS.iter().copied())
        .find_map(|layout| NaiveDate::parse_from_str(raw, layout).ok())
        .or_else(|| {
            DATETIME_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
                .map(|dt| dt.date())
        })
}
