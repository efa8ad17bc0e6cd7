//! Fact pivot: one column per distinct metric name, one row per identifier tuple.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::operations::{Outcome, SkipReason};
use crate::input::DataTable;
use crate::schema::{ColumnRoles, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotStats {
    pub rows_in: usize,
    pub rows_out: usize,
    /// Identifier columns that formed the key.
    pub identifier_columns: Vec<String>,
    /// Configured identifier columns absent from the table.
    pub missing_identifiers: Vec<String>,
    pub metric_columns: Vec<String>,
    /// Rows whose metric name was missing.
    pub rows_without_metric: usize,
    /// Rows with a missing cell in any identifier column.
    pub rows_without_key: usize,
    /// (key, metric) cells that received more than one value.
    pub summed_cells: usize,
}

/// Running sum that stays integral until a decimal shows up.
#[derive(Debug, Clone, Copy)]
enum Sum {
    Integer(i64),
    Decimal(f64),
}

impl Sum {
    fn add(self, value: &Value) -> Sum {
        match (self, value) {
            (Sum::Integer(a), Value::Integer(b)) => match a.checked_add(*b) {
                Some(total) => Sum::Integer(total),
                None => Sum::Decimal(a as f64 + *b as f64),
            },
            (Sum::Integer(a), Value::Decimal(b)) => Sum::Decimal(a as f64 + b),
            (Sum::Decimal(a), v) => Sum::Decimal(a + v.as_f64().unwrap_or(0.0)),
            (sum, _) => sum,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Sum::Integer(n) => Value::Integer(n),
            Sum::Decimal(f) => Value::Decimal(f),
        }
    }
}

#[derive(Debug, Default)]
struct Cell {
    sum: Option<Sum>,
    contributions: usize,
}

/// Pivot a long table by its metric-name column.
///
/// Values colliding on the same (identifier tuple, metric name) are summed.
/// A metric never observed for a tuple is missing in the output, not zero.
/// Rows with a missing identifier cell belong to no tuple and are dropped.
/// Any failure leaves the table unchanged, including a table with none of the
/// identifier columns and a metric name that clashes with an identifier.
pub fn pivot_facts(table: &DataTable, roles: &ColumnRoles) -> Outcome<PivotStats> {
    let Some(name_idx) = table.column_index(&roles.metric_name) else {
        return Outcome::skipped(table, SkipReason::MissingColumn(roles.metric_name.clone()));
    };
    let Some(value_idx) = table.column_index(&roles.metric_value) else {
        return Outcome::skipped(table, SkipReason::MissingColumn(roles.metric_value.clone()));
    };
    if table.is_empty() {
        return Outcome::skipped(table, SkipReason::EmptyInput);
    }

    let mut stats = PivotStats {
        rows_in: table.row_count(),
        ..PivotStats::default()
    };

    let mut key_columns: Vec<usize> = Vec::new();
    for column in &roles.identifiers {
        if column == &roles.metric_name || column == &roles.metric_value {
            continue;
        }
        match table.column_index(column) {
            Some(idx) => {
                key_columns.push(idx);
                stats.identifier_columns.push(column.clone());
            }
            None => stats.missing_identifiers.push(column.clone()),
        }
    }
    if key_columns.is_empty() {
        return Outcome::skipped(
            table,
            SkipReason::Failed(format!(
                "none of the identifier columns {:?} are present",
                roles.identifiers
            )),
        );
    }

    let mut groups: IndexMap<Vec<Value>, BTreeMap<String, Cell>> = IndexMap::new();
    let mut metrics: BTreeSet<String> = BTreeSet::new();

    for (row_idx, row) in table.rows.iter().enumerate() {
        let name = &row[name_idx];
        if name.is_missing() {
            stats.rows_without_metric += 1;
            continue;
        }
        let name = name.to_string();

        let value = &row[value_idx];
        let number = if value.is_missing() {
            None
        } else {
            match value.to_number() {
                Some(n) => Some(n),
                None => {
                    return Outcome::skipped(
                        table,
                        SkipReason::Failed(format!(
                            "non-numeric value '{}' in column '{}' at row {}",
                            value, roles.metric_value, row_idx
                        )),
                    );
                }
            }
        };

        if key_columns.iter().any(|&i| row[i].is_missing()) {
            stats.rows_without_key += 1;
            continue;
        }

        let key: Vec<Value> = key_columns.iter().map(|&i| row[i].clone()).collect();
        let cell = groups
            .entry(key)
            .or_default()
            .entry(name.clone())
            .or_default();
        metrics.insert(name);

        if let Some(number) = number {
            cell.sum = Some(match cell.sum {
                Some(sum) => sum.add(&number),
                None => match number {
                    Value::Integer(n) => Sum::Integer(n),
                    other => Sum::Decimal(other.as_f64().unwrap_or(0.0)),
                },
            });
            cell.contributions += 1;
        }
    }

    if let Some(clash) = metrics.iter().find(|m| stats.identifier_columns.contains(m)) {
        return Outcome::skipped(
            table,
            SkipReason::Failed(format!("metric '{}' clashes with an identifier column", clash)),
        );
    }

    stats.summed_cells = groups
        .values()
        .flat_map(|cells| cells.values())
        .filter(|c| c.contributions > 1)
        .count();
    stats.metric_columns = metrics.iter().cloned().collect();

    let mut headers = stats.identifier_columns.clone();
    headers.extend(metrics.iter().cloned());

    let rows: Vec<Vec<Value>> = groups
        .into_iter()
        .map(|(key, mut cells)| {
            let mut out = key;
            out.extend(metrics.iter().map(|m| {
                cells
                    .remove(m)
                    .and_then(|c| c.sum)
                    .map(Sum::into_value)
                    .unwrap_or(Value::Missing)
            }));
            out
        })
        .collect();

    stats.rows_out = rows.len();

    Outcome::Transformed {
        table: DataTable { headers, rows },
        stats,
    }
}
