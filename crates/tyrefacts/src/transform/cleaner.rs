//! Row cleaning: configured column drops, aggregate-row removal and basic
//! text normalization.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::CleaningConfig;
use crate::error::Result;
use crate::input::DataTable;
use crate::schema::Value;

/// Literal strings that become missing once trimmed.
const NULL_LITERALS: &[&str] = &["nan", "None", ""];

/// What a cleaning pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanStats {
    pub rows_before: usize,
    pub rows_after: usize,
    pub aggregate_rows_removed: usize,
    pub empty_rows_removed: usize,
    pub columns_dropped: Vec<String>,
    /// Text cells turned into missing by normalization.
    pub cells_nulled: usize,
}

impl CleanStats {
    pub fn rows_removed(&self) -> usize {
        self.rows_before - self.rows_after
    }
}

/// A cleaned table with its statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub table: DataTable,
    pub stats: CleanStats,
}

/// Removes aggregate rows and normalizes cells.
#[derive(Debug, Clone)]
pub struct RowCleaner {
    columns_to_drop: Vec<String>,
    check_columns: Vec<String>,
    patterns: Vec<Regex>,
}

impl RowCleaner {
    /// Compile a cleaner. An invalid pattern is a configuration error.
    pub fn new<S: AsRef<str>>(
        columns_to_drop: &[S],
        total_patterns: &[S],
        check_columns: &[S],
    ) -> Result<Self> {
        let patterns = total_patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            columns_to_drop: columns_to_drop.iter().map(|s| s.as_ref().to_string()).collect(),
            check_columns: check_columns.iter().map(|s| s.as_ref().to_string()).collect(),
            patterns,
        })
    }

    pub fn from_config(config: &CleaningConfig) -> Result<Self> {
        let patterns: &[String] = if config.remove_total_rows {
            &config.total_patterns
        } else {
            &[]
        };
        Self::new(&config.columns_to_drop, patterns, &config.check_columns)
    }

    /// Clean a table. The input is never modified; an empty input comes back
    /// as-is with zeroed statistics.
    pub fn clean(&self, table: &DataTable) -> Cleaned {
        let mut stats = CleanStats {
            rows_before: table.row_count(),
            ..CleanStats::default()
        };

        if table.is_empty() {
            stats.rows_after = table.row_count();
            return Cleaned {
                table: table.clone(),
                stats,
            };
        }

        let mut table = self.drop_columns(table, &mut stats);
        table = self.remove_aggregate_rows(table, &mut stats);
        table = basic_cleaning(table, &mut stats);

        stats.rows_after = table.row_count();
        Cleaned { table, stats }
    }

    fn drop_columns(&self, table: &DataTable, stats: &mut CleanStats) -> DataTable {
        let keep: Vec<usize> = (0..table.column_count())
            .filter(|&i| !self.columns_to_drop.contains(&table.headers[i]))
            .collect();

        if keep.len() == table.column_count() {
            return table.clone();
        }

        stats.columns_dropped = table
            .headers
            .iter()
            .filter(|h| self.columns_to_drop.contains(h))
            .cloned()
            .collect();

        let headers = keep.iter().map(|&i| table.headers[i].clone()).collect();
        let rows = table
            .rows
            .iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();
        DataTable::new(headers, rows)
    }

    fn remove_aggregate_rows(&self, table: DataTable, stats: &mut CleanStats) -> DataTable {
        if self.patterns.is_empty() {
            return table;
        }

        let checked: Vec<usize> = self
            .check_columns
            .iter()
            .filter_map(|c| table.column_index(c))
            .collect();
        if checked.is_empty() {
            return table;
        }

        let before = table.row_count();
        let DataTable { headers, rows } = table;
        let rows: Vec<Vec<Value>> = rows
            .into_iter()
            .filter(|row| !checked.iter().any(|&i| self.is_aggregate(&row[i])))
            .collect();

        stats.aggregate_rows_removed = before - rows.len();
        DataTable { headers, rows }
    }

    fn is_aggregate(&self, cell: &Value) -> bool {
        if cell.is_missing() {
            return false;
        }
        let text = cell.to_string();
        self.patterns.iter().any(|p| p.is_match(&text))
    }
}

/// Drop fully-missing rows, then trim text and map null literals to missing.
fn basic_cleaning(table: DataTable, stats: &mut CleanStats) -> DataTable {
    let before = table.row_count();
    let DataTable { headers, rows } = table;

    let mut rows: Vec<Vec<Value>> = rows
        .into_iter()
        .filter(|row| !row.iter().all(Value::is_missing))
        .collect();
    stats.empty_rows_removed = before - rows.len();

    for cell in rows.iter_mut().flatten() {
        if let Value::Text(text) = cell {
            let trimmed = text.trim();
            if NULL_LITERALS.contains(&trimmed) {
                *cell = Value::Missing;
                stats.cells_nulled += 1;
            } else if trimmed.len() != text.len() {
                *cell = Value::Text(trimmed.to_string());
            }
        }
    }

    DataTable { headers, rows }
}
