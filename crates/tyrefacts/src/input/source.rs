//! Data source metadata and the in-memory table.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{ColumnType, Value};

/// Metadata about a loaded source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was read.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// Tabular data held in memory, row-major.
///
/// Every row has exactly `headers.len()` cells. Stages never mutate a table
/// they were handed; they build and return a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data (row-major order).
    pub rows: Vec<Vec<Value>>,
}

impl DataTable {
    /// Create a new data table. Short rows are padded with missing cells and
    /// long rows truncated so that the table stays rectangular.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Missing);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Build a table from string cells, typing each column at once.
    pub fn from_strings(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let na: Vec<String> = Vec::new();
        Self::from_raw(headers, rows, &na)
    }

    /// Build a table from raw strings.
    ///
    /// Cells that are empty or listed in `na_values` become missing. A column whose
    /// remaining cells all parse as numbers becomes numeric; otherwise every
    /// cell in it stays text, untouched.
    pub(crate) fn from_raw(headers: Vec<String>, rows: Vec<Vec<String>>, na_values: &[String]) -> Self {
        let width = headers.len();
        let mut typed: Vec<Vec<Value>> = rows
            .iter()
            .map(|_| Vec::with_capacity(width))
            .collect();

        for col in 0..width {
            let raw = rows.iter().map(|r| r.get(col).map(String::as_str).unwrap_or(""));
            let is_na = |s: &str| s.is_empty() || na_values.iter().any(|na| na == s);
            let numeric = raw
                .clone()
                .filter(|s| !is_na(*s))
                .all(|s| Value::parse_number(s).is_some());

            for (row_idx, cell) in raw.enumerate() {
                let value = if is_na(cell) {
                    Value::Missing
                } else if numeric {
                    Value::parse_number(cell).unwrap_or(Value::Missing)
                } else {
                    Value::Text(cell.to_string())
                };
                typed[row_idx].push(value);
            }
        }

        Self::new(headers, typed)
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// A table without rows counts as empty regardless of its header.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Cell lookup by column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.get(row, col)
    }

    /// Type of a column, derived from its cells.
    pub fn column_type(&self, index: usize) -> ColumnType {
        ColumnType::of(self.column_values(index))
    }

    /// Return a copy with `name` set to `value` on every row; the column is
    /// appended if absent and overwritten if present.
    pub fn with_constant_column(&self, name: &str, value: Value) -> DataTable {
        let mut table = self.clone();
        match table.column_index(name) {
            Some(idx) => {
                for row in &mut table.rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                table.headers.push(name.to_string());
                for row in &mut table.rows {
                    row.push(value.clone());
                }
            }
        }
        table
    }

    /// Stack tables vertically.
    ///
    /// The result has the union of all columns in order of first appearance;
    /// cells for columns a table does not have are missing.
    pub fn concat<'a>(tables: impl IntoIterator<Item = &'a DataTable>) -> DataTable {
        let tables: Vec<&DataTable> = tables.into_iter().collect();

        let mut headers: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for table in &tables {
            for header in &table.headers {
                if !positions.contains_key(header) {
                    positions.insert(header.clone(), headers.len());
                    headers.push(header.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(tables.iter().map(|t| t.row_count()).sum());
        for table in &tables {
            let targets: Vec<usize> = table.headers.iter().map(|h| positions[h]).collect();
            for row in &table.rows {
                let mut out = vec![Value::Missing; headers.len()];
                for (cell, &target) in row.iter().zip(&targets) {
                    out[target] = cell.clone();
                }
                rows.push(out);
            }
        }

        DataTable { headers, rows }
    }
}
