//! Wide-to-long reshaping of period columns.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::operations::{Outcome, SkipReason};
use tracing::{info, warn};

use crate::input::DataTable;
use crate::schema::Value;

/// Name of the period column added by the reshape.
pub const DATE_COLUMN: &str = "Date";
/// Name of the measurement column added by the reshape.
pub const VALUE_COLUMN: &str = "Value";

/// Ordered mapping from literal period-column names (e.g. `JUN 24`) to
/// canonical date strings (e.g. `2024-06-01`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateMapping(IndexMap<String, String>);

impl DateMapping {
    pub fn new(entries: IndexMap<String, String>) -> Self {
        Self(entries)
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DateMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReshapeStats {
    pub rows_in: usize,
    pub rows_out: usize,
    pub measurement_columns: Vec<String>,
    pub identifier_columns: Vec<String>,
    /// Measurement cells not emitted because they were missing or zero.
    pub cells_dropped: usize,
}

/// Reshape period columns into `Date`/`Value` rows.
///
/// Every table column that is a key of `mapping` is a measurement column; all
/// others are identifiers and are copied unchanged onto each emitted row.
/// Missing and zero measurements produce no row.
pub fn reshape_wide_to_long(table: &DataTable, mapping: &DateMapping) -> Outcome<ReshapeStats> {
    let (measures, identifiers): (Vec<usize>, Vec<usize>) =
        (0..table.column_count()).partition(|&i| mapping.contains(&table.headers[i]));

    if measures.is_empty() {
        return Outcome::skipped(table, SkipReason::NoMeasurementColumns);
    }

    if let Some(&clash) = identifiers
        .iter()
        .find(|&&i| table.headers[i] == DATE_COLUMN || table.headers[i] == VALUE_COLUMN)
    {
        return Outcome::skipped(
            table,
            SkipReason::Failed(format!(
                "identifier column '{}' collides with a reshape output column",
                table.headers[clash]
            )),
        );
    }

    // Resolve each period once rather than per cell.
    let dates: Vec<Value> = measures
        .iter()
        .map(|&i| Value::from_date_str(mapping.get(&table.headers[i]).unwrap_or_default()))
        .collect();

    let mut headers: Vec<String> = identifiers.iter().map(|&i| table.headers[i].clone()).collect();
    headers.push(DATE_COLUMN.to_string());
    headers.push(VALUE_COLUMN.to_string());

    let mut rows = Vec::new();
    let mut cells_dropped = 0;

    for row in &table.rows {
        for (m, &col) in measures.iter().enumerate() {
            let cell = &row[col];
            if cell.is_missing() || cell.is_zero() {
                cells_dropped += 1;
                continue;
            }

            let mut out = Vec::with_capacity(headers.len());
            out.extend(identifiers.iter().map(|&i| row[i].clone()));
            out.push(dates[m].clone());
            out.push(cell.clone());
            rows.push(out);
        }
    }

    let stats = ReshapeStats {
        rows_in: table.row_count(),
        rows_out: rows.len(),
        measurement_columns: measures.iter().map(|&i| table.headers[i].clone()).collect(),
        identifier_columns: identifiers.iter().map(|&i| table.headers[i].clone()).collect(),
        cells_dropped,
    };

    Outcome::Transformed {
        table: DataTable { headers, rows },
        stats,
    }
}

/// Sanity check on a reshaped table: it has rows and carries both the
/// [`DATE_COLUMN`] and [`VALUE_COLUMN`].
pub fn validate_transformation(original: &DataTable, transformed: Option<&DataTable>) -> bool {
    let Some(transformed) = transformed.filter(|t| !t.is_empty()) else {
        warn!("reshaped table is empty");
        return false;
    };
    info!(
        rows_before = original.row_count(),
        columns_before = original.column_count(),
        rows_after = transformed.row_count(),
        columns_after = transformed.column_count(),
        "checking reshaped table"
    );

    let missing: Vec<&str> = [DATE_COLUMN, VALUE_COLUMN]
        .into_iter()
        .filter(|c| !transformed.has_column(c))
        .collect();
    if !missing.is_empty() {
        warn!(columns = ?missing, "reshaped table lacks key columns");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    fn mapping() -> DateMapping {
        [
            ("JUN 24", "2024-06-01"),
            ("JUL 24", "2024-07-01"),
            ("AUG 24", "2024-08-01"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_sparsity() {
        let table = DataTable::new(
            s(&["Brand", "JUN 24", "JUL 24", "AUG 24"]),
            vec![vec![
                Value::Text("A".into()),
                Value::Integer(100),
                Value::Integer(0),
                Value::Missing,
            ]],
        );

        let outcome = reshape_wide_to_long(&table, &mapping());
        let long = outcome.table();

        assert_eq!(long.headers, s(&["Brand", "Date", "Value"]));
        assert_eq!(long.row_count(), 1);
        assert_eq!(long.value(0, "Date").map(|v| v.to_string()), Some("2024-06-01".into()));
        assert_eq!(long.value(0, "Value"), Some(&Value::Integer(100)));

        let stats = outcome.stats().unwrap();
        assert_eq!(stats.cells_dropped, 2);
        assert_eq!(stats.measurement_columns, s(&["JUN 24", "JUL 24", "AUG 24"]));
    }

    #[test]
    fn test_text_zero_is_dropped() {
        let table = DataTable::new(
            s(&["Brand", "JUN 24", "JUL 24"]),
            vec![vec![
                Value::Text("A".into()),
                Value::Text("0.0".into()),
                Value::Text("7".into()),
            ]],
        );
        let long = reshape_wide_to_long(&table, &mapping()).into_table();
        assert_eq!(long.row_count(), 1);
        assert_eq!(long.value(0, "Value"), Some(&Value::Text("7".into())));
    }

    #[test]
    fn test_no_measurement_columns_is_identity() {
        let table = DataTable::from_strings(s(&["Brand", "SEP 24"]), vec![s(&["A", "5"])]);
        let outcome = reshape_wide_to_long(&table, &mapping());

        assert_eq!(outcome.skip_reason(), Some(&SkipReason::NoMeasurementColumns));
        assert_eq!(outcome.into_table(), table);
    }

    #[test]
    fn test_identifiers_keep_order_and_row_order_is_deterministic() {
        let table = DataTable::from_strings(
            s(&["JUN 24", "Brand", "JUL 24", "Season"]),
            vec![s(&["1", "A", "2", "Summer"]), s(&["3", "B", "", "Winter"])],
        );
        let long = reshape_wide_to_long(&table, &mapping()).into_table();

        assert_eq!(long.headers, s(&["Brand", "Season", "Date", "Value"]));
        let values: Vec<String> = long.column_values(3).map(|v| v.to_string()).collect();
        assert_eq!(values, s(&["1", "2", "3"]));
    }

    #[test]
    fn test_unparseable_mapping_target_stays_text() {
        let mapping: DateMapping = [("JUN 24", "June 2024")].into_iter().collect();
        let table = DataTable::from_strings(s(&["Brand", "JUN 24"]), vec![s(&["A", "4"])]);
        let long = reshape_wide_to_long(&table, &mapping).into_table();
        assert_eq!(long.value(0, "Date"), Some(&Value::Text("June 2024".into())));
    }

    #[test]
    fn test_output_column_collision_is_skipped() {
        let table = DataTable::from_strings(s(&["Value", "JUN 24"]), vec![s(&["x", "4"])]);
        let outcome = reshape_wide_to_long(&table, &mapping());
        assert!(matches!(outcome.skip_reason(), Some(SkipReason::Failed(_))));
    }

    #[test]
    fn test_validate_transformation() {
        let table = DataTable::from_strings(s(&["Brand", "JUN 24"]), vec![s(&["A", "4"])]);
        let long = reshape_wide_to_long(&table, &mapping()).into_table();

        assert!(validate_transformation(&table, Some(&long)));
        assert!(!validate_transformation(&table, Some(&DataTable::default())));
        assert!(!validate_transformation(&table, None));
        // Still wide: rows but no Date/Value columns.
        assert!(!validate_transformation(&table, Some(&table)));
    }
}
