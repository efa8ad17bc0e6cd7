//! Property-based tests for the tyrefacts transformations.
//!
//! These tests generate random wide and long tables and check the
//! invariants each stage promises, whatever the input.
//!
//! ```bash
//! cargo test -p tyrefacts --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p tyrefacts --test property_tests
//! ```

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use tyrefacts::transform::{RowCleaner, pivot_facts, reshape_wide_to_long};
use tyrefacts::{ColumnRoles, DataTable, DateMapping, Outcome, ValidationEngine, Value};

const MONTHS: &[(&str, &str)] = &[
    ("JAN 24", "2024-01-01"),
    ("FEB 24", "2024-02-01"),
    ("MAR 24", "2024-03-01"),
];

// =============================================================================
// Test Strategies
// =============================================================================

fn brand() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Alpha".to_string()),
        Just("Beta".to_string()),
        Just("Gamma".to_string()),
        Just("Beta.TOTAL".to_string()),
        Just("TOTAL".to_string()),
    ]
}

fn fact() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("SALES UNITS".to_string()),
        Just("SALES VALUE EUR".to_string()),
        Just("PRICE EUR".to_string()),
    ]
}

/// A measurement cell: missing, zero, or a small integer.
fn measurement() -> impl Strategy<Value = Value> {
    prop_oneof![
        1 => Just(Value::Missing),
        1 => Just(Value::Integer(0)),
        4 => (-500i64..500).prop_map(Value::Integer),
    ]
}

/// Wide table: Brand, Facts, then one column per month.
fn wide_table() -> impl Strategy<Value = DataTable> {
    prop::collection::vec(
        (brand(), fact(), prop::collection::vec(measurement(), MONTHS.len())),
        0..30,
    )
    .prop_map(|rows| {
        let mut headers = vec!["Brand".to_string(), "Facts".to_string()];
        headers.extend(MONTHS.iter().map(|(m, _)| m.to_string()));
        let rows = rows
            .into_iter()
            .map(|(b, f, cells)| {
                let mut row = vec![Value::Text(b), Value::Text(f)];
                row.extend(cells);
                row
            })
            .collect();
        DataTable::new(headers, rows)
    })
}

/// Long table: Brand, Facts, Value.
fn long_table() -> impl Strategy<Value = DataTable> {
    prop::collection::vec((brand(), fact(), -1000i64..1000), 1..40).prop_map(|rows| {
        DataTable::new(
            vec!["Brand".into(), "Facts".into(), "Value".into()],
            rows.into_iter()
                .map(|(b, f, v)| vec![Value::Text(b), Value::Text(f), Value::Integer(v)])
                .collect(),
        )
    })
}

fn mapping() -> DateMapping {
    MONTHS.iter().map(|(m, d)| (m.to_string(), d.to_string())).collect()
}

fn roles() -> ColumnRoles {
    ColumnRoles::new(["Brand"], "Facts", "Value")
}

// =============================================================================
// Reshape
// =============================================================================

proptest! {
    #[test]
    fn reshape_emits_one_row_per_nonzero_cell(table in wide_table()) {
        let expected = table
            .rows
            .iter()
            .flat_map(|row| row[2..].iter())
            .filter(|v| !v.is_missing() && !v.is_zero())
            .count();

        let outcome = reshape_wide_to_long(&table, &mapping());
        let long = outcome.table();

        prop_assert!(!outcome.is_skipped());
        prop_assert_eq!(long.row_count(), expected);
        prop_assert_eq!(&long.headers, &vec!["Brand", "Facts", "Date", "Value"]);

        let dates: BTreeSet<String> = MONTHS.iter().map(|(_, d)| d.to_string()).collect();
        for row in &long.rows {
            prop_assert!(dates.contains(&row[2].to_string()));
            prop_assert!(!row[3].is_missing());
            prop_assert!(!row[3].is_zero());
        }
    }

    #[test]
    fn reshape_without_mapping_is_identity(table in wide_table()) {
        let outcome = reshape_wide_to_long(&table, &DateMapping::default());
        prop_assert!(outcome.is_skipped());
        prop_assert_eq!(outcome.table(), &table);
    }
}

// =============================================================================
// Pivot
// =============================================================================

proptest! {
    #[test]
    fn pivot_preserves_totals_per_metric(table in long_table()) {
        let mut input_totals: BTreeMap<String, i64> = BTreeMap::new();
        for row in &table.rows {
            *input_totals.entry(row[1].to_string()).or_default() += row[2].as_f64().unwrap() as i64;
        }

        let outcome = pivot_facts(&table, &roles());
        let Outcome::Transformed { table: wide, stats } = outcome else {
            return Err(TestCaseError::fail("pivot skipped"));
        };

        let metrics: Vec<String> = input_totals.keys().cloned().collect();
        prop_assert_eq!(&stats.metric_columns, &metrics);

        let mut expected_headers = vec!["Brand".to_string()];
        expected_headers.extend(metrics.iter().cloned());
        prop_assert_eq!(&wide.headers, &expected_headers);

        for (offset, metric) in metrics.iter().enumerate() {
            let total: i64 = wide
                .rows
                .iter()
                .filter_map(|row| row[1 + offset].as_f64())
                .map(|f| f as i64)
                .sum();
            prop_assert_eq!(total, input_totals[metric], "metric {}", metric);
        }
    }

    #[test]
    fn pivot_keys_are_unique(table in long_table()) {
        let wide = pivot_facts(&table, &roles()).into_table();
        let brands: Vec<&Value> = wide.rows.iter().map(|r| &r[0]).collect();
        let distinct: BTreeSet<String> = brands.iter().map(|v| v.to_string()).collect();
        prop_assert_eq!(brands.len(), distinct.len());
    }
}

// =============================================================================
// Cleaning
// =============================================================================

proptest! {
    #[test]
    fn cleaning_never_adds_rows_and_removes_aggregates(table in wide_table()) {
        let cleaner = RowCleaner::new::<&str>(&[], &[r"\.TOTAL", r"^TOTAL$"], &["Brand"]).unwrap();
        let cleaned = cleaner.clean(&table);

        prop_assert!(cleaned.stats.rows_after <= cleaned.stats.rows_before);
        prop_assert_eq!(cleaned.table.row_count(), cleaned.stats.rows_after);
        prop_assert_eq!(
            cleaned.stats.rows_before - cleaned.stats.rows_after,
            cleaned.stats.rows_removed()
        );
        for row in &cleaned.table.rows {
            let brand = row[0].to_string();
            prop_assert!(!brand.contains(".TOTAL") && brand != "TOTAL");
        }
    }

    #[test]
    fn cleaning_is_idempotent(table in wide_table()) {
        let cleaner = RowCleaner::new::<&str>(&[], &[r"\.TOTAL", r"^TOTAL$"], &["Brand"]).unwrap();
        let once = cleaner.clean(&table).table;
        let twice = cleaner.clean(&once).table;
        prop_assert_eq!(once, twice);
    }
}

// =============================================================================
// Validation
// =============================================================================

proptest! {
    #[test]
    fn validation_passes_exactly_when_no_issues(table in wide_table()) {
        let result = ValidationEngine::new().validate(&table);
        prop_assert_eq!(result.passed(), result.issues().is_empty());
        prop_assert_eq!(result.total_rows(), table.row_count());
        prop_assert_eq!(result.total_columns(), table.column_count());
    }
}
