//! Fuzz target for the transformation chain.
//!
//! Arbitrary string tables go through cleaning, reshaping, the pivot and
//! validation. None of them may panic; each either transforms or skips.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tyrefacts::transform::{RowCleaner, pivot_facts, reshape_wide_to_long};
use tyrefacts::{ColumnRoles, DataTable, DateMapping, ValidationEngine};

#[derive(Debug, Arbitrary)]
struct Input {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    months: Vec<(String, String)>,
}

fuzz_target!(|input: Input| {
    if input.rows.len() > 500 || input.headers.len() > 40 {
        return;
    }

    let table = DataTable::from_strings(input.headers, input.rows);
    let cleaner = match RowCleaner::new::<&str>(&[], &[r"\.TOTAL", r"^TOTAL$"], &["Brand"]) {
        Ok(cleaner) => cleaner,
        Err(_) => return,
    };
    let cleaned = cleaner.clean(&table);
    assert!(cleaned.stats.rows_after <= cleaned.stats.rows_before);

    let mapping: DateMapping = input.months.into_iter().collect();
    let long = reshape_wide_to_long(&cleaned.table, &mapping).into_table();

    let roles = ColumnRoles::new(["Brand", "Date"], "Facts", "Value");
    let wide = pivot_facts(&long, &roles).into_table();

    let result = ValidationEngine::new().validate(&wide);
    assert_eq!(result.passed(), result.issues().is_empty());
});
