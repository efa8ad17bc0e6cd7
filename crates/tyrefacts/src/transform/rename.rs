//! Column renaming from the configured mapping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::operations::{Outcome, SkipReason};
use crate::input::DataTable;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameStats {
    /// `(from, to)` pairs that were applied.
    pub renamed: Vec<(String, String)>,
}

/// Rename columns present in `table` according to `mapping`.
///
/// Names absent from the table are ignored. A rename that would produce a
/// duplicate header fails the whole step and leaves the table unchanged.
pub fn rename_columns(table: &DataTable, mapping: &IndexMap<String, String>) -> Outcome<RenameStats> {
    let mut headers = table.headers.clone();
    let mut stats = RenameStats::default();

    for header in headers.iter_mut() {
        if let Some(target) = mapping.get(header.as_str()) {
            if target != header {
                stats.renamed.push((header.clone(), target.clone()));
                *header = target.clone();
            }
        }
    }

    for (i, header) in headers.iter().enumerate() {
        if headers[..i].contains(header) {
            return Outcome::skipped(
                table,
                SkipReason::Failed(format!("rename produces duplicate column '{}'", header)),
            );
        }
    }

    Outcome::Transformed {
        table: DataTable {
            headers,
            rows: table.rows.clone(),
        },
        stats,
    }
}
