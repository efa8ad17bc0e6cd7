//! Shared result types for table transformations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::input::DataTable;

/// Why a transformation left its input unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// No column of the table is a key of the date mapping.
    NoMeasurementColumns,
    /// A column the transformation requires is absent.
    MissingColumn(String),
    /// The transformation failed part-way; nothing of it was kept.
    Failed(String),
    /// There were no rows to transform.
    EmptyInput,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoMeasurementColumns => write!(f, "no measurement columns found"),
            SkipReason::MissingColumn(col) => write!(f, "column '{}' not found", col),
            SkipReason::Failed(msg) => write!(f, "failed: {}", msg),
            SkipReason::EmptyInput => write!(f, "input is empty"),
        }
    }
}

/// Result of a transformation that may degrade to a no-op.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<S> {
    /// The transformation ran; `stats` describes what it did.
    Transformed { table: DataTable, stats: S },
    /// The transformation did not apply; `table` is the input, unchanged.
    Skipped { table: DataTable, reason: SkipReason },
}

impl<S> Outcome<S> {
    pub fn skipped(table: &DataTable, reason: SkipReason) -> Self {
        Outcome::Skipped {
            table: table.clone(),
            reason,
        }
    }

    pub fn table(&self) -> &DataTable {
        match self {
            Outcome::Transformed { table, .. } | Outcome::Skipped { table, .. } => table,
        }
    }

    pub fn into_table(self) -> DataTable {
        match self {
            Outcome::Transformed { table, .. } | Outcome::Skipped { table, .. } => table,
        }
    }

    pub fn stats(&self) -> Option<&S> {
        match self {
            Outcome::Transformed { stats, .. } => Some(stats),
            Outcome::Skipped { .. } => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Outcome::Skipped { reason, .. } => Some(reason),
            Outcome::Transformed { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_keeps_table() {
        let table = DataTable::from_strings(vec!["a".into()], vec![vec!["1".into()]]);
        let outcome: Outcome<()> = Outcome::skipped(&table, SkipReason::NoMeasurementColumns);

        assert!(outcome.is_skipped());
        assert!(outcome.stats().is_none());
        assert_eq!(outcome.skip_reason(), Some(&SkipReason::NoMeasurementColumns));
        assert_eq!(outcome.into_table(), table);
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(
            SkipReason::MissingColumn("Facts".into()).to_string(),
            "column 'Facts' not found"
        );
    }
}
