//! Validation result types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

/// Missing-value statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingStats {
    pub count: usize,
    /// Percent of all rows, 0-100.
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletenessSummary {
    /// Columns with at least one missing value.
    pub missing_values: IndexMap<String, MissingStats>,
    pub empty_rows: usize,
    pub duplicate_rows: usize,
}

/// Outcome of the price × units ≈ value check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConsistencySummary {
    /// One or more of the three columns is absent.
    Unavailable { missing_columns: Vec<String> },
    /// The columns exist but no row has all three values.
    NoRows,
    Checked(ConsistencyStats),
}

impl ConsistencySummary {
    /// Consistency rate in percent, when rows were checked.
    pub fn rate(&self) -> Option<f64> {
        match self {
            ConsistencySummary::Checked(stats) => Some(stats.consistency_rate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyStats {
    pub rows_checked: usize,
    pub consistent_rows: usize,
    pub inconsistent_rows: usize,
    /// Rows whose difference exceeds the large-difference threshold.
    pub large_differences: usize,
    /// Percent, 0-100.
    pub consistency_rate: f64,
    pub max_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeColumn {
    pub count: usize,
    /// Percent of all rows, 0-100.
    pub percentage: f64,
    /// Minimum of the whole column.
    pub min_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NegativeSummary {
    pub columns_with_negatives: IndexMap<String, NegativeColumn>,
    /// Distinct rows with a negative value in any column.
    pub total_negative_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTypeInfo {
    pub dtype: ColumnType,
    pub null_count: usize,
    pub distinct_count: usize,
}

/// Diagnostics for one table.
///
/// Built once by [`super::ValidationEngine`]; there are no mutating methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    total_rows: usize,
    total_columns: usize,
    completeness: CompletenessSummary,
    consistency: Option<ConsistencySummary>,
    negative_values: Option<NegativeSummary>,
    data_types: IndexMap<String, ColumnTypeInfo>,
    issues: Vec<String>,
}

impl ValidationResult {
    pub(crate) fn new(
        total_rows: usize,
        total_columns: usize,
        completeness: CompletenessSummary,
        consistency: Option<ConsistencySummary>,
        negative_values: Option<NegativeSummary>,
        data_types: IndexMap<String, ColumnTypeInfo>,
        issues: Vec<String>,
    ) -> Self {
        Self {
            total_rows,
            total_columns,
            completeness,
            consistency,
            negative_values,
            data_types,
            issues,
        }
    }

    /// True when no check raised an issue.
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn total_columns(&self) -> usize {
        self.total_columns
    }

    pub fn completeness(&self) -> &CompletenessSummary {
        &self.completeness
    }

    /// `None` when the check was not enabled.
    pub fn consistency(&self) -> Option<&ConsistencySummary> {
        self.consistency.as_ref()
    }

    /// `None` when the check was not enabled.
    pub fn negative_values(&self) -> Option<&NegativeSummary> {
        self.negative_values.as_ref()
    }

    pub fn data_types(&self) -> &IndexMap<String, ColumnTypeInfo> {
        &self.data_types
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }
}
