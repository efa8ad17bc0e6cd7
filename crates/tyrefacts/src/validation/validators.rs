//! Data quality checks over a final table.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;

use crate::config::{ConsistencyConfig, NegativeValuesConfig, ValidationConfig};
use crate::input::DataTable;
use crate::schema::{ColumnType, Value};

use super::result::{
    ColumnTypeInfo, CompletenessSummary, ConsistencyStats, ConsistencySummary, MissingStats,
    NegativeColumn, NegativeSummary, ValidationResult,
};

/// Output of a single check.
#[derive(Debug, Clone, PartialEq)]
pub struct Checked<S> {
    pub summary: S,
    pub issues: Vec<String>,
}

impl<S> Checked<S> {
    fn new(summary: S) -> Self {
        Self {
            summary,
            issues: Vec::new(),
        }
    }
}

/// A check over a whole table.
pub trait Validator {
    type Summary;

    fn validate(&self, table: &DataTable) -> Checked<Self::Summary>;
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn number(value: &Value) -> Option<f64> {
    value.to_number().and_then(|v| v.as_f64())
}

/// Missing values, fully-empty rows and duplicate rows.
pub struct CompletenessValidator;

impl Validator for CompletenessValidator {
    type Summary = CompletenessSummary;

    fn validate(&self, table: &DataTable) -> Checked<CompletenessSummary> {
        let mut summary = CompletenessSummary::default();
        let rows = table.row_count();

        for (idx, name) in table.headers.iter().enumerate() {
            let count = table.column_values(idx).filter(|v| v.is_missing()).count();
            if count > 0 {
                summary.missing_values.insert(
                    name.clone(),
                    MissingStats {
                        count,
                        percentage: percent(count, rows),
                    },
                );
            }
        }

        summary.empty_rows = table
            .rows
            .iter()
            .filter(|row| row.iter().all(Value::is_missing))
            .count();

        let mut seen: HashSet<&Vec<Value>> = HashSet::with_capacity(rows);
        summary.duplicate_rows = table.rows.iter().filter(|row| !seen.insert(*row)).count();

        let mut checked = Checked::new(summary);
        if checked.summary.empty_rows > 0 {
            checked
                .issues
                .push(format!("{} fully empty rows", checked.summary.empty_rows));
        }
        if checked.summary.duplicate_rows > 0 {
            checked
                .issues
                .push(format!("{} duplicate rows", checked.summary.duplicate_rows));
        }
        checked
    }
}

/// Cross-checks `price × units` against the total value column.
#[derive(Debug, Clone)]
pub struct ConsistencyValidator {
    config: ConsistencyConfig,
}

impl ConsistencyValidator {
    pub fn new(config: ConsistencyConfig) -> Self {
        Self { config }
    }
}

impl Validator for ConsistencyValidator {
    type Summary = ConsistencySummary;

    fn validate(&self, table: &DataTable) -> Checked<ConsistencySummary> {
        let config = &self.config;
        let required = [&config.price_column, &config.units_column, &config.value_column];

        let missing_columns: Vec<String> = required
            .iter()
            .filter(|c| !table.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if !missing_columns.is_empty() {
            let issue = format!(
                "consistency check unavailable: missing columns {}",
                missing_columns.join(", ")
            );
            return Checked {
                summary: ConsistencySummary::Unavailable { missing_columns },
                issues: vec![issue],
            };
        }

        let indices: Vec<usize> = required
            .iter()
            .filter_map(|c| table.column_index(c))
            .collect();
        let (price, units, value) = (indices[0], indices[1], indices[2]);

        let differences: Vec<f64> = table
            .rows
            .iter()
            .filter_map(|row| {
                let p = number(&row[price])?;
                let u = number(&row[units])?;
                let v = number(&row[value])?;
                Some((p * u - v).abs())
            })
            .collect();

        if differences.is_empty() {
            return Checked {
                summary: ConsistencySummary::NoRows,
                issues: vec![
                    "consistency check unavailable: no rows with price, units and value".to_string(),
                ],
            };
        }

        let rows_checked = differences.len();
        let consistent_rows = differences.iter().filter(|&&d| d <= config.tolerance).count();
        let large_differences = differences
            .iter()
            .filter(|&&d| d > config.large_difference_threshold)
            .count();
        let consistency_rate = percent(consistent_rows, rows_checked);
        let max_difference = differences.iter().copied().fold(0.0, f64::max);

        let mut checked = Checked::new(ConsistencySummary::Checked(ConsistencyStats {
            rows_checked,
            consistent_rows,
            inconsistent_rows: rows_checked - consistent_rows,
            large_differences,
            consistency_rate,
            max_difference,
        }));

        if large_differences > 0 {
            checked.issues.push(format!(
                "{} rows differ by more than {}",
                large_differences, config.large_difference_threshold
            ));
        }
        if consistency_rate < config.min_consistency_rate {
            checked
                .issues
                .push(format!("price consistency too low: {:.2}%", consistency_rate));
        }
        checked
    }
}

/// Counts negative numbers per numeric column.
#[derive(Debug, Clone)]
pub struct NegativeValueValidator {
    config: NegativeValuesConfig,
}

impl NegativeValueValidator {
    pub fn new(config: NegativeValuesConfig) -> Self {
        Self { config }
    }
}

impl Validator for NegativeValueValidator {
    type Summary = NegativeSummary;

    fn validate(&self, table: &DataTable) -> Checked<NegativeSummary> {
        let mut summary = NegativeSummary::default();
        let mut negative_rows: BTreeSet<usize> = BTreeSet::new();

        for (idx, name) in table.headers.iter().enumerate() {
            if !table.column_type(idx).is_numeric() {
                continue;
            }

            let mut count = 0;
            let mut min_value = f64::INFINITY;
            for (row, value) in table.column_values(idx).enumerate() {
                let Some(n) = value.as_f64() else { continue };
                min_value = min_value.min(n);
                if n < 0.0 {
                    count += 1;
                    negative_rows.insert(row);
                }
            }

            if count > 0 {
                summary.columns_with_negatives.insert(
                    name.clone(),
                    NegativeColumn {
                        count,
                        percentage: percent(count, table.row_count()),
                        min_value,
                    },
                );
            }
        }

        summary.total_negative_rows = negative_rows.len();

        let mut checked = Checked::new(summary);
        if checked.summary.total_negative_rows > self.config.report_threshold {
            checked.issues.push(format!(
                "{} rows contain negative values",
                checked.summary.total_negative_rows
            ));
        }
        checked
    }
}

/// Per-column type information and text columns that look numeric.
pub struct TypeValidator;

impl Validator for TypeValidator {
    type Summary = IndexMap<String, ColumnTypeInfo>;

    fn validate(&self, table: &DataTable) -> Checked<Self::Summary> {
        let mut checked = Checked::new(IndexMap::new());

        for (idx, name) in table.headers.iter().enumerate() {
            let dtype = table.column_type(idx);
            let null_count = table.column_values(idx).filter(|v| v.is_missing()).count();
            let distinct_count = table
                .column_values(idx)
                .filter(|v| !v.is_missing())
                .collect::<HashSet<_>>()
                .len();

            if dtype == ColumnType::Text
                && table
                    .column_values(idx)
                    .filter(|v| !v.is_missing())
                    .all(|v| v.to_number().is_some())
            {
                checked.issues.push(format!("column '{}' may be numeric", name));
            }

            checked.summary.insert(
                name.clone(),
                ColumnTypeInfo {
                    dtype,
                    null_count,
                    distinct_count,
                },
            );
        }

        checked
    }
}

/// Runs the always-on checks plus the enabled optional ones.
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    consistency: Option<ConsistencyValidator>,
    negative_values: Option<NegativeValueValidator>,
}

impl ValidationEngine {
    /// Engine with only completeness and type checks.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        let mut engine = Self::new();
        if config.consistency_check.enabled {
            engine = engine.with_consistency(config.consistency_check.clone());
        }
        if config.negative_values.check_enabled {
            engine = engine.with_negative_values(config.negative_values.clone());
        }
        engine
    }

    pub fn with_consistency(mut self, config: ConsistencyConfig) -> Self {
        self.consistency = Some(ConsistencyValidator::new(config));
        self
    }

    pub fn with_negative_values(mut self, config: NegativeValuesConfig) -> Self {
        self.negative_values = Some(NegativeValueValidator::new(config));
        self
    }

    /// Validate a table. Findings are reported as issues, never as errors.
    pub fn validate(&self, table: &DataTable) -> ValidationResult {
        if table.is_empty() {
            return ValidationResult::new(
                0,
                table.column_count(),
                CompletenessSummary::default(),
                None,
                None,
                IndexMap::new(),
                vec!["dataset is empty".to_string()],
            );
        }

        let mut issues = Vec::new();

        let completeness = CompletenessValidator.validate(table);
        issues.extend(completeness.issues);

        let consistency = self.consistency.as_ref().map(|v| {
            let checked = v.validate(table);
            issues.extend(checked.issues);
            checked.summary
        });

        let negative_values = self.negative_values.as_ref().map(|v| {
            let checked = v.validate(table);
            issues.extend(checked.issues);
            checked.summary
        });

        let types = TypeValidator.validate(table);
        issues.extend(types.issues);

        ValidationResult::new(
            table.row_count(),
            table.column_count(),
            completeness.summary,
            consistency,
            negative_values,
            types.summary,
            issues,
        )
    }
}
