//! Validation engine for data quality checks on the final table.

mod result;
mod validators;

pub use result::{
    ColumnTypeInfo, CompletenessSummary, ConsistencyStats, ConsistencySummary, MissingStats,
    NegativeColumn, NegativeSummary, ValidationResult,
};
pub use validators::{
    Checked, CompletenessValidator, ConsistencyValidator, NegativeValueValidator, TypeValidator,
    ValidationEngine, Validator,
};
