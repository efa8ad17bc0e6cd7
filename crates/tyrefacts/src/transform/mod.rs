//! Table transformations: cleaning, renaming, wide-to-long reshaping, the
//! fact pivot and the row-level helpers around them.
//!
//! Every transformation borrows its input and returns a new table. Steps that
//! can legitimately not apply return an [`Outcome`] instead of an error.

mod cleaner;
mod columns;
mod filter;
mod operations;
mod pivot;
mod quality;
mod rename;
mod reshape;

pub use cleaner::{CleanStats, Cleaned, RowCleaner};
pub use columns::{CALCULATED_VALUE_COLUMN, add_calculated_value, standardize_date_format};
pub use filter::{FilterCondition, FilterCriteria, FilterStats, filter_rows};
pub use operations::{Outcome, SkipReason};
pub use pivot::{PivotStats, pivot_facts};
pub use quality::{
    FILL_TEXT, MissingStats, MissingStrategy, OutlierInfo, detect_outliers, handle_missing_values,
};
pub use rename::{RenameStats, rename_columns};
pub use reshape::{
    DATE_COLUMN, DateMapping, ReshapeStats, VALUE_COLUMN, reshape_wide_to_long,
    validate_transformation,
};
