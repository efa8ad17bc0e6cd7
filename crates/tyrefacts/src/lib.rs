//! tyrefacts: configuration-driven ETL for retail tyre-sales panel data.
//!
//! Per-country (or per-vehicle-type) wide files with one column per month are
//! cleaned, reshaped into a long table of `(identifiers, Date, Value)` rows,
//! combined, pivoted into one column per fact, validated and exported.
//!
//! # Core Principles
//!
//! - **Config-driven**: column roles, date mapping and thresholds come from YAML
//! - **Non-destructive**: every stage borrows its input and returns a new table
//! - **Degrade, don't fail**: a step that cannot apply says so in its [`Outcome`]
//!
//! # Example
//!
//! ```no_run
//! use tyrefacts::{Pipeline, RunOptions};
//!
//! let pipeline = Pipeline::from_config_path("config/europe_config.yml").unwrap();
//! let result = pipeline.run(RunOptions::default());
//!
//! println!("Success: {}", result.success);
//! if let Some(validation) = &result.validation {
//!     println!("Issues: {}", validation.issues().len());
//! }
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod schema;
pub mod transform;
pub mod validation;

mod pipeline;

pub use crate::pipeline::{
    CleaningSummary, ExportSummary, LoadingSummary, Pipeline, PipelineResult, RunOptions,
    StageSummaries, TransformSkip, TransformationSummary, ValidationStageSummary,
};
pub use config::{ConfigDocument, PipelineConfig};
pub use error::{EtlError, Result};
pub use input::{DataTable, SourceMetadata};
pub use schema::{ColumnRole, ColumnRoles, ColumnType, Value};
pub use transform::{DateMapping, Outcome, SkipReason};
pub use validation::{ValidationEngine, ValidationResult};
