//! YAML configuration: document loading with `include` inheritance and the
//! typed settings the pipeline consumes.

mod document;
mod settings;

pub use document::{ConfigDocument, merge};
pub use settings::{
    CleaningConfig, ConsistencyConfig, DEFAULT_CHECK_COLUMNS, DEFAULT_TOTAL_PATTERNS,
    DataSourcesConfig, NegativeValuesConfig, OutputConfig, PipelineConfig, PivotConfig,
    ProcessingConfig, ProjectConfig, SourceConfig, ValidationConfig,
};
