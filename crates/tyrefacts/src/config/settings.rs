//! Typed pipeline configuration.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::document::ConfigDocument;
use crate::error::{EtlError, Result};
use crate::schema::ColumnRoles;
use crate::transform::{DateMapping, FilterCondition, MissingStrategy};

/// Columns checked for aggregate markers when none are configured.
pub const DEFAULT_CHECK_COLUMNS: &[&str] = &[
    "Seasonality",
    "Rim Diameter",
    "DIMENSION (Car Tires)",
    "Dimension",
    "SpeedIndex",
    "Speed Index",
    "LoadIndex",
    "Load Index",
    "Brandlines",
    "Brand",
];

/// Patterns that mark aggregate rows when none are configured.
pub const DEFAULT_TOTAL_PATTERNS: &[&str] = &[r"\.TOTAL", r"^TOTAL$", r"\.TOTAL\."];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub project: ProjectConfig,
    pub data_sources: DataSourcesConfig,
    pub processing: ProcessingConfig,
    pub validation: ValidationConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load and validate a configuration file, resolving `include`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let document = ConfigDocument::load(path)?;
        Self::from_document(&document)
    }

    pub fn from_document(document: &ConfigDocument) -> Result<Self> {
        let config: PipelineConfig = document.deserialize()?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if let Some(pivot) = &self.processing.pivot {
            if pivot.pivot_column == pivot.value_column {
                return Err(EtlError::Config(format!(
                    "pivot_column and value_column are both '{}'",
                    pivot.pivot_column
                )));
            }
        }
        let tolerance = self.validation.consistency_check.tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(EtlError::Config(format!(
                "consistency tolerance must be a non-negative number, got {}",
                tolerance
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

/// Where data comes from and where results go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourcesConfig {
    pub region: String,
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    /// Column stamped with each source's name; `None` disables stamping.
    pub source_column: Option<String>,
    #[serde(alias = "countries", alias = "spain_files")]
    pub sources: IndexMap<String, SourceConfig>,
}

impl Default for DataSourcesConfig {
    fn default() -> Self {
        Self {
            region: "UNKNOWN".to_string(),
            input_directory: PathBuf::from("."),
            output_directory: PathBuf::from("data/processed"),
            source_column: Some("country".to_string()),
            sources: IndexMap::new(),
        }
    }
}

/// One input file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub file: Option<PathBuf>,
    pub code: Option<String>,
    /// Constant columns added when the file does not already carry them.
    pub constants: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub cleaning: CleaningConfig,
    pub column_mapping: IndexMap<String, String>,
    pub date_mapping: IndexMap<String, String>,
    pub pivot: Option<PivotConfig>,
    /// Applied to the final table before validation.
    pub missing_values: MissingStrategy,
    /// Row filters on the final table, applied after missing-value handling.
    pub filters: IndexMap<String, FilterCondition>,
}

impl ProcessingConfig {
    pub fn date_mapping(&self) -> DateMapping {
        DateMapping::new(self.date_mapping.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub remove_total_rows: bool,
    pub total_patterns: Vec<String>,
    pub columns_to_drop: Vec<String>,
    pub check_columns: Vec<String>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            remove_total_rows: true,
            total_patterns: strings(DEFAULT_TOTAL_PATTERNS),
            columns_to_drop: Vec::new(),
            check_columns: strings(DEFAULT_CHECK_COLUMNS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotConfig {
    pub index_columns: Vec<String>,
    pub pivot_column: String,
    pub value_column: String,
}

impl Default for PivotConfig {
    fn default() -> Self {
        Self {
            index_columns: Vec::new(),
            pivot_column: "Facts".to_string(),
            value_column: "Value".to_string(),
        }
    }
}

impl PivotConfig {
    pub fn roles(&self) -> ColumnRoles {
        ColumnRoles::new(
            self.index_columns.iter().cloned(),
            self.pivot_column.clone(),
            self.value_column.clone(),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub consistency_check: ConsistencyConfig,
    pub negative_values: NegativeValuesConfig,
}

/// Price × units ≈ value check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    pub enabled: bool,
    pub tolerance: f64,
    pub price_column: String,
    pub units_column: String,
    pub value_column: String,
    pub large_difference_threshold: f64,
    /// Percent, 0-100.
    pub min_consistency_rate: f64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tolerance: 0.01,
            price_column: "PRICE EUR".to_string(),
            units_column: "SALES UNITS".to_string(),
            value_column: "SALES VALUE EUR".to_string(),
            large_difference_threshold: 1000.0,
            min_consistency_rate: 80.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegativeValuesConfig {
    pub check_enabled: bool,
    pub report_threshold: usize,
}

impl Default for NegativeValuesConfig {
    fn default() -> Self {
        Self {
            check_enabled: false,
            report_threshold: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub filename_pattern: String,
    pub include_timestamp: bool,
    pub save_validation_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            filename_pattern: "{region}_PROCESSED_{timestamp}.csv".to_string(),
            include_timestamp: true,
            save_validation_report: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = PipelineConfig::from_document(&ConfigDocument::parse("").unwrap()).unwrap();

        assert_eq!(config.data_sources.region, "UNKNOWN");
        assert_eq!(config.data_sources.source_column.as_deref(), Some("country"));
        assert!(config.processing.cleaning.remove_total_rows);
        assert_eq!(config.processing.cleaning.total_patterns.len(), 3);
        assert_eq!(config.processing.cleaning.check_columns[0], "Seasonality");
        assert!(config.processing.pivot.is_none());
        assert_eq!(config.validation.consistency_check.tolerance, 0.01);
        assert_eq!(config.validation.negative_values.report_threshold, 10);
    }

    #[test]
    fn test_countries_alias_and_order() {
        let yaml = r#"
data_sources:
  region: EU
  countries:
    Germany: { file: germany.csv, code: DE }
    France: { file: france.csv, code: FR }
"#;
        let config = PipelineConfig::from_document(&ConfigDocument::parse(yaml).unwrap()).unwrap();
        let names: Vec<&str> = config.data_sources.sources.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Germany", "France"]);
        assert_eq!(config.data_sources.sources["France"].code.as_deref(), Some("FR"));
    }

    #[test]
    fn test_null_source_column_disables_stamping() {
        let yaml = "data_sources:\n  source_column: null\n";
        let config = PipelineConfig::from_document(&ConfigDocument::parse(yaml).unwrap()).unwrap();
        assert!(config.data_sources.source_column.is_none());
    }

    #[test]
    fn test_pivot_defaults_and_roles() {
        let yaml = "processing:\n  pivot:\n    index_columns: [Brand, Date]\n";
        let config = PipelineConfig::from_document(&ConfigDocument::parse(yaml).unwrap()).unwrap();
        let roles = config.processing.pivot.unwrap().roles();
        assert_eq!(roles.metric_name, "Facts");
        assert_eq!(roles.metric_value, "Value");
        assert_eq!(roles.identifiers, vec!["Brand", "Date"]);
    }

    #[test]
    fn test_missing_strategy_and_filters() {
        let yaml = r#"
processing:
  missing_values: fill
  filters:
    country: Germany
    SALES UNITS: { min: 1 }
"#;
        let config = PipelineConfig::from_document(&ConfigDocument::parse(yaml).unwrap()).unwrap();
        assert_eq!(config.processing.missing_values, MissingStrategy::Fill);
        let columns: Vec<&str> = config.processing.filters.keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["country", "SALES UNITS"]);
        assert!(matches!(
            config.processing.filters["SALES UNITS"],
            FilterCondition::Criteria(_)
        ));

        let defaults = PipelineConfig::default();
        assert_eq!(defaults.processing.missing_values, MissingStrategy::Report);
        assert!(defaults.processing.filters.is_empty());
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        let yaml = "validation:\n  consistency_check:\n    tolerance: -1\n";
        let err = PipelineConfig::from_document(&ConfigDocument::parse(yaml).unwrap()).unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
    }
}
