//! Pipeline orchestration: load, clean, reshape, pivot, validate and export.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::error::{EtlError, Result};
use crate::input::{DataTable, SkippedSource, SourceLoader, SourceMetadata};
use crate::output::{Artifact, ExportRecord, Exporter, TIMESTAMP_FORMAT, report};
use crate::transform::{
    FilterStats, MissingStats, Outcome, PivotStats, RowCleaner, SkipReason, filter_rows,
    handle_missing_values, pivot_facts, rename_columns, reshape_wide_to_long,
    validate_transformation,
};
use crate::validation::{ValidationEngine, ValidationResult};

/// What a run should write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub export_data: bool,
    pub export_report: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            export_data: true,
            export_report: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadingSummary {
    pub files_loaded: usize,
    pub total_rows: usize,
    pub data_sources: Vec<String>,
    pub files: Vec<SourceMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub files_cleaned: usize,
    pub total_rows_before: usize,
    pub total_rows_after: usize,
    pub rows_removed: usize,
    pub aggregate_rows_removed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationSummary {
    pub files_transformed: usize,
    pub total_rows_before_transform: usize,
    pub total_rows_after_transform: usize,
    pub combined_rows: usize,
    pub pivot: Option<PivotStats>,
    pub missing_values: MissingStats,
    pub filter: Option<FilterStats>,
    pub final_rows: usize,
    pub final_columns: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStageSummary {
    pub validation_passed: bool,
    pub issues_found: usize,
    pub consistency_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub files_exported: usize,
    pub export_paths: IndexMap<String, PathBuf>,
}

/// Per-stage statistics; a stage that never ran stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSummaries {
    pub loading: Option<LoadingSummary>,
    pub cleaning: Option<CleaningSummary>,
    pub transformation: Option<TransformationSummary>,
    pub validation: Option<ValidationStageSummary>,
    pub export: Option<ExportSummary>,
}

/// A transformation that did not apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSkip {
    pub stage: String,
    /// Source name, or `None` for the combined table.
    pub source: Option<String>,
    pub reason: SkipReason,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub success: bool,
    pub error: Option<String>,
    pub config_path: PathBuf,
    pub region: String,
    /// Shared by every file name written for this run.
    pub timestamp: String,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub duration_secs: f64,
    pub stages: StageSummaries,
    pub skipped_sources: Vec<SkippedSource>,
    pub transform_skips: Vec<TransformSkip>,
    pub validation: Option<ValidationResult>,
    pub exports: Vec<ExportRecord>,
    #[serde(skip)]
    pub final_table: Option<DataTable>,
}

impl PipelineResult {
    fn new(config_path: &Path, region: &str) -> Self {
        let started_at = Local::now();
        Self {
            success: false,
            error: None,
            config_path: config_path.to_path_buf(),
            region: region.to_string(),
            timestamp: started_at.format(TIMESTAMP_FORMAT).to_string(),
            started_at,
            finished_at: None,
            duration_secs: 0.0,
            stages: StageSummaries::default(),
            skipped_sources: Vec::new(),
            transform_skips: Vec::new(),
            validation: None,
            exports: Vec::new(),
            final_table: None,
        }
    }

    /// Pretty-printed JSON of the run, without the final table.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Paths of successful exports, keyed by artifact label.
    pub fn export_paths(&self) -> IndexMap<String, PathBuf> {
        self.exports
            .iter()
            .filter_map(|r| r.path.clone().map(|p| (r.artifact.label().to_string(), p)))
            .collect()
    }
}

/// A configured pipeline, ready to run.
pub struct Pipeline {
    config: PipelineConfig,
    config_path: PathBuf,
    cleaner: RowCleaner,
    validator: ValidationEngine,
}

impl Pipeline {
    /// Load the configuration file (resolving `include`) and build the pipeline.
    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = PipelineConfig::load(path)?;
        Self::new(config, path)
    }

    /// Build a pipeline from an already loaded configuration. Fails on
    /// invalid cleaning patterns.
    pub fn new(config: PipelineConfig, config_path: impl Into<PathBuf>) -> Result<Self> {
        let cleaner = RowCleaner::from_config(&config.processing.cleaning)?;
        let validator = ValidationEngine::from_config(&config.validation);
        Ok(Self {
            config,
            config_path: config_path.into(),
            cleaner,
            validator,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage. Fatal errors end up in the result, never as a panic.
    pub fn run(&self, options: RunOptions) -> PipelineResult {
        let mut result = PipelineResult::new(&self.config_path, &self.config.data_sources.region);
        info!(
            config = %self.config_path.display(),
            region = %result.region,
            "pipeline started"
        );

        match self.execute(options, &mut result) {
            Ok(()) => result.success = true,
            Err(e) => {
                error!(error = %e, "pipeline failed");
                result.error = Some(e.to_string());
            }
        }

        let finished_at = Local::now();
        result.duration_secs = (finished_at - result.started_at).num_milliseconds() as f64 / 1000.0;
        result.finished_at = Some(finished_at);
        info!(success = result.success, seconds = result.duration_secs, "pipeline finished");
        result
    }

    /// Render and write the pipeline summary for a finished run.
    pub fn export_summary(&self, result: &PipelineResult) -> ExportRecord {
        let exporter = self.exporter(&result.timestamp);
        ExportRecord::from_result(
            Artifact::Summary,
            exporter.export_summary(&report::render_pipeline_summary(result)),
        )
    }

    fn exporter(&self, timestamp: &str) -> Exporter {
        Exporter::new(
            &self.config.data_sources.output_directory,
            &self.config.output,
            &self.config.data_sources.region,
        )
        .with_timestamp(timestamp)
    }

    fn execute(&self, options: RunOptions, result: &mut PipelineResult) -> Result<()> {
        let sources = &self.config.data_sources;

        // Load
        let loaded = SourceLoader::new(&sources.input_directory).load_all(sources);
        result.skipped_sources = loaded.skipped.clone();
        if loaded.sources.is_empty() {
            return Err(EtlError::NoSources {
                attempted: sources.sources.len(),
            });
        }
        result.stages.loading = Some(LoadingSummary {
            files_loaded: loaded.sources.len(),
            total_rows: loaded.total_rows(),
            data_sources: loaded.sources.keys().cloned().collect(),
            files: loaded.sources.values().map(|s| s.metadata.clone()).collect(),
        });

        // Clean
        let mut cleaning = CleaningSummary::default();
        let mut cleaned: IndexMap<&str, DataTable> = IndexMap::new();
        for (name, source) in &loaded.sources {
            if source.table.is_empty() {
                continue;
            }
            let out = self.cleaner.clean(&source.table);
            info!(
                source = %name,
                before = out.stats.rows_before,
                after = out.stats.rows_after,
                aggregates = out.stats.aggregate_rows_removed,
                "cleaned source"
            );
            if out.table.is_empty() {
                warn!(source = %name, "no rows left after cleaning");
                continue;
            }
            cleaning.files_cleaned += 1;
            cleaning.total_rows_before += out.stats.rows_before;
            cleaning.total_rows_after += out.stats.rows_after;
            cleaning.rows_removed += out.stats.rows_removed();
            cleaning.aggregate_rows_removed += out.stats.aggregate_rows_removed;
            cleaned.insert(name.as_str(), out.table);
        }
        result.stages.cleaning = Some(cleaning);

        // Rename and reshape each source
        let processing = &self.config.processing;
        let date_mapping = processing.date_mapping();
        let mut transformation = TransformationSummary::default();
        let mut long_tables = Vec::new();

        for (name, table) in &cleaned {
            let renamed = rename_columns(table, &processing.column_mapping);
            self.note_skip(result, "rename", Some(*name), &renamed);

            let reshaped = reshape_wide_to_long(renamed.table(), &date_mapping);
            self.note_skip(result, "reshape", Some(*name), &reshaped);
            let reshape_ran = !reshaped.is_skipped();
            let long = reshaped.into_table();
            if reshape_ran && !validate_transformation(table, Some(&long)) {
                warn!(source = %name, "reshaped table failed its sanity check");
            }

            if long.is_empty() {
                warn!(source = %name, "no rows left after reshaping");
                continue;
            }
            transformation.files_transformed += 1;
            transformation.total_rows_before_transform += table.row_count();
            transformation.total_rows_after_transform += long.row_count();
            long_tables.push(long);
        }

        // Combine and pivot
        let combined = DataTable::concat(&long_tables);
        transformation.combined_rows = combined.row_count();
        info!(
            tables = long_tables.len(),
            rows = combined.row_count(),
            "combined transformed sources"
        );

        let final_table = match &processing.pivot {
            Some(pivot) if !combined.is_empty() => {
                let pivoted = pivot_facts(&combined, &pivot.roles());
                self.note_skip(result, "pivot", None, &pivoted);
                if let Some(stats) = pivoted.stats() {
                    if !stats.missing_identifiers.is_empty() {
                        warn!(columns = ?stats.missing_identifiers, "pivot identifier columns not found");
                    }
                    transformation.pivot = Some(stats.clone());
                }
                pivoted.into_table()
            }
            _ => combined,
        };

        let (final_table, missing) = handle_missing_values(&final_table, processing.missing_values);
        transformation.missing_values = missing;
        let final_table = if processing.filters.is_empty() {
            final_table
        } else {
            let (filtered, stats) = filter_rows(&final_table, &processing.filters);
            transformation.filter = Some(stats);
            filtered
        };
        transformation.final_rows = final_table.row_count();
        transformation.final_columns = final_table.column_count();
        result.stages.transformation = Some(transformation);

        // Validate
        let validation = self.validator.validate(&final_table);
        info!(
            passed = validation.passed(),
            issues = validation.issues().len(),
            "validation finished"
        );
        for issue in validation.issues() {
            warn!(issue = %issue, "validation issue");
        }
        result.stages.validation = Some(ValidationStageSummary {
            validation_passed: validation.passed(),
            issues_found: validation.issues().len(),
            consistency_rate: validation.consistency().and_then(|c| c.rate()),
        });

        // Export
        if options.export_data || options.export_report {
            let exporter = self.exporter(&result.timestamp);
            let region = result.region.clone();
            let render = || report::render_validation_report(&validation, &region, Local::now());

            if options.export_data && !final_table.is_empty() {
                result
                    .exports
                    .push(ExportRecord::from_result(Artifact::Data, exporter.export_table(&final_table)));
                if options.export_report && self.config.output.save_validation_report {
                    result.exports.push(ExportRecord::from_result(
                        Artifact::ValidationReport,
                        exporter.export_validation_report(&render()),
                    ));
                }
            } else if options.export_report {
                result.exports.push(ExportRecord::from_result(
                    Artifact::ValidationReport,
                    exporter.export_validation_report(&render()),
                ));
            }

            let export_paths = result.export_paths();
            result.stages.export = Some(ExportSummary {
                files_exported: export_paths.len(),
                export_paths,
            });
        }

        result.validation = Some(validation);
        result.final_table = Some(final_table);
        Ok(())
    }

    fn note_skip<S>(
        &self,
        result: &mut PipelineResult,
        stage: &str,
        source: Option<&str>,
        outcome: &Outcome<S>,
    ) {
        if let Some(reason) = outcome.skip_reason() {
            warn!(stage, source = source.unwrap_or("combined"), reason = %reason, "transformation skipped");
            result.transform_skips.push(TransformSkip {
                stage: stage.to_string(),
                source: source.map(str::to_string),
                reason: reason.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigDocument, SourceConfig};
    use crate::schema::Value;
    use crate::transform::{FilterCondition, MissingStrategy};
    use std::fs;
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> PipelineConfig {
        let yaml = format!(
            r#"
data_sources:
  region: test
  input_directory: {input}
  output_directory: {output}
processing:
  date_mapping:
    "JUN 24": "2024-06-01"
    "JUL 24": "2024-07-01"
  pivot:
    index_columns: [Brand, country, Date]
"#,
            input = dir.display(),
            output = dir.join("out").display()
        );
        PipelineConfig::from_document(&ConfigDocument::parse(&yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_no_sources_is_failure_result() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(dir.path());
        config.data_sources.sources.insert(
            "Germany".into(),
            SourceConfig {
                file: Some("missing.csv".into()),
                ..SourceConfig::default()
            },
        );

        let result = Pipeline::new(config, "test.yml").unwrap().run(RunOptions::default());

        assert!(!result.success);
        assert!(result.error.unwrap().contains("No data sources"));
        assert_eq!(result.skipped_sources.len(), 1);
        assert!(result.stages.loading.is_none());
    }

    #[test]
    fn test_run_without_exports() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("de.csv"),
            "Brand,Facts,JUN 24,JUL 24\nA,SALES UNITS,10,0\nA,PRICE EUR,2.5,3\n",
        )
        .unwrap();
        let mut config = config_for(dir.path());
        config.data_sources.sources.insert(
            "Germany".into(),
            SourceConfig {
                file: Some("de.csv".into()),
                ..SourceConfig::default()
            },
        );

        let result = Pipeline::new(config, "test.yml").unwrap().run(RunOptions {
            export_data: false,
            export_report: false,
        });

        assert!(result.success, "{:?}", result.error);
        let table = result.final_table.as_ref().unwrap();
        assert_eq!(
            table.headers,
            vec!["Brand", "country", "Date", "PRICE EUR", "SALES UNITS"]
        );
        // (A, Germany, JUN) and (A, Germany, JUL)
        assert_eq!(table.row_count(), 2);
        assert!(result.exports.is_empty());
        assert!(result.stages.export.is_none());
        assert!(!dir.path().join("out").exists());
    }

    fn with_germany(dir: &Path, csv: &str) -> PipelineConfig {
        fs::write(dir.join("de.csv"), csv).unwrap();
        let mut config = config_for(dir);
        config.data_sources.sources.insert(
            "Germany".into(),
            SourceConfig {
                file: Some("de.csv".into()),
                ..SourceConfig::default()
            },
        );
        config
    }

    #[test]
    fn test_report_only_run_writes_validation_report() {
        let dir = TempDir::new().unwrap();
        let config = with_germany(dir.path(), "Brand,Facts,JUN 24\nA,SALES UNITS,10\n");

        let result = Pipeline::new(config, "test.yml").unwrap().run(RunOptions {
            export_data: false,
            export_report: true,
        });

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].artifact, Artifact::ValidationReport);
        let path = result.exports[0].path.as_ref().unwrap();
        assert!(path.starts_with(dir.path().join("out").join("reports")));
        assert!(path.exists());
        assert_eq!(result.stages.export.as_ref().unwrap().files_exported, 1);
    }

    #[test]
    fn test_filters_and_missing_values_shape_final_table() {
        let dir = TempDir::new().unwrap();
        let mut config = with_germany(
            dir.path(),
            "Brand,Facts,JUN 24\nA,SALES UNITS,10\nA,PRICE EUR,2\nB,SALES UNITS,4\n",
        );
        config.processing.missing_values = MissingStrategy::Fill;
        config
            .processing
            .filters
            .insert("SALES UNITS".into(), FilterCondition::Equals(Value::Integer(4)));

        let result = Pipeline::new(config, "test.yml").unwrap().run(RunOptions {
            export_data: false,
            export_report: false,
        });

        let table = result.final_table.as_ref().unwrap();
        // B had no price; the fill turns it into 0 before filtering.
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.value(0, "Brand"), Some(&Value::Text("B".into())));
        assert_eq!(table.value(0, "PRICE EUR"), Some(&Value::Integer(0)));

        let transformation = result.stages.transformation.unwrap();
        assert_eq!(transformation.missing_values.cells_filled, 1);
        let filter = transformation.filter.unwrap();
        assert_eq!((filter.rows_before, filter.rows_after), (2, 1));
    }

    #[test]
    fn test_result_json_omits_table() {
        let dir = TempDir::new().unwrap();
        let result = Pipeline::new(config_for(dir.path()), "test.yml")
            .unwrap()
            .run(RunOptions::default());

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["region"], "test");
        assert!(json.get("final_table").is_none());
    }

    #[test]
    fn test_invalid_cleaning_pattern_rejected() {
        let mut config = PipelineConfig::default();
        config.processing.cleaning.total_patterns = vec!["(".into()];
        assert!(matches!(Pipeline::new(config, "x.yml"), Err(EtlError::Regex(_))));
    }
}
