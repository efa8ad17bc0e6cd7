//! End-to-end tests for the tyrefacts pipeline.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use tyrefacts::{ConfigDocument, EtlError, Pipeline, PipelineConfig, RunOptions, SkipReason};

const GERMANY: &str = "\
Brand,Seasonality,Facts,JUN 24,JUL 24,AUG 24
A,SUMMER,SALES UNITS,10,20,0
A,SUMMER,SALES VALUE EUR,1000,2000,0
A,SUMMER,PRICE EUR,100,100,
A.TOTAL,SUMMER,SALES UNITS,10,20,0
B,TOTAL,SALES UNITS,5,5,5
";

const FRANCE: &str = "\
Brand,Seasonality,Facts,JUN 24,JUL 24
C,WINTER,SALES UNITS,3,4
C,WINTER,SALES VALUE EUR,300,400
C,WINTER,PRICE EUR,100,100
";

const BASE_CONFIG: &str = r#"
project:
  name: Tyre sales
processing:
  cleaning:
    remove_total_rows: true
  date_mapping:
    "JUN 24": "2024-06-01"
    "JUL 24": "2024-07-01"
    "AUG 24": "2024-08-01"
  pivot:
    index_columns: [Brand, country, Date]
    pivot_column: Facts
    value_column: Value
validation:
  consistency_check:
    enabled: true
    tolerance: 0.01
output:
  filename_pattern: "{region}_PROCESSED_{timestamp}.csv"
  save_validation_report: true
"#;

/// Write two country files plus a base and a child config; return the child path.
fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let input = dir.join("raw");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("germany.csv"), GERMANY).unwrap();
    fs::write(input.join("france.csv"), FRANCE).unwrap();

    fs::write(dir.join("base.yml"), BASE_CONFIG).unwrap();
    let child = format!(
        r#"
include: base.yml
data_sources:
  region: europe
  input_directory: "{input}"
  output_directory: "{output}"
  countries:
    Germany: {{ file: germany.csv, code: DE }}
    France: {{ file: france.csv, code: FR }}
"#,
        input = input.display(),
        output = dir.join("out").display()
    );
    let path = dir.join("europe.yml");
    fs::write(&path, child).unwrap();
    path
}

// =============================================================================
// Full runs
// =============================================================================

#[test]
fn test_two_country_run_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path());

    let pipeline = Pipeline::from_config_path(&config).expect("config should load");
    let result = pipeline.run(RunOptions::default());

    assert!(result.success, "run failed: {:?}", result.error);
    assert!(result.skipped_sources.is_empty());

    let loading = result.stages.loading.as_ref().unwrap();
    assert_eq!(loading.files_loaded, 2);
    assert_eq!(loading.total_rows, 8);
    assert_eq!(loading.data_sources, vec!["Germany", "France"]);

    let cleaning = result.stages.cleaning.as_ref().unwrap();
    assert_eq!(cleaning.aggregate_rows_removed, 2);
    assert_eq!(cleaning.total_rows_after, 6);

    let transformation = result.stages.transformation.as_ref().unwrap();
    assert_eq!(transformation.total_rows_after_transform, 12);
    assert_eq!(transformation.final_rows, 4);

    let table = result.final_table.as_ref().unwrap();
    assert_eq!(
        table.headers,
        vec!["Brand", "country", "Date", "PRICE EUR", "SALES UNITS", "SALES VALUE EUR"]
    );

    let validation = result.validation.as_ref().unwrap();
    assert!(validation.passed(), "issues: {:?}", validation.issues());
    let rate = result.stages.validation.as_ref().unwrap().consistency_rate;
    assert_eq!(rate, Some(100.0));
}

#[test]
fn test_exported_csv_contents() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path());

    let pipeline = Pipeline::from_config_path(&config).unwrap();
    let result = pipeline.run(RunOptions::default());
    let paths = result.export_paths();

    let data = paths.get("data").expect("data export");
    let name = data.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("EUROPE_PROCESSED_"));
    assert!(name.ends_with(".csv"));

    let written = fs::read_to_string(data).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "Brand,country,Date,PRICE EUR,SALES UNITS,SALES VALUE EUR");
    assert_eq!(lines[1], "A,Germany,2024-06-01,100,10,1000");
    assert_eq!(lines[4], "C,France,2024-07-01,100,4,400");
    assert_eq!(lines.len(), 5);

    let report = paths.get("validation_report").expect("report export");
    assert!(report.parent().unwrap().ends_with("reports"));
    let text = fs::read_to_string(report).unwrap();
    assert!(text.contains(" EUROPE DATA VALIDATION REPORT"));
    assert!(text.contains("Status: PASSED"));
}

#[test]
fn test_summary_shares_run_timestamp() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path());

    let pipeline = Pipeline::from_config_path(&config).unwrap();
    let result = pipeline.run(RunOptions::default());
    let record = pipeline.export_summary(&result);

    let path = record.path.expect("summary written");
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(name, format!("EUROPE_PIPELINE_SUMMARY_{}.txt", result.timestamp));

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("[Loading]"));
    assert!(text.contains("files_loaded: 2"));
}

#[test]
fn test_no_export_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path());

    let pipeline = Pipeline::from_config_path(&config).unwrap();
    let result = pipeline.run(RunOptions {
        export_data: false,
        export_report: false,
    });

    assert!(result.success);
    assert!(result.exports.is_empty());
    assert!(result.stages.export.is_none());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_missing_country_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path());
    fs::remove_file(dir.path().join("raw/france.csv")).unwrap();

    let pipeline = Pipeline::from_config_path(&config).unwrap();
    let result = pipeline.run(RunOptions {
        export_data: false,
        export_report: false,
    });

    assert!(result.success);
    assert_eq!(result.skipped_sources.len(), 1);
    assert_eq!(result.skipped_sources[0].name, "France");
    assert_eq!(result.final_table.as_ref().unwrap().row_count(), 2);
}

#[test]
fn test_all_sources_missing_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path());
    fs::remove_file(dir.path().join("raw/france.csv")).unwrap();
    fs::remove_file(dir.path().join("raw/germany.csv")).unwrap();

    let pipeline = Pipeline::from_config_path(&config).unwrap();
    let result = pipeline.run(RunOptions::default());

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("2 configured"));
    assert!(result.validation.is_none());
}

#[test]
fn test_without_date_mapping_reshape_is_skipped() {
    let dir = TempDir::new().unwrap();
    let input = dir.path();
    fs::write(input.join("germany.csv"), GERMANY).unwrap();

    let yaml = format!(
        "data_sources:\n  region: de\n  input_directory: \"{}\"\n  countries:\n    Germany: {{ file: germany.csv }}\n",
        input.display()
    );
    let config = PipelineConfig::from_document(&ConfigDocument::parse(&yaml).unwrap()).unwrap();
    let pipeline = Pipeline::new(config, "inline.yml").unwrap();
    let result = pipeline.run(RunOptions {
        export_data: false,
        export_report: false,
    });

    assert!(result.success);
    assert_eq!(result.transform_skips.len(), 1);
    assert_eq!(result.transform_skips[0].stage, "reshape");
    assert_eq!(result.transform_skips[0].reason, SkipReason::NoMeasurementColumns);
    // Cleaned wide table passes through untouched.
    assert_eq!(result.final_table.as_ref().unwrap().row_count(), 3);
}

#[test]
fn test_invalid_pattern_is_config_error() {
    let yaml = "processing:\n  cleaning:\n    total_patterns: ['(unclosed']\n";
    let config = PipelineConfig::from_document(&ConfigDocument::parse(yaml).unwrap()).unwrap();
    assert!(matches!(
        Pipeline::new(config, "inline.yml"),
        Err(EtlError::Regex(_))
    ));
}
