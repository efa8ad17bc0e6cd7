//! Run command - execute the pipeline for one configuration.

use std::path::PathBuf;

use colored::Colorize;
use tyrefacts::{Pipeline, PipelineResult, RunOptions};

pub fn run(
    config: PathBuf,
    no_export: bool,
    no_validation_report: bool,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !config.exists() {
        return Err(format!(
            "Configuration not found: {}\nRun 'tyrefacts configs' to list available files.",
            config.display()
        )
        .into());
    }

    let pipeline = Pipeline::from_config_path(&config)?;
    let mut result = pipeline.run(run_options(no_export, no_validation_report));
    if !no_export && result.success {
        let record = pipeline.export_summary(&result);
        result.exports.push(record);
    }

    if json_output {
        println!("{}", result.to_json()?);
    } else {
        let min_rate = pipeline.config().validation.consistency_check.min_consistency_rate;
        print_summary(&result, min_rate, verbose);
    }

    match result.error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// The data export and the validation report are switched independently.
fn run_options(no_export: bool, no_validation_report: bool) -> RunOptions {
    RunOptions {
        export_data: !no_export,
        export_report: !no_validation_report,
    }
}

fn print_summary(result: &PipelineResult, min_rate: f64, verbose: bool) {
    println!(
        "{} {} ({})",
        "Pipeline run for".cyan().bold(),
        result.region.white().bold(),
        result.config_path.display()
    );
    println!();

    let stages = &result.stages;
    if let Some(loading) = &stages.loading {
        println!("{}", "Loading:".yellow().bold());
        println!("  Files:  {}", loading.files_loaded.to_string().white());
        println!("  Rows:   {}", loading.total_rows.to_string().white());
        println!("  Sources: {}", loading.data_sources.join(", "));
    }
    for skipped in &result.skipped_sources {
        println!("  {} {}: {}", "skipped".red(), skipped.name, skipped.reason);
    }

    if let Some(cleaning) = &stages.cleaning {
        println!("{}", "Cleaning:".yellow().bold());
        println!(
            "  Rows:   {} -> {}",
            cleaning.total_rows_before,
            cleaning.total_rows_after.to_string().white()
        );
        println!(
            "  Removed: {} ({} aggregate)",
            cleaning.rows_removed, cleaning.aggregate_rows_removed
        );
    }

    if let Some(transformation) = &stages.transformation {
        println!("{}", "Transformation:".yellow().bold());
        println!(
            "  Long rows: {} -> {}",
            transformation.total_rows_before_transform,
            transformation.total_rows_after_transform
        );
        println!(
            "  Final:  {} rows x {} columns",
            transformation.final_rows.to_string().white().bold(),
            transformation.final_columns
        );
    }
    if verbose {
        for skip in &result.transform_skips {
            println!(
                "  {} {} for {}: {}",
                "skipped".yellow(),
                skip.stage,
                skip.source.as_deref().unwrap_or("combined data"),
                skip.reason
            );
        }
    }

    if let Some(validation) = &result.validation {
        println!("{}", "Validation:".yellow().bold());
        let status = if validation.passed() {
            "PASSED".green().bold()
        } else {
            "ISSUES FOUND".red().bold()
        };
        println!("  Status: {}", status);
        if let Some(rate) = stages.validation.as_ref().and_then(|s| s.consistency_rate) {
            let rate_str = format!("{:.2}%", rate);
            let colored_rate = if rate >= min_rate {
                rate_str.green()
            } else {
                rate_str.red()
            };
            println!("  Price consistency: {}", colored_rate);
        }
        for issue in validation.issues() {
            println!("  - {}", issue);
        }
    }

    if !result.exports.is_empty() {
        println!("{}", "Exports:".yellow().bold());
        for record in &result.exports {
            match (&record.path, &record.error) {
                (Some(path), _) => println!(
                    "  {:<18} {}",
                    record.artifact.label(),
                    path.display().to_string().cyan()
                ),
                (None, Some(error)) => {
                    println!("  {:<18} {}", record.artifact.label(), error.red())
                }
                (None, None) => {}
            }
        }
    }
    println!();

    if result.success {
        println!(
            "{} in {:.2}s",
            "Pipeline completed".green().bold(),
            result.duration_secs
        );
    } else {
        println!(
            "{} after {:.2}s",
            "Pipeline failed".red().bold(),
            result.duration_secs
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_config(dir: &Path, csv: &str) -> PathBuf {
        fs::write(dir.join("germany.csv"), csv).unwrap();
        let yaml = format!(
            r#"
data_sources:
  region: test
  input_directory: "{input}"
  output_directory: "{output}"
  countries:
    Germany: {{ file: germany.csv }}
processing:
  date_mapping:
    "JUN 24": "2024-06-01"
"#,
            input = dir.display(),
            output = dir.join("out").display()
        );
        let path = dir.join("test.yml");
        fs::write(&path, yaml).unwrap();
        path
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[test]
    fn test_flags_are_independent() {
        assert_eq!(
            run_options(true, false),
            RunOptions {
                export_data: false,
                export_report: true
            }
        );
        assert_eq!(
            run_options(false, true),
            RunOptions {
                export_data: true,
                export_report: false
            }
        );
    }

    #[test]
    fn test_no_export_still_writes_validation_report() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "Brand,JUN 24\nA,10\n");

        run(config, true, false, true, false).unwrap();

        // Only the reports directory: no data file, no summary.
        let out = dir.path().join("out");
        assert_eq!(files_in(&out), vec!["reports"]);
        let reports = files_in(&out.join("reports"));
        assert_eq!(reports.len(), 1);
        assert!(reports[0].starts_with("TEST_VALIDATION_REPORT_"));
    }

    #[test]
    fn test_failed_run_writes_no_summary() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "Brand,JUN 24\nA,10\n");
        fs::remove_file(dir.path().join("germany.csv")).unwrap();

        assert!(run(config, false, false, true, false).is_err());
        assert!(files_in(&dir.path().join("out")).is_empty());
    }

    #[test]
    fn test_full_run_writes_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "Brand,JUN 24\nA,10\n");

        run(config, false, false, true, false).unwrap();

        let out = files_in(&dir.path().join("out"));
        assert_eq!(out.len(), 3, "{:?}", out);
        assert!(out.iter().any(|f| f.starts_with("TEST_PIPELINE_SUMMARY_")));
        assert!(out.iter().any(|f| f.starts_with("TEST_PROCESSED_")));
    }
}
