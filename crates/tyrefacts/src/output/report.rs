//! Plain-text rendering of validation results and run summaries.

use std::fmt::{self, Write};

use chrono::{DateTime, Local};

use crate::pipeline::PipelineResult;
use crate::validation::{ConsistencySummary, ValidationResult};

const RULE_WIDTH: usize = 80;

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

/// Render the detailed validation report.
pub fn render_validation_report(
    result: &ValidationResult,
    region: &str,
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    let _ = write_validation_report(&mut out, result, region, generated_at);
    out
}

fn write_validation_report(
    out: &mut String,
    result: &ValidationResult,
    region: &str,
    generated_at: DateTime<Local>,
) -> fmt::Result {
    writeln!(out, "{}", rule('='))?;
    writeln!(out, " {} DATA VALIDATION REPORT", region.to_uppercase())?;
    writeln!(out, "{}", rule('='))?;
    writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out)?;

    writeln!(out, "[Overview]")?;
    writeln!(out, "Rows: {}", result.total_rows())?;
    writeln!(out, "Columns: {}", result.total_columns())?;
    writeln!(
        out,
        "Status: {}",
        if result.passed() { "PASSED" } else { "ISSUES FOUND" }
    )?;
    writeln!(out)?;

    let completeness = result.completeness();
    if !completeness.missing_values.is_empty() {
        writeln!(out, "[Missing values]")?;
        for (column, stats) in &completeness.missing_values {
            writeln!(out, "{}: {} ({:.1}%)", column, stats.count, stats.percentage)?;
        }
        writeln!(out)?;
    }
    if completeness.empty_rows > 0 || completeness.duplicate_rows > 0 {
        writeln!(out, "Empty rows: {}", completeness.empty_rows)?;
        writeln!(out, "Duplicate rows: {}", completeness.duplicate_rows)?;
        writeln!(out)?;
    }

    match result.consistency() {
        Some(ConsistencySummary::Checked(stats)) => {
            writeln!(out, "[Price consistency]")?;
            writeln!(out, "Rows checked: {}", stats.rows_checked)?;
            writeln!(out, "Consistent: {}", stats.consistent_rows)?;
            writeln!(out, "Inconsistent: {}", stats.inconsistent_rows)?;
            writeln!(out, "Consistency rate: {:.2}%", stats.consistency_rate)?;
            writeln!(out, "Large differences: {}", stats.large_differences)?;
            writeln!(out, "Largest difference: {}", stats.max_difference)?;
            writeln!(out)?;
        }
        Some(ConsistencySummary::Unavailable { missing_columns }) => {
            writeln!(out, "[Price consistency]")?;
            writeln!(out, "Unavailable, missing columns: {}", missing_columns.join(", "))?;
            writeln!(out)?;
        }
        Some(ConsistencySummary::NoRows) => {
            writeln!(out, "[Price consistency]")?;
            writeln!(out, "Unavailable, no complete rows")?;
            writeln!(out)?;
        }
        None => {}
    }

    if let Some(negatives) = result.negative_values() {
        writeln!(out, "[Negative values]")?;
        writeln!(out, "Rows with negatives: {}", negatives.total_negative_rows)?;
        for (column, info) in &negatives.columns_with_negatives {
            writeln!(
                out,
                "  {}: {} ({:.1}%), min {}",
                column, info.count, info.percentage, info.min_value
            )?;
        }
        writeln!(out)?;
    }

    if !result.data_types().is_empty() {
        writeln!(out, "[Column types]")?;
        for (column, info) in result.data_types() {
            writeln!(
                out,
                "{}: {} (distinct: {}, missing: {})",
                column, info.dtype, info.distinct_count, info.null_count
            )?;
        }
        writeln!(out)?;
    }

    if !result.issues().is_empty() {
        writeln!(out, "[Issues]")?;
        for (i, issue) in result.issues().iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, issue)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", rule('='))
}

/// Render the run summary written next to the exported data.
pub fn render_pipeline_summary(result: &PipelineResult) -> String {
    let mut out = String::new();
    let _ = write_pipeline_summary(&mut out, result);
    out
}

fn write_pipeline_summary(out: &mut String, result: &PipelineResult) -> fmt::Result {
    writeln!(out, "{}", rule('='))?;
    writeln!(out, " PIPELINE SUMMARY")?;
    writeln!(out, "{}", rule('='))?;
    writeln!(out, "Config: {}", result.config_path.display())?;
    writeln!(out, "Region: {}", result.region)?;
    writeln!(out, "Started: {}", result.started_at.format("%Y-%m-%d %H:%M:%S"))?;
    if let Some(finished) = result.finished_at {
        writeln!(out, "Finished: {}", finished.format("%Y-%m-%d %H:%M:%S"))?;
    }
    writeln!(out, "Duration: {:.2}s", result.duration_secs)?;
    writeln!(out, "Status: {}", if result.success { "success" } else { "failed" })?;
    if let Some(error) = &result.error {
        writeln!(out, "Error: {}", error)?;
    }
    writeln!(out)?;

    let stages = &result.stages;
    if let Some(s) = &stages.loading {
        writeln!(out, "[Loading]")?;
        writeln!(out, "  files_loaded: {}", s.files_loaded)?;
        writeln!(out, "  total_rows: {}", s.total_rows)?;
        writeln!(out, "  data_sources: {}", s.data_sources.join(", "))?;
    }
    for skipped in &result.skipped_sources {
        writeln!(out, "  skipped {}: {}", skipped.name, skipped.reason)?;
    }
    if let Some(s) = &stages.cleaning {
        writeln!(out, "[Cleaning]")?;
        writeln!(out, "  files_cleaned: {}", s.files_cleaned)?;
        writeln!(out, "  total_rows_before: {}", s.total_rows_before)?;
        writeln!(out, "  total_rows_after: {}", s.total_rows_after)?;
        writeln!(out, "  rows_removed: {}", s.rows_removed)?;
    }
    if let Some(s) = &stages.transformation {
        writeln!(out, "[Transformation]")?;
        writeln!(out, "  files_transformed: {}", s.files_transformed)?;
        writeln!(out, "  total_rows_before_transform: {}", s.total_rows_before_transform)?;
        writeln!(out, "  total_rows_after_transform: {}", s.total_rows_after_transform)?;
        writeln!(out, "  final_rows: {}", s.final_rows)?;
        writeln!(out, "  final_columns: {}", s.final_columns)?;
    }
    for skip in &result.transform_skips {
        writeln!(
            out,
            "  {} skipped for {}: {}",
            skip.stage,
            skip.source.as_deref().unwrap_or("combined data"),
            skip.reason
        )?;
    }
    if let Some(s) = &stages.validation {
        writeln!(out, "[Validation]")?;
        writeln!(out, "  validation_passed: {}", s.validation_passed)?;
        writeln!(out, "  issues_found: {}", s.issues_found)?;
        if let Some(rate) = s.consistency_rate {
            writeln!(out, "  consistency_rate: {:.2}%", rate)?;
        }
    }
    if let Some(s) = &stages.export {
        writeln!(out, "[Export]")?;
        writeln!(out, "  files_exported: {}", s.files_exported)?;
        for (kind, path) in &s.export_paths {
            writeln!(out, "  {}: {}", kind, path.display())?;
        }
    }

    writeln!(out, "{}", rule('='))
}
