//! Writing the final table and text reports to the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::OutputConfig;
use crate::error::{EtlError, Result};
use crate::input::DataTable;

/// Timestamp format used in every output file name.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*\}").unwrap());

/// Kind of file an export produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Data,
    ValidationReport,
    Summary,
}

impl Artifact {
    pub fn label(&self) -> &'static str {
        match self {
            Artifact::Data => "data",
            Artifact::ValidationReport => "validation_report",
            Artifact::Summary => "summary",
        }
    }
}

/// Outcome of one export; failures are recorded rather than propagated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub artifact: Artifact,
    pub path: Option<PathBuf>,
    pub error: Option<String>,
}

impl ExportRecord {
    pub fn from_result(artifact: Artifact, result: Result<PathBuf>) -> Self {
        match result {
            Ok(path) => {
                info!(artifact = artifact.label(), path = %path.display(), "exported");
                Self {
                    artifact,
                    path: Some(path),
                    error: None,
                }
            }
            Err(e) => {
                warn!(artifact = artifact.label(), error = %e, "export failed");
                Self {
                    artifact,
                    path: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn succeeded(&self) -> bool {
        self.path.is_some()
    }
}

/// Writes artifacts for one region, all sharing a single timestamp.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_directory: PathBuf,
    config: OutputConfig,
    region: String,
    timestamp: String,
}

impl Exporter {
    pub fn new(output_directory: impl Into<PathBuf>, config: &OutputConfig, region: &str) -> Self {
        Self {
            output_directory: output_directory.into(),
            config: config.clone(),
            region: region.to_uppercase(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Fix the timestamp used in file names.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// File name for the data export.
    ///
    /// `{region}` and `{timestamp}` are substituted; any other placeholder
    /// makes the pattern unusable and the default name is used instead.
    pub fn data_file_name(&self) -> String {
        let timestamp = if self.config.include_timestamp {
            self.timestamp.as_str()
        } else {
            ""
        };

        let name = self
            .config
            .filename_pattern
            .replace("{region}", &self.region)
            .replace("{timestamp}", timestamp);

        if PLACEHOLDER.is_match(&name) || name.trim().is_empty() {
            warn!(pattern = %self.config.filename_pattern, "unusable filename pattern, using default");
            return format!("{}_PROCESSED_{}.csv", self.region, self.timestamp);
        }
        name
    }

    pub fn validation_report_path(&self) -> PathBuf {
        self.output_directory.join("reports").join(format!(
            "{}_VALIDATION_REPORT_{}.txt",
            self.region, self.timestamp
        ))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_directory
            .join(format!("{}_PIPELINE_SUMMARY_{}.txt", self.region, self.timestamp))
    }

    /// Write the table as UTF-8 CSV with a header row. Missing cells are empty.
    pub fn export_table(&self, table: &DataTable) -> Result<PathBuf> {
        if table.is_empty() {
            return Err(EtlError::Export("no rows to export".to_string()));
        }

        let path = self.output_directory.join(self.data_file_name());
        write_csv(&path, table)?;
        Ok(path)
    }

    /// Write several named tables as `{prefix}_{name}_{timestamp}.csv`.
    ///
    /// Empty tables are skipped and a failed write is logged; the result maps
    /// each name that was written to its path.
    pub fn export_tables<'a>(
        &self,
        tables: impl IntoIterator<Item = (&'a str, &'a DataTable)>,
        prefix: &str,
    ) -> IndexMap<String, PathBuf> {
        let mut written = IndexMap::new();
        let mut attempted = 0;

        for (name, table) in tables {
            attempted += 1;
            if table.is_empty() {
                warn!(table = name, "skipping empty table");
                continue;
            }
            let path = self
                .output_directory
                .join(format!("{}_{}_{}.csv", prefix, name, self.timestamp));
            match write_csv(&path, table) {
                Ok(()) => {
                    info!(table = name, path = %path.display(), "exported");
                    written.insert(name.to_string(), path);
                }
                Err(e) => warn!(table = name, error = %e, "export failed"),
            }
        }

        info!(written = written.len(), attempted, "batch export finished");
        written
    }

    /// Write an already rendered validation report.
    pub fn export_validation_report(&self, report: &str) -> Result<PathBuf> {
        let path = self.validation_report_path();
        write_text(&path, report)?;
        Ok(path)
    }

    /// Write an already rendered pipeline summary.
    pub fn export_summary(&self, summary: &str) -> Result<PathBuf> {
        let path = self.summary_path();
        write_text(&path, summary)?;
        Ok(path)
    }
}

fn write_csv(path: &Path, table: &DataTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush().map_err(|e| EtlError::io(path, e))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| EtlError::io(dir, e))
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).map_err(|e| EtlError::io(path, e))
}
