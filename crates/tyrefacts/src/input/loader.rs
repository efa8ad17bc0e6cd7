//! Loading every configured source file into a stamped table.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::parser::{Parser, ParserConfig};
use super::source::{DataTable, SourceMetadata};
use crate::config::{DataSourcesConfig, SourceConfig};
use crate::schema::Value;

/// A successfully loaded source.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub table: DataTable,
    pub metadata: SourceMetadata,
}

/// A source that could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSource {
    pub name: String,
    pub path: Option<PathBuf>,
    pub reason: String,
}

/// Result of loading all sources. Loading never fails as a whole; it is up to
/// the caller to decide whether zero loaded sources is fatal.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Loaded sources in configuration order.
    pub sources: IndexMap<String, LoadedSource>,
    pub skipped: Vec<SkippedSource>,
}

impl LoadReport {
    pub fn total_rows(&self) -> usize {
        self.sources.values().map(|s| s.table.row_count()).sum()
    }
}

/// Reads source files relative to an input directory.
pub struct SourceLoader {
    input_directory: PathBuf,
    parser: Parser,
}

impl SourceLoader {
    pub fn new(input_directory: impl Into<PathBuf>) -> Self {
        Self::with_parser_config(input_directory, ParserConfig::default())
    }

    pub fn with_parser_config(input_directory: impl Into<PathBuf>, config: ParserConfig) -> Self {
        Self {
            input_directory: input_directory.into(),
            parser: Parser::with_config(config),
        }
    }

    /// Load every source in `config.sources`.
    ///
    /// Each table gets the source name in `config.source_column` (if set),
    /// then each of the source's `constants` not already present as a column.
    pub fn load_all(&self, config: &DataSourcesConfig) -> LoadReport {
        let mut report = LoadReport::default();

        for (name, source) in &config.sources {
            match self.load_one(name, source, config.source_column.as_deref()) {
                Ok(loaded) => {
                    info!(
                        source = %name,
                        file = %loaded.metadata.file,
                        rows = loaded.table.row_count(),
                        columns = loaded.table.column_count(),
                        "loaded source"
                    );
                    report.sources.insert(name.clone(), loaded);
                }
                Err(skipped) => {
                    warn!(source = %name, reason = %skipped.reason, "skipping source");
                    report.skipped.push(skipped);
                }
            }
        }

        info!(
            loaded = report.sources.len(),
            configured = config.sources.len(),
            "source loading finished"
        );
        report
    }

    fn load_one(
        &self,
        name: &str,
        source: &SourceConfig,
        source_column: Option<&str>,
    ) -> std::result::Result<LoadedSource, SkippedSource> {
        let Some(file) = &source.file else {
            return Err(SkippedSource {
                name: name.to_string(),
                path: None,
                reason: "no file configured".to_string(),
            });
        };

        let path = self.input_directory.join(file);
        let (mut table, metadata) = self.parser.parse_file(&path).map_err(|e| SkippedSource {
            name: name.to_string(),
            path: Some(path.clone()),
            reason: e.to_string(),
        })?;

        if let Some(column) = source_column {
            table = table.with_constant_column(column, Value::Text(name.to_string()));
        }
        for (column, value) in &source.constants {
            if !table.has_column(column) {
                table = table.with_constant_column(column, Value::Text(value.clone()));
            }
        }

        Ok(LoadedSource { table, metadata })
    }
}
