//! CSV/TSV parser with delimiter detection.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use super::source::{DataTable, SourceMetadata};
use crate::error::{EtlError, Result};

/// Delimiters to try when auto-detecting, preferred first on ties.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Records read when sniffing the delimiter.
const SNIFF_RECORDS: usize = 20;

/// Strings read as missing at load time.
const DEFAULT_NA_VALUES: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Quote character.
    pub quote: u8,
    /// Exact cell contents treated as missing.
    pub na_values: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
            na_values: DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Parses delimited source files into typed tables.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the data table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| EtlError::io(path, e))?;
        let size_bytes = file.metadata().map_err(|e| EtlError::io(path, e))?.len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| EtlError::io(path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };

        let data_table = self.parse_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        let source_metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format,
            data_table.row_count(),
            data_table.column_count(),
        );

        Ok((data_table, source_metadata))
    }

    /// Parse bytes directly.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<DataTable> {
        // Excel exports often carry a BOM.
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(EtlError::EmptyData("No columns found".to_string()));
        }

        let expected_cols = headers.len();
        let mut rows = Vec::new();

        for result in reader.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            row.resize(expected_cols, String::new());
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(EtlError::EmptyData("No data rows found".to_string()));
        }

        Ok(DataTable::from_raw(headers, rows, &self.config.na_values))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the delimiter that splits the header into the most fields while
/// most of the first records agree with that width.
///
/// Each candidate runs through the CSV reader itself, so quoted fields and
/// embedded newlines are honoured. Ragged trailing rows do not disqualify a
/// candidate as long as at least half the sample matches the header.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(EtlError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best: Option<(u8, usize)> = None;
    for &delimiter in DELIMITERS {
        let Some(width) = header_width(bytes, delimiter) else {
            continue;
        };
        if width >= 2 && best.is_none_or(|(_, w)| width > w) {
            best = Some((delimiter, width));
        }
    }

    Ok(best.map(|(d, _)| d).unwrap_or(b','))
}

/// Header field count, if at least half the sampled records share it.
fn header_width(bytes: &[u8], delimiter: u8) -> Option<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let widths: Vec<usize> = reader
        .records()
        .take(SNIFF_RECORDS)
        .map(|r| r.map(|record| record.len()))
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    let header = *widths.first()?;
    let agreeing = widths.iter().filter(|&&w| w == header).count();
    (agreeing * 2 >= widths.len()).then_some(header)
}
