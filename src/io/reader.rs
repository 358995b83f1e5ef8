//! Row reader collaborator over CSV sheet files

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::core::errors::{Result, TranslationError};
use crate::core::models::Row;
use crate::io::{csv, resolve_sheet_path};

/// Produces ordered rows for the pipeline
pub trait RowReader: Send + Sync {
    fn read_rows(&self, path: &Path, sheet_name: &str) -> Result<Vec<Row>>;
}

/// Reads the source language column out of a CSV sheet.
///
/// Row 1 holds language column headers (e.g. `en-US`); data rows start
/// at 2 and keep their spreadsheet row numbers. Falsy cell values like
/// `0`, `false` or the empty string are real values, not absence.
pub struct CsvSheetReader {
    source_column: String,
    skip_formulas: bool,
}

impl CsvSheetReader {
    pub fn new(source_column: impl Into<String>, skip_formulas: bool) -> Self {
        Self {
            source_column: source_column.into(),
            skip_formulas,
        }
    }
}

impl RowReader for CsvSheetReader {
    fn read_rows(&self, path: &Path, sheet_name: &str) -> Result<Vec<Row>> {
        let sheet_path = resolve_sheet_path(path, sheet_name);
        let content =
            fs::read_to_string(&sheet_path).map_err(|e| TranslationError::FileError {
                path: sheet_path.display().to_string(),
                message: e.to_string(),
            })?;

        let records = csv::parse(&content);
        let headers = records.first().ok_or_else(|| TranslationError::FileError {
            path: sheet_path.display().to_string(),
            message: "sheet is empty".to_string(),
        })?;

        let column = find_column(headers, &self.source_column).ok_or_else(|| {
            TranslationError::ConfigError {
                message: format!(
                    "Source column '{}' not found in sheet '{}'",
                    self.source_column, sheet_name
                ),
            }
        })?;

        let mut rows = Vec::with_capacity(records.len().saturating_sub(1));
        for (index, record) in records.iter().enumerate().skip(1) {
            let row_num = index + 1;
            let mut text = record.get(column).cloned().unwrap_or_default();

            if self.skip_formulas && text.starts_with('=') {
                debug!("Skipping formula cell at row {}", row_num);
                text = String::new();
            }

            rows.push(Row::new(row_num, text));
        }

        info!(
            "Read {} rows from {} (column '{}')",
            rows.len(),
            sheet_path.display(),
            self.source_column
        );
        Ok(rows)
    }
}

/// Map a language column header to its index
pub(crate) fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}
