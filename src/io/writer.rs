//! Row writer collaborator with atomic save semantics

use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::core::errors::{Result, TranslationError};
use crate::core::models::RowResult;
use crate::io::reader::find_column;
use crate::io::{csv, resolve_sheet_path};

/// Consumes the full ordered result set
pub trait RowWriter: Send + Sync {
    fn write(
        &self,
        input_path: &Path,
        sheet_name: &str,
        results: &[RowResult],
        output_path: &Path,
    ) -> Result<()>;
}

/// Fills the target language column of a CSV sheet.
///
/// All other columns pass through untouched. The output is written to
/// a temporary file in the destination directory and moved into place,
/// so a failed run never leaves a half-written sheet behind.
pub struct CsvSheetWriter {
    target_column: String,
}

impl CsvSheetWriter {
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
        }
    }
}

impl RowWriter for CsvSheetWriter {
    fn write(
        &self,
        input_path: &Path,
        sheet_name: &str,
        results: &[RowResult],
        output_path: &Path,
    ) -> Result<()> {
        let sheet_path = resolve_sheet_path(input_path, sheet_name);
        let content =
            fs::read_to_string(&sheet_path).map_err(|e| TranslationError::FileError {
                path: sheet_path.display().to_string(),
                message: e.to_string(),
            })?;

        let mut records = csv::parse(&content);
        let headers = records.first().ok_or_else(|| TranslationError::FileError {
            path: sheet_path.display().to_string(),
            message: "sheet is empty".to_string(),
        })?;

        let column = find_column(headers, &self.target_column).ok_or_else(|| {
            TranslationError::ConfigError {
                message: format!(
                    "Target column '{}' not found in sheet '{}'",
                    self.target_column, sheet_name
                ),
            }
        })?;

        for result in results {
            let Some(record) = records.get_mut(result.row_num - 1) else {
                continue;
            };
            if record.len() <= column {
                record.resize(column + 1, String::new());
            }
            record[column] = result.translated_text.clone();
        }

        atomic_save(&csv::format(&records), output_path)?;
        info!("Saved translated sheet: {}", output_path.display());
        Ok(())
    }
}

/// Write to a sibling temp file, then move it over the destination
fn atomic_save(content: &str, output_path: &Path) -> Result<()> {
    let parent = output_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| TranslationError::WriteError {
        path: parent.display().to_string(),
        message: e.to_string(),
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
        TranslationError::WriteError {
            path: output_path.display().to_string(),
            message: e.to_string(),
        }
    })?;
    temp.write_all(content.as_bytes())
        .map_err(|e| TranslationError::WriteError {
            path: output_path.display().to_string(),
            message: e.to_string(),
        })?;
    temp.persist(output_path)
        .map_err(|e| TranslationError::WriteError {
            path: output_path.display().to_string(),
            message: e.to_string(),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn results(translations: &[(usize, &str)]) -> Vec<RowResult> {
        translations
            .iter()
            .map(|(row_num, text)| RowResult::ok(*row_num, String::new(), (*text).to_string()))
            .collect()
    }

    #[test]
    fn test_fills_target_column_only() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("texts.csv");
        fs::write(&input, "en-US,de-DE,fr-FR\none,,un\ntwo,,deux\n").unwrap();
        let output = dir.path().join("out.csv");

        let writer = CsvSheetWriter::new("de-DE");
        writer
            .write(&input, "User Texts", &results(&[(2, "eins"), (3, "zwei")]), &output)
            .unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written, "en-US,de-DE,fr-FR\none,eins,un\ntwo,zwei,deux\n");
    }

    #[test]
    fn test_error_rows_leave_cell_empty() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("texts.csv");
        fs::write(&input, "en-US,de-DE\none,\n").unwrap();
        let output = dir.path().join("out.csv");

        let failed = vec![RowResult::failed(2, "one".to_string(), "boom")];
        CsvSheetWriter::new("de-DE")
            .write(&input, "User Texts", &failed, &output)
            .unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written, "en-US,de-DE\none,\n");
    }

    #[test]
    fn test_multiline_translations_stay_quoted() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("texts.csv");
        fs::write(&input, "en-US,de-DE\nlong line,\n").unwrap();
        let output = dir.path().join("out.csv");

        CsvSheetWriter::new("de-DE")
            .write(&input, "User Texts", &results(&[(2, "zwei\nZeilen")]), &output)
            .unwrap();

        let records = csv::parse(&fs::read_to_string(&output).unwrap());
        assert_eq!(records[1][1], "zwei\nZeilen");
    }

    #[test]
    fn test_overwrite_replaces_destination_atomically() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("texts.csv");
        fs::write(&input, "en-US,de-DE\none,\n").unwrap();
        let output = dir.path().join("out.csv");
        fs::write(&output, "stale content").unwrap();

        CsvSheetWriter::new("de-DE")
            .write(&input, "User Texts", &results(&[(2, "eins")]), &output)
            .unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert!(!written.contains("stale"));
        assert!(written.contains("eins"));
    }

    #[test]
    fn test_missing_target_column_is_an_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("texts.csv");
        fs::write(&input, "en-US\none\n").unwrap();

        let err = CsvSheetWriter::new("de-DE")
            .write(&input, "User Texts", &results(&[(2, "eins")]), &dir.path().join("out.csv"))
            .unwrap_err();
        assert!(matches!(err, TranslationError::ConfigError { .. }));
    }
}
