//! Optional per-row run report
//!
//! Written after the output sheet is saved; the format follows the
//! file extension of the report path.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::errors::{Result, TranslationError};
use crate::core::models::RowResult;
use crate::io::csv;

/// Write a per-row report as JSON or CSV, chosen by extension
pub fn write_report(results: &[RowResult], path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let content = match extension.as_str() {
        "json" => serde_json::to_string_pretty(results)?,
        "csv" => to_csv(results),
        other => {
            return Err(TranslationError::ConfigError {
                message: format!(
                    "unsupported report format '{}', expected .json or .csv",
                    other
                ),
            })
        }
    };

    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TranslationError::WriteError {
            path: parent.display().to_string(),
            message: e.to_string(),
        })?;
    }
    fs::write(path, content).map_err(|e| TranslationError::WriteError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    info!("Wrote report: {}", path.display());
    Ok(())
}

fn to_csv(results: &[RowResult]) -> String {
    let mut records = Vec::with_capacity(results.len() + 1);
    records.push(vec![
        "row_num".to_string(),
        "source_text".to_string(),
        "translated_text".to_string(),
        "error".to_string(),
    ]);
    for result in results {
        records.push(vec![
            result.row_num.to_string(),
            result.source_text.clone(),
            result.translated_text.clone(),
            result.error.clone().unwrap_or_default(),
        ]);
    }
    csv::format(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<RowResult> {
        vec![
            RowResult::ok(2, "hello".into(), "hallo".into()),
            RowResult::failed(3, "multi\nline, text".into(), "Provider error: boom"),
        ]
    }

    #[test]
    fn test_json_report_roundtrips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        write_report(&sample(), &path).unwrap();

        let parsed: Vec<RowResult> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].translated_text, "hallo");
        assert_eq!(parsed[1].error.as_deref(), Some("Provider error: boom"));
    }

    #[test]
    fn test_csv_report_has_header_and_escaping() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");

        write_report(&sample(), &path).unwrap();

        let records = csv::parse(&fs::read_to_string(&path).unwrap());
        assert_eq!(
            records[0],
            vec!["row_num", "source_text", "translated_text", "error"]
        );
        assert_eq!(records[1][0], "2");
        assert_eq!(records[2][1], "multi\nline, text");
    }

    #[test]
    fn test_unknown_extension_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = write_report(&sample(), &dir.path().join("report.txt")).unwrap_err();
        assert!(matches!(err, TranslationError::ConfigError { .. }));
    }
}
