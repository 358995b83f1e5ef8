//! Reader/writer collaborators for sheet files
//!
//! The pipeline only depends on the [`RowReader`] and [`RowWriter`]
//! contracts; the CSV implementations here cover TIA Portal exports
//! converted to CSV. A workbook may be a single sheet file or a
//! directory holding one `<sheet name>.csv` per sheet.

pub mod csv;
pub mod reader;
pub mod writer;

use std::path::{Path, PathBuf};

pub use reader::{CsvSheetReader, RowReader};
pub use writer::{CsvSheetWriter, RowWriter};

/// Resolve a workbook path plus sheet name to the concrete sheet file
pub(crate) fn resolve_sheet_path(path: &Path, sheet_name: &str) -> PathBuf {
    if path.is_dir() {
        path.join(format!("{}.csv", sheet_name))
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_passes_through() {
        let path = Path::new("texts.csv");
        assert_eq!(resolve_sheet_path(path, "User Texts"), path);
    }

    #[test]
    fn test_directory_joins_sheet_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let resolved = resolve_sheet_path(dir.path(), "User Texts");
        assert_eq!(resolved, dir.path().join("User Texts.csv"));
    }
}
