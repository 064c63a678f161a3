//! Report text input

use crate::{PipelineError, Result};
use std::path::Path;
use tracing::debug;

/// Read an inspection report as plain text. PDFs go through `pdf-extract`;
/// anything else is read as UTF-8 text.
pub fn read_report_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        pdf_extract::extract_text(path).map_err(|e| PipelineError::ReportInput {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        std::fs::read_to_string(path).map_err(|e| PipelineError::ReportInput {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };

    debug!(path = %path.display(), chars = text.chars().count(), pdf = is_pdf, "Read report text");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "Insured: Richard Daly\n").unwrap();
        assert_eq!(read_report_text(&path).unwrap(), "Insured: Richard Daly\n");
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        let err = read_report_text(&path).unwrap_err();
        assert!(matches!(&err, PipelineError::ReportInput { path: p, .. } if p == &path));
    }
}
