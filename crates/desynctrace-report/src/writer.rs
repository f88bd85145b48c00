use std::path::Path;

use crate::error::ReportError;
use crate::model::ScanReport;
use crate::printer::render_text;

/// Writes `report` as pretty-printed JSON to `path`, the shape downstream
/// tooling and the `report` CLI subcommand both consume.
pub fn write_json(report: &ScanReport, path: &Path) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the same plain-text rendering [`crate::print_summary`] prints to
/// the terminal to `path` instead, with no color codes.
pub fn write_text(report: &ScanReport, path: &Path) -> Result<(), ReportError> {
    std::fs::write(path, render_text(report)).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a previously written report back, for the `report <file>`
/// subcommand's re-render path.
pub fn read_json(path: &Path) -> Result<ScanReport, ReportError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = ScanReport::new("http://example.test/", "2026-07-30T00:00:00Z", "1.0s", None, &[]);

        write_json(&report, &path).unwrap();
        let back = read_json(&path).unwrap();
        assert_eq!(report, back);
    }

    #[test]
    fn write_text_produces_a_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let report = ScanReport::new("http://example.test/", "2026-07-30T00:00:00Z", "1.0s", None, &[]);

        write_text(&report, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("desync scan"));
    }
}
