use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file format: .{0}")]
    Unsupported(String),
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("spreadsheet extraction failed: {0}")]
    Spreadsheet(String),
}

/// Extract the plain text of a document, dispatching on its file extension.
///
/// Blocking: callers inside async handlers should run this on the blocking
/// thread pool.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => extract_pdf(path),
        "xlsx" => extract_xlsx(path),
        "csv" => extract_csv(path),
        "txt" | "md" => Ok(fs::read_to_string(path)?),
        other => Err(ExtractError::Unsupported(other.to_string())),
    }
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_xlsx(path: &Path) -> Result<String, ExtractError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;

    let mut out = String::new();
    let sheet_names = workbook.sheet_names().to_owned();

    for name in sheet_names {
        out.push_str(&format!("Sheet: {}\n", name));

        let range = match workbook.worksheet_range(&name) {
            Some(Ok(range)) => range,
            Some(Err(e)) => return Err(ExtractError::Spreadsheet(e.to_string())),
            None => continue,
        };

        if range.is_empty() {
            out.push_str("(Empty sheet)\n");
            continue;
        }

        for row in range.rows() {
            let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
    }

    Ok(out)
}

/// Render each data row as `header: value | header: value` so column meaning
/// survives the flattening into prompt text.
fn extract_csv(path: &Path) -> Result<String, ExtractError> {
    let raw = fs::read_to_string(path)?;
    let mut lines = raw.lines().filter(|l| !l.trim().is_empty());

    let headers: Vec<&str> = match lines.next() {
        Some(header_line) => header_line.split(',').map(str::trim).collect(),
        None => return Ok(String::new()),
    };

    let mut out = String::new();
    for line in lines {
        let values = line.split(',').map(str::trim);
        let row: Vec<String> = headers
            .iter()
            .zip(values)
            .map(|(header, value)| format!("{}: {}", header, value))
            .collect();
        out.push_str(&row.join(" | "));
        out.push('\n');
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn plain_text_is_returned_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.txt", "hello\nworld");
        assert_eq!(extract_text(&path).unwrap(), "hello\nworld");
    }

    #[test]
    fn markdown_counts_as_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "readme.md", "# Title");
        assert_eq!(extract_text(&path).unwrap(), "# Title");
    }

    #[test]
    fn csv_rows_are_labeled_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "people.csv", "name,age\nalice,30\nbob,41\n");
        let text = extract_text(&path).unwrap();
        assert_eq!(text, "name: alice | age: 30\nname: bob | age: 41\n");
    }

    #[test]
    fn empty_csv_extracts_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.csv", "");
        assert_eq!(extract_text(&path).unwrap(), "");
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "program.exe", "binary");
        assert!(matches!(
            extract_text(&path),
            Err(ExtractError::Unsupported(ext)) if ext == "exe"
        ));
    }
}
