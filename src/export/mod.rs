//! Spreadsheet export of issue lists.

use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Spreadsheet error: {0}")]
    XlsxError(#[from] XlsxError),
}

/// Characters kept verbatim in file names
static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid file name pattern"));

/// RFC 5987 attr-char minus the characters percent-encoding leaves alone
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLS_MIME: &str = "application/vnd.ms-excel";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const HEADERS: &[&str] = &[
    "ID",
    "State",
    "Title",
    "Author",
    "Assignee",
    "Milestone",
    "Labels",
    "Comments",
    "Created",
];

/// One issue flattened into spreadsheet cells
#[derive(Debug, Clone, Default)]
pub struct ExportRow {
    pub id: u64,
    pub state: String,
    pub title: String,
    pub author: String,
    pub assignee: String,
    pub milestone: String,
    pub labels: String,
    pub num_of_comments: u32,
    pub created_date: String,
}

/// A generated file ready to be sent as a download
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl ExportFile {
    pub fn content_type(&self) -> String {
        detect_content_type(&self.file_name, &self.content)
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; {}", encode_content_disposition(&self.file_name))
    }
}

/// Write the rows into a single-sheet workbook named `<base_name>.xlsx`
pub fn excel_save(rows: &[ExportRow], base_name: &str) -> Result<ExportFile, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Issues")?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let r = (index + 1) as u32;
        worksheet.write_number(r, 0, row.id as f64)?;
        worksheet.write_string(r, 1, &row.state)?;
        worksheet.write_string(r, 2, &row.title)?;
        worksheet.write_string(r, 3, &row.author)?;
        worksheet.write_string(r, 4, &row.assignee)?;
        worksheet.write_string(r, 5, &row.milestone)?;
        worksheet.write_string(r, 6, &row.labels)?;
        worksheet.write_number(r, 7, f64::from(row.num_of_comments))?;
        worksheet.write_string(r, 8, &row.created_date)?;
    }

    let content = workbook.save_to_buffer()?;

    Ok(ExportFile {
        file_name: format!("{}.xlsx", safe_file_stem(base_name)),
        content,
    })
}

/// Replace runs of characters unsafe in file names with `_`
pub fn safe_file_stem(name: &str) -> String {
    let stem = UNSAFE_FILE_CHARS.replace_all(name, "_").to_string();
    if stem.is_empty() {
        "export".to_string()
    } else {
        stem
    }
}

/// Content type sniffed from the payload, refined by the file name for containers
pub fn detect_content_type(file_name: &str, content: &[u8]) -> String {
    if content.starts_with(ZIP_MAGIC) {
        let guessed = mime_guess::from_path(file_name).first_raw();
        return match guessed {
            Some(XLSX_MIME) => XLSX_MIME.to_string(),
            _ => "application/zip".to_string(),
        };
    }
    if content.starts_with(OLE2_MAGIC) {
        return XLS_MIME.to_string();
    }
    "application/octet-stream".to_string()
}

/// `filename` parameters for a Content-Disposition header.
/// Non-ASCII names get an ASCII fallback plus an RFC 5987 `filename*`.
pub fn encode_content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && c != '"' && c != '\\' && !c.is_ascii_control() {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = utf8_percent_encode(file_name, ATTR_CHAR);
    format!("filename=\"{}\"; filename*=UTF-8''{}", fallback, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("forge_issues"), "forge_issues");
        assert_eq!(safe_file_stem("my project/issues"), "my_project_issues");
        assert_eq!(safe_file_stem(""), "export");
    }

    #[test]
    fn test_encode_ascii_file_name() {
        assert_eq!(
            encode_content_disposition("forge_issues.xlsx"),
            "filename=\"forge_issues.xlsx\"; filename*=UTF-8''forge_issues.xlsx"
        );
    }

    #[test]
    fn test_encode_non_ascii_file_name() {
        let encoded = encode_content_disposition("이슈.xlsx");
        assert!(encoded.starts_with("filename=\"__.xlsx\""));
        assert!(encoded.ends_with("filename*=UTF-8''%EC%9D%B4%EC%8A%88.xlsx"));
    }

    #[test]
    fn test_detect_content_type() {
        assert_eq!(detect_content_type("a.xlsx", b"PK\x03\x04rest"), XLSX_MIME);
        assert_eq!(detect_content_type("a.bin", b"PK\x03\x04rest"), "application/zip");
        assert_eq!(detect_content_type("a.xls", OLE2_MAGIC), XLS_MIME);
        assert_eq!(detect_content_type("a.xlsx", b"plain text"), "application/octet-stream");
    }

    #[test]
    fn test_excel_save_produces_xlsx() {
        let rows = vec![ExportRow {
            id: 1,
            state: "OPEN".to_string(),
            title: "Crash on start".to_string(),
            author: "alice".to_string(),
            labels: "bug".to_string(),
            ..Default::default()
        }];
        let file = excel_save(&rows, "forge_issues").unwrap();

        assert_eq!(file.file_name, "forge_issues.xlsx");
        assert!(file.content.starts_with(ZIP_MAGIC));
        assert_eq!(file.content_type(), XLSX_MIME);
        assert!(file.content_disposition().starts_with("attachment; filename=\"forge_issues.xlsx\""));
    }
}
