use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use crate::domain::guest::CreateGuest;
use super::errors::ImportError;

const FIRST_NAME: &str = "first_name";
const LAST_NAME: &str = "last_name";
const PHONE: &str = "phone";
const RELATIONSHIP: &str = "relationship";
const FAMILY_GROUP: &str = "family_group";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Xlsx,
}

impl ImportFormat {
    /// Pick the format from an upload's file name (extension, case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self, ImportError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") => Ok(ImportFormat::Csv),
            Some("xlsx") => Ok(ImportFormat::Xlsx),
            _ => Err(ImportError::UnsupportedFormat(filename.to_string())),
        }
    }
}

/// One data row with its 1-based spreadsheet row number (header is row 1)
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub row: usize,
    pub input: CreateGuest,
}

/// Header name → column index, with the required columns checked
struct Columns {
    index: HashMap<String, usize>,
    require_family_group: bool,
}

impl Columns {
    fn from_header<S: AsRef<str>>(header: &[S], require_family_group: bool) -> Result<Self, ImportError> {
        let index: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_ref().trim().to_lowercase(), i))
            .collect();

        let mut required = vec![FIRST_NAME, LAST_NAME, PHONE, RELATIONSHIP];
        if require_family_group {
            required.push(FAMILY_GROUP);
        }
        for column in required {
            if !index.contains_key(column) {
                return Err(ImportError::MissingColumn(column));
            }
        }

        Ok(Self { index, require_family_group })
    }

    /// Highest index a row must reach to carry every known column
    fn max_index(&self) -> usize {
        [FIRST_NAME, LAST_NAME, PHONE, RELATIONSHIP, FAMILY_GROUP]
            .iter()
            .filter_map(|c| self.index.get(*c))
            .copied()
            .max()
            .unwrap_or(0)
    }

    fn cell<'a>(&self, record: &'a [String], column: &str) -> &'a str {
        self.index
            .get(column)
            .and_then(|&i| record.get(i))
            .map(|v| v.trim())
            .unwrap_or("")
    }

    fn to_input(&self, row: usize, record: &[String]) -> Result<ImportRow, ImportError> {
        let family_group = match self.cell(record, FAMILY_GROUP) {
            "" if self.require_family_group => return Err(ImportError::MissingFamilyGroup { row }),
            "" => None,
            raw => Some(raw.parse::<i64>().map_err(|_| ImportError::InvalidFamilyGroup {
                row,
                value: raw.to_string(),
            })?),
        };

        Ok(ImportRow {
            row,
            input: CreateGuest {
                first_name: self.cell(record, FIRST_NAME).to_string(),
                last_name: self.cell(record, LAST_NAME).to_string(),
                phone: Some(self.cell(record, PHONE).to_string()),
                relationship: self.cell(record, RELATIONSHIP).to_string(),
                family_group,
            },
        })
    }
}

pub fn parse(format: ImportFormat, bytes: &[u8], require_family_group: bool) -> Result<Vec<ImportRow>, ImportError> {
    match format {
        ImportFormat::Csv => parse_csv(bytes, require_family_group),
        ImportFormat::Xlsx => parse_xlsx(bytes, require_family_group),
    }
}

/// Rows must all have the header's width.
pub fn parse_csv(bytes: &[u8], require_family_group: bool) -> Result<Vec<ImportRow>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(bytes);
    let mut records = reader.records();

    let header = records.next().ok_or(ImportError::Empty)??;
    let header: Vec<String> = header.iter().map(str::to_string).collect();
    let columns = Columns::from_header(&header, require_family_group)?;

    let mut rows = Vec::new();
    for (i, record) in records.enumerate() {
        let record: Vec<String> = record?.iter().map(str::to_string).collect();
        rows.push(columns.to_input(i + 2, &record)?);
    }

    tracing::debug!(rows = rows.len(), "Parsed CSV upload");
    Ok(rows)
}

/// First sheet only. Rows too short to reach every known column are skipped.
pub fn parse_xlsx(bytes: &[u8], require_family_group: bool) -> Result<Vec<ImportRow>, ImportError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(ImportError::Empty),
    };

    let first_row = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);
    let mut sheet_rows = range.rows().map(trimmed_cells);

    let header = sheet_rows.next().filter(|h| !h.is_empty()).ok_or(ImportError::Empty)?;
    let columns = Columns::from_header(&header, require_family_group)?;
    let max_index = columns.max_index();

    let mut rows = Vec::new();
    for (i, record) in sheet_rows.enumerate() {
        let row = first_row + i + 1;
        if record.len() <= max_index {
            tracing::debug!(row = row, "Skipping short XLSX row");
            continue;
        }
        rows.push(columns.to_input(row, &record)?);
    }

    tracing::debug!(rows = rows.len(), "Parsed XLSX upload");
    Ok(rows)
}

/// Cell text with trailing empty cells dropped
fn trimmed_cells(cells: &[Data]) -> Vec<String> {
    let len = cells
        .iter()
        .rposition(|c| !matches!(c, Data::Empty) && !c.to_string().trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(0);
    cells[..len].iter().map(|c| c.to_string()).collect()
}
