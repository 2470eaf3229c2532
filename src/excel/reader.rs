//! Input workbook reader - "level" and "subject" tabs

use crate::error::{ImportError, ImportResult};
use crate::types::{LevelRow, SchoolSheet, SubjectRow};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const LEVEL_SHEET: &str = "level";
pub const SUBJECT_SHEET: &str = "subject";

/// Column layout of one two-column tab
struct TabSpec {
    sheet: &'static str,
    name_header: &'static str,
    id_header: &'static str,
}

const LEVEL_TAB: TabSpec = TabSpec {
    sheet: LEVEL_SHEET,
    name_header: "level",
    id_header: "levelId",
};

const SUBJECT_TAB: TabSpec = TabSpec {
    sheet: SUBJECT_SHEET,
    name_header: "subject",
    id_header: "subjectId",
};

/// Reads the level and subject tabs of an input workbook
pub struct WorkbookReader {
    path: PathBuf,
}

impl WorkbookReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read both tabs, failing before any other work if either is malformed
    pub fn read(&self) -> ImportResult<SchoolSheet> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(|e| {
            ImportError::MalformedInput(format!(
                "cannot open '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let sheet_names = workbook.sheet_names().to_vec();

        let levels = read_pairs(&mut workbook, &sheet_names, &LEVEL_TAB)?
            .into_iter()
            .map(|(name, id)| LevelRow::new(name, id))
            .collect();
        let subjects = read_pairs(&mut workbook, &sheet_names, &SUBJECT_TAB)?
            .into_iter()
            .map(|(name, id)| SubjectRow::new(name, id))
            .collect();

        Ok(SchoolSheet { levels, subjects })
    }
}

fn read_pairs<RS: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<RS>,
    sheet_names: &[String],
    tab: &TabSpec,
) -> ImportResult<Vec<(String, String)>> {
    let actual_name = sheet_names
        .iter()
        .find(|name| name.trim().eq_ignore_ascii_case(tab.sheet))
        .ok_or_else(|| {
            ImportError::MalformedInput(format!("missing '{}' sheet", tab.sheet))
        })?;

    let range = workbook.worksheet_range(actual_name).map_err(|e| {
        ImportError::MalformedInput(format!("cannot read '{}' sheet: {}", tab.sheet, e))
    })?;

    parse_pairs(&range, tab)
}

fn parse_pairs(range: &Range<Data>, tab: &TabSpec) -> ImportResult<Vec<(String, String)>> {
    let mut rows = range.rows();

    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(cell_text).collect())
        .unwrap_or_default();

    let name_col = find_column(&header, tab.name_header).ok_or_else(|| {
        ImportError::MalformedInput(format!(
            "'{}' sheet has no '{}' column",
            tab.sheet, tab.name_header
        ))
    })?;
    let id_col = find_column(&header, tab.id_header).ok_or_else(|| {
        ImportError::MalformedInput(format!(
            "'{}' sheet has no '{}' column",
            tab.sheet, tab.id_header
        ))
    })?;

    // Header sits on the first used row of the range
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0) + 1;

    let mut seen_ids = HashSet::new();
    let mut pairs = Vec::new();

    for (offset, cells) in rows.enumerate() {
        let excel_row = first_row + offset + 1;
        let name = cells.get(name_col).map(cell_text).unwrap_or_default();
        let id = cells.get(id_col).map(cell_text).unwrap_or_default();

        match (name.is_empty(), id.is_empty()) {
            (true, true) => continue,
            (false, true) => {
                return Err(ImportError::MalformedInput(format!(
                    "'{}' sheet row {}: '{}' has no {}",
                    tab.sheet, excel_row, name, tab.id_header
                )))
            }
            (true, false) => {
                return Err(ImportError::MalformedInput(format!(
                    "'{}' sheet row {}: {} '{}' has no {}",
                    tab.sheet, excel_row, tab.id_header, id, tab.name_header
                )))
            }
            (false, false) => {}
        }

        if !seen_ids.insert(id.clone()) {
            return Err(ImportError::MalformedInput(format!(
                "'{}' sheet row {}: duplicate {} '{}'",
                tab.sheet, excel_row, tab.id_header, id
            )));
        }

        pairs.push((name, id));
    }

    Ok(pairs)
}

fn find_column(header: &[String], wanted: &str) -> Option<usize> {
    header
        .iter()
        .position(|name| name.eq_ignore_ascii_case(wanted))
}

/// Cell content as trimmed text; whole floats lose their ".0"
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}
