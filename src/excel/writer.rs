//! Output workbook writer - one row per assigned student

use crate::error::{ImportError, ImportResult};
use crate::types::OutputRecord;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

pub const OUTPUT_SHEET: &str = "output";

/// Column order of the output sheet
pub const OUTPUT_HEADERS: [&str; 4] = ["userId", "email", "level", "class"];

/// Writes assignment records to a single-sheet workbook
pub struct AssignmentWriter<'a> {
    records: &'a [OutputRecord],
}

impl<'a> AssignmentWriter<'a> {
    pub fn new(records: &'a [OutputRecord]) -> Self {
        Self { records }
    }

    /// Write the workbook, replacing any existing file at `output_path`
    pub fn write(&self, output_path: &Path) -> ImportResult<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(OUTPUT_SHEET)
            .map_err(|e| ImportError::IoWrite(format!("Failed to set worksheet name: {}", e)))?;

        worksheet.set_column_width(0, 28).ok();
        worksheet.set_column_width(1, 32).ok();
        worksheet.set_column_width(2, 16).ok();
        worksheet.set_column_width(3, 10).ok();

        let header_format = Format::new().set_bold();
        for (col, header) in OUTPUT_HEADERS.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *header, &header_format)
                .map_err(|e| ImportError::IoWrite(e.to_string()))?;
        }

        for (i, record) in self.records.iter().enumerate() {
            let row = (i + 1) as u32;
            let cells = [
                &record.user_id,
                &record.email,
                &record.level_name,
                &record.class_name,
            ];
            for (col, value) in cells.iter().enumerate() {
                worksheet
                    .write_string(row, col as u16, value.as_str())
                    .map_err(|e| ImportError::IoWrite(e.to_string()))?;
            }
        }

        workbook.save(output_path).map_err(|e| {
            ImportError::IoWrite(format!("'{}': {}", output_path.display(), e))
        })?;

        Ok(())
    }
}
