//! Excel I/O for the import job
//!
//! - Read: input workbook (.xlsx) → level and subject rows
//! - Write: output records → assignment workbook (.xlsx)

mod reader;
mod writer;

pub use reader::{WorkbookReader, LEVEL_SHEET, SUBJECT_SHEET};
pub use writer::{AssignmentWriter, OUTPUT_HEADERS, OUTPUT_SHEET};
