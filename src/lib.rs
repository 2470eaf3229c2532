//! create-school-student - classroom import from a level/subject workbook
//!
//! Reads the "level" and "subject" tabs of an input workbook, creates one
//! classroom per (level, subject) for a school and school year in MongoDB,
//! and writes the students assigned to those classrooms to an output workbook.
//!
//! # Example
//!
//! ```no_run
//! use create_school_student::core::{enumerate_classrooms, ClassroomWriter};
//! use create_school_student::excel::WorkbookReader;
//! use create_school_student::store::MemoryStore;
//! use create_school_student::types::Mode;
//!
//! # async fn demo() -> create_school_student::ImportResult<()> {
//! let sheet = WorkbookReader::new("school.xlsx").read()?;
//! let descriptors = enumerate_classrooms(&sheet.levels, &sheet.subjects, "SCH", "2024-2025");
//!
//! let store = MemoryStore::new();
//! let report = ClassroomWriter::new(&store, Mode::Update, true)
//!     .apply(&descriptors)
//!     .await?;
//! println!("would create {}", report.summary.created);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod logging;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{ImportError, ImportResult};
pub use types::{
    ClassroomDescriptor, ClassroomKey, ImportSummary, LevelRow, Mode, OutputRecord, SubjectRow,
};
