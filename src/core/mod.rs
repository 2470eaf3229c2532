//! Core import logic: school year, classroom enumeration, persistence writer

pub mod enumerator;
pub mod school_year;
pub mod writer;

pub use enumerator::enumerate_classrooms;
pub use school_year::{current_school_year, resolve_school_year, school_year_for};
pub use writer::{plan_action, ClassroomAction, ClassroomOutcome, ClassroomWriter, ImportReport};
