//! Records flowing through one import run
//!
//! Everything here is built fresh per run and dropped once the output
//! workbook is written.

use crate::error::ImportError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A row of the "level" tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRow {
    pub level_name: String,
    pub level_id: String,
}

impl LevelRow {
    pub fn new(level_name: impl Into<String>, level_id: impl Into<String>) -> Self {
        Self {
            level_name: level_name.into(),
            level_id: level_id.into(),
        }
    }
}

/// A row of the "subject" tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRow {
    pub subject_name: String,
    pub subject_id: String,
}

impl SubjectRow {
    pub fn new(subject_name: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
            subject_id: subject_id.into(),
        }
    }
}

/// Both tabs of the input workbook, in sheet order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolSheet {
    pub levels: Vec<LevelRow>,
    pub subjects: Vec<SubjectRow>,
}

/// Natural key of a classroom
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassroomKey {
    pub school_id: String,
    pub school_year: String,
    pub level_id: String,
    pub subject_id: String,
}

impl fmt::Display for ClassroomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.school_id, self.school_year, self.level_id, self.subject_id
        )
    }
}

/// One (level, subject) pair scoped to a school and school year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassroomDescriptor {
    pub key: ClassroomKey,
    pub level_name: String,
    pub subject_name: String,
}

impl ClassroomDescriptor {
    /// Classroom title, e.g. "Grade1 Math"
    pub fn title(&self) -> String {
        format!("{} {}", self.level_name, self.subject_name)
    }
}

/// Persisted shape of a classroom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassroomRecord {
    pub key: ClassroomKey,
    pub title: String,
    pub students: Vec<String>,
}

impl ClassroomRecord {
    /// True when the stored fields already match `other` (key aside)
    pub fn same_content(&self, other: &ClassroomRecord) -> bool {
        self.title == other.title && self.students == other.students
    }
}

/// A user whose school history places them at a level for the year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub user_id: String,
    pub email: String,
    pub school_class: String,
}

/// One row of the output workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    pub user_id: String,
    pub email: String,
    pub level_name: String,
    pub class_name: String,
}

/// Write policy of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Insert only; existing classrooms are reported as duplicates
    Init,
    /// Insert missing classrooms, update changed ones
    Update,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Init => write!(f, "init"),
            Mode::Update => write!(f, "update"),
        }
    }
}

/// The positional mode argument: `init`, `update`, or either with `-dry`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMode {
    pub mode: Mode,
    pub dry_run: bool,
}

impl FromStr for RunMode {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let (base, dry_run) = match normalized.strip_suffix("-dry") {
            Some(base) => (base, true),
            None => (normalized.as_str(), false),
        };
        let mode = match base {
            "init" => Mode::Init,
            "update" => Mode::Update,
            _ => {
                return Err(ImportError::InvalidArgument(format!(
                    "unknown mode '{}' (expected init, init-dry, update or update-dry)",
                    s
                )))
            }
        };
        Ok(Self { mode, dry_run })
    }
}

/// What a run did (or would do, in dry-run mode)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub mode: Mode,
    pub dry_run: bool,
    pub classrooms: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub duplicates: usize,
    pub students: usize,
}

impl ImportSummary {
    pub fn new(mode: Mode, dry_run: bool) -> Self {
        Self {
            mode,
            dry_run,
            classrooms: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            duplicates: 0,
            students: 0,
        }
    }

    /// Counts only, ignoring whether the run was a preview
    pub fn same_counts(&self, other: &ImportSummary) -> bool {
        self.classrooms == other.classrooms
            && self.created == other.created
            && self.updated == other.updated
            && self.unchanged == other.unchanged
            && self.duplicates == other.duplicates
            && self.students == other.students
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_parses_plain_and_dry_variants() {
        let init: RunMode = "init".parse().unwrap();
        assert_eq!(init.mode, Mode::Init);
        assert!(!init.dry_run);

        let update_dry: RunMode = "update-dry".parse().unwrap();
        assert_eq!(update_dry.mode, Mode::Update);
        assert!(update_dry.dry_run);

        let upper: RunMode = " INIT-DRY ".parse().unwrap();
        assert_eq!(upper.mode, Mode::Init);
        assert!(upper.dry_run);
    }

    #[test]
    fn test_run_mode_rejects_unknown() {
        let err = "upsert".parse::<RunMode>().unwrap_err();
        assert!(matches!(err, ImportError::InvalidArgument(_)));
        assert!("dry".parse::<RunMode>().is_err());
    }

    #[test]
    fn test_classroom_key_display() {
        let key = ClassroomKey {
            school_id: "SCH".to_string(),
            school_year: "2024-2025".to_string(),
            level_id: "L1".to_string(),
            subject_id: "S1".to_string(),
        };
        assert_eq!(key.to_string(), "SCH/2024-2025/L1/S1");
    }

    #[test]
    fn test_same_content_ignores_key() {
        let key = ClassroomKey {
            school_id: "SCH".to_string(),
            school_year: "2024-2025".to_string(),
            level_id: "L1".to_string(),
            subject_id: "S1".to_string(),
        };
        let a = ClassroomRecord {
            key: key.clone(),
            title: "Grade1 Math".to_string(),
            students: vec!["u1".to_string()],
        };
        let mut b = a.clone();
        assert!(a.same_content(&b));
        b.students.push("u2".to_string());
        assert!(!a.same_content(&b));
    }
}
