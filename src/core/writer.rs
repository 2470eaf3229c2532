//! Persistence writer - create or update classrooms by natural key
//!
//! Every descriptor goes through the same lookup and diff whether or not the
//! run is a dry run; only the final insert/update is skipped in a preview.
//! That keeps preview counts identical to what a real run reports.

use crate::error::{ImportError, ImportResult};
use crate::store::ClassroomStore;
use crate::types::{
    ClassroomDescriptor, ClassroomKey, ClassroomRecord, ImportSummary, Mode, OutputRecord,
    StudentRecord,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// What happened (or would happen) to one classroom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassroomAction {
    Create,
    Update,
    Unchanged,
    /// Key already present in `init` mode; skipped
    Duplicate,
}

impl ClassroomAction {
    pub fn label(&self) -> &'static str {
        match self {
            ClassroomAction::Create => "create",
            ClassroomAction::Update => "update",
            ClassroomAction::Unchanged => "unchanged",
            ClassroomAction::Duplicate => "duplicate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassroomOutcome {
    pub key: ClassroomKey,
    pub title: String,
    pub action: ClassroomAction,
    pub students: usize,
}

/// Result of one writer pass
#[derive(Debug)]
pub struct ImportReport {
    pub summary: ImportSummary,
    pub outcomes: Vec<ClassroomOutcome>,
    pub records: Vec<OutputRecord>,
    /// Non-fatal per-record errors (duplicate keys in `init` mode)
    pub warnings: Vec<ImportError>,
}

/// Decide the action for one classroom from the stored state
pub fn plan_action(
    mode: Mode,
    existing: Option<&ClassroomRecord>,
    desired: &ClassroomRecord,
) -> ClassroomAction {
    match (mode, existing) {
        (_, None) => ClassroomAction::Create,
        (Mode::Init, Some(_)) => ClassroomAction::Duplicate,
        (Mode::Update, Some(current)) if current.same_content(desired) => {
            ClassroomAction::Unchanged
        }
        (Mode::Update, Some(_)) => ClassroomAction::Update,
    }
}

pub struct ClassroomWriter<'a, S: ClassroomStore + ?Sized> {
    store: &'a S,
    mode: Mode,
    dry_run: bool,
}

impl<'a, S: ClassroomStore + ?Sized> ClassroomWriter<'a, S> {
    pub fn new(store: &'a S, mode: Mode, dry_run: bool) -> Self {
        Self {
            store,
            mode,
            dry_run,
        }
    }

    /// Process descriptors in order and collect the students they cover
    pub async fn apply(&self, descriptors: &[ClassroomDescriptor]) -> ImportResult<ImportReport> {
        let mut summary = ImportSummary::new(self.mode, self.dry_run);
        let mut outcomes = Vec::with_capacity(descriptors.len());
        let mut records = Vec::new();
        let mut warnings = Vec::new();

        let mut students_by_level: HashMap<String, Vec<StudentRecord>> = HashMap::new();
        let mut reported_users: HashSet<String> = HashSet::new();

        if self.dry_run {
            info!(mode = %self.mode, classrooms = descriptors.len(), "previewing classrooms (dry run)");
        } else {
            self.store.prepare().await?;
            info!(mode = %self.mode, classrooms = descriptors.len(), "writing classrooms");
        }

        for descriptor in descriptors {
            let key = &descriptor.key;

            if !students_by_level.contains_key(&key.level_id) {
                let found = self
                    .store
                    .find_students(&key.school_id, &key.school_year, &key.level_id)
                    .await?;
                debug!(level = %key.level_id, students = found.len(), "students at level");
                students_by_level.insert(key.level_id.clone(), found);
            }
            let students = students_by_level
                .get(&key.level_id)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let desired = ClassroomRecord {
                key: key.clone(),
                title: descriptor.title(),
                students: students.iter().map(|s| s.user_id.clone()).collect(),
            };

            let existing = self.store.find_classroom(key).await?;
            let planned = plan_action(self.mode, existing.as_ref(), &desired);

            let action = if self.dry_run {
                planned
            } else {
                self.execute(planned, &desired).await?
            };

            match action {
                ClassroomAction::Create => summary.created += 1,
                ClassroomAction::Update => summary.updated += 1,
                ClassroomAction::Unchanged => summary.unchanged += 1,
                ClassroomAction::Duplicate => {
                    summary.duplicates += 1;
                    let err = ImportError::DuplicateKey(key.to_string());
                    warn!("{}; skipped", err);
                    warnings.push(err);
                }
            }
            summary.classrooms += 1;
            debug!(classroom = %key, action = action.label(), "classroom processed");

            if action != ClassroomAction::Duplicate {
                for student in students {
                    if reported_users.insert(student.user_id.clone()) {
                        records.push(OutputRecord {
                            user_id: student.user_id.clone(),
                            email: student.email.clone(),
                            level_name: descriptor.level_name.clone(),
                            class_name: student.school_class.clone(),
                        });
                    }
                }
            }

            outcomes.push(ClassroomOutcome {
                key: key.clone(),
                title: desired.title,
                action,
                students: desired.students.len(),
            });
        }

        summary.students = records.len();

        Ok(ImportReport {
            summary,
            outcomes,
            records,
            warnings,
        })
    }

    /// Carry out a planned action; a lost insert race becomes a duplicate
    async fn execute(
        &self,
        planned: ClassroomAction,
        desired: &ClassroomRecord,
    ) -> ImportResult<ClassroomAction> {
        match planned {
            ClassroomAction::Create => match self.store.insert_classroom(desired).await {
                Ok(()) => Ok(ClassroomAction::Create),
                Err(e) if e.is_recoverable() => Ok(ClassroomAction::Duplicate),
                Err(e) => Err(e),
            },
            ClassroomAction::Update => {
                self.store.update_classroom(desired).await?;
                Ok(ClassroomAction::Update)
            }
            other => Ok(other),
        }
    }
}
