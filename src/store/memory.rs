use super::ClassroomStore;
use crate::error::{ImportError, ImportResult};
use crate::types::{ClassroomKey, ClassroomRecord, StudentRecord};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A user with one school history entry
#[derive(Debug, Clone)]
pub struct MemoryUser {
    pub student: StudentRecord,
    pub school_id: String,
    pub school_year: String,
    pub level_id: String,
    pub deleted: bool,
}

/// In-process store; counts writes so previews can be checked for side effects
#[derive(Debug, Default)]
pub struct MemoryStore {
    classrooms: Mutex<BTreeMap<ClassroomKey, ClassroomRecord>>,
    users: Mutex<Vec<MemoryUser>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: MemoryUser) {
        self.users.lock().unwrap_or_else(|e| e.into_inner()).push(user);
    }

    /// Seed a classroom without counting it as a write
    pub fn seed_classroom(&self, record: ClassroomRecord) {
        self.lock_classrooms().insert(record.key.clone(), record);
    }

    pub fn classrooms(&self) -> Vec<ClassroomRecord> {
        self.lock_classrooms().values().cloned().collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock_classrooms(&self) -> std::sync::MutexGuard<'_, BTreeMap<ClassroomKey, ClassroomRecord>> {
        self.classrooms.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ClassroomStore for MemoryStore {
    async fn prepare(&self) -> ImportResult<()> {
        Ok(())
    }

    async fn find_classroom(&self, key: &ClassroomKey) -> ImportResult<Option<ClassroomRecord>> {
        Ok(self.lock_classrooms().get(key).cloned())
    }

    async fn insert_classroom(&self, record: &ClassroomRecord) -> ImportResult<()> {
        let mut classrooms = self.lock_classrooms();
        if classrooms.contains_key(&record.key) {
            return Err(ImportError::DuplicateKey(record.key.to_string()));
        }
        classrooms.insert(record.key.clone(), record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_classroom(&self, record: &ClassroomRecord) -> ImportResult<()> {
        let mut classrooms = self.lock_classrooms();
        let existing = classrooms.get_mut(&record.key).ok_or_else(|| {
            ImportError::Database(format!("classroom {} not found", record.key))
        })?;
        existing.title = record.title.clone();
        existing.students = record.students.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_students(
        &self,
        school_id: &str,
        school_year: &str,
        level_id: &str,
    ) -> ImportResult<Vec<StudentRecord>> {
        let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        Ok(users
            .iter()
            .filter(|u| {
                !u.deleted
                    && u.school_id == school_id
                    && u.school_year == school_year
                    && u.level_id == level_id
            })
            .map(|u| u.student.clone())
            .collect())
    }
}
