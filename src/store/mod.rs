//! Classroom persistence
//!
//! The writer talks to the database through [`ClassroomStore`]. `MongoStore`
//! is the production backend; `MemoryStore` backs tests.

mod memory;
mod mongo;

pub use memory::{MemoryStore, MemoryUser};
pub use mongo::{MongoConfig, MongoStore};

use crate::error::ImportResult;
use crate::types::{ClassroomKey, ClassroomRecord, StudentRecord};
use async_trait::async_trait;

#[async_trait]
pub trait ClassroomStore: Send + Sync {
    /// Create whatever the store needs before writing (unique key index)
    async fn prepare(&self) -> ImportResult<()>;

    async fn find_classroom(&self, key: &ClassroomKey) -> ImportResult<Option<ClassroomRecord>>;

    /// Insert a new classroom; an existing key is `ImportError::DuplicateKey`
    async fn insert_classroom(&self, record: &ClassroomRecord) -> ImportResult<()>;

    /// Overwrite title and students of the classroom with `record.key`
    async fn update_classroom(&self, record: &ClassroomRecord) -> ImportResult<()>;

    /// Active users whose school history has (school, year, level)
    async fn find_students(
        &self,
        school_id: &str,
        school_year: &str,
        level_id: &str,
    ) -> ImportResult<Vec<StudentRecord>>;
}
