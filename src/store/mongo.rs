//! MongoDB backend
//!
//! Identifiers that look like ObjectIds (24 hex chars) are written as
//! ObjectIds and matched in either form, so rows imported from a sheet line
//! up with documents created by the main application.

use super::ClassroomStore;
use crate::error::{ImportError, ImportResult};
use crate::types::{ClassroomKey, ClassroomRecord, StudentRecord};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;
use tracing::{debug, info};

pub const CLASSROOMS: &str = "classrooms";
pub const USERS: &str = "users";

/// Database used when neither `--database` nor the URL names one
pub const DEFAULT_DATABASE: &str = "school";

const DEV_SUFFIX: &str = "-dev";
const DUPLICATE_KEY_CODE: i32 = 11000;
const KEY_INDEX_NAME: &str = "school_year_level_subject";

/// Connection settings
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub url: String,
    pub database: Option<String>,
    pub dev: bool,
    pub timeout: Duration,
}

impl MongoConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: None,
            dev: false,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Pick the database name: explicit flag, then the URL's default, then
/// [`DEFAULT_DATABASE`]; `--dev` appends a `-dev` suffix.
pub fn resolve_database_name(explicit: Option<&str>, from_url: Option<&str>, dev: bool) -> String {
    let base = explicit
        .or(from_url)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DATABASE);

    if dev && !base.ends_with(DEV_SUFFIX) {
        format!("{}{}", base, DEV_SUFFIX)
    } else {
        base.to_string()
    }
}

pub struct MongoStore {
    database: Database,
    classrooms: Collection<Document>,
    users: Collection<Document>,
}

impl MongoStore {
    /// Connect and ping; any failure is `DatabaseConnection`
    pub async fn connect(config: &MongoConfig) -> ImportResult<Self> {
        let mut options = ClientOptions::parse(&config.url)
            .await
            .map_err(|e| ImportError::DatabaseConnection(e.to_string()))?;
        options.server_selection_timeout = Some(config.timeout);
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let name = resolve_database_name(
            config.database.as_deref(),
            options.default_database.as_deref(),
            config.dev,
        );

        let client = Client::with_options(options)
            .map_err(|e| ImportError::DatabaseConnection(e.to_string()))?;
        let database = client.database(&name);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ImportError::DatabaseConnection(e.to_string()))?;

        info!(database = %name, "connected to MongoDB");

        Ok(Self {
            classrooms: database.collection(CLASSROOMS),
            users: database.collection(USERS),
            database,
        })
    }

    pub fn database_name(&self) -> &str {
        self.database.name()
    }
}

#[async_trait]
impl ClassroomStore for MongoStore {
    async fn prepare(&self) -> ImportResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "school": 1, "year": 1, "level": 1, "subject": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(KEY_INDEX_NAME.to_string())
                    .build(),
            )
            .build();
        self.classrooms.create_index(index).await?;
        debug!(index = KEY_INDEX_NAME, "classroom key index ready");
        Ok(())
    }

    async fn find_classroom(&self, key: &ClassroomKey) -> ImportResult<Option<ClassroomRecord>> {
        let found = self.classrooms.find_one(key_filter(key)).await?;
        Ok(found.map(|document| classroom_from_document(key, &document)))
    }

    async fn insert_classroom(&self, record: &ClassroomRecord) -> ImportResult<()> {
        let document = classroom_document(record, DateTime::now());

        match self.classrooms.insert_one(document).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ImportError::DuplicateKey(record.key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_classroom(&self, record: &ClassroomRecord) -> ImportResult<()> {
        let update = doc! {
            "$set": {
                "title": record.title.as_str(),
                "students": student_values(&record.students),
                "updatedAt": DateTime::now(),
            }
        };
        let result = self
            .classrooms
            .update_one(key_filter(&record.key), update)
            .await?;
        if result.matched_count == 0 {
            return Err(ImportError::Database(format!(
                "classroom {} disappeared before update",
                record.key
            )));
        }
        Ok(())
    }

    async fn find_students(
        &self,
        school_id: &str,
        school_year: &str,
        level_id: &str,
    ) -> ImportResult<Vec<StudentRecord>> {
        let filter = doc! {
            "deletedAt": { "$exists": false },
            "schoolHistories": {
                "$elemMatch": {
                    "school": id_match(school_id),
                    "year": school_year,
                    "level": id_match(level_id),
                }
            },
        };

        let users: Vec<Document> = self
            .users
            .find(filter)
            .projection(doc! { "emails": 1, "schoolHistories": 1 })
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;

        Ok(users
            .iter()
            .filter_map(|user| student_from_document(user, school_id, school_year, level_id))
            .collect())
    }
}

fn key_filter(key: &ClassroomKey) -> Document {
    doc! {
        "school": id_match(&key.school_id),
        "year": key.school_year.as_str(),
        "level": id_match(&key.level_id),
        "subject": id_match(&key.subject_id),
    }
}

/// Stored form of an identifier
fn id_value(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(id.to_string()),
    }
}

/// Filter matching an identifier stored either as ObjectId or as string
fn id_match(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::Document(doc! { "$in": [oid, id] }),
        Err(_) => Bson::String(id.to_string()),
    }
}

fn id_string(value: &Bson) -> Option<String> {
    match value {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) => Some(s.clone()),
        Bson::Int32(i) => Some(i.to_string()),
        Bson::Int64(i) => Some(i.to_string()),
        _ => None,
    }
}

/// Compare a stored identifier with one from the sheet in stored form
fn same_id(stored: &Bson, id: &str) -> bool {
    id_string(stored).is_some_and(|s| id_value(&s) == id_value(id))
}

fn student_values(students: &[String]) -> Vec<Bson> {
    students.iter().map(|s| id_value(s)).collect()
}

/// New classroom document; `flags`/`remarks` start empty and `deletedAt` is unset
fn classroom_document(record: &ClassroomRecord, now: DateTime) -> Document {
    doc! {
        "school": id_value(&record.key.school_id),
        "year": record.key.school_year.as_str(),
        "level": id_value(&record.key.level_id),
        "subject": id_value(&record.key.subject_id),
        "title": record.title.as_str(),
        "students": student_values(&record.students),
        "flags": [],
        "remarks": [],
        "createdAt": now,
        "updatedAt": now,
    }
}

fn classroom_from_document(key: &ClassroomKey, document: &Document) -> ClassroomRecord {
    let students = document
        .get_array("students")
        .map(|values| values.iter().filter_map(id_string).collect())
        .unwrap_or_default();

    ClassroomRecord {
        key: key.clone(),
        title: document.get_str("title").unwrap_or_default().to_string(),
        students,
    }
}

fn student_from_document(
    user: &Document,
    school_id: &str,
    school_year: &str,
    level_id: &str,
) -> Option<StudentRecord> {
    let user_id = user.get("_id").and_then(id_string)?;

    let email = user
        .get_array("emails")
        .ok()
        .and_then(|emails| emails.iter().find_map(|e| e.as_str()))
        .unwrap_or_default()
        .to_string();

    let school_class = user
        .get_array("schoolHistories")
        .ok()
        .and_then(|histories| {
            histories.iter().filter_map(Bson::as_document).find(|h| {
                h.get_str("year").ok() == Some(school_year)
                    && h.get("school").is_some_and(|value| same_id(value, school_id))
                    && h.get("level").is_some_and(|value| same_id(value, level_id))
            })
        })
        .and_then(|history| history.get_str("schoolClass").ok())
        .unwrap_or_default()
        .to_string();

    Some(StudentRecord {
        user_id,
        email,
        school_class,
    })
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_database_name_precedence() {
        assert_eq!(resolve_database_name(Some("prod"), Some("url"), false), "prod");
        assert_eq!(resolve_database_name(None, Some("url"), false), "url");
        assert_eq!(resolve_database_name(None, None, false), DEFAULT_DATABASE);
        assert_eq!(resolve_database_name(Some("  "), None, false), DEFAULT_DATABASE);
    }

    #[test]
    fn test_resolve_database_name_dev() {
        assert_eq!(resolve_database_name(None, None, true), "school-dev");
        assert_eq!(resolve_database_name(Some("prod"), None, true), "prod-dev");
        assert_eq!(resolve_database_name(Some("prod-dev"), None, true), "prod-dev");
    }

    #[test]
    fn test_id_value_and_match() {
        let hex = "64b7f0c2a1b2c3d4e5f60718";
        assert!(matches!(id_value(hex), Bson::ObjectId(_)));
        assert_eq!(id_value("L1"), Bson::String("L1".to_string()));
        assert!(matches!(id_match(hex), Bson::Document(_)));
        assert_eq!(id_match("L1"), Bson::String("L1".to_string()));
    }

    #[test]
    fn test_student_from_document_picks_matching_history() {
        let oid = ObjectId::new();
        let user = doc! {
            "_id": oid,
            "emails": ["kid@school.test", "alt@school.test"],
            "schoolHistories": [
                { "year": "2023-2024", "school": "SCH", "level": "L1", "schoolClass": "1B" },
                { "year": "2024-2025", "school": "SCH", "level": "L2", "schoolClass": "2A" },
            ],
        };

        let student = student_from_document(&user, "SCH", "2024-2025", "L2").unwrap();
        assert_eq!(student.user_id, oid.to_hex());
        assert_eq!(student.email, "kid@school.test");
        assert_eq!(student.school_class, "2A");
    }

    #[test]
    fn test_student_from_document_matches_uppercase_object_ids() {
        let school = "64B7F0C2A1B2C3D4E5F60718";
        let level = "64B7F0C2A1B2C3D4E5F60719";
        let user = doc! {
            "_id": "u-1",
            "schoolHistories": [{
                "year": "2024-2025",
                "school": ObjectId::parse_str(school).unwrap(),
                "level": ObjectId::parse_str(level).unwrap(),
                "schoolClass": "1A",
            }],
        };

        let student = student_from_document(&user, school, "2024-2025", level).unwrap();
        assert_eq!(student.school_class, "1A");

        let lower = student_from_document(
            &user,
            &school.to_lowercase(),
            "2024-2025",
            &level.to_lowercase(),
        )
        .unwrap();
        assert_eq!(lower.school_class, "1A");
    }

    #[test]
    fn test_same_id_compares_stored_form() {
        let oid = ObjectId::parse_str("64b7f0c2a1b2c3d4e5f60718").unwrap();
        assert!(same_id(&Bson::ObjectId(oid), "64B7F0C2A1B2C3D4E5F60718"));
        assert!(same_id(
            &Bson::String("64b7f0c2a1b2c3d4e5f60718".to_string()),
            "64B7F0C2A1B2C3D4E5F60718"
        ));
        assert!(same_id(&Bson::Int32(101), "101"));
        assert!(!same_id(&Bson::String("L1".to_string()), "l1"));
        assert!(!same_id(&Bson::Null, "L1"));
    }

    #[test]
    fn test_student_from_document_tolerates_missing_fields() {
        let user = doc! { "_id": "u-1" };
        let student = student_from_document(&user, "SCH", "2024-2025", "L1").unwrap();
        assert_eq!(student.user_id, "u-1");
        assert_eq!(student.email, "");
        assert_eq!(student.school_class, "");
    }

    fn write_error(code: i32) -> mongodb::error::Error {
        let write_error = mongodb::bson::from_document(doc! {
            "code": code,
            "codeName": "DuplicateKey",
            "errmsg": "E11000 duplicate key error collection: school.classrooms",
        })
        .unwrap();
        ErrorKind::Write(WriteFailure::WriteError(write_error)).into()
    }

    #[test]
    fn test_is_duplicate_key_only_for_unique_index_violation() {
        assert!(is_duplicate_key(&write_error(DUPLICATE_KEY_CODE)));
        assert!(!is_duplicate_key(&write_error(121)));

        let io = mongodb::error::Error::from(std::io::ErrorKind::ConnectionReset);
        assert!(!is_duplicate_key(&io));
    }

    #[test]
    fn test_classroom_document_shape() {
        let record = ClassroomRecord {
            key: ClassroomKey {
                school_id: "64b7f0c2a1b2c3d4e5f60718".to_string(),
                school_year: "2024-2025".to_string(),
                level_id: "L1".to_string(),
                subject_id: "101".to_string(),
            },
            title: "Grade1 Math".to_string(),
            students: vec!["u-1".to_string()],
        };
        let now = DateTime::now();

        let document = classroom_document(&record, now);

        assert!(matches!(document.get("school"), Some(Bson::ObjectId(_))));
        assert_eq!(document.get_str("level").unwrap(), "L1");
        assert_eq!(document.get_str("subject").unwrap(), "101");
        assert_eq!(document.get_str("title").unwrap(), "Grade1 Math");
        assert!(document.get_array("flags").unwrap().is_empty());
        assert!(document.get_array("remarks").unwrap().is_empty());
        assert!(!document.contains_key("deletedAt"));
        assert_eq!(document.get_datetime("createdAt").unwrap(), &now);
    }

    #[test]
    fn test_classroom_from_document_reads_students() {
        let key = ClassroomKey {
            school_id: "SCH".to_string(),
            school_year: "2024-2025".to_string(),
            level_id: "L1".to_string(),
            subject_id: "S1".to_string(),
        };
        let oid = ObjectId::new();
        let document = doc! { "title": "Grade1 Math", "students": [oid, "u-2"] };
        let record = classroom_from_document(&key, &document);
        assert_eq!(record.title, "Grade1 Math");
        assert_eq!(record.students, vec![oid.to_hex(), "u-2".to_string()]);
    }
}
