use thiserror::Error;

pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Malformed input workbook: {0}")]
    MalformedInput(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Failed to write output workbook: {0}")]
    IoWrite(String),
}

impl ImportError {
    /// Per-record errors that are reported and skipped rather than aborting the run
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ImportError::DuplicateKey(_))
    }
}

impl From<mongodb::error::Error> for ImportError {
    fn from(err: mongodb::error::Error) -> Self {
        ImportError::Database(err.to_string())
    }
}
