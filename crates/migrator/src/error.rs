use thiserror::Error;

/// Errors that abort a whole job. Per-record problems are counted in the
/// job's report instead.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Failed to read migration source: {0}")]
    Source(#[from] firestore::error::FirestoreError),

    #[error("Database error occurred during migration: {0}")]
    Database(#[from] database::DbError),

    #[error("Football API error: {0}")]
    Api(#[from] api_client::error::ApiError),

    #[error("Search service error: {0}")]
    Search(#[from] search::error::SearchError),

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}

impl From<indicatif::style::TemplateError> for MigrationError {
    fn from(error: indicatif::style::TemplateError) -> Self {
        MigrationError::ProgressBarTemplate(error.to_string())
    }
}
