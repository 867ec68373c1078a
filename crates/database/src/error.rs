use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Database query failed: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Stored value could not be decoded: {0}")]
    Decode(String),

    #[error("The requested data was not found in the database.")]
    NotFound,

    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Referenced record does not exist: {0}")]
    InvalidReference(String),
}

impl DbError {
    /// Classifies constraint violations reported by PostgreSQL.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return DbError::NotFound;
        }
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            if db_err.is_unique_violation() {
                return DbError::Conflict(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return DbError::InvalidReference(constraint);
            }
        }
        DbError::QueryError(err)
    }
}
