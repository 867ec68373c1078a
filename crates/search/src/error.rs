use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Search service returned status {0}: {1}")]
    Status(u16, String),

    #[error("Failed to encode search parameters: {0}")]
    Encode(String),

    #[error("Failed to serialize search record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Search is not configured: set search.app_id and search.api_key (ALGOLIA_APP_ID / ALGOLIA_API_KEY)")]
    NotConfigured,

    #[error("Invalid search credentials: {0}")]
    InvalidCredentials(String),
}
