use thiserror::Error;

#[derive(Error, Debug)]
pub enum FirestoreError {
    #[error("Firestore request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Firestore responded with status {0}: {1}")]
    Status(u16, String),

    #[error("Unsupported Firestore value: {0}")]
    UnsupportedValue(String),

    #[error("Failed to decode Firestore document: {0}")]
    Decode(String),

    #[error("Firestore is not configured: set firestore.project_id and firestore.access_token (FIREBASE_PROJECT_ID / FIRESTORE_ACCESS_TOKEN)")]
    NotConfigured,
}
