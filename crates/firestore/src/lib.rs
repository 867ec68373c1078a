use crate::error::FirestoreError;
use async_trait::async_trait;
use configuration::FirestoreSettings;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;

pub mod error;
pub mod value;

pub use value::{decode_fields, decode_value};

/// A Firestore document with its fields already decoded to plain JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The last segment of the document path.
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Deserializes the fields into a typed record.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, FirestoreError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| FirestoreError::Decode(format!("{}: {}", self.id, e)))
    }
}

/// Where migration input comes from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Every document of a top-level collection.
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, FirestoreError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

impl TryFrom<RawDocument> for Document {
    type Error = FirestoreError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let id = raw.name.rsplit('/').next().unwrap_or_default().to_string();
        Ok(Document {
            id,
            fields: decode_fields(&raw.fields)?,
        })
    }
}

/// Reads collections through the Firestore REST API.
pub struct FirestoreClient {
    client: reqwest::Client,
    documents_url: String,
    access_token: String,
    page_size: u32,
}

impl FirestoreClient {
    /// Fails with [`FirestoreError::NotConfigured`] when the project id or
    /// access token is missing.
    pub fn new(settings: &FirestoreSettings) -> Result<Self, FirestoreError> {
        if settings.project_id.is_empty() || settings.access_token.is_empty() {
            return Err(FirestoreError::NotConfigured);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                settings.base_url.trim_end_matches('/'),
                settings.project_id
            ),
            access_token: settings.access_token.clone(),
            page_size: settings.page_size.max(1),
        })
    }

    async fn fetch_page(
        &self,
        collection: &str,
        page_token: Option<&str>,
    ) -> Result<ListResponse, FirestoreError> {
        let url = format!("{}/{}", self.documents_url, collection);
        let mut query = vec![("pageSize", self.page_size.to_string())];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FirestoreError::Status(status.as_u16(), text));
        }
        Ok(response.json::<ListResponse>().await?)
    }
}

#[async_trait]
impl DocumentSource for FirestoreClient {
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, FirestoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_page(collection, page_token.as_deref()).await?;
            for raw in page.documents {
                documents.push(Document::try_from(raw)?);
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::info!(collection, count = documents.len(), "Read Firestore collection.");
        Ok(documents)
    }
}
