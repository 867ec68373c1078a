use crate::error::SearchError;
use async_trait::async_trait;
use configuration::SearchSettings;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod error;
pub mod records;

pub use records::{CompetitionRecord, TeamRecord};

/// A hosted search index. Only the two calls the system needs are modelled.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Adds or replaces the given objects. Each must carry an `objectID`.
    async fn save_objects(&self, index: &str, objects: &[Value]) -> Result<(), SearchError>;

    /// Runs a full-text query and returns at most `limit` hits.
    async fn search(&self, index: &str, query: &str, limit: usize) -> Result<Vec<Value>, SearchError>;
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    action: &'static str,
    body: &'a Value,
}

#[derive(Debug, Serialize)]
struct BatchPayload<'a> {
    requests: Vec<BatchRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryParams<'a> {
    query: &'a str,
    hits_per_page: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    hits: Vec<Value>,
}

/// A client for the Algolia REST API.
pub struct AlgoliaClient {
    client: Client,
    write_url: String,
    read_url: String,
}

impl AlgoliaClient {
    /// Creates a new `AlgoliaClient`.
    ///
    /// Fails with [`SearchError::NotConfigured`] if the application id or API
    /// key is missing, so callers can fall back to database search.
    pub fn new(settings: &SearchSettings) -> Result<Self, SearchError> {
        let write_url = format!("https://{}.algolia.net", settings.app_id);
        let read_url = format!("https://{}-dsn.algolia.net", settings.app_id);
        Self::with_hosts(settings, write_url, read_url)
    }

    /// Like [`AlgoliaClient::new`] but against explicit hosts.
    pub fn with_hosts(
        settings: &SearchSettings,
        write_url: String,
        read_url: String,
    ) -> Result<Self, SearchError> {
        if !settings.is_configured() {
            return Err(SearchError::NotConfigured);
        }

        let mut headers = HeaderMap::new();
        let app_id = HeaderValue::from_str(&settings.app_id)
            .map_err(|e| SearchError::InvalidCredentials(format!("app id: {e}")))?;
        let mut api_key = HeaderValue::from_str(&settings.api_key)
            .map_err(|e| SearchError::InvalidCredentials(format!("api key: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert("X-Algolia-Application-Id", app_id);
        headers.insert("X-Algolia-API-Key", api_key);

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            write_url: write_url.trim_end_matches('/').to_string(),
            read_url: read_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SearchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to decode error response".to_string());
        Err(SearchError::Status(status.as_u16(), text))
    }
}

#[async_trait]
impl SearchBackend for AlgoliaClient {
    async fn save_objects(&self, index: &str, objects: &[Value]) -> Result<(), SearchError> {
        if objects.is_empty() {
            return Ok(());
        }
        let url = format!("{}/1/indexes/{}/batch", self.write_url, index);
        let payload = BatchPayload {
            requests: objects
                .iter()
                .map(|body| BatchRequest { action: "updateObject", body })
                .collect(),
        };

        let response = self.client.post(&url).json(&payload).send().await?;
        Self::check(response).await?;
        tracing::debug!(index, count = objects.len(), "Indexed search objects.");
        Ok(())
    }

    async fn search(&self, index: &str, query: &str, limit: usize) -> Result<Vec<Value>, SearchError> {
        let url = format!("{}/1/indexes/{}/query", self.read_url, index);
        let params = serde_qs::to_string(&QueryParams { query, hits_per_page: limit })
            .map_err(|e| SearchError::Encode(e.to_string()))?;

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "params": params }))
            .send()
            .await?;
        let body: QueryResponse = Self::check(response).await?.json().await?;
        Ok(body.hits)
    }
}

/// Serializes records for [`SearchBackend::save_objects`].
pub fn to_objects<T: Serialize>(records: &[T]) -> Result<Vec<Value>, SearchError> {
    records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(SearchError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings() -> SearchSettings {
        SearchSettings {
            app_id: "APP".into(),
            api_key: "secret".into(),
            ..SearchSettings::default()
        }
    }

    fn client(server: &MockServer) -> AlgoliaClient {
        AlgoliaClient::with_hosts(&settings(), server.uri(), server.uri()).unwrap()
    }

    #[tokio::test]
    async fn save_objects_sends_a_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/indexes/teams/batch"))
            .and(header("X-Algolia-Application-Id", "APP"))
            .and(header("X-Algolia-API-Key", "secret"))
            .and(body_json(json!({
                "requests": [
                    { "action": "updateObject", "body": { "objectID": "33", "name": "Manchester United" } }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "taskID": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .save_objects("teams", &[json!({ "objectID": "33", "name": "Manchester United" })])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_batches_are_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        client(&server).save_objects("teams", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn search_returns_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/indexes/competitions/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": [ { "objectID": "7", "name": "Premier League" } ],
                "nbHits": 1
            })))
            .mount(&server)
            .await;

        let hits = client(&server).search("competitions", "premier", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["name"], json!("Premier League"));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Invalid Application-ID or API key"))
            .mount(&server)
            .await;

        let err = client(&server).search("teams", "x", 5).await.unwrap_err();
        assert!(matches!(err, SearchError::Status(403, _)));
    }

    #[test]
    fn unconfigured_client_is_refused() {
        assert!(matches!(
            AlgoliaClient::new(&SearchSettings::default()),
            Err(SearchError::NotConfigured)
        ));
    }

    #[test]
    fn unusable_credentials_are_reported() {
        let mut settings = settings();
        settings.api_key = "line\nbreak".to_string();
        assert!(matches!(
            AlgoliaClient::new(&settings),
            Err(SearchError::InvalidCredentials(_))
        ));
    }
}
