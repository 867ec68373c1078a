use crate::auth::auth_headers;
use crate::error::ApiError;
use async_trait::async_trait;
use configuration::FootballApiSettings;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

mod auth;
pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::{ApiCountry, ApiLeagueEntry, ApiTeamEntry};

/// The abstract interface for the football-data provider.
/// The enrichment jobs are written against this trait, allowing the
/// underlying implementation (live or mock) to be swapped out.
#[async_trait]
pub trait FootballApi: Send + Sync {
    /// Fetches every country the provider knows about.
    async fn fetch_countries(&self) -> Result<Vec<ApiCountry>, ApiError>;

    /// Fetches the leagues and cups of one country, by country name.
    async fn fetch_leagues(&self, country: &str) -> Result<Vec<ApiLeagueEntry>, ApiError>;

    /// Fetches the teams taking part in a league in a given season year.
    async fn fetch_teams(&self, league_id: i32, season: i32) -> Result<Vec<ApiTeamEntry>, ApiError>;
}

/// A concrete implementation of `FootballApi` for api-sports' football v3 API.
///
/// Requests are paced so that no more than `requests_per_minute` are sent.
pub struct ApiFootballClient {
    client: reqwest::Client,
    base_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl ApiFootballClient {
    pub fn new(settings: &FootballApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .default_headers(auth_headers(&settings.api_key)?)
            .timeout(Duration::from_secs(30))
            .build()?;

        let per_minute = settings.requests_per_minute.max(1);
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            min_interval: Duration::from_secs(60) / per_minute,
            last_request: Mutex::new(None),
        })
    }

    /// Sleeps until the next request is allowed, then records it.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        self.pace().await;

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?query, "Calling football API.");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16(), text));
        }

        let envelope: responses::Envelope<T> =
            serde_json::from_str(&text).map_err(|e| ApiError::Deserialization(e.to_string()))?;
        if let Some(message) = envelope.error_message() {
            return Err(ApiError::Provider(message));
        }
        tracing::debug!(results = envelope.results, path, "Football API responded.");
        Ok(envelope.response)
    }
}

#[async_trait]
impl FootballApi for ApiFootballClient {
    async fn fetch_countries(&self) -> Result<Vec<ApiCountry>, ApiError> {
        self.get("/countries", &[]).await
    }

    async fn fetch_leagues(&self, country: &str) -> Result<Vec<ApiLeagueEntry>, ApiError> {
        self.get("/leagues", &[("country", country.to_string())]).await
    }

    async fn fetch_teams(&self, league_id: i32, season: i32) -> Result<Vec<ApiTeamEntry>, ApiError> {
        self.get(
            "/teams",
            &[("league", league_id.to_string()), ("season", season.to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: String) -> FootballApiSettings {
        FootballApiSettings {
            base_url,
            api_key: "test-key".to_string(),
            requests_per_minute: 6000,
        }
    }

    #[tokio::test]
    async fn fetches_teams_with_key_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/teams"))
            .and(query_param("league", "39"))
            .and(query_param("season", "2024"))
            .and(header("x-apisports-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [],
                "results": 1,
                "response": [
                    { "team": { "id": 33, "name": "Manchester United", "country": "England", "national": false, "logo": "https://media/33.png" },
                      "venue": { "id": 556 } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiFootballClient::new(&settings(server.uri())).unwrap();
        let teams = client.fetch_teams(39, 2024).await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].team.name, "Manchester United");
    }

    #[tokio::test]
    async fn provider_errors_surface() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/countries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": { "requests": "You have reached the request limit for the day" },
                "results": 0,
                "response": []
            })))
            .mount(&server)
            .await;

        let client = ApiFootballClient::new(&settings(server.uri())).unwrap();
        let err = client.fetch_countries().await.unwrap_err();
        assert!(matches!(err, ApiError::Provider(msg) if msg.contains("request limit")));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/leagues"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = ApiFootballClient::new(&settings(server.uri())).unwrap();
        let err = client.fetch_leagues("England").await.unwrap_err();
        assert!(matches!(err, ApiError::Status(503, _)));
    }

    #[test]
    fn missing_key_is_rejected() {
        let mut s = settings("http://localhost".into());
        s.api_key.clear();
        assert!(matches!(ApiFootballClient::new(&s), Err(ApiError::Configuration(_))));
    }
}
