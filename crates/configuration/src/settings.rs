use serde::Deserialize;
use std::net::SocketAddr;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty `config.toml` (or none at all)
/// still yields a usable configuration for local development.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub search: SearchSettings,
    pub football_api: FootballApiSettings,
    pub firestore: FirestoreSettings,
    pub logging: LoggingSettings,
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must not be 0".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("database.max_connections must be at least 1".to_string());
        }
        if self.football_api.requests_per_minute == 0 {
            return Err("football_api.requests_per_minute must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body, in megabytes.
    pub body_limit_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            body_limit_mb: 2,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("invalid server address {}:{}: {}", self.host, self.port, e))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Usually supplied through `DATABASE_URL`.
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

/// Bearer-token verification settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 secret the identity provider signs tokens with (`JWT_SECRET`).
    pub jwt_secret: String,
    /// When set, tokens must be issued for this Firebase project.
    pub project_id: Option<String>,
    /// User ids granted the admin role regardless of token claims.
    pub admin_uids: Vec<String>,
}

/// Hosted search (Algolia). Search is disabled while either credential is empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub app_id: String,
    pub api_key: String,
    pub teams_index: String,
    pub competitions_index: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            api_key: String::new(),
            teams_index: "teams".to_string(),
            competitions_index: "competitions".to_string(),
        }
    }
}

impl SearchSettings {
    pub fn is_configured(&self) -> bool {
        !self.app_id.is_empty() && !self.api_key.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FootballApiSettings {
    pub base_url: String,
    pub api_key: String,
    /// The free plan allows 10 requests per minute.
    pub requests_per_minute: u32,
}

impl Default for FootballApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://v3.football.api-sports.io".to_string(),
            api_key: String::new(),
            requests_per_minute: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FirestoreSettings {
    pub base_url: String,
    pub project_id: String,
    /// OAuth access token, e.g. from `gcloud auth print-access-token`.
    pub access_token: String,
    pub page_size: u32,
}

impl Default for FirestoreSettings {
    fn default() -> Self {
        Self {
            base_url: "https://firestore.googleapis.com/v1".to_string(),
            project_id: String::new(),
            access_token: String::new(),
            page_size: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Directory for the daily rolling log file.
    pub directory: String,
    pub file_prefix: String,
    pub level: LogLevel,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "fm-tracker.log".to_string(),
            level: LogLevel::Info,
        }
    }
}
