use crate::error::ConfigError;
use crate::settings::Config;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    AuthSettings, DatabaseSettings, FirestoreSettings, FootballApiSettings, LogLevel,
    LoggingSettings, SearchSettings, ServerSettings,
};

/// Environment variables that carry credentials, and the config keys they fill.
pub const CREDENTIAL_ENV_VARS: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("JWT_SECRET", "auth.jwt_secret"),
    ("FIREBASE_PROJECT_ID", "firestore.project_id"),
    ("FIRESTORE_ACCESS_TOKEN", "firestore.access_token"),
    ("ALGOLIA_APP_ID", "search.app_id"),
    ("ALGOLIA_API_KEY", "search.api_key"),
    ("FOOTBALL_API_KEY", "football_api.api_key"),
];

/// Loads the application configuration.
///
/// Sources, lowest precedence first:
/// 1. the TOML file at `path` (optional),
/// 2. `FMT__SECTION__KEY` environment variables,
/// 3. the well-known credential variables in [`CREDENTIAL_ENV_VARS`].
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("FMT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("auth.admin_uids"),
        );

    for (var, key) in CREDENTIAL_ENV_VARS {
        builder = builder.set_override_option(*key, std::env::var(var).ok())?;
    }

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.build()?.try_deserialize::<Config>()?;
    config.validate().map_err(ConfigError::ValidationError)?;

    tracing::debug!(path = %path.display(), "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for (var, _) in CREDENTIAL_ENV_VARS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn missing_file_yields_defaults() {
        clear_env();
        let config = load_config(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.search.teams_index, "teams");
        assert!(!config.search.is_configured());
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    #[serial]
    fn file_values_and_credential_overrides() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[auth]
jwt_secret = "from-file"
admin_uids = ["uid-1"]

[logging]
level = "debug"
"#
        )
        .unwrap();

        // SAFETY: tests touching the environment are serialized.
        unsafe { std::env::set_var("JWT_SECRET", "from-env") };
        let config = load_config(file.path()).unwrap();
        clear_env();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.auth.admin_uids, vec!["uid-1".to_string()]);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    #[serial]
    fn zero_port_is_rejected() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nport = 0").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::ValidationError(_))));
    }
}
