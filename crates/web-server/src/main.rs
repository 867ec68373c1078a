use database::{DbRepository, Store};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// This main function is the entry point when running `cargo run -p web-server`.
// It serves the API against PostgreSQL using `config.toml` from the working directory.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = configuration::load_config(&PathBuf::from("config.toml"))?;
    let addr = config.server.socket_addr().map_err(anyhow::Error::msg)?;

    let pool = database::connect(&config.database).await?;
    database::run_migrations(&pool).await?;
    let store: Arc<dyn Store> = Arc::new(DbRepository::new(pool));

    web_server::run_server(&config, addr, store).await
}
