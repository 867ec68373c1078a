use anyhow::Context;
use api_client::ApiFootballClient;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::settings::Config;
use configuration::{LogLevel, load_config};
use core_types::season::season_start_year;
use database::{DbRepository, MemoryStore, Store, connect, run_migrations};
use firestore::FirestoreClient;
use migrator::MigrationReport;
use search::AlgoliaClient;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

mod telemetry;

/// Career tracking for Football Manager saves: the REST API and its data jobs.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    let _guard = telemetry::init(&config.logging)?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, &config).await,
        Commands::Migrate(args) => handle_migrate(args, &config).await,
        Commands::Enrich(args) => handle_enrich(args, &config).await,
        Commands::SeedSearch(args) => handle_seed(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides `logging.level` from the configuration.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API.
    Serve(ServeArgs),
    /// Copy users, saves and challenges out of the legacy document store.
    Migrate(MigrateArgs),
    /// Import reference data from the football-data API.
    Enrich(EnrichArgs),
    /// Push teams and competition groups into the search index.
    SeedSearch(SeedArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Listen address; defaults to `server.host`:`server.port`.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Serve from an in-memory store instead of Postgres.
    #[arg(long)]
    ephemeral: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MigrateTarget {
    Users,
    Saves,
    Challenges,
}

#[derive(Parser)]
struct MigrateArgs {
    /// Migrate a single collection. Saves need their users migrated first.
    #[arg(long, value_enum)]
    only: Option<MigrateTarget>,

    /// Read and validate every document without writing anything.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum EnrichTarget {
    Countries,
    Competitions,
    Teams,
}

#[derive(Parser)]
struct EnrichArgs {
    #[arg(value_enum)]
    target: EnrichTarget,

    /// Season start year for the team import (e.g. 2024); defaults to the current season.
    #[arg(long)]
    season: Option<i32>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SeedTarget {
    Teams,
    Competitions,
}

#[derive(Parser)]
struct SeedArgs {
    #[arg(long, value_enum)]
    only: Option<SeedTarget>,

    /// Records per indexing request.
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    let pool = connect(&config.database).await?;
    run_migrations(&pool).await?;
    Ok(Arc::new(DbRepository::new(pool)))
}

async fn handle_serve(args: ServeArgs, config: &Config) -> anyhow::Result<()> {
    let store: Arc<dyn Store> = if args.ephemeral {
        tracing::warn!("Serving from an in-memory store; nothing will be persisted.");
        Arc::new(MemoryStore::new())
    } else {
        open_store(config).await?
    };
    let addr = match args.addr {
        Some(addr) => addr,
        None => config.server.socket_addr().map_err(anyhow::Error::msg)?,
    };
    web_server::run_server(config, addr, store).await
}

async fn handle_migrate(args: MigrateArgs, config: &Config) -> anyhow::Result<()> {
    let source = FirestoreClient::new(&config.firestore)?;
    let store = open_store(config).await?;
    let wants = |target: MigrateTarget| args.only.is_none_or(|only| only == target);

    if args.dry_run {
        tracing::info!("Dry run: documents are validated but not written.");
    }

    let mut reports = Vec::new();
    if wants(MigrateTarget::Users) {
        reports.push(migrator::migrate_users(&source, store.as_ref(), args.dry_run).await?);
    }
    if wants(MigrateTarget::Saves) {
        let saves = migrator::migrate_saves(&source, store.as_ref(), args.dry_run).await?;
        reports.extend(saves.into_reports());
    }
    if wants(MigrateTarget::Challenges) {
        reports.push(migrator::migrate_challenges(&source, store.as_ref(), args.dry_run).await?);
    }

    print_reports(&reports);
    Ok(())
}

async fn handle_enrich(args: EnrichArgs, config: &Config) -> anyhow::Result<()> {
    let api = ApiFootballClient::new(&config.football_api)?;
    let store = open_store(config).await?;

    let reports = match args.target {
        EnrichTarget::Countries => vec![migrator::import_countries(&api, store.as_ref()).await?],
        EnrichTarget::Competitions => migrator::import_competitions(&api, store.as_ref()).await?,
        EnrichTarget::Teams => {
            let season = args
                .season
                .unwrap_or_else(|| season_start_year(Utc::now().date_naive()));
            tracing::info!(season, "Importing teams.");
            vec![migrator::import_teams(&api, store.as_ref(), season).await?]
        }
    };

    print_reports(&reports);
    Ok(())
}

async fn handle_seed(args: SeedArgs, config: &Config) -> anyhow::Result<()> {
    let backend = AlgoliaClient::new(&config.search)?;
    let store = open_store(config).await?;
    let wants = |target: SeedTarget| args.only.is_none_or(|only| only == target);
    let settings = &config.search;

    let mut reports = Vec::new();
    if wants(SeedTarget::Teams) {
        reports.push(
            migrator::seed_teams(&backend, store.as_ref(), &settings.teams_index, args.batch_size)
                .await?,
        );
    }
    if wants(SeedTarget::Competitions) {
        reports.push(
            migrator::seed_competitions(
                &backend,
                store.as_ref(),
                &settings.competitions_index,
                args.batch_size,
            )
            .await?,
        );
    }

    print_reports(&reports);
    Ok(())
}

fn print_reports(reports: &[MigrationReport]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Entity", "Migrated", "Skipped", "Failed", "Total"]);
    for report in reports {
        table.add_row(vec![
            report.entity.clone(),
            report.migrated.to_string(),
            report.skipped.to_string(),
            report.failed.to_string(),
            report.total().to_string(),
        ]);
    }
    println!("\n{table}");
}
