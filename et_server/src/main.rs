//! Esports tournament HTTP server.
//!
//! Connects to PostgreSQL, applies migrations, seeds bootstrap accounts and
//! serves the REST API until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use esports_tournaments::{
    auth::AuthManager,
    db::{Database, PgTournamentRepository, PgUserRepository},
    tournament::TournamentManager,
};
use et_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging, metrics,
};
use pico_args::Arguments;
use tracing::{info, warn};

const HELP: &str = "\
Run the esports tournament API server

USAGE:
  et_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8000)
  DATABASE_URL                 PostgreSQL connection string
  JWT_SECRET                   JWT signing secret (at least 32 characters)
  PASSWORD_PEPPER              Password hashing pepper (at least 16 characters)
  ACCESS_TOKEN_EXPIRE_MINUTES  Access token lifetime [default: 1440]
  CORS_ORIGINS                 Comma-separated allowed origins [default: http://localhost:3000]
  SEED_ADMIN_PASSWORD          Create an `admin` account with this password
  SEED_DEMO_PASSWORD           Also create demo organizers and players
  METRICS_BIND                 Prometheus exporter address (disabled when unset)
  (See .env file for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let args = Args {
        bind: pargs
            .opt_value_from_str("--bind")
            .context("Invalid --bind address")?,
        database_url: pargs
            .opt_value_from_str("--db-url")
            .context("Invalid --db-url")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported on http://{}/metrics", addr);
    }

    info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    info!("Database connected and migrated");

    let pool = db.pool().clone();
    let auth_manager = Arc::new(AuthManager::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        config.security.auth_config(),
    ));
    let tournament_manager = Arc::new(TournamentManager::new(
        Arc::new(PgTournamentRepository::new(pool)),
        config.tournaments,
    ));

    match &config.seed {
        Some(seed) => {
            let created = auth_manager
                .seed_accounts(seed)
                .await
                .context("Failed to seed accounts")?;
            info!("Account seeding done ({} created)", created);
        }
        None => warn!("SEED_ADMIN_PASSWORD not set, skipping account seeding"),
    }

    let state = AppState {
        auth_manager,
        tournament_manager,
    };
    let app = api::create_router(state, api::cors_layer(&config.cors_origins));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
}
