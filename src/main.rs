use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use portal_api::auth::TokenIssuer;
use portal_api::config;
use portal_api::database::DatabaseManager;
use portal_api::routes;
use portal_api::state::AppState;
use portal_api::store::PgStore;

#[derive(Parser)]
#[command(name = "portal-api")]
#[command(about = "Shop and reservation portal backend")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Port to listen on (overrides API_PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Apply database migrations before serving")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and SECURITY_JWT_SECRET
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = config::config();
    tracing::info!("Starting portal API in {:?} mode", config.environment);

    let tokens = TokenIssuer::from_config(&config.security).context("token issuer")?;

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    if cli.migrate || config.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }

    let state = AppState::new(Arc::new(PgStore::new(pool)), tokens);
    let app = routes::app(state, config);

    let port = cli.port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Portal API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;

    Ok(())
}
