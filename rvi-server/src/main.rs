//! rvi-server - ReviewIntel HTTP service
//!
//! Ingests customer-review CSV exports, runs the single-call Gemini
//! analysis pipeline, and serves the dashboard read API with CSV/PDF
//! export.

use anyhow::Result;
use clap::Parser;
use rvi_common::config::{self, GeminiConfig};
use tracing::info;

use rvi_server::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "rvi-server", about = "ReviewIntel analysis service")]
struct Args {
    /// Data directory holding reviewintel.db (falls back to config file,
    /// then the platform default)
    #[arg(long)]
    root_folder: Option<String>,

    /// Listen port
    #[arg(long, env = "RVI_PORT", default_value_t = 5780)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing first so startup problems are visible
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting ReviewIntel server v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), "RVI_ROOT_FOLDER")?;
    config::ensure_root_folder(&root_folder)?;

    let db_path = config::database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let pool = rvi_common::db::init_database(&db_path).await?;
    info!("Database connection established");

    let gemini = GeminiConfig::from_env();
    if gemini.validate_key().is_err() {
        info!("GEMINI_API_KEY not configured; uploads will work but analysis requests will be rejected");
    }

    let state = AppState::new(pool, gemini);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("rvi-server listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
