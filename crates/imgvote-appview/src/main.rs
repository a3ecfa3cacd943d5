//! Image-voting gallery server
//!
//! Serves gallery images through the tiered cache, records likes, and exposes
//! the password-guarded profile and team sheets.

mod adapters;
mod auth;
mod config;
mod error;
mod routes;
mod server;
mod state;

use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use config::Config;
use error::StartupError;
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let env_filter = EnvFilter::from_default_env()
        .add_directive("imgvote_appview=info".parse()?)
        .add_directive("imgvote_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    let config = Config::from_env()?;
    info!(
        port = config.port,
        backend = config.backend.name(),
        cache_dir = ?config.cache_dir,
        original_folder = %config.layout.original_folder,
        cached_folder = %config.layout.cached_folder,
        "Starting imgvote-appview"
    );

    let backends = state::connect_backends(&config).await?;
    let state = AppState::new(backends, &config);
    state.gallery.fetcher().disk().init().await?;

    let router = server::create_router(state, &config.cors_origins, config.static_dir.as_deref());
    server::start_server(router, config.port).await?;

    Ok(())
}
