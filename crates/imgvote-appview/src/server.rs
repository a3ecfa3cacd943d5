//! Router assembly and HTTP listener

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::auth;
use crate::routes;
use crate::state::AppState;

/// Upper bound on request bodies (multipart uploads)
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    }
}

/// Create the HTTP router
pub fn create_router(state: AppState, cors_origins: &[String], static_dir: Option<&Path>) -> Router {
    let student_only = Router::new()
        .route("/api/profiles", get(routes::sheets::get_profiles))
        .route("/api/teams", get(routes::sheets::get_teams))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_student_password,
        ));

    let app = Router::new()
        .route("/health", get(routes::health::health))
        // Images
        .route("/image/{id}", get(routes::images::get_image))
        .route("/images/all", get(routes::images::get_all))
        .route("/images/top10_liked", get(routes::images::get_top_liked))
        .route("/upload", post(routes::upload::upload))
        .route("/like_image", post(routes::likes::like_image))
        // Admin
        .route("/init", get(routes::admin::init))
        // Sheets
        .route("/api/verify_password", post(routes::sheets::verify_password))
        .merge(student_only)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(cors_origins))
        .with_state(state);

    match static_dir {
        Some(dir) => {
            info!(static_dir = ?dir, "Serving static files");
            let index = dir.join("index.html");
            app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => app,
    }
}

/// Start the HTTP server
pub async fn start_server(router: Router, port: u16) -> std::io::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}
