// Port Operations Dashboard - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use axum::{response::Html, routing::get, Router};
use port_ops::api::{api_router, AppState};
use port_ops::{logging, open_database, AppConfig};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// GET / - Serve the dashboard page
async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../web/index.html"))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = AppConfig::load_or_default(None)?;
    tracing::info!(version = port_ops::VERSION, "port operations server starting");

    let conn = open_database(&config.database_path)?;
    tracing::info!(path = %config.database_path.display(), "database opened");

    let addr = config.server_addr.clone();
    let state = AppState::new(conn, config);

    let app = Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_router(state))
        .nest_service("/static", ServeDir::new("web"))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/dashboard?from=2024-01-01&to=2024-01-31", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server stopped with an error")?;

    Ok(())
}
