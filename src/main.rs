//! Tune graph viewer - browse the neighborhood of songs, titles and
//! instances in a tune database.
//!
//! This is the main entry point for the viewer's web server.
//! The application is organized into the following modules:
//!
//! - `focus`: Resolving the focus entity from a location
//! - `client`: Fetching neighborhoods from the tune database
//! - `graph` / `reconcile`: The graph store and incremental updates to it
//! - `layout` / `render`: Ranked layout and the drawn scene
//! - `session`: Per-browser request ordering and error surfacing
//! - `templates`: HTML/SVG/JS rendering
//! - `handlers`: HTTP route handlers

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tunegraph::{handlers, AppState, Config};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tunegraph=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Invalid configuration");
    let state = Arc::new(AppState::from_config(&config).expect("Failed to build HTTP client"));

    let app = Router::new()
        .route("/graph/{id}/", get(handlers::graph_page))
        .route("/view/graph/{id}/", get(handlers::graph_fragment))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", config.bind, e));

    info!(bind = %config.bind, upstream = %config.upstream, "tune graph server running");

    axum::serve(listener, app).await.expect("Server error");
}
