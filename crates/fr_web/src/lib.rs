use axum::{routing::get, Router};
use fr_core::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod handlers;
pub mod reports;
pub mod state;

pub use reports::{list_reports, ReportEntry};
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/reports", get(handlers::reports_page))
        .route("/api/reports", get(handlers::api_reports))
        .fallback(handlers::report_file)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serves `output_dir` on all interfaces until the process is stopped.
pub async fn serve(output_dir: impl Into<PathBuf>, port: u16) -> Result<()> {
    let output_dir = output_dir.into();
    tokio::fs::create_dir_all(&output_dir).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Serving {} on http://{}", output_dir.display(), listener.local_addr()?);

    axum::serve(listener, create_app(AppState::new(output_dir))).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::AppState;
    pub use fr_core::{Error, Result};
}
