use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use crate::export::SourceExporter;
use crate::storage::SourceStore;
use crate::validator::Validator;

pub mod routes;

/// Server state
///
/// Each request opens its own connection; the database's unique constraint
/// is the only coordination between concurrent writers.
pub struct AppState {
    pub database_path: PathBuf,
    pub validator: Arc<dyn Validator>,
    pub validation_timeout: Duration,
    pub exporter: SourceExporter,
}

impl AppState {
    pub fn open_store(&self) -> crate::Result<SourceStore> {
        Ok(SourceStore::open(&self.database_path, self.validator.clone())?
            .with_validation_timeout(self.validation_timeout))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stats", get(routes::get_stats))
        .route("/sources", get(routes::list_sources).post(routes::create_source))
        .route("/sources/by-name/{*filename}", get(routes::find_source))
        .route(
            "/sources/{id}",
            get(routes::get_source)
                .put(routes::update_source)
                .delete(routes::delete_source),
        )
        .route("/sources/{id}/export", post(routes::export_source))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    println!("{} Server running at http://{}", crate::ui::Icons::GLOBE, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
