//! HTTP API.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET, POST /companies` | list, create |
//! | `GET, PUT, PATCH, DELETE /companies/{id}` | fetch, replace, patch, delete |
//! | `GET /companies/{id}/children` | direct children |
//! | `GET /companies/{id}/ancestors` | parent chain, nearest first |
//! | `POST /import/csv`, `POST /import/json` | multipart upload, part `file` |
//! | `GET /export/csv`, `GET /export/json` | attachment download |
//! | `GET /version`, `GET /config` | metadata |

mod companies;
mod error;
mod meta;
mod transfer;

pub use error::ApiError;
pub use meta::VersionInfo;
pub use transfer::{FILE_FIELD, ImportResponse, NO_FILE_PART, NO_SELECTED_FILE};

use crate::config::{ConfigSnapshot, RegistryConfig};
use crate::io::{ExportService, ImportService};
use crate::services::CompanyService;
use crate::storage::CompanyStore;
use crate::validation::CompanyValidator;
use crate::{Error, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    companies: Arc<CompanyService>,
    imports: Arc<ImportService>,
    exports: Arc<ExportService>,
    config: Arc<ConfigSnapshot>,
}

impl AppState {
    /// Wires the services over a store.
    #[must_use]
    pub fn new(store: Arc<dyn CompanyStore>, config: &RegistryConfig) -> Self {
        let validator = CompanyValidator::new(config.limits.clone());
        let companies = Arc::new(CompanyService::new(Arc::clone(&store), validator));
        Self {
            imports: Arc::new(ImportService::new(Arc::clone(&companies))),
            exports: Arc::new(ExportService::new(store)),
            companies,
            config: Arc::new(config.snapshot()),
        }
    }
}

/// Runs a store-bound closure off the async workers.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "spawn_blocking".to_string(),
            cause: e.to_string(),
        })?
}

/// Builds the router with request tracing and security headers.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/companies", get(companies::list).post(companies::create))
        .route(
            "/companies/{id}",
            get(companies::get)
                .put(companies::replace)
                .patch(companies::patch)
                .delete(companies::delete),
        )
        .route("/companies/{id}/children", get(companies::children))
        .route("/companies/{id}/ancestors", get(companies::ancestors))
        .route("/import/csv", post(transfer::import_csv))
        .route("/import/json", post(transfer::import_json))
        .route("/export/csv", get(transfer::export_csv))
        .route("/export/json", get(transfer::export_json))
        .route("/version", get(meta::version))
        .route("/config", get(meta::config))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the API until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(state: AppState, config: &RegistryConfig) -> Result<()> {
    let addr = config.bind_address();
    let app = build_router(state, config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "bind".to_string(),
            cause: format!("{addr}: {e}"),
        })?;
    tracing::info!(addr = %addr, environment = %config.environment, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "serve".to_string(),
            cause: e.to_string(),
        })?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
