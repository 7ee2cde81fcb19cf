//! `/version` and `/config` handlers.

use super::AppState;
use crate::config::ConfigSnapshot;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

/// `/version` response body.
#[derive(Debug, Serialize)]
pub struct VersionInfo {
    /// Crate version.
    pub version: &'static str,
}

/// `GET /version`
pub async fn version() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /config`
pub async fn config(State(state): State<AppState>) -> Json<ConfigSnapshot> {
    Json(state.config.as_ref().clone())
}
