use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: bool,
    /// `applied/embedded` schema migrations, absent when the database is down.
    #[serde(skip_serializing_if = "Option::is_none")]
    migrations: Option<String>,
    version: &'static str,
}

/// 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let migrations = match state.db.migration_status().await {
        Ok((embedded, applied)) if database => Some(format!("{applied}/{embedded}")),
        _ => None,
    };
    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        tracing::warn!("Health check: database unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            migrations,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
