use std::time::Duration;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::server::app::AppState;

const DB_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: DatabaseHealth,
}

#[derive(Serialize, PartialEq, Eq, Clone, Copy, Debug)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Ok,
    NotConfigured,
    Error,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DatabaseHealth {
    fn status(status: ProbeStatus) -> Self {
        Self {
            status,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            status: ProbeStatus::Error,
            error: Some(error),
        }
    }
}

async fn probe_database(pool: &PgPool) -> DatabaseHealth {
    match tokio::time::timeout(DB_PROBE_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => DatabaseHealth::status(ProbeStatus::Ok),
        Ok(Err(e)) => DatabaseHealth::failed(format!("Query failed: {e}")),
        Err(_) => DatabaseHealth::failed(format!(
            "Query timeout (>{}s)",
            DB_PROBE_TIMEOUT.as_secs()
        )),
    }
}

/// Liveness plus a database round trip.
///
/// Without a pool (in-memory deployments and tests) the database reports
/// `not_configured` and the service stays healthy.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.db_pool {
        Some(pool) => probe_database(pool).await,
        None => DatabaseHealth::status(ProbeStatus::NotConfigured),
    };

    let (code, status) = match database.status {
        ProbeStatus::Error => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        ProbeStatus::Ok | ProbeStatus::NotConfigured => (StatusCode::OK, "healthy"),
    };

    (code, Json(HealthResponse { status, database }))
}
