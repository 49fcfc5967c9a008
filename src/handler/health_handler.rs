use crate::config::logging::secure_log;
use crate::response::app_response::SuccessResponse;
use crate::state::health_state::HealthState;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthStatus {
    /// `ok` or `degraded`
    pub status: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub database: DatabaseHealth,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DatabaseHealth {
    /// `connected`, `disconnected` or `in-memory`
    pub status: String,
    pub response_time_ms: Option<u128>,
}

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

pub fn init_start_time() {
    START_TIME.set(Instant::now()).ok();
}

pub fn get_uptime_seconds() -> u64 {
    START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Always 200; a failed database ping degrades the reported status.
pub async fn health_check(State(state): State<HealthState>) -> SuccessResponse<HealthStatus> {
    let database = check_database_health(&state).await;
    let status = if database.status == "disconnected" {
        "degraded"
    } else {
        "ok"
    };

    SuccessResponse::send(HealthStatus {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: get_uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    })
}

async fn check_database_health(state: &HealthState) -> DatabaseHealth {
    let Some(db) = &state.database else {
        return DatabaseHealth {
            status: "in-memory".to_string(),
            response_time_ms: None,
        };
    };

    let start_time = Instant::now();
    match db.ping().await {
        Ok(()) => {
            let response_time = start_time.elapsed().as_millis();
            info!("Database health check passed in {}ms", response_time);
            DatabaseHealth {
                status: "connected".to_string(),
                response_time_ms: Some(response_time),
            }
        }
        Err(e) => {
            secure_log::secure_error!("Database health check failed", e);
            DatabaseHealth {
                status: "disconnected".to_string(),
                response_time_ms: None,
            }
        }
    }
}
