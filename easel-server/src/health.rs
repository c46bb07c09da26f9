//! Health endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Overall status, always "healthy" while the process serves.
    pub status: &'static str,
    /// Server version.
    pub version: &'static str,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Number of live drawing sessions.
    pub sessions: usize,
}

/// Liveness/readiness probe.
#[tracing::instrument(name = "health", skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        sessions: state.store.session_ids().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "healthy",
            version: "0.1.0",
            uptime_secs: 42,
            sessions: 2,
        };

        let json = serde_json::to_string(&status).expect("should serialize");
        assert!(json.contains("healthy"));
        assert!(json.contains("uptimeSecs"));
        assert!(json.contains("0.1.0"));
    }
}
