//! Health check endpoint

use axum::extract::State;
use axum::Json;

use crate::stats::HealthStatus;

use super::AppState;

/// GET /health
///
/// Returns `{status, clientCount, messageCount}`. No side effects.
pub(super) async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.relay.health().await)
}
