use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use storebot_core::MetricsSnapshot;

use crate::storefront::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health)).route("/metrics", get(metrics))
}

/// Always 200; the process serving at all is the signal.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
