use crate::hub::{Hub, HubStats};
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;

/// Shared state for stats/health endpoints
#[derive(Clone)]
pub struct StatsAppState {
    pub hub: Arc<Hub>,
}

/// Create stats and health router
pub fn create_stats_router(state: Arc<StatsAppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/hub/stats", get(hub_stats))
        .with_state(state)
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// GET /api/hub/stats - Live connection count and lifetime relay counters
async fn hub_stats(State(state): State<Arc<StatsAppState>>) -> Json<HubStats> {
    Json(state.hub.stats())
}
