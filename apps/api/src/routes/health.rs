use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "PR Statement Generator API is running"
    }))
}

/// GET /
/// Service banner with version and where to look next.
pub async fn root_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "PR Statement Generator API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health",
        "generation_available": state.workflow.is_some(),
        "max_iterations": state.config.max_iterations
    }))
}
