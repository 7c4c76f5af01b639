use axum::Json;
use serde_json::{json, Value};

/// GET /health: liveness probe, no authorization.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
