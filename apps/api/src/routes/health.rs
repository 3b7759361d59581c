use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// GET /health
/// Lightweight probe for uptime monitoring and deploy checks.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "copygen-api",
        "timestamp": Utc::now().to_rfc3339()
    }))
}
