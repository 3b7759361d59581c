pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/generate", post(handlers::handle_generate))
        .route("/api/v1/history", get(handlers::handle_history))
        .route("/api/v1/history/:id", get(handlers::handle_history_detail))
        .route("/api/v1/score", post(handlers::handle_score))
        .with_state(state)
}
