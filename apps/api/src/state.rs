use std::sync::Arc;

use sqlx::PgPool;

use crate::generation::orchestrator::RetryPolicy;
use crate::llm_client::{LlmTransport, ModelConfig};
use crate::rate_limit::DailyQuota;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub quota: DailyQuota,
    /// The only path to the LLM provider. Swapped for a stub in tests.
    pub llm: Arc<dyn LlmTransport>,
    pub model_config: ModelConfig,
    pub retry_policy: RetryPolicy,
}
