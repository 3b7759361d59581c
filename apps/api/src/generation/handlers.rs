//! Axum route handlers for the Generation API.

use anyhow::anyhow;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::orchestrator::generate;
use crate::generation::scoring::{score, score_breakdown};
use crate::models::generation::{
    CopyGenerationRow, GenerateCopyRequest, GenerationRecord, Platform, Variant,
};
use crate::rate_limit::QuotaDecision;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Response body for a single generation (create and detail endpoints).
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub id: Uuid,
    pub session_id: String,
    pub product_name: String,
    pub platform: String,
    pub tone: String,
    pub variations: Vec<Variant>,
    pub model_used: String,
    pub latency_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl GenerationResponse {
    fn from_record(record: &GenerationRecord) -> Self {
        Self {
            id: record.id,
            session_id: record.session_id.clone(),
            product_name: record.product_name.clone(),
            platform: record.platform.as_str().to_string(),
            tone: record.tone.as_str().to_string(),
            variations: record.variations.clone(),
            model_used: record.model_used.clone(),
            latency_ms: record.latency_ms,
            created_at: record.created_at,
        }
    }

    fn from_row(row: CopyGenerationRow) -> Result<Self, AppError> {
        let variations = parse_variations(&row)?;
        Ok(Self {
            id: row.id,
            session_id: row.session_id,
            product_name: row.product_name,
            platform: row.platform,
            tone: row.tone,
            variations,
            model_used: row.model_used,
            latency_ms: row.latency_ms.max(0) as u64,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub session_id: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Lightweight summary for listing past generations.
#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub product_name: String,
    pub platform: String,
    pub tone: String,
    pub variation_count: usize,
    pub avg_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<HistoryItem>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub copy: String,
    pub platform: Platform,
}

#[derive(Debug, Serialize)]
pub struct SignalDetail {
    pub signal: &'static str,
    pub raw_value: f64,
    pub weight: f64,
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub persuasion_score: f64,
    pub platform: String,
    pub signals: Vec<SignalDetail>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/generate
///
/// Accepts product details and returns 3 scored copy variations.
/// Rate-limited per session on the free tier.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateCopyRequest>,
) -> Result<(StatusCode, Json<GenerationResponse>), AppError> {
    let brief = request.into_brief().map_err(AppError::Validation)?;

    match state.quota.check_and_increment(&brief.session_id).await? {
        QuotaDecision::Allowed { .. } => {}
        QuotaDecision::Exceeded {
            retry_after_seconds,
        } => {
            return Err(AppError::RateLimited {
                retry_after_seconds,
            })
        }
    }

    let record = generate(
        state.llm.as_ref(),
        &brief,
        &state.model_config,
        &state.retry_policy,
    )
    .await?;

    let variations_json = serde_json::to_value(&record.variations)
        .map_err(|e| AppError::Internal(anyhow!("Failed to serialize variations: {e}")))?;

    sqlx::query(
        r#"
        INSERT INTO copy_generations
            (id, session_id, product_name, product_description, target_audience,
             tone, platform, variations, model_used, prompt_tokens,
             completion_tokens, latency_ms, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(record.id)
    .bind(&record.session_id)
    .bind(&record.product_name)
    .bind(&brief.product_description)
    .bind(&brief.target_audience)
    .bind(record.tone.as_str())
    .bind(record.platform.as_str())
    .bind(&variations_json)
    .bind(&record.model_used)
    .bind(record.prompt_tokens as i32)
    .bind(record.completion_tokens as i32)
    .bind(record.latency_ms as i32)
    .bind(record.created_at)
    .execute(&state.db)
    .await?;

    info!(
        "generation saved: id={} session={} latency={}ms",
        record.id, record.session_id, record.latency_ms
    );

    Ok((
        StatusCode::CREATED,
        Json(GenerationResponse::from_record(&record)),
    ))
}

/// GET /api/v1/history?session_id=<id>&page=<n>&page_size=<n>
///
/// Returns paginated generation history for a given session.
/// Without a session_id the listing is empty, never global.
pub async fn handle_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let Some(session_id) = query.session_id.filter(|s| !s.trim().is_empty()) else {
        return Ok(Json(HistoryResponse {
            count: 0,
            page,
            page_size,
            results: vec![],
        }));
    };

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM copy_generations WHERE session_id = $1")
            .bind(&session_id)
            .fetch_one(&state.db)
            .await?;

    let offset = (page - 1) as i64 * page_size as i64;
    let rows = sqlx::query_as::<_, CopyGenerationRow>(
        r#"
        SELECT * FROM copy_generations
        WHERE session_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&session_id)
    .bind(page_size as i64)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let results = rows
        .into_iter()
        .map(|row| {
            let variations = parse_variations(&row)?;
            Ok(HistoryItem {
                id: row.id,
                product_name: row.product_name,
                platform: row.platform,
                tone: row.tone,
                variation_count: variations.len(),
                avg_score: average_score(&variations),
                created_at: row.created_at,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(HistoryResponse {
        count,
        page,
        page_size,
        results,
    }))
}

/// GET /api/v1/history/:id
///
/// Returns full detail for a single generation.
pub async fn handle_history_detail(
    State(state): State<AppState>,
    Path(generation_id): Path<Uuid>,
) -> Result<Json<GenerationResponse>, AppError> {
    let row =
        sqlx::query_as::<_, CopyGenerationRow>("SELECT * FROM copy_generations WHERE id = $1")
            .bind(generation_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Generation {generation_id} not found")))?;

    Ok(Json(GenerationResponse::from_row(row)?))
}

/// POST /api/v1/score
///
/// Re-scores arbitrary copy for a platform without invoking the LLM.
/// Useful for auditing stored generations; scoring is deterministic.
pub async fn handle_score(
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let persuasion_score = score(&request.copy, request.platform);
    let signals = score_breakdown(&request.copy, request.platform)
        .into_iter()
        .map(|(signal, result)| SignalDetail {
            signal,
            raw_value: result.raw_value,
            weight: result.weight,
            detail: result.detail,
        })
        .collect();

    Ok(Json(ScoreResponse {
        persuasion_score,
        platform: request.platform.as_str().to_string(),
        signals,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn parse_variations(row: &CopyGenerationRow) -> Result<Vec<Variant>, AppError> {
    serde_json::from_value(row.variations.clone())
        .map_err(|e| AppError::Internal(anyhow!("Corrupt variations for row {}: {e}", row.id)))
}

fn average_score(variations: &[Variant]) -> Option<f64> {
    if variations.is_empty() {
        return None;
    }
    let sum: f64 = variations.iter().map(|v| v.persuasion_score).sum();
    Some((sum / variations.len() as f64 * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_score_rounds_to_one_decimal() {
        let variations = vec![
            Variant {
                copy: "a".to_string(),
                persuasion_score: 70.0,
            },
            Variant {
                copy: "b".to_string(),
                persuasion_score: 70.5,
            },
        ];
        assert_eq!(average_score(&variations), Some(70.3));
    }

    #[test]
    fn test_average_score_empty_is_none() {
        assert_eq!(average_score(&[]), None);
    }
}
