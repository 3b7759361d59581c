//! Domain types for the copy generation pipeline.
//!
//! `Brief` is validated at the HTTP boundary; everything downstream of
//! `GenerateCopyRequest::into_brief` trusts its field constraints as preconditions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Desired voice of the generated copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Professional,
    Casual,
    Urgent,
    Witty,
    Inspirational,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Urgent => "urgent",
            Tone::Witty => "witty",
            Tone::Inspirational => "inspirational",
        }
    }
}

/// Target distribution platform. Affects prompt guidance and the
/// platform-fit scoring signal; never the signal weight table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Instagram,
    Linkedin,
    GoogleAd,
    EmailSubject,
    Facebook,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Instagram,
        Platform::Linkedin,
        Platform::GoogleAd,
        Platform::EmailSubject,
        Platform::Facebook,
        Platform::Twitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Linkedin => "linkedin",
            Platform::GoogleAd => "google_ad",
            Platform::EmailSubject => "email_subject",
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
        }
    }
}

/// Incoming body for POST /api/v1/generate. Tone and platform are
/// enforced by serde; the free-text fields are checked in `into_brief`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateCopyRequest {
    pub product_name: String,
    pub product_description: String,
    pub target_audience: String,
    pub tone: Tone,
    pub platform: Platform,
    pub session_id: String,
}

impl GenerateCopyRequest {
    /// Validates field constraints and produces a trimmed `Brief`.
    /// Returns a human-readable message naming the offending field.
    pub fn into_brief(self) -> Result<Brief, String> {
        let product_name = self.product_name.trim().to_string();
        let product_description = self.product_description.trim().to_string();
        let target_audience = self.target_audience.trim().to_string();
        let session_id = self.session_id.trim().to_string();

        if !(2..=200).contains(&product_name.chars().count()) {
            return Err("product_name: must be 2-200 characters".to_string());
        }
        if !(10..=2000).contains(&product_description.chars().count()) {
            return Err("product_description: must be 10-2000 characters".to_string());
        }
        if product_description.split_whitespace().count() < 3 {
            return Err(
                "product_description: must contain at least 3 words for meaningful copy generation"
                    .to_string(),
            );
        }
        if !(5..=300).contains(&target_audience.chars().count()) {
            return Err("target_audience: must be 5-300 characters".to_string());
        }
        if !(8..=64).contains(&session_id.chars().count()) {
            return Err("session_id: must be 8-64 characters".to_string());
        }

        Ok(Brief {
            product_name,
            product_description,
            target_audience,
            tone: self.tone,
            platform: self.platform,
            session_id,
        })
    }
}

/// Validated generation input. Constructed only via
/// `GenerateCopyRequest::into_brief`; the pipeline assumes well-formed fields.
#[derive(Debug, Clone)]
pub struct Brief {
    pub product_name: String,
    pub product_description: String,
    pub target_audience: String,
    pub tone: Tone,
    pub platform: Platform,
    pub session_id: String,
}

/// One generated copy string with its persuasion score (0.0-100.0,
/// one decimal). Exactly three per generation, in model output order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub copy: String,
    pub persuasion_score: f64,
}

/// Immutable outcome of one successful generation. Assembled once by the
/// orchestrator; persistence and retrieval happen at the handler layer.
#[derive(Debug, Clone)]
pub struct GenerationRecord {
    pub id: Uuid,
    pub session_id: String,
    pub product_name: String,
    pub platform: Platform,
    pub tone: Tone,
    pub variations: Vec<Variant>,
    pub model_used: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub latency_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Row shape for the copy_generations table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CopyGenerationRow {
    pub id: Uuid,
    pub session_id: String,
    pub product_name: String,
    pub product_description: String,
    pub target_audience: String,
    pub tone: String,
    pub platform: String,
    pub variations: Value,
    pub model_used: String,
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
    pub latency_ms: i32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> GenerateCopyRequest {
        GenerateCopyRequest {
            product_name: "FocusFlow".to_string(),
            product_description: "A distraction-blocking app for deep work sessions".to_string(),
            target_audience: "Remote workers and freelancers".to_string(),
            tone: Tone::Casual,
            platform: Platform::Instagram,
            session_id: "session-abc-123".to_string(),
        }
    }

    #[test]
    fn test_valid_request_becomes_brief() {
        let brief = valid_request().into_brief().unwrap();
        assert_eq!(brief.product_name, "FocusFlow");
        assert_eq!(brief.platform, Platform::Instagram);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let mut request = valid_request();
        request.product_name = "  FocusFlow  ".to_string();
        let brief = request.into_brief().unwrap();
        assert_eq!(brief.product_name, "FocusFlow");
    }

    #[test]
    fn test_single_char_product_name_rejected() {
        let mut request = valid_request();
        request.product_name = "X".to_string();
        let err = request.into_brief().unwrap_err();
        assert!(err.contains("product_name"));
    }

    #[test]
    fn test_two_word_description_rejected() {
        let mut request = valid_request();
        request.product_description = "Great product".to_string();
        let err = request.into_brief().unwrap_err();
        assert!(err.contains("product_description"));
    }

    #[test]
    fn test_short_session_id_rejected() {
        let mut request = valid_request();
        request.session_id = "short".to_string();
        let err = request.into_brief().unwrap_err();
        assert!(err.contains("session_id"));
    }

    #[test]
    fn test_platform_serde_uses_snake_case() {
        let platform: Platform = serde_json::from_str("\"email_subject\"").unwrap();
        assert_eq!(platform, Platform::EmailSubject);
        assert_eq!(
            serde_json::to_string(&Platform::GoogleAd).unwrap(),
            "\"google_ad\""
        );
    }

    #[test]
    fn test_platform_round_trips_through_serde() {
        for platform in Platform::ALL {
            let json = serde_json::to_string(&platform).unwrap();
            assert_eq!(json, format!("\"{}\"", platform.as_str()));
            let back: Platform = serde_json::from_str(&json).unwrap();
            assert_eq!(back, platform);
        }
    }

    #[test]
    fn test_unknown_tone_rejected_by_serde() {
        let result: Result<Tone, _> = serde_json::from_str("\"sarcastic\"");
        assert!(result.is_err());
    }
}
