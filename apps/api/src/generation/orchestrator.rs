//! Generation orchestrator — the full pipeline behind `generate`.
//!
//! Flow: build prompt → transport call with bounded retry → parse →
//! score each variant → assemble the immutable GenerationRecord.
//!
//! Transient transport failures retry with exponential backoff; permanent
//! failures fail fast. A response that parses to fewer than three
//! variants earns one fresh transport call (models occasionally ignore
//! format instructions) before surfacing `UnparseableResponse`. The whole
//! attempt loop runs under one wall-clock deadline. On any failure the
//! caller gets a typed error, never a partial record.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};
use uuid::Uuid;

use crate::generation::parser::{parse, REQUIRED_VARIANTS};
use crate::generation::prompts::{build_prompt, RenderedPrompt};
use crate::generation::scoring::score;
use crate::llm_client::{LlmTransport, ModelConfig, RawModelOutput, TransportError};
use crate::models::generation::{Brief, GenerationRecord, Variant};

/// Retry/backoff configuration, passed in explicitly so tests can inject
/// zero-wait policies.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first transport attempt (2 → 3 attempts total).
    pub max_transport_retries: u32,
    pub base_delay: Duration,
    pub backoff_factor: u32,
    /// Fresh transport calls granted when a response fails to parse.
    pub parse_reasks: u32,
    /// End-to-end wall-clock bound including retries and backoff.
    pub overall_deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_transport_retries: 2,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2,
            parse_reasks: 1,
            overall_deadline: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Same attempt counts, no waiting. For tests.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Terminal failures surfaced to the caller. Intermediate transient and
/// parse failures are retried internally and never cross this boundary.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM transport failed after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    #[error("model output could not be parsed into {REQUIRED_VARIANTS} variants")]
    UnparseableResponse,

    #[error("LLM transport failed permanently: {0}")]
    TransportPermanentFailure(String),
}

/// Runs one generation end to end. The sole entry point of the core.
pub async fn generate(
    transport: &dyn LlmTransport,
    brief: &Brief,
    model_config: &ModelConfig,
    policy: &RetryPolicy,
) -> Result<GenerationRecord, GenerationError> {
    let prompt = build_prompt(brief);

    info!(
        "generating copy: product={} platform={} tone={}",
        brief.product_name,
        brief.platform.as_str(),
        brief.tone.as_str()
    );

    let pipeline = call_and_parse(transport, &prompt, model_config, policy);
    let (output, copies) = match timeout(policy.overall_deadline, pipeline).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(
                "generation deadline of {:?} elapsed for session {}",
                policy.overall_deadline, brief.session_id
            );
            return Err(GenerationError::ExhaustedRetries {
                attempts: policy.max_transport_retries + 1,
            });
        }
    };

    // Scoring is pure and sub-millisecond; inline over the three variants.
    let variations: Vec<Variant> = copies
        .iter()
        .map(|copy| Variant {
            copy: copy.clone(),
            persuasion_score: score(copy, brief.platform),
        })
        .collect();

    Ok(GenerationRecord {
        id: Uuid::new_v4(),
        session_id: brief.session_id.clone(),
        product_name: brief.product_name.clone(),
        platform: brief.platform,
        tone: brief.tone,
        variations,
        model_used: output.model_name,
        prompt_tokens: output.prompt_tokens,
        completion_tokens: output.completion_tokens,
        latency_ms: output.latency_ms,
        created_at: Utc::now(),
    })
}

/// Calls the transport (with retry) and parses the result, re-asking the
/// provider once per remaining parse budget when the output is unusable.
async fn call_and_parse(
    transport: &dyn LlmTransport,
    prompt: &RenderedPrompt,
    model_config: &ModelConfig,
    policy: &RetryPolicy,
) -> Result<(RawModelOutput, [String; REQUIRED_VARIANTS]), GenerationError> {
    let mut reasks_left = policy.parse_reasks;
    loop {
        let output = call_with_retry(transport, prompt, model_config, policy).await?;
        match parse(&output.text) {
            Ok(copies) => return Ok((output, copies)),
            Err(error) if reasks_left > 0 => {
                warn!("model output unusable ({error}), asking the provider again");
                reasks_left -= 1;
            }
            Err(error) => {
                warn!("model output unusable after re-ask: {error}");
                return Err(GenerationError::UnparseableResponse);
            }
        }
    }
}

/// One transport round: up to `max_transport_retries` retries on transient
/// failures with exponential backoff; permanent failures fail immediately.
async fn call_with_retry(
    transport: &dyn LlmTransport,
    prompt: &RenderedPrompt,
    model_config: &ModelConfig,
    policy: &RetryPolicy,
) -> Result<RawModelOutput, GenerationError> {
    for attempt in 0..=policy.max_transport_retries {
        if attempt > 0 {
            let delay = policy.base_delay * policy.backoff_factor.pow(attempt - 1);
            warn!(
                "transport attempt {attempt} failed, retrying after {}ms",
                delay.as_millis()
            );
            sleep(delay).await;
        }

        match transport
            .send(
                &prompt.system_instruction,
                &prompt.user_instruction,
                model_config,
            )
            .await
        {
            Ok(output) => return Ok(output),
            Err(TransportError::Transient(message)) => {
                warn!("transient transport failure: {message}");
            }
            Err(TransportError::Permanent(message)) => {
                return Err(GenerationError::TransportPermanentFailure(message));
            }
        }
    }

    Err(GenerationError::ExhaustedRetries {
        attempts: policy.max_transport_retries + 1,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::models::generation::{Platform, Tone};

    const NUMBERED_RESPONSE: &str = "1. Deep work needs a bouncer. FocusFlow blocks the noise \
so your brain doesn't have to. Try free today.\n\
2. Your attention is the product everyone else is selling. Take it back. Get started with \
FocusFlow.\n\
3. Join 12,000+ users who finish their day by 3pm. FocusFlow makes distraction a choice, not \
a default. Link in bio.";

    enum StubBehavior {
        FixedText(&'static str),
        AlwaysTransient,
        AlwaysPermanent,
        GarbageThenGood,
        SlowResponse(Duration),
    }

    struct StubTransport {
        behavior: StubBehavior,
        calls: AtomicU32,
    }

    impl StubTransport {
        fn new(behavior: StubBehavior) -> Self {
            Self {
                behavior,
                calls: AtomicU32::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn output(text: &str) -> RawModelOutput {
            RawModelOutput {
                text: text.to_string(),
                model_name: "stub-model".to_string(),
                latency_ms: 42,
                prompt_tokens: 100,
                completion_tokens: 60,
            }
        }
    }

    #[async_trait]
    impl LlmTransport for StubTransport {
        async fn send(
            &self,
            _system: &str,
            _user: &str,
            _config: &ModelConfig,
        ) -> Result<RawModelOutput, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                StubBehavior::FixedText(text) => Ok(Self::output(text)),
                StubBehavior::AlwaysTransient => {
                    Err(TransportError::Transient("503 from provider".to_string()))
                }
                StubBehavior::AlwaysPermanent => {
                    Err(TransportError::Permanent("invalid api key".to_string()))
                }
                StubBehavior::GarbageThenGood => {
                    if call == 0 {
                        Ok(Self::output("Sure! Here is some copy for you."))
                    } else {
                        Ok(Self::output(NUMBERED_RESPONSE))
                    }
                }
                StubBehavior::SlowResponse(delay) => {
                    sleep(*delay).await;
                    Ok(Self::output(NUMBERED_RESPONSE))
                }
            }
        }
    }

    fn brief() -> Brief {
        Brief {
            product_name: "FocusFlow".to_string(),
            product_description: "A distraction-blocking app for deep work sessions".to_string(),
            target_audience: "Remote workers and freelancers".to_string(),
            tone: Tone::Casual,
            platform: Platform::Instagram,
            session_id: "session-abc-123".to_string(),
        }
    }

    fn config() -> ModelConfig {
        ModelConfig::new("stub-model")
    }

    #[tokio::test]
    async fn test_successful_generation_assembles_full_record() {
        let transport = StubTransport::new(StubBehavior::FixedText(NUMBERED_RESPONSE));
        let before = Utc::now();

        let record = generate(&transport, &brief(), &config(), &RetryPolicy::immediate())
            .await
            .unwrap();

        let after = Utc::now();
        assert_eq!(record.variations.len(), 3);
        for variant in &record.variations {
            assert!(!variant.copy.is_empty());
            assert!((0.0..=100.0).contains(&variant.persuasion_score));
        }
        assert_eq!(record.model_used, "stub-model");
        assert_eq!(record.latency_ms, 42);
        assert_eq!(record.session_id, "session-abc-123");
        assert!(record.created_at >= before && record.created_at <= after);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_variant_order_follows_model_output() {
        let transport = StubTransport::new(StubBehavior::FixedText(NUMBERED_RESPONSE));
        let record = generate(&transport, &brief(), &config(), &RetryPolicy::immediate())
            .await
            .unwrap();
        assert!(record.variations[0].copy.starts_with("Deep work needs a bouncer"));
        assert!(record.variations[2].copy.starts_with("Join 12,000+ users"));
    }

    #[tokio::test]
    async fn test_transient_failures_exhaust_after_three_attempts() {
        let transport = StubTransport::new(StubBehavior::AlwaysTransient);
        let error = generate(&transport, &brief(), &config(), &RetryPolicy::immediate())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            GenerationError::ExhaustedRetries { attempts: 3 }
        ));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_does_not_retry() {
        let transport = StubTransport::new(StubBehavior::AlwaysPermanent);
        let error = generate(&transport, &brief(), &config(), &RetryPolicy::immediate())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            GenerationError::TransportPermanentFailure(_)
        ));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_output_is_reasked_once() {
        let transport = StubTransport::new(StubBehavior::FixedText("no structure here at all"));
        let error = generate(&transport, &brief(), &config(), &RetryPolicy::immediate())
            .await
            .unwrap_err();
        assert!(matches!(error, GenerationError::UnparseableResponse));
        // Initial call plus exactly one re-ask.
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_reask_recovers_from_one_bad_response() {
        let transport = StubTransport::new(StubBehavior::GarbageThenGood);
        let record = generate(&transport, &brief(), &config(), &RetryPolicy::immediate())
            .await
            .unwrap();
        assert_eq!(record.variations.len(), 3);
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overall_deadline_bounds_the_pipeline() {
        let transport =
            StubTransport::new(StubBehavior::SlowResponse(Duration::from_secs(60)));
        let policy = RetryPolicy {
            overall_deadline: Duration::from_secs(1),
            ..RetryPolicy::immediate()
        };
        let error = generate(&transport, &brief(), &config(), &policy)
            .await
            .unwrap_err();
        assert!(matches!(error, GenerationError::ExhaustedRetries { .. }));
    }

    #[tokio::test]
    async fn test_backoff_schedule_doubles() {
        let policy = RetryPolicy::default();
        let first = policy.base_delay * policy.backoff_factor.pow(0);
        let second = policy.base_delay * policy.backoff_factor.pow(1);
        assert_eq!(first, Duration::from_millis(500));
        assert_eq!(second, Duration::from_millis(1000));
    }
}
