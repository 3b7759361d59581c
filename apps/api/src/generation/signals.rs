//! Persuasion signal extractors.
//!
//! Seven independent pure functions, each inspecting a copy string and
//! returning a normalized 0.0-1.0 raw value plus a diagnostic detail.
//! Lexicons live here as data tables so they can be tuned and tested
//! independently of the scoring combination in `scoring.rs`.
//!
//! Empty or whitespace-only copy yields 0.0 from every extractor — the
//! caller decides whether a zero-scored variant is acceptable.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::generation::Platform;

// ────────────────────────────────────────────────────────────────────────────
// Weights (must sum to exactly 1.0 — enforced by test in scoring.rs)
// ────────────────────────────────────────────────────────────────────────────

pub const CTA_WEIGHT: f64 = 0.25;
pub const POWER_WORDS_WEIGHT: f64 = 0.15;
pub const EMOTIONAL_WEIGHT: f64 = 0.15;
pub const URGENCY_WEIGHT: f64 = 0.10;
pub const PLATFORM_FIT_WEIGHT: f64 = 0.15;
pub const READABILITY_WEIGHT: f64 = 0.10;
pub const SOCIAL_PROOF_WEIGHT: f64 = 0.10;

/// Output of a single extractor. Never persisted; recomputed on demand.
#[derive(Debug, Clone)]
pub struct SignalResult {
    /// Normalized 0.0-1.0, clamped before weighting.
    pub raw_value: f64,
    /// Fixed constant for this signal.
    pub weight: f64,
    /// Optional diagnostic, e.g. which cue words matched.
    pub detail: Option<String>,
}

impl SignalResult {
    fn new(raw_value: f64, weight: f64, detail: Option<String>) -> Self {
        Self {
            raw_value: raw_value.clamp(0.0, 1.0),
            weight,
            detail,
        }
    }

    fn zero(weight: f64) -> Self {
        Self {
            raw_value: 0.0,
            weight,
            detail: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lexicons
// ────────────────────────────────────────────────────────────────────────────

const STRONG_CTAS: &[&str] = &[
    "buy now",
    "shop now",
    "get started",
    "sign up",
    "subscribe",
    "download",
    "try free",
    "claim your",
    "start your",
    "join now",
    "book now",
    "learn more",
    "get yours",
    "order now",
    "grab yours",
    "reserve your",
    "unlock",
    "discover",
    "apply now",
    "start free",
    "link in bio",
];

const POWER_WORDS: &[&str] = &[
    "free",
    "new",
    "proven",
    "guaranteed",
    "exclusive",
    "limited",
    "instant",
    "revolutionary",
    "breakthrough",
    "secret",
    "powerful",
    "ultimate",
    "premium",
    "transform",
    "unleash",
    "effortless",
    "remarkable",
    "stunning",
    "unbelievable",
    "incredible",
    "essential",
    "massive",
    "epic",
    "game-changing",
    "dominant",
];

const EMOTIONAL_WORDS: &[&str] = &[
    "love",
    "hate",
    "fear",
    "joy",
    "trust",
    "surprise",
    "amazing",
    "thrilled",
    "devastating",
    "exciting",
    "inspiring",
    "passionate",
    "obsessed",
    "dreaming",
    "craving",
    "confident",
    "proud",
    "bold",
    "grateful",
    "delighted",
    "anxious",
    "worried",
];

const URGENCY_WORDS: &[&str] = &[
    "now", "today", "hurry", "limited", "only", "deadline", "final", "expires", "countdown",
];

const URGENCY_PHRASES: &[&str] = &[
    "last chance",
    "don't miss",
    "ending soon",
    "before it's gone",
    "act fast",
    "running out",
];

static WEAK_CTA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(click|tap|visit|check out|see|explore|find|go to)\b")
        .expect("weak CTA pattern is valid")
});

static SOCIAL_PROOF_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\d+[,.]?\d*\+?\s*(customers|users|people|businesses|brands)",
        r"trusted by",
        r"as seen",
        r"rated",
        r"\d+\s*stars?",
        r"#1",
        r"best[\s-]selling",
        r"\bjoin\s+\d",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("social proof pattern is valid"))
    .collect()
});

// ────────────────────────────────────────────────────────────────────────────
// Extractors
// ────────────────────────────────────────────────────────────────────────────

/// CTA presence and strength. Match count sets the base tier; a CTA in
/// the final third of the copy earns a position bonus.
pub fn cta_strength(text: &str) -> SignalResult {
    if text.trim().is_empty() {
        return SignalResult::zero(CTA_WEIGHT);
    }
    let lower = text.to_lowercase();

    let matched: Vec<&str> = STRONG_CTAS
        .iter()
        .copied()
        .filter(|cta| lower.contains(cta))
        .collect();

    let base = match matched.len() {
        0 => {
            if WEAK_CTA.is_match(&lower) {
                return SignalResult::new(
                    0.4,
                    CTA_WEIGHT,
                    Some("weak imperative cue only".to_string()),
                );
            }
            return SignalResult::zero(CTA_WEIGHT);
        }
        1 => 0.7,
        _ => 0.9,
    };

    // Position bonus: CTAs near the end convert better.
    let tail_start = lower.len().saturating_sub(lower.len() / 3);
    let in_tail = matched
        .iter()
        .filter_map(|cta| lower.rfind(cta))
        .any(|idx| idx >= tail_start);
    let bonus = if in_tail { 0.1 } else { 0.0 };

    SignalResult::new(
        base + bonus,
        CTA_WEIGHT,
        Some(format!("matched: {}", matched.join(", "))),
    )
}

/// High-impact word density with a keyword-stuffing penalty.
pub fn power_words(text: &str) -> SignalResult {
    density_signal(text, POWER_WORDS, &[], POWER_WORDS_WEIGHT)
}

/// Emotional-trigger word density (fear, desire, belonging terms).
pub fn emotional_resonance(text: &str) -> SignalResult {
    density_signal(text, EMOTIONAL_WORDS, &[], EMOTIONAL_WEIGHT)
}

/// Time and scarcity markers, single-word and multi-word.
pub fn urgency_cues(text: &str) -> SignalResult {
    density_signal(text, URGENCY_WORDS, URGENCY_PHRASES, URGENCY_WEIGHT)
}

/// Closeness of copy length to the platform's ideal band. Instagram
/// additionally rewards hashtag presence.
pub fn platform_fit(text: &str, platform: Platform) -> SignalResult {
    if text.trim().is_empty() {
        return SignalResult::zero(PLATFORM_FIT_WEIGHT);
    }
    let char_count = text.chars().count();
    let (low, high) = length_band(platform);

    let mut raw = if (low..=high).contains(&char_count) {
        // Leave headroom for the hashtag bonus on Instagram.
        if platform == Platform::Instagram {
            0.9
        } else {
            1.0
        }
    } else if char_count < low {
        (char_count as f64 / low as f64) * 0.8
    } else {
        let overshoot = (char_count - high) as f64 / high as f64;
        (1.0 - overshoot * 1.5).max(0.1)
    };

    let mut detail = format!("{char_count} chars vs ideal {low}-{high}");
    if platform == Platform::Instagram && text.contains('#') {
        raw += 0.1;
        detail.push_str(", hashtag bonus");
    }

    SignalResult::new(raw, PLATFORM_FIT_WEIGHT, Some(detail))
}

/// Sentence-length variety. A coefficient of variation between 0.3 and
/// 0.8 indicates engaging rhythm; extremes are penalized.
pub fn readability(text: &str) -> SignalResult {
    if text.trim().is_empty() {
        return SignalResult::zero(READABILITY_WEIGHT);
    }

    let sentences: Vec<&str> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.len() < 2 {
        return SignalResult::new(
            0.5,
            READABILITY_WEIGHT,
            Some("single sentence".to_string()),
        );
    }

    let lengths: Vec<f64> = sentences
        .iter()
        .map(|s| s.split_whitespace().count() as f64)
        .collect();
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    if mean == 0.0 {
        return SignalResult::new(0.3, READABILITY_WEIGHT, None);
    }
    let variance =
        lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
    let cv = variance.sqrt() / mean;

    let raw = if (0.3..=0.8).contains(&cv) {
        1.0
    } else if cv < 0.3 {
        0.5 + cv * 1.66
    } else {
        (1.0 - (cv - 0.8)).max(0.3)
    };

    SignalResult::new(
        raw,
        READABILITY_WEIGHT,
        Some(format!("cv={cv:.2} over {} sentences", sentences.len())),
    )
}

/// Trust-signal patterns: counts plus testimonial words, ratings,
/// superlative claims.
pub fn social_proof(text: &str) -> SignalResult {
    if text.trim().is_empty() {
        return SignalResult::zero(SOCIAL_PROOF_WEIGHT);
    }
    let lower = text.to_lowercase();
    let hits: Vec<&Regex> = SOCIAL_PROOF_PATTERNS
        .iter()
        .filter(|p| p.is_match(&lower))
        .collect();

    if hits.is_empty() {
        return SignalResult::zero(SOCIAL_PROOF_WEIGHT);
    }

    let patterns: Vec<&str> = hits.iter().map(|p| p.as_str()).collect();
    SignalResult::new(
        hits.len() as f64 * 0.4,
        SOCIAL_PROOF_WEIGHT,
        Some(format!("patterns: {}", patterns.join(" | "))),
    )
}

/// Runs all seven extractors against one copy string.
pub fn extract_all(text: &str, platform: Platform) -> Vec<(&'static str, SignalResult)> {
    vec![
        ("cta", cta_strength(text)),
        ("power_words", power_words(text)),
        ("emotional", emotional_resonance(text)),
        ("urgency", urgency_cues(text)),
        ("platform_fit", platform_fit(text, platform)),
        ("readability", readability(text)),
        ("social_proof", social_proof(text)),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn length_band(platform: Platform) -> (usize, usize) {
    match platform {
        Platform::Instagram => (100, 800),
        Platform::Linkedin => (150, 1000),
        Platform::GoogleAd => (30, 210),
        Platform::EmailSubject => (20, 60),
        Platform::Facebook => (40, 200),
        Platform::Twitter => (50, 280),
    }
}

/// Density of lexicon hits per word, mapped through a sweet-spot curve:
/// linear ramp below 1%, full credit at 1-6%, diminishing returns above
/// (keyword stuffing).
fn density_signal(
    text: &str,
    words: &[&str],
    phrases: &[&str],
    weight: f64,
) -> SignalResult {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| ".,!?;:\"'()".contains(c)))
        .filter(|w| !w.is_empty())
        .collect();
    if tokens.is_empty() {
        return SignalResult::zero(weight);
    }

    let matched: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| words.contains(t))
        .chain(phrases.iter().copied().filter(|p| lower.contains(p)))
        .collect();
    if matched.is_empty() {
        return SignalResult::zero(weight);
    }

    let density = matched.len() as f64 / tokens.len() as f64;
    let raw = if density < 0.01 {
        density * 30.0
    } else if density <= 0.06 {
        0.5 + (density - 0.01) * 10.0
    } else {
        (1.0 - (density - 0.06) * 8.0).max(0.4)
    };

    SignalResult::new(raw, weight, Some(format!("matched: {}", matched.join(", "))))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
