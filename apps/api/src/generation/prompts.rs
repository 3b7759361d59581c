//! Prompt construction for the copy generation pipeline.
//!
//! The system instruction encodes the task contract: exactly three
//! independent angles, mandatory CTA, platform constraints, and a strict
//! output format. The user instruction embeds the validated brief fields
//! as literal text — no reinterpretation, no extra sanitization. Pure
//! and side-effect-free; never performs I/O.

use crate::models::generation::{Brief, Platform, Tone};

/// System instruction sent with every generation call.
pub const GENERATION_SYSTEM: &str = "You are CopyGen, an expert direct-response copywriter with \
15 years of experience across digital advertising, email marketing, and social media. You \
understand consumer psychology, AIDA frameworks, and platform-specific best practices.\n\n\
RULES:\n\
1. Return EXACTLY 3 distinct copy variations.\n\
2. Each variation must take a different creative angle.\n\
3. Every variation MUST contain a clear call-to-action (CTA).\n\
4. Respect platform character/format constraints precisely.\n\
5. Never fabricate statistics or make unverifiable claims about the product.\n\
6. Output ONLY valid JSON - no markdown, no commentary, no code fences.\n\n\
OUTPUT FORMAT (strict JSON array):\n\
[{\"variation\": 1, \"copy\": \"...\"}, {\"variation\": 2, \"copy\": \"...\"}, \
{\"variation\": 3, \"copy\": \"...\"}]\n\n\
If you cannot produce JSON, fall back to three variations separated as a numbered list \
(1., 2., 3.) - never a single block of text.";

/// Two text blocks handed to the transport. Ephemeral: discarded after
/// the LLM call, never persisted.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    pub system_instruction: String,
    pub user_instruction: String,
}

/// Renders system and user instructions from a validated brief.
pub fn build_prompt(brief: &Brief) -> RenderedPrompt {
    let user_instruction = format!(
        "PRODUCT: {}\n\
         DESCRIPTION: {}\n\
         TARGET AUDIENCE: {}\n\
         TONE: {} - {}\n\
         PLATFORM: {}\n\
         PLATFORM GUIDELINES: {}\n\n\
         Generate 3 high-converting copy variations now.",
        brief.product_name,
        brief.product_description,
        brief.target_audience,
        brief.tone.as_str(),
        tone_modifier(brief.tone),
        brief.platform.as_str(),
        platform_guideline(brief.platform),
    );

    RenderedPrompt {
        system_instruction: GENERATION_SYSTEM.to_string(),
        user_instruction,
    }
}

/// Fixed per-platform formatting guidance injected into the user prompt.
pub fn platform_guideline(platform: Platform) -> &'static str {
    match platform {
        Platform::Instagram => {
            "Max 2200 characters. Lead with a hook in the first line. Use line breaks for \
             readability. Include 2-3 relevant hashtag suggestions. Emojis are acceptable if \
             they match the tone."
        }
        Platform::Linkedin => {
            "Professional register. Open with a bold statement or statistic. Keep paragraphs \
             to 1-2 sentences. End with a clear CTA or question to drive engagement. No \
             hashtags in the body; suggest 3 at the end."
        }
        Platform::GoogleAd => {
            "Headline: max 30 characters. Description line 1: max 90 characters. Description \
             line 2: max 90 characters. Be extremely concise. Include the primary keyword \
             naturally. Strong CTA verb required."
        }
        Platform::EmailSubject => {
            "Max 60 characters including spaces. Create curiosity or urgency. Avoid \
             spam-trigger words (free, guarantee, act now). Personalization tokens like \
             {first_name} are allowed."
        }
        Platform::Facebook => {
            "Optimal length: 40-80 characters for highest engagement. Conversational tone. \
             Ask questions to boost comments. Include a clear CTA linking to the next step."
        }
        Platform::Twitter => {
            "Max 280 characters. Punchy and direct. One core idea per tweet. CTA or hook at \
             the start."
        }
    }
}

/// Tone calibration fragment for the user prompt.
pub fn tone_modifier(tone: Tone) -> &'static str {
    match tone {
        Tone::Professional => {
            "Use a polished, authoritative voice. Avoid slang. Lead with value propositions."
        }
        Tone::Casual => {
            "Write like a smart friend recommending something. Contractions are fine. Be warm."
        }
        Tone::Urgent => {
            "Create genuine urgency without being manipulative. Use time-sensitive language \
             and scarcity cues."
        }
        Tone::Witty => "Be clever and memorable. Use wordplay where natural. Never force humor.",
        Tone::Inspirational => {
            "Elevate the reader. Paint a vision of transformation. Use aspirational language."
        }
    }
}
