// Copy Generation Engine.
// Implements: prompt construction, the LLM call with bounded retry,
// response parsing, persuasion scoring, record assembly.
// All provider calls go through llm_client — no direct HTTP calls here.

pub mod handlers;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod scoring;
pub mod signals;
