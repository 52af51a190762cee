//! Provider abstractions for the structured extraction LLM
//!
//! The pipeline only depends on the `LlmProvider` trait, so any
//! OpenAI-compatible endpoint (or a test double) can be plugged in.

pub mod llm;
pub mod openai;

pub use llm::LlmProvider;
pub use openai::OpenAiClient;
