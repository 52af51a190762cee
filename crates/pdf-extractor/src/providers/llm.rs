//! LLM provider trait for structured extraction

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// Trait for LLM-based structured extraction
///
/// Implementations:
/// - `OpenAiClient`: any OpenAI-compatible chat completions endpoint
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Extract a JSON object from one piece of document text
    async fn extract_structured(&self, text: &str) -> Result<Map<String, Value>>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
