//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::extraction::prompt::{user_message, SYSTEM_PROMPT};

use super::llm::LlmProvider;

/// Chat completions client in JSON-object mode
pub struct OpenAiClient {
    /// HTTP client with the per-call timeout applied
    client: Client,
    /// Configuration
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(format!(
                "LLM call exceeded {}s",
                self.config.timeout_secs
            ))
        } else {
            Error::Llm(format!("Request failed: {}", err))
        }
    }
}

/// Parse the model's message content into a JSON object
fn parse_content(content: Option<String>) -> Result<Map<String, Value>> {
    let content = content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| Error::llm("No content received from the model"))?;

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::llm(format!(
            "Expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(Error::llm(format!("Model returned invalid JSON: {}", e))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn extract_structured(&self, text: &str) -> Result<Map<String, Value>> {
        let user = user_message(text);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            response_format: ResponseFormat { kind: "json_object" },
            temperature: self.config.temperature,
        };

        tracing::info!(
            "Calling {} ({} chars of text)",
            self.config.model,
            text.chars().count()
        );

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!(
                "Chat completion failed ({}): {}",
                status, body
            )));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.request_error(e)
            } else {
                Error::Llm(format!("Failed to parse chat response: {}", e))
            }
        })?;

        tracing::info!("LLM call completed");

        let content = chat.choices.into_iter().next().and_then(|c| c.message.content);
        parse_content(content)
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await;

        match response {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_content() {
        let map = parse_content(Some(r#"{"Objektdaten": {"Baujahr": "1998"}}"#.into())).unwrap();
        assert_eq!(map["Objektdaten"]["Baujahr"], "1998");
    }

    #[test]
    fn test_empty_content_is_error() {
        for content in [None, Some(String::new()), Some("  ".into())] {
            let err = parse_content(content).unwrap_err();
            assert_eq!(err.to_string(), "LLM error: No content received from the model");
        }
    }

    #[test]
    fn test_non_object_json_is_error() {
        let err = parse_content(Some("[1, 2]".into())).unwrap_err();
        assert!(err.to_string().contains("an array"));

        let err = parse_content(Some("not json".into())).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            response_format: ResponseFormat { kind: "json_object" },
            temperature: 0.0,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = LlmConfig {
            base_url: "http://localhost:8080/v1/".into(),
            ..Default::default()
        };
        let client = OpenAiClient::new(&config).unwrap();
        assert_eq!(client.endpoint("chat/completions"), "http://localhost:8080/v1/chat/completions");
    }
}
