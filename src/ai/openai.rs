//! OpenAI-compatible HTTP summarizer
//!
//! Talks to any endpoint exposing the chat-completions API, including local
//! services like Ollama and LM Studio. Token usage comes straight from the
//! wire `usage` object; a response without one is billed as zero.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::error::CollaboratorError;
use super::prompt::{PromptBuilder, SYSTEM_PROMPT};
use super::response::{parse_directory_response, parse_repository_response, parse_unit_response};
use super::summarizer::{
    DirectoryRequest, DirectorySummary, FinalSynthesis, RepositoryRequest, Summarizer, UnitRequest,
    UnitSummary,
};
use crate::model::TokenUsage;

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_COMPLETION_TOKENS: u32 = 4096;

/// Summarizer backed by an OpenAI-compatible chat-completions endpoint
pub struct OpenAiSummarizer {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    http_client: Client,
    timeout: Duration,
}

impl OpenAiSummarizer {
    pub fn new(endpoint: String, model: String, api_key: Option<String>) -> Self {
        Self::with_timeout(
            endpoint,
            model,
            api_key,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(
        endpoint: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            endpoint,
            model,
            api_key,
            http_client,
            timeout,
        }
    }

    /// One chat-completions round trip; returns the content and the billed
    /// token usage
    async fn generate(&self, prompt: String) -> Result<(String, TokenUsage), CollaboratorError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.endpoint.trim_end_matches('/')
        );

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            temperature: Some(0.2),
            max_tokens: Some(MAX_COMPLETION_TOKENS),
            stream: Some(false),
        };

        debug!(
            prompt_chars = request.messages[1].content.len(),
            model = %self.model,
            "Sending summarization request"
        );

        let start = Instant::now();

        let mut builder = self.http_client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                error!("Summarization request timed out after {:?}", self.timeout);
                CollaboratorError::Timeout {
                    seconds: self.timeout.as_secs(),
                }
            } else if e.is_connect() {
                error!("Cannot connect to endpoint at {}", self.endpoint);
                CollaboratorError::Network {
                    message: format!("Connection failed: {}", e),
                }
            } else {
                CollaboratorError::Network {
                    message: format!("Request failed: {}", e),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Endpoint returned error status");

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(CollaboratorError::Authentication {
                    message: format!("HTTP {}: {}", status, body),
                });
            }
            return Err(CollaboratorError::Api {
                message: format!("HTTP {}: {}", status, body),
                status_code: Some(status.as_u16()),
            });
        }

        let api_response: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| CollaboratorError::InvalidResponse {
                    message: format!("JSON parse error: {}", e),
                })?;

        let usage = api_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .map(|message| message.content)
            .ok_or_else(|| CollaboratorError::InvalidResponse {
                message: "No content in model response".to_string(),
            })?;

        info!(
            elapsed_s = format!("{:.2}", start.elapsed().as_secs_f64()),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Summarization call completed"
        );

        Ok((content, usage))
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize_unit(&self, request: UnitRequest) -> Result<UnitSummary, CollaboratorError> {
        let expected: Vec<String> = request.files.iter().map(|f| f.path.clone()).collect();
        let prompt = PromptBuilder::build_unit_prompt(&request);

        let (content, usage) = self.generate(prompt).await?;
        let (files, directory) = parse_unit_response(&content, &request.directory, &expected)?;

        Ok(UnitSummary {
            files,
            directory,
            usage,
        })
    }

    async fn summarize_directory(
        &self,
        request: DirectoryRequest,
    ) -> Result<DirectorySummary, CollaboratorError> {
        let prompt = PromptBuilder::build_directory_prompt(&request);

        let (content, usage) = self.generate(prompt).await?;
        let directory =
            parse_directory_response(&content, &request.directory, request.files.len())?;

        Ok(DirectorySummary { directory, usage })
    }

    async fn synthesize_repository(
        &self,
        request: RepositoryRequest,
    ) -> Result<FinalSynthesis, CollaboratorError> {
        let prompt = PromptBuilder::build_repository_prompt(&request);

        let (content, usage) = self.generate(prompt).await?;
        let analysis = parse_repository_response(&content)?;

        Ok(FinalSynthesis { analysis, usage })
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

impl fmt::Debug for OpenAiSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSummarizer")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarizer_creation() {
        let summarizer = OpenAiSummarizer::new(
            "http://localhost:11434".to_string(),
            "qwen2.5-coder:7b".to_string(),
            None,
        );
        assert_eq!(summarizer.name(), "openai-compatible");
        assert_eq!(summarizer.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "test-model".to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            temperature: Some(0.2),
            max_tokens: Some(512),
            stream: Some(false),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"temperature\":0.2"));
    }

    #[test]
    fn test_response_parsing_with_usage() {
        let response_json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{}"}}],
            "usage": {"prompt_tokens": 100, "completion_tokens": 20, "total_tokens": 120}
        }"#;

        let response: ChatResponse = serde_json::from_str(response_json).unwrap();
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 100);
        assert_eq!(usage.completion_tokens, 20);
    }

    #[test]
    fn test_response_parsing_without_usage() {
        let response_json = r#"{"choices": []}"#;
        let response: ChatResponse = serde_json::from_str(response_json).unwrap();
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_debug_omits_api_key() {
        let summarizer = OpenAiSummarizer::new(
            "http://localhost:11434".to_string(),
            "m".to_string(),
            Some("secret".to_string()),
        );
        let debug_str = format!("{:?}", summarizer);
        assert!(!debug_str.contains("secret"));
    }
}
