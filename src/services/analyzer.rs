//! External document analyzer contract and its chat-completions provider.
//!
//! The pipeline talks to the analyzer through [`DocumentAnalyzer`], so the
//! retry and parsing logic in the generator can be exercised against a
//! scripted mock. [`ChatProvider`] is the production implementation for any
//! OpenAI-compatible chat-completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::AnalyzerSettings;
use crate::error::{AppError, AppResult};

/// Analyzer call failure, split by whether a retry can help.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// Overload, rate limiting, timeouts - worth retrying
    #[error("transient analyzer error: {0}")]
    Transient(String),

    /// Bad request, auth failure, model rejection - retrying cannot help
    #[error("terminal analyzer error: {0}")]
    Terminal(String),
}

impl AnalyzerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// External analysis capability consumed by the generator.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Identifier of the model behind this analyzer.
    fn model_name(&self) -> &str;

    /// Submit a system + user prompt pair, returning the raw completion text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, AnalyzerError>;

    /// Whether the analyzer is reachable and configured.
    async fn is_available(&self) -> bool;
}

// ============================================================================
// OpenAI-compatible wire format
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

// ============================================================================
// Provider
// ============================================================================

/// Chat-completions analyzer provider.
#[derive(Clone)]
pub struct ChatProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatProvider {
    pub fn new(settings: &AnalyzerSettings) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Generation(format!("Failed to build analyzer client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl DocumentAnalyzer for ChatProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, AnalyzerError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: Some(0.3),
            max_tokens: Some(1500),
        };

        debug!(
            model = %self.model,
            prompt_chars = user.len(),
            "Calling analyzer endpoint"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // Connection failures and timeouts are transient by definition
                AnalyzerError::Transient(format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Analyzer request failed");

            // 408/429/5xx signal overload or a hiccup on the provider side
            return if status.as_u16() == 408
                || status.as_u16() == 429
                || status.is_server_error()
            {
                Err(AnalyzerError::Transient(format!("HTTP {}: {}", status, body)))
            } else {
                Err(AnalyzerError::Terminal(format!("HTTP {}: {}", status, body)))
            };
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::Terminal(format!("malformed response: {}", e)))?;

        chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| AnalyzerError::Terminal("empty response from analyzer".to_string()))
    }

    async fn is_available(&self) -> bool {
        // The models listing is the cheapest liveness signal an
        // OpenAI-compatible endpoint offers.
        self.client
            .get(format!("{}/models", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(AnalyzerError::Transient("overloaded".to_string()).is_transient());
        assert!(!AnalyzerError::Terminal("bad request".to_string()).is_transient());
    }

    #[test]
    fn test_chat_request_serialization_skips_none() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hello".to_string(),
            }],
            temperature: None,
            max_tokens: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
    }
}
