//! OpenAI-compatible backend implementation
//!
//! HTTP client for the `/v1/chat/completions` API. Works against the
//! hosted service or any compatible server. Failures are distinguished and
//! logged here (auth, rate limit, connectivity, service error) but all
//! surface as `Error::Oracle` for the lenient boundary to absorb.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::Category;

use super::parsing::parse_category;
use super::Oracle;

use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const SYSTEM_PROMPT: &str = "You are a helpful financial advisor.";

/// OpenAI-compatible chat backend
#[derive(Clone)]
pub struct OpenAiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    /// Create a new backend against the given server
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables. Returns None without an API key.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self::new(&base_url, &api_key, &model))
    }

    /// One chat-completions round trip, returning the assistant text
    async fn chat(&self, prompt: String, max_tokens: u32, temperature: f64) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            max_tokens,
            temperature,
        };

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_connect() {
                    "connectivity failure"
                } else if e.is_timeout() {
                    "timeout"
                } else {
                    "transport error"
                };
                warn!(host = %self.base_url, error = %e, "oracle request failed: {}", kind);
                Error::Oracle(format!("{}: {}", kind, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let kind = match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "authentication failure",
                StatusCode::TOO_MANY_REQUESTS => "rate limited",
                _ => "service error",
            };
            warn!(host = %self.base_url, %status, "oracle request failed: {}", kind);
            return Err(Error::Oracle(format!("{} ({})", kind, status)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::OracleResponse(format!("undecodable body: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::OracleResponse("response has no choices".to_string()))?;

        debug!(model = %self.model, "oracle response: {}", content.trim());
        Ok(content)
    }
}

/// Request to the chat-completions API
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Response from the chat-completions API
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl Oracle for OpenAiBackend {
    async fn categorize(&self, description: &str) -> Result<Category> {
        let categories = Category::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = format!(
            "Classify this bank transaction into exactly one of the following \
             categories: {}.\n\nTransaction: \"{}\"\n\nReply with the single \
             category word and nothing else.",
            categories, description
        );

        let response = self.chat(prompt, 10, 0.0).await?;
        parse_category(&response)
    }

    async fn advise(&self, total_income: f64, total_expenses: f64) -> Result<String> {
        let prompt = format!(
            "Based on the following budget data, provide advice on how to \
             manage finances better.\n\nIncome: ${:.2}\nExpenses: ${:.2}\n\n\
             Please provide:\n\
             1. A brief summary of the current financial state\n\
             2. Three suggestions to improve budgeting or reduce expenses",
            total_income, total_expenses
        );
        self.chat(prompt, 150, 0.7).await
    }

    async fn draft_budget(&self, total_income: f64, total_expenses: f64) -> Result<String> {
        let prompt = format!(
            "Based on the following budget data, create a detailed monthly \
             budget.\n\nTotal Income: ${:.2}\nTotal Expenses: ${:.2}\n\n\
             Please include:\n\
             1. Suggested savings amount.\n\
             2. Allocations for essential expenses (e.g., rent, utilities, groceries).\n\
             3. Allocations for discretionary spending (e.g., entertainment, dining out).\n\
             4. Any recommendations for improving financial health.",
            total_income, total_expenses
        );
        self.chat(prompt, 150, 0.7).await
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/v1/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = OpenAiBackend::new("http://localhost:8080/", "key", "m");
        assert_eq!(backend.host(), "http://localhost:8080");
        assert_eq!(backend.model(), "m");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_oracle_error() {
        // Nothing listens on this port; the error must be `Oracle`, not a
        // raw transport error.
        let backend = OpenAiBackend::new("http://127.0.0.1:1", "key", "m");
        let result = backend.categorize("COFFEE SHOP").await;
        assert!(matches!(result, Err(Error::Oracle(_))));
        assert!(!backend.health_check().await);
    }
}
