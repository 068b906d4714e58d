//! Provider trait for LLM backends and the Ollama implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// LLM provider trait.
///
/// Implementations handle request formatting and response parsing for a
/// specific LLM API.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Chat with the LLM using an optional system prompt.
    ///
    /// Returns the assistant's response text.
    async fn chat_with_system(
        &self,
        system: Option<&str>,
        message: &str,
        model: &str,
        temperature: f64,
    ) -> Result<String>;

    /// Simple chat without system prompt.
    async fn chat(&self, message: &str, model: &str, temperature: f64) -> Result<String> {
        self.chat_with_system(None, message, model, temperature)
            .await
    }

    /// Check the backend is reachable.
    async fn warmup(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Ollama chat provider.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a provider against the given base URL.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat_with_system(
        &self,
        system: Option<&str>,
        message: &str,
        model: &str,
        temperature: f64,
    ) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: message.to_string(),
        });

        let request = ChatRequest {
            model: model.to_string(),
            messages,
            stream: false,
            options: ChatOptions { temperature },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to reach Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama chat response")?;

        Ok(parsed.message.content)
    }

    async fn warmup(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("Failed to reach Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama health check returned {}", response.status());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProvider;

    #[async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn chat_with_system(
            &self,
            system: Option<&str>,
            message: &str,
            _model: &str,
            _temperature: f64,
        ) -> Result<String> {
            Ok(format!(
                "system={} message={message}",
                system.unwrap_or("none")
            ))
        }
    }

    #[tokio::test]
    async fn chat_defaults_to_no_system_prompt() {
        let provider = MockProvider;
        let response = provider.chat("hi", "test", 0.7).await.unwrap();
        assert_eq!(response, "system=none message=hi");
    }

    #[tokio::test]
    async fn chat_with_system_passes_prompt() {
        let provider = MockProvider;
        let response = provider
            .chat_with_system(Some("be terse"), "hi", "test", 0.0)
            .await
            .unwrap();
        assert_eq!(response, "system=be terse message=hi");
    }

    #[tokio::test]
    async fn warmup_default_succeeds() {
        assert!(MockProvider.warmup().await.is_ok());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OllamaProvider::new("http://localhost:11434/", 30).unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[test]
    fn chat_request_serializes_expected_shape() {
        let request = ChatRequest {
            model: "gpt-oss:20b".to_string(),
            messages: vec![ChatMessage {
                role: "user",
                content: "hello".to_string(),
            }],
            stream: false,
            options: ChatOptions { temperature: 0.7 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["options"]["temperature"], 0.7);
    }
}
