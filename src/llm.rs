use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::TokenProvider;
use crate::config::SweepConfig;
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Abstraction over whichever completion backend is configured.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issues one chat-completion request and returns the generated text.
    async fn complete(&self, model: &str, prompt: &str) -> Result<String>;
}

/// Concrete [`CompletionClient`] for Azure OpenAI chat deployments,
/// authenticating through a [`TokenProvider`].
pub struct AzureChatClient {
    http: Client,
    endpoint: String,
    api_version: String,
    system_prompt: Option<String>,
    tokens: Arc<dyn TokenProvider>,
}

impl AzureChatClient {
    pub fn new(config: &SweepConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(Error::Config("Endpoint may not be empty".into()));
        }
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            endpoint,
            api_version: config.api_version.clone(),
            system_prompt: config.system_prompt.clone(),
            tokens,
        })
    }

    fn completion_url(&self, model: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, model, self.api_version
        )
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        ChatRequest { messages }
    }
}

impl std::fmt::Debug for AzureChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureChatClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[async_trait]
impl CompletionClient for AzureChatClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        let token = self.tokens.bearer_token().await?;
        let url = self.completion_url(model);
        debug!(%model, %url, "Sending completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|err| Error::Request {
                model: model.to_string(),
                status: None,
                details: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Request {
                model: model.to_string(),
                status: Some(status.as_u16()),
                details: body,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|err| Error::Request {
            model: model.to_string(),
            status: Some(status.as_u16()),
            details: format!("Malformed completion response: {err}"),
        })?;
        extract_content(parsed, model)
    }
}

fn extract_content(response: ChatResponse, model: &str) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| Error::Request {
            model: model.to_string(),
            status: None,
            details: "Completion response contained no choices".into(),
        })
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenProvider;
    use crate::config::SweepConfig;

    struct StaticTokens;

    #[async_trait]
    impl TokenProvider for StaticTokens {
        async fn bearer_token(&self) -> Result<String> {
            Ok("token".into())
        }
    }

    fn test_config() -> SweepConfig {
        SweepConfig::from_yaml_str(
            r#"
            endpoint: "https://example.openai.azure.com/"
            api_version: "2025-01-01-preview"
            system_prompt: "You are a historian."
            models: ["gpt-4o"]
            prompts: ["hello"]
            "#,
        )
        .expect("valid config")
    }

    fn test_client() -> AzureChatClient {
        AzureChatClient::new(&test_config(), Arc::new(StaticTokens)).expect("client builds")
    }

    #[test]
    fn completion_url_targets_the_deployment() {
        let client = test_client();
        assert_eq!(
            client.completion_url("gpt-4.1"),
            "https://example.openai.azure.com/openai/deployments/gpt-4.1/chat/completions?api-version=2025-01-01-preview"
        );
    }

    #[test]
    fn request_body_puts_system_message_first() {
        let client = test_client();
        let body = serde_json::to_value(client.request_body("name a division")).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "You are a historian.");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "name a division");
    }

    #[test]
    fn request_body_without_system_prompt_is_user_only() {
        let mut config = test_config();
        config.system_prompt = None;
        let client = AzureChatClient::new(&config, Arc::new(StaticTokens)).unwrap();
        let body = serde_json::to_value(client.request_body("hi")).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn extract_content_takes_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Division Alpha"}},{"message":{"role":"assistant","content":"other"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(response, "gpt-4o").unwrap(), "Division Alpha");
    }

    #[test]
    fn extract_content_rejects_empty_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let err = extract_content(response, "gpt-4o").unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }
}
