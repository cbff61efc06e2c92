// OpenAI chat-completions client (plain HTTP, no SDK)

use crate::config::OpenAIConfig;
use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
use crate::types::{Content, Message};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Error text used when the provider reports an exhausted quota.
/// Reply formatting matches on the "usage limit" part of it.
pub const USAGE_LIMIT_MARKER: &str = "usage limit exceeded";

pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&OpenAIConfig::new(api_key))
    }

    pub fn from_config(config: &OpenAIConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url().to_string(),
        })
    }

    fn build_chat_request(&self, model: &str, messages: Vec<Message>, options: &ChatOptions) -> Value {
        let openai_messages: Vec<Value> = messages.into_iter().map(convert_message).collect();

        let mut request = Map::new();
        request.insert("model".to_string(), Value::from(model));
        request.insert("messages".to_string(), Value::Array(openai_messages));

        if let Some(temp) = options.temperature {
            request.insert("temperature".to_string(), serde_json::json!(temp));
        }
        if let Some(max_tokens) = options.max_tokens {
            request.insert("max_tokens".to_string(), serde_json::json!(max_tokens));
        }

        Value::Object(request)
    }
}

fn convert_message(message: Message) -> Value {
    let role = message.role().to_string();
    let name = message.name().map(str::to_string);
    let content = match message {
        Message::System { content, .. }
        | Message::Human { content, .. }
        | Message::AI { content, .. } => content,
    };

    let mut obj = Map::new();
    obj.insert("role".to_string(), Value::String(role));
    obj.insert("content".to_string(), convert_content(content));
    if let Some(name) = name {
        obj.insert("name".to_string(), Value::String(name));
    }
    Value::Object(obj)
}

fn convert_content(content: Content) -> Value {
    match content {
        Content::Text(s) => Value::String(s),
    }
}

/// 429 is also used for plain rate limiting; only quota exhaustion is a usage limit
fn is_quota_error(status: StatusCode, body: &str) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS && body.contains("insufficient_quota")
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_chat_request(&request.model, request.messages, &request.options);

        tracing::debug!(model = %request.model, "Sending chat completion request");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            if is_quota_error(status, &error_text) {
                anyhow::bail!("OpenAI {}: {}", USAGE_LIMIT_MARKER, error_text);
            }
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        let raw: OpenAIChatResponse = response
            .json()
            .await
            .context("Failed to parse response")?;

        let choice = raw.choices.into_iter().next();
        Ok(ChatResponse {
            content: choice.as_ref().and_then(|c| c.message.content.clone()),
            usage: raw.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.and_then(|c| c.finish_reason),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chat_request() {
        let client = OpenAIClient::new("test-key").unwrap();
        let payload = client.build_chat_request(
            "gpt-3.5-turbo",
            vec![Message::system("persona"), Message::human("hi")],
            &ChatOptions::new().temperature(0.8).max_tokens(256),
        );

        assert_eq!(payload["model"], "gpt-3.5-turbo");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "hi");
        assert_eq!(payload["max_tokens"], 256);
        assert!(payload.get("stream").is_none());
    }

    #[test]
    fn test_options_omitted_when_unset() {
        let client = OpenAIClient::new("test-key").unwrap();
        let payload = client.build_chat_request("gpt-4", vec![Message::ai("ok")], &ChatOptions::default());
        assert!(payload.get("temperature").is_none());
        assert!(payload.get("max_tokens").is_none());
    }

    #[test]
    fn test_quota_detection() {
        assert!(is_quota_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":"insufficient_quota"}}"#
        ));
        assert!(!is_quota_error(StatusCode::TOO_MANY_REQUESTS, "rate limited"));
        assert!(!is_quota_error(StatusCode::BAD_REQUEST, "insufficient_quota"));
    }
}
