use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::completion::{CompletionClient, CompletionFuture};
use crate::config::Config;
use crate::error::ChatError;
use crate::model::{GenerationParams, Message};
use crate::providers::http_errors::transport_error;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage<'_>> {
    messages
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        })
        .collect()
}

fn extract_reply(body: &str) -> Result<String, ChatError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|err| ChatError::ResponseFormat(format!("body is not valid JSON: {err}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| {
            ChatError::ResponseFormat("missing choices[0].message.content".to_string())
        })
}

/// OpenAI-compatible chat completions endpoint, OpenRouter flavored: bearer
/// auth plus the `HTTP-Referer` and `X-Title` identification headers.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: Client,
    api_url: String,
    api_key: String,
    model: String,
    http_referer: String,
    app_title: String,
    timeout_secs: u64,
}

impl OpenRouterClient {
    pub fn new(cfg: &Config, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("Failed to initialize HTTP client")?;

        Ok(Self {
            http,
            api_url: cfg.api_url.clone(),
            api_key: api_key.into(),
            model: cfg.model.clone(),
            http_referer: cfg.http_referer.clone(),
            app_title: cfg.app_title.clone(),
            timeout_secs: cfg.request_timeout_secs,
        })
    }

    async fn send(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, ChatError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: to_chat_messages(messages),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
        };
        debug!(
            api_url = %self.api_url,
            model = %self.model,
            message_count = messages.len(),
            "sending chat completion request"
        );

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.http_referer)
            .header("X-Title", &self.app_title)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    api_url = %self.api_url,
                    model = %self.model,
                    error = %err,
                    "chat completion request failed"
                );
                transport_error(&err, &self.api_url, self.timeout_secs)
            })?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|err| transport_error(&err, &self.api_url, self.timeout_secs))?;

        if status != StatusCode::OK {
            warn!(
                api_url = %self.api_url,
                model = %self.model,
                status = %status,
                response_body_len = response_body.len(),
                "endpoint returned non-200 status"
            );
            return Err(ChatError::Http {
                status: status.as_u16(),
                body: response_body,
            });
        }

        let reply = extract_reply(&response_body)?;
        debug!(
            model = %self.model,
            response_len = reply.len(),
            "received chat completion"
        );
        Ok(reply)
    }
}

impl CompletionClient for OpenRouterClient {
    fn model(&self) -> &str {
        &self.model
    }

    fn complete<'a>(
        &'a self,
        messages: &'a [Message],
        params: &'a GenerationParams,
    ) -> CompletionFuture<'a> {
        Box::pin(self.send(messages, params))
    }
}
