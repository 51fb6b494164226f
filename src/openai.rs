use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::conversation::Message;
use crate::http_errors::chat_request_error;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn to_wire_messages(messages: &[Message]) -> Vec<WireMessage<'_>> {
    messages
        .iter()
        .map(|msg| WireMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        })
        .collect()
}

fn completions_url(base_url: &str) -> String {
    format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
}

/// One configured remote endpoint. Each `chat` call is a single synchronous
/// round trip; there are no retries and no streaming.
pub struct ChatClient<'a> {
    client: &'a Client,
    cfg: &'a Config,
    model: String,
    extra: Map<String, Value>,
}

impl<'a> ChatClient<'a> {
    pub fn new(
        client: &'a Client,
        cfg: &'a Config,
        model: impl Into<String>,
        extra: Map<String, Value>,
    ) -> Self {
        Self {
            client,
            cfg,
            model: model.into(),
            extra,
        }
    }

    pub async fn chat(&self, messages: &[Message]) -> Result<String> {
        let api_url = completions_url(&self.cfg.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: to_wire_messages(messages),
            extra: &self.extra,
        };
        debug!(
            api_url = %api_url,
            model = %self.model,
            message_count = messages.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(&api_url)
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    api_url = %api_url,
                    model = %self.model,
                    error = %err,
                    "chat completion request failed"
                );
                chat_request_error(err, &api_url, self.cfg.request_timeout_secs)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let response_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read response body>".to_string());
            warn!(
                api_url = %api_url,
                model = %self.model,
                status = %status,
                response_body_len = response_body.len(),
                "chat completion returned non-success status"
            );
            return Err(anyhow!(
                "Chat completion failed with status {}: {}",
                status,
                response_body
            ));
        }

        let raw = response
            .text()
            .await
            .context("Failed to read chat completion response body")?;
        let reply = extract_reply(&raw)?;
        debug!(model = %self.model, reply_len = reply.len(), "received chat completion");
        Ok(reply)
    }
}

/// Pulls `choices[0].message.content` out of the response envelope. The body
/// is navigated field by field so a malformed response names the field that
/// broke, and the no-choices case dumps the raw body as a user-visible
/// diagnostic.
pub fn extract_reply(raw: &str) -> Result<String> {
    let envelope: Value =
        serde_json::from_str(raw).context("Failed to parse chat completion response as JSON")?;

    let choices = envelope
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            anyhow!("Unexpected response format: no 'choices' array. Raw response: {raw}")
        })?;
    let choice = choices.first().ok_or_else(|| {
        anyhow!("Unexpected response format: 'choices' is empty. Raw response: {raw}")
    })?;

    let message = choice
        .get("message")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            anyhow!("Unexpected response format: 'choices[0].message' is missing or not an object")
        })?;
    let content = message.get("content").and_then(Value::as_str).ok_or_else(|| {
        anyhow!("Unexpected response format: 'choices[0].message.content' is missing or not a string")
    })?;

    Ok(content.trim().to_string())
}
