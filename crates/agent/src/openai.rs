//! OpenAI Responses API client backing both the routing oracle and the main
//! generation step.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use platzbot_core::config::OpenAiConfig;

use crate::llm::{ChatMessage, GenerationClient, RoutingOracle};

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    router_model: String,
    generation_model: String,
    vector_store_id: Option<String>,
}

impl OpenAiClient {
    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("openai api key is not configured (set OPENAI_API_KEY)"))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            router_model: config.router_model.clone(),
            generation_model: config.generation_model.clone(),
            vector_store_id: config.vector_store_id.clone(),
        })
    }

    /// Tools attached to the generation step only. The routing oracle runs
    /// without tools so its output stays a bare JSON decision.
    fn generation_tools(&self) -> Vec<Value> {
        let mut tools = vec![json!({"type": "web_search_preview"})];
        if let Some(vector_store_id) = &self.vector_store_id {
            tools.push(json!({
                "type": "file_search",
                "vector_store_ids": [vector_store_id],
            }));
        }
        tools
    }

    async fn create_response(
        &self,
        model: &str,
        input: Value,
        tools: Option<Vec<Value>>,
    ) -> Result<String> {
        let mut body = json!({
            "model": model,
            "input": input,
        });
        if let Some(tools) = tools {
            body["tools"] = Value::Array(tools);
        }

        let response = self
            .http
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("openai request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("openai returned {status}: {detail}");
        }

        let payload: ResponsePayload =
            response.json().await.context("failed to decode openai response")?;
        debug!(model, "openai response received");
        extract_output_text(&payload)
    }
}

#[derive(Debug, Deserialize)]
struct ResponsePayload {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Concatenates every `output_text` part across message items. Tool-call
/// items (web search, file search) in the output array are skipped.
fn extract_output_text(payload: &ResponsePayload) -> Result<String> {
    let mut parts = Vec::new();
    for item in &payload.output {
        if item.kind != "message" {
            continue;
        }
        for part in &item.content {
            if part.kind == "output_text" && !part.text.is_empty() {
                parts.push(part.text.as_str());
            }
        }
    }

    if parts.is_empty() {
        bail!("openai response contained no output text");
    }
    Ok(parts.join("\n"))
}

fn messages_to_input(messages: &[ChatMessage]) -> Value {
    serde_json::to_value(messages).unwrap_or_else(|_| json!([]))
}

#[async_trait]
impl RoutingOracle for OpenAiClient {
    async fn classify(&self, instruction: &str, utterance: &str) -> Result<String> {
        let input = messages_to_input(&[
            ChatMessage::system(instruction),
            ChatMessage::user(utterance),
        ]);
        self.create_response(&self.router_model, input, None).await
    }
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let input = messages_to_input(messages);
        self.create_response(&self.generation_model, input, Some(self.generation_tools())).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use platzbot_core::config::OpenAiConfig;

    use super::{extract_output_text, OpenAiClient, ResponsePayload};

    fn payload(value: serde_json::Value) -> ResponsePayload {
        serde_json::from_value(value).expect("payload")
    }

    #[test]
    fn output_text_is_extracted_across_message_items() {
        let payload = payload(json!({
            "output": [
                {"type": "web_search_call", "status": "completed"},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "Erster Teil."},
                ]},
                {"type": "message", "content": [
                    {"type": "refusal", "refusal": "nein"},
                    {"type": "output_text", "text": "Zweiter Teil."},
                ]},
            ]
        }));
        assert_eq!(extract_output_text(&payload).expect("text"), "Erster Teil.\nZweiter Teil.");
    }

    #[test]
    fn empty_output_is_an_error() {
        let payload = payload(json!({
            "output": [{"type": "file_search_call", "status": "completed"}]
        }));
        assert!(extract_output_text(&payload).is_err());
    }

    #[test]
    fn missing_api_key_fails_construction() {
        let config = OpenAiConfig { api_key: None, ..OpenAiConfig::default() };
        assert!(OpenAiClient::from_config(&config).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let config = OpenAiConfig {
            api_key: Some("sk-test".to_string().into()),
            base_url: "https://api.openai.com/v1/".to_string(),
            ..OpenAiConfig::default()
        };
        let client = OpenAiClient::from_config(&config).expect("client");
        assert_eq!(client.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn vector_store_enables_file_search_tool() {
        let config = OpenAiConfig {
            api_key: Some("sk-test".to_string().into()),
            vector_store_id: Some("vs_123".to_string()),
            ..OpenAiConfig::default()
        };
        let client = OpenAiClient::from_config(&config).expect("client");
        let tools = client.generation_tools();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[1]["vector_store_ids"][0], "vs_123");
    }
}
