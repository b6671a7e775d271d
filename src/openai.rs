use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;

use crate::provider::{GenerationContext, Generator, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

const INSTRUCTIONS: &str = "You are a reading companion. Explain the quoted \
paragraph in plain language for the named reader. Answer with the explanation \
only, no preamble.";

/// Explanation engine backed by the OpenAI Responses API. Each context keeps
/// its own conversation transcript, so explanations within a chapter can build
/// on earlier paragraphs.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: responses_endpoint(base_url),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn configure(&self) -> Result<(), ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::Config(
                "missing API key (pass --api-key or set OPENAI_API_KEY)".to_owned(),
            ));
        }

        // Minimal probe so bad credentials fail the job before any paragraph.
        let body = serde_json::json!({
            "model": self.model,
            "input": "Reply with OK.",
            "max_output_tokens": 16,
            "store": false,
        });
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::Config(format!("POST {}: {err}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = parse_error_message(&raw).unwrap_or(raw);
            return Err(ProviderError::Config(format!(
                "OpenAI API error ({status}): {message}"
            )));
        }
        Ok(())
    }

    async fn start_context(&self) -> Result<Box<dyn GenerationContext>, ProviderError> {
        Ok(Box::new(OpenAiContext {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            transcript: Vec::new(),
        }))
    }
}

struct OpenAiContext {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    transcript: Vec<(String, String)>,
}

#[async_trait]
impl GenerationContext for OpenAiContext {
    async fn generate(&mut self, prompt: &str) -> Result<String, ProviderError> {
        let mut input = Vec::with_capacity(self.transcript.len() * 2 + 1);
        for (user, assistant) in &self.transcript {
            input.push(serde_json::json!({"role": "user", "content": user}));
            input.push(serde_json::json!({"role": "assistant", "content": assistant}));
        }
        input.push(serde_json::json!({"role": "user", "content": prompt}));

        let body = serde_json::json!({
            "model": self.model,
            "instructions": INSTRUCTIONS,
            "input": input,
            "text": { "format": { "type": "text" } },
            "store": false,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::Call(format!("POST {}: {err}", self.endpoint)))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|err| ProviderError::Call(format!("read response body: {err}")))?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
            return Err(ProviderError::Call(format!(
                "OpenAI API error ({status}): {message}"
            )));
        }

        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|err| ProviderError::Call(format!("parse response json: {err}")))?;
        let text = extract_output_text(&value)?;

        self.transcript.push((prompt.to_owned(), text.clone()));
        Ok(text)
    }
}

pub fn responses_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/responses")
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

fn extract_output_text(value: &serde_json::Value) -> Result<String, ProviderError> {
    let output = value
        .get("output")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ProviderError::Call("missing `output` array in response".to_owned()))?;

    let mut text = String::new();
    for item in output {
        if item.get("type").and_then(|v| v.as_str()) != Some("message") {
            continue;
        }
        let content = match item.get("content").and_then(|v| v.as_array()) {
            Some(content) => content,
            None => continue,
        };
        for part in content {
            if part.get("type").and_then(|v| v.as_str()) != Some("output_text") {
                continue;
            }
            let Some(part_text) = part.get("text").and_then(|v| v.as_str()) else {
                continue;
            };
            text.push_str(part_text);
        }
    }

    if text.trim().is_empty() {
        return Err(ProviderError::Call(
            "OpenAI output text is empty".to_owned(),
        ));
    }
    Ok(text)
}
