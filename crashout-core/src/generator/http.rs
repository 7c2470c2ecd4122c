//! HTTP-backed text generator.

use super::{ResponseShape, TextGenerator};
use crate::config::{GeneratorConfig, GeneratorProvider};
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are the CRASHOUT Brain, a chaotic but kind hype friend. Reply with a single JSON object and nothing else.";

/// Live generator that makes exactly one request per call.
pub struct HttpTextGenerator {
    model: String,
    provider: GeneratorProvider,
    endpoint: String,
    api_key: Option<String>,
    runtime: tokio::runtime::Runtime,
    http: reqwest::Client,
}

impl HttpTextGenerator {
    /// Build a client for `config` using an already-resolved credential.
    pub fn new(config: &GeneratorConfig, api_key: Option<String>) -> Result<Self> {
        if config.provider.requires_api_key() && api_key.is_none() {
            return Err(Error::Config(
                "generator.api_key (or provider env var) is required".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Generator(format!("failed to build tokio runtime: {e}")))?;
        let timeout_secs = config.timeout_secs.max(1);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Generator(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model().to_string(),
            provider: config.provider,
            endpoint: config.endpoint().trim_end_matches('/').to_string(),
            api_key,
            runtime,
            http,
        })
    }

    fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    fn request(&self, prompt: &str, shape: &ResponseShape) -> Result<(String, HeaderMap, Value)> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let request = match self.provider {
            GeneratorProvider::Gemini => {
                headers.insert(
                    "x-goog-api-key",
                    HeaderValue::from_str(self.api_key())
                        .map_err(|e| Error::Config(format!("invalid gemini api key header: {e}")))?,
                );
                (
                    format!(
                        "{}/v1beta/models/{}:generateContent",
                        self.endpoint, self.model
                    ),
                    headers,
                    json!({
                        "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
                        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
                        "generationConfig": {
                            "responseMimeType": "application/json",
                            "responseSchema": shape.gemini_schema(),
                        },
                    }),
                )
            }
            GeneratorProvider::OpenAI => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", self.api_key()))
                        .map_err(|e| Error::Config(format!("invalid auth header: {e}")))?,
                );
                (
                    format!("{}/v1/chat/completions", self.endpoint),
                    headers,
                    json!({
                        "model": self.model,
                        "messages": [
                            { "role": "system", "content": SYSTEM_PROMPT },
                            { "role": "user", "content": prompt }
                        ],
                        "response_format": {
                            "type": "json_schema",
                            "json_schema": {
                                "name": "crashout_response",
                                "strict": true,
                                "schema": shape.json_schema(),
                            }
                        }
                    }),
                )
            }
            GeneratorProvider::Claude => {
                headers.insert(
                    "x-api-key",
                    HeaderValue::from_str(self.api_key())
                        .map_err(|e| Error::Config(format!("invalid claude api key header: {e}")))?,
                );
                headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
                let system = format!(
                    "{SYSTEM_PROMPT}\nThe object must match this JSON schema:\n{}",
                    shape.json_schema()
                );
                (
                    format!("{}/v1/messages", self.endpoint),
                    headers,
                    json!({
                        "model": self.model,
                        "max_tokens": 400,
                        "system": system,
                        "messages": [{ "role": "user", "content": prompt }],
                    }),
                )
            }
            GeneratorProvider::Ollama => (
                format!("{}/api/generate", self.endpoint),
                headers,
                json!({
                    "model": self.model,
                    "system": SYSTEM_PROMPT,
                    "prompt": prompt,
                    "format": shape.json_schema(),
                    "stream": false,
                }),
            ),
        };

        Ok(request)
    }

    /// Pull the generated text out of the provider's response envelope.
    fn extract_text(&self, envelope: &Value) -> Result<String> {
        let text = match self.provider {
            GeneratorProvider::Gemini => envelope
                .pointer("/candidates/0/content/parts/0/text")
                .and_then(Value::as_str),
            GeneratorProvider::OpenAI => envelope
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str),
            GeneratorProvider::Claude => envelope.pointer("/content/0/text").and_then(Value::as_str),
            GeneratorProvider::Ollama => envelope.get("response").and_then(Value::as_str),
        };

        text.map(ToString::to_string).ok_or_else(|| {
            Error::Generator(format!(
                "{} response missing generated text",
                self.provider_name()
            ))
        })
    }

    fn provider_name(&self) -> &'static str {
        match self.provider {
            GeneratorProvider::Gemini => "gemini",
            GeneratorProvider::OpenAI => "openai",
            GeneratorProvider::Claude => "claude",
            GeneratorProvider::Ollama => "ollama",
        }
    }
}

impl TextGenerator for HttpTextGenerator {
    fn generate(&self, prompt: &str, shape: &ResponseShape) -> Result<String> {
        let (url, headers, body) = self.request(prompt, shape)?;
        let provider = self.provider_name();

        self.runtime.block_on(async {
            let resp = self
                .http
                .post(url)
                .headers(headers)
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::Generator(format!("{provider} request failed: {e}")))?;
            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| Error::Generator(format!("{provider} read body failed: {e}")))?;
            if !status.is_success() {
                return Err(Error::Generator(format!(
                    "{provider} returned {}: {}",
                    status.as_u16(),
                    body
                )));
            }
            let envelope: Value = serde_json::from_str(&body).map_err(|e| {
                Error::Generator(format!("{provider} returned a non-JSON envelope: {e}"))
            })?;
            self.extract_text(&envelope)
        })
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.provider_name(), self.model)
    }
}
