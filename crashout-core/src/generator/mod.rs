//! Remote text generator capability.
//!
//! Both procedures talk to a [`TextGenerator`]: a live HTTP implementation
//! when a credential is configured, or the [`OfflineGenerator`] stub that
//! fails fast without touching the network. The choice is made once, in
//! [`create_text_generator`].

mod http;

pub use http::HttpTextGenerator;

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use serde_json::{json, Map, Value};

/// Kind of a single field in a [`ResponseShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    StringList,
}

/// Structured-output contract sent alongside a prompt.
///
/// Every field is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseShape {
    fields: Vec<(&'static str, FieldKind)>,
}

impl ResponseShape {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a required field.
    pub fn field(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push((name, kind));
        self
    }

    pub fn fields(&self) -> &[(&'static str, FieldKind)] {
        &self.fields
    }

    /// JSON Schema for this shape (OpenAI, Ollama, prompt-embedded for Claude).
    pub fn json_schema(&self) -> Value {
        let mut schema = self.schema_with(|kind| match kind {
            FieldKind::String => json!({ "type": "string" }),
            FieldKind::Number => json!({ "type": "number" }),
            FieldKind::StringList => json!({ "type": "array", "items": { "type": "string" } }),
        });
        schema["additionalProperties"] = json!(false);
        schema
    }

    /// Gemini `responseSchema` flavour (OpenAPI subset with upper-case types).
    pub fn gemini_schema(&self) -> Value {
        let mut schema = self.schema_with(|kind| match kind {
            FieldKind::String => json!({ "type": "STRING" }),
            FieldKind::Number => json!({ "type": "NUMBER" }),
            FieldKind::StringList => json!({ "type": "ARRAY", "items": { "type": "STRING" } }),
        });
        schema["type"] = json!("OBJECT");
        schema
    }

    fn schema_with(&self, kind_schema: impl Fn(FieldKind) -> Value) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, kind)| (name.to_string(), kind_schema(*kind)))
            .collect();
        let required: Vec<&str> = self.fields.iter().map(|(name, _)| *name).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl Default for ResponseShape {
    fn default() -> Self {
        Self::new()
    }
}

/// Text generation interface used by the feedback and recap procedures.
pub trait TextGenerator: Send + Sync {
    /// Send one prompt with its response contract and return the raw reply text.
    ///
    /// Errors mean the call itself failed; a reply that does not match the
    /// shape is returned as-is and judged by the caller.
    fn generate(&self, prompt: &str, shape: &ResponseShape) -> Result<String>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// Stub used when no credential is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

impl TextGenerator for OfflineGenerator {
    fn generate(&self, _prompt: &str, _shape: &ResponseShape) -> Result<String> {
        Err(Error::GeneratorUnavailable)
    }

    fn describe(&self) -> String {
        "offline".to_string()
    }
}

/// Pick the generator for this configuration.
///
/// Live when the provider is keyless or a credential resolves, offline otherwise.
pub fn create_text_generator(config: Option<&GeneratorConfig>) -> Result<Box<dyn TextGenerator>> {
    let Some(config) = config else {
        tracing::info!("No generator configured, reactions will be offline");
        return Ok(Box::new(OfflineGenerator));
    };

    let api_key = config.resolve_api_key();
    if config.provider.requires_api_key() && api_key.is_none() {
        tracing::warn!(
            provider = ?config.provider,
            "No API key found for generator, reactions will be offline"
        );
        return Ok(Box::new(OfflineGenerator));
    }

    let generator = HttpTextGenerator::new(config, api_key)?;
    tracing::info!(generator = %generator.describe(), "Using remote text generator");
    Ok(Box::new(generator))
}

/// Parse a generator reply into a JSON object.
///
/// Accepts replies wrapped in prose or markdown fences by falling back to the
/// outermost `{...}` span.
pub fn parse_json_object(raw: &str) -> Result<Map<String, Value>> {
    let parsed = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(_) => {
            let extracted = extract_json_object(raw)?;
            serde_json::from_str::<Value>(extracted)
                .map_err(|e| Error::MalformedResponse(format!("invalid JSON: {e}")))?
        }
    };

    match parsed {
        Value::Object(map) => Ok(map),
        other => Err(Error::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn extract_json_object(raw: &str) -> Result<&str> {
    let start = raw.find('{').ok_or_else(|| {
        Error::MalformedResponse("response did not contain a JSON object".to_string())
    })?;
    let end = raw.rfind('}').ok_or_else(|| {
        Error::MalformedResponse("response did not contain a JSON object".to_string())
    })?;
    if end <= start {
        return Err(Error::MalformedResponse(
            "response JSON bounds are invalid".to_string(),
        ));
    }
    Ok(&raw[start..=end])
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
