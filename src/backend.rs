//! Backend variants and their wire formats.
//!
//! Each variant knows how to shape its request body and how to read a
//! successful reply. The HTTP round trip itself lives in `dispatch`.

use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{Config, PresetKind};
use crate::error::GenerationError;

/// Body layout a custom endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSchema {
    /// `{model, prompt, image, n, size}` with bearer auth.
    OpenAiEdit,
    /// `{image_url, prompt}` with `Key` auth.
    Fal,
}

impl PayloadSchema {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" | "openai_edit" | "openai-edit" => Some(PayloadSchema::OpenAiEdit),
            "fal" => Some(PayloadSchema::Fal),
            _ => None,
        }
    }

    /// Used only when the form does not name a schema.
    pub fn infer_from_url(url: &str) -> Self {
        let host = reqwest::Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase));
        match host {
            Some(host) if host == "fal.run" || host.ends_with(".fal.run") => PayloadSchema::Fal,
            _ => PayloadSchema::OpenAiEdit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomEndpoint {
    pub url: String,
    pub key: String,
    pub model_name: String,
    pub schema: PayloadSchema,
}

impl CustomEndpoint {
    pub fn authorization(&self) -> String {
        match self.schema {
            PayloadSchema::Fal => format!("Key {}", self.key),
            PayloadSchema::OpenAiEdit if self.key.contains("Bearer") => self.key.clone(),
            PayloadSchema::OpenAiEdit => format!("Bearer {}", self.key),
        }
    }

    pub fn payload(&self, image: &ImagePayload, prompt: &str) -> Value {
        match self.schema {
            PayloadSchema::OpenAiEdit => json!({
                "model": self.model_name,
                "prompt": prompt,
                "image": image.data_uri(),
                "n": 1,
                "size": "1024x1024",
            }),
            PayloadSchema::Fal => fal_payload(image, prompt),
        }
    }
}

/// Which service a request goes to, fixed once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Gemini { model: String },
    Fal { model: String },
    Custom(CustomEndpoint),
}

impl Backend {
    /// Resolves a preset name from the registry, falling back to the first preset.
    pub fn preset(config: &Config, model_name: Option<&str>) -> Result<Self, GenerationError> {
        let preset = match model_name {
            Some(name) if !name.is_empty() => config
                .preset(name)
                .ok_or_else(|| GenerationError::Config(format!("Unknown model: {}", name)))?,
            _ => config
                .default_preset()
                .ok_or_else(|| GenerationError::Config("No preset models configured".into()))?,
        };
        let model = preset.remote_id.to_string();
        Ok(match preset.kind {
            PresetKind::Gemini => Backend::Gemini { model },
            PresetKind::Fal => Backend::Fal { model },
        })
    }

    pub fn label(&self) -> &str {
        match self {
            Backend::Gemini { model } | Backend::Fal { model } => model,
            Backend::Custom(endpoint) => &endpoint.model_name,
        }
    }
}

/// The uploaded image, ready to be inlined into a request body.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    mime: &'static str,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        let mime = mime_for(&bytes);
        Self { bytes, mime }
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64())
    }
}

fn mime_for(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Gif) => "image/gif",
        _ => "image/jpeg",
    }
}

pub fn fal_payload(image: &ImagePayload, prompt: &str) -> Value {
    json!({
        "image_url": image.data_uri(),
        "prompt": prompt,
    })
}

pub fn gemini_payload(image: &ImagePayload, prompt: &str) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "text": prompt },
                {
                    "inline_data": {
                        "mime_type": image.mime(),
                        "data": image.base64()
                    }
                }
            ]
        }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"]
        }
    })
}

/// What a successful generation hands back to the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl GenerationResult {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            status: "success",
            image_url: Some(url.into()),
            message: None,
            raw: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            image_url: None,
            message: Some(message.into()),
            raw: None,
        }
    }

    pub fn raw(body: Value) -> Self {
        Self {
            status: "success",
            image_url: None,
            message: Some("Success".to_string()),
            raw: Some(body),
        }
    }
}

fn first_url(body: &Value, list: &str) -> Option<String> {
    body[list][0]["url"].as_str().map(str::to_string)
}

/// Custom endpoints: `data[0].url`, then `data[0].b64_json`, then `images[0].url`,
/// otherwise the whole body is passed through.
pub fn parse_custom_response(body: Value) -> GenerationResult {
    if let Some(url) = first_url(&body, "data") {
        return GenerationResult::image(url);
    }
    if let Some(b64) = body["data"][0]["b64_json"].as_str() {
        return GenerationResult::image(format!("data:image/png;base64,{}", b64));
    }
    if let Some(url) = first_url(&body, "images") {
        return GenerationResult::image(url);
    }
    GenerationResult::raw(body)
}

/// Fal replies must carry `images[0].url`; anything else is an error with the body text.
pub fn parse_fal_response(body_text: &str, status: u16) -> Result<GenerationResult, GenerationError> {
    let body: Value = serde_json::from_str(body_text).map_err(|_| GenerationError::Api {
        status,
        body: body_text.to_string(),
    })?;
    first_url(&body, "images")
        .map(GenerationResult::image)
        .ok_or_else(|| GenerationError::Api {
            status,
            body: body_text.to_string(),
        })
}

/// Gemini answers with content parts; an `inlineData` part is the edited image.
pub fn parse_gemini_response(body: &Value) -> Result<GenerationResult, GenerationError> {
    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| GenerationError::Unhandled("No content in Gemini response".into()))?;

    for part in parts {
        let inline = part.get("inlineData").or_else(|| part.get("inline_data"));
        if let Some(inline) = inline {
            let mime = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .unwrap_or("image/png");
            if let Some(data) = inline["data"].as_str() {
                return Ok(GenerationResult::image(format!("data:{};base64,{}", mime, data)));
            }
        }
    }

    let text: Vec<&str> = parts.iter().filter_map(|part| part["text"].as_str()).collect();
    if text.is_empty() {
        return Err(GenerationError::Unhandled("No image in Gemini response".into()));
    }
    Ok(GenerationResult::message(text.join("\n")))
}
