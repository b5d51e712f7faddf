use std::sync::Arc;

use serde_json::Value;

use crate::backend::{
    fal_payload, gemini_payload, parse_custom_response, parse_fal_response,
    parse_gemini_response, Backend, CustomEndpoint, GenerationResult, ImagePayload,
};
use crate::camera::{compose_prompt, CameraDescription};
use crate::config::Config;
use crate::error::GenerationError;

/// Sends one generation request to the selected backend. One POST, no retries.
#[derive(Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    pub async fn dispatch(
        &self,
        image: &ImagePayload,
        prompt: &str,
        camera: &CameraDescription,
        backend: &Backend,
    ) -> Result<GenerationResult, GenerationError> {
        let full_prompt = compose_prompt(prompt, camera);
        tracing::info!(backend = backend.label(), prompt = %full_prompt, "dispatching generation");

        match backend {
            Backend::Custom(endpoint) => self.call_custom(endpoint, image, &full_prompt).await,
            Backend::Gemini { model } => {
                if self.config.gemini_simulate {
                    return Ok(GenerationResult::message(format!(
                        "Simulated {} edit for prompt: {} ({})",
                        model, prompt, camera
                    )));
                }
                self.call_gemini(model, image, &full_prompt).await
            }
            Backend::Fal { model } => self.call_fal(model, image, &full_prompt).await,
        }
    }

    async fn call_custom(
        &self,
        endpoint: &CustomEndpoint,
        image: &ImagePayload,
        prompt: &str,
    ) -> Result<GenerationResult, GenerationError> {
        if endpoint.url.trim().is_empty() || endpoint.key.trim().is_empty() {
            return Err(GenerationError::Config("Missing Custom API Config".into()));
        }

        let payload = endpoint.payload(image, prompt);
        let (status, body) = self
            .post_json(&endpoint.url, &endpoint.authorization(), &payload)
            .await?;
        if status != 200 {
            return Err(GenerationError::Api { status, body });
        }

        let body: Value = serde_json::from_str(&body)?;
        Ok(parse_custom_response(body))
    }

    async fn call_fal(
        &self,
        model: &str,
        image: &ImagePayload,
        prompt: &str,
    ) -> Result<GenerationResult, GenerationError> {
        let key = self
            .config
            .fal_key
            .as_deref()
            .ok_or_else(|| GenerationError::Config("FAL_KEY missing".into()))?;

        let url = format!("{}/{}", self.config.fal_endpoint, model);
        let payload = fal_payload(image, prompt);
        let (status, body) = self
            .post_json(&url, &format!("Key {}", key), &payload)
            .await?;
        if status != 200 {
            return Err(GenerationError::Api { status, body });
        }
        parse_fal_response(&body, status)
    }

    async fn call_gemini(
        &self,
        model: &str,
        image: &ImagePayload,
        prompt: &str,
    ) -> Result<GenerationResult, GenerationError> {
        let key = self
            .config
            .google_api_key
            .as_deref()
            .ok_or_else(|| GenerationError::Config("GOOGLE_API_KEY missing".into()))?;

        let url = format!("{}/{}:generateContent", self.config.gemini_endpoint, model);
        let payload = gemini_payload(image, prompt);

        tracing::debug!(model, "sending request to Google Gemini");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if status != 200 {
            tracing::warn!(status, "Gemini returned an error");
            return Err(GenerationError::Api { status, body });
        }

        let body: Value = serde_json::from_str(&body)?;
        parse_gemini_response(&body)
    }

    async fn post_json(
        &self,
        url: &str,
        authorization: &str,
        payload: &Value,
    ) -> Result<(u16, String), GenerationError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", authorization)
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(
            url,
            status,
            body = %preview(&body),
            "backend responded"
        );
        if status != 200 {
            tracing::warn!(url, status, "backend returned an error");
        }
        Ok((status, body))
    }
}

fn preview(body: &str) -> String {
    body.chars().take(500).collect()
}
