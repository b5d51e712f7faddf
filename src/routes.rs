use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::backend::{Backend, CustomEndpoint, GenerationResult, ImagePayload, PayloadSchema};
use crate::camera::{self, CameraDescription};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::GenerationError;
use crate::page;
use crate::upload;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let config = Arc::new(config);
        let dispatcher = Dispatcher::new(config.clone())?;
        Ok(Self { config, dispatcher })
    }
}

pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    let uploads = ServeDir::new(&state.config.upload_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate))
        .nest_service("/static", static_files)
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::render_index(&state.config.presets))
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<GenerationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_image: Option<String>,
    pub processing_time_ms: u128,
}

/// Everything the form sent, read in one pass.
#[derive(Debug, Default)]
struct GenerateForm {
    /// `None` when no `image` part was sent at all.
    image_name: Option<String>,
    image_bytes: Vec<u8>,
    fields: HashMap<String, String>,
}

impl GenerateForm {
    async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = GenerateForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                form.image_name = Some(field.file_name().unwrap_or_default().to_string());
                form.image_bytes = field.bytes().await?.to_vec();
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.text(key)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
    }

    /// `h_angle`/`v_angle` win; `rotate`/`pan_y` are read only when they are absent.
    fn camera(&self) -> CameraDescription {
        let h_angle = self
            .number("h_angle")
            .or_else(|| self.number("rotate"))
            .unwrap_or(camera::DEFAULT_HORIZONTAL);

        let v_angle = match (self.number("v_angle"), self.number("pan_y")) {
            (Some(v), _) => v,
            (None, Some(pan_y)) => {
                tracing::debug!(pan_y, "using deprecated pan_y field");
                camera::vertical_from_pan(pan_y)
            }
            (None, None) => camera::DEFAULT_VERTICAL,
        };

        let zoom = self.number("zoom").unwrap_or(camera::DEFAULT_ZOOM);
        camera::describe(h_angle, v_angle, zoom)
    }

    fn backend(&self, config: &Config) -> Result<Backend, GenerationError> {
        if self.text("model_source") != Some("custom") {
            return Backend::preset(config, self.text("model_name"));
        }

        let url = self.text("custom_api_url").unwrap_or_default().trim().to_string();
        let schema = match self.text("custom_api_schema").filter(|raw| !raw.is_empty()) {
            Some(raw) => PayloadSchema::parse(raw).ok_or_else(|| {
                GenerationError::Validation(format!("Unknown custom_api_schema: {}", raw))
            })?,
            None => PayloadSchema::infer_from_url(&url),
        };

        Ok(Backend::Custom(CustomEndpoint {
            url,
            key: self.text("custom_api_key").unwrap_or_default().trim().to_string(),
            model_name: self.text("custom_model_name").unwrap_or_default().to_string(),
            schema,
        }))
    }
}

async fn generate(State(state): State<AppState>, multipart: Multipart) -> Json<GenerateResponse> {
    let start = Instant::now();
    let mut original_image = None;

    let outcome = run_generate(&state, multipart, &mut original_image).await;
    let processing_time_ms = start.elapsed().as_millis();

    let response = match outcome {
        Ok(result) => GenerateResponse {
            success: true,
            data: Some(result),
            error: None,
            error_kind: None,
            original_image,
            processing_time_ms,
        },
        Err(err) => {
            tracing::warn!(kind = err.kind(), error = %err, "generation failed");
            GenerateResponse {
                success: false,
                data: None,
                error: Some(err.to_string()),
                error_kind: Some(err.kind()),
                original_image,
                processing_time_ms,
            }
        }
    };
    Json(response)
}

async fn run_generate(
    state: &AppState,
    multipart: Multipart,
    original_image: &mut Option<String>,
) -> Result<GenerationResult, GenerationError> {
    let form = GenerateForm::read(multipart)
        .await
        .map_err(|e| GenerationError::Validation(format!("Failed to read form: {}", e.body_text())))?;

    let filename = upload::validate(form.image_name.as_deref())?;
    upload::store(&state.config.upload_dir, &filename, &form.image_bytes).await?;
    *original_image = Some(format!("/uploads/{}", filename));

    let camera = form.camera();
    let backend = form.backend(&state.config)?;
    let prompt = form.text("prompt").unwrap_or_default().to_string();
    tracing::info!(file = %filename, camera = %camera, "received generation request");

    let image = ImagePayload::new(form.image_bytes);
    state.dispatcher.dispatch(&image, &prompt, &camera, &backend).await
}
