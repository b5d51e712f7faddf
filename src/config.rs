use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_FAL_ENDPOINT: &str = "https://queue.fal.run";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    Gemini,
    Fal,
}

/// One entry of the preset registry shown on the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetModel {
    /// Name the form submits as `model_name`.
    pub id: &'static str,
    /// Model identifier sent to the provider.
    pub remote_id: &'static str,
    pub kind: PresetKind,
}

pub const PRESET_MODELS: &[PresetModel] = &[
    PresetModel {
        id: "gemini-2.5-flash-image",
        remote_id: "gemini-2.5-flash-image",
        kind: PresetKind::Gemini,
    },
    PresetModel {
        id: "qwen-image-edit-lora",
        remote_id: "fal-ai/fast-svd/lcm",
        kind: PresetKind::Fal,
    },
];

/// Process-wide settings, read once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub google_api_key: Option<String>,
    pub fal_key: Option<String>,
    pub gemini_endpoint: String,
    pub fal_endpoint: String,
    /// Answer Gemini presets locally instead of calling the API.
    pub gemini_simulate: bool,
    pub max_upload_bytes: usize,
    pub request_timeout: Option<Duration>,
    pub presets: Vec<PresetModel>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            static_dir: PathBuf::from("static"),
            upload_dir: PathBuf::from("static").join("uploads"),
            google_api_key: None,
            fal_key: None,
            gemini_endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            fal_endpoint: DEFAULT_FAL_ENDPOINT.to_string(),
            gemini_simulate: false,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout: None,
            presets: PRESET_MODELS.to_vec(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Config::default();

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("PORT") {
            Some(raw) => parse_value("PORT", &raw)?,
            None => 5000u16,
        };
        config.bind_addr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "HOST",
                value: host.clone(),
            })?;

        if let Some(dir) = get("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
            config.upload_dir = config.static_dir.join("uploads");
        }
        if let Some(dir) = get("UPLOAD_FOLDER") {
            config.upload_dir = PathBuf::from(dir);
        }

        config.google_api_key = get("GOOGLE_API_KEY");
        config.fal_key = get("FAL_KEY");

        if let Some(endpoint) = get("GEMINI_ENDPOINT") {
            config.gemini_endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(endpoint) = get("FAL_ENDPOINT") {
            config.fal_endpoint = endpoint.trim_end_matches('/').to_string();
        }

        if let Some(raw) = get("GEMINI_SIMULATE") {
            config.gemini_simulate = parse_flag("GEMINI_SIMULATE", &raw)?;
        }
        if let Some(raw) = get("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse_value("MAX_UPLOAD_BYTES", &raw)?;
        }
        if let Some(raw) = get("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_value("REQUEST_TIMEOUT_SECS", &raw)?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn preset(&self, id: &str) -> Option<&PresetModel> {
        self.presets.iter().find(|preset| preset.id == id)
    }

    pub fn default_preset(&self) -> Option<&PresetModel> {
        self.presets.first()
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
