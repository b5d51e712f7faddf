use std::path::{Path, PathBuf};

use crate::config::ALLOWED_EXTENSIONS;
use crate::error::GenerationError;

const FALLBACK_STEM: &str = "upload";

/// Lowercased extension if the filename is on the whitelist.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Reduces a client-supplied filename to a safe single path component.
///
/// Directory parts are dropped, whitespace becomes `_`, anything outside
/// `[A-Za-z0-9._-]` is removed and leading dots are stripped.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    cleaned.trim_start_matches('.').to_string()
}

/// Checks an upload before anything else happens to it.
pub fn validate(filename: Option<&str>) -> Result<String, GenerationError> {
    let filename = filename.ok_or_else(|| GenerationError::Validation("No image uploaded".into()))?;
    if filename.is_empty() {
        return Err(GenerationError::Validation("No selected file".into()));
    }
    let ext = allowed_extension(filename).ok_or_else(|| {
        GenerationError::Validation(format!(
            "File type not allowed. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;

    let safe = sanitize_filename(filename);
    // a stem made only of non-ASCII or punctuation sanitises away entirely
    if allowed_extension(&safe).is_none() {
        return Ok(format!("{}.{}", FALLBACK_STEM, ext));
    }
    Ok(safe)
}

/// Writes the upload, silently replacing any earlier file of the same name.
pub async fn store(upload_dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, GenerationError> {
    tokio::fs::create_dir_all(upload_dir).await?;
    let path = upload_dir.join(filename);
    tokio::fs::write(&path, bytes).await?;
    tracing::debug!(path = %path.display(), size = bytes.len(), "stored upload");
    Ok(path)
}
